// ── Cross-API index ──
//
// Answers "which API owns this MAC?" and "which APIs contain a site
// with this name?" without opening every cache. Persisted as
// `index.json` in the cache directory and rebuilt after every refresh.
//
// MAC ownership invariant: a MAC maps to exactly one API. When rebuild
// sees the same MAC in a second cache, the first-seen mapping (in
// traversal order, which is sorted by label) is retained and the
// collision is reported; later mappings are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::ApiCache;

/// Index document format version.
pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossApiIndex {
    pub version: u32,
    /// Normalized MAC → owning API label.
    pub mac_to_api: BTreeMap<String, String>,
    /// Site name → every API label containing a site of that name.
    pub site_name_to_apis: BTreeMap<String, Vec<String>>,
    pub last_rebuilt: DateTime<Utc>,
}

impl Default for CrossApiIndex {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            mac_to_api: BTreeMap::new(),
            site_name_to_apis: BTreeMap::new(),
            last_rebuilt: Utc::now(),
        }
    }
}

/// A MAC observed in more than one API during rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacCollision {
    pub mac: String,
    pub kept: String,
    pub ignored: String,
}

impl CrossApiIndex {
    /// Build from cache documents. Caller passes caches in traversal
    /// order; first-seen MAC ownership wins.
    pub fn build<'a>(caches: impl IntoIterator<Item = &'a ApiCache>) -> (Self, Vec<MacCollision>) {
        let mut index = Self::default();
        let mut collisions = Vec::new();

        for cache in caches {
            for item in cache.all_inventory() {
                let mac = item.mac.as_str().to_owned();
                if mac.is_empty() {
                    continue;
                }
                match index.mac_to_api.get(&mac) {
                    Some(owner) if owner != &cache.label => {
                        collisions.push(MacCollision {
                            mac,
                            kept: owner.clone(),
                            ignored: cache.label.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        index.mac_to_api.insert(mac, cache.label.clone());
                    }
                }
            }

            for site in &cache.sites {
                let labels = index
                    .site_name_to_apis
                    .entry(site.name.clone())
                    .or_default();
                if !labels.contains(&cache.label) {
                    labels.push(cache.label.clone());
                }
            }
        }

        index.last_rebuilt = Utc::now();
        (index, collisions)
    }

    /// The owning API for a normalized MAC.
    pub fn api_for_mac(&self, mac: &str) -> Option<&str> {
        self.mac_to_api.get(mac).map(String::as_str)
    }

    /// All APIs containing a site of this name.
    pub fn apis_for_site(&self, name: &str) -> &[String] {
        self.site_name_to_apis
            .get(name)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{DeviceKind, InventoryItem, MacAddress, Provenance, SiteInfo, Vendor};

    use super::*;

    fn item(mac: &str) -> InventoryItem {
        InventoryItem {
            id: format!("dev-{mac}"),
            mac: MacAddress::normalize(mac),
            serial: String::new(),
            model: String::new(),
            name: String::new(),
            device_type: DeviceKind::Ap,
            site_id: String::new(),
            site_name: String::new(),
            claimed: true,
            netbox: None,
            provenance: Provenance::default(),
        }
    }

    fn cache_with(label: &str, vendor: Vendor, macs: &[&str], sites: &[&str]) -> ApiCache {
        let mut cache = ApiCache::new(label, vendor, "org");
        for mac in macs {
            let i = item(mac);
            cache.inventory_ap.insert(i.mac.as_str().to_owned(), i);
        }
        for (n, name) in sites.iter().enumerate() {
            cache.sites.push(SiteInfo {
                id: format!("{label}-s{n}"),
                name: (*name).to_owned(),
                ..Default::default()
            });
        }
        cache
    }

    #[test]
    fn first_seen_mac_wins_and_collision_reported() {
        let a = cache_with("meraki-corp", Vendor::Meraki, &["aa:bb:cc:dd:ee:f0"], &[]);
        let b = cache_with("mist-lab", Vendor::Mist, &["aa:bb:cc:dd:ee:f0"], &[]);

        let (index, collisions) = CrossApiIndex::build([&a, &b]);

        assert_eq!(index.api_for_mac("aabbccddeef0"), Some("meraki-corp"));
        assert_eq!(
            collisions,
            vec![MacCollision {
                mac: "aabbccddeef0".into(),
                kept: "meraki-corp".into(),
                ignored: "mist-lab".into(),
            }]
        );
    }

    #[test]
    fn shared_site_names_list_all_owners() {
        let a = cache_with("mist-lab", Vendor::Mist, &[], &["SHARED-SITE", "HQ"]);
        let b = cache_with("meraki-corp", Vendor::Meraki, &[], &["SHARED-SITE"]);

        let (index, _) = CrossApiIndex::build([&a, &b]);

        assert_eq!(index.apis_for_site("SHARED-SITE"), ["mist-lab", "meraki-corp"]);
        assert_eq!(index.apis_for_site("HQ"), ["mist-lab"]);
        assert!(index.apis_for_site("NOPE").is_empty());
    }

    #[test]
    fn empty_macs_are_skipped() {
        let a = cache_with("mist-lab", Vendor::Mist, &[""], &[]);
        let (index, collisions) = CrossApiIndex::build([&a]);
        assert!(index.mac_to_api.is_empty());
        assert!(collisions.is_empty());
    }
}

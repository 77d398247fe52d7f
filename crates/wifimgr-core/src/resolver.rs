// ── Name and MAC resolution ──
//
// Turns user-supplied identifiers -- site names, device MACs, profile
// and template names -- into vendor-specific ids plus the owning API.
// Ambiguity is an error, not a guess: a site name owned by two APIs
// needs `--api` (or an `api` key in the site config), and the error
// says so.

use std::collections::BTreeMap;

use crate::cache::{CacheAccessor, CacheManager};
use crate::error::CoreError;
use crate::model::{DeviceKind, MacAddress, Vendor};

/// Result of site resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSite {
    pub site_name: String,
    pub site_id: String,
    pub api_label: String,
    pub vendor: Vendor,
}

/// Result of device-by-MAC resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevice {
    pub mac: MacAddress,
    pub api_label: String,
    pub vendor: Vendor,
    pub site_id: String,
    pub device_type: DeviceKind,
}

/// Resolver over the cache layer. Holds borrowed handles -- construct
/// where needed, it is free.
pub struct Resolver<'a> {
    manager: &'a CacheManager,
    accessor: &'a CacheAccessor,
}

impl<'a> Resolver<'a> {
    pub fn new(manager: &'a CacheManager, accessor: &'a CacheAccessor) -> Self {
        Self { manager, accessor }
    }

    // ── Sites ────────────────────────────────────────────────────────

    /// Resolve a site name to its id and owning API.
    ///
    /// With an explicit API label only that cache is consulted. Without
    /// one, the cross-API index decides: one owner proceeds, several is
    /// a `DuplicateSite`, none is a `SiteNotFound` listing what was
    /// searched.
    pub fn resolve_site(&self, name: &str, api: Option<&str>) -> Result<ResolvedSite, CoreError> {
        if let Some(label) = api {
            let cache = self.manager.get_api_cache(label)?;
            let site_id =
                cache
                    .site_index
                    .by_name
                    .get(name)
                    .ok_or_else(|| CoreError::SiteNotFound {
                        name: name.to_owned(),
                        searched: vec![label.to_owned()],
                    })?;
            return Ok(ResolvedSite {
                site_name: name.to_owned(),
                site_id: site_id.clone(),
                api_label: label.to_owned(),
                vendor: cache.metadata.vendor,
            });
        }

        let index = self.manager.load_index()?;
        let owners = index.apis_for_site(name);
        match owners {
            [] => Err(CoreError::SiteNotFound {
                name: name.to_owned(),
                searched: self.manager.cached_labels(),
            }),
            [only] => {
                let owner = only.clone();
                self.resolve_site(name, Some(&owner))
            }
            many => Err(CoreError::DuplicateSite {
                name: name.to_owned(),
                labels: many.to_vec(),
            }),
        }
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Resolve any textual MAC form to the owning API and inventory
    /// identity.
    pub fn resolve_device(&self, mac_input: &str) -> Result<ResolvedDevice, CoreError> {
        let mac = MacAddress::normalize(mac_input);
        if mac.is_empty() {
            return Err(CoreError::DeviceNotFound {
                identifier: mac_input.to_owned(),
            });
        }

        let (api_label, item) = self.manager.find_device_by_mac(&mac)?;
        Ok(ResolvedDevice {
            mac,
            vendor: item.provenance.vendor,
            site_id: item.site_id,
            device_type: item.device_type,
            api_label,
        })
    }

    // ── Profiles and templates (per-API scope) ───────────────────────

    /// Resolve a device profile name to its id within one API.
    pub fn resolve_device_profile(&self, api: &str, name: &str) -> Result<String, CoreError> {
        self.accessor
            .device_profile_by_name(api, name)
            .map(|p| p.id)
            .map_err(|_| CoreError::NotFound {
                kind: "device profile",
                key: name.to_owned(),
                scope: format!("API '{api}'"),
                suggestions: closest_matches(name, &self.accessor.device_profile_names(api)),
            })
    }

    /// Resolve an RF template name to its id within one API.
    pub fn resolve_rf_template(&self, api: &str, name: &str) -> Result<String, CoreError> {
        self.accessor
            .rf_template_by_name(api, name)
            .map(|t| t.id)
            .map_err(|_| CoreError::NotFound {
                kind: "RF template",
                key: name.to_owned(),
                scope: format!("API '{api}'"),
                suggestions: closest_matches(name, &self.accessor.rf_template_names(api)),
            })
    }

    /// Resolve a name against a caller-supplied candidate map (used for
    /// per-site scopes like maps/floorplans, where the candidates come
    /// from the call context rather than an accessor index).
    pub fn resolve_named(
        &self,
        kind: &'static str,
        name: &str,
        scope: String,
        candidates: &BTreeMap<String, String>,
    ) -> Result<String, CoreError> {
        if let Some(id) = candidates.get(name) {
            return Ok(id.clone());
        }
        let names: Vec<String> = candidates.keys().cloned().collect();
        Err(CoreError::NotFound {
            kind,
            key: name.to_owned(),
            scope,
            suggestions: closest_matches(name, &names),
        })
    }
}

// ── Suggestion scoring ───────────────────────────────────────────────

/// Rank candidates against a missed lookup key: exact-prefix 100,
/// substring 50, plus 10 per input word contained. Top 3 with a
/// positive score, best first.
pub fn closest_matches(input: &str, candidates: &[String]) -> Vec<String> {
    let needle = input.to_ascii_lowercase();
    let words: Vec<&str> = needle
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();

    let mut scored: Vec<(i32, &String)> = candidates
        .iter()
        .filter_map(|candidate| {
            let hay = candidate.to_ascii_lowercase();
            let mut score = 0;
            if hay.starts_with(&needle) {
                score += 100;
            }
            if hay.contains(&needle) {
                score += 50;
            }
            for word in &words {
                if hay.contains(word) {
                    score += 10;
                }
            }
            (score > 0).then_some((score, candidate))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(3).map(|(_, c)| c.clone()).collect()
}

#[cfg(test)]
mod tests {
    use crate::cache::ApiCache;
    use crate::model::{DeviceProfile, InventoryItem, Provenance, SiteInfo};

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        manager: CacheManager,
        accessor: CacheAccessor,
    }

    fn fixture(caches: Vec<ApiCache>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let manager = CacheManager::new(dir.path());
        for mut cache in caches {
            manager.save_api_cache(&mut cache).unwrap();
        }
        manager.rebuild_index().unwrap();
        let accessor = CacheAccessor::new();
        accessor.rebuild_indexes(&manager).unwrap();
        Fixture {
            _dir: dir,
            manager,
            accessor,
        }
    }

    fn cache(label: &str, vendor: Vendor, sites: &[(&str, &str)]) -> ApiCache {
        let mut cache = ApiCache::new(label, vendor, "org");
        for (id, name) in sites {
            cache.sites.push(SiteInfo {
                id: (*id).to_owned(),
                name: (*name).to_owned(),
                ..Default::default()
            });
        }
        cache
    }

    #[test]
    fn unique_site_resolves_without_api() {
        let f = fixture(vec![
            cache("mist-lab", Vendor::Mist, &[("s1", "HQ")]),
            cache("meraki-corp", Vendor::Meraki, &[("n1", "Warehouse")]),
        ]);
        let resolver = Resolver::new(&f.manager, &f.accessor);

        let resolved = resolver.resolve_site("Warehouse", None).unwrap();
        assert_eq!(resolved.api_label, "meraki-corp");
        assert_eq!(resolved.site_id, "n1");
        assert_eq!(resolved.vendor, Vendor::Meraki);
    }

    #[test]
    fn duplicate_site_requires_api() {
        let f = fixture(vec![
            cache("mist-lab", Vendor::Mist, &[("s1", "SHARED-SITE")]),
            cache("meraki-corp", Vendor::Meraki, &[("n1", "SHARED-SITE")]),
        ]);
        let resolver = Resolver::new(&f.manager, &f.accessor);

        let err = resolver.resolve_site("SHARED-SITE", None).unwrap_err();
        match err {
            CoreError::DuplicateSite { labels, .. } => {
                assert_eq!(labels.len(), 2);
                assert!(labels.contains(&"mist-lab".to_owned()));
                assert!(labels.contains(&"meraki-corp".to_owned()));
            }
            other => panic!("expected DuplicateSite, got {other:?}"),
        }

        // Explicit API disambiguates.
        let resolved = resolver.resolve_site("SHARED-SITE", Some("mist-lab")).unwrap();
        assert_eq!(resolved.site_id, "s1");
    }

    #[test]
    fn missing_site_lists_searched_apis() {
        let f = fixture(vec![cache("mist-lab", Vendor::Mist, &[("s1", "HQ")])]);
        let resolver = Resolver::new(&f.manager, &f.accessor);

        let err = resolver.resolve_site("NOPE", None).unwrap_err();
        match err {
            CoreError::SiteNotFound { searched, .. } => {
                assert_eq!(searched, vec!["mist-lab".to_owned()]);
            }
            other => panic!("expected SiteNotFound, got {other:?}"),
        }
    }

    #[test]
    fn device_resolution_normalizes_input() {
        let mut c = cache("mist-lab", Vendor::Mist, &[("s1", "HQ")]);
        let mac = MacAddress::normalize("aa:bb:cc:dd:ee:10");
        c.inventory_ap.insert(
            mac.as_str().to_owned(),
            InventoryItem {
                id: "dev-1".into(),
                mac,
                serial: "S1".into(),
                model: "AP".into(),
                name: "lobby".into(),
                device_type: DeviceKind::Ap,
                site_id: "s1".into(),
                site_name: "HQ".into(),
                claimed: true,
                netbox: None,
                provenance: Provenance::default(),
            },
        );
        let f = fixture(vec![c]);
        let resolver = Resolver::new(&f.manager, &f.accessor);

        let resolved = resolver.resolve_device("AA-BB-CC-DD-EE-10").unwrap();
        assert_eq!(resolved.api_label, "mist-lab");
        assert_eq!(resolved.site_id, "s1");
        assert_eq!(resolved.device_type, DeviceKind::Ap);
        assert_eq!(resolved.vendor, Vendor::Mist);
    }

    #[test]
    fn profile_resolution_suggests_near_misses() {
        let mut c = cache("mist-lab", Vendor::Mist, &[("s1", "HQ")]);
        c.device_profiles.push(DeviceProfile {
            id: "p1".into(),
            name: "office-ap".into(),
            profile_type: "ap".into(),
            config: None,
            provenance: Provenance::default(),
        });
        let f = fixture(vec![c]);
        let resolver = Resolver::new(&f.manager, &f.accessor);

        assert_eq!(
            resolver.resolve_device_profile("mist-lab", "office-ap").unwrap(),
            "p1"
        );

        let err = resolver
            .resolve_device_profile("mist-lab", "office")
            .unwrap_err();
        match err {
            CoreError::NotFound { suggestions, .. } => {
                assert_eq!(suggestions, vec!["office-ap".to_owned()]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn scoring_prefers_prefix_over_contains() {
        let candidates = vec![
            "density-high".to_owned(),
            "high-density".to_owned(),
            "unrelated".to_owned(),
        ];
        let matches = closest_matches("high", &candidates);
        assert_eq!(matches[0], "high-density");
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn empty_mac_is_device_not_found() {
        let f = fixture(vec![]);
        let resolver = Resolver::new(&f.manager, &f.accessor);
        assert!(matches!(
            resolver.resolve_device("::--"),
            Err(CoreError::DeviceNotFound { .. })
        ));
    }
}

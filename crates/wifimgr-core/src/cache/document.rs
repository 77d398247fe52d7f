// ── Per-API cache document ──
//
// One versioned snapshot per configured API, serialized pretty-printed
// to `<cacheDir>/apis/<label>.json`. Inventory, config, and status maps
// are keyed by normalized MAC; the in-file key always equals the
// entry's own `mac` field. The in-document site index is rebuilt on
// every save so both directions hold after a write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    ApConfig, DeviceKind, DeviceProfile, DeviceStatus, GatewayConfig, GatewayTemplate,
    InventoryItem, MacAddress, Provenance, RfTemplate, SiteInfo, SwitchConfig, Vendor, Wlan,
    WlanTemplate,
};

/// Cache document format version this build reads and writes.
pub const CACHE_VERSION: u32 = 1;

/// Bidirectional site name/id index within one cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SiteIndex {
    pub by_name: BTreeMap<String, String>,
    pub by_id: BTreeMap<String, String>,
}

/// Refresh bookkeeping stored alongside the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub vendor: Vendor,
    pub org_id: String,
    pub last_refresh: DateTime<Utc>,
    pub refresh_duration_ms: u64,
    #[serde(default)]
    pub item_counts: BTreeMap<String, usize>,
}

/// The full per-API cache snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCache {
    pub version: u32,
    pub label: String,
    pub metadata: CacheMetadata,
    #[serde(default)]
    pub site_index: SiteIndex,
    #[serde(default)]
    pub sites: Vec<SiteInfo>,
    #[serde(default)]
    pub inventory_ap: BTreeMap<String, InventoryItem>,
    #[serde(default)]
    pub inventory_switch: BTreeMap<String, InventoryItem>,
    #[serde(default)]
    pub inventory_gateway: BTreeMap<String, InventoryItem>,
    #[serde(default)]
    pub rf_templates: Vec<RfTemplate>,
    #[serde(default)]
    pub gateway_templates: Vec<GatewayTemplate>,
    #[serde(default)]
    pub wlan_templates: Vec<WlanTemplate>,
    #[serde(default)]
    pub device_profiles: Vec<DeviceProfile>,
    #[serde(default)]
    pub wlans: BTreeMap<String, Wlan>,
    #[serde(default)]
    pub ap_configs: BTreeMap<String, ApConfig>,
    #[serde(default)]
    pub switch_configs: BTreeMap<String, SwitchConfig>,
    #[serde(default)]
    pub gateway_configs: BTreeMap<String, GatewayConfig>,
    #[serde(default)]
    pub device_status: BTreeMap<String, DeviceStatus>,
}

impl ApiCache {
    /// Fresh empty cache stamped with the refresh start time.
    pub fn new(label: impl Into<String>, vendor: Vendor, org_id: impl Into<String>) -> Self {
        Self {
            version: CACHE_VERSION,
            label: label.into(),
            metadata: CacheMetadata {
                vendor,
                org_id: org_id.into(),
                last_refresh: Utc::now(),
                refresh_duration_ms: 0,
                item_counts: BTreeMap::new(),
            },
            site_index: SiteIndex::default(),
            sites: Vec::new(),
            inventory_ap: BTreeMap::new(),
            inventory_switch: BTreeMap::new(),
            inventory_gateway: BTreeMap::new(),
            rf_templates: Vec::new(),
            gateway_templates: Vec::new(),
            wlan_templates: Vec::new(),
            device_profiles: Vec::new(),
            wlans: BTreeMap::new(),
            ap_configs: BTreeMap::new(),
            switch_configs: BTreeMap::new(),
            gateway_configs: BTreeMap::new(),
            device_status: BTreeMap::new(),
        }
    }

    // ── Kind-generic access ──────────────────────────────────────────

    pub fn inventory(&self, kind: DeviceKind) -> &BTreeMap<String, InventoryItem> {
        match kind {
            DeviceKind::Ap => &self.inventory_ap,
            DeviceKind::Switch => &self.inventory_switch,
            DeviceKind::Gateway => &self.inventory_gateway,
        }
    }

    pub fn inventory_mut(&mut self, kind: DeviceKind) -> &mut BTreeMap<String, InventoryItem> {
        match kind {
            DeviceKind::Ap => &mut self.inventory_ap,
            DeviceKind::Switch => &mut self.inventory_switch,
            DeviceKind::Gateway => &mut self.inventory_gateway,
        }
    }

    /// All inventory items across the three kinds.
    pub fn all_inventory(&self) -> impl Iterator<Item = &InventoryItem> {
        self.inventory_ap
            .values()
            .chain(self.inventory_switch.values())
            .chain(self.inventory_gateway.values())
    }

    /// Look up one inventory item by normalized MAC across all kinds.
    pub fn find_inventory(&self, mac: &MacAddress) -> Option<&InventoryItem> {
        DeviceKind::ALL
            .iter()
            .find_map(|kind| self.inventory(*kind).get(mac.as_str()))
    }

    /// The raw config map for one device, if cached.
    pub fn config_value(&self, kind: DeviceKind, mac: &MacAddress) -> Option<&Value> {
        match kind {
            DeviceKind::Ap => self.ap_configs.get(mac.as_str()).map(|c| &c.config),
            DeviceKind::Switch => self.switch_configs.get(mac.as_str()).map(|c| &c.config),
            DeviceKind::Gateway => self.gateway_configs.get(mac.as_str()).map(|c| &c.config),
        }
    }

    /// Insert or replace one device's config snapshot.
    pub fn insert_config(
        &mut self,
        kind: DeviceKind,
        id: impl Into<String>,
        mac: MacAddress,
        site_id: impl Into<String>,
        config: Value,
    ) {
        let key = mac.as_str().to_owned();
        match kind {
            DeviceKind::Ap => {
                self.ap_configs.insert(
                    key,
                    ApConfig {
                        id: id.into(),
                        mac,
                        site_id: site_id.into(),
                        config,
                        provenance: Provenance::default(),
                    },
                );
            }
            DeviceKind::Switch => {
                self.switch_configs.insert(
                    key,
                    SwitchConfig {
                        id: id.into(),
                        mac,
                        site_id: site_id.into(),
                        config,
                        provenance: Provenance::default(),
                    },
                );
            }
            DeviceKind::Gateway => {
                self.gateway_configs.insert(
                    key,
                    GatewayConfig {
                        id: id.into(),
                        mac,
                        site_id: site_id.into(),
                        config,
                        provenance: Provenance::default(),
                    },
                );
            }
        }
    }

    // ── Maintenance before save ──────────────────────────────────────

    /// Recompute the in-document item counts.
    pub fn recount(&mut self) {
        let counts = &mut self.metadata.item_counts;
        counts.clear();
        counts.insert("sites".into(), self.sites.len());
        counts.insert("inventory_ap".into(), self.inventory_ap.len());
        counts.insert("inventory_switch".into(), self.inventory_switch.len());
        counts.insert("inventory_gateway".into(), self.inventory_gateway.len());
        counts.insert("rf_templates".into(), self.rf_templates.len());
        counts.insert("gateway_templates".into(), self.gateway_templates.len());
        counts.insert("wlan_templates".into(), self.wlan_templates.len());
        counts.insert("device_profiles".into(), self.device_profiles.len());
        counts.insert("wlans".into(), self.wlans.len());
        counts.insert("ap_configs".into(), self.ap_configs.len());
        counts.insert("switch_configs".into(), self.switch_configs.len());
        counts.insert("gateway_configs".into(), self.gateway_configs.len());
        counts.insert("device_status".into(), self.device_status.len());
    }

    /// Rebuild the bidirectional site index from `sites`.
    pub fn rebuild_site_index(&mut self) {
        self.site_index.by_name.clear();
        self.site_index.by_id.clear();
        for site in &self.sites {
            self.site_index
                .by_name
                .insert(site.name.clone(), site.id.clone());
            self.site_index
                .by_id
                .insert(site.id.clone(), site.name.clone());
        }
    }

    /// Whether the stored item counts match the actual collections.
    /// A mismatch marks the cache corrupted.
    pub fn counts_consistent(&self) -> bool {
        let expected = {
            let mut probe = self.clone();
            probe.recount();
            probe.metadata.item_counts
        };
        self.metadata.item_counts == expected
    }

    /// Stamp `SourceAPI`/`SourceVendor` provenance on every entity.
    /// Called after deserialization -- provenance is never persisted.
    pub fn stamp_provenance(&mut self) {
        let provenance = Provenance::new(self.label.clone(), self.metadata.vendor);

        for site in &mut self.sites {
            site.provenance = provenance.clone();
        }
        for item in self
            .inventory_ap
            .values_mut()
            .chain(self.inventory_switch.values_mut())
            .chain(self.inventory_gateway.values_mut())
        {
            item.provenance = provenance.clone();
        }
        for t in &mut self.rf_templates {
            t.provenance = provenance.clone();
        }
        for t in &mut self.gateway_templates {
            t.provenance = provenance.clone();
        }
        for t in &mut self.wlan_templates {
            t.provenance = provenance.clone();
        }
        for p in &mut self.device_profiles {
            p.provenance = provenance.clone();
        }
        for w in self.wlans.values_mut() {
            w.provenance = provenance.clone();
        }
        for c in self.ap_configs.values_mut() {
            c.provenance = provenance.clone();
        }
        for c in self.switch_configs.values_mut() {
            c.provenance = provenance.clone();
        }
        for c in self.gateway_configs.values_mut() {
            c.provenance = provenance.clone();
        }
        for s in self.device_status.values_mut() {
            s.provenance = provenance.clone();
        }
    }
}

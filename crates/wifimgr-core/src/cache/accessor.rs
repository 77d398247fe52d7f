// ── Aggregate in-memory accessor ──
//
// O(1) lookup across all per-API caches from any key: MAC, site
// name/id, template or profile name, SSID. Built in the composition
// root and threaded through constructors -- one accessor per CLI
// invocation. `rebuild_indexes` is the only mutator and runs after
// every cache change; reads take the read lock and never touch disk.
//
// Name-scoped indexes (templates, profiles) are keyed per API label,
// matching the resolver's scoping rules. Site names can repeat across
// APIs: first-seen (sorted label order) wins here, and the resolver
// consults the cross-API index to detect the ambiguity.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::warn;

use super::manager::CacheManager;
use crate::error::CoreError;
use crate::model::{
    ApConfig, DeviceProfile, DeviceStatus, GatewayConfig, GatewayTemplate, InventoryItem,
    MacAddress, RfTemplate, SiteInfo, SwitchConfig, Wlan, WlanTemplate,
};

#[derive(Default)]
struct Aggregate {
    sites_by_id: HashMap<String, SiteInfo>,
    sites_by_name: HashMap<String, SiteInfo>,
    inventory_by_mac: HashMap<String, InventoryItem>,
    status_by_mac: HashMap<String, DeviceStatus>,
    ap_configs_by_mac: HashMap<String, ApConfig>,
    switch_configs_by_mac: HashMap<String, SwitchConfig>,
    gateway_configs_by_mac: HashMap<String, GatewayConfig>,
    rf_templates_by_id: HashMap<String, RfTemplate>,
    rf_templates_by_name: HashMap<(String, String), RfTemplate>,
    gateway_templates_by_id: HashMap<String, GatewayTemplate>,
    gateway_templates_by_name: HashMap<(String, String), GatewayTemplate>,
    wlan_templates_by_id: HashMap<String, WlanTemplate>,
    wlan_templates_by_name: HashMap<(String, String), WlanTemplate>,
    device_profiles_by_id: HashMap<String, DeviceProfile>,
    device_profiles_by_name: HashMap<(String, String), DeviceProfile>,
    wlans_by_id: HashMap<String, Wlan>,
    wlans_by_ssid: HashMap<String, Vec<Wlan>>,
}

/// Read-optimized aggregate view over every cached API.
#[derive(Default)]
pub struct CacheAccessor {
    indexes: RwLock<Aggregate>,
}

impl CacheAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild all aggregate indexes from the caches on disk.
    ///
    /// Unreadable caches are skipped with a warning, matching the index
    /// rebuild contract: a single bad file never blanks the whole view.
    pub fn rebuild_indexes(&self, manager: &CacheManager) -> Result<(), CoreError> {
        let mut agg = Aggregate::default();

        for label in manager.cached_labels() {
            let cache = match manager.get_api_cache(&label) {
                Ok(c) => c,
                Err(e) => {
                    warn!(label = %label, error = %e, "skipping unreadable cache during accessor rebuild");
                    continue;
                }
            };

            for site in &cache.sites {
                agg.sites_by_id.insert(site.id.clone(), site.clone());
                agg.sites_by_name
                    .entry(site.name.clone())
                    .or_insert_with(|| site.clone());
            }

            for item in cache.all_inventory() {
                agg.inventory_by_mac
                    .entry(item.mac.as_str().to_owned())
                    .or_insert_with(|| item.clone());
            }

            for (mac, status) in &cache.device_status {
                agg.status_by_mac
                    .entry(mac.clone())
                    .or_insert_with(|| status.clone());
            }

            for (mac, config) in &cache.ap_configs {
                agg.ap_configs_by_mac
                    .entry(mac.clone())
                    .or_insert_with(|| config.clone());
            }
            for (mac, config) in &cache.switch_configs {
                agg.switch_configs_by_mac
                    .entry(mac.clone())
                    .or_insert_with(|| config.clone());
            }
            for (mac, config) in &cache.gateway_configs {
                agg.gateway_configs_by_mac
                    .entry(mac.clone())
                    .or_insert_with(|| config.clone());
            }

            for t in &cache.rf_templates {
                agg.rf_templates_by_id.insert(t.id.clone(), t.clone());
                agg.rf_templates_by_name
                    .insert((label.clone(), t.name.clone()), t.clone());
            }
            for t in &cache.gateway_templates {
                agg.gateway_templates_by_id.insert(t.id.clone(), t.clone());
                agg.gateway_templates_by_name
                    .insert((label.clone(), t.name.clone()), t.clone());
            }
            for t in &cache.wlan_templates {
                agg.wlan_templates_by_id.insert(t.id.clone(), t.clone());
                agg.wlan_templates_by_name
                    .insert((label.clone(), t.name.clone()), t.clone());
            }

            for profile in &cache.device_profiles {
                agg.device_profiles_by_id
                    .insert(profile.id.clone(), profile.clone());
                let key = (label.clone(), profile.name.clone());
                if agg.device_profiles_by_name.contains_key(&key) {
                    warn!(
                        label = %label,
                        profile = %profile.name,
                        "duplicate device profile name within one API, keeping last-seen"
                    );
                }
                agg.device_profiles_by_name.insert(key, profile.clone());
            }

            for wlan in cache.wlans.values() {
                agg.wlans_by_id.insert(wlan.id.clone(), wlan.clone());
                agg.wlans_by_ssid
                    .entry(wlan.ssid.clone())
                    .or_default()
                    .push(wlan.clone());
            }
        }

        *self.write() = agg;
        Ok(())
    }

    // ── Site lookups ─────────────────────────────────────────────────

    pub fn site_by_id(&self, id: &str) -> Result<SiteInfo, CoreError> {
        self.read()
            .sites_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("site", id))
    }

    pub fn site_by_name(&self, name: &str) -> Result<SiteInfo, CoreError> {
        self.read()
            .sites_by_name
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("site", name))
    }

    pub fn all_sites(&self) -> Vec<SiteInfo> {
        let mut sites: Vec<SiteInfo> = self.read().sites_by_id.values().cloned().collect();
        sites.sort_by(|a, b| a.name.cmp(&b.name));
        sites
    }

    // ── Device lookups ───────────────────────────────────────────────

    pub fn inventory_by_mac(&self, mac: &MacAddress) -> Result<InventoryItem, CoreError> {
        self.read()
            .inventory_by_mac
            .get(mac.as_str())
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: mac.display(),
            })
    }

    pub fn all_inventory(&self) -> Vec<InventoryItem> {
        let mut items: Vec<InventoryItem> =
            self.read().inventory_by_mac.values().cloned().collect();
        items.sort_by(|a, b| a.mac.cmp(&b.mac));
        items
    }

    pub fn status_by_mac(&self, mac: &MacAddress) -> Result<DeviceStatus, CoreError> {
        self.read()
            .status_by_mac
            .get(mac.as_str())
            .cloned()
            .ok_or_else(|| not_found("device status", mac.as_str()))
    }

    pub fn ap_config_by_mac(&self, mac: &MacAddress) -> Result<ApConfig, CoreError> {
        self.read()
            .ap_configs_by_mac
            .get(mac.as_str())
            .cloned()
            .ok_or_else(|| not_found("AP config", mac.as_str()))
    }

    pub fn switch_config_by_mac(&self, mac: &MacAddress) -> Result<SwitchConfig, CoreError> {
        self.read()
            .switch_configs_by_mac
            .get(mac.as_str())
            .cloned()
            .ok_or_else(|| not_found("switch config", mac.as_str()))
    }

    pub fn gateway_config_by_mac(&self, mac: &MacAddress) -> Result<GatewayConfig, CoreError> {
        self.read()
            .gateway_configs_by_mac
            .get(mac.as_str())
            .cloned()
            .ok_or_else(|| not_found("gateway config", mac.as_str()))
    }

    // ── Template and profile lookups ─────────────────────────────────

    pub fn rf_template_by_id(&self, id: &str) -> Result<RfTemplate, CoreError> {
        self.read()
            .rf_templates_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("RF template", id))
    }

    pub fn rf_template_by_name(&self, api: &str, name: &str) -> Result<RfTemplate, CoreError> {
        self.read()
            .rf_templates_by_name
            .get(&(api.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| not_found("RF template", name))
    }

    pub fn rf_template_names(&self, api: &str) -> Vec<String> {
        self.read()
            .rf_templates_by_name
            .keys()
            .filter(|(label, _)| label == api)
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn gateway_template_by_name(
        &self,
        api: &str,
        name: &str,
    ) -> Result<GatewayTemplate, CoreError> {
        self.read()
            .gateway_templates_by_name
            .get(&(api.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| not_found("gateway template", name))
    }

    pub fn wlan_template_by_name(&self, api: &str, name: &str) -> Result<WlanTemplate, CoreError> {
        self.read()
            .wlan_templates_by_name
            .get(&(api.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| not_found("WLAN template", name))
    }

    pub fn device_profile_by_id(&self, id: &str) -> Result<DeviceProfile, CoreError> {
        self.read()
            .device_profiles_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("device profile", id))
    }

    pub fn device_profile_by_name(
        &self,
        api: &str,
        name: &str,
    ) -> Result<DeviceProfile, CoreError> {
        self.read()
            .device_profiles_by_name
            .get(&(api.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| not_found("device profile", name))
    }

    pub fn device_profile_names(&self, api: &str) -> Vec<String> {
        self.read()
            .device_profiles_by_name
            .keys()
            .filter(|(label, _)| label == api)
            .map(|(_, name)| name.clone())
            .collect()
    }

    // ── WLAN lookups ─────────────────────────────────────────────────

    pub fn wlan_by_id(&self, id: &str) -> Result<Wlan, CoreError> {
        self.read()
            .wlans_by_id
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("WLAN", id))
    }

    /// All WLANs broadcasting the given SSID. Duplicates across
    /// networks are expected; an unknown SSID is an empty list.
    pub fn wlans_by_ssid(&self, ssid: &str) -> Vec<Wlan> {
        self.read()
            .wlans_by_ssid
            .get(ssid)
            .cloned()
            .unwrap_or_default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Aggregate> {
        match self.indexes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Aggregate> {
        match self.indexes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn not_found(kind: &'static str, key: &str) -> CoreError {
    CoreError::NotFound {
        kind,
        key: key.to_owned(),
        scope: "cache".into(),
        suggestions: Vec::new(),
    }
}

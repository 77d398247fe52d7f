// End-to-end cache engine tests over stub vendor clients: two APIs
// refresh in parallel, caches and the cross-API index land on disk, and
// the resolver works against the result. No network involved -- the
// facets are in-memory stubs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use wifimgr_core::cache::{CacheAccessor, CacheManager, INDEX_ERROR_LABEL, RefreshOptions};
use wifimgr_core::client::{
    ConfigsService, InventoryService, SitesService, StatusesService, VendorClient,
};
use wifimgr_core::error::CoreError;
use wifimgr_core::model::{
    ApiConfig, DeviceKind, DeviceStatus, InventoryItem, MacAddress, Provenance, SiteInfo,
    StatusKind, Vendor,
};
use wifimgr_core::registry::ClientRegistry;
use wifimgr_core::resolver::Resolver;

// ── Stub facets ─────────────────────────────────────────────────────

struct StubSites(Vec<SiteInfo>);

#[async_trait]
impl SitesService for StubSites {
    async fn list_sites(&self, _cancel: &CancellationToken) -> Result<Vec<SiteInfo>, CoreError> {
        Ok(self.0.clone())
    }
}

struct StubInventory(Vec<InventoryItem>);

#[async_trait]
impl InventoryService for StubInventory {
    async fn list_inventory(
        &self,
        _cancel: &CancellationToken,
        kind: DeviceKind,
    ) -> Result<Vec<InventoryItem>, CoreError> {
        Ok(self
            .0
            .iter()
            .filter(|item| item.device_type == kind)
            .cloned()
            .collect())
    }

    async fn claim(
        &self,
        _cancel: &CancellationToken,
        _serials: &[String],
    ) -> Result<(), CoreError> {
        Ok(())
    }

    async fn release(
        &self,
        _cancel: &CancellationToken,
        _site_id: &str,
        _serial: &str,
    ) -> Result<(), CoreError> {
        Ok(())
    }
}

struct StubStatuses(Vec<DeviceStatus>);

#[async_trait]
impl StatusesService for StubStatuses {
    async fn list_statuses(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<DeviceStatus>, CoreError> {
        Ok(self.0.clone())
    }
}

struct StubConfigs {
    bulk: bool,
    configs: HashMap<String, Value>,
}

#[async_trait]
impl ConfigsService for StubConfigs {
    fn bulk_capable(&self) -> bool {
        self.bulk
    }

    async fn fetch_site_configs(
        &self,
        _cancel: &CancellationToken,
        _site_id: &str,
        kind: DeviceKind,
    ) -> Result<Vec<(MacAddress, Value)>, CoreError> {
        if kind != DeviceKind::Ap {
            return Ok(Vec::new());
        }
        Ok(self
            .configs
            .iter()
            .map(|(mac, cfg)| (MacAddress::normalize(mac), cfg.clone()))
            .collect())
    }

    async fn fetch_device_config(
        &self,
        _cancel: &CancellationToken,
        item: &InventoryItem,
    ) -> Result<Value, CoreError> {
        self.configs
            .get(item.mac.as_str())
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: item.mac.display(),
            })
    }

    async fn push_device_config(
        &self,
        _cancel: &CancellationToken,
        _item: &InventoryItem,
        _config: &Value,
    ) -> Result<(), CoreError> {
        Ok(())
    }
}

// ── Fixture builders ────────────────────────────────────────────────

fn site(id: &str, name: &str) -> SiteInfo {
    SiteInfo {
        id: id.into(),
        name: name.into(),
        timezone: "UTC".into(),
        ..Default::default()
    }
}

fn ap(id: &str, mac: &str, site_id: &str) -> InventoryItem {
    InventoryItem {
        id: id.into(),
        mac: MacAddress::normalize(mac),
        serial: format!("SN-{id}"),
        model: "AP".into(),
        name: id.into(),
        device_type: DeviceKind::Ap,
        site_id: site_id.into(),
        site_name: String::new(),
        claimed: true,
        netbox: None,
        provenance: Provenance::default(),
    }
}

fn status(mac: &str, kind: StatusKind) -> DeviceStatus {
    DeviceStatus {
        mac: MacAddress::normalize(mac),
        status: kind,
        last_seen: None,
        lan_ip: None,
        public_ip: None,
        provenance: Provenance::default(),
    }
}

struct StubFleet {
    vendor: Vendor,
    sites: Vec<SiteInfo>,
    inventory: Vec<InventoryItem>,
    statuses: Vec<DeviceStatus>,
    bulk_configs: bool,
    configs: HashMap<String, Value>,
}

fn register_stub(registry: &ClientRegistry, vendor: Vendor, fleets: HashMap<String, StubFleet>) {
    let fleets = Arc::new(fleets);
    registry.register_factory(
        vendor,
        Box::new(move |config: &ApiConfig| {
            let fleet = fleets.get(&config.label).ok_or_else(|| CoreError::Config {
                message: format!("no stub fleet for '{}'", config.label),
            })?;
            Ok(VendorClient {
                label: config.label.clone(),
                vendor: fleet.vendor,
                org_id: config.org_id().to_owned(),
                sites: Some(Arc::new(StubSites(fleet.sites.clone()))),
                inventory: Some(Arc::new(StubInventory(fleet.inventory.clone()))),
                devices: None,
                statuses: Some(Arc::new(StubStatuses(fleet.statuses.clone()))),
                templates: None,
                profiles: None,
                configs: Some(Arc::new(StubConfigs {
                    bulk: fleet.bulk_configs,
                    configs: fleet.configs.clone(),
                })),
                wlans: None,
                search: None,
            })
        }),
    );
}

fn api_config(label: &str, vendor: Vendor) -> ApiConfig {
    ApiConfig {
        label: label.into(),
        vendor,
        base_url: "https://example.invalid".into(),
        credentials: HashMap::from([("org_id".to_owned(), format!("org-{label}"))]),
        rate_limit: 100.0,
        results_limit: None,
        cache_ttl_secs: 0,
    }
}

fn two_vendor_registry(shared_mac: Option<&str>) -> Arc<ClientRegistry> {
    let registry = Arc::new(ClientRegistry::new());

    let mist_fleet = StubFleet {
        vendor: Vendor::Mist,
        sites: vec![site("s1", "HQ"), site("s2", "SHARED-SITE")],
        inventory: vec![
            ap("mist-ap1", "aa:bb:cc:00:00:01", "s1"),
            ap("mist-ap2", shared_mac.unwrap_or("aa:bb:cc:00:00:02"), "s2"),
        ],
        statuses: vec![status("aa:bb:cc:00:00:01", StatusKind::Online)],
        bulk_configs: true,
        configs: HashMap::from([(
            "aabbcc000001".to_owned(),
            json!({ "name": "mist-ap1", "radio_config": { "band_5": { "power": 17 } } }),
        )]),
    };
    register_stub(
        &registry,
        Vendor::Mist,
        HashMap::from([("mist-lab".to_owned(), mist_fleet)]),
    );

    let meraki_fleet = StubFleet {
        vendor: Vendor::Meraki,
        sites: vec![site("n1", "Warehouse"), site("n2", "SHARED-SITE")],
        inventory: vec![
            ap("Q2XX-1", "dd:ee:ff:00:00:01", "n1"),
            ap("Q2XX-2", shared_mac.unwrap_or("dd:ee:ff:00:00:02"), "n2"),
        ],
        statuses: vec![status("dd:ee:ff:00:00:01", StatusKind::Dormant)],
        bulk_configs: false,
        configs: HashMap::from([(
            "ddeeff000001".to_owned(),
            json!({ "fiveGhzSettings": { "channel": 44 } }),
        )]),
    };
    register_stub(
        &registry,
        Vendor::Meraki,
        HashMap::from([("meraki-corp".to_owned(), meraki_fleet)]),
    );

    let errors = registry.initialize_clients(vec![
        api_config("mist-lab", Vendor::Mist),
        api_config("meraki-corp", Vendor::Meraki),
    ]);
    assert!(errors.is_empty(), "stub init failed: {errors:?}");
    registry
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn multi_vendor_refresh_writes_caches_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(dir.path());
    let registry = two_vendor_registry(None);
    let cancel = CancellationToken::new();

    let errors = manager
        .refresh_all(&cancel, &registry, RefreshOptions::default())
        .await;
    assert!(errors.is_empty(), "refresh errors: {errors:?}");

    // Two cache files plus the index.
    assert!(manager.api_cache_path("mist-lab").exists());
    assert!(manager.api_cache_path("meraki-corp").exists());
    assert!(manager.index_path().exists());

    let mist = manager.get_api_cache("mist-lab").unwrap();
    assert_eq!(mist.sites.len(), 2);
    assert_eq!(mist.inventory_ap.len(), 2);
    // Bulk vendor fetched configs on refresh.
    assert_eq!(mist.ap_configs.len(), 1);
    // Inventory site names were filled from the site index.
    assert_eq!(mist.inventory_ap["aabbcc000001"].site_name, "HQ");

    let meraki = manager.get_api_cache("meraki-corp").unwrap();
    // Per-device vendor fetched configs too: initial creation.
    assert_eq!(meraki.ap_configs.len(), 1);

    // Index spans both APIs.
    let index = manager.load_index().unwrap();
    assert_eq!(index.api_for_mac("aabbcc000001"), Some("mist-lab"));
    assert_eq!(index.api_for_mac("ddeeff000001"), Some("meraki-corp"));

    // Refresh durations recorded.
    assert!(mist.metadata.item_counts["sites"] == 2);
}

#[tokio::test]
async fn duplicate_site_needs_explicit_api() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(dir.path());
    let registry = two_vendor_registry(None);
    let cancel = CancellationToken::new();

    let errors = manager
        .refresh_all(&cancel, &registry, RefreshOptions::default())
        .await;
    assert!(errors.is_empty());

    let accessor = CacheAccessor::new();
    accessor.rebuild_indexes(&manager).unwrap();
    let resolver = Resolver::new(&manager, &accessor);

    let err = resolver.resolve_site("SHARED-SITE", None).unwrap_err();
    match err {
        CoreError::DuplicateSite { labels, .. } => {
            assert!(labels.contains(&"mist-lab".to_owned()));
            assert!(labels.contains(&"meraki-corp".to_owned()));
        }
        other => panic!("expected DuplicateSite, got {other:?}"),
    }

    let resolved = resolver.resolve_site("SHARED-SITE", Some("mist-lab")).unwrap();
    assert_eq!(resolved.site_id, "s2");
    assert_eq!(resolved.vendor, Vendor::Mist);
}

#[tokio::test]
async fn mac_collision_keeps_first_seen_owner() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(dir.path());
    // Same MAC claimed by both vendors.
    let registry = two_vendor_registry(Some("aa:bb:cc:dd:ee:f0"));
    let cancel = CancellationToken::new();

    let errors = manager
        .refresh_all(&cancel, &registry, RefreshOptions::default())
        .await;
    assert!(errors.is_empty());

    let index = manager.load_index().unwrap();
    // Traversal is sorted by label: meraki-corp < mist-lab.
    assert_eq!(index.api_for_mac("aabbccddeef0"), Some("meraki-corp"));
    // Exactly one entry for the colliding MAC.
    assert_eq!(
        index
            .mac_to_api
            .keys()
            .filter(|mac| mac.as_str() == "aabbccddeef0")
            .count(),
        1
    );
}

#[tokio::test]
async fn cancellation_aborts_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(dir.path());
    let registry = two_vendor_registry(None);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let errors = manager
        .refresh_all(&cancel, &registry, RefreshOptions::default())
        .await;

    // Both labels report cancellation; no cache files are written.
    assert!(matches!(errors.get("mist-lab"), Some(CoreError::Cancelled)));
    assert!(matches!(
        errors.get("meraki-corp"),
        Some(CoreError::Cancelled)
    ));
    assert!(!manager.api_cache_path("mist-lab").exists());
    // The reserved index label never carries a cancellation error here:
    // rebuild ran over an empty directory and succeeded.
    assert!(!errors.contains_key(INDEX_ERROR_LABEL));
}

#[tokio::test]
async fn ensure_device_config_is_noop_for_bulk_vendor() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(dir.path());
    let registry = two_vendor_registry(None);
    let cancel = CancellationToken::new();

    let errors = manager
        .refresh_all(&cancel, &registry, RefreshOptions::default())
        .await;
    assert!(errors.is_empty());

    // Already cached: no-op for the meraki device.
    let mac = MacAddress::normalize("dd:ee:ff:00:00:01");
    manager
        .ensure_device_config(&cancel, &registry, "meraki-corp", DeviceKind::Ap, &mac)
        .await
        .unwrap();

    // Bulk vendor: no-op even for an uncached MAC.
    let uncached = MacAddress::normalize("aa:bb:cc:00:00:02");
    manager
        .ensure_device_config(&cancel, &registry, "mist-lab", DeviceKind::Ap, &uncached)
        .await
        .unwrap();
}

#[tokio::test]
async fn accessor_spans_all_apis_after_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(dir.path());
    let registry = two_vendor_registry(None);
    let cancel = CancellationToken::new();

    let errors = manager
        .refresh_all(&cancel, &registry, RefreshOptions::default())
        .await;
    assert!(errors.is_empty());

    let accessor = CacheAccessor::new();
    accessor.rebuild_indexes(&manager).unwrap();

    // Cross-API O(1) lookups with provenance stamped.
    let mist_item = accessor
        .inventory_by_mac(&MacAddress::normalize("aa:bb:cc:00:00:01"))
        .unwrap();
    assert_eq!(mist_item.provenance.api, "mist-lab");
    assert_eq!(mist_item.provenance.vendor, Vendor::Mist);

    let meraki_status = accessor
        .status_by_mac(&MacAddress::normalize("dd:ee:ff:00:00:01"))
        .unwrap();
    assert_eq!(meraki_status.status, StatusKind::Dormant);
    assert_eq!(meraki_status.provenance.api, "meraki-corp");

    assert_eq!(accessor.all_sites().len(), 4);
}

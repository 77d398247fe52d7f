// ── Vendor client interface ──
//
// A `VendorClient` bundles up to nine capability facets. A facet the
// vendor cannot provide is `None`; core callers go through the
// `require_*` accessors, which turn an absent facet into a
// `CapabilityNotSupported` error naming the vendors that do support it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::model::{
    DeviceInfo, DeviceKind, DeviceProfile, DeviceStatus, GatewayTemplate, InventoryItem,
    MacAddress, RfTemplate, SiteInfo, Vendor, Wlan, WlanTemplate,
};

// ── Facet traits ─────────────────────────────────────────────────────

#[async_trait]
pub trait SitesService: Send + Sync {
    async fn list_sites(&self, cancel: &CancellationToken) -> Result<Vec<SiteInfo>, CoreError>;
}

#[async_trait]
pub trait InventoryService: Send + Sync {
    async fn list_inventory(
        &self,
        cancel: &CancellationToken,
        kind: DeviceKind,
    ) -> Result<Vec<InventoryItem>, CoreError>;

    /// Claim devices into the org. The arguments are serial numbers on
    /// every vendor -- Meraki's marketing says "claim code", but the API
    /// takes serials.
    async fn claim(&self, cancel: &CancellationToken, serials: &[String])
    -> Result<(), CoreError>;

    /// Release a device from its site/network by serial.
    async fn release(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        serial: &str,
    ) -> Result<(), CoreError>;
}

#[async_trait]
pub trait DevicesService: Send + Sync {
    async fn list_devices(&self, cancel: &CancellationToken)
    -> Result<Vec<DeviceInfo>, CoreError>;
}

#[async_trait]
pub trait StatusesService: Send + Sync {
    async fn list_statuses(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceStatus>, CoreError>;
}

#[async_trait]
pub trait TemplatesService: Send + Sync {
    async fn list_rf_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<RfTemplate>, CoreError>;
    async fn list_gateway_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<GatewayTemplate>, CoreError>;
    async fn list_wlan_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<WlanTemplate>, CoreError>;
}

#[async_trait]
pub trait ProfilesService: Send + Sync {
    async fn list_device_profiles(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceProfile>, CoreError>;
}

#[async_trait]
pub trait ConfigsService: Send + Sync {
    /// Whether this vendor can return every device's configuration in a
    /// site-scoped bulk call. Mist can; Meraki fetches per device.
    fn bulk_capable(&self) -> bool;

    /// Bulk-fetch configs for one site and device type. Returns pairs
    /// of normalized MAC and the vendor-shaped config map.
    async fn fetch_site_configs(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        kind: DeviceKind,
    ) -> Result<Vec<(MacAddress, Value)>, CoreError>;

    /// Fetch one device's configuration.
    async fn fetch_device_config(
        &self,
        cancel: &CancellationToken,
        item: &InventoryItem,
    ) -> Result<Value, CoreError>;

    /// Push a vendor-shaped configuration to one device.
    async fn push_device_config(
        &self,
        cancel: &CancellationToken,
        item: &InventoryItem,
        config: &Value,
    ) -> Result<(), CoreError>;
}

#[async_trait]
pub trait WlansService: Send + Sync {
    async fn list_wlans(&self, cancel: &CancellationToken) -> Result<Vec<Wlan>, CoreError>;
}

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Look up a device org-wide by MAC, bypassing the cache.
    async fn search_by_mac(
        &self,
        cancel: &CancellationToken,
        mac: &MacAddress,
    ) -> Result<Option<DeviceInfo>, CoreError>;
}

// ── Client bundle ────────────────────────────────────────────────────

/// One configured vendor connection with its capability facets.
pub struct VendorClient {
    pub label: String,
    pub vendor: Vendor,
    pub org_id: String,

    pub sites: Option<Arc<dyn SitesService>>,
    pub inventory: Option<Arc<dyn InventoryService>>,
    pub devices: Option<Arc<dyn DevicesService>>,
    pub statuses: Option<Arc<dyn StatusesService>>,
    pub templates: Option<Arc<dyn TemplatesService>>,
    pub profiles: Option<Arc<dyn ProfilesService>>,
    pub configs: Option<Arc<dyn ConfigsService>>,
    pub wlans: Option<Arc<dyn WlansService>>,
    pub search: Option<Arc<dyn SearchService>>,
}

/// Capability names in display order, paired with a facet presence
/// check. Shared by `capabilities()` and the registry status view.
const CAPABILITY_NAMES: [&str; 9] = [
    "sites",
    "inventory",
    "devices",
    "statuses",
    "templates",
    "profiles",
    "configs",
    "wlans",
    "search",
];

impl VendorClient {
    /// Names of the facets this client actually provides.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let present = [
            self.sites.is_some(),
            self.inventory.is_some(),
            self.devices.is_some(),
            self.statuses.is_some(),
            self.templates.is_some(),
            self.profiles.is_some(),
            self.configs.is_some(),
            self.wlans.is_some(),
            self.search.is_some(),
        ];
        CAPABILITY_NAMES
            .iter()
            .zip(present)
            .filter_map(|(name, has)| has.then_some(*name))
            .collect()
    }

    pub fn require_sites(&self) -> Result<&Arc<dyn SitesService>, CoreError> {
        self.sites.as_ref().ok_or_else(|| self.unsupported("sites"))
    }

    pub fn require_inventory(&self) -> Result<&Arc<dyn InventoryService>, CoreError> {
        self.inventory
            .as_ref()
            .ok_or_else(|| self.unsupported("inventory"))
    }

    pub fn require_statuses(&self) -> Result<&Arc<dyn StatusesService>, CoreError> {
        self.statuses
            .as_ref()
            .ok_or_else(|| self.unsupported("statuses"))
    }

    pub fn require_configs(&self) -> Result<&Arc<dyn ConfigsService>, CoreError> {
        self.configs
            .as_ref()
            .ok_or_else(|| self.unsupported("configs"))
    }

    pub fn require_search(&self) -> Result<&Arc<dyn SearchService>, CoreError> {
        self.search
            .as_ref()
            .ok_or_else(|| self.unsupported("search"))
    }

    fn unsupported(&self, capability: &'static str) -> CoreError {
        CoreError::CapabilityNotSupported {
            vendor: self.vendor,
            label: self.label.clone(),
            capability,
            supported_by: vendors_supporting(capability),
        }
    }
}

impl std::fmt::Debug for VendorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorClient")
            .field("label", &self.label)
            .field("vendor", &self.vendor)
            .field("org_id", &self.org_id)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Which vendors implement a capability. Static knowledge used to make
/// `CapabilityNotSupported` messages actionable.
pub fn vendors_supporting(capability: &str) -> Vec<Vendor> {
    match capability {
        "templates" | "search" => vec![Vendor::Mist],
        _ => vec![Vendor::Mist, Vendor::Meraki],
    }
}

// ── Inventory domain types ──

use serde::{Deserialize, Serialize};

use super::common::{DeviceKind, Provenance};
use super::mac::MacAddress;

/// External asset-database reference attached to an inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetboxRef {
    pub id: i64,
    #[serde(default)]
    pub url: String,
}

/// One org-inventory entry: a device known to the vendor cloud,
/// claimed or not, assigned to a site or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Vendor-assigned device id (opaque; Meraki uses the serial here).
    pub id: String,
    pub mac: MacAddress,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub name: String,
    pub device_type: DeviceKind,
    /// Assigned site; empty when unassigned.
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub claimed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netbox: Option<NetboxRef>,

    #[serde(skip)]
    pub provenance: Provenance,
}

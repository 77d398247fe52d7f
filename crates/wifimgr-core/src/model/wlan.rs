// ── WLAN domain type ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::Provenance;

/// A wireless network (Mist WLAN / Meraki SSID) in vendor-neutral form.
///
/// The PSK is masked at the adapter boundary -- the cache never holds a
/// cleartext passphrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wlan {
    pub id: String,
    pub ssid: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(default)]
    pub auth_type: String,
    #[serde(default)]
    pub encryption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psk_masked: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub radius_servers: Vec<String>,
    /// Vendor-specific settings with no common schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_config: Option<Value>,

    #[serde(skip)]
    pub provenance: Provenance,
}

/// Mask a passphrase for cache storage: first two characters plus stars.
pub fn mask_psk(psk: &str) -> String {
    let visible: String = psk.chars().take(2).collect();
    format!("{visible}{}", "*".repeat(psk.chars().count().saturating_sub(2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn psk_masking_keeps_prefix() {
        assert_eq!(mask_psk("hunter2!"), "hu******");
        assert_eq!(mask_psk("a"), "a");
        assert_eq!(mask_psk(""), "");
    }
}

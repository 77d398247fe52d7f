// ── Canonical AP device configuration ──
//
// The vendor-neutral, typed representation of an access point's
// configuration. Everything the two vendors can express in common lives
// here; fields with no shared schema go in the `mist`/`meraki`
// extension maps and are merged back at the outbound boundary.
//
// Serialization contract: absent fields are omitted entirely, so a
// round-trip through JSON never invents explicit nulls the vendors
// would reject.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::mac::MacAddress;

/// Canonical access-point configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ApDeviceConfig {
    // ── Identity ─────────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    // ── Placement ────────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
    /// Resolved to `map_id` before submission; mutually exclusive with it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPosition>,

    // ── Profile reference ────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviceprofile_id: Option<String>,
    /// Resolved to `deviceprofile_id` before submission; mutually
    /// exclusive with it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviceprofile_name: Option<String>,

    // ── Subsystems ───────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_config: Option<RadioConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_config: Option<IpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ble_config: Option<BleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_config: Option<BTreeMap<String, PortConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lacp_config: Option<LacpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink_port_config: Option<UplinkPortConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iot_config: Option<IotConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poe_passthrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led: Option<LedConfig>,

    /// Deprecated: legacy top-level VLAN. Kept for old config files;
    /// the validator warns and callers should move it into `ip_config`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,

    // ── Vendor extension blocks ──────────────────────────────────────
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub mist: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meraki: Map<String, Value>,
}

/// Floorplan position.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GeoPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f64>,
}

/// Per-band radio settings plus radio-wide toggles.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RadioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_24: Option<BandConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_5: Option<BandConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_6: Option<BandConfig>,
    /// Dual-band / flex radio: which band it operates in is selected by
    /// `radio_mode` inside the band settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_dual: Option<BandConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanning_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antenna_mode: Option<String>,
}

/// One band's worth of radio settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BandConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u16>,
    /// Channel width in MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u16>,
    /// TX power in dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ant_gain: Option<i8>,
    /// Only meaningful on `band_dual`: the band the flex radio operates
    /// in (24, 5, or 6). Required whenever any other setting is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_mode: Option<u8>,
}

impl BandConfig {
    /// True when the band carries any setting beyond `disabled`.
    pub fn has_settings_beyond_disabled(&self) -> bool {
        self.channel.is_some()
            || self.bandwidth.is_some()
            || self.power.is_some()
            || self.ant_gain.is_some()
            || self.radio_mode.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IpConfig {
    /// "dhcp" or "static".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ip_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MeshConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// "base" or "remote".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PortConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LacpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UplinkPortConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot1x: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_wlans_up_if_down: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_serializes_to_empty_object() {
        let cfg = ApDeviceConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn band_settings_detection() {
        let disabled_only = BandConfig {
            disabled: Some(true),
            ..Default::default()
        };
        assert!(!disabled_only.has_settings_beyond_disabled());

        let with_power = BandConfig {
            power: Some(17),
            ..Default::default()
        };
        assert!(with_power.has_settings_beyond_disabled());
    }

    #[test]
    fn ip_type_renames_to_type() {
        let ip = IpConfig {
            ip_type: Some("static".into()),
            ip: Some("10.0.0.5".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&ip).unwrap();
        assert_eq!(json["type"], "static");
        assert!(json.get("ip_type").is_none());
    }
}

// ── Configuration translation and validation ──
//
// Round-trips between the canonical `ApDeviceConfig` and the two
// vendor map shapes, plus the structural and vendor-compatibility
// validators that gate every translation.

pub mod meraki;
pub mod mist;
pub mod validate;

pub use meraki::{from_meraki_map, prepare_for_meraki, to_meraki_map};
pub use mist::{from_mist_map, prepare_for_mist, to_mist_map};
pub use validate::{validate_for_vendor, validate_structural};

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::{ApDeviceConfig, Vendor};

/// Parse a canonical-shaped map (e.g. the output of template
/// expansion) into the typed config. Keys outside the canonical schema
/// land in the target vendor's extension block instead of being lost.
pub fn parse_canonical(value: &Value, vendor: Vendor) -> Result<ApDeviceConfig, CoreError> {
    let Some(source) = value.as_object() else {
        return Err(CoreError::FieldMapping {
            field: "<root>".into(),
            expected: "object",
            context: "canonical device config".into(),
        });
    };

    let mut canonical = Map::new();
    let mut extra = Map::new();
    for (key, val) in source {
        if CANONICAL_KEYS.contains(&key.as_str()) || key == "mist" || key == "meraki" {
            canonical.insert(key.clone(), val.clone());
        } else {
            extra.insert(key.clone(), val.clone());
        }
    }

    let mut cfg: ApDeviceConfig = serde_json::from_value(Value::Object(canonical))?;
    let ext = match vendor {
        Vendor::Meraki => &mut cfg.meraki,
        _ => &mut cfg.mist,
    };
    for (key, val) in extra {
        ext.entry(key).or_insert(val);
    }
    Ok(cfg)
}

/// Top-level keys of the canonical schema. Inbound translation keeps
/// these and re-extracts everything else into the vendor extension
/// block.
pub(crate) const CANONICAL_KEYS: [&str; 21] = [
    "name",
    "mac",
    "notes",
    "site",
    "site_id",
    "map_id",
    "map_name",
    "location",
    "deviceprofile_id",
    "deviceprofile_name",
    "radio_config",
    "ip_config",
    "ble_config",
    "mesh",
    "port_config",
    "lacp_config",
    "uplink_port_config",
    "iot_config",
    "poe_passthrough",
    "led",
    "vlan_id",
];

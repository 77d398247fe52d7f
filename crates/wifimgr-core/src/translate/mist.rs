// ── Mist translation ──
//
// Canonical `ApDeviceConfig` ↔ Mist device-config maps. The canonical
// schema grew out of Mist's, so most fields pass through by name; the
// work is the dual-band radio idiom and the extension block.
//
// Dual-band radios: canonical `band_dual` + `radio_mode` maps to Mist's
// `band_24_usage` marker -- mode 24 folds the settings into `band_24`,
// mode 5 puts them under `band_5_on_24_radio`.
//
// Extensions: the `mist` block merges flat into the top level outbound;
// inbound, any key the canonical schema does not recognize is
// re-extracted into it.

use serde_json::{Map, Value};

use super::CANONICAL_KEYS;
use crate::error::CoreError;
use crate::model::ApDeviceConfig;
use crate::resolver::Resolver;
use crate::template::deep_merge;

/// Resolve `*_name` references to ids for Mist submission, clearing the
/// name fields on success. Unresolved names are fatal.
///
/// `site_maps` holds the target site's floorplan name → id candidates.
pub fn prepare_for_mist(
    cfg: &mut ApDeviceConfig,
    resolver: &Resolver<'_>,
    api: &str,
    site_maps: &std::collections::BTreeMap<String, String>,
) -> Result<(), CoreError> {
    if let Some(name) = cfg.deviceprofile_name.take() {
        cfg.deviceprofile_id = Some(resolver.resolve_device_profile(api, &name)?);
    }
    if let Some(name) = cfg.map_name.take() {
        cfg.map_id = Some(resolver.resolve_named(
            "map",
            &name,
            format!("site maps (API '{api}')"),
            site_maps,
        )?);
    }
    Ok(())
}

/// Convert a canonical config into the Mist device-update map.
pub fn to_mist_map(cfg: &ApDeviceConfig) -> Result<Value, CoreError> {
    let mut map = serde_json::to_value(cfg)?;
    let Some(obj) = map.as_object_mut() else {
        return Err(CoreError::validation("config did not serialize to an object"));
    };
    obj.remove("mist");
    obj.remove("meraki");

    // Dual-band idiom.
    if let Some(radio) = obj.get_mut("radio_config").and_then(Value::as_object_mut) {
        if let Some(Value::Object(mut dual)) = radio.remove("band_dual") {
            let mode = dual
                .remove("radio_mode")
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    CoreError::validation("'band_dual' requires 'radio_mode' for mist translation")
                })?;
            match mode {
                24 => {
                    radio.insert("band_24_usage".into(), Value::String("24".into()));
                    let slot = radio
                        .entry("band_24".to_owned())
                        .or_insert_with(|| Value::Object(Map::new()));
                    deep_merge(slot, &Value::Object(dual));
                }
                5 => {
                    radio.insert("band_24_usage".into(), Value::String("5".into()));
                    radio.insert("band_5_on_24_radio".into(), Value::Object(dual));
                }
                other => {
                    return Err(CoreError::validation(format!(
                        "mist dual-band radios support modes 24 and 5, got {other}"
                    )));
                }
            }
        }
    }

    // Mist extensions land flat at the top level.
    if !cfg.mist.is_empty() {
        deep_merge(&mut map, &Value::Object(cfg.mist.clone()));
    }
    Ok(map)
}

/// Parse a Mist device map back into canonical form. Unknown keys go to
/// the `mist` extension block.
pub fn from_mist_map(value: &Value) -> Result<ApDeviceConfig, CoreError> {
    let Some(source) = value.as_object() else {
        return Err(CoreError::FieldMapping {
            field: "<root>".into(),
            expected: "object",
            context: "mist device config".into(),
        });
    };

    let mut canonical = Map::new();
    let mut extension = Map::new();
    for (key, val) in source {
        if CANONICAL_KEYS.contains(&key.as_str()) {
            canonical.insert(key.clone(), val.clone());
        } else {
            extension.insert(key.clone(), val.clone());
        }
    }

    // Reverse the dual-band idiom before deserializing.
    if let Some(radio) = canonical
        .get_mut("radio_config")
        .and_then(Value::as_object_mut)
    {
        if let Some(usage) = radio.remove("band_24_usage").and_then(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        }) {
            let mut dual = match usage.as_str() {
                "5" => match radio.remove("band_5_on_24_radio") {
                    Some(Value::Object(settings)) => settings,
                    _ => Map::new(),
                },
                _ => match radio.remove("band_24") {
                    Some(Value::Object(settings)) => settings,
                    _ => Map::new(),
                },
            };
            let mode = if usage == "5" { 5 } else { 24 };
            dual.insert("radio_mode".into(), Value::from(mode));
            radio.insert("band_dual".into(), Value::Object(dual));
        }
    }

    let mut cfg: ApDeviceConfig = serde_json::from_value(Value::Object(canonical))?;
    cfg.mist = extension;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::model::{BandConfig, RadioConfig};

    use super::*;

    #[test]
    fn dual_mode_5_uses_band_5_on_24_radio() {
        let cfg = ApDeviceConfig {
            name: Some("ap-1".into()),
            radio_config: Some(RadioConfig {
                band_dual: Some(BandConfig {
                    power: Some(14),
                    channel: Some(44),
                    radio_mode: Some(5),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let map = to_mist_map(&cfg).unwrap();
        assert_eq!(map["radio_config"]["band_24_usage"], "5");
        assert_eq!(map["radio_config"]["band_5_on_24_radio"]["power"], 14);
        assert_eq!(map["radio_config"]["band_5_on_24_radio"]["channel"], 44);
        assert!(map["radio_config"].get("band_dual").is_none());
    }

    #[test]
    fn dual_mode_24_folds_into_band_24() {
        let cfg = ApDeviceConfig {
            name: Some("ap-1".into()),
            radio_config: Some(RadioConfig {
                band_dual: Some(BandConfig {
                    power: Some(10),
                    radio_mode: Some(24),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let map = to_mist_map(&cfg).unwrap();
        assert_eq!(map["radio_config"]["band_24_usage"], "24");
        assert_eq!(map["radio_config"]["band_24"]["power"], 10);
    }

    #[test]
    fn extensions_merge_flat() {
        let mut cfg = ApDeviceConfig {
            name: Some("ap-1".into()),
            ..Default::default()
        };
        cfg.mist.insert("scanning_enabled".into(), json!(true));

        let map = to_mist_map(&cfg).unwrap();
        assert_eq!(map["scanning_enabled"], true);
        assert!(map.get("mist").is_none());
    }

    #[test]
    fn round_trip_preserves_dual_radio() {
        let map = json!({
            "name": "ap-1",
            "radio_config": {
                "band_24_usage": "5",
                "band_5_on_24_radio": { "power": 14, "channel": 44 },
                "band_5": { "power": 17 },
            },
            "scanning_enabled": true,
        });

        let cfg = from_mist_map(&map).unwrap();
        let dual = cfg
            .radio_config
            .as_ref()
            .unwrap()
            .band_dual
            .as_ref()
            .unwrap();
        assert_eq!(dual.radio_mode, Some(5));
        assert_eq!(dual.power, Some(14));
        assert_eq!(cfg.mist["scanning_enabled"], true);

        let back = to_mist_map(&cfg).unwrap();
        assert_eq!(back["radio_config"]["band_24_usage"], "5");
        assert_eq!(back["radio_config"]["band_5_on_24_radio"]["power"], 14);
        assert_eq!(back["radio_config"]["band_5"]["power"], 17);
        assert_eq!(back["scanning_enabled"], true);
    }

    #[test]
    fn unknown_keys_become_extension() {
        let map = json!({
            "name": "ap-1",
            "some_new_mist_field": { "x": 1 },
        });
        let cfg = from_mist_map(&map).unwrap();
        assert_eq!(cfg.mist["some_new_mist_field"]["x"], 1);
        assert_eq!(cfg.name.as_deref(), Some("ap-1"));
    }
}

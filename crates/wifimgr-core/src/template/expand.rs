// ── Vendor-aware template expansion ──
//
// Produces the final per-device configuration map to send to a vendor.
// Expansion is pure: the store is never mutated and every call builds a
// fresh result. Precedence, lowest to highest: device template, radio
// profile, WLAN expansion, then the device's own fields.

use serde_json::{Map, Value};
use tracing::debug;

use super::merge::deep_merge;
use super::store::TemplateStore;
use crate::error::CoreError;
use crate::model::Vendor;
use crate::resolver::closest_matches;

/// Fields on a device config that reference templates rather than
/// carrying configuration. They steer expansion and never appear in
/// the result.
const TEMPLATE_REFERENCE_FIELDS: [&str; 3] = ["radio_profile", "device_template", "wlan"];

/// Infer a vendor tag from an API label: split once on `-`, lowercase
/// the head. Recognized heads map to vendor tags; anything else passes
/// through unchanged.
pub fn vendor_tag_from_label(label: &str) -> String {
    let head = label.split_once('-').map_or(label, |(head, _)| head);
    let lowered = head.to_ascii_lowercase();
    if Vendor::from_tag(&lowered) == Vendor::Unknown {
        label.to_owned()
    } else {
        lowered
    }
}

/// Specialize a multi-vendor template for one vendor.
///
/// Copies every key whose name does not end in `:` (the common fields),
/// then deep-merges the `<vendor>:` subtree over the result if present.
/// Other vendors' subtrees are dropped entirely.
pub fn expand_for_vendor(template: &Value, vendor: &str) -> Value {
    let Some(obj) = template.as_object() else {
        return template.clone();
    };

    let mut result = Map::new();
    for (key, value) in obj {
        if !key.ends_with(':') {
            result.insert(key.clone(), value.clone());
        }
    }

    let mut result = Value::Object(result);
    if let Some(vendor_block) = obj.get(&format!("{vendor}:")) {
        deep_merge(&mut result, vendor_block);
    }
    result
}

/// Expand a device configuration into the final vendor-ready map.
///
/// `site_wlans` is the site-level WLAN label list; a device-level
/// `wlan` list wins over it.
pub fn expand_device_config(
    store: &TemplateStore,
    device_config: &Value,
    site_wlans: Option<&[String]>,
    vendor: &str,
) -> Result<Value, CoreError> {
    let mut result = Value::Object(Map::new());
    let device = device_config.as_object();

    // 1. Device template, lowest precedence.
    if let Some(name) = field_str(device, "device_template") {
        let template = store.device(name).ok_or_else(|| CoreError::NotFound {
            kind: "device template",
            key: name.to_owned(),
            scope: "template store".into(),
            suggestions: closest_matches(name, &store.device_names()),
        })?;
        deep_merge(&mut result, &expand_for_vendor(&template, vendor));
    }

    // 2. Radio profile, wrapped under radio_config.
    if let Some(name) = field_str(device, "radio_profile") {
        let template = store.radio(name).ok_or_else(|| CoreError::NotFound {
            kind: "radio template",
            key: name.to_owned(),
            scope: "template store".into(),
            suggestions: closest_matches(name, &store.radio_names()),
        })?;
        let expanded = expand_for_vendor(&template, vendor);
        let mut wrapper = Map::new();
        wrapper.insert("radio_config".to_owned(), expanded);
        deep_merge(&mut result, &Value::Object(wrapper));
    }

    // 3. WLANs: device-level label list wins over site-level.
    let device_wlans: Option<Vec<String>> = device
        .and_then(|d| d.get("wlan"))
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        });
    let labels: Option<Vec<String>> = device_wlans.or_else(|| site_wlans.map(<[String]>::to_vec));

    if let Some(labels) = labels {
        let mut expanded = Vec::with_capacity(labels.len());
        for label in &labels {
            let template = store.wlan(label).ok_or_else(|| CoreError::NotFound {
                kind: "WLAN template",
                key: label.clone(),
                scope: "template store".into(),
                suggestions: closest_matches(label, &store.wlan_names()),
            })?;
            expanded.push(expand_for_vendor(&template, vendor));
        }
        if let Some(obj) = result.as_object_mut() {
            obj.insert("wlan".to_owned(), Value::Array(expanded));
        }
    }

    // 4. Device's own fields win over everything template-derived.
    if let Some(device) = device {
        let mut own = Map::new();
        for (key, value) in device {
            if !TEMPLATE_REFERENCE_FIELDS.contains(&key.as_str()) {
                own.insert(key.clone(), value.clone());
            }
        }
        deep_merge(&mut result, &Value::Object(own));
    }

    // 5. Bands with real settings get an explicit disabled: false, so
    // the vendor never treats an implicitly-enabled band as untouched.
    enable_configured_bands(&mut result);

    debug!(vendor, "device config expanded");
    Ok(result)
}

/// For each band subconfig under `radio_config` carrying settings
/// beyond `disabled`, make `disabled: false` explicit. A band with only
/// `disabled: true` (or an explicit `disabled`) is left alone.
fn enable_configured_bands(result: &mut Value) {
    let Some(radio) = result
        .as_object_mut()
        .and_then(|obj| obj.get_mut("radio_config"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    for (key, band) in radio.iter_mut() {
        if !key.starts_with("band_") {
            continue;
        }
        let Some(band_obj) = band.as_object_mut() else {
            continue;
        };
        let has_settings = band_obj.keys().any(|k| k != "disabled");
        if has_settings && !band_obj.contains_key("disabled") {
            band_obj.insert("disabled".to_owned(), Value::Bool(false));
        }
    }
}

fn field_str<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    obj.and_then(|o| o.get(key)).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store_with(radio: Value, wlan: Value, device: Value) -> TemplateStore {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(
            &path,
            serde_json::to_string(&json!({
                "version": 1,
                "radio_templates": radio,
                "wlan_templates": wlan,
                "device_templates": device,
            }))
            .unwrap(),
        )
        .unwrap();
        TemplateStore::load_files(&[path]).unwrap()
    }

    #[test]
    fn vendor_inference_from_label() {
        assert_eq!(vendor_tag_from_label("mist-prod"), "mist");
        assert_eq!(vendor_tag_from_label("MERAKI-corp"), "meraki");
        assert_eq!(vendor_tag_from_label("lab"), "lab");
        assert_eq!(vendor_tag_from_label("acme-lab"), "acme-lab");
    }

    #[test]
    fn common_only_template_expands_to_itself() {
        let template = json!({ "band_5": { "power": 15 }, "scanning_enabled": true });
        for vendor in ["mist", "meraki", "other"] {
            assert_eq!(expand_for_vendor(&template, vendor), template);
        }
    }

    #[test]
    fn vendor_blocks_are_isolated() {
        let template = json!({
            "band_5": { "power": 15 },
            "mist:": { "scanning_enabled": true },
            "meraki:": { "rf_profile_id": "rf-123" },
        });

        let mist = expand_for_vendor(&template, "mist");
        assert_eq!(mist["scanning_enabled"], true);
        assert!(mist.get("rf_profile_id").is_none());
        assert!(mist.get("mist:").is_none());

        let meraki = expand_for_vendor(&template, "meraki");
        assert_eq!(meraki["rf_profile_id"], "rf-123");
        assert!(meraki.get("scanning_enabled").is_none());
    }

    #[test]
    fn device_overrides_template_and_band_enabled_made_explicit() {
        let store = store_with(
            json!({ "high-density": { "band_5": { "power": 15, "bandwidth": 40 } } }),
            json!({}),
            json!({}),
        );
        let device = json!({
            "radio_profile": "high-density",
            "radio_config": { "band_5": { "power": 20 } },
        });

        let result = expand_device_config(&store, &device, None, "mist").unwrap();
        assert_eq!(result["radio_config"]["band_5"]["power"], 20);
        assert_eq!(result["radio_config"]["band_5"]["bandwidth"], 40);
        assert_eq!(result["radio_config"]["band_5"]["disabled"], false);
    }

    #[test]
    fn disabled_only_band_is_untouched() {
        let store = store_with(json!({}), json!({}), json!({}));
        let device = json!({
            "radio_config": { "band_6": { "disabled": true } },
        });

        let result = expand_device_config(&store, &device, None, "mist").unwrap();
        assert_eq!(result["radio_config"]["band_6"], json!({ "disabled": true }));
    }

    #[test]
    fn device_wlan_list_wins_over_site_list() {
        let store = store_with(
            json!({}),
            json!({
                "corp": { "ssid": "corp" },
                "guest": { "ssid": "guest" },
            }),
            json!({}),
        );
        let device = json!({ "wlan": ["guest"] });
        let site = vec!["corp".to_owned()];

        let result = expand_device_config(&store, &device, Some(&site), "mist").unwrap();
        let wlans = result["wlan"].as_array().unwrap();
        assert_eq!(wlans.len(), 1);
        assert_eq!(wlans[0]["ssid"], "guest");
    }

    #[test]
    fn site_wlans_apply_when_device_has_none() {
        let store = store_with(json!({}), json!({ "corp": { "ssid": "corp" } }), json!({}));
        let device = json!({ "name": "ap-1" });
        let site = vec!["corp".to_owned()];

        let result = expand_device_config(&store, &device, Some(&site), "mist").unwrap();
        assert_eq!(result["wlan"][0]["ssid"], "corp");
        assert_eq!(result["name"], "ap-1");
    }

    #[test]
    fn missing_template_reports_suggestions() {
        let store = store_with(
            json!({ "high-density": { "band_5": { "power": 15 } } }),
            json!({}),
            json!({}),
        );
        let device = json!({ "radio_profile": "high-densty" });

        let err = expand_device_config(&store, &device, None, "mist").unwrap_err();
        match err {
            CoreError::NotFound { suggestions, .. } => {
                assert_eq!(suggestions, vec!["high-density".to_owned()]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn reference_fields_never_leak_into_result() {
        let store = store_with(
            json!({ "hd": { "band_5": { "power": 15 } } }),
            json!({}),
            json!({ "base": { "led": { "enabled": true } } }),
        );
        let device = json!({
            "device_template": "base",
            "radio_profile": "hd",
            "name": "ap-1",
        });

        let result = expand_device_config(&store, &device, None, "mist").unwrap();
        assert!(result.get("device_template").is_none());
        assert!(result.get("radio_profile").is_none());
        assert_eq!(result["led"]["enabled"], true);
        assert_eq!(result["name"], "ap-1");
    }
}

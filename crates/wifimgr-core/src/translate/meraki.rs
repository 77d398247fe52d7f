// ── Meraki translation ──
//
// Canonical `ApDeviceConfig` ↔ Meraki wireless radio-settings maps.
// The shapes diverge much more than Mist's:
//
//   bands      -- `band_24/5/6` ↔ `twoFourGhzSettings` /
//                `fiveGhzSettings` / `sixGhzSettings`
//   flex radio -- `band_dual` + `radio_mode` ↔ `flexRadioBand` with the
//                settings folded into the matching GhzSettings block
//   width      -- canonical integer MHz ↔ Meraki string ("80"); the
//                "auto" token is not a number and round-trips through
//                the `channel_width_auto` extension object instead,
//                keyed per band so a fleet mixing "auto" on 5 GHz with
//                a fixed 6 GHz width survives the round trip
//   extension  -- known keys (`rf_profile_id`) translate to their real
//                Dashboard fields; the rest stays nested under `meraki`
//
// Power: canonical `power` ↔ Meraki `targetPower`.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::{ApDeviceConfig, BandConfig, RadioConfig};
use crate::resolver::Resolver;

/// Extension key marking bands whose channel width is "auto". The
/// value is an object of canonical band names (`band_5`, `band_6`,
/// `band_dual`) mapped to true.
const WIDTH_AUTO_FLAG: &str = "channel_width_auto";

/// Resolve the meraki-block `rf_profile_name` to `rf_profile_id` for
/// submission, clearing the name on success. Meraki RF profiles are
/// cached through the profiles facet, so the device-profile scope
/// applies.
pub fn prepare_for_meraki(
    cfg: &mut ApDeviceConfig,
    resolver: &Resolver<'_>,
    api: &str,
) -> Result<(), CoreError> {
    if let Some(Value::String(name)) = cfg.meraki.remove("rf_profile_name") {
        let id = resolver.resolve_device_profile(api, &name)?;
        cfg.meraki.insert("rf_profile_id".into(), Value::String(id));
    }
    Ok(())
}

/// Convert a canonical config into the Meraki radio-settings map.
pub fn to_meraki_map(cfg: &ApDeviceConfig) -> Result<Value, CoreError> {
    let mut map = Map::new();
    let mut extension = cfg.meraki.clone();

    if let Some(name) = &cfg.name {
        map.insert("name".into(), Value::String(name.clone()));
    }

    let auto_bands = take_auto_bands(&mut extension);

    if let Some(radio) = &cfg.radio_config {
        if let Some(band) = &radio.band_24 {
            map.insert(
                "twoFourGhzSettings".into(),
                band_to_settings(band, false, false)?,
            );
        }
        if let Some(band) = &radio.band_5 {
            map.insert(
                "fiveGhzSettings".into(),
                band_to_settings(band, true, auto_bands.contains("band_5"))?,
            );
        }
        if let Some(band) = &radio.band_6 {
            map.insert(
                "sixGhzSettings".into(),
                band_to_settings(band, true, auto_bands.contains("band_6"))?,
            );
        }
        if let Some(dual) = &radio.band_dual {
            let mode = dual.radio_mode.ok_or_else(|| {
                CoreError::validation("'band_dual' requires 'radio_mode' for meraki translation")
            })?;
            let (flex, slot) = match mode {
                5 => ("5", "fiveGhzSettings"),
                6 => ("6", "sixGhzSettings"),
                other => {
                    return Err(CoreError::validation(format!(
                        "meraki flex radios support modes 5 and 6, got {other}"
                    )));
                }
            };
            map.insert("flexRadioBand".into(), Value::String(flex.into()));
            map.insert(
                slot.into(),
                band_to_settings(dual, true, auto_bands.contains("band_dual"))?,
            );
        }
    }

    // Known extension keys translate to real Dashboard fields.
    if let Some(id) = extension.remove("rf_profile_id") {
        map.insert("rfProfileId".into(), id);
    }

    // Whatever remains stays nested -- Meraki extensions never flatten.
    if !extension.is_empty() {
        map.insert("meraki".into(), Value::Object(extension));
    }

    Ok(Value::Object(map))
}

/// Pull the width-auto marker out of the extension block. Older caches
/// wrote a single boolean for the whole radio; that form applies to
/// every width-carrying band.
fn take_auto_bands(extension: &mut Map<String, Value>) -> BTreeSet<String> {
    match extension.remove(WIDTH_AUTO_FLAG) {
        Some(Value::Object(bands)) => bands
            .into_iter()
            .filter(|(_, v)| v.as_bool() == Some(true))
            .map(|(band, _)| band)
            .collect(),
        Some(Value::Bool(true)) => ["band_5", "band_6", "band_dual"]
            .iter()
            .map(|band| (*band).to_owned())
            .collect(),
        _ => BTreeSet::new(),
    }
}

fn band_to_settings(
    band: &BandConfig,
    carries_width: bool,
    width_auto: bool,
) -> Result<Value, CoreError> {
    let mut settings = Map::new();
    if let Some(channel) = band.channel {
        settings.insert("channel".into(), Value::from(channel));
    }
    if carries_width {
        if width_auto {
            settings.insert("channelWidth".into(), Value::String("auto".into()));
        } else if let Some(width) = band.bandwidth {
            settings.insert("channelWidth".into(), Value::String(width.to_string()));
        }
    }
    if let Some(power) = band.power {
        settings.insert("targetPower".into(), Value::from(power));
    }
    if let Some(disabled) = band.disabled {
        settings.insert("enabled".into(), Value::Bool(!disabled));
    }
    Ok(Value::Object(settings))
}

/// Parse a Meraki radio-settings map back into canonical form.
pub fn from_meraki_map(value: &Value) -> Result<ApDeviceConfig, CoreError> {
    let Some(source) = value.as_object() else {
        return Err(CoreError::FieldMapping {
            field: "<root>".into(),
            expected: "object",
            context: "meraki radio settings".into(),
        });
    };

    let mut cfg = ApDeviceConfig::default();
    let mut radio = RadioConfig::default();
    let mut auto_bands: Vec<&str> = Vec::new();

    let flex_band = source
        .get("flexRadioBand")
        .and_then(Value::as_str)
        .map(str::to_owned);

    for (slot, mode) in [("fiveGhzSettings", 5u8), ("sixGhzSettings", 6u8)] {
        if let Some(settings) = source.get(slot) {
            let (band, auto) = settings_to_band(settings)?;
            // The auto marker sticks to whichever canonical band this
            // settings block decodes into.
            if flex_band.as_deref() == Some(mode.to_string().as_str()) {
                radio.band_dual = Some(BandConfig {
                    radio_mode: Some(mode),
                    ..band
                });
                if auto {
                    auto_bands.push("band_dual");
                }
            } else if mode == 5 {
                radio.band_5 = Some(band);
                if auto {
                    auto_bands.push("band_5");
                }
            } else {
                radio.band_6 = Some(band);
                if auto {
                    auto_bands.push("band_6");
                }
            }
        }
    }
    if let Some(settings) = source.get("twoFourGhzSettings") {
        let (band, _) = settings_to_band(settings)?;
        radio.band_24 = Some(band);
    }

    if radio != RadioConfig::default() {
        cfg.radio_config = Some(radio);
    }

    if let Some(Value::String(name)) = source.get("name") {
        cfg.name = Some(name.clone());
    }
    if let Some(id) = source.get("rfProfileId") {
        if !id.is_null() {
            cfg.meraki.insert("rf_profile_id".into(), id.clone());
        }
    }
    if !auto_bands.is_empty() {
        let mut bands = Map::new();
        for band in auto_bands {
            bands.insert(band.to_owned(), Value::Bool(true));
        }
        cfg.meraki.insert(WIDTH_AUTO_FLAG.into(), Value::Object(bands));
    }

    // Nested extension block round-trips verbatim; unclaimed top-level
    // keys join it.
    if let Some(Value::Object(nested)) = source.get("meraki") {
        for (key, val) in nested {
            cfg.meraki.insert(key.clone(), val.clone());
        }
    }
    const CLAIMED: [&str; 7] = [
        "name",
        "rfProfileId",
        "flexRadioBand",
        "twoFourGhzSettings",
        "fiveGhzSettings",
        "sixGhzSettings",
        "meraki",
    ];
    for (key, val) in source {
        if !CLAIMED.contains(&key.as_str()) {
            cfg.meraki.insert(key.clone(), val.clone());
        }
    }

    Ok(cfg)
}

fn settings_to_band(settings: &Value) -> Result<(BandConfig, bool), CoreError> {
    let Some(obj) = settings.as_object() else {
        return Err(CoreError::FieldMapping {
            field: "GhzSettings".into(),
            expected: "object",
            context: "meraki radio settings".into(),
        });
    };

    let mut band = BandConfig::default();
    let mut width_auto = false;

    if let Some(channel) = obj.get("channel").and_then(Value::as_u64) {
        band.channel = u16::try_from(channel).ok();
    }
    match obj.get("channelWidth") {
        Some(Value::String(s)) if s == "auto" => width_auto = true,
        Some(Value::String(s)) => band.bandwidth = s.parse().ok(),
        Some(Value::Number(n)) => band.bandwidth = n.as_u64().and_then(|v| u16::try_from(v).ok()),
        _ => {}
    }
    if let Some(power) = obj.get("targetPower").and_then(Value::as_i64) {
        band.power = i8::try_from(power).ok();
    }
    if let Some(enabled) = obj.get("enabled").and_then(Value::as_bool) {
        band.disabled = Some(!enabled);
    }

    Ok((band, width_auto))
}

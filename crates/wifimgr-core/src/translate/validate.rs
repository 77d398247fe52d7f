// ── Canonical configuration validation ──
//
// Two passes over an `ApDeviceConfig`:
//
//   structural -- required fields, mutual exclusions, numeric ranges,
//   per-band channel and width sets. Runs before any translation.
//
//   vendor compatibility -- a config targeting vendor X must not carry
//   the other vendor's extension block, fields X is known to reject, or
//   a flex-radio mode X cannot operate in.
//
// Deprecated fields produce warnings and are never removed here.

use crate::error::CoreError;
use crate::model::{ApDeviceConfig, BandConfig, Vendor};

/// 5 GHz U-NII channels both vendors accept.
const CHANNELS_5GHZ: [u16; 25] = [
    36, 40, 44, 48, 52, 56, 60, 64, 100, 104, 108, 112, 116, 120, 124, 128, 132, 136, 140, 144,
    149, 153, 157, 161, 165,
];

fn is_6ghz_channel(channel: u16) -> bool {
    (1..=233).contains(&channel) && channel % 4 == 1
}

/// Structural validation. Returns deprecation warnings on success.
pub fn validate_structural(cfg: &ApDeviceConfig) -> Result<Vec<String>, CoreError> {
    let mut warnings = Vec::new();

    if cfg.name.as_deref().is_none_or(str::is_empty) {
        return Err(CoreError::validation("'name' is required"));
    }

    // Mutual exclusions.
    if cfg.deviceprofile_id.is_some() && cfg.deviceprofile_name.is_some() {
        return Err(CoreError::validation(
            "'deviceprofile_id' and 'deviceprofile_name' are mutually exclusive",
        ));
    }
    if cfg.map_id.is_some() && cfg.map_name.is_some() {
        return Err(CoreError::validation(
            "'map_id' and 'map_name' are mutually exclusive",
        ));
    }
    if cfg.meraki.contains_key("rf_profile_id") && cfg.meraki.contains_key("rf_profile_name") {
        return Err(CoreError::validation(
            "'rf_profile_id' and 'rf_profile_name' are mutually exclusive in the meraki block",
        ));
    }

    // VLAN ranges.
    if let Some(vlan) = cfg.vlan_id {
        check_vlan(vlan, "vlan_id")?;
        warnings.push(
            "top-level 'vlan_id' is deprecated, move it into 'ip_config.vlan_id'".to_owned(),
        );
    }
    if let Some(ip) = &cfg.ip_config {
        if let Some(vlan) = ip.vlan_id {
            check_vlan(vlan, "ip_config.vlan_id")?;
        }
    }
    if let Some(ports) = &cfg.port_config {
        for (port, pc) in ports {
            if let Some(vlan) = pc.vlan_id {
                check_vlan(vlan, &format!("port_config.{port}.vlan_id"))?;
            }
        }
    }

    // Per-band radio settings.
    if let Some(radio) = &cfg.radio_config {
        if let Some(band) = &radio.band_24 {
            check_band(band, "band_24", &(1..=11).collect::<Vec<_>>(), &[20])?;
        }
        if let Some(band) = &radio.band_5 {
            check_band(band, "band_5", &CHANNELS_5GHZ, &[20, 40, 80, 160])?;
        }
        if let Some(band) = &radio.band_6 {
            check_band_6(band)?;
        }
        if let Some(band) = &radio.band_dual {
            check_band_dual(band)?;
        }
    }

    Ok(warnings)
}

/// Vendor compatibility: foreign extension blocks and vendor-rejected
/// fields are errors.
pub fn validate_for_vendor(cfg: &ApDeviceConfig, vendor: Vendor) -> Result<(), CoreError> {
    match vendor {
        Vendor::Mist => {
            if !cfg.meraki.is_empty() {
                return Err(CoreError::validation(
                    "configuration targets mist but carries a non-empty 'meraki' extension block",
                ));
            }
            if let Some(mode) = dual_radio_mode(cfg) {
                if !matches!(mode, 24 | 5) {
                    return Err(CoreError::validation(format!(
                        "mist dual-band radios operate in band 24 or 5, got radio_mode {mode}"
                    )));
                }
            }
        }
        Vendor::Meraki => {
            if !cfg.mist.is_empty() {
                return Err(CoreError::validation(
                    "configuration targets meraki but carries a non-empty 'mist' extension block",
                ));
            }
            if let Some(mode) = dual_radio_mode(cfg) {
                if !matches!(mode, 5 | 6) {
                    return Err(CoreError::validation(format!(
                        "meraki flex radios operate in band 5 or 6, got radio_mode {mode}"
                    )));
                }
            }
            // Fields the Dashboard API has no home for.
            for (present, field) in [
                (cfg.ble_config.is_some(), "ble_config"),
                (cfg.iot_config.is_some(), "iot_config"),
                (cfg.uplink_port_config.is_some(), "uplink_port_config"),
                (cfg.lacp_config.is_some(), "lacp_config"),
            ] {
                if present {
                    return Err(CoreError::validation(format!(
                        "'{field}' is not accepted by the meraki API"
                    )));
                }
            }
        }
        Vendor::Unknown => {
            return Err(CoreError::validation(
                "cannot validate configuration for an unknown vendor",
            ));
        }
    }
    Ok(())
}

fn dual_radio_mode(cfg: &ApDeviceConfig) -> Option<u8> {
    cfg.radio_config
        .as_ref()
        .and_then(|r| r.band_dual.as_ref())
        .and_then(|b| b.radio_mode)
}

fn check_vlan(vlan: u16, field: &str) -> Result<(), CoreError> {
    if (1..=4094).contains(&vlan) {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "'{field}' must be in 1..=4094, got {vlan}"
        )))
    }
}

fn check_power(power: i8, band: &str) -> Result<(), CoreError> {
    if (1..=30).contains(&power) {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "'{band}.power' must be 1..=30 dBm, got {power}"
        )))
    }
}

fn check_band(
    band: &BandConfig,
    name: &str,
    channels: &[u16],
    widths: &[u16],
) -> Result<(), CoreError> {
    if let Some(channel) = band.channel {
        if !channels.contains(&channel) {
            return Err(CoreError::validation(format!(
                "'{name}.channel' {channel} is not a valid channel for this band"
            )));
        }
    }
    if let Some(width) = band.bandwidth {
        if !widths.contains(&width) {
            return Err(CoreError::validation(format!(
                "'{name}.bandwidth' {width} MHz is not valid for this band (allowed: {widths:?})"
            )));
        }
    }
    if let Some(power) = band.power {
        check_power(power, name)?;
    }
    Ok(())
}

fn check_band_6(band: &BandConfig) -> Result<(), CoreError> {
    if let Some(channel) = band.channel {
        if !is_6ghz_channel(channel) {
            return Err(CoreError::validation(format!(
                "'band_6.channel' {channel} is not a valid 6 GHz channel"
            )));
        }
    }
    if let Some(width) = band.bandwidth {
        if ![20, 40, 80, 160, 320].contains(&width) {
            return Err(CoreError::validation(format!(
                "'band_6.bandwidth' {width} MHz is not valid (allowed: 20/40/80/160/320)"
            )));
        }
    }
    if let Some(power) = band.power {
        check_power(power, "band_6")?;
    }
    Ok(())
}

/// A dual-band subconfig needs a `radio_mode` as soon as it carries any
/// other setting -- without one, neither vendor knows which band the
/// settings apply to.
fn check_band_dual(band: &BandConfig) -> Result<(), CoreError> {
    if band.radio_mode.is_none()
        && (band.has_settings_beyond_disabled() || band.disabled.is_some())
    {
        return Err(CoreError::validation(
            "'band_dual' requires 'radio_mode' when any other setting is present",
        ));
    }
    if let Some(mode) = band.radio_mode {
        if !matches!(mode, 24 | 5 | 6) {
            return Err(CoreError::validation(format!(
                "'band_dual.radio_mode' must be 24, 5, or 6, got {mode}"
            )));
        }
        // Channel validity depends on the operating band.
        if let Some(channel) = band.channel {
            let valid = match mode {
                24 => (1..=11).contains(&channel),
                5 => CHANNELS_5GHZ.contains(&channel),
                _ => is_6ghz_channel(channel),
            };
            if !valid {
                return Err(CoreError::validation(format!(
                    "'band_dual.channel' {channel} is not valid for radio_mode {mode}"
                )));
            }
        }
    }
    if let Some(power) = band.power {
        check_power(power, "band_dual")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::model::{IpConfig, RadioConfig};

    use super::*;

    fn named() -> ApDeviceConfig {
        ApDeviceConfig {
            name: Some("lobby-ap".into()),
            ..Default::default()
        }
    }

    #[test]
    fn name_is_required() {
        let cfg = ApDeviceConfig::default();
        assert!(validate_structural(&cfg).is_err());
        assert!(validate_structural(&named()).is_ok());
    }

    #[test]
    fn profile_id_and_name_are_exclusive() {
        let mut cfg = named();
        cfg.deviceprofile_id = Some("p1".into());
        cfg.deviceprofile_name = Some("office".into());
        assert!(validate_structural(&cfg).is_err());
    }

    #[test]
    fn vlan_range_enforced() {
        let mut cfg = named();
        cfg.ip_config = Some(IpConfig {
            vlan_id: Some(4095),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_err());

        cfg.ip_config = Some(IpConfig {
            vlan_id: Some(4094),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_ok());
    }

    #[test]
    fn legacy_vlan_warns_but_passes() {
        let mut cfg = named();
        cfg.vlan_id = Some(20);
        let warnings = validate_structural(&cfg).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("deprecated"));
    }

    #[test]
    fn band_channel_sets() {
        let mut cfg = named();
        cfg.radio_config = Some(RadioConfig {
            band_24: Some(BandConfig {
                channel: Some(13),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_err());

        cfg.radio_config = Some(RadioConfig {
            band_6: Some(BandConfig {
                channel: Some(37),
                bandwidth: Some(320),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_ok());

        cfg.radio_config = Some(RadioConfig {
            band_6: Some(BandConfig {
                channel: Some(38),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_err());
    }

    #[test]
    fn bandwidth_restricted_per_band() {
        let mut cfg = named();
        cfg.radio_config = Some(RadioConfig {
            band_24: Some(BandConfig {
                bandwidth: Some(40),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_err());

        cfg.radio_config = Some(RadioConfig {
            band_5: Some(BandConfig {
                bandwidth: Some(160),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_ok());
    }

    #[test]
    fn band_dual_needs_radio_mode() {
        let mut cfg = named();
        cfg.radio_config = Some(RadioConfig {
            band_dual: Some(BandConfig {
                power: Some(17),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_err());

        cfg.radio_config = Some(RadioConfig {
            band_dual: Some(BandConfig {
                power: Some(17),
                radio_mode: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_structural(&cfg).is_ok());
    }

    #[test]
    fn vendor_radio_mode_ranges() {
        let mut cfg = named();
        cfg.radio_config = Some(RadioConfig {
            band_dual: Some(BandConfig {
                radio_mode: Some(24),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_for_vendor(&cfg, Vendor::Mist).is_ok());
        assert!(validate_for_vendor(&cfg, Vendor::Meraki).is_err());

        cfg.radio_config = Some(RadioConfig {
            band_dual: Some(BandConfig {
                radio_mode: Some(6),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(validate_for_vendor(&cfg, Vendor::Mist).is_err());
        assert!(validate_for_vendor(&cfg, Vendor::Meraki).is_ok());
    }

    #[test]
    fn foreign_extension_blocks_rejected() {
        let mut cfg = named();
        cfg.meraki
            .insert("rf_profile_id".into(), json!("rf-123"));
        assert!(validate_for_vendor(&cfg, Vendor::Mist).is_err());
        assert!(validate_for_vendor(&cfg, Vendor::Meraki).is_ok());

        let mut cfg = named();
        cfg.mist.insert("scanning_enabled".into(), json!(true));
        assert!(validate_for_vendor(&cfg, Vendor::Meraki).is_err());
    }

    #[test]
    fn meraki_rejects_mist_only_subsystems() {
        let mut cfg = named();
        cfg.ble_config = Some(crate::model::BleConfig {
            beacon_enabled: Some(true),
            ..Default::default()
        });
        assert!(validate_for_vendor(&cfg, Vendor::Meraki).is_err());
        assert!(validate_for_vendor(&cfg, Vendor::Mist).is_ok());
    }
}

// ── push ──
//
// The full outbound pipeline for one AP: expand the device-config file
// through the template store, validate, resolve name references,
// translate to the vendor shape, filter to managed keys, and submit.
// `--dry-run` stops after filtering and prints what would be sent.

use std::path::Path;

use wifimgr_core::keypath::filter_managed;
use wifimgr_core::model::{DeviceKind, Vendor};
use wifimgr_core::resolver::Resolver;
use wifimgr_core::template::expand_device_config;
use wifimgr_core::translate::{
    parse_canonical, prepare_for_meraki, prepare_for_mist, to_meraki_map, to_mist_map,
    validate_for_vendor, validate_structural,
};

use super::Context;
use crate::error::CliError;

pub async fn run(ctx: &Context, mac: &str, file: &Path, dry_run: bool) -> Result<bool, CliError> {
    let resolver = Resolver::new(&ctx.manager, &ctx.accessor);
    let resolved = resolver.resolve_device(mac)?;
    if resolved.device_type != DeviceKind::Ap {
        return Err(CliError::Message(format!(
            "push currently handles access points only ({} is a {})",
            resolved.mac.display(),
            resolved.device_type
        )));
    }

    let raw = std::fs::read_to_string(file)
        .map_err(|e| CliError::Message(format!("cannot read {}: {e}", file.display())))?;
    let mut device_config: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::Message(format!("{} is not valid JSON: {e}", file.display())))?;

    // Helper keys steer the CLI, not the vendor.
    let site_wlans: Option<Vec<String>> = device_config
        .get("site_wlans")
        .and_then(serde_json::Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_owned)
                .collect()
        });
    if let Some(obj) = device_config.as_object_mut() {
        obj.remove("api");
        obj.remove("site_wlans");
    }

    let expanded = expand_device_config(
        &ctx.templates,
        &device_config,
        site_wlans.as_deref(),
        resolved.vendor.as_tag(),
    )?;
    let mut cfg = parse_canonical(&expanded, resolved.vendor)?;

    // The inventory name stands in when the file does not set one.
    let item = ctx.accessor.inventory_by_mac(&resolved.mac)?;
    if cfg.name.as_deref().is_none_or(str::is_empty) && !item.name.is_empty() {
        cfg.name = Some(item.name.clone());
    }

    for warning in validate_structural(&cfg)? {
        eprintln!("warning: {warning}");
    }
    validate_for_vendor(&cfg, resolved.vendor)?;

    let map = match resolved.vendor {
        Vendor::Mist => {
            prepare_for_mist(
                &mut cfg,
                &resolver,
                &resolved.api_label,
                &std::collections::BTreeMap::new(),
            )?;
            to_mist_map(&cfg)?
        }
        Vendor::Meraki => {
            prepare_for_meraki(&mut cfg, &resolver, &resolved.api_label)?;
            to_meraki_map(&cfg)?
        }
        Vendor::Unknown => {
            return Err(CliError::Message(format!(
                "device {} resolved to an unknown vendor",
                resolved.mac.display()
            )));
        }
        _ => unreachable!("Vendor has no variants beyond Mist, Meraki, Unknown"),
    };

    let map = if ctx.file_config.managed_keys.is_empty() {
        map
    } else {
        filter_managed(&map, &ctx.file_config.managed_keys)
    };

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(true);
    }

    let client = ctx.registry.client(&resolved.api_label)?;
    let configs = client.require_configs()?;
    configs.push_device_config(&ctx.cancel, &item, &map).await?;
    println!(
        "pushed configuration to {} via {}",
        resolved.mac.display(),
        resolved.api_label
    );
    Ok(true)
}

// ── expand ──
//
// Expand a device-config file through the template store and print the
// vendor-ready map. The target vendor is inferred from --api when
// given, otherwise from the device config's own `api` field.

use std::path::Path;

use wifimgr_core::template::{expand_device_config, vendor_tag_from_label};

use super::Context;
use crate::error::CliError;

pub fn run(ctx: &Context, file: &Path, api: Option<&str>) -> Result<bool, CliError> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| CliError::Message(format!("cannot read {}: {e}", file.display())))?;
    let device_config: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::Message(format!("{} is not valid JSON: {e}", file.display())))?;

    let label = api
        .map(str::to_owned)
        .or_else(|| {
            device_config
                .get("api")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .ok_or_else(|| {
            CliError::Message("no target API: pass --api or set 'api' in the config".into())
        })?;
    let vendor = vendor_tag_from_label(&label);

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

    let expanded = expand_device_config(
        &ctx.templates,
        &device_config,
        site_wlans.as_deref(),
        &vendor,
    )?;
    println!("{}", serde_json::to_string_pretty(&expanded)?);
    Ok(true)
}

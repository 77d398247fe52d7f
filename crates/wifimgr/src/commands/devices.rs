// ── devices / device ──

use tabled::Tabled;

use wifimgr_core::model::DeviceKind;
use wifimgr_core::resolver::Resolver;

use super::Context;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DeviceRow {
    mac: String,
    name: String,
    model: String,
    #[tabled(rename = "type")]
    kind: String,
    site: String,
    api: String,
    status: String,
}

/// List inventory, optionally filtered by device type. `--live` asks
/// the vendor clouds directly through the devices facet instead of the
/// cache.
pub async fn list(ctx: &Context, device_type: Option<&str>, live: bool) -> Result<bool, CliError> {
    let filter = match device_type {
        Some(raw) => Some(DeviceKind::parse(raw).ok_or_else(|| {
            CliError::Message(format!("unknown device type '{raw}' (ap, switch, gateway)"))
        })?),
        None => None,
    };

    if live {
        return list_live(ctx, filter).await;
    }

    let rows: Vec<DeviceRow> = ctx
        .accessor
        .all_inventory()
        .into_iter()
        .filter(|item| filter.is_none_or(|kind| item.device_type == kind))
        .map(|item| {
            let status = ctx
                .accessor
                .status_by_mac(&item.mac)
                .map(|s| s.status.to_string())
                .unwrap_or_else(|_| "unknown".into());
            DeviceRow {
                mac: item.mac.display(),
                name: item.name,
                model: item.model,
                kind: item.device_type.to_string(),
                site: item.site_name,
                api: item.provenance.api,
                status: output::colorize_status(&status),
            }
        })
        .collect();

    println!("{}", output::table(&rows));
    Ok(true)
}

/// Live listing via the devices facet; APIs without it are skipped.
async fn list_live(ctx: &Context, filter: Option<DeviceKind>) -> Result<bool, CliError> {
    let mut rows = Vec::new();
    for label in ctx.registry.active_labels() {
        let client = ctx.registry.client(&label)?;
        let Some(devices) = &client.devices else {
            continue;
        };
        for device in devices.list_devices(&ctx.cancel).await? {
            if filter.is_some_and(|kind| device.device_type != kind) {
                continue;
            }
            rows.push(DeviceRow {
                mac: device.mac.display(),
                name: device.name,
                model: device.model,
                kind: device.device_type.to_string(),
                site: device.site_id,
                api: label.clone(),
                status: output::colorize_status(&device.status),
            });
        }
    }
    println!("{}", output::table(&rows));
    Ok(true)
}

/// Show one device by MAC: identity, status, and cached config. A MAC
/// missing from every cache is searched vendor-side before giving up.
pub async fn show(ctx: &Context, mac: &str) -> Result<bool, CliError> {
    let resolver = Resolver::new(&ctx.manager, &ctx.accessor);
    let resolved = match resolver.resolve_device(mac) {
        Ok(resolved) => resolved,
        Err(wifimgr_core::CoreError::DeviceNotFound { .. }) => {
            return search_live(ctx, mac).await;
        }
        Err(e) => return Err(e.into()),
    };
    let item = ctx.accessor.inventory_by_mac(&resolved.mac)?;

    println!("mac:      {}", resolved.mac.display());
    println!("name:     {}", item.name);
    println!("model:    {}", item.model);
    println!("serial:   {}", item.serial);
    println!("type:     {}", resolved.device_type);
    println!("api:      {} ({})", resolved.api_label, resolved.vendor);
    println!("site:     {} ({})", item.site_name, resolved.site_id);

    if let Ok(status) = ctx.accessor.status_by_mac(&resolved.mac) {
        println!("status:   {}", output::colorize_status(status.status.as_str()));
        if let Some(seen) = status.last_seen {
            println!("seen:     {seen}");
        }
        if let Some(ip) = status.lan_ip {
            println!("lan ip:   {ip}");
        }
    }

    let config = match resolved.device_type {
        DeviceKind::Ap => ctx.accessor.ap_config_by_mac(&resolved.mac).map(|c| c.config),
        DeviceKind::Switch => ctx
            .accessor
            .switch_config_by_mac(&resolved.mac)
            .map(|c| c.config),
        DeviceKind::Gateway => ctx
            .accessor
            .gateway_config_by_mac(&resolved.mac)
            .map(|c| c.config),
    };
    if let Ok(config) = config {
        println!("config:\n{}", serde_json::to_string_pretty(&config)?);
    }

    Ok(true)
}

/// Last resort for an uncached MAC: ask every API with a search facet.
async fn search_live(ctx: &Context, mac: &str) -> Result<bool, CliError> {
    let needle = wifimgr_core::MacAddress::normalize(mac);
    for label in ctx.registry.active_labels() {
        let client = ctx.registry.client(&label)?;
        let Some(search) = &client.search else {
            continue;
        };
        if let Some(device) = search.search_by_mac(&ctx.cancel, &needle).await? {
            println!("found via live search on {label} (not cached, run 'wifimgr refresh'):");
            println!("mac:      {}", device.mac.display());
            println!("name:     {}", device.name);
            println!("model:    {}", device.model);
            println!("type:     {}", device.device_type);
            println!("site:     {}", device.site_id);
            println!("status:   {}", output::colorize_status(&device.status));
            return Ok(true);
        }
    }
    Err(wifimgr_core::CoreError::DeviceNotFound {
        identifier: mac.to_owned(),
    }
    .into())
}

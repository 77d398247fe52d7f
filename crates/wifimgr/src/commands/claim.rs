// ── claim / release ──
//
// Inventory mutations by serial number. Both require an explicit
// --api: claiming is a write and never guesses its target. On Meraki
// the Dashboard UI calls these "claim codes", but the API argument is
// the device serial.

use super::Context;
use crate::error::CliError;

pub async fn claim(ctx: &Context, api: Option<&str>, serials: &[String]) -> Result<bool, CliError> {
    let label = require_api(api)?;
    let client = ctx.registry.client(label)?;
    let inventory = client.require_inventory()?;

    inventory.claim(&ctx.cancel, serials).await?;
    println!("claimed {} device(s) into {label}", serials.len());
    println!("run 'wifimgr refresh --api {label}' to pick them up");
    Ok(true)
}

pub async fn release(
    ctx: &Context,
    api: Option<&str>,
    site: &str,
    serial: &str,
) -> Result<bool, CliError> {
    let label = require_api(api)?;
    let client = ctx.registry.client(label)?;
    let inventory = client.require_inventory()?;

    inventory.release(&ctx.cancel, site, serial).await?;
    println!("released {serial} from {site} on {label}");
    Ok(true)
}

fn require_api(api: Option<&str>) -> Result<&str, CliError> {
    api.ok_or_else(|| CliError::Message("this command needs an explicit --api <label>".into()))
}

// ── sites ──

use tabled::Tabled;

use super::Context;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SiteRow {
    name: String,
    id: String,
    api: String,
    vendor: String,
    timezone: String,
    devices: u32,
}

pub fn run(ctx: &Context) -> Result<bool, CliError> {
    let rows: Vec<SiteRow> = ctx
        .accessor
        .all_sites()
        .into_iter()
        .map(|site| SiteRow {
            name: site.name,
            id: site.id,
            api: site.provenance.api,
            vendor: site.provenance.vendor.to_string(),
            timezone: site.timezone,
            devices: site.device_count,
        })
        .collect();

    println!("{}", output::table(&rows));
    Ok(true)
}

// ── apis ──

use tabled::Tabled;

use super::Context;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ApiRow {
    label: String,
    vendor: String,
    org: String,
    capabilities: String,
    status: String,
}

pub fn run(ctx: &Context) -> Result<bool, CliError> {
    let rows: Vec<ApiRow> = ctx
        .registry
        .status()
        .into_iter()
        .map(|row| ApiRow {
            label: row.label,
            vendor: row.vendor.to_string(),
            org: row.org_id,
            capabilities: row.capabilities.join(","),
            status: if row.healthy {
                output::colorize_status("healthy")
            } else {
                let err = row.last_error.unwrap_or_else(|| "unhealthy".into());
                format!("{}: {err}", output::colorize_status("unhealthy"))
            },
        })
        .collect();

    println!("{}", output::table(&rows));
    Ok(true)
}

// ── cache ──

use tabled::Tabled;

use wifimgr_core::CacheState;

use super::Context;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CacheRow {
    label: String,
    state: String,
    detail: String,
}

pub fn run(ctx: &Context) -> Result<bool, CliError> {
    let mut all_ok = true;
    let mut rows = Vec::new();

    for label in ctx.registry.labels() {
        let config = ctx.registry.config(&label)?;
        let (state, detail) = match ctx.manager.verify_api_cache(&config) {
            CacheState::Ok => (output::colorize_status("ok"), String::new()),
            CacheState::Missing => {
                all_ok = false;
                ("missing".to_owned(), "never refreshed".to_owned())
            }
            CacheState::Stale { age } => {
                all_ok = false;
                (
                    output::colorize_status("stale"),
                    format!("{}s old", age.as_secs()),
                )
            }
            CacheState::Corrupted { reason } => {
                all_ok = false;
                (output::colorize_status("corrupted"), reason)
            }
        };
        rows.push(CacheRow {
            label,
            state,
            detail,
        });
    }

    println!("{}", output::table(&rows));
    Ok(all_ok)
}

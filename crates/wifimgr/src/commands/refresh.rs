// ── refresh ──

use wifimgr_core::RefreshOptions;

use super::Context;
use crate::error::CliError;

/// Refresh one API or all of them. Returns `false` when any per-label
/// error was reported -- at least one success still counts as progress,
/// but the process exits non-zero.
pub async fn run(ctx: &Context, api: Option<&str>, device_configs: bool) -> Result<bool, CliError> {
    let opts = RefreshOptions {
        fetch_device_configs: device_configs,
    };

    let errors = match api {
        Some(label) => match ctx
            .manager
            .refresh_api(&ctx.cancel, &ctx.registry, label, &opts)
            .await
        {
            Ok(()) => Default::default(),
            Err(e) => std::collections::BTreeMap::from([(label.to_owned(), e)]),
        },
        None => {
            ctx.manager
                .refresh_all(&ctx.cancel, &ctx.registry, opts)
                .await
        }
    };

    ctx.accessor.rebuild_indexes(&ctx.manager)?;

    // Persist schema observations gathered during the refresh.
    let schema_path = ctx.manager.cache_dir().join("schema.json");
    if let Err(e) = ctx.schema.save(&schema_path) {
        tracing::warn!(error = %e, "could not save schema snapshots");
    }

    let refreshed: Vec<String> = ctx
        .registry
        .active_labels()
        .into_iter()
        .filter(|label| !errors.contains_key(label))
        .filter(|label| api.is_none_or(|a| a == label.as_str()))
        .collect();
    for label in &refreshed {
        println!("refreshed {label}");
    }
    for (label, err) in &errors {
        eprintln!("{label}: {}", err.user_message());
    }

    Ok(errors.is_empty())
}

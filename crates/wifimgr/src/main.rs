// wifimgr: multi-vendor wireless fleet manager.
//
// The composition root. Loads configuration, registers vendor
// factories, builds the cache manager and accessor once, and threads
// them through every command -- no process-wide handles.

mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wifimgr_core::adapters::{meraki_factory, mist_factory};
use wifimgr_core::model::Vendor;
use wifimgr_core::{CacheAccessor, CacheManager, ClientRegistry, SchemaTracker, TemplateStore};

use cli::{Cli, Command};
use commands::Context;
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, CliError> {
    let ctx = build_context(&cli)?;
    let api = cli.api.as_deref();

    match &cli.command {
        Command::Refresh { device_configs } => {
            commands::refresh::run(&ctx, api, *device_configs).await
        }
        Command::Apis => commands::apis::run(&ctx),
        Command::Sites => commands::sites::run(&ctx),
        Command::Devices { device_type, live } => {
            commands::devices::list(&ctx, device_type.as_deref(), *live).await
        }
        Command::Device { mac } => commands::devices::show(&ctx, mac).await,
        Command::Claim { serials } => commands::claim::claim(&ctx, api, serials).await,
        Command::Release { serial, site } => {
            commands::claim::release(&ctx, api, site, serial).await
        }
        Command::Cache => commands::cache_cmd::run(&ctx),
        Command::Expand { file } => commands::expand::run(&ctx, file, api),
        Command::Push { mac, file, dry_run } => {
            commands::push::run(&ctx, mac, file, *dry_run).await
        }
    }
}

fn build_context(cli: &Cli) -> Result<Context, CliError> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(wifimgr_config::config_path);
    let file_config = wifimgr_config::load_config(&config_path)?;
    let base_dir = config_path
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();

    let schema = Arc::new(SchemaTracker::new());
    let registry = Arc::new(ClientRegistry::new());
    registry.register_factory(Vendor::Mist, mist_factory(Arc::clone(&schema)));
    registry.register_factory(Vendor::Meraki, meraki_factory(Arc::clone(&schema)));

    let api_configs = wifimgr_config::build_api_configs(&file_config)?;
    let init_errors = registry.initialize_clients(api_configs);
    for (label, err) in &init_errors {
        debug!(label = %label, error = %err, "client unavailable");
    }

    let cache_dir = wifimgr_config::resolve_cache_dir(&file_config, &base_dir);
    let manager = CacheManager::new(cache_dir);
    let accessor = CacheAccessor::new();
    // Stale-index tolerance: commands read whatever is on disk now.
    accessor.rebuild_indexes(&manager)?;

    let template_paths: Vec<std::path::PathBuf> = file_config
        .template_files
        .iter()
        .map(|p| {
            if p.is_relative() {
                base_dir.join(p)
            } else {
                p.clone()
            }
        })
        .collect();
    let templates = TemplateStore::load_files(&template_paths)?;

    // Ctrl-C cancels every in-flight vendor call.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    // Prior schema observations seed drift detection across runs.
    let schema_path = manager.cache_dir().join("schema.json");
    if schema_path.exists() {
        if let Err(e) = schema.load(&schema_path) {
            debug!(error = %e, "could not load prior schema snapshots");
        }
    }

    Ok(Context {
        manager,
        registry,
        accessor,
        templates,
        schema,
        file_config,
        cancel,
    })
}

// ── Command-line interface definition ──

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "wifimgr",
    about = "Multi-vendor wireless fleet manager",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Path to the configuration file (defaults to the XDG location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Restrict the operation to one configured API label.
    #[arg(long, global = true)]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh per-API caches from the vendor clouds.
    Refresh {
        /// Also fetch per-device configs for vendors where that is
        /// one call per device.
        #[arg(long)]
        device_configs: bool,
    },

    /// Show configured APIs, their capabilities, and health.
    Apis,

    /// List cached sites across all APIs.
    Sites,

    /// List cached inventory across all APIs.
    Devices {
        /// Filter by device type: ap, switch, or gateway.
        #[arg(long, value_name = "TYPE")]
        device_type: Option<String>,

        /// Query the vendor clouds directly instead of the cache.
        #[arg(long)]
        live: bool,
    },

    /// Show one device by MAC (any separator format). Falls back to a
    /// vendor-side search when the MAC is not cached.
    Device { mac: String },

    /// Claim devices into an org by serial number (requires --api).
    Claim {
        /// Device serial numbers.
        #[arg(required = true)]
        serials: Vec<String>,
    },

    /// Release a device from its site/network by serial (requires --api).
    Release {
        serial: String,

        /// Site/network the device currently belongs to.
        #[arg(long)]
        site: String,
    },

    /// Show per-API cache state (missing / corrupted / stale / ok).
    Cache,

    /// Expand a device-config file through the template store.
    Expand {
        /// JSON file holding the device configuration.
        file: PathBuf,
    },

    /// Expand, validate, translate, and submit a device configuration.
    Push {
        /// Target device MAC (any separator format).
        mac: String,

        /// JSON file holding the device configuration.
        #[arg(long)]
        file: PathBuf,

        /// Print the vendor-ready map instead of submitting it.
        #[arg(long)]
        dry_run: bool,
    },
}

//! Configuration loading for wifimgr.
//!
//! JSON config file + environment credential resolution, producing the
//! immutable `ApiConfig` list the core consumes. Responsibilities:
//! credential field normalization, `WIFIMGR_API_*` env overrides,
//! `enc:` credential decryption, vendor defaults (URLs and rate-limit
//! clamps), and XDG path resolution.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use wifimgr_core::model::{ApiConfig, Vendor};

/// Environment prefix for per-API credential overrides:
/// `WIFIMGR_API_<LABEL>_CREDENTIALS_<FIELD>` with `<FIELD>` one of
/// `KEY`, `ORG`, `URL`. The label is uppercased with dashes turned to
/// underscores. Environment values always override file values.
pub const ENV_PREFIX: &str = "WIFIMGR_API_";

/// Password source for `enc:`-prefixed credential values.
pub const PASSWORD_ENV: &str = "WIFIMGR_PASSWORD";

/// Meraki enforces this server-side regardless of configuration.
pub const MERAKI_MAX_RATE: f64 = 10.0;

/// Mist default when no rate limit is configured.
pub const MIST_DEFAULT_RATE: f64 = 5000.0;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn validation(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── File format ─────────────────────────────────────────────────────

/// Top-level JSON configuration file.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Cache directory; relative paths resolve against the base dir.
    pub cache_dir: Option<PathBuf>,

    /// Template files loaded into the template store, in order.
    #[serde(default)]
    pub template_files: Vec<PathBuf>,

    /// Managed-keys dot-paths for config filtering.
    #[serde(default)]
    pub managed_keys: Vec<String>,

    /// Per-API connections keyed by label.
    #[serde(default)]
    pub apis: BTreeMap<String, ApiEntry>,
}

/// One API connection as written in the config file.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ApiEntry {
    pub vendor: String,
    pub url: Option<String>,
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    pub rate_limit: Option<f64>,
    pub results_limit: Option<usize>,
    pub cache_ttl: Option<i64>,
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "wifimgr", "wifimgr").map_or_else(
        || home_fallback().join(".config").join("wifimgr").join("config.json"),
        |dirs| dirs.config_dir().join("config.json"),
    )
}

/// Default cache directory when the config file names none.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("dev", "wifimgr", "wifimgr").map_or_else(
        || home_fallback().join(".cache").join("wifimgr"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

fn home_fallback() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
}

/// Resolve the effective cache dir: configured value (relative paths
/// against `base_dir`), or the XDG default.
pub fn resolve_cache_dir(config: &Config, base_dir: &Path) -> PathBuf {
    match &config.cache_dir {
        Some(dir) if dir.is_relative() => base_dir.join(dir),
        Some(dir) => dir.clone(),
        None => default_cache_dir(),
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the configuration file, layered over defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Json::file(path));
    let config: Config = figment.extract()?;
    Ok(config)
}

// ── ApiConfig construction ──────────────────────────────────────────

/// Build the immutable `ApiConfig` list from the file config plus the
/// process environment.
pub fn build_api_configs(config: &Config) -> Result<Vec<ApiConfig>, ConfigError> {
    let env: HashMap<String, String> = std::env::vars().collect();
    build_api_configs_from(config, &env)
}

/// Environment-injectable variant for tests.
pub fn build_api_configs_from(
    config: &Config,
    env: &HashMap<String, String>,
) -> Result<Vec<ApiConfig>, ConfigError> {
    let password = env.get(PASSWORD_ENV).map(String::as_str);
    let mut out = Vec::with_capacity(config.apis.len());

    for (label, entry) in &config.apis {
        let vendor = Vendor::from_tag(&entry.vendor);
        if vendor == Vendor::Unknown {
            return Err(validation(
                format!("apis.{label}.vendor"),
                format!("unknown vendor '{}'", entry.vendor),
            ));
        }

        let mut credentials = entry.credentials.clone();

        // Field-name normalization: some configs say api_token.
        if !credentials.contains_key("api_key") {
            if let Some(token) = credentials.remove("api_token") {
                credentials.insert("api_key".into(), token);
            }
        }

        // Environment overrides: WIFIMGR_API_<LABEL>_CREDENTIALS_<FIELD>.
        let env_label = label.to_uppercase().replace('-', "_");
        let mut url_override = None;
        for (field, target) in [("KEY", "api_key"), ("ORG", "org_id"), ("URL", "url")] {
            let var = format!("{ENV_PREFIX}{env_label}_CREDENTIALS_{field}");
            if let Some(value) = env.get(&var) {
                debug!(label = %label, var = %var, "credential taken from environment");
                if target == "url" {
                    url_override = Some(value.clone());
                } else {
                    credentials.insert(target.to_owned(), value.clone());
                }
            }
        }

        // Decrypt enc:-prefixed values. A missing password fails here,
        // at config-build time, never at use time.
        for (field, value) in credentials.clone() {
            if value.starts_with("enc:") {
                let plain = decrypt_value(&value, password)
                    .map_err(|e| validation(format!("apis.{label}.credentials.{field}"), e))?;
                credentials.insert(field, plain);
            }
        }

        // Vendor defaults: URL fill and rate handling.
        let base_url = url_override
            .or_else(|| entry.url.clone())
            .unwrap_or_else(|| match vendor {
                Vendor::Meraki => vendor_default_url(Vendor::Meraki),
                _ => vendor_default_url(Vendor::Mist),
            });

        let rate_limit = match vendor {
            // The Dashboard token bucket is 10 req/s no matter what the
            // operator configured.
            Vendor::Meraki => entry.rate_limit.unwrap_or(MERAKI_MAX_RATE).min(MERAKI_MAX_RATE),
            _ => entry.rate_limit.unwrap_or(MIST_DEFAULT_RATE),
        };

        out.push(ApiConfig {
            label: label.clone(),
            vendor,
            base_url,
            credentials,
            rate_limit,
            results_limit: entry.results_limit,
            cache_ttl_secs: entry.cache_ttl.unwrap_or(-1),
        });
    }
    Ok(out)
}

fn vendor_default_url(vendor: Vendor) -> String {
    match vendor {
        Vendor::Meraki => "https://api.meraki.com/api/v1".into(),
        _ => "https://api.mist.com".into(),
    }
}

// ── Credential encryption ───────────────────────────────────────────
//
// The at-rest form is deliberately simple: base64 over a password-keyed
// byte transform. It keeps credentials out of casual view in config
// files and env dumps; real secret management belongs in the
// environment or an external vault.

fn transform(data: &[u8], password: &str) -> Vec<u8> {
    data.iter()
        .zip(password.bytes().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

/// Decrypt an `enc:`-prefixed value. Errors are plain strings -- the
/// caller wraps them with the field context.
fn decrypt_value(value: &str, password: Option<&str>) -> Result<String, String> {
    let payload = value.strip_prefix("enc:").unwrap_or(value);
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| format!("value is encrypted but {PASSWORD_ENV} is not set"))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| format!("invalid encrypted payload: {e}"))?;
    String::from_utf8(transform(&bytes, password))
        .map_err(|_| "decryption produced invalid UTF-8 (wrong password?)".to_owned())
}

/// Encrypt a credential value into the `enc:` form.
pub fn encrypt_value(plain: &str, password: &str) -> String {
    format!("enc:{}", BASE64.encode(transform(plain.as_bytes(), password)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(vendor: &str) -> ApiEntry {
        ApiEntry {
            vendor: vendor.into(),
            url: None,
            credentials: HashMap::from([
                ("org_id".to_owned(), "org-1".to_owned()),
                ("api_key".to_owned(), "plain-key".to_owned()),
            ]),
            rate_limit: None,
            results_limit: None,
            cache_ttl: None,
        }
    }

    fn config_with(label: &str, e: ApiEntry) -> Config {
        Config {
            apis: BTreeMap::from([(label.to_owned(), e)]),
            ..Default::default()
        }
    }

    #[test]
    fn meraki_rate_is_clamped() {
        let mut e = entry("meraki");
        e.rate_limit = Some(100.0);
        let configs =
            build_api_configs_from(&config_with("meraki-corp", e), &HashMap::new()).unwrap();
        assert!((configs[0].rate_limit - MERAKI_MAX_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn mist_rate_defaults_high() {
        let configs =
            build_api_configs_from(&config_with("mist-lab", entry("mist")), &HashMap::new())
                .unwrap();
        assert!((configs[0].rate_limit - MIST_DEFAULT_RATE).abs() < f64::EPSILON);
        assert_eq!(configs[0].base_url, "https://api.mist.com");
        assert_eq!(configs[0].cache_ttl_secs, -1);
    }

    #[test]
    fn api_token_renames_to_api_key() {
        let mut e = entry("mist");
        e.credentials.remove("api_key");
        e.credentials
            .insert("api_token".to_owned(), "tok".to_owned());
        let configs =
            build_api_configs_from(&config_with("mist-lab", e), &HashMap::new()).unwrap();
        assert_eq!(configs[0].credentials["api_key"], "tok");
        assert!(!configs[0].credentials.contains_key("api_token"));
    }

    #[test]
    fn env_overrides_file_values() {
        let env = HashMap::from([
            (
                "WIFIMGR_API_MIST_LAB_CREDENTIALS_KEY".to_owned(),
                "env-key".to_owned(),
            ),
            (
                "WIFIMGR_API_MIST_LAB_CREDENTIALS_URL".to_owned(),
                "https://api.eu.mist.com".to_owned(),
            ),
        ]);
        let configs = build_api_configs_from(&config_with("mist-lab", entry("mist")), &env).unwrap();
        // Label dashes map to underscores in the variable name.
        assert_eq!(configs[0].credentials["api_key"], "env-key");
        assert_eq!(configs[0].base_url, "https://api.eu.mist.com");
    }

    #[test]
    fn encrypted_value_round_trips() {
        let cipher = encrypt_value("secret-key", "hunter2");
        assert!(cipher.starts_with("enc:"));

        let mut e = entry("mist");
        e.credentials.insert("api_key".to_owned(), cipher);
        let env = HashMap::from([(PASSWORD_ENV.to_owned(), "hunter2".to_owned())]);

        let configs = build_api_configs_from(&config_with("mist-lab", e), &env).unwrap();
        assert_eq!(configs[0].credentials["api_key"], "secret-key");
    }

    #[test]
    fn encrypted_value_without_password_fails_at_build() {
        let mut e = entry("mist");
        e.credentials
            .insert("api_key".to_owned(), encrypt_value("secret", "pw"));

        let err =
            build_api_configs_from(&config_with("mist-lab", e), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("WIFIMGR_PASSWORD"));
    }

    #[test]
    fn unknown_vendor_is_rejected() {
        let err = build_api_configs_from(&config_with("acme-lab", entry("acme")), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            serde_json::to_string_pretty(&serde_json::json!({
                "cache_dir": "cache",
                "managed_keys": ["radio_config", "name"],
                "apis": {
                    "mist-lab": {
                        "vendor": "mist",
                        "credentials": { "org_id": "o1", "api_key": "k" },
                        "cache_ttl": 600,
                    }
                }
            }))
            .unwrap(),
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.managed_keys.len(), 2);
        assert_eq!(config.apis["mist-lab"].cache_ttl, Some(600));

        // Relative cache dir resolves against the base dir.
        let resolved = resolve_cache_dir(&config, dir.path());
        assert_eq!(resolved, dir.path().join("cache"));
    }
}

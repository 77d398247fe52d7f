// ── Per-API connection configuration ──
//
// One `ApiConfig` per configured cloud connection, built by the config
// layer at startup and immutable thereafter. The label is the primary
// addressing key everywhere in the core.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::common::Vendor;

/// Default cache TTL applied when `cache_ttl_secs` is negative.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Configuration for one connection to a vendor cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Operator-chosen label, e.g. `mist-prod`.
    pub label: String,
    pub vendor: Vendor,
    pub base_url: String,
    /// Credential fields (`api_key`, `org_id`, …). The config layer
    /// normalizes names and resolves env overrides before this struct
    /// is constructed.
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    /// Outbound requests per second. Vendor caps are already applied.
    pub rate_limit: f64,
    /// Page size for list endpoints; `None` uses the vendor default.
    #[serde(default)]
    pub results_limit: Option<usize>,
    /// Cache TTL in seconds. 0 = never expire, negative = default
    /// (86400).
    #[serde(default)]
    pub cache_ttl_secs: i64,
}

impl ApiConfig {
    pub fn org_id(&self) -> &str {
        self.credentials.get("org_id").map_or("", String::as_str)
    }

    pub fn api_key(&self) -> Option<SecretString> {
        self.credentials
            .get("api_key")
            .map(|k| SecretString::from(k.clone()))
    }

    /// The effective TTL: `None` means the cache never expires.
    pub fn effective_ttl(&self) -> Option<Duration> {
        match self.cache_ttl_secs {
            0 => None,
            n if n < 0 => Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
            n => Some(Duration::from_secs(n.unsigned_abs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ttl: i64) -> ApiConfig {
        ApiConfig {
            label: "mist-lab".into(),
            vendor: Vendor::Mist,
            base_url: "https://api.mist.com".into(),
            credentials: HashMap::from([
                ("org_id".to_owned(), "org-1".to_owned()),
                ("api_key".to_owned(), "k".to_owned()),
            ]),
            rate_limit: 100.0,
            results_limit: None,
            cache_ttl_secs: ttl,
        }
    }

    #[test]
    fn ttl_zero_never_expires() {
        assert_eq!(config(0).effective_ttl(), None);
    }

    #[test]
    fn ttl_negative_uses_default() {
        assert_eq!(
            config(-1).effective_ttl(),
            Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
        );
    }

    #[test]
    fn ttl_positive_is_verbatim() {
        assert_eq!(config(600).effective_ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn org_id_accessor() {
        assert_eq!(config(0).org_id(), "org-1");
    }
}

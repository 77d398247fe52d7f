// Shared transport configuration for building reqwest::Client instances.
//
// Both vendor clients share timeout and header settings through this
// module, avoiding duplicated builder logic. Auth headers are injected
// here as defaults so individual requests never handle credentials.

use std::time::Duration;

use reqwest::header::HeaderMap;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("wifimgr/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the given default headers.
    ///
    /// Used by both vendor clients to inject their auth header
    /// (`Authorization: Token …` for Mist, `X-Cisco-Meraki-API-Key`
    /// for Meraki).
    pub fn build_client(&self, headers: HeaderMap) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(crate::error::Error::Transport)
    }
}

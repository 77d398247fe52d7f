use thiserror::Error;

/// Top-level error type for the `wifimgr-api` crate.
///
/// Covers every failure mode of the raw vendor clients: authentication,
/// transport, structured vendor errors, rate limiting, and cancellation.
/// `wifimgr-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the vendor cloud (401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Vendor API ──────────────────────────────────────────────────
    /// Rate limited by the vendor cloud (HTTP 429). Carries the
    /// `Retry-After` hint when the vendor sent one.
    #[error("Rate limited by vendor API")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Structured error response from the vendor API.
    #[error("Vendor API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Cancellation ────────────────────────────────────────────────
    /// The operation's cancellation token fired. Propagated verbatim --
    /// never wrapped by the retry loop.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying:
    /// network failures, 5xx responses, and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The vendor's `Retry-After` hint, if this error carried one.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(std::time::Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}

// ── Core error types ──
//
// User-facing errors from wifimgr-core. Consumers never see raw HTTP
// status codes or JSON parse failures directly; the `From` impl
// translates transport-layer errors into domain-appropriate variants.
//
// Every variant has two renderings: the single-line `Display` form for
// logs, and `user_message()` -- a multi-line diagnostic with the
// resource identity, the reason, and concrete remediation.

use thiserror::Error;

use crate::model::Vendor;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup failures ──────────────────────────────────────────────
    #[error("API not found: {label}")]
    ApiNotFound {
        label: String,
        available: Vec<String>,
    },

    #[error("Site not found: {name}")]
    SiteNotFound {
        name: String,
        searched: Vec<String>,
    },

    #[error("Site name '{name}' exists in multiple APIs: {labels:?}")]
    DuplicateSite { name: String, labels: Vec<String> },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("{kind} not found: {key}")]
    NotFound {
        kind: &'static str,
        key: String,
        scope: String,
        suggestions: Vec<String>,
    },

    #[error("Duplicate {kind} name: {name}")]
    Duplicate {
        kind: &'static str,
        name: String,
        candidates: Vec<String>,
    },

    // ── Capability failures ──────────────────────────────────────────
    #[error("Capability '{capability}' not supported by {vendor} (API {label})")]
    CapabilityNotSupported {
        vendor: Vendor,
        label: String,
        capability: &'static str,
        supported_by: Vec<Vendor>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// An API response field had an unexpected type for an essential
    /// field. Non-essential mismatches are warnings, not errors.
    #[error("Field mapping failed: {field} in {context} (expected {expected})")]
    FieldMapping {
        field: String,
        expected: &'static str,
        context: String,
    },

    // ── Cache ────────────────────────────────────────────────────────
    #[error("Cache for '{label}' has unsupported version {found}")]
    CacheVersionMismatch { label: String, found: u32 },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Infrastructure ───────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-layer error after the adapter's retry loop gave up.
    #[error("API error: {0}")]
    Api(wifimgr_api::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<wifimgr_api::Error> for CoreError {
    fn from(err: wifimgr_api::Error) -> Self {
        match err {
            wifimgr_api::Error::Cancelled => Self::Cancelled,
            other => Self::Api(other),
        }
    }
}

impl CoreError {
    /// Multi-line, actionable diagnostic for terminal display.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiNotFound { label, available } => format!(
                "API '{label}' is not configured.\n\
                 Available APIs: {}\n\
                 Check the label spelling, or add the API to your configuration.",
                join_or(available, "(none)")
            ),
            Self::SiteNotFound { name, searched } => format!(
                "Site '{name}' was not found in any cache.\n\
                 Searched APIs: {}\n\
                 If the site was created recently, run 'wifimgr refresh' to update the cache.",
                join_or(searched, "(none)")
            ),
            Self::DuplicateSite { name, labels } => format!(
                "Site name '{name}' exists in more than one API: {}.\n\
                 Disambiguate by setting 'api' in the site config or passing --api <label>.",
                labels.join(", ")
            ),
            Self::DeviceNotFound { identifier } => format!(
                "Device '{identifier}' was not found in any cache.\n\
                 If it was claimed recently, run 'wifimgr refresh' to update the cache."
            ),
            Self::NotFound {
                kind,
                key,
                scope,
                suggestions,
            } => {
                let mut msg = format!("{kind} '{key}' was not found in {scope}.");
                if !suggestions.is_empty() {
                    msg.push_str(&format!("\nDid you mean: {}?", suggestions.join(", ")));
                }
                msg.push_str("\nRun 'wifimgr refresh' if the cache may be out of date.");
                msg
            }
            Self::Duplicate {
                kind,
                name,
                candidates,
            } => format!(
                "{kind} name '{name}' matches multiple objects: {}.\n\
                 Rename the duplicates or reference the object by id.",
                candidates.join(", ")
            ),
            Self::CapabilityNotSupported {
                vendor,
                label,
                capability,
                supported_by,
            } => {
                let supporters: Vec<String> =
                    supported_by.iter().map(|v| v.as_tag().to_owned()).collect();
                format!(
                    "The '{capability}' capability is not supported by {vendor} (API '{label}').\n\
                     Vendors that support it: {}",
                    join_or(&supporters, "(none)")
                )
            }
            Self::Validation { message } => {
                format!("Configuration validation failed:\n  {message}")
            }
            Self::FieldMapping {
                field,
                expected,
                context,
            } => format!(
                "The API returned an unexpected type for '{field}' in {context} \
                 (expected {expected}).\n\
                 This usually means the vendor changed their API schema."
            ),
            Self::CacheVersionMismatch { label, found } => format!(
                "The cache file for '{label}' uses unsupported format version {found}.\n\
                 Delete it and run 'wifimgr refresh --api {label}' to rebuild."
            ),
            Self::Config { message } => format!("Configuration error: {message}"),
            Self::Io(e) => format!("I/O error: {e}"),
            Self::Json(e) => format!("JSON error: {e}"),
            Self::Api(e) => format!("Vendor API error: {e}"),
            Self::Cancelled => "The operation was cancelled.".into(),
        }
    }

    /// Shortcut for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_owned()
    } else {
        items.join(", ")
    }
}

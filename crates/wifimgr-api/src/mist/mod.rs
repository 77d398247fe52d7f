// ── Mist cloud API client ──
//
// Raw HTTP surface for the Juniper Mist management cloud: org-scoped
// list endpoints, site-scoped device configuration, and device search.
// Responses come back as raw JSON values; decoding into canonical
// entities happens in wifimgr-core.
//
// Every call goes through the shared token bucket and the retry loop.
// Mist list endpoints paginate with `limit`/`page` query parameters and
// return bare JSON arrays; a short page terminates the scan.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::limiter::RateLimiter;
use crate::retry::{RetryPolicy, RetryState};
use crate::transport::TransportConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.mist.com";
const DEFAULT_PAGE_LIMIT: usize = 100;

/// Async client for the Mist cloud API.
pub struct MistClient {
    base: Url,
    org_id: String,
    http: reqwest::Client,
    limiter: Arc<RateLimiter>,
    page_limit: usize,
}

impl MistClient {
    /// Build a client authenticated with an org API token.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        org_id: impl Into<String>,
        rate_per_sec: f64,
        page_limit: Option<usize>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base = Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        let token = format!("Token {}", api_key.expose_secret());
        let mut value = HeaderValue::from_str(&token).map_err(|_| Error::Authentication {
            message: "API key contains invalid header characters".into(),
        })?;
        value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, value);

        Ok(Self {
            base,
            org_id: org_id.into(),
            http: transport.build_client(headers)?,
            limiter: Arc::new(RateLimiter::new(rate_per_sec)),
            page_limit: page_limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        })
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    // ── Org-scoped lists ─────────────────────────────────────────────

    /// List all sites in the org.
    pub async fn list_sites(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        self.get_paged(cancel, &format!("/api/v1/orgs/{}/sites", self.org_id), &[])
            .await
    }

    /// List org inventory, filtered by device type (`ap`, `switch`, `gateway`).
    pub async fn list_inventory(
        &self,
        cancel: &CancellationToken,
        device_type: &str,
    ) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/orgs/{}/inventory", self.org_id),
            &[("type", device_type)],
        )
        .await
    }

    /// Bulk device statistics for the whole org (single call, all types).
    pub async fn list_device_stats(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/orgs/{}/stats/devices", self.org_id),
            &[("type", "all")],
        )
        .await
    }

    /// List RF templates.
    pub async fn list_rf_templates(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/orgs/{}/rftemplates", self.org_id),
            &[],
        )
        .await
    }

    /// List gateway templates.
    pub async fn list_gateway_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/orgs/{}/gatewaytemplates", self.org_id),
            &[],
        )
        .await
    }

    /// List WLAN templates (Mist calls these "templates").
    pub async fn list_wlan_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/orgs/{}/templates", self.org_id),
            &[],
        )
        .await
    }

    /// List device profiles.
    pub async fn list_device_profiles(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/orgs/{}/deviceprofiles", self.org_id),
            &[],
        )
        .await
    }

    /// List org-level WLANs.
    pub async fn list_wlans(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        self.get_paged(cancel, &format!("/api/v1/orgs/{}/wlans", self.org_id), &[])
            .await
    }

    /// Search org devices by normalized MAC.
    pub async fn search_devices(
        &self,
        cancel: &CancellationToken,
        mac: &str,
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::GET,
            &format!("/api/v1/orgs/{}/devices/search", self.org_id),
            &[("mac", mac)],
            None,
            RetryPolicy::Idempotent,
        )
        .await
    }

    // ── Site-scoped device configuration ─────────────────────────────

    /// Bulk-list configured devices for a site, filtered by type.
    ///
    /// This is the cheap path: one call per site returns every device's
    /// configuration, which is why refresh always bulk-fetches for Mist.
    pub async fn list_site_devices(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        device_type: &str,
    ) -> Result<Vec<Value>, Error> {
        self.get_paged(
            cancel,
            &format!("/api/v1/sites/{site_id}/devices"),
            &[("type", device_type)],
        )
        .await
    }

    /// Fetch a single device's configuration.
    pub async fn get_device(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        device_id: &str,
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::GET,
            &format!("/api/v1/sites/{site_id}/devices/{device_id}"),
            &[],
            None,
            RetryPolicy::Idempotent,
        )
        .await
    }

    /// Update a device's configuration. Single attempt -- device updates
    /// are not idempotent-safe.
    pub async fn update_device(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        device_id: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::PUT,
            &format!("/api/v1/sites/{site_id}/devices/{device_id}"),
            &[],
            Some(body),
            RetryPolicy::Mutation,
        )
        .await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Paginated GET: `limit`/`page` until a short page.
    async fn get_paged(
        &self,
        cancel: &CancellationToken,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, Error> {
        let mut all = Vec::new();
        let mut page = 1usize;

        loop {
            let limit = self.page_limit.to_string();
            let page_s = page.to_string();
            let mut q: Vec<(&str, &str)> = query.to_vec();
            q.push(("limit", limit.as_str()));
            q.push(("page", page_s.as_str()));

            let value = self
                .request(cancel, reqwest::Method::GET, path, &q, None, RetryPolicy::Idempotent)
                .await?;

            let Value::Array(items) = value else {
                return Err(Error::Deserialization {
                    message: format!("expected JSON array from {path}"),
                    body: value.to_string(),
                });
            };

            let count = items.len();
            all.extend(items);

            if count < self.page_limit {
                break;
            }
            page += 1;
        }

        debug!(path, items = all.len(), "mist list complete");
        Ok(all)
    }

    /// One rate-limited, retried request. The acquire → execute →
    /// classify → back off loop lives here.
    async fn request(
        &self,
        cancel: &CancellationToken,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        policy: RetryPolicy,
    ) -> Result<Value, Error> {
        let url = self.base.join(path)?;
        let mut retry = RetryState::new(policy);

        loop {
            self.limiter.acquire(cancel).await?;

            let mut req = self.http.request(method.clone(), url.clone()).query(query);
            if let Some(b) = body {
                req = req.json(b);
            }

            match execute(req).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !retry.should_retry(&err) {
                        return Err(err);
                    }
                    warn!(
                        %url,
                        attempt = retry.attempt(),
                        error = %err,
                        "mist request failed, retrying"
                    );
                    let hint = err.retry_after();
                    retry.wait_before_retry(cancel, hint).await?;
                }
            }
        }
    }
}

impl std::fmt::Debug for MistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistClient")
            .field("base", &self.base.as_str())
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

/// Send one request and turn the response into JSON or a classified error.
pub(crate) async fn execute(req: reqwest::RequestBuilder) -> Result<Value, Error> {
    let resp = req.send().await?;
    let status = resp.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        return Err(Error::RateLimited { retry_after_secs });
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: error_detail(&body).unwrap_or_else(|| format!("HTTP {status}")),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            message: error_detail(&body).unwrap_or_else(|| truncate(&body)),
            status: status.as_u16(),
        });
    }

    let body = resp.text().await?;
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: truncate(&body),
    })
}

/// Pull a human-readable message out of a vendor error body.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "message", "errors"] {
        match value.get(key) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Array(errs)) if !errs.is_empty() => {
                return Some(
                    errs.iter()
                        .filter_map(|e| e.as_str())
                        .collect::<Vec<_>>()
                        .join("; "),
                );
            }
            _ => {}
        }
    }
    None
}

fn truncate(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        body.to_owned()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

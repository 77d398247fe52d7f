// ── Meraki Dashboard API client ──
//
// Raw HTTP surface for the Cisco Meraki Dashboard: org-scoped networks
// and inventory, bulk device availabilities, per-device wireless radio
// settings, RF profiles, SSIDs, and claim/release by serial.
//
// Meraki enforces a hard 10 req/s token bucket server-side; the config
// layer clamps the configured rate before this client is constructed.
// Device configuration is per-device only (no bulk endpoint), which is
// why refresh treats Meraki config fetches as on-demand.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::limiter::RateLimiter;
use crate::mist::execute;
use crate::retry::{RetryPolicy, RetryState};
use crate::transport::TransportConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Sentinel `perPage` value meaning "return everything in one page".
/// The availabilities endpoint accepts it; ordinary list endpoints do not.
const PER_PAGE_ALL: i64 = -1;

/// Async client for the Meraki Dashboard API.
pub struct MerakiClient {
    base: Url,
    org_id: String,
    http: reqwest::Client,
    limiter: Arc<RateLimiter>,
    page_limit: usize,
}

impl MerakiClient {
    /// Build a client authenticated with a Dashboard API key.
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
        let mut value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|_| Error::Authentication {
                message: "API key contains invalid header characters".into(),
            })?;
        value.set_sensitive(true);
        headers.insert("X-Cisco-Meraki-API-Key", value);

        Ok(Self {
            base,
            org_id: org_id.into(),
            http: transport.build_client(headers)?,
            limiter: Arc::new(RateLimiter::new(rate_per_sec)),
            page_limit: page_limit.unwrap_or(1000),
        })
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    // ── Org-scoped lists ─────────────────────────────────────────────

    /// List the org's networks. Meraki networks play the role of sites.
    pub async fn list_networks(&self, cancel: &CancellationToken) -> Result<Vec<Value>, Error> {
        self.get_list(
            cancel,
            &format!("organizations/{}/networks", self.org_id),
            &[],
        )
        .await
    }

    /// List org inventory devices, optionally filtered by product type
    /// (`wireless`, `switch`, `appliance`).
    pub async fn list_inventory(
        &self,
        cancel: &CancellationToken,
        product_type: Option<&str>,
    ) -> Result<Vec<Value>, Error> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(pt) = product_type {
            query.push(("productTypes[]", pt));
        }
        self.get_list(
            cancel,
            &format!("organizations/{}/inventory/devices", self.org_id),
            &query,
        )
        .await
    }

    /// Bulk device availabilities for the whole org.
    ///
    /// Uses the `perPage: -1` sentinel the endpoint supports, so this is
    /// a single call regardless of fleet size.
    pub async fn list_device_availabilities(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, Error> {
        let per_page = PER_PAGE_ALL.to_string();
        let value = self
            .request(
                cancel,
                reqwest::Method::GET,
                &format!("organizations/{}/devices/availabilities", self.org_id),
                &[("perPage", per_page.as_str())],
                None,
                RetryPolicy::Idempotent,
            )
            .await?;
        into_array(value, "devices/availabilities")
    }

    /// Claim devices into the org by serial number.
    ///
    /// Meraki's UI talks about "claim codes", but the API argument is a
    /// plain serial number -- callers must pass serials here.
    pub async fn claim_devices(
        &self,
        cancel: &CancellationToken,
        serials: &[String],
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::POST,
            &format!("organizations/{}/claim", self.org_id),
            &[],
            Some(&json!({ "serials": serials })),
            RetryPolicy::Mutation,
        )
        .await
    }

    // ── Network-scoped lists ─────────────────────────────────────────

    /// List wireless RF profiles for a network.
    pub async fn list_rf_profiles(
        &self,
        cancel: &CancellationToken,
        network_id: &str,
    ) -> Result<Vec<Value>, Error> {
        let value = self
            .request(
                cancel,
                reqwest::Method::GET,
                &format!("networks/{network_id}/wireless/rfProfiles"),
                &[],
                None,
                RetryPolicy::Idempotent,
            )
            .await?;
        into_array(value, "wireless/rfProfiles")
    }

    /// List wireless SSIDs for a network.
    pub async fn list_ssids(
        &self,
        cancel: &CancellationToken,
        network_id: &str,
    ) -> Result<Vec<Value>, Error> {
        let value = self
            .request(
                cancel,
                reqwest::Method::GET,
                &format!("networks/{network_id}/wireless/ssids"),
                &[],
                None,
                RetryPolicy::Idempotent,
            )
            .await?;
        into_array(value, "wireless/ssids")
    }

    /// Remove a device from a network by serial number.
    pub async fn remove_device(
        &self,
        cancel: &CancellationToken,
        network_id: &str,
        serial: &str,
    ) -> Result<(), Error> {
        self.request(
            cancel,
            reqwest::Method::POST,
            &format!("networks/{network_id}/devices/remove"),
            &[],
            Some(&json!({ "serial": serial })),
            RetryPolicy::Mutation,
        )
        .await?;
        Ok(())
    }

    // ── Per-device configuration ─────────────────────────────────────

    /// Fetch a device's wireless radio settings. Per-device only -- there
    /// is no bulk equivalent, so callers fetch on demand.
    pub async fn get_radio_settings(
        &self,
        cancel: &CancellationToken,
        serial: &str,
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::GET,
            &format!("devices/{serial}/wireless/radio/settings"),
            &[],
            None,
            RetryPolicy::Idempotent,
        )
        .await
    }

    /// Update a device's wireless radio settings. Single attempt.
    pub async fn update_radio_settings(
        &self,
        cancel: &CancellationToken,
        serial: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::PUT,
            &format!("devices/{serial}/wireless/radio/settings"),
            &[],
            Some(body),
            RetryPolicy::Mutation,
        )
        .await
    }

    /// Fetch a single device's base attributes (name, address, tags).
    pub async fn get_device(
        &self,
        cancel: &CancellationToken,
        serial: &str,
    ) -> Result<Value, Error> {
        self.request(
            cancel,
            reqwest::Method::GET,
            &format!("devices/{serial}"),
            &[],
            None,
            RetryPolicy::Idempotent,
        )
        .await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Paginated list GET using `perPage`/`startingAfter`.
    ///
    /// Meraki paginates with Link headers; this walks pages by the `id`
    /// or `serial` of the last element, which every paginated endpoint
    /// in use here supports.
    async fn get_list(
        &self,
        cancel: &CancellationToken,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, Error> {
        let mut all: Vec<Value> = Vec::new();
        let mut starting_after: Option<String> = None;
        let per_page = self.page_limit.to_string();

        loop {
            let mut q: Vec<(&str, &str)> = query.to_vec();
            q.push(("perPage", per_page.as_str()));
            if let Some(ref after) = starting_after {
                q.push(("startingAfter", after.as_str()));
            }

            let value = self
                .request(cancel, reqwest::Method::GET, path, &q, None, RetryPolicy::Idempotent)
                .await?;
            let items = into_array(value, path)?;
            let count = items.len();

            starting_after = items.last().and_then(|last| {
                last.get("id")
                    .or_else(|| last.get("serial"))
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            });
            all.extend(items);

            if count < self.page_limit || starting_after.is_none() {
                break;
            }
        }

        debug!(path, items = all.len(), "meraki list complete");
        Ok(all)
    }

    /// One rate-limited, retried request.
    async fn request(
        &self,
        cancel: &CancellationToken,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        policy: RetryPolicy,
    ) -> Result<Value, Error> {
        // The base URL carries the /api/v1 prefix; joining an absolute
        // path would drop it, so paths here are relative.
        let url = join_base(&self.base, path)?;
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
                        "meraki request failed, retrying"
                    );
                    let hint = err.retry_after();
                    retry.wait_before_retry(cancel, hint).await?;
                }
            }
        }
    }
}

impl std::fmt::Debug for MerakiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerakiClient")
            .field("base", &self.base.as_str())
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

fn join_base(base: &Url, path: &str) -> Result<Url, Error> {
    let mut s = base.as_str().trim_end_matches('/').to_owned();
    s.push('/');
    s.push_str(path);
    Ok(Url::parse(&s)?)
}

fn into_array(value: Value, path: &str) -> Result<Vec<Value>, Error> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::Deserialization {
            message: format!("expected JSON array from {path}"),
            body: other.to_string(),
        }),
    }
}

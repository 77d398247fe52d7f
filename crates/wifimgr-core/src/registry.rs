// ── Client registry and fan-out ──
//
// Maps vendor tags to client factories and API labels to constructed
// clients. Writes happen only at startup (`register_factory`,
// `initialize_clients`); everything after is read-dominated, so a
// std RwLock fits. Label maps are BTreeMaps -- iteration order is the
// lexicographic order the fan-out contract requires.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::client::VendorClient;
use crate::error::CoreError;
use crate::model::{ApiConfig, Vendor};

/// Constructor for one vendor's client.
pub type ClientFactory = Box<dyn Fn(&ApiConfig) -> Result<VendorClient, CoreError> + Send + Sync>;

/// One row of the registry status view.
#[derive(Debug, Clone)]
pub struct ApiStatusRow {
    pub label: String,
    pub vendor: Vendor,
    pub org_id: String,
    pub capabilities: Vec<&'static str>,
    pub healthy: bool,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct RegistryInner {
    factories: BTreeMap<Vendor, ClientFactory>,
    configs: BTreeMap<String, ApiConfig>,
    clients: BTreeMap<String, Arc<VendorClient>>,
    init_errors: BTreeMap<String, String>,
}

/// Registry of configured API connections.
#[derive(Default)]
pub struct ClientRegistry {
    inner: RwLock<RegistryInner>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a vendor factory. Must happen before
    /// [`initialize_clients`](Self::initialize_clients).
    pub fn register_factory(&self, vendor: Vendor, factory: ClientFactory) {
        self.write().factories.insert(vendor, factory);
    }

    /// Build a client for every config whose vendor has a factory.
    ///
    /// Partial success: a failing factory or unregistered vendor is
    /// recorded per label and does not stop the others.
    pub fn initialize_clients(&self, configs: Vec<ApiConfig>) -> BTreeMap<String, CoreError> {
        let mut errors = BTreeMap::new();
        let mut inner = self.write();

        for config in configs {
            let label = config.label.clone();

            let Some(factory) = inner.factories.get(&config.vendor) else {
                let err = CoreError::Config {
                    message: format!(
                        "no factory registered for vendor '{}' (API '{label}')",
                        config.vendor
                    ),
                };
                warn!(label = %label, vendor = %config.vendor, "skipping API: vendor not registered");
                inner.init_errors.insert(label.clone(), err.to_string());
                errors.insert(label.clone(), err);
                inner.configs.insert(label, config);
                continue;
            };

            match factory(&config) {
                Ok(client) => {
                    info!(label = %label, vendor = %config.vendor, "client initialized");
                    inner.clients.insert(label.clone(), Arc::new(client));
                    inner.init_errors.remove(&label);
                }
                Err(err) => {
                    warn!(label = %label, error = %err, "client initialization failed");
                    inner.init_errors.insert(label.clone(), err.to_string());
                    errors.insert(label.clone(), err);
                }
            }
            inner.configs.insert(label, config);
        }
        errors
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn client(&self, label: &str) -> Result<Arc<VendorClient>, CoreError> {
        let inner = self.read();
        inner
            .clients
            .get(label)
            .cloned()
            .ok_or_else(|| CoreError::ApiNotFound {
                label: label.to_owned(),
                available: inner.clients.keys().cloned().collect(),
            })
    }

    pub fn config(&self, label: &str) -> Result<ApiConfig, CoreError> {
        let inner = self.read();
        inner
            .configs
            .get(label)
            .cloned()
            .ok_or_else(|| CoreError::ApiNotFound {
                label: label.to_owned(),
                available: inner.configs.keys().cloned().collect(),
            })
    }

    pub fn vendor(&self, label: &str) -> Result<Vendor, CoreError> {
        self.config(label).map(|c| c.vendor)
    }

    pub fn org_id(&self, label: &str) -> Result<String, CoreError> {
        self.client(label).map(|c| c.org_id.clone())
    }

    /// All configured labels, lexicographically sorted.
    pub fn labels(&self) -> Vec<String> {
        self.read().configs.keys().cloned().collect()
    }

    /// Labels with a successfully constructed client, sorted.
    pub fn active_labels(&self) -> Vec<String> {
        self.read().clients.keys().cloned().collect()
    }

    // ── Fan-out ──────────────────────────────────────────────────────

    /// Visit every active API sequentially in label order, stopping on
    /// the first error.
    pub async fn for_each_api<F, Fut>(&self, mut f: F) -> Result<(), CoreError>
    where
        F: FnMut(String, Arc<VendorClient>) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let clients: Vec<(String, Arc<VendorClient>)> = {
            let inner = self.read();
            inner
                .clients
                .iter()
                .map(|(label, client)| (label.clone(), Arc::clone(client)))
                .collect()
        };

        for (label, client) in clients {
            f(label, client).await?;
        }
        Ok(())
    }

    /// Visit every active API concurrently, one task per label.
    ///
    /// Waits for all tasks; per-label failures are collected into the
    /// returned map. No ordering guarantee across tasks.
    pub async fn for_each_api_parallel<F, Fut>(&self, f: F) -> BTreeMap<String, CoreError>
    where
        F: Fn(String, Arc<VendorClient>) -> Fut,
        Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
    {
        let clients: Vec<(String, Arc<VendorClient>)> = {
            let inner = self.read();
            inner
                .clients
                .iter()
                .map(|(label, client)| (label.clone(), Arc::clone(client)))
                .collect()
        };

        let mut tasks = tokio::task::JoinSet::new();
        for (label, client) in clients {
            let fut = f(label.clone(), client);
            tasks.spawn(async move { (label, fut.await) });
        }

        let mut errors = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((label, Err(err))) => {
                    errors.insert(label, err);
                }
                Ok((_, Ok(()))) => {}
                Err(join_err) => {
                    warn!(error = %join_err, "fan-out task panicked");
                }
            }
        }
        errors
    }

    // ── Status ───────────────────────────────────────────────────────

    /// One row per configured API, in label order.
    pub fn status(&self) -> Vec<ApiStatusRow> {
        let inner = self.read();
        inner
            .configs
            .iter()
            .map(|(label, config)| {
                let client = inner.clients.get(label);
                let last_error = inner.init_errors.get(label).cloned();
                ApiStatusRow {
                    label: label.clone(),
                    vendor: config.vendor,
                    org_id: client
                        .map(|c| c.org_id.clone())
                        .unwrap_or_else(|| config.org_id().to_owned()),
                    capabilities: client.map(|c| c.capabilities()).unwrap_or_default(),
                    healthy: client.is_some() && last_error.is_none(),
                    last_error,
                }
            })
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

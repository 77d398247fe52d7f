// ── Cache refresh ──
//
// Builds a complete snapshot per API and writes it atomically by
// overwrite -- a cache on disk is never partially written. The step
// order (sites → inventory → statuses → templates → profiles → WLANs →
// configs) is load-bearing: inventory supplies the site ids the config
// fetches need, and the index rebuild at the end relies on inventory
// being complete.
//
// Error policy: sites and inventory are required -- their failure aborts
// this API's refresh without touching others. Everything else is
// optional: failures warn and skip, so the cache stays usable with any
// single capability missing. Cancellation aborts between sub-steps and
// propagates verbatim.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::document::ApiCache;
use super::manager::CacheManager;
use crate::error::CoreError;
use crate::model::{DeviceKind, MacAddress, Vendor};
use crate::registry::ClientRegistry;

/// Reserved label under which an index-rebuild failure is reported in
/// the per-label error map of [`CacheManager::refresh_all`]. Callers
/// iterating reported labels must tolerate this key.
pub const INDEX_ERROR_LABEL: &str = "_index";

#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    /// Force per-device config fetching even for vendors where it is
    /// expensive. Bulk-capable vendors always fetch.
    pub fetch_device_configs: bool,
}

impl CacheManager {
    /// Refresh one API's cache and rebuild the cross-API index.
    pub async fn refresh_api(
        &self,
        cancel: &CancellationToken,
        registry: &ClientRegistry,
        label: &str,
        opts: &RefreshOptions,
    ) -> Result<(), CoreError> {
        self.refresh_api_snapshot(cancel, registry, label, opts)
            .await?;
        self.rebuild_index()?;
        Ok(())
    }

    /// Refresh one API's cache without the index rebuild. Used by
    /// [`refresh_all`](Self::refresh_all), which rebuilds once at the end.
    pub(crate) async fn refresh_api_snapshot(
        &self,
        cancel: &CancellationToken,
        registry: &ClientRegistry,
        label: &str,
        opts: &RefreshOptions,
    ) -> Result<(), CoreError> {
        let start = std::time::Instant::now();
        let client = registry.client(label)?;
        let config = registry.config(label)?;
        let initial_creation = !self.api_cache_path(label).exists();

        let mut cache = ApiCache::new(label, config.vendor, client.org_id.clone());

        // Sites -- required.
        check_cancel(cancel)?;
        cache.sites = client.require_sites()?.list_sites(cancel).await?;
        cache.rebuild_site_index();

        // Inventory, three device kinds -- required.
        let inventory_facet = client.require_inventory()?;
        for kind in DeviceKind::ALL {
            check_cancel(cancel)?;
            let items = inventory_facet.list_inventory(cancel, kind).await?;
            let site_names = cache.site_index.by_id.clone();
            let map = cache.inventory_mut(kind);
            for mut item in items {
                if item.site_name.is_empty() && !item.site_id.is_empty() {
                    if let Some(name) = site_names.get(&item.site_id) {
                        item.site_name = name.clone();
                    }
                }
                map.insert(item.mac.as_str().to_owned(), item);
            }
        }

        // Statuses -- optional.
        if let Some(statuses) = &client.statuses {
            check_cancel(cancel)?;
            match statuses.list_statuses(cancel).await {
                Ok(statuses) => {
                    for status in statuses {
                        cache
                            .device_status
                            .insert(status.mac.as_str().to_owned(), status);
                    }
                }
                Err(e) => non_fatal(label, "statuses", e)?,
            }
        }

        // Templates -- optional facet.
        if let Some(templates) = &client.templates {
            check_cancel(cancel)?;
            match templates.list_rf_templates(cancel).await {
                Ok(t) => cache.rf_templates = t,
                Err(e) => non_fatal(label, "rf templates", e)?,
            }
            match templates.list_gateway_templates(cancel).await {
                Ok(t) => cache.gateway_templates = t,
                Err(e) => non_fatal(label, "gateway templates", e)?,
            }
            match templates.list_wlan_templates(cancel).await {
                Ok(t) => cache.wlan_templates = t,
                Err(e) => non_fatal(label, "wlan templates", e)?,
            }
        }

        // Device profiles -- optional facet.
        if let Some(profiles) = &client.profiles {
            check_cancel(cancel)?;
            match profiles.list_device_profiles(cancel).await {
                Ok(p) => cache.device_profiles = p,
                Err(e) => non_fatal(label, "device profiles", e)?,
            }
        }

        // WLANs -- optional facet.
        if let Some(wlans) = &client.wlans {
            check_cancel(cancel)?;
            match wlans.list_wlans(cancel).await {
                Ok(list) => {
                    for wlan in list {
                        cache.wlans.insert(wlan.id.clone(), wlan);
                    }
                }
                Err(e) => non_fatal(label, "wlans", e)?,
            }
        }

        // Device configs. Bulk vendors (Mist) always fetch; per-device
        // vendors (Meraki) only on request or first creation -- a
        // per-device scan is one call per device.
        let fetch_configs =
            opts.fetch_device_configs || initial_creation || config.vendor == Vendor::Mist;
        if let (Some(configs), true) = (&client.configs, fetch_configs) {
            if configs.bulk_capable() {
                let site_ids: Vec<String> = cache.sites.iter().map(|s| s.id.clone()).collect();
                for site_id in site_ids {
                    for kind in DeviceKind::ALL {
                        check_cancel(cancel)?;
                        match configs.fetch_site_configs(cancel, &site_id, kind).await {
                            Ok(pairs) => {
                                for (mac, value) in pairs {
                                    let id = cache
                                        .inventory(kind)
                                        .get(mac.as_str())
                                        .map(|i| i.id.clone())
                                        .unwrap_or_default();
                                    cache.insert_config(kind, id, mac, site_id.clone(), value);
                                }
                            }
                            Err(e) => non_fatal(label, "site configs", e)?,
                        }
                    }
                }
            } else {
                let items: Vec<_> = cache.all_inventory().cloned().collect();
                for item in items {
                    if item.site_id.is_empty() {
                        continue; // unassigned devices carry no config
                    }
                    check_cancel(cancel)?;
                    match configs.fetch_device_config(cancel, &item).await {
                        Ok(value) => cache.insert_config(
                            item.device_type,
                            item.id.clone(),
                            item.mac.clone(),
                            item.site_id.clone(),
                            value,
                        ),
                        Err(e) => {
                            if matches!(e, CoreError::Cancelled) {
                                return Err(e);
                            }
                            warn!(
                                label,
                                mac = %item.mac,
                                error = %e,
                                "device config fetch failed, skipping"
                            );
                        }
                    }
                }
            }
        }

        cache.metadata.refresh_duration_ms = start.elapsed().as_millis() as u64;
        self.save_api_cache(&mut cache)?;
        info!(
            label,
            duration_ms = cache.metadata.refresh_duration_ms,
            sites = cache.sites.len(),
            devices = cache.all_inventory().count(),
            "API refresh complete"
        );
        Ok(())
    }

    /// Refresh every active API in parallel, then rebuild the cross-API
    /// index once. Per-label failures are collected; an index-rebuild
    /// failure is reported under [`INDEX_ERROR_LABEL`].
    pub async fn refresh_all(
        &self,
        cancel: &CancellationToken,
        registry: &Arc<ClientRegistry>,
        opts: RefreshOptions,
    ) -> BTreeMap<String, CoreError> {
        let manager = self.clone();
        let registry_for_tasks = Arc::clone(registry);
        let cancel = cancel.clone();

        let mut errors = registry
            .for_each_api_parallel(move |label, _client| {
                let manager = manager.clone();
                let registry = Arc::clone(&registry_for_tasks);
                let cancel = cancel.clone();
                let opts = opts.clone();
                async move {
                    manager
                        .refresh_api_snapshot(&cancel, &registry, &label, &opts)
                        .await
                }
            })
            .await;

        if let Err(e) = self.rebuild_index() {
            errors.insert(INDEX_ERROR_LABEL.to_owned(), e);
        }
        errors
    }

    // ── On-demand single-device config ───────────────────────────────

    /// Fetch one device's config, update the cache in memory, and write
    /// it back to disk.
    pub async fn fetch_device_config(
        &self,
        cancel: &CancellationToken,
        registry: &ClientRegistry,
        label: &str,
        kind: DeviceKind,
        mac: &MacAddress,
    ) -> Result<Value, CoreError> {
        let client = registry.client(label)?;
        let mut cache = self.get_api_cache(label)?;

        let item = cache
            .inventory(kind)
            .get(mac.as_str())
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: mac.display(),
            })?;

        let configs = client.require_configs()?;
        let value = configs.fetch_device_config(cancel, &item).await?;

        cache.insert_config(
            kind,
            item.id.clone(),
            item.mac.clone(),
            item.site_id.clone(),
            value.clone(),
        );
        self.save_api_cache(&mut cache)?;
        Ok(value)
    }

    /// Make sure a device's config is cached. No-op when it already is,
    /// or when the vendor bulk-fetches on every refresh anyway.
    pub async fn ensure_device_config(
        &self,
        cancel: &CancellationToken,
        registry: &ClientRegistry,
        label: &str,
        kind: DeviceKind,
        mac: &MacAddress,
    ) -> Result<(), CoreError> {
        let cache = self.get_api_cache(label)?;
        if cache.config_value(kind, mac).is_some() {
            return Ok(());
        }

        let client = registry.client(label)?;
        if client.configs.as_ref().is_some_and(|c| c.bulk_capable()) {
            return Ok(());
        }

        self.fetch_device_config(cancel, registry, label, kind, mac)
            .await
            .map(|_| ())
    }
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), CoreError> {
    if cancel.is_cancelled() {
        Err(CoreError::Cancelled)
    } else {
        Ok(())
    }
}

/// Optional-facet error policy: cancellation propagates, everything
/// else is a warning.
fn non_fatal(label: &str, what: &str, err: CoreError) -> Result<(), CoreError> {
    if matches!(err, CoreError::Cancelled) {
        return Err(err);
    }
    warn!(label, what, error = %err, "optional refresh step failed, skipping");
    Ok(())
}

// ── Cache manager: disk layout, load/save, verification ──
//
// Owns the on-disk cache directory:
//
//   <cacheDir>/
//     index.json                # cross-API index
//     apis/
//       <label>.json            # one cache per API
//       .<label>.json.meta      # integrity sidecar
//
// Cheaply cloneable via `Arc` so refresh fan-out can spawn per-label
// tasks. A reader-writer lock guards disk operations; the guard is
// never held across an await -- saves serialize in memory first and
// complete or fail as a unit.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::document::{ApiCache, CACHE_VERSION};
use super::index::{CrossApiIndex, MacCollision};
use super::integrity::{SidecarCheck, verify_sidecar, write_sidecar};
use crate::error::CoreError;
use crate::model::{ApiConfig, InventoryItem, MacAddress};

/// Classification returned by [`CacheManager::verify_api_cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// No cache file on disk.
    Missing,
    /// Integrity mismatch or inconsistent item counts.
    Corrupted { reason: String },
    /// Older than the configured TTL.
    Stale { age: Duration },
    Ok,
}

struct ManagerInner {
    cache_dir: PathBuf,
    disk: RwLock<()>,
}

/// Handle to the on-disk cache store.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<ManagerInner>,
}

impl CacheManager {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                cache_dir: cache_dir.into(),
                disk: RwLock::new(()),
            }),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    pub fn api_cache_path(&self, label: &str) -> PathBuf {
        self.inner.cache_dir.join("apis").join(format!("{label}.json"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.inner.cache_dir.join("index.json")
    }

    // ── Load ─────────────────────────────────────────────────────────

    /// Load one API's cache. Missing file is `ApiNotFound`; a sidecar
    /// mismatch is a warning, not a failure. Provenance is stamped on
    /// every entity before return.
    pub fn get_api_cache(&self, label: &str) -> Result<ApiCache, CoreError> {
        let _guard = self.read_lock();
        self.load_cache_unlocked(label)
    }

    fn load_cache_unlocked(&self, label: &str) -> Result<ApiCache, CoreError> {
        let path = self.api_cache_path(label);
        let contents = match std::fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::ApiNotFound {
                    label: label.to_owned(),
                    available: self.cached_labels_unlocked(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        match verify_sidecar(&path, &contents) {
            SidecarCheck::Valid | SidecarCheck::Missing => {}
            SidecarCheck::Mismatch { expected, actual } => {
                warn!(
                    label,
                    expected, actual, "cache integrity mismatch, file was modified out of band"
                );
            }
        }

        let mut cache: ApiCache = serde_json::from_slice(&contents)?;
        if cache.version != CACHE_VERSION {
            return Err(CoreError::CacheVersionMismatch {
                label: label.to_owned(),
                found: cache.version,
            });
        }
        cache.stamp_provenance();
        Ok(cache)
    }

    /// Labels with a cache file on disk, sorted.
    pub fn cached_labels(&self) -> Vec<String> {
        let _guard = self.read_lock();
        self.cached_labels_unlocked()
    }

    fn cached_labels_unlocked(&self) -> Vec<String> {
        let apis_dir = self.inner.cache_dir.join("apis");
        let Ok(entries) = std::fs::read_dir(&apis_dir) else {
            return Vec::new();
        };
        let mut labels: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    return None;
                }
                name.strip_suffix(".json").map(str::to_owned)
            })
            .collect();
        labels.sort();
        labels
    }

    // ── Save ─────────────────────────────────────────────────────────

    /// Persist one API's cache: recount items, rebuild the in-document
    /// site index, write the cache file, then the sidecar. Sidecar
    /// failure is a warning -- the cache write already happened.
    pub fn save_api_cache(&self, cache: &mut ApiCache) -> Result<(), CoreError> {
        cache.recount();
        cache.rebuild_site_index();

        let contents = serde_json::to_vec_pretty(&cache)?;
        let path = self.api_cache_path(&cache.label);

        let _guard = self.write_lock();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &contents)?;

        if let Err(e) = write_sidecar(&path, &contents) {
            warn!(label = %cache.label, error = %e, "failed to write integrity sidecar");
        }

        debug!(label = %cache.label, bytes = contents.len(), "cache saved");
        Ok(())
    }

    // ── Cross-API index ──────────────────────────────────────────────

    /// Rebuild the cross-API index by scanning every cache on disk.
    /// Unreadable caches are skipped with a warning. MAC collisions are
    /// logged and do not fail the rebuild.
    pub fn rebuild_index(&self) -> Result<CrossApiIndex, CoreError> {
        let _guard = self.write_lock();

        let mut caches = Vec::new();
        for label in self.cached_labels_unlocked() {
            match self.load_cache_unlocked(&label) {
                Ok(cache) => caches.push(cache),
                Err(e) => {
                    warn!(label = %label, error = %e, "skipping unreadable cache during index rebuild");
                }
            }
        }

        let (index, collisions) = CrossApiIndex::build(caches.iter());
        for MacCollision { mac, kept, ignored } in &collisions {
            warn!(
                mac,
                kept, ignored, "MAC present in multiple APIs, keeping first-seen mapping"
            );
        }

        std::fs::create_dir_all(&self.inner.cache_dir)?;
        std::fs::write(self.index_path(), serde_json::to_vec_pretty(&index)?)?;
        info!(
            macs = index.mac_to_api.len(),
            sites = index.site_name_to_apis.len(),
            collisions = collisions.len(),
            "cross-API index rebuilt"
        );
        Ok(index)
    }

    /// Load the persisted index, or an empty one if absent.
    pub fn load_index(&self) -> Result<CrossApiIndex, CoreError> {
        let _guard = self.read_lock();
        match std::fs::read(self.index_path()) {
            Ok(contents) => Ok(serde_json::from_slice(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CrossApiIndex::default()),
            Err(e) => Err(e.into()),
        }
    }

    // ── Verification ─────────────────────────────────────────────────

    /// Classify one API's cache state: missing, corrupted, stale, or OK.
    pub fn verify_api_cache(&self, config: &ApiConfig) -> CacheState {
        let _guard = self.read_lock();
        let path = self.api_cache_path(&config.label);

        let contents = match std::fs::read(&path) {
            Ok(c) => c,
            Err(_) => return CacheState::Missing,
        };

        if let SidecarCheck::Mismatch { expected, actual } = verify_sidecar(&path, &contents) {
            return CacheState::Corrupted {
                reason: format!("integrity hash mismatch (expected {expected}, got {actual})"),
            };
        }

        let cache: ApiCache = match serde_json::from_slice(&contents) {
            Ok(c) => c,
            Err(e) => {
                return CacheState::Corrupted {
                    reason: format!("unparseable cache: {e}"),
                };
            }
        };

        if !cache.counts_consistent() {
            return CacheState::Corrupted {
                reason: "item counts do not match collections".into(),
            };
        }

        if let Some(ttl) = config.effective_ttl() {
            let age = (Utc::now() - cache.metadata.last_refresh)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age > ttl {
                return CacheState::Stale { age };
            }
        }

        CacheState::Ok
    }

    // ── Cross-API lookups ────────────────────────────────────────────

    /// Find the inventory item for a MAC via the cross-API index.
    /// Returns the owning label and the item.
    pub fn find_device_by_mac(
        &self,
        mac: &MacAddress,
    ) -> Result<(String, InventoryItem), CoreError> {
        let index = self.load_index()?;
        let label = index
            .api_for_mac(mac.as_str())
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: mac.display(),
            })?
            .to_owned();

        let cache = self.get_api_cache(&label)?;
        let item = cache
            .find_inventory(mac)
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: mac.display(),
            })?;
        Ok((label, item))
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, ()> {
        match self.inner.disk.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, ()> {
        match self.inner.disk.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::model::{DeviceKind, InventoryItem, Provenance, SiteInfo, Vendor};

    use super::*;

    fn manager() -> (tempfile::TempDir, CacheManager) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CacheManager::new(dir.path());
        (dir, mgr)
    }

    fn config(label: &str, ttl: i64) -> ApiConfig {
        ApiConfig {
            label: label.into(),
            vendor: Vendor::Mist,
            base_url: String::new(),
            credentials: HashMap::new(),
            rate_limit: 10.0,
            results_limit: None,
            cache_ttl_secs: ttl,
        }
    }

    fn sample_cache(label: &str) -> ApiCache {
        let mut cache = ApiCache::new(label, Vendor::Mist, "org-1");
        cache.sites.push(SiteInfo {
            id: "s1".into(),
            name: "HQ".into(),
            ..Default::default()
        });
        let mac = MacAddress::normalize("aa:bb:cc:dd:ee:01");
        cache.inventory_ap.insert(
            mac.as_str().to_owned(),
            InventoryItem {
                id: "dev-1".into(),
                mac,
                serial: "S1".into(),
                model: "AP-1".into(),
                name: "lobby".into(),
                device_type: DeviceKind::Ap,
                site_id: "s1".into(),
                site_name: "HQ".into(),
                claimed: true,
                netbox: None,
                provenance: Provenance::default(),
            },
        );
        cache
    }

    #[test]
    fn missing_cache_is_api_not_found() {
        let (_dir, mgr) = manager();
        assert!(matches!(
            mgr.get_api_cache("nope"),
            Err(CoreError::ApiNotFound { .. })
        ));
    }

    #[test]
    fn save_load_round_trip_stamps_provenance() {
        let (_dir, mgr) = manager();
        let mut cache = sample_cache("mist-lab");
        mgr.save_api_cache(&mut cache).unwrap();

        let loaded = mgr.get_api_cache("mist-lab").unwrap();
        assert_eq!(loaded.sites.len(), 1);
        assert_eq!(loaded.sites[0].provenance.api, "mist-lab");
        assert_eq!(loaded.sites[0].provenance.vendor, Vendor::Mist);

        // Site index was rebuilt on save.
        assert_eq!(loaded.site_index.by_name["HQ"], "s1");
        assert_eq!(loaded.site_index.by_id["s1"], "HQ");
    }

    #[test]
    fn verify_classifies_states() {
        let (_dir, mgr) = manager();

        // Missing before first save.
        assert_eq!(mgr.verify_api_cache(&config("mist-lab", 0)), CacheState::Missing);

        let mut cache = sample_cache("mist-lab");
        mgr.save_api_cache(&mut cache).unwrap();
        assert_eq!(mgr.verify_api_cache(&config("mist-lab", 0)), CacheState::Ok);

        // TTL 0 never goes stale; a 1-second TTL with a backdated
        // refresh timestamp does.
        cache.metadata.last_refresh = Utc::now() - chrono::Duration::hours(2);
        mgr.save_api_cache(&mut cache).unwrap();
        assert_eq!(mgr.verify_api_cache(&config("mist-lab", 0)), CacheState::Ok);
        assert!(matches!(
            mgr.verify_api_cache(&config("mist-lab", 3600)),
            CacheState::Stale { .. }
        ));
    }

    #[test]
    fn tampering_is_detected() {
        let (_dir, mgr) = manager();
        let mut cache = sample_cache("mist-lab");
        mgr.save_api_cache(&mut cache).unwrap();

        let path = mgr.api_cache_path("mist-lab");
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push('\n');
        std::fs::write(&path, contents).unwrap();

        assert!(matches!(
            mgr.verify_api_cache(&config("mist-lab", 0)),
            CacheState::Corrupted { .. }
        ));

        // Load still succeeds (mismatch is a warning only).
        assert!(mgr.get_api_cache("mist-lab").is_ok());
    }

    #[test]
    fn wrong_version_is_refused() {
        let (_dir, mgr) = manager();
        let mut cache = sample_cache("mist-lab");
        cache.version = 7;
        // Bypass save_api_cache to keep the bogus version.
        let path = mgr.api_cache_path("mist-lab");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_vec(&cache).unwrap()).unwrap();

        assert!(matches!(
            mgr.get_api_cache("mist-lab"),
            Err(CoreError::CacheVersionMismatch { found: 7, .. })
        ));
    }

    #[test]
    fn index_rebuild_and_mac_lookup() {
        let (_dir, mgr) = manager();
        let mut cache = sample_cache("mist-lab");
        mgr.save_api_cache(&mut cache).unwrap();
        mgr.rebuild_index().unwrap();

        let mac = MacAddress::normalize("AA:BB:CC:DD:EE:01");
        let (label, item) = mgr.find_device_by_mac(&mac).unwrap();
        assert_eq!(label, "mist-lab");
        assert_eq!(item.serial, "S1");

        let missing = MacAddress::normalize("00:00:00:00:00:00");
        assert!(matches!(
            mgr.find_device_by_mac(&missing),
            Err(CoreError::DeviceNotFound { .. })
        ));
    }

    #[test]
    fn cached_labels_skips_sidecars() {
        let (_dir, mgr) = manager();
        let mut a = sample_cache("alpha");
        let mut b = sample_cache("beta");
        mgr.save_api_cache(&mut a).unwrap();
        mgr.save_api_cache(&mut b).unwrap();

        assert_eq!(mgr.cached_labels(), vec!["alpha", "beta"]);
    }
}

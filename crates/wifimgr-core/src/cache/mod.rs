// ── Per-API cache engine ──
//
// One persistent snapshot per configured API with integrity sidecars, a
// persisted cross-API index, and an in-memory aggregate accessor.

pub mod accessor;
pub mod document;
pub mod index;
pub mod integrity;
pub mod manager;
pub mod refresh;

pub use accessor::CacheAccessor;
pub use document::{ApiCache, CACHE_VERSION, CacheMetadata, SiteIndex};
pub use index::{CrossApiIndex, INDEX_VERSION, MacCollision};
pub use integrity::{IntegritySidecar, SIDECAR_VERSION, SidecarCheck};
pub use manager::{CacheManager, CacheState};
pub use refresh::{INDEX_ERROR_LABEL, RefreshOptions};

// ── Command implementations ──

pub mod apis;
pub mod cache_cmd;
pub mod claim;
pub mod devices;
pub mod expand;
pub mod push;
pub mod refresh;
pub mod sites;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use wifimgr_core::{CacheAccessor, CacheManager, ClientRegistry, SchemaTracker, TemplateStore};

/// Everything a command needs, wired up once in the composition root.
pub struct Context {
    pub manager: CacheManager,
    pub registry: Arc<ClientRegistry>,
    pub accessor: CacheAccessor,
    pub templates: TemplateStore,
    pub schema: Arc<SchemaTracker>,
    pub file_config: wifimgr_config::Config,
    pub cancel: CancellationToken,
}

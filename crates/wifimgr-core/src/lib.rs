// wifimgr-core: vendor-agnostic fleet model, cache engine, and
// business logic shared by the CLI.

pub mod adapters;
pub mod cache;
pub mod client;
pub mod decode;
pub mod error;
pub mod keypath;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod translate;

pub use error::CoreError;

// Re-export the most commonly used types at the crate root for ergonomics.
pub use cache::{ApiCache, CacheAccessor, CacheManager, CacheState, RefreshOptions};
pub use client::VendorClient;
pub use model::{ApiConfig, DeviceKind, InventoryItem, MacAddress, SiteInfo, Vendor};
pub use registry::ClientRegistry;
pub use resolver::Resolver;
pub use schema::SchemaTracker;
pub use template::TemplateStore;

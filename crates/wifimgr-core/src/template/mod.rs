// ── Template store and vendor-aware expansion ──

pub mod expand;
pub mod merge;
pub mod store;

pub use expand::{expand_device_config, expand_for_vendor, vendor_tag_from_label};
pub use merge::{deep_merge, merged};
pub use store::{TEMPLATE_FILE_VERSION, TemplateStore};

// ── Vendor adapters ──
//
// One adapter per supported vendor, each implementing the capability
// facets by calling its raw SDK client and converting wire JSON into
// canonical entities.

pub mod meraki;
pub mod mist;

pub use meraki::meraki_factory;
pub use mist::mist_factory;

// ── Site domain type ──

use serde::{Deserialize, Serialize};

use super::common::Provenance;

/// A site (Mist site / Meraki network) as seen in a per-API cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub notes: String,

    #[serde(skip)]
    pub provenance: Provenance,
}

// ── Vendor template and profile domain types ──
//
// Templates are vendor-side objects (distinct from the local template
// store in `crate::template`): RF templates, gateway templates, WLAN
// templates, and device profiles. The config blob stays opaque -- only
// identity is typed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::Provenance;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(skip)]
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(skip)]
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WlanTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(skip)]
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: String,
    pub name: String,
    /// Device type this profile applies to (vendor-specific string).
    #[serde(default)]
    pub profile_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(skip)]
    pub provenance: Provenance,
}

// ── Per-device configuration blobs ──
//
// The cache stores one vendor-shaped config map per configured device.
// These stay untyped at this layer; the translator parses AP maps into
// the typed `ApDeviceConfig` when callers need canonical form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::Provenance;
use super::mac::MacAddress;

macro_rules! device_config {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            pub mac: MacAddress,
            #[serde(default)]
            pub site_id: String,
            /// Vendor-shaped configuration map as fetched.
            #[serde(default)]
            pub config: Value,
            #[serde(skip)]
            pub provenance: Provenance,
        }
    };
}

device_config!(ApConfig, "Access-point configuration snapshot.");
device_config!(SwitchConfig, "Switch configuration snapshot.");
device_config!(GatewayConfig, "Gateway configuration snapshot.");

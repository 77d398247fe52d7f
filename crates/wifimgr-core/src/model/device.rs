// ── Configured-device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{DeviceKind, Provenance};
use super::mac::MacAddress;

/// The configured view of a device: inventory identity plus the
/// operational fields vendors report for assigned devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub mac: MacAddress,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    pub device_type: DeviceKind,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub firmware_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviceprofile_id: Option<String>,

    #[serde(skip)]
    pub provenance: Provenance,
}

/// Normalized operational status across vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Online,
    Offline,
    Alerting,
    Dormant,
    #[default]
    #[serde(other)]
    Unknown,
}

impl StatusKind {
    /// Map a raw vendor status string onto the normalized set.
    pub fn from_vendor(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "online" | "connected" | "up" => Self::Online,
            "offline" | "disconnected" | "down" => Self::Offline,
            "alerting" => Self::Alerting,
            "dormant" => Self::Dormant,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Alerting => "alerting",
            Self::Dormant => "dormant",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time device status from the bulk status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub mac: MacAddress,
    #[serde(default)]
    pub status: StatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lan_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,

    #[serde(skip)]
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalization() {
        assert_eq!(StatusKind::from_vendor("connected"), StatusKind::Online);
        assert_eq!(StatusKind::from_vendor("OFFLINE"), StatusKind::Offline);
        assert_eq!(StatusKind::from_vendor("dormant"), StatusKind::Dormant);
        assert_eq!(StatusKind::from_vendor("weird"), StatusKind::Unknown);
    }
}

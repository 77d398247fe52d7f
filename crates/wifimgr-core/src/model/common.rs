// ── Shared model primitives ──

use serde::{Deserialize, Serialize};

/// Supported management-cloud vendors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Vendor {
    Mist,
    Meraki,
    /// Present so freshly-deserialized entities have a placeholder
    /// before provenance stamping; never a valid configured vendor.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Vendor {
    /// Parse a lowercase vendor tag. Unrecognized tags map to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "mist" => Self::Mist,
            "meraki" => Self::Meraki,
            _ => Self::Unknown,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Mist => "mist",
            Self::Meraki => "meraki",
            Self::Unknown => "unknown",
        }
    }

    /// All vendors a deployment can configure.
    pub fn supported() -> &'static [Vendor] {
        &[Self::Mist, Self::Meraki]
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Canonical device category across vendors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Ap,
    Switch,
    Gateway,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [Self::Ap, Self::Switch, Self::Gateway];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ap => "ap",
            Self::Switch => "switch",
            Self::Gateway => "gateway",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ap" | "access_point" | "wireless" => Some(Self::Ap),
            "switch" => Some(Self::Switch),
            "gateway" | "appliance" | "gw" => Some(Self::Gateway),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a cached entity came from. Stamped during cache load and index
/// construction -- never serialized into the cache document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    /// The API label (e.g. `mist-prod`) of the owning cache.
    pub api: String,
    pub vendor: Vendor,
}

impl Provenance {
    pub fn new(api: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            api: api.into(),
            vendor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_tag_round_trip() {
        assert_eq!(Vendor::from_tag("mist"), Vendor::Mist);
        assert_eq!(Vendor::from_tag("MERAKI"), Vendor::Meraki);
        assert_eq!(Vendor::from_tag("aruba"), Vendor::Unknown);
        assert_eq!(Vendor::Mist.as_tag(), "mist");
    }

    #[test]
    fn device_kind_aliases() {
        assert_eq!(DeviceKind::parse("appliance"), Some(DeviceKind::Gateway));
        assert_eq!(DeviceKind::parse("wireless"), Some(DeviceKind::Ap));
        assert_eq!(DeviceKind::parse("AP"), Some(DeviceKind::Ap));
        assert_eq!(DeviceKind::parse("router"), None);
    }
}

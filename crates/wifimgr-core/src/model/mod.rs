// ── Canonical, vendor-agnostic domain model ──

pub mod ap_config;
pub mod api_config;
pub mod common;
pub mod device;
pub mod device_config;
pub mod inventory;
pub mod mac;
pub mod site;
pub mod template;
pub mod wlan;

pub use ap_config::{
    ApDeviceConfig, BandConfig, BleConfig, GeoPosition, IotConfig, IpConfig, LacpConfig,
    LedConfig, MeshConfig, PortConfig, RadioConfig, UplinkPortConfig,
};
pub use api_config::{ApiConfig, DEFAULT_CACHE_TTL_SECS};
pub use common::{DeviceKind, Provenance, Vendor};
pub use device::{DeviceInfo, DeviceStatus, StatusKind};
pub use device_config::{ApConfig, GatewayConfig, SwitchConfig};
pub use inventory::{InventoryItem, NetboxRef};
pub use mac::MacAddress;
pub use site::SiteInfo;
pub use template::{DeviceProfile, GatewayTemplate, RfTemplate, WlanTemplate};
pub use wlan::{Wlan, mask_psk};

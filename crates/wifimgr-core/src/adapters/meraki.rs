// ── Meraki adapter ──
//
// Implements the capability facets over the raw `MerakiClient`. The
// Dashboard has no org-level template objects and no device search, so
// those facets are absent; RF profiles surface through the profiles
// facet. Device configuration is strictly per device (one call per AP),
// which is why `bulk_capable` is false and the refresh engine treats
// config fetching as on-demand for this vendor.
//
// Meraki networks play the role of sites; the inventory id is the
// device serial.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use wifimgr_api::MerakiClient;
use wifimgr_api::transport::TransportConfig;

use crate::client::{
    ConfigsService, DevicesService, InventoryService, ProfilesService, SitesService,
    StatusesService, VendorClient, WlansService,
};
use crate::decode::FieldReader;
use crate::error::CoreError;
use crate::model::{
    ApiConfig, DeviceInfo, DeviceKind, DeviceProfile, DeviceStatus, InventoryItem, MacAddress,
    Provenance, SiteInfo, StatusKind, Vendor, Wlan, mask_psk,
};
use crate::registry::ClientFactory;
use crate::schema::SchemaTracker;

pub struct MerakiAdapter {
    label: String,
    client: MerakiClient,
    schema: Arc<SchemaTracker>,
}

/// Factory for the registry: builds a Meraki client from an `ApiConfig`.
/// Templates and search stay `None` -- the Dashboard has no equivalent.
pub fn meraki_factory(schema: Arc<SchemaTracker>) -> ClientFactory {
    Box::new(move |config: &ApiConfig| {
        let api_key = config.api_key().ok_or_else(|| CoreError::Config {
            message: format!("API '{}' has no api_key credential", config.label),
        })?;
        let client = MerakiClient::new(
            &config.base_url,
            &api_key,
            config.org_id(),
            config.rate_limit,
            config.results_limit,
            &TransportConfig::default(),
        )?;

        let adapter = Arc::new(MerakiAdapter {
            label: config.label.clone(),
            client,
            schema: Arc::clone(&schema),
        });

        Ok(VendorClient {
            label: config.label.clone(),
            vendor: Vendor::Meraki,
            org_id: config.org_id().to_owned(),
            sites: Some(adapter.clone()),
            inventory: Some(adapter.clone()),
            devices: Some(adapter.clone()),
            statuses: Some(adapter.clone()),
            templates: None,
            profiles: Some(adapter.clone()),
            configs: Some(adapter.clone()),
            wlans: Some(adapter),
            search: None,
        })
    })
}

fn kind_to_product_type(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Ap => "wireless",
        DeviceKind::Switch => "switch",
        DeviceKind::Gateway => "appliance",
    }
}

// ── Conversions ──────────────────────────────────────────────────────

fn site_from_network(value: &Value) -> Result<SiteInfo, CoreError> {
    let r = FieldReader::new(value, "meraki network");
    Ok(SiteInfo {
        id: r.require_str("id")?,
        name: r.require_str("name")?,
        timezone: r.str("timeZone"),
        address: String::new(),
        country_code: String::new(),
        latitude: 0.0,
        longitude: 0.0,
        device_count: 0,
        notes: r.str("notes"),
        provenance: Provenance::default(),
    })
}

fn inventory_from_value(value: &Value, kind: DeviceKind) -> Result<InventoryItem, CoreError> {
    let r = FieldReader::new(value, "meraki inventory device");
    let serial = r.require_str("serial")?;
    Ok(InventoryItem {
        // The serial is Meraki's device identity everywhere.
        id: serial.clone(),
        mac: r.mac(&["mac"]),
        serial,
        model: r.str("model"),
        name: r.str("name"),
        device_type: kind,
        site_id: r.str("networkId"),
        site_name: String::new(),
        claimed: r.opt_str("claimedAt").is_some(),
        netbox: None,
        provenance: Provenance::default(),
    })
}

fn status_from_availability(value: &Value) -> DeviceStatus {
    let r = FieldReader::new(value, "meraki availability");
    DeviceStatus {
        mac: r.mac(&["mac"]),
        status: StatusKind::from_vendor(&r.str("status")),
        last_seen: r
            .opt_str("lastReportedAt")
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)),
        lan_ip: r.opt_str("lanIp"),
        public_ip: r.opt_str("publicIp"),
        provenance: Provenance::default(),
    }
}

fn device_from_availability(value: &Value) -> Result<DeviceInfo, CoreError> {
    let r = FieldReader::new(value, "meraki availability");
    let network_id = r
        .object("network")
        .map(|n| FieldReader::new(n, "meraki availability.network").str("id"))
        .unwrap_or_default();
    Ok(DeviceInfo {
        id: r.str("serial"),
        mac: r.mac(&["mac"]),
        name: r.str("name"),
        model: r.str("model"),
        device_type: DeviceKind::parse(&r.str("productType")).unwrap_or(DeviceKind::Ap),
        site_id: network_id,
        site_name: String::new(),
        status: r.str("status"),
        ip: r.str("lanIp"),
        firmware_version: String::new(),
        deviceprofile_id: None,
        provenance: Provenance::default(),
    })
}

fn wlan_from_ssid(value: &Value, network_id: &str) -> Result<Wlan, CoreError> {
    let r = FieldReader::new(value, "meraki ssid");
    let number = r.u64("number");
    Ok(Wlan {
        // SSIDs are numbered slots, unique only per network.
        id: format!("{network_id}:{number}"),
        ssid: r.str("name"),
        org_id: String::new(),
        site_id: Some(network_id.to_owned()),
        enabled: r.bool("enabled"),
        hidden: !r.bool("visible"),
        band: r.opt_str("bandSelection"),
        vlan_id: r.opt_u16("defaultVlanId"),
        auth_type: r.str("authMode"),
        encryption: r.str("encryptionMode"),
        psk_masked: r.opt_str("psk").map(|psk| mask_psk(&psk)),
        radius_servers: value
            .get("radiusServers")
            .and_then(Value::as_array)
            .map(|servers| {
                servers
                    .iter()
                    .map(|s| FieldReader::new(s, "meraki ssid.radiusServers").str("host"))
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        vendor_config: None,
        provenance: Provenance::default(),
    })
}

// ── Facet implementations ────────────────────────────────────────────

#[async_trait]
impl SitesService for MerakiAdapter {
    async fn list_sites(&self, cancel: &CancellationToken) -> Result<Vec<SiteInfo>, CoreError> {
        let raw = self.client.list_networks(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Meraki, "network", value);
                site_from_network(value)
            })
            .collect()
    }
}

#[async_trait]
impl InventoryService for MerakiAdapter {
    async fn list_inventory(
        &self,
        cancel: &CancellationToken,
        kind: DeviceKind,
    ) -> Result<Vec<InventoryItem>, CoreError> {
        let raw = self
            .client
            .list_inventory(cancel, Some(kind_to_product_type(kind)))
            .await?;
        raw.iter()
            .map(|value| {
                self.schema
                    .record(Vendor::Meraki, &format!("inventory_{kind}"), value);
                inventory_from_value(value, kind)
            })
            .collect()
    }

    async fn claim(
        &self,
        cancel: &CancellationToken,
        serials: &[String],
    ) -> Result<(), CoreError> {
        self.client.claim_devices(cancel, serials).await?;
        Ok(())
    }

    async fn release(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        serial: &str,
    ) -> Result<(), CoreError> {
        self.client.remove_device(cancel, site_id, serial).await?;
        Ok(())
    }
}

#[async_trait]
impl DevicesService for MerakiAdapter {
    async fn list_devices(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceInfo>, CoreError> {
        let raw = self.client.list_device_availabilities(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Meraki, "device", value);
                device_from_availability(value)
            })
            .collect()
    }
}

#[async_trait]
impl StatusesService for MerakiAdapter {
    async fn list_statuses(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceStatus>, CoreError> {
        let raw = self.client.list_device_availabilities(cancel).await?;
        Ok(raw
            .iter()
            .map(|value| {
                self.schema.record(Vendor::Meraki, "device_status", value);
                status_from_availability(value)
            })
            .filter(|status| !status.mac.is_empty())
            .collect())
    }
}

#[async_trait]
impl ProfilesService for MerakiAdapter {
    /// RF profiles are network-scoped on the Dashboard; one walk over
    /// all networks yields the org-wide list.
    async fn list_device_profiles(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceProfile>, CoreError> {
        let networks = self.client.list_networks(cancel).await?;
        let mut profiles = Vec::new();

        for network in &networks {
            let network_id = FieldReader::new(network, "meraki network").require_str("id")?;
            let raw = self.client.list_rf_profiles(cancel, &network_id).await?;
            for value in &raw {
                self.schema.record(Vendor::Meraki, "rf_profile", value);
                let r = FieldReader::new(value, "meraki rf profile");
                profiles.push(DeviceProfile {
                    id: r.require_str("id")?,
                    name: r.str("name"),
                    profile_type: "rf".into(),
                    config: Some(value.clone()),
                    provenance: Provenance::default(),
                });
            }
        }
        Ok(profiles)
    }
}

#[async_trait]
impl ConfigsService for MerakiAdapter {
    fn bulk_capable(&self) -> bool {
        false
    }

    async fn fetch_site_configs(
        &self,
        _cancel: &CancellationToken,
        _site_id: &str,
        _kind: DeviceKind,
    ) -> Result<Vec<(MacAddress, Value)>, CoreError> {
        Err(CoreError::CapabilityNotSupported {
            vendor: Vendor::Meraki,
            label: self.label.clone(),
            capability: "bulk configs",
            supported_by: vec![Vendor::Mist],
        })
    }

    async fn fetch_device_config(
        &self,
        cancel: &CancellationToken,
        item: &InventoryItem,
    ) -> Result<Value, CoreError> {
        let value = self.client.get_radio_settings(cancel, &item.serial).await?;
        self.schema
            .record(Vendor::Meraki, &format!("config_{}", item.device_type), &value);
        Ok(value)
    }

    async fn push_device_config(
        &self,
        cancel: &CancellationToken,
        item: &InventoryItem,
        config: &Value,
    ) -> Result<(), CoreError> {
        self.client
            .update_radio_settings(cancel, &item.serial, config)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WlansService for MerakiAdapter {
    async fn list_wlans(&self, cancel: &CancellationToken) -> Result<Vec<Wlan>, CoreError> {
        let networks = self.client.list_networks(cancel).await?;
        let mut wlans = Vec::new();

        for network in &networks {
            let network_id = FieldReader::new(network, "meraki network").require_str("id")?;
            let raw = self.client.list_ssids(cancel, &network_id).await?;
            for value in &raw {
                self.schema.record(Vendor::Meraki, "ssid", value);
                // Unconfigured SSID slots come back named "Unconfigured
                // SSID N" and disabled; skip the pure placeholders.
                let reader = FieldReader::new(value, "meraki ssid");
                if !reader.bool("enabled") && reader.str("name").starts_with("Unconfigured SSID") {
                    continue;
                }
                wlans.push(wlan_from_ssid(value, &network_id)?);
            }
        }
        Ok(wlans)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn network_becomes_site() {
        let value = json!({ "id": "N_1", "name": "Corp", "timeZone": "UTC" });
        let site = site_from_network(&value).unwrap();
        assert_eq!(site.id, "N_1");
        assert_eq!(site.timezone, "UTC");
    }

    #[test]
    fn inventory_uses_serial_as_id() {
        let value = json!({
            "serial": "Q2XX-1",
            "mac": "aa:bb:cc:dd:ee:20",
            "model": "MR46",
            "networkId": "N_1",
            "claimedAt": "2024-03-01T00:00:00Z",
        });
        let item = inventory_from_value(&value, DeviceKind::Ap).unwrap();
        assert_eq!(item.id, "Q2XX-1");
        assert_eq!(item.mac.as_str(), "aabbccddee20");
        assert!(item.claimed);

        let unclaimed = json!({ "serial": "Q2XX-2", "mac": "aa:bb:cc:dd:ee:21" });
        assert!(!inventory_from_value(&unclaimed, DeviceKind::Ap).unwrap().claimed);
    }

    #[test]
    fn availability_parses_timestamps() {
        let value = json!({
            "mac": "aa:bb:cc:dd:ee:20",
            "status": "dormant",
            "lastReportedAt": "2024-03-01T12:00:00Z",
            "lanIp": "10.0.0.9",
        });
        let status = status_from_availability(&value);
        assert_eq!(status.status, StatusKind::Dormant);
        assert!(status.last_seen.is_some());
    }

    #[test]
    fn ssid_id_is_network_scoped() {
        let value = json!({
            "number": 2,
            "name": "corp",
            "enabled": true,
            "visible": true,
            "authMode": "psk",
            "psk": "hunter2!",
        });
        let wlan = wlan_from_ssid(&value, "N_1").unwrap();
        assert_eq!(wlan.id, "N_1:2");
        assert_eq!(wlan.psk_masked.as_deref(), Some("hu******"));
        assert!(!wlan.hidden);
    }
}

// ── Mist adapter ──
//
// Implements the capability facets over the raw `MistClient`. All nine
// facets are available -- Mist is the fullest surface of the two
// vendors. Conversion from wire JSON to canonical entities goes through
// `FieldReader` so type drift is warned about and recorded in the
// schema tracker, never silently defaulted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use wifimgr_api::MistClient;
use wifimgr_api::transport::TransportConfig;

use crate::client::{
    ConfigsService, DevicesService, InventoryService, ProfilesService, SearchService,
    SitesService, StatusesService, TemplatesService, VendorClient, WlansService,
};
use crate::decode::FieldReader;
use crate::error::CoreError;
use crate::model::{
    ApiConfig, DeviceInfo, DeviceKind, DeviceProfile, DeviceStatus, GatewayTemplate,
    InventoryItem, MacAddress, Provenance, RfTemplate, SiteInfo, StatusKind, Vendor, Wlan,
    WlanTemplate, mask_psk,
};
use crate::registry::ClientFactory;
use crate::schema::SchemaTracker;

pub struct MistAdapter {
    label: String,
    client: MistClient,
    schema: Arc<SchemaTracker>,
}

/// Factory for the registry: builds a full-facet Mist client from an
/// `ApiConfig`.
pub fn mist_factory(schema: Arc<SchemaTracker>) -> ClientFactory {
    Box::new(move |config: &ApiConfig| {
        let api_key = config.api_key().ok_or_else(|| CoreError::Config {
            message: format!("API '{}' has no api_key credential", config.label),
        })?;
        let client = MistClient::new(
            &config.base_url,
            &api_key,
            config.org_id(),
            config.rate_limit,
            config.results_limit,
            &TransportConfig::default(),
        )?;

        let adapter = Arc::new(MistAdapter {
            label: config.label.clone(),
            client,
            schema: Arc::clone(&schema),
        });

        Ok(VendorClient {
            label: config.label.clone(),
            vendor: Vendor::Mist,
            org_id: config.org_id().to_owned(),
            sites: Some(adapter.clone()),
            inventory: Some(adapter.clone()),
            devices: Some(adapter.clone()),
            statuses: Some(adapter.clone()),
            templates: Some(adapter.clone()),
            profiles: Some(adapter.clone()),
            configs: Some(adapter.clone()),
            wlans: Some(adapter.clone()),
            search: Some(adapter),
        })
    })
}

// ── Conversions ──────────────────────────────────────────────────────

fn site_from_value(value: &Value) -> Result<SiteInfo, CoreError> {
    let r = FieldReader::new(value, "mist site");
    let latlng = r
        .object("latlng")
        .map(|l| FieldReader::new(l, "mist site.latlng"));
    Ok(SiteInfo {
        id: r.require_str("id")?,
        name: r.require_str("name")?,
        timezone: r.str("timezone"),
        address: r.str("address"),
        country_code: r.str("country_code"),
        latitude: latlng.as_ref().map(|l| l.f64("lat")).unwrap_or_default(),
        longitude: latlng.as_ref().map(|l| l.f64("lng")).unwrap_or_default(),
        device_count: u32::try_from(r.u64("num_devices")).unwrap_or(u32::MAX),
        notes: r.str("notes"),
        provenance: Provenance::default(),
    })
}

fn inventory_from_value(value: &Value, kind: DeviceKind) -> Result<InventoryItem, CoreError> {
    let r = FieldReader::new(value, "mist inventory");
    Ok(InventoryItem {
        id: r.str("id"),
        mac: r.mac(&["mac"]),
        serial: r.str("serial"),
        model: r.str("model"),
        name: r.str("name"),
        device_type: kind,
        site_id: r.str("site_id"),
        site_name: String::new(),
        // Everything in org inventory has been claimed to the org.
        claimed: true,
        netbox: None,
        provenance: Provenance::default(),
    })
}

fn status_from_value(value: &Value) -> DeviceStatus {
    let r = FieldReader::new(value, "mist device stats");
    let last_seen = value
        .get("last_seen")
        .and_then(Value::as_f64)
        .and_then(|epoch| DateTime::<Utc>::from_timestamp(epoch as i64, 0));
    DeviceStatus {
        mac: r.mac(&["mac"]),
        status: StatusKind::from_vendor(&r.str("status")),
        last_seen,
        lan_ip: r.opt_str("ip"),
        public_ip: r.opt_str("ext_ip"),
        provenance: Provenance::default(),
    }
}

fn device_from_stats(value: &Value) -> Result<DeviceInfo, CoreError> {
    let r = FieldReader::new(value, "mist device stats");
    Ok(DeviceInfo {
        id: r.str("id"),
        mac: r.mac(&["mac"]),
        name: r.str("name"),
        model: r.str("model"),
        device_type: DeviceKind::parse(&r.str("type")).unwrap_or(DeviceKind::Ap),
        site_id: r.str("site_id"),
        site_name: String::new(),
        status: r.str("status"),
        ip: r.str("ip"),
        firmware_version: r.str("version"),
        deviceprofile_id: r.opt_str("deviceprofile_id"),
        provenance: Provenance::default(),
    })
}

fn wlan_from_value(value: &Value) -> Result<Wlan, CoreError> {
    let r = FieldReader::new(value, "mist wlan");
    let auth_reader = r
        .object("auth")
        .map(|a| FieldReader::new(a, "mist wlan.auth"));

    Ok(Wlan {
        id: r.require_str("id")?,
        ssid: r.str("ssid"),
        org_id: r.str("org_id"),
        site_id: r.opt_str("site_id"),
        enabled: r.bool("enabled"),
        hidden: r.bool("hide_ssid"),
        band: r.opt_str("band"),
        vlan_id: r.opt_u16("vlan_id"),
        auth_type: auth_reader.as_ref().map(|a| a.str("type")).unwrap_or_default(),
        encryption: auth_reader
            .as_ref()
            .map(|a| a.str("pairwise"))
            .unwrap_or_default(),
        psk_masked: auth_reader
            .as_ref()
            .and_then(|a| a.opt_str("psk"))
            .map(|psk| mask_psk(&psk)),
        radius_servers: value
            .get("auth_servers")
            .and_then(Value::as_array)
            .map(|servers| {
                servers
                    .iter()
                    .map(|s| FieldReader::new(s, "mist wlan.auth_servers").str("host"))
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        vendor_config: None,
        provenance: Provenance::default(),
    })
}

fn named_template<T>(
    value: &Value,
    context: &str,
    build: impl FnOnce(String, String, Option<Value>) -> T,
) -> Result<T, CoreError> {
    let r = FieldReader::new(value, context);
    Ok(build(
        r.require_str("id")?,
        r.str("name"),
        Some(value.clone()),
    ))
}

// ── Facet implementations ────────────────────────────────────────────

#[async_trait]
impl SitesService for MistAdapter {
    async fn list_sites(&self, cancel: &CancellationToken) -> Result<Vec<SiteInfo>, CoreError> {
        let raw = self.client.list_sites(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "site", value);
                site_from_value(value)
            })
            .collect()
    }
}

#[async_trait]
impl InventoryService for MistAdapter {
    async fn list_inventory(
        &self,
        cancel: &CancellationToken,
        kind: DeviceKind,
    ) -> Result<Vec<InventoryItem>, CoreError> {
        let raw = self.client.list_inventory(cancel, kind.as_str()).await?;
        raw.iter()
            .map(|value| {
                self.schema
                    .record(Vendor::Mist, &format!("inventory_{kind}"), value);
                inventory_from_value(value, kind)
            })
            .collect()
    }

    async fn claim(
        &self,
        _cancel: &CancellationToken,
        _serials: &[String],
    ) -> Result<(), CoreError> {
        Err(CoreError::CapabilityNotSupported {
            vendor: Vendor::Mist,
            label: self.label.clone(),
            capability: "claim",
            supported_by: vec![Vendor::Meraki],
        })
    }

    async fn release(
        &self,
        _cancel: &CancellationToken,
        _site_id: &str,
        _serial: &str,
    ) -> Result<(), CoreError> {
        Err(CoreError::CapabilityNotSupported {
            vendor: Vendor::Mist,
            label: self.label.clone(),
            capability: "release",
            supported_by: vec![Vendor::Meraki],
        })
    }
}

#[async_trait]
impl DevicesService for MistAdapter {
    async fn list_devices(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceInfo>, CoreError> {
        let raw = self.client.list_device_stats(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "device", value);
                device_from_stats(value)
            })
            .collect()
    }
}

#[async_trait]
impl StatusesService for MistAdapter {
    async fn list_statuses(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceStatus>, CoreError> {
        let raw = self.client.list_device_stats(cancel).await?;
        Ok(raw
            .iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "device_status", value);
                status_from_value(value)
            })
            .filter(|status| !status.mac.is_empty())
            .collect())
    }
}

#[async_trait]
impl TemplatesService for MistAdapter {
    async fn list_rf_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<RfTemplate>, CoreError> {
        let raw = self.client.list_rf_templates(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "rf_template", value);
                named_template(value, "mist rf template", |id, name, config| RfTemplate {
                    id,
                    name,
                    config,
                    provenance: Provenance::default(),
                })
            })
            .collect()
    }

    async fn list_gateway_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<GatewayTemplate>, CoreError> {
        let raw = self.client.list_gateway_templates(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "gateway_template", value);
                named_template(value, "mist gateway template", |id, name, config| {
                    GatewayTemplate {
                        id,
                        name,
                        config,
                        provenance: Provenance::default(),
                    }
                })
            })
            .collect()
    }

    async fn list_wlan_templates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<WlanTemplate>, CoreError> {
        let raw = self.client.list_wlan_templates(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "wlan_template", value);
                named_template(value, "mist wlan template", |id, name, config| WlanTemplate {
                    id,
                    name,
                    config,
                    provenance: Provenance::default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ProfilesService for MistAdapter {
    async fn list_device_profiles(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeviceProfile>, CoreError> {
        let raw = self.client.list_device_profiles(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "device_profile", value);
                let r = FieldReader::new(value, "mist device profile");
                Ok(DeviceProfile {
                    id: r.require_str("id")?,
                    name: r.str("name"),
                    profile_type: r.str("type"),
                    config: Some(value.clone()),
                    provenance: Provenance::default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ConfigsService for MistAdapter {
    fn bulk_capable(&self) -> bool {
        true
    }

    async fn fetch_site_configs(
        &self,
        cancel: &CancellationToken,
        site_id: &str,
        kind: DeviceKind,
    ) -> Result<Vec<(MacAddress, Value)>, CoreError> {
        let raw = self
            .client
            .list_site_devices(cancel, site_id, kind.as_str())
            .await?;
        Ok(raw
            .into_iter()
            .filter_map(|value| {
                self.schema
                    .record(Vendor::Mist, &format!("config_{kind}"), &value);
                let mac = FieldReader::new(&value, "mist site device").mac(&["mac"]);
                (!mac.is_empty()).then_some((mac, value))
            })
            .collect())
    }

    async fn fetch_device_config(
        &self,
        cancel: &CancellationToken,
        item: &InventoryItem,
    ) -> Result<Value, CoreError> {
        let value = self
            .client
            .get_device(cancel, &item.site_id, &item.id)
            .await?;
        self.schema
            .record(Vendor::Mist, &format!("config_{}", item.device_type), &value);
        Ok(value)
    }

    async fn push_device_config(
        &self,
        cancel: &CancellationToken,
        item: &InventoryItem,
        config: &Value,
    ) -> Result<(), CoreError> {
        self.client
            .update_device(cancel, &item.site_id, &item.id, config)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WlansService for MistAdapter {
    async fn list_wlans(&self, cancel: &CancellationToken) -> Result<Vec<Wlan>, CoreError> {
        let raw = self.client.list_wlans(cancel).await?;
        raw.iter()
            .map(|value| {
                self.schema.record(Vendor::Mist, "wlan", value);
                wlan_from_value(value)
            })
            .collect()
    }
}

#[async_trait]
impl SearchService for MistAdapter {
    async fn search_by_mac(
        &self,
        cancel: &CancellationToken,
        mac: &MacAddress,
    ) -> Result<Option<DeviceInfo>, CoreError> {
        let value = self.client.search_devices(cancel, mac.as_str()).await?;
        let Some(results) = value.get("results").and_then(Value::as_array) else {
            return Ok(None);
        };
        results
            .first()
            .map(|hit| {
                self.schema.record(Vendor::Mist, "device_search", hit);
                device_from_stats(hit)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn site_conversion_requires_identity() {
        let good = json!({
            "id": "s1", "name": "HQ", "timezone": "UTC",
            "latlng": { "lat": 52.5, "lng": 13.4 },
            "num_devices": 12,
        });
        let site = site_from_value(&good).unwrap();
        assert_eq!(site.id, "s1");
        assert!((site.latitude - 52.5).abs() < f64::EPSILON);
        assert_eq!(site.device_count, 12);

        let bad = json!({ "name": "HQ" });
        assert!(matches!(
            site_from_value(&bad),
            Err(CoreError::FieldMapping { .. })
        ));
    }

    #[test]
    fn status_conversion_normalizes() {
        let value = json!({
            "mac": "AA:BB:CC:DD:EE:FF",
            "status": "connected",
            "last_seen": 1_700_000_000.0,
            "ip": "10.0.0.5",
            "ext_ip": "203.0.113.9",
        });
        let status = status_from_value(&value);
        assert_eq!(status.mac.as_str(), "aabbccddeeff");
        assert_eq!(status.status, StatusKind::Online);
        assert!(status.last_seen.is_some());
        assert_eq!(status.public_ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn wlan_conversion_masks_psk() {
        let value = json!({
            "id": "w1",
            "ssid": "corp",
            "org_id": "o1",
            "enabled": true,
            "auth": { "type": "psk", "psk": "supersecret", "pairwise": "wpa2-ccmp" },
            "auth_servers": [{ "host": "10.1.1.1" }],
        });
        let wlan = wlan_from_value(&value).unwrap();
        assert_eq!(wlan.auth_type, "psk");
        assert_eq!(wlan.psk_masked.as_deref(), Some("su*********"));
        assert_eq!(wlan.radius_servers, vec!["10.1.1.1"]);
    }
}

// Netwatch - Connection Info Projector
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Builds [`ActiveConnectionInfo`] descriptions on demand.
//!
//! Nothing here touches the store; every call fans out fresh queries and
//! the result is thrown away once serialized.

use std::future::Future;

use tracing::{debug, warn};
use zbus::zvariant::OwnedObjectPath;

use crate::dbus::codec::is_object_path_valid;
use crate::models::device::{custom_device_type, DEVICE_MODEM};
use crate::models::{
    classify_security, ActiveConnectionInfo, ConnectionSettings, Ip4Info, Ip6Info, Result,
};

/// Device properties the projector reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDetails {
    /// Raw `NMDeviceType`.
    pub device_type: u32,
    pub interface: String,
    pub udi: String,
    pub hw_address: String,
    /// Already formatted, empty when unknown.
    pub speed: String,
    pub ip4_config: String,
    pub ip6_config: String,
}

/// Remote queries the projector needs.
pub trait InfoSource: Send + Sync {
    /// Settings of the profile backing an active connection.
    fn active_settings(
        &self,
        active: &OwnedObjectPath,
    ) -> impl Future<Output = Result<ConnectionSettings>> + Send;

    fn device(&self, device: &OwnedObjectPath) -> impl Future<Output = Result<DeviceDetails>> + Send;

    /// Mobile network generation for the modem behind `udi`.
    fn mobile_network_type(&self, udi: &str) -> impl Future<Output = Result<String>> + Send;

    fn ip4_info(&self, config: &str) -> impl Future<Output = Result<Ip4Info>> + Send;

    fn ip6_info(&self, config: &str) -> impl Future<Output = Result<Ip6Info>> + Send;

    fn primary_connection(&self) -> impl Future<Output = Result<OwnedObjectPath>> + Send;

    /// `(device, active connection)` for every device in the activated state.
    fn activated_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<(OwnedObjectPath, OwnedObjectPath)>>> + Send;

    /// `(active connection, devices)` for every active VPN connection.
    fn vpn_active_connections(
        &self,
    ) -> impl Future<Output = Result<Vec<(OwnedObjectPath, Vec<OwnedObjectPath>)>>> + Send;
}

/// Read-only projector over an [`InfoSource`].
pub struct InfoProjector<S> {
    source: S,
}

impl<S: InfoSource> InfoProjector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Describe one active connection as seen through `device`.
    ///
    /// Failing to resolve the profile or the device aborts the projection;
    /// other sub-resources degrade to empty values.
    pub async fn project(
        &self,
        active: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<ActiveConnectionInfo> {
        let settings = self.source.active_settings(active).await?;
        let dev = self.source.device(device).await?;

        let device_type = custom_device_type(dev.device_type);
        let mobile_network_type = if device_type == DEVICE_MODEM {
            self.source
                .mobile_network_type(&dev.udi)
                .await
                .unwrap_or_else(|e| {
                    debug!("No mobile network type for {}: {}", dev.udi, e);
                    String::new()
                })
        } else {
            String::new()
        };

        let ip4 = if is_object_path_valid(&dev.ip4_config) {
            self.source.ip4_info(&dev.ip4_config).await.unwrap_or_else(|e| {
                debug!("Failed to read {}: {}", dev.ip4_config, e);
                Ip4Info::default()
            })
        } else {
            Ip4Info::default()
        };

        let ip6 = if is_object_path_valid(&dev.ip6_config) {
            self.source.ip6_info(&dev.ip6_config).await.unwrap_or_else(|e| {
                debug!("Failed to read {}: {}", dev.ip6_config, e);
                Ip6Info::default()
            })
        } else {
            Ip6Info::default()
        };

        let is_primary_connection = match self.source.primary_connection().await {
            Ok(primary) => &primary == active,
            Err(e) => {
                debug!("Failed to read primary connection: {}", e);
                false
            }
        };

        Ok(ActiveConnectionInfo {
            is_primary_connection,
            connection_type: settings.custom_connection_type(),
            connection_name: settings.id(),
            mobile_network_type,
            security: classify_security(&settings),
            device_type: device_type.to_string(),
            device_interface: dev.interface,
            hw_address: dev.hw_address,
            speed: dev.speed,
            ip4,
            ip6,
        })
    }

    /// Describe every activated device's connection, then every VPN.
    ///
    /// A connection that cannot be projected is skipped.
    pub async fn list(&self) -> Vec<ActiveConnectionInfo> {
        let mut infos = Vec::new();

        match self.source.activated_devices().await {
            Ok(devices) => {
                for (device, active) in devices {
                    match self.project(&active, &device).await {
                        Ok(info) => infos.push(info),
                        Err(e) => debug!("Skipping {} on {}: {}", active, device, e),
                    }
                }
            }
            Err(e) => warn!("Failed to list devices: {}", e),
        }

        match self.source.vpn_active_connections().await {
            Ok(vpns) => {
                for (active, devices) in vpns {
                    let Some(device) = devices.first() else {
                        continue;
                    };
                    match self.project(&active, device).await {
                        Ok(info) => infos.push(info),
                        Err(e) => debug!("Skipping VPN {}: {}", active, e),
                    }
                }
            }
            Err(e) => warn!("Failed to list VPN connections: {}", e),
        }

        infos
    }

    /// [`list`](Self::list) encoded as JSON.
    pub async fn list_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.list().await)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbus::codec::{to_owned_value, PropertyMap};
    use crate::models::settings::{SETTING_CONNECTION, SETTING_WIRELESS_SECURITY};
    use crate::models::Error;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zbus::zvariant::Value;

    fn path(p: &str) -> OwnedObjectPath {
        OwnedObjectPath::try_from(p).unwrap()
    }

    fn section(pairs: Vec<(&str, Value<'static>)>) -> PropertyMap {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), to_owned_value(v).unwrap()))
            .collect()
    }

    fn wifi_settings(name: &str, key_mgmt: &str) -> ConnectionSettings {
        let mut sections = HashMap::new();
        sections.insert(
            SETTING_CONNECTION.to_string(),
            section(vec![
                ("id", Value::from(name.to_string())),
                ("type", Value::from("802-11-wireless")),
            ]),
        );
        sections.insert(
            SETTING_WIRELESS_SECURITY.to_string(),
            section(vec![("key-mgmt", Value::from(key_mgmt.to_string()))]),
        );
        ConnectionSettings::new(sections)
    }

    #[derive(Default)]
    struct FakeInfo {
        settings: HashMap<String, (&'static str, &'static str)>,
        devices: HashMap<String, DeviceDetails>,
        primary: String,
        activated: Vec<(String, String)>,
        vpns: Vec<(String, Vec<String>)>,
        ip4_queries: AtomicUsize,
        ip6_queries: AtomicUsize,
        modem_queries: AtomicUsize,
    }

    impl InfoSource for FakeInfo {
        async fn active_settings(&self, active: &OwnedObjectPath) -> Result<ConnectionSettings> {
            self.settings
                .get(active.as_str())
                .map(|(name, key_mgmt)| wifi_settings(name, key_mgmt))
                .ok_or_else(|| Error::NotFound(active.to_string()))
        }

        async fn device(&self, device: &OwnedObjectPath) -> Result<DeviceDetails> {
            self.devices
                .get(device.as_str())
                .cloned()
                .ok_or_else(|| Error::NotFound(device.to_string()))
        }

        async fn mobile_network_type(&self, _udi: &str) -> Result<String> {
            self.modem_queries.fetch_add(1, Ordering::SeqCst);
            Ok("4G".to_string())
        }

        async fn ip4_info(&self, _config: &str) -> Result<Ip4Info> {
            self.ip4_queries.fetch_add(1, Ordering::SeqCst);
            Ok(Ip4Info {
                address: "192.168.1.20".into(),
                mask: "255.255.255.0".into(),
                gateways: vec!["192.168.1.1".into()],
                dnses: vec!["192.168.1.1".into()],
            })
        }

        async fn ip6_info(&self, _config: &str) -> Result<Ip6Info> {
            self.ip6_queries.fetch_add(1, Ordering::SeqCst);
            Err(Error::Dbus("object vanished".into()))
        }

        async fn primary_connection(&self) -> Result<OwnedObjectPath> {
            Ok(path(&self.primary))
        }

        async fn activated_devices(&self) -> Result<Vec<(OwnedObjectPath, OwnedObjectPath)>> {
            Ok(self
                .activated
                .iter()
                .map(|(d, a)| (path(d), path(a)))
                .collect())
        }

        async fn vpn_active_connections(
            &self,
        ) -> Result<Vec<(OwnedObjectPath, Vec<OwnedObjectPath>)>> {
            Ok(self
                .vpns
                .iter()
                .map(|(a, devs)| (path(a), devs.iter().map(|d| path(d)).collect()))
                .collect())
        }
    }

    fn wifi_device(ip4: &str, ip6: &str) -> DeviceDetails {
        DeviceDetails {
            device_type: 2,
            interface: "wlp2s0".into(),
            udi: "/sys/devices/wlp2s0".into(),
            hw_address: "AA:BB:CC:DD:EE:FF".into(),
            speed: "866 Mb/s".into(),
            ip4_config: ip4.into(),
            ip6_config: ip6.into(),
        }
    }

    #[tokio::test]
    async fn test_project_wireless_connection() {
        let mut fake = FakeInfo::default();
        fake.settings.insert("/ac/1".into(), ("Home", "wpa-psk"));
        fake.devices
            .insert("/dev/1".into(), wifi_device("/ip4/1", "/ip6/1"));
        fake.primary = "/ac/1".into();
        let projector = InfoProjector::new(fake);

        let info = projector.project(&path("/ac/1"), &path("/dev/1")).await.unwrap();
        assert!(info.is_primary_connection);
        assert_eq!(info.connection_name, "Home");
        assert_eq!(info.connection_type, "wireless");
        assert_eq!(info.security, "WPA/WPA2 Personal");
        assert_eq!(info.device_type, "wireless");
        assert_eq!(info.device_interface, "wlp2s0");
        assert_eq!(info.mobile_network_type, "");
        assert_eq!(info.ip4.address, "192.168.1.20");
        // failing IPv6 lookup degrades to empty
        assert_eq!(info.ip6, Ip6Info::default());
        assert_eq!(projector.source().modem_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_ip_config_is_not_queried() {
        let mut fake = FakeInfo::default();
        fake.settings.insert("/ac/1".into(), ("Home", "none"));
        fake.devices.insert("/dev/1".into(), wifi_device("/", ""));
        fake.primary = "/".into();
        let projector = InfoProjector::new(fake);

        let info = projector.project(&path("/ac/1"), &path("/dev/1")).await.unwrap();
        assert_eq!(info.ip4, Ip4Info::default());
        assert_eq!(info.ip6, Ip6Info::default());
        assert!(!info.is_primary_connection);
        assert_eq!(projector.source().ip4_queries.load(Ordering::SeqCst), 0);
        assert_eq!(projector.source().ip6_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_modem_resolves_mobile_network() {
        let mut fake = FakeInfo::default();
        fake.settings.insert("/ac/2".into(), ("Carrier", "none"));
        let mut modem = wifi_device("/", "/");
        modem.device_type = 8;
        fake.devices.insert("/dev/2".into(), modem);
        fake.primary = "/".into();
        let projector = InfoProjector::new(fake);

        let info = projector.project(&path("/ac/2"), &path("/dev/2")).await.unwrap();
        assert_eq!(info.device_type, "modem");
        assert_eq!(info.mobile_network_type, "4G");
    }

    #[tokio::test]
    async fn test_missing_device_aborts_projection() {
        let mut fake = FakeInfo::default();
        fake.settings.insert("/ac/1".into(), ("Home", "none"));
        let projector = InfoProjector::new(fake);

        assert!(projector.project(&path("/ac/1"), &path("/dev/404")).await.is_err());
    }

    #[tokio::test]
    async fn test_list_skips_failures_and_includes_vpn() {
        let mut fake = FakeInfo::default();
        fake.settings.insert("/ac/1".into(), ("Home", "wpa-psk"));
        fake.settings.insert("/ac/vpn".into(), ("Tunnel", "none"));
        fake.devices.insert("/dev/1".into(), wifi_device("/", "/"));
        fake.activated = vec![
            ("/dev/1".into(), "/ac/1".into()),
            ("/dev/2".into(), "/ac/missing".into()),
        ];
        fake.vpns = vec![
            ("/ac/vpn".into(), vec!["/dev/1".into()]),
            ("/ac/vpn_nodev".into(), vec![]),
        ];
        fake.primary = "/ac/1".into();
        let projector = InfoProjector::new(fake);

        let infos = projector.list().await;
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].connection_name, "Home");
        assert_eq!(infos[1].connection_name, "Tunnel");
        assert!(!infos[1].is_primary_connection);

        let json: serde_json::Value =
            serde_json::from_str(&projector.list_json().await.unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["Security"], "WPA/WPA2 Personal");
    }
}

// Netwatch - NetworkManager Client
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Async NetworkManager client used by the store and the projector.
//!
//! Each call builds a proxy for exactly one remote object, reads what it
//! needs and drops the proxy before returning.

use std::net::Ipv6Addr;

use tracing::{debug, error};
use zbus::zvariant::OwnedObjectPath;
use zbus::Connection;

use super::codec::{PropertyMap, PropertyMapExt};
use super::proxies::{
    Ip4ConfigProxy, Ip6ConfigProxy, ModemProxy, NetworkManagerProxy, NmActiveConnectionProxy,
    NmDeviceProxy, NmSettingsConnectionProxy, NmSettingsProxy, WiredDeviceProxy,
    WirelessDeviceProxy,
};
use crate::models::device::{format_speed, is_wired_type, is_wireless_type, mobile_network_type};
use crate::models::info::prefix_to_netmask;
use crate::models::{
    ActiveConnectionProps, ConnectionSettings, DeviceState, Error, Ip4Info, Ip6Info, Result,
};
use crate::projector::{DeviceDetails, InfoSource};
use crate::store::ActiveConnectionSource;

/// NetworkManager D-Bus service name.
pub const NM_SERVICE: &str = "org.freedesktop.NetworkManager";

/// Client for the NetworkManager (and ModemManager) system services.
#[derive(Clone)]
pub struct NmClient {
    connection: Connection,
}

impl NmClient {
    /// Wrap an existing system bus connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Connect to the system bus.
    pub async fn system() -> Result<Self> {
        match Connection::system().await {
            Ok(conn) => {
                debug!("Connected to system D-Bus");
                Ok(Self::new(conn))
            }
            Err(e) => {
                error!("Failed to connect to system D-Bus: {}", e);
                Err(Error::DbusConnectionFailed(e.to_string()))
            }
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn manager(&self) -> Result<NetworkManagerProxy<'_>> {
        Ok(NetworkManagerProxy::new(&self.connection).await?)
    }

    async fn active(&self, path: &OwnedObjectPath) -> Result<NmActiveConnectionProxy<'_>> {
        Ok(NmActiveConnectionProxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await?)
    }

    async fn nm_device(&self, path: &OwnedObjectPath) -> Result<NmDeviceProxy<'_>> {
        Ok(NmDeviceProxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await?)
    }

    /// Settings of the profile at `path`.
    pub async fn settings(&self, path: &OwnedObjectPath) -> Result<ConnectionSettings> {
        let proxy = NmSettingsConnectionProxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await?;
        let sections = proxy
            .get_settings()
            .await
            .map_err(|e| Error::NetworkManagerDbus(e.to_string()))?;
        Ok(ConnectionSettings::new(sections))
    }

    /// Link speed of a device, formatted; empty when not applicable.
    async fn device_speed(&self, path: &OwnedObjectPath, device_type: u32) -> String {
        let mbps = if is_wired_type(device_type) {
            match WiredDeviceProxy::builder(&self.connection).path(path.clone()) {
                Ok(builder) => match builder.build().await {
                    Ok(proxy) => proxy.speed().await.unwrap_or(0),
                    Err(_) => 0,
                },
                Err(_) => 0,
            }
        } else if is_wireless_type(device_type) {
            match WirelessDeviceProxy::builder(&self.connection).path(path.clone()) {
                Ok(builder) => match builder.build().await {
                    Ok(proxy) => proxy.bitrate().await.unwrap_or(0) / 1000,
                    Err(_) => 0,
                },
                Err(_) => 0,
            }
        } else {
            0
        };
        format_speed(mbps)
    }
}

/// First `address`/`prefix` pair of an `AddressData` list.
fn first_address(data: &[PropertyMap]) -> Option<(String, u32)> {
    let entry = data.first()?;
    Some((entry.get_string("address")?, entry.get_u32("prefix").unwrap_or(0)))
}

fn gateway_list(gateway: String) -> Vec<String> {
    if gateway.is_empty() {
        Vec::new()
    } else {
        vec![gateway]
    }
}

fn ipv6_from_bytes(bytes: &[u8]) -> Option<String> {
    let octets: [u8; 16] = bytes.try_into().ok()?;
    Some(Ipv6Addr::from(octets).to_string())
}

impl ActiveConnectionSource for NmClient {
    async fn active_connection_paths(&self) -> Result<Vec<OwnedObjectPath>> {
        let nm = self.manager().await?;
        nm.active_connections()
            .await
            .map_err(|e| Error::NetworkManagerDbus(e.to_string()))
    }

    async fn active_connection(&self, path: &OwnedObjectPath) -> Result<ActiveConnectionProps> {
        let proxy = self.active(path).await?;
        Ok(ActiveConnectionProps {
            state: proxy.state().await?,
            devices: proxy.devices().await?,
            uuid: proxy.uuid().await?,
            vpn: proxy.vpn().await?,
        })
    }

    async fn connection_id(&self, uuid: &str) -> Result<String> {
        let settings = NmSettingsProxy::new(&self.connection).await?;
        let path = settings
            .get_connection_by_uuid(uuid)
            .await
            .map_err(|e| Error::NotFound(format!("{}: {}", uuid, e)))?;
        Ok(self.settings(&path).await?.id())
    }
}

impl InfoSource for NmClient {
    async fn active_settings(&self, active: &OwnedObjectPath) -> Result<ConnectionSettings> {
        let profile = self.active(active).await?.settings_connection().await?;
        self.settings(&profile).await
    }

    async fn device(&self, device: &OwnedObjectPath) -> Result<DeviceDetails> {
        let proxy = self.nm_device(device).await?;
        let device_type = proxy.device_type().await?;
        let interface = proxy.interface().await?;
        let udi = proxy.udi().await?;
        let hw_address = proxy.hw_address().await.unwrap_or_default();
        let ip4_config = proxy.ip4_config().await?.to_string();
        let ip6_config = proxy.ip6_config().await?.to_string();
        drop(proxy);

        Ok(DeviceDetails {
            device_type,
            interface,
            udi,
            hw_address,
            speed: self.device_speed(device, device_type).await,
            ip4_config,
            ip6_config,
        })
    }

    async fn mobile_network_type(&self, udi: &str) -> Result<String> {
        let modem = ModemProxy::builder(&self.connection)
            .path(udi.to_string())?
            .build()
            .await?;
        let access = modem.access_technologies().await?;
        Ok(mobile_network_type(access).to_string())
    }

    async fn ip4_info(&self, config: &str) -> Result<Ip4Info> {
        let proxy = Ip4ConfigProxy::builder(&self.connection)
            .path(config.to_string())?
            .build()
            .await?;

        let mut info = Ip4Info::default();
        if let Some((address, prefix)) = first_address(&proxy.address_data().await?) {
            info.address = address;
            info.mask = prefix_to_netmask(prefix);
        }
        info.gateways = gateway_list(proxy.gateway().await.unwrap_or_default());
        info.dnses = proxy
            .nameserver_data()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| entry.get_string("address"))
            .collect();
        Ok(info)
    }

    async fn ip6_info(&self, config: &str) -> Result<Ip6Info> {
        let proxy = Ip6ConfigProxy::builder(&self.connection)
            .path(config.to_string())?
            .build()
            .await?;

        let mut info = Ip6Info::default();
        if let Some((address, prefix)) = first_address(&proxy.address_data().await?) {
            info.address = address;
            info.prefix = prefix.to_string();
        }
        info.gateways = gateway_list(proxy.gateway().await.unwrap_or_default());
        info.dnses = proxy
            .nameservers()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|bytes| ipv6_from_bytes(bytes))
            .collect();
        Ok(info)
    }

    async fn primary_connection(&self) -> Result<OwnedObjectPath> {
        Ok(self.manager().await?.primary_connection().await?)
    }

    async fn activated_devices(&self) -> Result<Vec<(OwnedObjectPath, OwnedObjectPath)>> {
        let devices = self
            .manager()
            .await?
            .get_devices()
            .await
            .map_err(|e| Error::NetworkManagerDbus(e.to_string()))?;

        let mut activated = Vec::new();
        for device in devices {
            let proxy = match self.nm_device(&device).await {
                Ok(proxy) => proxy,
                Err(e) => {
                    debug!("Skipping device {}: {}", device, e);
                    continue;
                }
            };
            let state = proxy.state().await.map(DeviceState::from);
            if !matches!(state, Ok(DeviceState::Activated)) {
                continue;
            }
            if let Ok(active) = proxy.active_connection().await {
                activated.push((device, active));
            }
        }
        Ok(activated)
    }

    async fn vpn_active_connections(&self) -> Result<Vec<(OwnedObjectPath, Vec<OwnedObjectPath>)>> {
        let mut vpns = Vec::new();
        for path in self.active_connection_paths().await? {
            let proxy = match self.active(&path).await {
                Ok(proxy) => proxy,
                Err(_) => continue,
            };
            if !proxy.vpn().await.unwrap_or(false) {
                continue;
            }
            let devices = proxy.devices().await.unwrap_or_default();
            vpns.push((path, devices));
        }
        Ok(vpns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv6_from_bytes() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0x20;
        bytes[1] = 0x01;
        bytes[2] = 0x0d;
        bytes[3] = 0xb8;
        bytes[15] = 1;
        assert_eq!(ipv6_from_bytes(&bytes).as_deref(), Some("2001:db8::1"));
        assert_eq!(ipv6_from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_gateway_list() {
        assert!(gateway_list(String::new()).is_empty());
        assert_eq!(gateway_list("10.0.0.1".into()), vec!["10.0.0.1".to_string()]);
    }
}

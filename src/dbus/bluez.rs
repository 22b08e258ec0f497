// Netwatch - BlueZ Client
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Stateless command/query layer over BlueZ adapters and devices.
//!
//! Every method opens one proxy, makes one call and drops the proxy. Getters
//! return the zero value when the call fails; commands and setters log the
//! failure and hand it back so callers may ignore it.

use tracing::{debug, error};
use zbus::fdo::ObjectManagerProxy;
use zbus::zvariant::OwnedObjectPath;
use zbus::Connection;

use super::proxies::{Adapter1Proxy, Device1Proxy};
use crate::models::{Error, Result};

/// BlueZ D-Bus service name.
pub const BLUEZ_SERVICE: &str = "org.bluez";
/// Adapter interface name.
pub const BLUEZ_ADAPTER_IFACE: &str = "org.bluez.Adapter1";

/// Client for the BlueZ system service.
#[derive(Clone)]
pub struct BluezClient {
    connection: Connection,
}

fn bluez_error(context: &str, path: &OwnedObjectPath, err: zbus::Error) -> Error {
    error!("BlueZ {} on {} failed: {}", context, path, err);
    Error::Bluez(format!("{} on {}: {}", context, path, err))
}

impl BluezClient {
    /// Wrap an existing system bus connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn adapter(&self, path: &OwnedObjectPath) -> Result<Adapter1Proxy<'_>> {
        Adapter1Proxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await
            .map_err(|e| bluez_error("adapter proxy", path, e))
    }

    async fn device(&self, path: &OwnedObjectPath) -> Result<Device1Proxy<'_>> {
        Device1Proxy::builder(&self.connection)
            .path(path.clone())?
            .build()
            .await
            .map_err(|e| bluez_error("device proxy", path, e))
    }

    // ========================================================================
    // Adapters
    // ========================================================================

    /// Paths of every object implementing the adapter interface.
    pub async fn adapters(&self) -> Vec<OwnedObjectPath> {
        let manager = match ObjectManagerProxy::builder(&self.connection)
            .destination(BLUEZ_SERVICE)
            .and_then(|b| b.path("/"))
        {
            Ok(builder) => match builder.build().await {
                Ok(manager) => manager,
                Err(e) => {
                    error!("Failed to create BlueZ object manager: {}", e);
                    return Vec::new();
                }
            },
            Err(e) => {
                error!("Failed to create BlueZ object manager: {}", e);
                return Vec::new();
            }
        };

        let objects = match manager.get_managed_objects().await {
            Ok(objects) => objects,
            Err(e) => {
                error!("Failed to list BlueZ objects: {}", e);
                return Vec::new();
            }
        };

        let mut adapters: Vec<OwnedObjectPath> = objects
            .into_iter()
            .filter(|(_, interfaces)| {
                interfaces
                    .keys()
                    .any(|name| name.as_str() == BLUEZ_ADAPTER_IFACE)
            })
            .map(|(path, _)| path)
            .collect();
        adapters.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        adapters
    }

    pub async fn start_discovery(&self, adapter: &OwnedObjectPath) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .start_discovery()
            .await
            .map_err(|e| bluez_error("StartDiscovery", adapter, e))
    }

    pub async fn stop_discovery(&self, adapter: &OwnedObjectPath) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .stop_discovery()
            .await
            .map_err(|e| bluez_error("StopDiscovery", adapter, e))
    }

    pub async fn adapter_address(&self, adapter: &OwnedObjectPath) -> String {
        match self.adapter(adapter).await {
            Ok(proxy) => proxy.address().await.unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    pub async fn adapter_alias(&self, adapter: &OwnedObjectPath) -> String {
        match self.adapter(adapter).await {
            Ok(proxy) => proxy.alias().await.unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    pub async fn set_adapter_alias(&self, adapter: &OwnedObjectPath, alias: &str) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .set_alias(alias)
            .await
            .map_err(|e| bluez_error("set Alias", adapter, e))
    }

    pub async fn adapter_discoverable(&self, adapter: &OwnedObjectPath) -> bool {
        match self.adapter(adapter).await {
            Ok(proxy) => proxy.discoverable().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn set_adapter_discoverable(
        &self,
        adapter: &OwnedObjectPath,
        discoverable: bool,
    ) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .set_discoverable(discoverable)
            .await
            .map_err(|e| bluez_error("set Discoverable", adapter, e))
    }

    pub async fn adapter_discovering(&self, adapter: &OwnedObjectPath) -> bool {
        match self.adapter(adapter).await {
            Ok(proxy) => proxy.discovering().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn adapter_discoverable_timeout(&self, adapter: &OwnedObjectPath) -> u32 {
        match self.adapter(adapter).await {
            Ok(proxy) => proxy.discoverable_timeout().await.unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub async fn set_adapter_discoverable_timeout(
        &self,
        adapter: &OwnedObjectPath,
        timeout: u32,
    ) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .set_discoverable_timeout(timeout)
            .await
            .map_err(|e| bluez_error("set DiscoverableTimeout", adapter, e))
    }

    pub async fn adapter_powered(&self, adapter: &OwnedObjectPath) -> bool {
        match self.adapter(adapter).await {
            Ok(proxy) => proxy.powered().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn set_adapter_powered(&self, adapter: &OwnedObjectPath, powered: bool) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .set_powered(powered)
            .await
            .map_err(|e| bluez_error("set Powered", adapter, e))
    }

    /// Remove `device` from `adapter`.
    pub async fn remove_device(
        &self,
        adapter: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<()> {
        let proxy = self.adapter(adapter).await?;
        proxy
            .remove_device(device)
            .await
            .map_err(|e| bluez_error("RemoveDevice", device, e))
    }

    // ========================================================================
    // Devices
    // ========================================================================

    pub async fn pair_device(&self, device: &OwnedObjectPath) -> Result<()> {
        let proxy = self.device(device).await?;
        debug!("Pairing {}", device);
        proxy.pair().await.map_err(|e| bluez_error("Pair", device, e))
    }

    pub async fn connect_device(&self, device: &OwnedObjectPath) -> Result<()> {
        let proxy = self.device(device).await?;
        debug!("Connecting {}", device);
        proxy
            .connect()
            .await
            .map_err(|e| bluez_error("Connect", device, e))
    }

    pub async fn disconnect_device(&self, device: &OwnedObjectPath) -> Result<()> {
        let proxy = self.device(device).await?;
        proxy
            .disconnect()
            .await
            .map_err(|e| bluez_error("Disconnect", device, e))
    }

    pub async fn set_device_alias(&self, device: &OwnedObjectPath, alias: &str) -> Result<()> {
        let proxy = self.device(device).await?;
        proxy
            .set_alias(alias)
            .await
            .map_err(|e| bluez_error("set Alias", device, e))
    }

    pub async fn set_device_trusted(&self, device: &OwnedObjectPath, trusted: bool) -> Result<()> {
        let proxy = self.device(device).await?;
        proxy
            .set_trusted(trusted)
            .await
            .map_err(|e| bluez_error("set Trusted", device, e))
    }

    pub async fn device_trusted(&self, device: &OwnedObjectPath) -> bool {
        match self.device(device).await {
            Ok(proxy) => proxy.trusted().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn device_paired(&self, device: &OwnedObjectPath) -> bool {
        match self.device(device).await {
            Ok(proxy) => proxy.paired().await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

// Netwatch - Active Connection Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Active connection records and the NetworkManager state enums that drive
//! their lifecycle.

use serde::{Deserialize, Serialize};
use zbus::zvariant::OwnedObjectPath;

/// Activation state of an active connection (`NMActiveConnectionState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "u32", into = "u32")]
pub enum ActiveConnectionState {
    #[default]
    Unknown,
    Activating,
    Activated,
    Deactivating,
    Deactivated,
}

impl ActiveConnectionState {
    /// Whether the connection is on its way out (or already gone).
    pub fn is_deactivating(&self) -> bool {
        matches!(self, Self::Deactivating | Self::Deactivated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Deactivating => "deactivating",
            Self::Deactivated => "deactivated",
        }
    }
}

impl From<u32> for ActiveConnectionState {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Activating,
            2 => Self::Activated,
            3 => Self::Deactivating,
            4 => Self::Deactivated,
            _ => Self::Unknown,
        }
    }
}

impl From<ActiveConnectionState> for u32 {
    fn from(state: ActiveConnectionState) -> Self {
        match state {
            ActiveConnectionState::Unknown => 0,
            ActiveConnectionState::Activating => 1,
            ActiveConnectionState::Activated => 2,
            ActiveConnectionState::Deactivating => 3,
            ActiveConnectionState::Deactivated => 4,
        }
    }
}

/// VPN-specific connection state (`NMVpnConnectionState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VpnConnectionState {
    #[default]
    Unknown,
    Prepare,
    NeedAuth,
    Connect,
    IpConfigGet,
    Activated,
    Failed,
    Disconnected,
}

impl VpnConnectionState {
    /// Any state from preparation up to and including fully activated.
    pub fn is_activating(&self) -> bool {
        matches!(
            self,
            Self::Prepare | Self::NeedAuth | Self::Connect | Self::IpConfigGet | Self::Activated
        )
    }

    pub fn is_activated(&self) -> bool {
        matches!(self, Self::Activated)
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl From<u32> for VpnConnectionState {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Prepare,
            2 => Self::NeedAuth,
            3 => Self::Connect,
            4 => Self::IpConfigGet,
            5 => Self::Activated,
            6 => Self::Failed,
            7 => Self::Disconnected,
            _ => Self::Unknown,
        }
    }
}

/// Device state (`NMDeviceState`). Only the values the projector cares
/// about are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Activated,
    Other(u32),
}

impl From<u32> for DeviceState {
    fn from(value: u32) -> Self {
        match value {
            100 => Self::Activated,
            other => Self::Other(other),
        }
    }
}

/// One currently-active connection as tracked by the store.
///
/// Serialized with the field names published on the `ActiveConnections`
/// property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActiveConnection {
    /// Object path of the active connection; the store key.
    pub path: OwnedObjectPath,
    /// Devices carrying this connection.
    pub devices: Vec<OwnedObjectPath>,
    /// Profile name, resolved from `uuid`.
    pub id: String,
    /// Profile UUID.
    pub uuid: String,
    pub state: ActiveConnectionState,
    pub vpn: bool,
}

impl ActiveConnection {
    /// An empty record for `path`, used when the full query fails.
    pub fn new(path: OwnedObjectPath) -> Self {
        Self {
            path,
            devices: Vec::new(),
            id: String::new(),
            uuid: String::new(),
            state: ActiveConnectionState::Unknown,
            vpn: false,
        }
    }
}

/// Properties of an active connection as returned by a full query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveConnectionProps {
    pub state: u32,
    pub devices: Vec<OwnedObjectPath>,
    pub uuid: String,
    pub vpn: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip_values() {
        for raw in 0..=4u32 {
            let state = ActiveConnectionState::from(raw);
            assert_eq!(u32::from(state), raw);
        }
        assert_eq!(ActiveConnectionState::from(42), ActiveConnectionState::Unknown);
    }

    #[test]
    fn test_deactivating_class() {
        assert!(ActiveConnectionState::Deactivating.is_deactivating());
        assert!(ActiveConnectionState::Deactivated.is_deactivating());
        assert!(!ActiveConnectionState::Activating.is_deactivating());
        assert!(!ActiveConnectionState::Activated.is_deactivating());
        assert!(!ActiveConnectionState::Unknown.is_deactivating());
    }

    #[test]
    fn test_vpn_classes() {
        assert!(VpnConnectionState::from(1).is_activating());
        assert!(VpnConnectionState::from(5).is_activating());
        assert!(VpnConnectionState::from(5).is_activated());
        assert!(!VpnConnectionState::from(6).is_activating());
        assert!(VpnConnectionState::from(6).is_failed());
        assert!(VpnConnectionState::from(7).is_disconnected());
        assert!(!VpnConnectionState::from(0).is_activating());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut conn = ActiveConnection::new(OwnedObjectPath::try_from("/ac/1").unwrap());
        conn.state = ActiveConnectionState::Activated;
        conn.vpn = true;
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["Path"], "/ac/1");
        assert_eq!(json["State"], 2);
        assert_eq!(json["Vpn"], true);
        assert!(json["Devices"].as_array().unwrap().is_empty());
    }
}

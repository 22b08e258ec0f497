// Netwatch - Active Connection Info
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Read-only, per-query description of an active connection.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// IPv4 configuration of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ip4Info {
    pub address: String,
    pub mask: String,
    pub gateways: Vec<String>,
    pub dnses: Vec<String>,
}

/// IPv6 configuration of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ip6Info {
    pub address: String,
    pub prefix: String,
    pub gateways: Vec<String>,
    pub dnses: Vec<String>,
}

/// Rich description of one active connection, built fresh per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActiveConnectionInfo {
    pub is_primary_connection: bool,
    pub connection_type: String,
    pub connection_name: String,
    pub mobile_network_type: String,
    pub security: String,
    pub device_type: String,
    pub device_interface: String,
    pub hw_address: String,
    pub speed: String,
    pub ip4: Ip4Info,
    pub ip6: Ip6Info,
}

/// Convert an IPv4 prefix length into a dotted netmask.
pub fn prefix_to_netmask(prefix: u32) -> String {
    let bits = match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - p),
    };
    Ipv4Addr::from(bits).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_to_netmask() {
        assert_eq!(prefix_to_netmask(0), "0.0.0.0");
        assert_eq!(prefix_to_netmask(8), "255.0.0.0");
        assert_eq!(prefix_to_netmask(24), "255.255.255.0");
        assert_eq!(prefix_to_netmask(22), "255.255.252.0");
        assert_eq!(prefix_to_netmask(32), "255.255.255.255");
    }

    #[test]
    fn test_info_field_names() {
        let info = ActiveConnectionInfo {
            is_primary_connection: true,
            hw_address: "AA:BB:CC:DD:EE:FF".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["IsPrimaryConnection"], true);
        assert_eq!(json["HwAddress"], "AA:BB:CC:DD:EE:FF");
        assert!(json["Ip4"]["Gateways"].as_array().unwrap().is_empty());
        assert_eq!(json["Ip6"]["Prefix"], "");
    }
}

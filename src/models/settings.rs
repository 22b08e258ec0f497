// Netwatch - Connection Settings
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Read-only view over a NetworkManager settings blob (`a{sa{sv}}`) and the
//! derived values the projector needs: profile name, custom connection type
//! and the security descriptor.

use std::collections::HashMap;

use crate::dbus::codec::{PropertyMap, PropertyMapExt};
use crate::i18n;

/// `connection` section name.
pub const SETTING_CONNECTION: &str = "connection";
/// Wired setting name.
pub const SETTING_WIRED: &str = "802-3-ethernet";
/// Wireless setting name.
pub const SETTING_WIRELESS: &str = "802-11-wireless";
/// Wireless security setting name.
pub const SETTING_WIRELESS_SECURITY: &str = "802-11-wireless-security";
/// 802.1x setting name.
pub const SETTING_8021X: &str = "802-1x";
pub const SETTING_PPPOE: &str = "pppoe";
pub const SETTING_GSM: &str = "gsm";
pub const SETTING_CDMA: &str = "cdma";
pub const SETTING_VPN: &str = "vpn";
pub const SETTING_WIREGUARD: &str = "wireguard";

/// Settings of one connection profile, keyed by section then key.
#[derive(Debug, Default)]
pub struct ConnectionSettings {
    sections: HashMap<String, PropertyMap>,
}

impl ConnectionSettings {
    pub fn new(sections: HashMap<String, PropertyMap>) -> Self {
        Self { sections }
    }

    pub fn section(&self, name: &str) -> Option<&PropertyMap> {
        self.sections.get(name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    fn string(&self, section: &str, key: &str) -> Option<String> {
        self.section(section).and_then(|s| s.get_string(key))
    }

    /// `connection.id`, the human readable profile name.
    pub fn id(&self) -> String {
        self.string(SETTING_CONNECTION, "id").unwrap_or_default()
    }

    /// `connection.type`, the base setting name.
    pub fn connection_type(&self) -> String {
        self.string(SETTING_CONNECTION, "type").unwrap_or_default()
    }

    /// Whether 802.1x authentication is configured.
    pub fn uses_8021x(&self) -> bool {
        self.has_section(SETTING_8021X)
    }

    /// `802-11-wireless-security.key-mgmt`.
    pub fn wireless_key_mgmt(&self) -> Option<String> {
        self.string(SETTING_WIRELESS_SECURITY, "key-mgmt")
    }

    /// First entry of `802-1x.eap`.
    pub fn eap_method(&self) -> Option<String> {
        self.section(SETTING_8021X)
            .and_then(|s| s.get_string_list("eap"))
            .and_then(|methods| methods.into_iter().next())
    }

    /// `802-11-wireless.mode` (infrastructure, adhoc, ap).
    pub fn wireless_mode(&self) -> Option<String> {
        self.string(SETTING_WIRELESS, "mode")
    }

    /// `vpn.service-type`.
    pub fn vpn_service_type(&self) -> Option<String> {
        self.string(SETTING_VPN, "service-type")
    }

    /// Connection type as shown to users, e.g. `wired`, `wireless-hotspot`,
    /// `mobile-gsm`, `vpn-openvpn`.
    pub fn custom_connection_type(&self) -> String {
        let base = self.connection_type();
        match base.as_str() {
            SETTING_WIRED => "wired".to_string(),
            SETTING_WIRELESS => match self.wireless_mode().as_deref() {
                Some("adhoc") => "wireless-adhoc".to_string(),
                Some("ap") => "wireless-hotspot".to_string(),
                _ => "wireless".to_string(),
            },
            SETTING_PPPOE => "pppoe".to_string(),
            SETTING_GSM => "mobile-gsm".to_string(),
            SETTING_CDMA => "mobile-cdma".to_string(),
            SETTING_WIREGUARD => "wireguard".to_string(),
            SETTING_VPN => match self.vpn_service_type() {
                Some(service) => {
                    let short = service.rsplit('.').next().unwrap_or(&service);
                    format!("vpn-{}", short)
                }
                None => "vpn".to_string(),
            },
            _ => base,
        }
    }
}

/// Describe the security scheme of a profile.
///
/// Unrecognized key management or EAP methods yield an empty string.
pub fn classify_security(settings: &ConnectionSettings) -> String {
    let mut use_8021x = false;
    let mut security = String::new();

    match settings.connection_type().as_str() {
        SETTING_WIRED => {
            if settings.uses_8021x() {
                use_8021x = true;
            } else {
                security = i18n!("None");
            }
        }
        SETTING_WIRELESS => match settings.wireless_key_mgmt().as_deref() {
            Some("none") => security = i18n!("None"),
            Some("wep") => security = i18n!("WEP 40/128-bit Key"),
            Some("wpa-psk") => security = i18n!("WPA/WPA2 Personal"),
            Some("wpa-eap") => use_8021x = true,
            _ => {}
        },
        _ => {}
    }

    if use_8021x {
        let method = match settings.eap_method().as_deref() {
            Some("tls") => i18n!("TLS"),
            Some("md5") => i18n!("MD5"),
            Some("leap") => i18n!("LEAP"),
            Some("fast") => i18n!("FAST"),
            Some("ttls") => i18n!("Tunneled TLS"),
            Some("peap") => i18n!("Protected EAP"),
            _ => return security,
        };
        security = format!("EAP/{}", method);
    }

    security
}

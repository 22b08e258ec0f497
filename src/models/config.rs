// Netwatch - Application Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Application configuration model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Show desktop notifications for VPN state changes.
    #[serde(default = "default_true")]
    pub show_notifications: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// VPN profiles that were up when last seen, keyed by profile UUID.
    /// An auto-connect helper reactivates the `true` entries on login.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vpn_auto_connect: BTreeMap<String, bool>,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            show_notifications: true,
            log_level: default_log_level(),
            vpn_auto_connect: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file with restrictive permissions (0600).
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), super::Error> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }

    /// Whether the VPN profile was active when last seen.
    pub fn vpn_activated(&self, uuid: &str) -> bool {
        self.vpn_auto_connect.get(uuid).copied().unwrap_or(false)
    }

    /// Record the VPN flag; returns `true` if the value changed.
    pub fn set_vpn_activated(&mut self, uuid: &str, activated: bool) -> bool {
        let previous = self.vpn_auto_connect.insert(uuid.to_string(), activated);
        previous != Some(activated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.show_notifications);
    }

    #[test]
    fn test_vpn_flag_changes() {
        let mut config = AppConfig::default();
        assert!(!config.vpn_activated("abc"));
        assert!(config.set_vpn_activated("abc", true));
        assert!(!config.set_vpn_activated("abc", true));
        assert!(config.vpn_activated("abc"));
        assert!(config.set_vpn_activated("abc", false));
    }

    #[test]
    fn test_toml_roundtrip_keeps_flags() {
        let mut config = AppConfig::default();
        config.set_vpn_activated("2f9c", true);
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert!(parsed.vpn_activated("2f9c"));
    }
}

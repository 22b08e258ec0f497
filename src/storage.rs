// Netwatch - Local Storage
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Persisted daemon configuration.
//!
//! Holds the [`AppConfig`] behind a `RwLock` and writes it back to
//! `settings.toml` whenever a VPN auto-connect flag changes. Lock poisoning
//! is recovered by taking the inner value.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::models::{AppConfig, CONFIG_DIR_NAME};
use crate::services::VpnAutoConnect;

/// Configuration store backed by `settings.toml`.
#[derive(Debug)]
pub struct ConfigStore {
    /// Settings file path.
    settings_file: PathBuf,
    settings: RwLock<AppConfig>,
}

impl ConfigStore {
    /// Create a store in the default config directory.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Self::with_config_dir(config_dir)
    }

    /// Create a store in a specific config directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&config_dir) {
            error!("Failed to create config directory: {}", e);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&config_dir, fs::Permissions::from_mode(0o700));
        }

        let store = Self {
            settings_file: config_dir.join("settings.toml"),
            settings: RwLock::new(AppConfig::default()),
        };
        store.load_settings();
        store
    }

    // ========================================================================
    // RwLock Helper Methods (handle poisoning gracefully)
    // ========================================================================

    fn read_lock<R>(&self, reader: impl FnOnce(&AppConfig) -> R) -> R {
        match self.settings.read() {
            Ok(guard) => reader(&guard),
            Err(poisoned) => {
                warn!("RwLock poisoned reading settings, recovering");
                reader(&poisoned.into_inner())
            }
        }
    }

    fn write_lock<R>(&self, writer: impl FnOnce(&mut AppConfig) -> R) -> R {
        match self.settings.write() {
            Ok(mut guard) => writer(&mut guard),
            Err(poisoned) => {
                warn!("RwLock poisoned writing settings, recovering");
                writer(&mut poisoned.into_inner())
            }
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    fn load_settings(&self) {
        if !self.settings_file.exists() {
            return;
        }
        match AppConfig::load_from_file(&self.settings_file) {
            Ok(config) => {
                self.write_lock(|s| *s = config);
                info!("Loaded settings from {:?}", self.settings_file);
            }
            Err(e) => error!("Failed to load settings: {}", e),
        }
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings().save_to_file(&self.settings_file) {
            error!("Failed to save settings: {}", e);
        }
    }

    /// Copy of the current settings.
    pub fn settings(&self) -> AppConfig {
        self.read_lock(|s| s.clone())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VpnAutoConnect for ConfigStore {
    fn set_vpn_activated(&self, uuid: &str, activated: bool) {
        if uuid.is_empty() {
            return;
        }
        let changed = self.write_lock(|s| s.set_vpn_activated(uuid, activated));
        if changed {
            debug!("VPN {} auto-connect set to {}", uuid, activated);
            self.save_settings();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("netwatch-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_flag_is_persisted() {
        let dir = scratch_dir("persist");
        let store = ConfigStore::with_config_dir(dir.clone());
        store.set_vpn_activated("u1", true);
        assert!(dir.join("settings.toml").exists());

        let reopened = ConfigStore::with_config_dir(dir.clone());
        assert!(reopened.settings().vpn_activated("u1"));

        reopened.set_vpn_activated("u1", false);
        let again = ConfigStore::with_config_dir(dir.clone());
        assert!(!again.settings().vpn_activated("u1"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unchanged_flag_does_not_write() {
        let dir = scratch_dir("unchanged");
        let store = ConfigStore::with_config_dir(dir.clone());
        store.set_vpn_activated("u1", true);
        fs::remove_file(dir.join("settings.toml")).unwrap();
        store.set_vpn_activated("u1", true);
        assert!(!dir.join("settings.toml").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_settings_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = scratch_dir("perms");
        let store = ConfigStore::with_config_dir(dir.clone());
        store.set_vpn_activated("u1", true);
        let mode = fs::metadata(dir.join("settings.toml")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let _ = fs::remove_dir_all(&dir);
    }
}

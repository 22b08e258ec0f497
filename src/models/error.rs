// Netwatch - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for netwatch.

use thiserror::Error;

/// Result type alias for netwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for netwatch operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // D-Bus Errors
    // ========================================
    #[error("D-Bus error: {0}")]
    Dbus(String),

    #[error("NetworkManager D-Bus error: {0}")]
    NetworkManagerDbus(String),

    #[error("BlueZ D-Bus error: {0}")]
    Bluez(String),

    #[error("D-Bus connection failed: {0}")]
    DbusConnectionFailed(String),

    #[error("Invalid object path: {0}")]
    InvalidObjectPath(String),

    // ========================================
    // Lookup Errors
    // ========================================
    #[error("Object not found: {0}")]
    NotFound(String),

    // ========================================
    // Storage Errors
    // ========================================
    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    #[error("JSON encoding failed: {0}")]
    Json(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Convert from zbus errors
impl From<zbus::Error> for Error {
    fn from(err: zbus::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from zbus freedesktop errors
impl From<zbus::fdo::Error> for Error {
    fn from(err: zbus::fdo::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from zvariant errors (bad object paths, failed value conversions)
impl From<zbus::zvariant::Error> for Error {
    fn from(err: zbus::zvariant::Error) -> Self {
        Error::InvalidObjectPath(err.to_string())
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from toml serialize errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_parse_error_maps_to_config_parse() {
        let err: Error = toml::from_str::<toml::Value>("log_level = ").unwrap_err().into();
        assert!(matches!(err, Error::ConfigParseFailed(_)));
    }

    #[test]
    fn test_json_error_message() {
        let err: Error = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON encoding failed: "));
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "IO error: gone");
    }
}

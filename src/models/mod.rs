// Netwatch - Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared types used across netwatch:
//!
//! - **Active**: Active connection records and state enums
//! - **Info**: Per-connection diagnostic projection
//! - **Settings**: Connection profile settings and security classification
//! - **Device**: Device type and mobile network naming
//! - **Config**: Persisted application configuration
//! - **Error**: Shared error types

pub mod active;
pub mod config;
pub mod device;
pub mod error;
pub mod info;
pub mod settings;

// Re-export main types for convenience
pub use active::{
    ActiveConnection, ActiveConnectionProps, ActiveConnectionState, DeviceState,
    VpnConnectionState,
};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use info::{ActiveConnectionInfo, Ip4Info, Ip6Info};
pub use settings::{classify_security, ConnectionSettings};

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "netwatch";

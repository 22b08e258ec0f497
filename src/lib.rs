// Netwatch - Library Root
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Netwatch
//!
//! Keeps an always-consistent view of NetworkManager's active connections
//! (VPNs included) by combining a full enumeration with the property and
//! VPN state signals NetworkManager emits, and derives per-connection
//! diagnostics on demand. Also exposes a small BlueZ adapter/device facade.
//!
//! Data flow: bus signal → [`reconciler`] → [`store`] → snapshot readers,
//! with [`projector`] answering diagnostic queries directly.

pub mod dbus;
pub mod models;
pub mod projector;
pub mod reconciler;
pub mod services;
pub mod storage;
pub mod store;

/// Human-readable application name.
pub const APP_NAME: &str = "Netwatch";

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gettext domain for translations.
pub const GETTEXT_DOMAIN: &str = "netwatch";

/// Helper macro for gettext translations.
#[macro_export]
macro_rules! i18n {
    ($s:expr) => {
        gettextrs::gettext($s)
    };
}

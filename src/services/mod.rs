// Netwatch - Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Side-effect services driven by the reconciler:
//! - Vpn: VPN state pipeline (auto-connect flag, notifications, switch)
//! - Notify: Desktop notifications

pub mod notify;
pub mod vpn;

pub use notify::{DesktopNotifier, Notifier, VpnNotification};
pub use vpn::{SwitchHandle, VpnAutoConnect, VpnPipeline, VpnSwitch};

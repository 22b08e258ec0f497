// Netwatch - Desktop Notifications
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! User-facing VPN notifications via `org.freedesktop.Notifications`.

use std::collections::HashMap;

use tracing::{debug, warn};
use zbus::Connection;

use crate::dbus::proxies::NotificationsProxy;
use crate::i18n;

/// Icon used for every VPN notification.
const VPN_ICON: &str = "network-vpn";

/// A VPN event worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VpnNotification {
    Connected { name: String },
    Disconnected { name: String },
    Failed { name: String, reason: u32 },
}

impl VpnNotification {
    pub fn summary(&self) -> String {
        match self {
            Self::Connected { .. } => i18n!("VPN connected"),
            Self::Disconnected { .. } => i18n!("VPN disconnected"),
            Self::Failed { .. } => i18n!("VPN connection failed"),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Connected { name } | Self::Disconnected { name } => name.clone(),
            Self::Failed { name, reason } => {
                format!("{} ({} {})", name, i18n!("reason"), reason)
            }
        }
    }
}

/// Sink for VPN notifications.
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Must not block; delivery failures are the
    /// implementation's problem.
    fn notify(&self, notification: VpnNotification);
}

/// Sends notifications over the session bus.
///
/// Without a session bus (headless, system service) notifications are
/// only logged.
pub struct DesktopNotifier {
    connection: Option<Connection>,
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(connection: Option<Connection>, enabled: bool) -> Self {
        Self { connection, enabled }
    }

    /// Connect to the session bus, falling back to log-only mode.
    pub async fn session(enabled: bool) -> Self {
        let connection = match Connection::session().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("No session bus, VPN notifications will only be logged: {}", e);
                None
            }
        };
        Self::new(connection, enabled)
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: VpnNotification) {
        debug!("VPN notification: {:?}", notification);
        if !self.enabled {
            return;
        }
        let Some(connection) = self.connection.clone() else {
            return;
        };

        tokio::spawn(async move {
            let proxy = match NotificationsProxy::new(&connection).await {
                Ok(proxy) => proxy,
                Err(e) => {
                    warn!("Failed to reach notification daemon: {}", e);
                    return;
                }
            };
            let result = proxy
                .notify(
                    crate::APP_NAME,
                    0,
                    VPN_ICON,
                    &notification.summary(),
                    &notification.body(),
                    &[],
                    HashMap::new(),
                    -1,
                )
                .await;
            if let Err(e) = result {
                warn!("Failed to send notification: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_body_carries_reason() {
        let note = VpnNotification::Failed {
            name: "Work".into(),
            reason: 9,
        };
        assert_eq!(note.body(), "Work (reason 9)");
        assert_eq!(note.summary(), "VPN connection failed");
    }

    #[test]
    fn test_connected_body_is_name() {
        let note = VpnNotification::Connected { name: "Work".into() };
        assert_eq!(note.body(), "Work");
    }

    #[test]
    fn test_disabled_notifier_does_nothing() {
        // no runtime needed: a disabled notifier never spawns
        let notifier = DesktopNotifier::new(None, false);
        notifier.notify(VpnNotification::Disconnected { name: "x".into() });
    }
}

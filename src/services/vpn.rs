// Netwatch - VPN State Pipeline
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Side effects of a VPN connection changing state.
//!
//! For a VPN the store already knows about, in this order:
//! 1. persist whether the profile should come back on next login
//! 2. tell the user (connected, disconnected, failed with reason)
//! 3. flip the VPN feature switch on while activating, or drop the entry
//!    from the store otherwise

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedObjectPath;

use super::notify::{Notifier, VpnNotification};
use crate::models::{ActiveConnection, VpnConnectionState};
use crate::store::{ActiveConnectionSource, ActiveConnectionStore};

/// Where the per-profile auto-connect flag is persisted.
pub trait VpnAutoConnect: Send + Sync {
    fn set_vpn_activated(&self, uuid: &str, activated: bool);
}

/// One-way "VPN feature enabled" toggle.
pub trait VpnSwitch: Send + Sync {
    fn enable_vpn(&self);
}

/// [`VpnSwitch`] backed by a watch channel; observers see `true` once any
/// VPN starts activating.
#[derive(Debug)]
pub struct SwitchHandle {
    enabled: watch::Sender<bool>,
}

impl SwitchHandle {
    pub fn new() -> Self {
        let (enabled, _) = watch::channel(false);
        Self { enabled }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.enabled.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.borrow()
    }
}

impl Default for SwitchHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl VpnSwitch for SwitchHandle {
    fn enable_vpn(&self) {
        self.enabled.send_if_modified(|enabled| {
            let changed = !*enabled;
            *enabled = true;
            changed
        });
    }
}

/// Runs the VPN side effects for `VpnStateChanged` signals.
#[derive(Clone)]
pub struct VpnPipeline {
    config: Arc<dyn VpnAutoConnect>,
    notifier: Arc<dyn Notifier>,
    switch: Arc<dyn VpnSwitch>,
}

impl VpnPipeline {
    pub fn new(
        config: Arc<dyn VpnAutoConnect>,
        notifier: Arc<dyn Notifier>,
        switch: Arc<dyn VpnSwitch>,
    ) -> Self {
        Self {
            config,
            notifier,
            switch,
        }
    }

    /// Handle a VPN state change for the active connection at `path`.
    ///
    /// The side effects run under the store lock, so the entry cannot be
    /// refreshed or re-created between the lookup and its removal.
    pub async fn handle<S: ActiveConnectionSource>(
        &self,
        store: &ActiveConnectionStore<S>,
        path: &OwnedObjectPath,
        state: VpnConnectionState,
        reason: u32,
    ) {
        let seen = store
            .retain_entry(path, |conn| self.apply(conn, state, reason))
            .await;
        if seen.is_none() {
            debug!("VPN state {:?} for unknown connection {}, ignoring", state, path);
        }
    }

    /// Run the side effects for one known connection. Returns whether the
    /// entry stays in the store.
    fn apply(&self, conn: &ActiveConnection, state: VpnConnectionState, reason: u32) -> bool {
        let activating = state.is_activating();
        self.config.set_vpn_activated(&conn.uuid, activating);

        if state.is_activated() {
            info!("VPN {} connected", conn.id);
            self.notifier
                .notify(VpnNotification::Connected { name: conn.id.clone() });
        } else if state.is_disconnected() {
            info!("VPN {} disconnected", conn.id);
            self.notifier
                .notify(VpnNotification::Disconnected { name: conn.id.clone() });
        } else if state.is_failed() {
            warn!("VPN {} failed, reason {}", conn.id, reason);
            self.notifier.notify(VpnNotification::Failed {
                name: conn.id.clone(),
                reason,
            });
        }

        if activating {
            self.switch.enable_vpn();
        }
        activating
    }
}

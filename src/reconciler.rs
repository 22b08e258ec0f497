// Netwatch - Signal Reconciler
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Turns NetworkManager bus signals into store mutations.
//!
//! Three signal shapes are accepted, all sent by NetworkManager:
//!
//! | Signal | Body |
//! |--------|------|
//! | `org.freedesktop.DBus.Properties.PropertiesChanged` | `(s a{sv} as)`, interface must be `Connection.Active` |
//! | `org.freedesktop.NetworkManager.Connection.Active.PropertiesChanged` | `(a{sv})` |
//! | `org.freedesktop.NetworkManager.VPN.Connection.VpnStateChanged` | `(u u)` |
//!
//! Anything else, or a body of the wrong shape, is dropped. Signals are
//! handled one at a time in delivery order.

use std::sync::Arc;

use futures_util::stream::{select_all, Stream, StreamExt};
use tracing::{debug, info, warn};
use zbus::fdo::DBusProxy;
use zbus::message::Type as MessageType;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Structure};
use zbus::{Connection, MatchRule, Message, MessageStream};

use crate::dbus::codec::{as_property_map, as_string, as_u32, to_owned_value, PropertyMap};
use crate::dbus::NM_SERVICE;
use crate::models::{Result, VpnConnectionState};
use crate::services::VpnPipeline;
use crate::store::{ActiveConnectionSource, ActiveConnectionStore};

const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const ACTIVE_IFACE: &str = "org.freedesktop.NetworkManager.Connection.Active";
const VPN_IFACE: &str = "org.freedesktop.NetworkManager.VPN.Connection";

const LEGACY_PROPERTIES_CHANGED: &str = "org.freedesktop.DBus.Properties.PropertiesChanged";
const ACTIVE_PROPERTIES_CHANGED: &str =
    "org.freedesktop.NetworkManager.Connection.Active.PropertiesChanged";
const VPN_STATE_CHANGED: &str = "org.freedesktop.NetworkManager.VPN.Connection.VpnStateChanged";

/// (interface, member) pairs subscribed to.
const SIGNAL_RULES: [(&str, &str); 3] = [
    (PROPERTIES_IFACE, "PropertiesChanged"),
    (ACTIVE_IFACE, "PropertiesChanged"),
    (VPN_IFACE, "VpnStateChanged"),
];

/// A normalized active-connection signal.
#[derive(Debug, PartialEq)]
pub enum ActiveSignal {
    LegacyPropertiesChanged {
        interface: String,
        fields: PropertyMap,
    },
    PropertiesChanged {
        fields: PropertyMap,
    },
    VpnStateChanged {
        state: VpnConnectionState,
        reason: u32,
    },
}

impl ActiveSignal {
    /// Normalize a raw signal. `name` is the fully qualified
    /// `interface.member`.
    pub fn from_parts(name: &str, body: &[OwnedValue]) -> Option<Self> {
        match name {
            LEGACY_PROPERTIES_CHANGED => {
                if body.len() < 2 {
                    return None;
                }
                let interface = as_string(&body[0])?;
                if interface != ACTIVE_IFACE {
                    return None;
                }
                let fields = as_property_map(&body[1])?;
                Some(Self::LegacyPropertiesChanged { interface, fields })
            }
            ACTIVE_PROPERTIES_CHANGED => {
                let fields = as_property_map(body.first()?)?;
                Some(Self::PropertiesChanged { fields })
            }
            VPN_STATE_CHANGED => {
                if body.len() < 2 {
                    return None;
                }
                let state = as_u32(&body[0])?;
                let reason = as_u32(&body[1])?;
                Some(Self::VpnStateChanged {
                    state: VpnConnectionState::from(state),
                    reason,
                })
            }
            _ => None,
        }
    }
}

/// Decode a message body into its top-level values. Empty on failure.
fn body_values(msg: &Message) -> Vec<OwnedValue> {
    let body = msg.body();
    match body.deserialize::<Structure<'_>>() {
        Ok(structure) => structure
            .into_fields()
            .into_iter()
            .map(to_owned_value)
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default(),
        Err(e) => {
            debug!("Undecodable signal body: {}", e);
            Vec::new()
        }
    }
}

/// Routes signals to the store and the VPN pipeline.
pub struct Reconciler<S> {
    store: Arc<ActiveConnectionStore<S>>,
    vpn: VpnPipeline,
}

impl<S: ActiveConnectionSource> Reconciler<S> {
    pub fn new(store: Arc<ActiveConnectionStore<S>>, vpn: VpnPipeline) -> Self {
        Self { store, vpn }
    }

    pub fn store(&self) -> &Arc<ActiveConnectionStore<S>> {
        &self.store
    }

    /// Apply one normalized signal for the object at `path`.
    pub async fn dispatch(&self, path: &OwnedObjectPath, signal: ActiveSignal) {
        match signal {
            ActiveSignal::LegacyPropertiesChanged { fields, .. }
            | ActiveSignal::PropertiesChanged { fields } => {
                self.store.apply_update(path, &fields).await;
            }
            ActiveSignal::VpnStateChanged { state, reason } => {
                self.vpn.handle(&self.store, path, state, reason).await;
            }
        }
    }

    /// React to NetworkManager appearing on or leaving the bus.
    pub async fn owner_changed(&self, has_owner: bool) {
        if has_owner {
            info!("NetworkManager appeared, reloading active connections");
            if let Err(e) = self.store.initialize().await {
                warn!("Reload after NetworkManager restart failed: {}", e);
            }
        } else {
            info!("NetworkManager left the bus, clearing active connections");
            self.store.clear().await;
        }
    }

    async fn handle_message(&self, msg: &Message) {
        let header = msg.header();
        let (Some(path), Some(interface), Some(member)) =
            (header.path(), header.interface(), header.member())
        else {
            return;
        };
        let name = format!("{}.{}", interface, member);
        let path = OwnedObjectPath::from(path.to_owned());

        match ActiveSignal::from_parts(&name, &body_values(msg)) {
            Some(signal) => self.dispatch(&path, signal).await,
            None => debug!("Dropping {} on {}", name, path),
        }
    }

    /// Subscribe, load the initial state, then dispatch until the bus
    /// connection goes away.
    ///
    /// The match rules are in place before the enumeration runs, so signals
    /// sent while it is in flight queue up and are applied afterwards.
    pub async fn run(&self, connection: &Connection) -> Result<()> {
        let mut streams = Vec::with_capacity(SIGNAL_RULES.len());
        for (interface, member) in SIGNAL_RULES {
            let rule = MatchRule::builder()
                .msg_type(MessageType::Signal)
                .sender(NM_SERVICE)?
                .interface(interface)?
                .member(member)?
                .build();
            streams.push(MessageStream::for_match_rule(rule, connection, None).await?);
        }

        let dbus = DBusProxy::new(connection).await?;
        let owners = dbus
            .receive_name_owner_changed_with_args(&[(0, NM_SERVICE)])
            .await?
            .map(|change| {
                change
                    .args()
                    .ok()
                    .map(|args| args.new_owner().is_some())
            });

        self.start(select_all(streams), owners).await;
        Ok(())
    }

    /// Load the initial state, then drain already-subscribed streams.
    ///
    /// `owners` yields whether NetworkManager owns its bus name, or `None`
    /// for an undecodable `NameOwnerChanged`.
    pub async fn start<M, O>(&self, mut signals: M, mut owners: O)
    where
        M: Stream<Item = zbus::Result<Message>> + Unpin,
        O: Stream<Item = Option<bool>> + Unpin,
    {
        if let Err(e) = self.store.initialize().await {
            // NetworkManager may not be running yet; the owner watch reloads later.
            warn!("Initial enumeration failed: {}", e);
        }

        info!("Watching NetworkManager signals");
        loop {
            tokio::select! {
                msg = signals.next() => match msg {
                    Some(Ok(msg)) => self.handle_message(&msg).await,
                    Some(Err(e)) => warn!("Failed to receive signal: {}", e),
                    None => break,
                },
                change = owners.next() => match change {
                    Some(Some(has_owner)) => self.owner_changed(has_owner).await,
                    Some(None) => warn!("Malformed NameOwnerChanged"),
                    None => break,
                },
            }
        }

        info!("Signal streams closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActiveConnectionState;
    use crate::services::vpn::tests::{harness, Harness};
    use crate::store::tests::{path, FakeSource};
    use std::collections::HashMap;
    use zbus::zvariant::Value;

    fn owned(value: Value<'_>) -> OwnedValue {
        to_owned_value(value).unwrap()
    }

    fn dict(pairs: Vec<(&str, Value<'static>)>) -> OwnedValue {
        let map: HashMap<&str, Value<'static>> = pairs.into_iter().collect();
        owned(Value::from(map))
    }

    fn reconciler(source: FakeSource) -> (Reconciler<FakeSource>, Harness) {
        let h = harness();
        let store = Arc::new(ActiveConnectionStore::new(source));
        (Reconciler::new(store, h.pipeline.clone()), h)
    }

    #[test]
    fn test_legacy_shape() {
        let body = vec![
            owned(Value::from(ACTIVE_IFACE)),
            dict(vec![("State", Value::from(2u32))]),
            owned(Value::from(Vec::<String>::new())),
        ];
        match ActiveSignal::from_parts(LEGACY_PROPERTIES_CHANGED, &body) {
            Some(ActiveSignal::LegacyPropertiesChanged { interface, fields }) => {
                assert_eq!(interface, ACTIVE_IFACE);
                assert!(fields.contains_key("State"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_legacy_shape_for_other_interface_is_dropped() {
        let body = vec![
            owned(Value::from("org.freedesktop.NetworkManager.Device")),
            dict(vec![("State", Value::from(100u32))]),
        ];
        assert!(ActiveSignal::from_parts(LEGACY_PROPERTIES_CHANGED, &body).is_none());
    }

    #[test]
    fn test_malformed_bodies_are_dropped() {
        let one = vec![owned(Value::from(ACTIVE_IFACE))];
        assert!(ActiveSignal::from_parts(LEGACY_PROPERTIES_CHANGED, &one).is_none());
        assert!(ActiveSignal::from_parts(ACTIVE_PROPERTIES_CHANGED, &[]).is_none());
        assert!(ActiveSignal::from_parts(ACTIVE_PROPERTIES_CHANGED, &one).is_none());

        let vpn = vec![owned(Value::from(5u32))];
        assert!(ActiveSignal::from_parts(VPN_STATE_CHANGED, &vpn).is_none());
        let vpn = vec![owned(Value::from("up")), owned(Value::from(0u32))];
        assert!(ActiveSignal::from_parts(VPN_STATE_CHANGED, &vpn).is_none());

        let props = vec![dict(vec![("State", Value::from(2u32))])];
        assert!(ActiveSignal::from_parts("org.example.Other.PropertiesChanged", &props).is_none());
    }

    #[test]
    fn test_vpn_shape() {
        let body = vec![owned(Value::from(6u32)), owned(Value::from(9u32))];
        assert_eq!(
            ActiveSignal::from_parts(VPN_STATE_CHANGED, &body),
            Some(ActiveSignal::VpnStateChanged {
                state: VpnConnectionState::Failed,
                reason: 9
            })
        );
    }

    #[tokio::test]
    async fn test_activation_then_deactivation() {
        let source = FakeSource::default().with("/ac/1", 1, "u1", false).named("u1", "Home");
        let (reconciler, _) = reconciler(source);

        let legacy = vec![
            owned(Value::from(ACTIVE_IFACE)),
            dict(vec![("State", Value::from(2u32))]),
            owned(Value::from(Vec::<String>::new())),
        ];
        let signal = ActiveSignal::from_parts(LEGACY_PROPERTIES_CHANGED, &legacy).unwrap();
        reconciler.dispatch(&path("/ac/1"), signal).await;

        let snapshot = reconciler.store().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state, ActiveConnectionState::Activated);
        assert_eq!(snapshot[0].id, "Home");

        let modern = vec![dict(vec![("State", Value::from(4u32))])];
        let signal = ActiveSignal::from_parts(ACTIVE_PROPERTIES_CHANGED, &modern).unwrap();
        reconciler.dispatch(&path("/ac/1"), signal).await;

        assert!(reconciler.store().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_vpn_signal_goes_through_pipeline() {
        let source = FakeSource::default().with("/ac/7", 1, "u7", true).named("u7", "Work VPN");
        let (reconciler, h) = reconciler(source);
        reconciler.store().initialize().await.unwrap();

        let body = vec![owned(Value::from(5u32)), owned(Value::from(0u32))];
        let signal = ActiveSignal::from_parts(VPN_STATE_CHANGED, &body).unwrap();
        reconciler.dispatch(&path("/ac/7"), signal).await;
        assert!(h.switch.is_enabled());
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);

        let body = vec![owned(Value::from(7u32)), owned(Value::from(2u32))];
        let signal = ActiveSignal::from_parts(VPN_STATE_CHANGED, &body).unwrap();
        reconciler.dispatch(&path("/ac/7"), signal).await;
        assert!(reconciler.store().snapshot().is_empty());
        assert_eq!(
            *h.config.flags.lock().unwrap(),
            vec![("u7".to_string(), true), ("u7".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_signal_queued_before_enumeration_is_applied() {
        // /ac/1 is still activating when enumerated; the Activated signal
        // was already queued on the subscription
        let source = FakeSource::default().with("/ac/1", 1, "u1", false).named("u1", "Home");
        let (reconciler, _) = reconciler(source);

        let mut changed: HashMap<&str, Value<'_>> = HashMap::new();
        changed.insert("State", Value::from(2u32));
        let msg = Message::signal("/ac/1", ACTIVE_IFACE, "PropertiesChanged")
            .unwrap()
            .build(&(changed,))
            .unwrap();

        let signals = futures_util::stream::iter(vec![Ok(msg)]);
        let owners = futures_util::stream::pending::<Option<bool>>();
        reconciler.start(signals, owners).await;

        let snapshot = reconciler.store().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state, ActiveConnectionState::Activated);
        assert_eq!(snapshot[0].id, "Home");
    }

    #[tokio::test]
    async fn test_start_reacts_to_owner_stream() {
        let source = FakeSource::default().with("/ac/1", 2, "u1", false);
        let (reconciler, _) = reconciler(source);

        let signals = futures_util::stream::pending::<zbus::Result<Message>>();
        let owners = futures_util::stream::iter(vec![None, Some(false)]);
        reconciler.start(signals, owners).await;

        assert!(reconciler.store().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_owner_changes() {
        let source = FakeSource::default().with("/ac/1", 2, "u1", false);
        let (reconciler, _) = reconciler(source);
        reconciler.store().initialize().await.unwrap();

        reconciler.owner_changed(false).await;
        assert!(reconciler.store().snapshot().is_empty());

        reconciler.owner_changed(true).await;
        assert_eq!(reconciler.store().snapshot().len(), 1);
    }
}

// Netwatch - Active Connection Store
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Authoritative map of active connections.
//!
//! The map only ever holds connections whose last known state is outside
//! the deactivating class. Every mutation runs under one lock and ends by
//! republishing the snapshot, so readers of the snapshot always see a state
//! the map actually had.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedObjectPath;

use crate::dbus::codec::{PropertyMap, PropertyMapExt};
use crate::models::{ActiveConnection, ActiveConnectionProps, ActiveConnectionState, Result};

/// Remote queries the store needs to build records.
pub trait ActiveConnectionSource: Send + Sync {
    /// Paths of all active connections (full enumeration).
    fn active_connection_paths(&self) -> impl Future<Output = Result<Vec<OwnedObjectPath>>> + Send;

    /// Full property query for one active connection.
    fn active_connection(
        &self,
        path: &OwnedObjectPath,
    ) -> impl Future<Output = Result<ActiveConnectionProps>> + Send;

    /// Resolve a profile UUID to its human readable name.
    fn connection_id(&self, uuid: &str) -> impl Future<Output = Result<String>> + Send;
}

/// In-process view of NetworkManager's active connections.
pub struct ActiveConnectionStore<S> {
    source: S,
    connections: Mutex<HashMap<OwnedObjectPath, ActiveConnection>>,
    published: watch::Sender<Vec<ActiveConnection>>,
}

impl<S: ActiveConnectionSource> ActiveConnectionStore<S> {
    /// Create an empty store backed by `source`.
    pub fn new(source: S) -> Self {
        let (published, _) = watch::channel(Vec::new());
        Self {
            source,
            connections: Mutex::new(HashMap::new()),
            published,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Reset the map from a full enumeration.
    ///
    /// Safe to call again at any time (e.g. after NetworkManager restarts).
    /// If the enumeration itself fails the map is left empty and the error
    /// is returned.
    pub async fn initialize(&self) -> Result<usize> {
        let mut connections = self.connections.lock().await;
        connections.clear();

        let paths = match self.source.active_connection_paths().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Failed to enumerate active connections: {}", e);
                self.publish(&connections);
                return Err(e);
            }
        };

        for path in paths {
            let conn = self.query(&path).await;
            if conn.state.is_deactivating() {
                debug!("Skipping {} ({})", path, conn.state.as_str());
                continue;
            }
            connections.insert(path, conn);
        }

        info!("Initialized {} active connections", connections.len());
        self.publish(&connections);
        Ok(connections.len())
    }

    /// Overlay the named fields onto the record for `path`.
    ///
    /// Unknown paths are synthesized with a full query first. When the
    /// resulting state is in the deactivating class the record is removed,
    /// whatever else the update carried.
    pub async fn apply_update(&self, path: &OwnedObjectPath, fields: &PropertyMap) {
        let mut connections = self.connections.lock().await;

        let mut conn = match connections.get(path) {
            Some(existing) => existing.clone(),
            None => {
                debug!("Synthesizing record for unknown active connection {}", path);
                self.query(path).await
            }
        };

        for (name, value) in fields {
            match name.as_str() {
                "State" => {
                    if let Some(state) = fields.get_u32(name) {
                        conn.state = ActiveConnectionState::from(state);
                    }
                }
                "Devices" => {
                    if let Some(devices) = fields.get_object_paths(name) {
                        conn.devices = devices;
                    }
                }
                "Uuid" => {
                    if let Some(uuid) = fields.get_string(name) {
                        match self.source.connection_id(&uuid).await {
                            Ok(id) => conn.id = id,
                            Err(e) => debug!("No profile for uuid {}: {}", uuid, e),
                        }
                        conn.uuid = uuid;
                    }
                }
                "Vpn" => {
                    if let Some(vpn) = fields.get_bool(name) {
                        conn.vpn = vpn;
                    }
                }
                // Connection, SpecificObject, Default, Default6, Master, ...
                _ => {
                    debug!("Ignoring property {} = {:?} on {}", name, value, path);
                }
            }
        }

        if conn.state.is_deactivating() {
            info!("Removing active connection {} ({})", path, conn.id);
            connections.remove(path);
        } else {
            info!(
                "Updating active connection {} ({}, {})",
                path,
                conn.id,
                conn.state.as_str()
            );
            connections.insert(path.clone(), conn);
        }

        self.publish(&connections);
    }

    /// Run `decide` on the record for `path` under the store lock and drop
    /// the record when it returns `false`.
    ///
    /// Returns the record `decide` saw, or `None` (without calling it) when
    /// `path` is unknown. Nothing else can touch the entry between the
    /// lookup and the removal.
    pub async fn retain_entry<F>(
        &self,
        path: &OwnedObjectPath,
        decide: F,
    ) -> Option<ActiveConnection>
    where
        F: FnOnce(&ActiveConnection) -> bool,
    {
        let mut connections = self.connections.lock().await;
        let conn = connections.get(path)?.clone();
        if !decide(&conn) {
            connections.remove(path);
            debug!("Removed active connection {}", path);
            self.publish(&connections);
        }
        Some(conn)
    }

    /// Forget everything, e.g. when NetworkManager leaves the bus.
    pub async fn clear(&self) {
        let mut connections = self.connections.lock().await;
        connections.clear();
        self.publish(&connections);
    }

    /// Copy of one record.
    pub async fn get(&self, path: &OwnedObjectPath) -> Option<ActiveConnection> {
        self.connections.lock().await.get(path).cloned()
    }

    /// Current snapshot. Consumers must not rely on its ordering.
    pub fn snapshot(&self) -> Vec<ActiveConnection> {
        self.published.borrow().clone()
    }

    /// Current snapshot encoded as JSON, as published on the bus.
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&*self.published.borrow())?)
    }

    /// Receiver that sees every republished snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ActiveConnection>> {
        self.published.subscribe()
    }

    /// Build a fresh record from a full query. Failures leave the fields at
    /// their defaults.
    async fn query(&self, path: &OwnedObjectPath) -> ActiveConnection {
        let mut conn = ActiveConnection::new(path.clone());

        let props = match self.source.active_connection(path).await {
            Ok(props) => props,
            Err(e) => {
                warn!("Failed to query active connection {}: {}", path, e);
                return conn;
            }
        };

        conn.state = ActiveConnectionState::from(props.state);
        conn.devices = props.devices;
        conn.vpn = props.vpn;
        match self.source.connection_id(&props.uuid).await {
            Ok(id) => conn.id = id,
            Err(e) => debug!("No profile for uuid {}: {}", props.uuid, e),
        }
        conn.uuid = props.uuid;
        conn
    }

    /// Recompute the snapshot from the map. Called with the lock held.
    fn publish(&self, connections: &HashMap<OwnedObjectPath, ActiveConnection>) {
        let mut snapshot: Vec<ActiveConnection> = connections.values().cloned().collect();
        snapshot.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
        self.published.send_replace(snapshot);
    }
}

// Netwatch - D-Bus Layer
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Everything that talks to the bus:
//!
//! - **codec**: typed access to loosely-typed property values
//! - **proxies**: zbus proxy definitions
//! - **nm**: NetworkManager client backing the store and the projector
//! - **bluez**: BlueZ adapter/device facade

pub mod bluez;
pub mod codec;
pub mod nm;
pub mod proxies;

pub use bluez::BluezClient;
pub use codec::PropertyMap;
pub use nm::{NmClient, NM_SERVICE};

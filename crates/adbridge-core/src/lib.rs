// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AdBridge — Core types, lifecycle events and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::SdkConfig;
pub use error::BridgeError;
pub use events::{AdEvent, AdEventType, EventKind, EventPayload};
pub use types::*;

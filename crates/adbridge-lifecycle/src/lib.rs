// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AdBridge Lifecycle — tracks every ad object by its caller-supplied id across
// create → load → show → (refresh) → destroy, enforces which operations are
// valid in which state, and turns per-instance native listener callbacks into
// publications on a single typed event bus.

pub mod controller;
pub mod event_bus;
pub mod handle;
mod listener;
pub mod registry;

pub use controller::AdController;
pub use event_bus::{EventBus, SubscriptionId};
pub use registry::{AdInstance, AdSnapshot, InstanceRegistry};

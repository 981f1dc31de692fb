// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AdBridge Façade — the surface the scripting runtime calls.
//
// Normalizes loosely-typed requests, runs every native-reaching operation off
// the caller's task, and turns controller outcomes into `{success, ...}`
// payloads or `{code, message, nativeCode?}` failures.

pub mod bridge;
pub mod request;
pub mod response;

pub use bridge::AdBridge;
pub use request::{AdConfig, AdRequest, InitInput, NormalizedRequest};
pub use response::{AdCreated, BridgeFailure, FacadeResult, InitResult, OpResult};

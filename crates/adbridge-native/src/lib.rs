// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! AdBridge — Native ad engine abstractions.
//!
//! This crate defines the capability traits the bridge needs from the native
//! ad SDK (per-format ad objects, listener callbacks, SDK-level settings) and
//! the dispatch logic that hands the rest of the workspace a single
//! `dyn PlatformBridge`.
//!
//! The host application's platform glue (Kotlin / Objective-C) installs the
//! real engine once at startup via [`install_platform_bridge`].  Until it
//! does, and on platforms without the native module, [`platform_bridge`]
//! returns the [`stub::StubBridge`], which reports `PlatformUnsupported`
//! from every call.

use std::sync::{Arc, OnceLock};

pub mod mock;
pub mod stub;
pub mod traits;

static INSTALLED: OnceLock<Arc<dyn traits::PlatformBridge>> = OnceLock::new();

/// Register the native engine for this process.
///
/// Returns `false` if an engine was already installed; the first one wins.
pub fn install_platform_bridge(bridge: Arc<dyn traits::PlatformBridge>) -> bool {
    let name = bridge.platform_name().to_owned();
    let installed = INSTALLED.set(bridge).is_ok();
    if installed {
        tracing::info!(platform = %name, "native ad engine installed");
    } else {
        tracing::warn!(platform = %name, "native ad engine already installed, ignoring");
    }
    installed
}

/// Retrieves the bridge implementation for the running platform.
pub fn platform_bridge() -> Arc<dyn traits::PlatformBridge> {
    match INSTALLED.get() {
        Some(bridge) => Arc::clone(bridge),
        None => Arc::new(stub::StubBridge),
    }
}

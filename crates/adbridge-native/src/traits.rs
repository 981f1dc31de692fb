// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native ad engine.
//
// The native SDK is opaque: it allocates ad objects, loads and renders them on
// its own threads, and reports progress through listener callbacks.  These
// traits describe exactly the surface the bridge relies on.

use std::sync::Arc;

use adbridge_core::error::Result;
use adbridge_core::types::{AdInfo, BannerSize, InitParams, LogLevel, NativeError, PrivacyFlags};

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge: NativeAdEngine + NativeSdk + Send + Sync {
    /// Human-readable platform name (e.g. "Android", "iOS").
    fn platform_name(&self) -> &str;

    /// Whether the native module is actually present in this build.
    fn is_available(&self) -> bool {
        true
    }
}

/// Listener capability set the native engine calls on every ad object.
///
/// Engines deliver callbacks serially from a single callback queue, never
/// from inside the `load`/`show` call that triggered them.
pub trait AdListener: Send + Sync {
    fn on_ad_loaded(&self, ad: AdInfo);
    fn on_ad_load_failed(&self, error: NativeError);
    fn on_ad_displayed(&self, ad: AdInfo);
    fn on_ad_display_failed(&self, error: NativeError);
    /// Fullscreen: the user dismissed the ad.  Views: the view left the screen.
    fn on_ad_hidden(&self, ad: AdInfo);
    fn on_ad_clicked(&self, ad: AdInfo);
    fn on_ad_impression(&self, ad: AdInfo);
    fn on_ad_revenue_paid(&self, ad: AdInfo);
    /// Rewarded only.
    fn on_user_rewarded(&self, ad: AdInfo);
    /// Views only.
    fn on_ad_expanded(&self, ad: AdInfo);
    /// Views only.
    fn on_ad_collapsed(&self, ad: AdInfo);
}

/// Listener handle shared between the bridge and the native object.
pub type SharedListener = Arc<dyn AdListener>;

/// Operations every native ad object supports.
pub trait NativeAd: Send {
    /// Request a creative.  Completion arrives through the listener.
    fn load(&mut self) -> Result<()>;

    /// Present the loaded creative.  Completion arrives through the listener.
    fn show(&mut self) -> Result<()>;

    /// Native readiness flag.
    fn is_ready(&self) -> bool;

    /// Release the native object.  Called exactly once.
    fn destroy(&mut self);
}

/// Inline ad views (banner, MREC, leaderboard).
pub trait NativeAdView: NativeAd {
    fn hide(&mut self) -> Result<()>;

    /// Let the engine reload and re-show periodically on its own cadence.
    fn start_auto_refresh(&mut self) -> Result<()>;

    fn stop_auto_refresh(&mut self) -> Result<()>;
}

/// Allocation of native ad objects.
pub trait NativeAdEngine {
    fn create_banner(
        &self,
        placement: &str,
        size: BannerSize,
        listener: SharedListener,
    ) -> Result<Box<dyn NativeAdView>>;

    fn create_interstitial(
        &self,
        placement: &str,
        listener: SharedListener,
    ) -> Result<Box<dyn NativeAd>>;

    fn create_rewarded(&self, placement: &str, listener: SharedListener)
    -> Result<Box<dyn NativeAd>>;
}

/// Completion callback for SDK initialization.
pub type InitCallback = Box<dyn FnOnce(std::result::Result<(), NativeError>) + Send>;

/// SDK-level settings, consent and targeting.  Direct passthroughs.
pub trait NativeSdk {
    /// Start the SDK.  `on_complete` is invoked exactly once.
    fn initialize(&self, params: &InitParams, on_complete: InitCallback);

    fn is_initialized(&self) -> bool;

    fn sdk_version(&self) -> String;

    fn set_logging_enabled(&self, enabled: bool) -> Result<()>;

    fn set_min_log_level(&self, level: LogLevel) -> Result<()>;

    /// Replace the SDK's consent flags with `privacy`.
    fn set_privacy(&self, privacy: &PrivacyFlags) -> Result<()>;

    fn set_hashed_user_id(&self, hashed_user_id: &str) -> Result<()>;

    fn set_user_key_value(&self, key: &str, value: &str) -> Result<()>;

    fn set_app_key_value(&self, key: &str, value: &str) -> Result<()>;

    fn set_bidder_key_value(&self, bidder: &str, key: &str, value: &str) -> Result<()>;

    /// Clear user, app and bidder key-values (the hashed user id survives).
    fn clear_all_key_values(&self) -> Result<()>;
}

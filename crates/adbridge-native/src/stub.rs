// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds where the native ad module is absent.
//
// Every operation returns `PlatformUnsupported` (or `false` / an empty value
// for queries); nothing panics.

use adbridge_core::error::{BridgeError, Result};
use adbridge_core::types::{BannerSize, InitParams, LogLevel, NativeError, PrivacyFlags};

use crate::traits::*;

/// No-op bridge returned when no native engine has been installed.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Unsupported (stub)"
    }

    fn is_available(&self) -> bool {
        false
    }
}

impl NativeAdEngine for StubBridge {
    fn create_banner(
        &self,
        placement: &str,
        _size: BannerSize,
        _listener: SharedListener,
    ) -> Result<Box<dyn NativeAdView>> {
        tracing::warn!(placement, "NativeAdEngine::create_banner called on stub bridge");
        Err(BridgeError::PlatformUnsupported)
    }

    fn create_interstitial(
        &self,
        placement: &str,
        _listener: SharedListener,
    ) -> Result<Box<dyn NativeAd>> {
        tracing::warn!(placement, "NativeAdEngine::create_interstitial called on stub bridge");
        Err(BridgeError::PlatformUnsupported)
    }

    fn create_rewarded(
        &self,
        placement: &str,
        _listener: SharedListener,
    ) -> Result<Box<dyn NativeAd>> {
        tracing::warn!(placement, "NativeAdEngine::create_rewarded called on stub bridge");
        Err(BridgeError::PlatformUnsupported)
    }
}

impl NativeSdk for StubBridge {
    fn initialize(&self, _params: &InitParams, on_complete: InitCallback) {
        tracing::warn!("NativeSdk::initialize called on stub bridge");
        on_complete(Err(NativeError::new(
            "PLATFORM_UNSUPPORTED",
            "Platform not supported",
        )));
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn sdk_version(&self) -> String {
        "Unknown".to_owned()
    }

    fn set_logging_enabled(&self, _enabled: bool) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn set_min_log_level(&self, _level: LogLevel) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn set_privacy(&self, _privacy: &PrivacyFlags) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn set_hashed_user_id(&self, _hashed_user_id: &str) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn set_user_key_value(&self, _key: &str, _value: &str) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn set_app_key_value(&self, _key: &str, _value: &str) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn set_bidder_key_value(&self, _bidder: &str, _key: &str, _value: &str) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }

    fn clear_all_key_values(&self) -> Result<()> {
        Err(BridgeError::PlatformUnsupported)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the AdBridge ad SDK bridge.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Caller-chosen identifier scoping one ad object's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdId(String);

impl AdId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for callers that only supplied a placement.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AdId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for AdId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for AdId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ad formats supported by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdFormat {
    Banner,
    #[serde(rename = "MREC")]
    Mrec,
    Interstitial,
    Rewarded,
}

impl AdFormat {
    /// Banner and MREC are inline views whose visibility the bridge controls.
    pub fn is_view(&self) -> bool {
        matches!(self, Self::Banner | Self::Mrec)
    }

    /// Interstitial and rewarded ads take over the screen until closed.
    pub fn is_fullscreen(&self) -> bool {
        !self.is_view()
    }

    /// Whether an operation aimed at `self` may be applied to an ad of `actual`.
    ///
    /// The banner operation family covers both inline view formats.
    pub fn accepts(&self, actual: AdFormat) -> bool {
        match self {
            Self::Banner | Self::Mrec => actual.is_view(),
            other => *other == actual,
        }
    }

    /// Prefix used in event wire names (`onBannerLoaded`, `onMRECLoaded`, ...).
    pub fn wire_prefix(&self) -> &'static str {
        match self {
            Self::Banner => "Banner",
            Self::Mrec => "MREC",
            Self::Interstitial => "Interstitial",
            Self::Rewarded => "Rewarded",
        }
    }

    pub const ALL: [AdFormat; 4] = [Self::Banner, Self::Mrec, Self::Interstitial, Self::Rewarded];
}

impl std::fmt::Display for AdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_prefix())
    }
}

/// Physical size of an inline ad view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BannerSize {
    /// 320x50.
    #[default]
    #[serde(rename = "BANNER")]
    Standard,
    /// 300x250 medium rectangle.
    #[serde(rename = "MREC")]
    Mrec,
    /// 728x90.
    #[serde(rename = "LEADERBOARD")]
    Leaderboard,
}

impl BannerSize {
    /// Ad format the view is tracked under. Leaderboards are banners.
    pub fn format(&self) -> AdFormat {
        match self {
            Self::Standard | Self::Leaderboard => AdFormat::Banner,
            Self::Mrec => AdFormat::Mrec,
        }
    }

    /// Parse the scripting-side size keyword (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "BANNER" => Some(Self::Standard),
            "MREC" => Some(Self::Mrec),
            "LEADERBOARD" => Some(Self::Leaderboard),
            _ => None,
        }
    }

    /// Dimensions in density-independent points (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Standard => (320, 50),
            Self::Mrec => (300, 250),
            Self::Leaderboard => (728, 90),
        }
    }
}

/// Lifecycle states of an ad instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdState {
    /// Native object allocated, nothing requested yet.
    Created,
    /// Load requested, waiting for the native callback.
    Loading,
    /// Creative available.
    Loaded,
    /// Last load attempt failed; a new load may be requested.
    LoadFailed,
    /// Show requested, waiting for the native displayed callback.
    Showing,
    /// On screen.
    Shown,
    /// Inline view hidden by the caller; may be shown again.
    Hidden,
    /// Fullscreen ad dismissed by the user.
    Closed,
    /// Terminal.
    Destroyed,
}

impl AdState {
    /// On screen or about to be.
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Showing | Self::Shown)
    }
}

/// Metadata the native engine attaches to ad callbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdInfo {
    pub placement_name: String,
    pub placement_id: String,
    pub bidder_name: String,
    pub external_placement_id: String,
    /// Revenue reported by the winning bidder, in USD.
    pub revenue: f64,
}

/// An error reported by the native engine, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct NativeError {
    /// Stable code as named by the native SDK (e.g. `NO_FILL`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl NativeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Ad-serving backend selected at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    /// Parse the scripting-side environment name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Minimum severity the native SDK writes to the device log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Verbose,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "VERBOSE" => Some(Self::Verbose),
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Consent and regulatory flags forwarded to the native SDK.
///
/// `None` means the flag was never set and the SDK default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacyFlags {
    /// GDPR consent.
    pub is_user_consent: Option<bool>,
    /// COPPA.
    pub is_age_restricted_user: Option<bool>,
    /// CCPA "do not sell".
    pub is_do_not_sell: Option<bool>,
    pub ccpa_privacy_string: Option<String>,
    pub gpp_string: Option<String>,
    pub gpp_section_ids: Vec<u32>,
}

/// Everything the native SDK needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    pub app_key: String,
    pub hashed_user_id: Option<String>,
    pub environment: Environment,
}

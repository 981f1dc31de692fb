// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loosely-typed inputs from the scripting runtime and their normalization.
//
// Scripts may pass either a bare placement name or a structured config
// object.  A bare name gets a freshly generated ad id.

use adbridge_core::config::SdkConfig;
use adbridge_core::error::{BridgeError, Result};
use adbridge_core::types::{AdFormat, AdId, BannerSize};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structured ad-creation config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdConfig {
    pub placement: String,
    #[serde(default)]
    pub ad_id: Option<String>,
    /// `BANNER`, `MREC` or `LEADERBOARD`.
    #[serde(default)]
    pub banner_size: Option<String>,
}

/// Either form a script may pass to a `create*` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdRequest {
    Placement(String),
    Config(AdConfig),
}

impl From<&str> for AdRequest {
    fn from(placement: &str) -> Self {
        Self::Placement(placement.to_owned())
    }
}

impl From<String> for AdRequest {
    fn from(placement: String) -> Self {
        Self::Placement(placement)
    }
}

impl From<AdConfig> for AdRequest {
    fn from(config: AdConfig) -> Self {
        Self::Config(config)
    }
}

/// A request after validation, ready for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub id: AdId,
    pub placement: String,
    pub format: AdFormat,
    /// Present for inline views only.
    pub size: Option<BannerSize>,
}

impl AdRequest {
    /// Validate against the format family the caller asked for.
    ///
    /// For the banner family the size decides the concrete format, so
    /// `createBanner({bannerSize: "MREC"})` yields an MREC view.
    pub fn normalize(self, requested: AdFormat) -> Result<NormalizedRequest> {
        let config = match self {
            Self::Placement(placement) => AdConfig {
                placement,
                ..AdConfig::default()
            },
            Self::Config(config) => config,
        };

        let placement = config.placement.trim();
        if placement.is_empty() {
            return Err(BridgeError::InvalidConfig(
                "placement must not be empty".into(),
            ));
        }

        let id = match config.ad_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => AdId::new(id),
            _ => AdId::generate(),
        };

        let size = if requested.is_view() {
            let size = match config.banner_size.as_deref() {
                Some(raw) => BannerSize::parse(raw).ok_or_else(|| {
                    BridgeError::InvalidConfig(format!("unknown banner size '{raw}'"))
                })?,
                None if requested == AdFormat::Mrec => BannerSize::Mrec,
                None => BannerSize::Standard,
            };
            Some(size)
        } else {
            if let Some(raw) = &config.banner_size {
                debug!(size = %raw, format = %requested, "banner size ignored for fullscreen ad");
            }
            None
        };

        Ok(NormalizedRequest {
            id,
            placement: placement.to_owned(),
            format: size.map_or(requested, |s| s.format()),
            size,
        })
    }
}

/// Argument to `initialize`: a bare app key or a full config object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitInput {
    AppKey(String),
    Config(SdkConfig),
}

impl From<&str> for InitInput {
    fn from(app_key: &str) -> Self {
        Self::AppKey(app_key.to_owned())
    }
}

impl From<String> for InitInput {
    fn from(app_key: String) -> Self {
        Self::AppKey(app_key)
    }
}

impl From<SdkConfig> for InitInput {
    fn from(config: SdkConfig) -> Self {
        Self::Config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_placement_gets_generated_id() {
        let a = AdRequest::from("home").normalize(AdFormat::Interstitial).expect("a");
        let b = AdRequest::from("home").normalize(AdFormat::Interstitial).expect("b");
        assert_eq!(a.placement, "home");
        assert_ne!(a.id, b.id);
        assert_eq!(a.size, None);
        assert_eq!(a.format, AdFormat::Interstitial);
    }

    #[test]
    fn structured_config_deserializes_from_json() {
        let req: AdRequest = serde_json::from_str(
            r#"{ "placement": "home_banner", "adId": "b1", "bannerSize": "leaderboard" }"#,
        )
        .expect("parse");
        let norm = req.normalize(AdFormat::Banner).expect("normalize");
        assert_eq!(norm.id.as_str(), "b1");
        assert_eq!(norm.size, Some(BannerSize::Leaderboard));
        assert_eq!(norm.format, AdFormat::Banner);

        let bare: AdRequest = serde_json::from_str(r#""inter_main""#).expect("parse");
        assert_eq!(bare, AdRequest::Placement("inter_main".into()));
    }

    #[test]
    fn banner_size_selects_view_format() {
        let req = AdRequest::Config(AdConfig {
            placement: "p".into(),
            ad_id: Some("m1".into()),
            banner_size: Some("MREC".into()),
        });
        let norm = req.normalize(AdFormat::Banner).expect("normalize");
        assert_eq!(norm.format, AdFormat::Mrec);

        let mrec = AdRequest::from("p").normalize(AdFormat::Mrec).expect("mrec");
        assert_eq!(mrec.size, Some(BannerSize::Mrec));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let empty = AdRequest::from("  ").normalize(AdFormat::Banner).unwrap_err();
        assert_eq!(empty.code(), "INVALID_CONFIG");

        let bad_size = AdRequest::Config(AdConfig {
            placement: "p".into(),
            ad_id: None,
            banner_size: Some("HUGE".into()),
        })
        .normalize(AdFormat::Banner)
        .unwrap_err();
        assert_eq!(bad_size.code(), "INVALID_CONFIG");
    }

    #[test]
    fn blank_ad_id_is_replaced() {
        let norm = AdRequest::Config(AdConfig {
            placement: "p".into(),
            ad_id: Some("   ".into()),
            banner_size: None,
        })
        .normalize(AdFormat::Rewarded)
        .expect("normalize");
        assert!(!norm.id.as_str().trim().is_empty());
    }

    #[test]
    fn init_input_accepts_key_or_object() {
        let key: InitInput = serde_json::from_str(r#""app-key""#).expect("key");
        assert_eq!(key, InitInput::AppKey("app-key".into()));

        let config: InitInput =
            serde_json::from_str(r#"{ "appKey": "k", "environment": "staging" }"#).expect("cfg");
        match config {
            InitInput::Config(cfg) => assert_eq!(cfg.app_key, "k"),
            other => panic!("expected config, got {other:?}"),
        }
    }
}

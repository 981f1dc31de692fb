// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SDK configuration.
//
// The bridge itself only needs a handful of key/value inputs at
// initialization.  They can come from a JSON file shipped with the app, from
// environment variables (handy for CI and the demo), or both.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::types::{Environment, InitParams, LogLevel, PrivacyFlags};

/// Environment variable holding the app key.
pub const ENV_APP_KEY: &str = "ADBRIDGE_APP_KEY";
/// Environment variable selecting the backend (`dev`, `staging`, `production`).
pub const ENV_ENVIRONMENT: &str = "ADBRIDGE_ENVIRONMENT";
/// Environment variable toggling native SDK logging (`1`/`true`).
pub const ENV_LOGGING: &str = "ADBRIDGE_LOGGING";

/// Settings applied to the native SDK before and during initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SdkConfig {
    /// App key issued by the ad-serving backend.
    pub app_key: String,
    /// Pre-hashed user identifier for targeting.
    pub hashed_user_id: Option<String>,
    pub environment: Environment,
    /// Native SDK logging (does not affect bridge `tracing` output).
    pub logging_enabled: bool,
    pub min_log_level: LogLevel,
    pub privacy: PrivacyFlags,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            hashed_user_id: None,
            environment: Environment::Production,
            logging_enabled: false,
            min_log_level: LogLevel::Debug,
            privacy: PrivacyFlags::default(),
        }
    }
}

impl SdkConfig {
    /// Load a JSON config file.  Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(key) = lookup(ENV_APP_KEY) {
            self.app_key = key;
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            self.environment = Environment::parse(&env).ok_or_else(|| {
                BridgeError::InvalidConfig(format!("unknown environment '{env}'"))
            })?;
        }
        if let Some(flag) = lookup(ENV_LOGGING) {
            self.logging_enabled = matches!(flag.trim(), "1" | "true" | "TRUE" | "yes");
        }
        Ok(self)
    }

    /// Parameters for the native initialization call.
    pub fn init_params(&self) -> Result<InitParams> {
        if self.app_key.trim().is_empty() {
            return Err(BridgeError::InvalidConfig("app key must not be empty".into()));
        }
        Ok(InitParams {
            app_key: self.app_key.clone(),
            hashed_user_id: self.hashed_user_id.clone(),
            environment: self.environment,
        })
    }
}

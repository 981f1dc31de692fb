// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outcome payloads returned to the scripting runtime.

use adbridge_core::error::BridgeError;
use adbridge_core::types::AdId;
use serde::Serialize;
use thiserror::Error;

/// Rejected outcome, serialized as `{code, message, nativeCode?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct BridgeFailure {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_code: Option<String>,
}

impl BridgeFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            native_code: None,
        }
    }

    pub fn platform_unsupported() -> Self {
        BridgeError::PlatformUnsupported.into()
    }
}

impl From<BridgeError> for BridgeFailure {
    fn from(err: BridgeError) -> Self {
        Self {
            code: err.code().to_owned(),
            native_code: err.native_code().map(str::to_owned),
            message: err.to_string(),
        }
    }
}

pub type FacadeResult<T> = std::result::Result<T, BridgeFailure>;

/// Resolved `create*` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCreated {
    pub success: bool,
    pub ad_id: AdId,
    pub placement: String,
}

/// Resolved `load*` / `show*` / `hide*` / `destroy*` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpResult {
    pub success: bool,
    pub ad_id: AdId,
}

impl OpResult {
    pub fn ok(ad_id: &AdId) -> Self {
        Self {
            success: true,
            ad_id: ad_id.clone(),
        }
    }
}

/// Resolved `initialize` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitResult {
    pub success: bool,
    pub message: String,
}

impl InitResult {
    pub fn initialized() -> Self {
        Self {
            success: true,
            message: "SDK initialized".to_owned(),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            success: false,
            message: "Platform not supported".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbridge_core::types::NativeError;

    #[test]
    fn failure_carries_native_code_verbatim() {
        let failure = BridgeFailure::from(BridgeError::NativeOperationFailed(NativeError::new(
            "NO_FILL", "no ads",
        )));
        assert_eq!(failure.code, "NATIVE_OPERATION_FAILED");
        assert_eq!(failure.native_code.as_deref(), Some("NO_FILL"));

        let json = serde_json::to_value(&failure).expect("serialize");
        assert_eq!(json["nativeCode"], "NO_FILL");
    }

    #[test]
    fn failure_omits_absent_native_code() {
        let failure = BridgeFailure::from(BridgeError::NotFound("x".into()));
        let json = serde_json::to_value(&failure).expect("serialize");
        assert_eq!(json["code"], "AD_NOT_FOUND");
        assert!(json.get("nativeCode").is_none());
        assert_eq!(failure.to_string(), "AD_NOT_FOUND: ad instance not found for adId: x");
    }

    #[test]
    fn payloads_use_camel_case() {
        let created = AdCreated {
            success: true,
            ad_id: "b1".into(),
            placement: "home".into(),
        };
        let json = serde_json::to_value(&created).expect("serialize");
        assert_eq!(json["adId"], "b1");
        assert_eq!(
            serde_json::to_value(InitResult::unsupported()).expect("serialize")["message"],
            "Platform not supported"
        );
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for AdBridge.

use thiserror::Error;

use crate::types::{AdFormat, AdId, AdState, NativeError};

/// Top-level error type for all AdBridge operations.
///
/// Every variant maps to a stable string code (see [`BridgeError::code`])
/// that is what scripting callers actually match on.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Lifecycle errors --
    #[error("ad id {0} is already in use by a live ad")]
    DuplicateId(AdId),

    #[error("ad instance not found for adId: {0}")]
    NotFound(AdId),

    #[error("ad {id} is a {actual} ad, not a {expected} ad")]
    InvalidAdType {
        id: AdId,
        expected: AdFormat,
        actual: AdFormat,
    },

    #[error("ad {id} cannot {operation} while {state:?}")]
    NotReady {
        id: AdId,
        operation: &'static str,
        state: AdState,
    },

    // -- Native engine errors --
    #[error("failed to create ad: {0}")]
    NativeAllocationFailed(NativeError),

    #[error("native SDK error: {0}")]
    NativeOperationFailed(NativeError),

    #[error("ad SDK not available on this platform")]
    PlatformUnsupported,

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Stable code reported to scripting callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "DUPLICATE_AD_ID",
            Self::NotFound(_) => "AD_NOT_FOUND",
            Self::InvalidAdType { .. } => "INVALID_AD_TYPE",
            Self::NotReady { .. } => "AD_NOT_READY",
            Self::NativeAllocationFailed(_) => "AD_CREATION_FAILED",
            Self::NativeOperationFailed(_) => "NATIVE_OPERATION_FAILED",
            Self::PlatformUnsupported => "PLATFORM_UNSUPPORTED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Native SDK code, verbatim, when the native engine reported the error.
    pub fn native_code(&self) -> Option<&str> {
        match self {
            Self::NativeAllocationFailed(e) | Self::NativeOperationFailed(e) => Some(&e.code),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

// ABOUTME: Unified error taxonomy for the auth core with stable serialized codes
// ABOUTME: Leaf failures are translated here before they reach observable state
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Unified Error Handling
//!
//! Every failure the auth core can surface maps to one of four conditions.
//! Session store and tenant directory errors are caught at the orchestrator
//! boundary and translated into state plus an optional user notice; they are
//! never allowed to escape raw into the UI layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the auth core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Identity provider or tenant directory unreachable or rejecting
    #[serde(rename = "TRANSPORT_ERROR")]
    TransportError,
    /// Explicit clinic selection named an id outside the available set
    #[serde(rename = "TENANT_NOT_AVAILABLE")]
    TenantNotAvailable,
    /// Persisted clinic selection could not be parsed
    #[serde(rename = "CORRUPT_CACHE")]
    CorruptCache,
    /// Identity provider rejected or failed the sign-out call
    #[serde(rename = "LOGOUT_FAILURE")]
    LogoutFailure,
}

impl ErrorCode {
    /// Stable string form matching the serialized representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransportError => "TRANSPORT_ERROR",
            Self::TenantNotAvailable => "TENANT_NOT_AVAILABLE",
            Self::CorruptCache => "CORRUPT_CACHE",
            Self::LogoutFailure => "LOGOUT_FAILURE",
        }
    }

    /// Whether this condition should be shown to the user.
    ///
    /// A corrupt cache entry is silently treated as absence; everything else
    /// warrants a visible, non-fatal message.
    #[must_use]
    pub const fn is_user_visible(self) -> bool {
        !matches!(self, Self::CorruptCache)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed errors produced by the auth core
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Identity provider or tenant directory unreachable/rejecting.
    /// Distinct from an empty tenant set: a fetch failure must never be
    /// treated as "user has no clinics".
    #[error("transport failure talking to {service}: {message}")]
    Transport {
        /// Which external collaborator failed
        service: &'static str,
        /// Underlying failure description
        message: String,
    },

    /// `select_tenant` named a clinic id absent from the current set.
    /// Recoverable by retrying with a valid id; state is unchanged.
    #[error("clinic {tenant_id} is not available to the current user")]
    TenantNotAvailable {
        /// The id that was requested
        tenant_id: Uuid,
    },

    /// Persisted selection was present but unparseable
    #[error("persisted clinic selection is corrupt")]
    CorruptCache,

    /// Sign-out call failed at the identity provider
    #[error("sign-out failed: {message}")]
    LogoutFailure {
        /// Underlying failure description
        message: String,
    },
}

impl AuthError {
    /// Build a transport error for the identity provider
    pub fn identity_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service: "identity provider",
            message: err.to_string(),
        }
    }

    /// Build a transport error for the tenant directory
    pub fn directory_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service: "tenant directory",
            message: err.to_string(),
        }
    }

    /// Map to the stable error code
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::TransportError,
            Self::TenantNotAvailable { .. } => ErrorCode::TenantNotAvailable,
            Self::CorruptCache => ErrorCode::CorruptCache,
            Self::LogoutFailure { .. } => ErrorCode::LogoutFailure,
        }
    }
}

/// Convenience result type for auth core operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip_through_serde() {
        for code in [
            ErrorCode::TransportError,
            ErrorCode::TenantNotAvailable,
            ErrorCode::CorruptCache,
            ErrorCode::LogoutFailure,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn corrupt_cache_is_never_user_visible() {
        assert!(!ErrorCode::CorruptCache.is_user_visible());
        assert!(ErrorCode::TransportError.is_user_visible());
        assert!(ErrorCode::LogoutFailure.is_user_visible());
    }

    #[test]
    fn transport_error_names_the_failing_service() {
        let err = AuthError::directory_transport("connection refused");
        assert_eq!(err.code(), ErrorCode::TransportError);
        assert!(err.to_string().contains("tenant directory"));
    }
}

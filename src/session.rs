// ABOUTME: Session store contract over the external identity provider
// ABOUTME: Exposes the current session snapshot plus a broadcast of lifecycle events
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Session Store
//!
//! A single process-wide subscription to the identity provider's session
//! lifecycle. Purely observational: the store has no side effects of its own
//! beyond forwarding `sign_out` to the provider.
//!
//! Implementations wrap the hosted identity SDK; tests substitute the fake in
//! [`crate::test_utils`].

use crate::errors::AuthResult;
use crate::models::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Session lifecycle event kinds emitted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// A user completed login
    #[serde(rename = "SIGNED_IN")]
    SignedIn,
    /// The session ended: explicit logout or external expiry
    #[serde(rename = "SIGNED_OUT")]
    SignedOut,
    /// The credential was replaced wholesale on refresh
    #[serde(rename = "TOKEN_REFRESHED")]
    TokenRefreshed,
}

/// One session lifecycle event: the kind plus the session after the event
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// What happened
    pub kind: SessionEventKind,
    /// The session in effect after this event (`None` for sign-out)
    pub session: Option<Session>,
}

impl SessionEvent {
    /// Build a signed-in or token-refreshed event
    #[must_use]
    pub const fn with_session(kind: SessionEventKind, session: Session) -> Self {
        Self {
            kind,
            session: Some(session),
        }
    }

    /// Build a signed-out event
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            kind: SessionEventKind::SignedOut,
            session: None,
        }
    }
}

/// Contract over the external identity provider.
///
/// `subscribe` hands out independent receivers; each subscriber sees every
/// event in arrival order. Receivers must be dropped on teardown so no
/// listener leaks across orchestrator restarts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Session snapshot at call time; `Ok(None)` means logged out
    async fn current_session(&self) -> AuthResult<Option<Session>>;

    /// Subscribe to session lifecycle events
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Ask the provider to end the session. A successful call is expected to
    /// be followed by a `SignedOut` event on the subscription channel.
    async fn sign_out(&self) -> AuthResult<()>;
}

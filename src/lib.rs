// ABOUTME: Main library entry point for the ClinicFlow auth/session/tenant core
// ABOUTME: Exposes the orchestrator state machine, route guard, and collaborator contracts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ClinicFlow

#![deny(unsafe_code)]

//! # ClinicFlow Auth Core
//!
//! The client-side authentication, session, and clinic-resolution core of the
//! ClinicFlow CRM. The hosted identity provider, the tenant directory, and
//! durable local storage are opaque collaborators behind narrow traits; this
//! crate owns the state machine between them.
//!
//! ## Architecture
//!
//! - **[`session`]**: contract over the identity provider's session lifecycle
//! - **[`tenant`]**: resolution of the clinics a user may act within
//! - **[`cache`]**: durable single-slot storage of the chosen clinic
//! - **[`orchestrator`]**: the state machine composing the three into one
//!   observable [`models::AuthState`]
//! - **[`guard`]**: pure routing decisions over that state
//!
//! ## Example
//!
//! ```rust,no_run
//! use clinicflow_auth::cache::MemoryStorage;
//! use clinicflow_auth::config::OrchestratorConfig;
//! use clinicflow_auth::orchestrator::AuthOrchestrator;
//! use clinicflow_auth::test_utils::{FakeSessionStore, FakeTenantDirectory};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let orchestrator = AuthOrchestrator::new(
//!         Arc::new(FakeSessionStore::new()),
//!         Arc::new(FakeTenantDirectory::new()),
//!         Arc::new(MemoryStorage::new()),
//!         OrchestratorConfig::from_env(),
//!     );
//!     orchestrator.start().await;
//!
//!     let guard = orchestrator.route_guard();
//!     let decision = guard.decide(&orchestrator.state(), "/dashboard");
//!     println!("{decision:?}");
//! }
//! ```

/// Durable single-slot cache for the clinic selection
pub mod cache;

/// Environment-driven route policy and orchestrator configuration
pub mod config;

/// Application constants organized by domain
pub mod constants;

/// Unified error taxonomy with stable serialized codes
pub mod errors;

/// Pure route guard over the observable auth state
pub mod guard;

/// Structured logging setup for embedding applications
pub mod logging;

/// Core data model: sessions, clinics, and the observable auth state
pub mod models;

/// The auth orchestrator state machine
pub mod orchestrator;

/// Session store contract over the identity provider
pub mod session;

/// Tenant directory contract and clinic resolution
pub mod tenant;

/// Injectable fakes for tests and local development
pub mod test_utils;

pub use cache::{FileStorage, MemoryStorage, NullStorage, SelectionStorage, TenantSelectionCache};
pub use config::{OrchestratorConfig, RoutePolicy};
pub use errors::{AuthError, AuthResult, ErrorCode};
pub use guard::{RouteDecision, RouteGuard};
pub use models::{AuthPhase, AuthState, Session, Tenant, TenantSet};
pub use orchestrator::{AuthNotice, AuthOrchestrator, NavigationIntent};
pub use session::{SessionEvent, SessionEventKind, SessionStore};
pub use tenant::{RoleAssignment, TenantDirectory, TenantRecord, TenantResolver};

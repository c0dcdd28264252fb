// ABOUTME: Core data structures for sessions, clinics, and the observable auth state
// ABOUTME: TenantSet is a tagged three-variant type so loading and empty never conflate
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Auth Core Data Model
//!
//! [`AuthState`] is the single source of truth the rest of the client
//! observes. It has exactly one writer (the orchestrator) and any number of
//! readers; readers switch on [`AuthState::phase`] rather than poking at
//! individual fields.

use crate::constants::permissions;
use crate::errors::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proof of authenticated identity, opaque beyond presence and a user id.
///
/// Sessions are replaced wholesale on token refresh; they are never mutated
/// in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Authenticated user id
    pub user_id: Uuid,
    /// Opaque credential issued by the identity provider
    pub access_token: String,
    /// Expiry hint, if the provider supplied one
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session snapshot
    #[must_use]
    pub const fn new(user_id: Uuid, access_token: String) -> Self {
        Self {
            user_id,
            access_token,
            expires_at: None,
        }
    }
}

/// A clinic as visible to one user: identity plus that user's role strength.
///
/// `permission_level` is scoped to the (user, clinic) pair, not global to the
/// clinic. Instances are immutable snapshots from a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique clinic identifier
    pub id: Uuid,
    /// Display name shown in the clinic picker and header
    pub display_name: String,
    /// Short code the clinic uses when authorizing external integrations
    pub auth_code: String,
    /// Role strength of the current user within this clinic
    pub permission_level: i32,
}

impl Tenant {
    /// Whether the user can manage this clinic (users, settings)
    #[must_use]
    pub const fn can_manage(&self) -> bool {
        self.permission_level >= permissions::MANAGER
    }
}

/// The set of clinics the current user may act within right now.
///
/// Three states that must never be conflated: resolution not finished yet,
/// resolved to nothing, and resolved to one or more clinics. Collapsing these
/// into a nullable list is the classic source of redirect bugs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TenantSet {
    /// Not yet resolved: resolution in flight or not started
    #[default]
    Unknown,
    /// Resolved; the user has zero active clinics
    Empty,
    /// Resolved; one or more clinics available
    Populated(Vec<Tenant>),
}

impl TenantSet {
    /// Whether a resolution pass has produced a terminal answer
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Look up a clinic by id in the resolved set
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Tenant> {
        match self {
            Self::Populated(tenants) => tenants.iter().find(|t| t.id == id),
            Self::Unknown | Self::Empty => None,
        }
    }

    /// Membership test by id
    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Resolved clinics, empty for `Unknown` and `Empty`
    #[must_use]
    pub fn as_slice(&self) -> &[Tenant] {
        match self {
            Self::Populated(tenants) => tenants,
            Self::Unknown | Self::Empty => &[],
        }
    }
}

/// Named machine states derived from the aggregate, consumed by the route
/// guard and by UI switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Initial boot: no session yet and the first pass has not finished
    Bootstrapping,
    /// Terminal: no session
    Unauthenticated,
    /// Session present, clinic resolution in flight
    ResolvingTenants,
    /// Session present, user has zero active clinics
    NoTenants,
    /// Session present, several clinics, none chosen yet
    AwaitingSelection,
    /// Session and selected clinic both present
    Ready,
}

/// The aggregate auth state observed by the rest of the application.
///
/// Invariants, enforced by the orchestrator as the sole writer:
/// - `is_loading` covers a whole resolution pass; observers never see a
///   half-updated pass.
/// - `session == None` implies `available_tenants == Unknown` and
///   `selected_tenant == None`; no clinic data leaks across a logged-out
///   boundary.
/// - `selected_tenant` is only ever auto-populated under the single-clinic
///   rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    /// Current session, if any
    pub session: Option<Session>,
    /// Clinics the user may act within
    pub available_tenants: TenantSet,
    /// The clinic the user is acting within, if chosen
    pub selected_tenant: Option<Tenant>,
    /// Whether a resolution pass is in flight
    pub is_loading: bool,
    /// Error surfaced by the most recent pass, if any
    pub last_error: Option<ErrorCode>,
}

impl AuthState {
    /// State at process start, before the first resolution pass settles
    #[must_use]
    pub const fn bootstrapping() -> Self {
        Self {
            session: None,
            available_tenants: TenantSet::Unknown,
            selected_tenant: None,
            is_loading: true,
            last_error: None,
        }
    }

    /// Terminal logged-out state, with an optional surfaced error
    #[must_use]
    pub const fn signed_out(last_error: Option<ErrorCode>) -> Self {
        Self {
            session: None,
            available_tenants: TenantSet::Unknown,
            selected_tenant: None,
            is_loading: false,
            last_error,
        }
    }

    /// Derive the named machine state
    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match (&self.session, self.is_loading) {
            (None, true) => AuthPhase::Bootstrapping,
            (None, false) => AuthPhase::Unauthenticated,
            (Some(_), true) => AuthPhase::ResolvingTenants,
            (Some(_), false) => match &self.available_tenants {
                // A settled pass always resolves the set; Unknown here means
                // an event is about to re-enter the machine.
                TenantSet::Unknown => AuthPhase::ResolvingTenants,
                TenantSet::Empty => AuthPhase::NoTenants,
                TenantSet::Populated(_) => {
                    if self.selected_tenant.is_some() {
                        AuthPhase::Ready
                    } else {
                        AuthPhase::AwaitingSelection
                    }
                }
            },
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::bootstrapping()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tenant(n: u128, name: &str) -> Tenant {
        Tenant {
            id: Uuid::from_u128(n),
            display_name: name.to_owned(),
            auth_code: format!("AC-{n}"),
            permission_level: permissions::STAFF,
        }
    }

    #[test]
    fn tenant_set_distinguishes_unknown_from_empty() {
        assert!(!TenantSet::Unknown.is_resolved());
        assert!(TenantSet::Empty.is_resolved());
        assert!(TenantSet::Populated(vec![tenant(1, "A")]).is_resolved());
    }

    #[test]
    fn tenant_set_lookup_by_id() {
        let set = TenantSet::Populated(vec![tenant(1, "A"), tenant(2, "B")]);
        assert!(set.contains(Uuid::from_u128(2)));
        assert!(!set.contains(Uuid::from_u128(3)));
        assert_eq!(set.get(Uuid::from_u128(1)).unwrap().display_name, "A");
    }

    #[test]
    fn phase_derivation_covers_the_machine() {
        assert_eq!(AuthState::bootstrapping().phase(), AuthPhase::Bootstrapping);
        assert_eq!(
            AuthState::signed_out(None).phase(),
            AuthPhase::Unauthenticated
        );

        let session = Session::new(Uuid::from_u128(7), "tok".to_owned());
        let mut state = AuthState {
            session: Some(session),
            available_tenants: TenantSet::Unknown,
            selected_tenant: None,
            is_loading: true,
            last_error: None,
        };
        assert_eq!(state.phase(), AuthPhase::ResolvingTenants);

        state.is_loading = false;
        state.available_tenants = TenantSet::Empty;
        assert_eq!(state.phase(), AuthPhase::NoTenants);

        state.available_tenants = TenantSet::Populated(vec![tenant(1, "A"), tenant(2, "B")]);
        assert_eq!(state.phase(), AuthPhase::AwaitingSelection);

        state.selected_tenant = Some(tenant(1, "A"));
        assert_eq!(state.phase(), AuthPhase::Ready);
    }

    #[test]
    fn manager_level_can_manage() {
        let mut t = tenant(1, "A");
        assert!(!t.can_manage());
        t.permission_level = permissions::MANAGER;
        assert!(t.can_manage());
    }
}

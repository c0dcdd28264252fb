// ABOUTME: Pure route guard deciding allow/defer/redirect from the observable auth state
// ABOUTME: Content-level not-found handling is deliberately outside its job
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Route Guard
//!
//! A pure function of ([`AuthState`], requested path). It never mutates
//! state and never navigates by itself; callers translate the returned
//! decision into router calls.
//!
//! While a resolution pass is loading, every non-placeholder request is
//! deferred rather than redirected, so transient loading can never cause
//! redirect thrashing. Unknown paths under the protected namespace are
//! allowed when `Ready`: rendering a not-found leaf is a content decision,
//! not an auth decision.

use crate::config::RoutePolicy;
use crate::models::{AuthPhase, AuthState};

/// Outcome of a guard decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested path
    Allow,
    /// No decision yet; keep the current view until loading settles
    Defer,
    /// Navigate to the given path instead
    Redirect(String),
}

/// Route guard bound to one route policy
#[derive(Debug, Clone)]
pub struct RouteGuard {
    policy: RoutePolicy,
}

impl RouteGuard {
    /// Guard over a route policy
    #[must_use]
    pub const fn new(policy: RoutePolicy) -> Self {
        Self { policy }
    }

    /// The policy this guard decides with
    #[must_use]
    pub const fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Decide what to do with a navigation attempt at `requested_path`
    #[must_use]
    pub fn decide(&self, state: &AuthState, requested_path: &str) -> RouteDecision {
        let policy = &self.policy;
        match state.phase() {
            AuthPhase::Bootstrapping | AuthPhase::ResolvingTenants => {
                if policy.is_loading(requested_path) {
                    RouteDecision::Allow
                } else {
                    RouteDecision::Defer
                }
            }
            AuthPhase::Unauthenticated => {
                if policy.is_login(requested_path) || policy.is_public(requested_path) {
                    RouteDecision::Allow
                } else {
                    RouteDecision::Redirect(policy.login_path.clone())
                }
            }
            AuthPhase::NoTenants | AuthPhase::AwaitingSelection => {
                if policy.is_picker(requested_path) || policy.is_public(requested_path) {
                    RouteDecision::Allow
                } else {
                    // Login included: an authenticated user belongs at the
                    // picker, not the login form.
                    RouteDecision::Redirect(policy.select_clinic_path.clone())
                }
            }
            AuthPhase::Ready => {
                if policy.is_login(requested_path) {
                    return RouteDecision::Redirect(policy.dashboard_path.clone());
                }
                if policy.is_admin_path(requested_path)
                    && !state.selected_tenant.as_ref().is_some_and(|t| t.can_manage())
                {
                    return RouteDecision::Redirect(policy.dashboard_path.clone());
                }
                RouteDecision::Allow
            }
        }
    }
}

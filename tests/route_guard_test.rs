// ABOUTME: Unit tests for the pure route guard decision function
// ABOUTME: Exercises every phase against login, public, picker, and protected paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ClinicFlow

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use clinicflow_auth::config::RoutePolicy;
use clinicflow_auth::constants::permissions;
use clinicflow_auth::guard::{RouteDecision, RouteGuard};
use clinicflow_auth::models::{AuthState, Session, Tenant, TenantSet};
use uuid::Uuid;

fn guard() -> RouteGuard {
    RouteGuard::new(RoutePolicy::default())
}

fn tenant(level: i32) -> Tenant {
    Tenant {
        id: Uuid::from_u128(1),
        display_name: "Clinic A".to_owned(),
        auth_code: "AC-0001".to_owned(),
        permission_level: level,
    }
}

fn session() -> Session {
    Session::new(Uuid::from_u128(7), "tok".to_owned())
}

fn ready_state(level: i32) -> AuthState {
    AuthState {
        session: Some(session()),
        available_tenants: TenantSet::Populated(vec![tenant(level)]),
        selected_tenant: Some(tenant(level)),
        is_loading: false,
        last_error: None,
    }
}

fn awaiting_state() -> AuthState {
    AuthState {
        session: Some(session()),
        available_tenants: TenantSet::Populated(vec![
            tenant(permissions::STAFF),
            Tenant {
                id: Uuid::from_u128(2),
                display_name: "Clinic B".to_owned(),
                auth_code: "AC-0002".to_owned(),
                permission_level: permissions::STAFF,
            },
        ]),
        selected_tenant: None,
        is_loading: false,
        last_error: None,
    }
}

#[test]
fn loading_defers_everything_but_the_placeholder() {
    let state = AuthState::bootstrapping();
    assert_eq!(guard().decide(&state, "/loading"), RouteDecision::Allow);
    assert_eq!(guard().decide(&state, "/dashboard"), RouteDecision::Defer);
    assert_eq!(guard().decide(&state, "/login"), RouteDecision::Defer);
    assert_eq!(guard().decide(&state, "/anything"), RouteDecision::Defer);
}

#[test]
fn unauthenticated_redirects_protected_paths_to_login() {
    let state = AuthState::signed_out(None);
    assert_eq!(guard().decide(&state, "/login"), RouteDecision::Allow);
    assert_eq!(guard().decide(&state, "/"), RouteDecision::Allow);
    assert_eq!(guard().decide(&state, "/privacy"), RouteDecision::Allow);
    assert_eq!(
        guard().decide(&state, "/dashboard"),
        RouteDecision::Redirect("/login".to_owned())
    );
    assert_eq!(
        guard().decide(&state, "/select-clinic"),
        RouteDecision::Redirect("/login".to_owned())
    );
}

#[test]
fn no_tenants_routes_to_the_picker() {
    let state = AuthState {
        session: Some(session()),
        available_tenants: TenantSet::Empty,
        selected_tenant: None,
        is_loading: false,
        last_error: None,
    };
    assert_eq!(guard().decide(&state, "/select-clinic"), RouteDecision::Allow);
    assert_eq!(
        guard().decide(&state, "/dashboard"),
        RouteDecision::Redirect("/select-clinic".to_owned())
    );
    // An authenticated user belongs at the picker, not the login form
    assert_eq!(
        guard().decide(&state, "/login"),
        RouteDecision::Redirect("/select-clinic".to_owned())
    );
}

#[test]
fn awaiting_selection_routes_to_the_picker() {
    let state = awaiting_state();
    assert_eq!(guard().decide(&state, "/select-clinic"), RouteDecision::Allow);
    assert_eq!(
        guard().decide(&state, "/leads"),
        RouteDecision::Redirect("/select-clinic".to_owned())
    );
}

#[test]
fn ready_allows_protected_and_forwards_login() {
    let state = ready_state(permissions::STAFF);
    assert_eq!(guard().decide(&state, "/dashboard"), RouteDecision::Allow);
    assert_eq!(guard().decide(&state, "/leads"), RouteDecision::Allow);
    assert_eq!(guard().decide(&state, "/select-clinic"), RouteDecision::Allow);
    assert_eq!(
        guard().decide(&state, "/login"),
        RouteDecision::Redirect("/dashboard".to_owned())
    );
}

#[test]
fn ready_allows_unknown_paths_for_content_level_not_found() {
    // Rendering a not-found leaf is a content decision, not an auth decision
    let state = ready_state(permissions::STAFF);
    assert_eq!(
        guard().decide(&state, "/no/such/page"),
        RouteDecision::Allow
    );
}

#[test]
fn admin_prefixes_require_a_managing_role() {
    let staff = ready_state(permissions::STAFF);
    assert_eq!(
        guard().decide(&staff, "/settings/users"),
        RouteDecision::Redirect("/dashboard".to_owned())
    );

    let manager = ready_state(permissions::MANAGER);
    assert_eq!(
        guard().decide(&manager, "/settings/users"),
        RouteDecision::Allow
    );
}

#[test]
fn guard_respects_a_custom_policy() {
    let policy = RoutePolicy {
        login_path: "/signin".to_owned(),
        ..RoutePolicy::default()
    };
    let guard = RouteGuard::new(policy);
    let state = AuthState::signed_out(None);
    assert_eq!(guard.decide(&state, "/signin"), RouteDecision::Allow);
    assert_eq!(
        guard.decide(&state, "/dashboard"),
        RouteDecision::Redirect("/signin".to_owned())
    );
}

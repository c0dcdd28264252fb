// ABOUTME: Application constants organized by domain (routes, storage, permissions)
// ABOUTME: Single home for env var names and their defaults used by config parsing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! Constants module
//!
//! Constants are grouped into logical domains rather than a single flat list.
//! Env-driven values live in [`env_config`] so config parsing has one place
//! to look for variable names and fallbacks.

use std::env;

/// Client route paths the auth core reasons about
pub mod routes {
    /// Login page (public)
    pub const LOGIN: &str = "/login";
    /// Clinic picker shown when a user belongs to several clinics
    pub const SELECT_CLINIC: &str = "/select-clinic";
    /// Main application landing page after a clinic is selected
    pub const DASHBOARD: &str = "/dashboard";
    /// Neutral placeholder rendered while a resolution pass is in flight
    pub const LOADING: &str = "/loading";
    /// Public routes reachable without a session, besides login
    pub const PUBLIC: &[&str] = &["/", "/privacy", "/terms"];
    /// Route prefixes that require a managing permission level
    pub const ADMIN_PREFIXES: &[&str] = &["/settings/users", "/settings/clinic"];
}

/// Durable storage for the clinic selection
pub mod storage {
    /// Key under which the selected clinic is persisted
    pub const SELECTED_CLINIC_KEY: &str = "clinicflow.selected_clinic";
    /// Directory name under the platform config dir for file-backed storage
    pub const APP_DIR: &str = "clinicflow";
}

/// Permission levels scoped to a (user, clinic) pair
pub mod permissions {
    /// Read-only access
    pub const VIEWER: i32 = 1;
    /// Day-to-day CRM usage (leads, messaging)
    pub const STAFF: i32 = 2;
    /// Clinic management (users, settings)
    pub const MANAGER: i32 = 3;
}

/// Event/channel sizing
pub mod limits {
    /// Buffered session events per subscriber before lag kicks in
    pub const SESSION_EVENT_BUFFER: usize = 32;
    /// Buffered user-visible auth notices per subscriber
    pub const NOTICE_BUFFER: usize = 16;
}

/// Environment-based configuration
pub mod env_config {
    use super::env;
    use super::routes;

    /// Get the login route from environment or default
    #[must_use]
    pub fn login_path() -> String {
        env::var("AUTH_LOGIN_PATH").unwrap_or_else(|_| routes::LOGIN.to_owned())
    }

    /// Get the clinic picker route from environment or default
    #[must_use]
    pub fn select_clinic_path() -> String {
        env::var("AUTH_SELECT_CLINIC_PATH").unwrap_or_else(|_| routes::SELECT_CLINIC.to_owned())
    }

    /// Get the dashboard route from environment or default
    #[must_use]
    pub fn dashboard_path() -> String {
        env::var("AUTH_DASHBOARD_PATH").unwrap_or_else(|_| routes::DASHBOARD.to_owned())
    }

    /// Get the loading placeholder route from environment or default
    #[must_use]
    pub fn loading_path() -> String {
        env::var("AUTH_LOADING_PATH").unwrap_or_else(|_| routes::LOADING.to_owned())
    }

    /// Get the selection storage key from environment or default
    #[must_use]
    pub fn storage_key() -> String {
        env::var("AUTH_STORAGE_KEY")
            .unwrap_or_else(|_| super::storage::SELECTED_CLINIC_KEY.to_owned())
    }
}

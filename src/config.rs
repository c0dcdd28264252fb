// ABOUTME: Environment-driven configuration for route policy and selection storage
// ABOUTME: Typed defaults live in constants; from_env only overrides what is set
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! Environment-based configuration for the auth core

use crate::constants::{env_config, routes};
use serde::{Deserialize, Serialize};

/// The route vocabulary the guard and orchestrator reason about.
///
/// Everything that is not public, login, loading, or the clinic picker is
/// treated as a protected, clinic-scoped path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Login page
    pub login_path: String,
    /// Clinic picker page
    pub select_clinic_path: String,
    /// Main application landing page
    pub dashboard_path: String,
    /// Neutral loading placeholder
    pub loading_path: String,
    /// Public paths reachable without a session, besides login
    pub public_paths: Vec<String>,
    /// Prefixes that additionally require a managing permission level
    pub admin_prefixes: Vec<String>,
}

impl RoutePolicy {
    /// Policy from environment variables, falling back to the defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            login_path: env_config::login_path(),
            select_clinic_path: env_config::select_clinic_path(),
            dashboard_path: env_config::dashboard_path(),
            loading_path: env_config::loading_path(),
            ..Self::default()
        }
    }

    /// Whether `path` is reachable without a session
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    /// Whether `path` is the login page
    #[must_use]
    pub fn is_login(&self, path: &str) -> bool {
        path == self.login_path
    }

    /// Whether `path` is the loading placeholder
    #[must_use]
    pub fn is_loading(&self, path: &str) -> bool {
        path == self.loading_path
    }

    /// Whether `path` is the clinic picker
    #[must_use]
    pub fn is_picker(&self, path: &str) -> bool {
        path == self.select_clinic_path
    }

    /// Whether `path` falls under a manager-only prefix
    #[must_use]
    pub fn is_admin_path(&self, path: &str) -> bool {
        self.admin_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            login_path: routes::LOGIN.to_owned(),
            select_clinic_path: routes::SELECT_CLINIC.to_owned(),
            dashboard_path: routes::DASHBOARD.to_owned(),
            loading_path: routes::LOADING.to_owned(),
            public_paths: routes::PUBLIC.iter().map(|&p| p.to_owned()).collect(),
            admin_prefixes: routes::ADMIN_PREFIXES.iter().map(|&p| p.to_owned()).collect(),
        }
    }
}

/// Top-level configuration for [`crate::orchestrator::AuthOrchestrator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Route vocabulary
    pub routes: RoutePolicy,
    /// Key the clinic selection persists under
    pub storage_key: String,
}

impl OrchestratorConfig {
    /// Configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            routes: RoutePolicy::from_env(),
            storage_key: env_config::storage_key(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            routes: RoutePolicy::default(),
            storage_key: crate::constants::storage::SELECTED_CLINIC_KEY.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_policy_uses_constant_routes() {
        let policy = RoutePolicy::default();
        assert!(policy.is_login("/login"));
        assert!(policy.is_picker("/select-clinic"));
        assert!(policy.is_public("/"));
        assert!(!policy.is_public("/dashboard"));
        assert!(policy.is_admin_path("/settings/users/42"));
        assert!(!policy.is_admin_path("/settings/profile"));
    }

    #[test]
    #[serial]
    fn from_env_overrides_paths() {
        std::env::set_var("AUTH_LOGIN_PATH", "/signin");
        let policy = RoutePolicy::from_env();
        std::env::remove_var("AUTH_LOGIN_PATH");

        assert!(policy.is_login("/signin"));
        assert!(!policy.is_login("/login"));
        // Untouched fields keep their defaults
        assert_eq!(policy.dashboard_path, "/dashboard");
    }

    #[test]
    #[serial]
    fn storage_key_override() {
        std::env::set_var("AUTH_STORAGE_KEY", "alt.selection");
        let config = OrchestratorConfig::from_env();
        std::env::remove_var("AUTH_STORAGE_KEY");
        assert_eq!(config.storage_key, "alt.selection");
    }
}

// ABOUTME: Tenant directory contract and the resolver that joins roles to clinic records
// ABOUTME: Produces the per-user available clinic set with a canonical ordering
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Tenant Resolution
//!
//! Two sequential directory lookups: active role assignments for the user,
//! then clinic records for the distinct clinic ids those assignments point
//! at. The results are joined and filtered so a role assignment pointing at
//! an inactive or deleted clinic never produces a phantom entry.
//!
//! Zero assignments is a normal outcome (`Ok` with an empty vec), not an
//! error; a failed lookup propagates as [`crate::errors::AuthError::Transport`] so callers
//! can never mistake "the directory is down" for "this user has no clinics".

use crate::errors::AuthResult;
use crate::models::Tenant;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// An active role a user holds within one clinic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Clinic the role is scoped to
    pub tenant_id: Uuid,
    /// Role strength for this (user, clinic) pair
    pub permission_level: i32,
}

/// A clinic record as stored in the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Unique clinic identifier
    pub id: Uuid,
    /// Display name
    pub display_name: String,
    /// Integration authorization code
    pub auth_code: String,
    /// Whether the clinic itself is active
    pub is_active: bool,
}

/// Read-only contract over the hosted tenant data source
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Active role assignments for a user. Zero rows is a normal result.
    async fn active_assignments(&self, user_id: Uuid) -> AuthResult<Vec<RoleAssignment>>;

    /// Clinic records for the given ids. Missing ids are simply absent from
    /// the result, not an error.
    async fn tenants_by_ids(&self, ids: &[Uuid]) -> AuthResult<Vec<TenantRecord>>;
}

/// Joins role assignments to clinic records for one user
#[derive(Clone)]
pub struct TenantResolver {
    directory: Arc<dyn TenantDirectory>,
}

impl TenantResolver {
    /// Create a resolver over a directory backend
    #[must_use]
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve the clinics `user_id` may act within right now.
    ///
    /// The returned list is sorted by display name (then id, for ties) so the
    /// output is stable for a given input. An empty list means the user has
    /// zero active clinics.
    pub async fn resolve(&self, user_id: Uuid) -> AuthResult<Vec<Tenant>> {
        let assignments = self.directory.active_assignments(user_id).await?;
        if assignments.is_empty() {
            tracing::debug!(%user_id, "user has no active role assignments");
            return Ok(Vec::new());
        }

        // Duplicate assignments for one clinic collapse to the strongest role.
        let mut level_by_id: HashMap<Uuid, i32> = HashMap::with_capacity(assignments.len());
        for assignment in &assignments {
            level_by_id
                .entry(assignment.tenant_id)
                .and_modify(|level| *level = (*level).max(assignment.permission_level))
                .or_insert(assignment.permission_level);
        }

        let ids: Vec<Uuid> = level_by_id.keys().copied().collect();
        let records = self.directory.tenants_by_ids(&ids).await?;

        let mut tenants: Vec<Tenant> = records
            .into_iter()
            .filter(|record| record.is_active)
            .filter_map(|record| {
                level_by_id.get(&record.id).map(|&permission_level| Tenant {
                    id: record.id,
                    display_name: record.display_name,
                    auth_code: record.auth_code,
                    permission_level,
                })
            })
            .collect();

        tenants.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });

        tracing::debug!(
            %user_id,
            assignment_count = assignments.len(),
            resolved_count = tenants.len(),
            "resolved clinic set"
        );
        Ok(tenants)
    }
}

impl std::fmt::Debug for TenantResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantResolver").finish_non_exhaustive()
    }
}

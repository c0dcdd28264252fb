// ABOUTME: Injectable fakes for the session store and tenant directory
// ABOUTME: Centralizes test data creation so integration tests stay consistent
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! Test doubles for the auth core's external collaborators.
//!
//! The fakes are driven synchronously from tests: push session events with
//! [`FakeSessionStore::emit_signed_in`] and friends, seed the directory with
//! [`FakeTenantDirectory::grant`] and [`FakeTenantDirectory::insert_record`],
//! and flip the failure switches to exercise transport error paths. A
//! configurable directory delay makes in-flight supersede scenarios
//! reproducible.

use crate::constants::{limits, permissions};
use crate::errors::{AuthError, AuthResult};
use crate::models::{Session, Tenant};
use crate::session::{SessionEvent, SessionEventKind, SessionStore};
use crate::tenant::{RoleAssignment, TenantDirectory, TenantRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted in-memory session store
pub struct FakeSessionStore {
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
    fail_snapshot: AtomicBool,
    fail_sign_out: AtomicBool,
}

impl FakeSessionStore {
    /// Store with no session (logged out)
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(limits::SESSION_EVENT_BUFFER);
        Self {
            session: Mutex::new(None),
            events,
            fail_snapshot: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    /// Store that already holds a session at boot
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let store = Self::new();
        *lock(&store.session) = Some(session);
        store
    }

    /// Push a `SignedIn` event and update the snapshot
    pub fn emit_signed_in(&self, session: Session) {
        *lock(&self.session) = Some(session.clone());
        let _ = self
            .events
            .send(SessionEvent::with_session(SessionEventKind::SignedIn, session));
    }

    /// Push a `TokenRefreshed` event with a replacement session
    pub fn emit_token_refreshed(&self, session: Session) {
        *lock(&self.session) = Some(session.clone());
        let _ = self.events.send(SessionEvent::with_session(
            SessionEventKind::TokenRefreshed,
            session,
        ));
    }

    /// Push a `SignedOut` event and clear the snapshot
    pub fn emit_signed_out(&self) {
        *lock(&self.session) = None;
        let _ = self.events.send(SessionEvent::signed_out());
    }

    /// Make `current_session` fail with a transport error
    pub fn fail_snapshot(&self, fail: bool) {
        self.fail_snapshot.store(fail, Ordering::SeqCst);
    }

    /// Make `sign_out` fail with a transport error
    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }
}

impl Default for FakeSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for FakeSessionStore {
    async fn current_session(&self) -> AuthResult<Option<Session>> {
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err(AuthError::identity_transport("simulated snapshot failure"));
        }
        Ok(lock(&self.session).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::identity_transport("simulated sign-out failure"));
        }
        // A real provider confirms sign-out through the event channel.
        self.emit_signed_out();
        Ok(())
    }
}

/// Scripted in-memory tenant directory
pub struct FakeTenantDirectory {
    assignments: Mutex<HashMap<Uuid, Vec<RoleAssignment>>>,
    records: Mutex<Vec<TenantRecord>>,
    fail_assignments: AtomicBool,
    fail_records: AtomicBool,
    lookup_delay: Mutex<Option<Duration>>,
}

impl FakeTenantDirectory {
    /// Empty directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            assignments: Mutex::new(HashMap::new()),
            records: Mutex::new(Vec::new()),
            fail_assignments: AtomicBool::new(false),
            fail_records: AtomicBool::new(false),
            lookup_delay: Mutex::new(None),
        }
    }

    /// Give `user_id` a role in `tenant_id` at `permission_level`
    pub fn grant(&self, user_id: Uuid, tenant_id: Uuid, permission_level: i32) {
        lock(&self.assignments)
            .entry(user_id)
            .or_default()
            .push(RoleAssignment {
                tenant_id,
                permission_level,
            });
    }

    /// Add a clinic record
    pub fn insert_record(&self, record: TenantRecord) {
        lock(&self.records).push(record);
    }

    /// Remove every role assignment a user holds
    pub fn revoke_all(&self, user_id: Uuid) {
        lock(&self.assignments).remove(&user_id);
    }

    /// Mark a clinic record inactive
    pub fn deactivate_record(&self, id: Uuid) {
        for record in lock(&self.records).iter_mut() {
            if record.id == id {
                record.is_active = false;
            }
        }
    }

    /// Delay every lookup, for in-flight supersede scenarios
    pub fn set_lookup_delay(&self, delay: Duration) {
        *lock(&self.lookup_delay) = Some(delay);
    }

    /// Make the role assignment lookup fail
    pub fn fail_assignments(&self, fail: bool) {
        self.fail_assignments.store(fail, Ordering::SeqCst);
    }

    /// Make the clinic record lookup fail
    pub fn fail_records(&self, fail: bool) {
        self.fail_records.store(fail, Ordering::SeqCst);
    }

    async fn apply_delay(&self) {
        let delay = *lock(&self.lookup_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for FakeTenantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TenantDirectory for FakeTenantDirectory {
    async fn active_assignments(&self, user_id: Uuid) -> AuthResult<Vec<RoleAssignment>> {
        self.apply_delay().await;
        if self.fail_assignments.load(Ordering::SeqCst) {
            return Err(AuthError::directory_transport("simulated assignment failure"));
        }
        Ok(lock(&self.assignments)
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn tenants_by_ids(&self, ids: &[Uuid]) -> AuthResult<Vec<TenantRecord>> {
        self.apply_delay().await;
        if self.fail_records.load(Ordering::SeqCst) {
            return Err(AuthError::directory_transport("simulated record failure"));
        }
        Ok(lock(&self.records)
            .iter()
            .filter(|record| ids.contains(&record.id))
            .cloned()
            .collect())
    }
}

/// Create a test session for a user id
#[must_use]
pub fn test_session(user_id: Uuid) -> Session {
    Session::new(user_id, format!("token-{user_id}"))
}

/// Create an active clinic record with a deterministic id
#[must_use]
pub fn test_record(id: u128, display_name: &str) -> TenantRecord {
    TenantRecord {
        id: Uuid::from_u128(id),
        display_name: display_name.to_owned(),
        auth_code: format!("AC-{id:04}"),
        is_active: true,
    }
}

/// The tenant a staff-level user sees for a given record
#[must_use]
pub fn tenant_from_record(record: &TenantRecord, permission_level: i32) -> Tenant {
    Tenant {
        id: record.id,
        display_name: record.display_name.clone(),
        auth_code: record.auth_code.clone(),
        permission_level,
    }
}

/// Default staff permission level used across tests
#[must_use]
pub const fn staff_level() -> i32 {
    permissions::STAFF
}

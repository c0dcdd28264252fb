// ABOUTME: Shared test harness wiring the orchestrator to injectable fakes
// ABOUTME: Provides phase-waiting helpers with timeouts so tests never hang
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ClinicFlow

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use clinicflow_auth::cache::{MemoryStorage, SelectionStorage};
use clinicflow_auth::config::OrchestratorConfig;
use clinicflow_auth::models::{AuthPhase, AuthState};
use clinicflow_auth::orchestrator::AuthOrchestrator;
use clinicflow_auth::session::SessionStore;
use clinicflow_auth::tenant::TenantDirectory;
use clinicflow_auth::test_utils::{FakeSessionStore, FakeTenantDirectory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Everything a scenario test needs, with handles on the fakes
pub struct TestHarness {
    pub sessions: Arc<FakeSessionStore>,
    pub directory: Arc<FakeTenantDirectory>,
    pub storage: Arc<MemoryStorage>,
    pub orchestrator: AuthOrchestrator,
}

/// Harness over fresh fakes and default config
pub fn harness() -> TestHarness {
    harness_with_storage(Arc::new(MemoryStorage::new()))
}

/// Harness reusing an existing storage backend (simulated reload)
pub fn harness_with_storage(storage: Arc<MemoryStorage>) -> TestHarness {
    let sessions = Arc::new(FakeSessionStore::new());
    let directory = Arc::new(FakeTenantDirectory::new());
    let session_store: Arc<dyn SessionStore> = sessions.clone();
    let tenant_directory: Arc<dyn TenantDirectory> = directory.clone();
    let selection_storage: Arc<dyn SelectionStorage> = storage.clone();
    let orchestrator = AuthOrchestrator::new(
        session_store,
        tenant_directory,
        selection_storage,
        OrchestratorConfig::default(),
    );
    TestHarness {
        sessions,
        directory,
        storage,
        orchestrator,
    }
}

/// The storage key default config persists the selection under
pub fn storage_key() -> String {
    OrchestratorConfig::default().storage_key
}

/// Wait until the observed state reaches `phase`, with a test timeout
pub async fn wait_for_phase(rx: &mut watch::Receiver<AuthState>, phase: AuthPhase) -> AuthState {
    let state = tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|state| state.phase() == phase),
    )
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for phase {phase:?}"))
    .expect("state channel closed");
    state.clone()
}

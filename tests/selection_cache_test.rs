// ABOUTME: Tests for the selection cache and its storage backends
// ABOUTME: Covers reload round trips, corrupt entries, and graceful non-persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ClinicFlow

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use clinicflow_auth::cache::{
    FileStorage, MemoryStorage, NullStorage, SelectionStorage, TenantSelectionCache,
};
use clinicflow_auth::constants::storage::SELECTED_CLINIC_KEY;
use clinicflow_auth::test_utils::{tenant_from_record, test_record};
use std::sync::Arc;

fn cache_over<S: SelectionStorage + 'static>(backend: Arc<S>) -> TenantSelectionCache {
    TenantSelectionCache::new(backend, SELECTED_CLINIC_KEY.to_owned())
}

#[test]
fn save_then_load_round_trips_across_a_reload() {
    let backend = Arc::new(MemoryStorage::new());
    let tenant = tenant_from_record(&test_record(1, "Clinic A"), 2);

    cache_over(Arc::clone(&backend)).save(&tenant);

    // A new cache over the same backend simulates a process reload
    let reloaded = cache_over(backend).load().unwrap();
    assert_eq!(reloaded.id, tenant.id);
    assert_eq!(reloaded, tenant);
}

#[test]
fn corrupt_entry_reads_as_absent() {
    let backend = Arc::new(MemoryStorage::new());
    backend.set(SELECTED_CLINIC_KEY, "{not json");
    assert!(cache_over(backend).load().is_none());
}

#[test]
fn clear_removes_the_entry() {
    let backend = Arc::new(MemoryStorage::new());
    let cache = cache_over(Arc::clone(&backend));
    cache.save(&tenant_from_record(&test_record(1, "Clinic A"), 2));
    cache.clear();
    assert!(cache.load().is_none());
    assert!(backend.get(SELECTED_CLINIC_KEY).is_none());
}

#[test]
fn cache_key_does_not_collide_with_other_entries() {
    let backend = Arc::new(MemoryStorage::new());
    backend.set("unrelated.cache", "please survive");
    let cache = cache_over(Arc::clone(&backend));
    cache.save(&tenant_from_record(&test_record(1, "Clinic A"), 2));
    cache.clear();
    assert_eq!(backend.get("unrelated.cache").as_deref(), Some("please survive"));
}

#[test]
fn null_storage_never_persists_and_never_errors() {
    let cache = cache_over(Arc::new(NullStorage));
    cache.save(&tenant_from_record(&test_record(1, "Clinic A"), 2));
    assert!(cache.load().is_none());
    cache.clear();
}

#[test]
fn file_storage_round_trips_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let tenant = tenant_from_record(&test_record(9, "Disk Clinic"), 3);

    {
        let backend = Arc::new(FileStorage::new(dir.path().to_path_buf()));
        cache_over(backend).save(&tenant);
    }

    let backend = Arc::new(FileStorage::new(dir.path().to_path_buf()));
    let reloaded = cache_over(backend).load().unwrap();
    assert_eq!(reloaded, tenant);
}

#[test]
fn file_storage_treats_corrupt_files_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStorage::new(dir.path().to_path_buf());
    backend.set(SELECTED_CLINIC_KEY, "\x00\x01 definitely not json");

    let reloaded = cache_over(Arc::new(FileStorage::new(dir.path().to_path_buf()))).load();
    assert!(reloaded.is_none());
}

#[test]
fn file_storage_remove_of_missing_key_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStorage::new(dir.path().to_path_buf());
    backend.remove("never.saved");
}

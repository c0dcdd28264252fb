// ABOUTME: Durable single-slot cache for the user's last chosen clinic
// ABOUTME: Storage backends are best-effort; corrupt or absent data reads as None
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 ClinicFlow

//! # Tenant Selection Cache
//!
//! Persists at most one clinic selection across reloads, keyed independently
//! from any other cached value. Storage is strictly best-effort: a missing or
//! unwritable backend means the selection simply never persists, and a
//! corrupt entry is treated as absence rather than an error. Validity against
//! the freshly resolved clinic set is the orchestrator's job, not the
//! cache's.

use crate::constants::storage;
use crate::models::Tenant;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Durable key/value storage contract, synchronous and best-effort.
///
/// `set`/`remove` failures are swallowed by implementations (logged at debug
/// level); the caller never needs to handle them.
pub trait SelectionStorage: Send + Sync {
    /// Read the raw value for a key, `None` if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value, best-effort
    fn set(&self, key: &str, value: &str);
    /// Remove a key, best-effort
    fn remove(&self, key: &str);
}

/// In-memory storage; survives orchestrator restarts within one process
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// File-backed storage: one file per key under a config directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at an explicit directory (created on first write)
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Storage under the platform config dir, e.g. `~/.config/clinicflow`
    pub fn with_default_dir() -> Result<Self> {
        let base = dirs::config_dir().context("no platform config directory available")?;
        Ok(Self::new(base.join(storage::APP_DIR)))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are dotted identifiers; keep them filesystem-safe.
        let name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SelectionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(self.path_for(key), value))
        {
            tracing::debug!(key, error = %err, "selection storage write failed; continuing without persistence");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = std::fs::remove_file(self.path_for(key)) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(key, error = %err, "selection storage remove failed");
            }
        }
    }
}

/// Storage that never persists anything (private-browsing analogue)
#[derive(Default, Clone, Copy)]
pub struct NullStorage;

impl SelectionStorage for NullStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}

/// Single-slot cache of the user's last chosen clinic
#[derive(Clone)]
pub struct TenantSelectionCache {
    backend: Arc<dyn SelectionStorage>,
    key: String,
}

impl TenantSelectionCache {
    /// Cache over a storage backend, under the given key
    #[must_use]
    pub fn new(backend: Arc<dyn SelectionStorage>, key: String) -> Self {
        Self { backend, key }
    }

    /// Load the persisted selection. Corrupt data reads as `None` and is
    /// never surfaced to the user.
    #[must_use]
    pub fn load(&self) -> Option<Tenant> {
        let raw = self.backend.get(&self.key)?;
        match serde_json::from_str(&raw) {
            Ok(tenant) => Some(tenant),
            Err(err) => {
                tracing::debug!(key = %self.key, error = %err, "corrupt persisted selection treated as absent");
                None
            }
        }
    }

    /// Persist a selection, best-effort
    pub fn save(&self, tenant: &Tenant) {
        match serde_json::to_string(tenant) {
            Ok(raw) => self.backend.set(&self.key, &raw),
            Err(err) => {
                tracing::debug!(key = %self.key, error = %err, "selection serialization failed")
            }
        }
    }

    /// Drop the persisted selection
    pub fn clear(&self) {
        self.backend.remove(&self.key);
    }
}

impl std::fmt::Debug for TenantSelectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantSelectionCache")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

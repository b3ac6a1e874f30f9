// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination backend contract
//!
//! The engine's only external dependency: a durable key-value store with
//! prefix-range reads, lease-based expiry, and named mutual-exclusion locks
//! bounded by a hold duration. Production deployments supply an
//! implementation backed by a real coordination service; [`MemoryBackend`]
//! serves tests and single-process demos.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Backend failures. All variants are treated as transient by the worker
/// loop: the current operation is abandoned and retried on a later pass.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend request timed out: {0}")]
    Timeout(String),
    #[error("lock error: {0}")]
    Lock(String),
    #[error("{0}")]
    Other(String),
}

/// Opaque release capability returned by a successful lock acquisition.
/// Must be passed back to [`Backend::unlock`] exactly once; doing so after
/// the lock has auto-expired is safe.
#[derive(Debug)]
pub struct LockToken(Vec<u8>);

impl LockToken {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Contract the coordination backend must implement
#[async_trait]
pub trait Backend: Send + Sync {
    /// Upsert a key with a lease. Overwriting an existing key supersedes
    /// its prior expiry.
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), BackendError>;

    /// Point lookup. `None` if the key is absent or its lease has lapsed.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Current value of every live key under the prefix, in no particular
    /// order.
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, BackendError>;

    /// Best-effort remove; idempotent if the key is already absent.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Attempt to acquire the named lock, bounded by the backend's hold
    /// duration. `None` means the lock is currently held elsewhere — an
    /// expected outcome, not an error.
    async fn try_lock(&self, name: &str) -> Result<Option<LockToken>, BackendError>;

    /// Release a held lock. Safe to call after the lock auto-expired; a
    /// failure only delays the next acquisition, it never blocks it.
    async fn unlock(&self, token: LockToken) -> Result<(), BackendError>;
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory backend for tests and single-process demos
//!
//! Models the pieces of the contract the engine actually depends on:
//! lease-based key expiry and named locks with a bounded hold duration.
//! Expiry is evaluated lazily against the injected [`Clock`], so tests can
//! drive lease and lock lapses with [`FakeClock::advance`] instead of
//! sleeping.
//!
//! [`FakeClock::advance`]: crate::clock::FakeClock::advance

use super::{Backend, BackendError, LockToken};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

const DEFAULT_LOCK_HOLD: Duration = Duration::from_secs(10);

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

struct HeldLock {
    token: u64,
    acquired_at: Instant,
}

/// Shared in-memory key-value store with leases and named locks
#[derive(Clone)]
pub struct MemoryBackend<C: Clock = SystemClock> {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    locks: Arc<Mutex<HashMap<String, HeldLock>>>,
    next_token: Arc<AtomicU64>,
    fail_next_scan: Arc<AtomicBool>,
    lock_hold: Duration,
    clock: C,
}

impl MemoryBackend<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryBackend<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryBackend<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
            next_token: Arc::new(AtomicU64::new(1)),
            fail_next_scan: Arc::new(AtomicBool::new(false)),
            lock_hold: DEFAULT_LOCK_HOLD,
            clock,
        }
    }

    /// Bound on how long a holder that never releases keeps a lock
    pub fn with_lock_hold(mut self, hold: Duration) -> Self {
        self.lock_hold = hold;
        self
    }

    /// Make the next `get_by_prefix` fail, for worker error-path tests
    pub fn inject_scan_error(&self) {
        self.fail_next_scan.store(true, Ordering::SeqCst);
    }

    fn live(&self, entry: &Entry) -> bool {
        self.clock.now() < entry.expires_at
    }

    fn lock_expired(&self, held: &HeldLock) -> bool {
        self.clock.now().duration_since(held.acquired_at) >= self.lock_hold
    }
}

#[async_trait]
impl<C: Clock> Backend for MemoryBackend<C> {
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: self.clock.now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if self.live(entry) => Ok(Some(entry.value.clone())),
            Some(_) => {
                // lease lapsed
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, BackendError> {
        if self.fail_next_scan.swap(false, Ordering::SeqCst) {
            return Err(BackendError::Unavailable("injected scan failure".into()));
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        entries.retain(|_, entry| now < entry.expires_at);

        Ok(entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, entry)| entry.value.clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    async fn try_lock(&self, name: &str) -> Result<Option<LockToken>, BackendError> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(held) = locks.get(name) {
            if !self.lock_expired(held) {
                return Ok(None);
            }
            // hold duration lapsed: the previous holder crashed or stalled
            warn!(lock = %name, "reclaiming lock from stale holder");
        }

        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        locks.insert(
            name.to_string(),
            HeldLock {
                token,
                acquired_at: self.clock.now(),
            },
        );
        Ok(Some(LockToken::new(format!("{}:{}", name, token))))
    }

    async fn unlock(&self, token: LockToken) -> Result<(), BackendError> {
        let bytes = token.into_bytes();
        let encoded = String::from_utf8(bytes)
            .map_err(|_| BackendError::Lock("malformed lock token".into()))?;
        let (name, serial) = encoded
            .rsplit_once(':')
            .ok_or_else(|| BackendError::Lock("malformed lock token".into()))?;
        let serial: u64 = serial
            .parse()
            .map_err(|_| BackendError::Lock("malformed lock token".into()))?;

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Remove only if this token is still the holder; a token that
        // expired and was reacquired by someone else must not release them.
        if locks.get(name).is_some_and(|held| held.token == serial) {
            locks.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission API
//!
//! Publishes a new machine instance to the backend: fresh id, derived key,
//! encoded record, `put` with the instance lease. On success the instance is
//! immediately visible to worker prefix scans; on failure the error
//! propagates and the caller retries the whole submission.

use dsm_core::{machine_key, Backend, BackendError, CodecError, IdGen, Machine};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Submission failures, propagated to the submitting caller
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("encode error: {0}")]
    Codec(#[from] CodecError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Publishes machine instances to the backend
pub struct Submitter<B, I> {
    backend: Arc<B>,
    ids: I,
    machine_ttl: Duration,
}

impl<B: Backend, I: IdGen> Submitter<B, I> {
    pub fn new(backend: Arc<B>, ids: I, machine_ttl: Duration) -> Self {
        Self {
            backend,
            ids,
            machine_ttl,
        }
    }

    /// Submit a new instance for execution. Returns the generated id; the
    /// storage key is the machine namespace prefix plus that id.
    pub async fn submit(
        &self,
        state: impl Into<String>,
        payload: Vec<u8>,
        machine_type: impl Into<String>,
    ) -> Result<String, SubmitError> {
        let mut machine = Machine::new(state, payload, machine_type);

        let id = self.ids.next();
        machine.key = machine_key(&id);

        let record = machine.encode()?;
        self.backend
            .put(&machine.key, &record, self.machine_ttl)
            .await?;

        info!(key = %machine.key, machine_type = %machine.machine_type, "submitted machine");
        Ok(id)
    }
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;

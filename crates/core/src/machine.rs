// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted machine record and its codec
//!
//! A [`Machine`] is one running occurrence of an application state machine:
//! a step label, an opaque payload blob, a storage key, and a type tag that
//! selects which registered handler governs its transitions. The engine
//! never interprets `state` or `payload`; it only persists what handlers
//! leave behind.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Namespace prefix distinguishing machine records from any other data that
/// shares the backend
pub const MACHINE_PREFIX: &str = "machine-";

/// Instance-level lease. Generous: it bounds the total end-to-end lifetime
/// of an abandoned instance, not a single tick.
pub const MACHINE_TTL: Duration = Duration::from_secs(600);

/// Codec failures for stored machine records
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

/// One persisted state-machine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Current step label, interpreted only by the handler for this type
    pub state: String,
    /// Opaque application payload; the engine never inspects it
    pub payload: Vec<u8>,
    /// Storage identity: [`MACHINE_PREFIX`] plus a generated id
    pub key: String,
    /// Selects the registered handler governing this instance
    pub machine_type: String,
}

impl Machine {
    /// Create an unsubmitted instance. The key is assigned at submission.
    pub fn new(
        state: impl Into<String>,
        payload: Vec<u8>,
        machine_type: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            payload,
            key: String::new(),
            machine_type: machine_type.into(),
        }
    }

    /// Encode for persistence. Round-trips exactly through [`Machine::decode`].
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }

    /// Decode a stored record. A failure means the record is corrupt or was
    /// written by an incompatible version; callers skip the record rather
    /// than abort the pass.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(buf).map_err(CodecError::Decode)
    }
}

/// Derive a storage key from a generated instance id
pub fn machine_key(id: &str) -> String {
    format!("{}{}", MACHINE_PREFIX, id)
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;

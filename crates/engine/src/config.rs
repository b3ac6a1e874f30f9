// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration

use dsm_core::MACHINE_TTL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tuning for the worker loop and submission lease
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorkerConfig {
    /// Idle wait between discovery passes
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Lease applied to machine records on submit and on every non-terminal
    /// tick. Bounds the lifetime of abandoned instances; must outlive any
    /// expected end-to-end processing latency.
    #[serde(with = "humantime_serde")]
    pub machine_ttl: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            machine_ttl: MACHINE_TTL,
        }
    }
}

impl WorkerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_machine_ttl(mut self, ttl: Duration) -> Self {
        self.machine_ttl = ttl;
        self
    }

    /// Parse from a TOML document
    pub fn from_toml(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

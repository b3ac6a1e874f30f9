// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker loop: the scheduler that advances persisted machines
//!
//! A worker repeatedly scans the backend for machine records, takes the
//! per-instance lock, invokes the registered handler for the instance's
//! type, and persists or retires the result. Any number of workers may run
//! against the same backend; the lock is the only cross-process serializer.
//!
//! Errors are isolated per instance: a corrupt record, a missing handler,
//! or a backend hiccup on one key never aborts the pass or the process.

use crate::config::WorkerConfig;
use dsm_core::{Backend, Machine, Registry, MACHINE_PREFIX};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Scanning the backend for machine records
    Discovering,
    /// Attempting work on the discovered instances
    Dispatching,
    /// Sleeping between passes
    Idling,
    /// Shutdown observed at a pass boundary; terminal
    Stopped,
}

/// Result of one dispatch attempt on one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handler reported terminal; the record was deleted
    Completed,
    /// Handler advanced the machine; the record was re-persisted with a
    /// refreshed lease
    Advanced,
    /// Lock held elsewhere; presumed in progress on another worker
    Contended,
    /// No handler registered for the type; record left untouched
    NoHandler,
    /// Backend error mid-dispatch; abandoned for this cycle
    Skipped,
}

/// Cooperative stop flag, checked once per pass boundary. The in-flight
/// pass always completes before the loop stops.
#[derive(Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Long-lived poll/lock/dispatch loop
pub struct Worker<B> {
    backend: Arc<B>,
    registry: Arc<Registry>,
    config: WorkerConfig,
    shutdown: ShutdownHandle,
    phase: Mutex<WorkerPhase>,
}

impl<B: Backend> Worker<B> {
    pub fn new(backend: Arc<B>, registry: Arc<Registry>, config: WorkerConfig) -> Self {
        Self {
            backend,
            registry,
            config,
            shutdown: ShutdownHandle::default(),
            phase: Mutex::new(WorkerPhase::Idling),
        }
    }

    /// Handle for requesting a cooperative stop from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn phase(&self) -> WorkerPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: WorkerPhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    /// Run until a shutdown is requested. Never returns an error: per-cycle
    /// problems are reported and retried on the next pass.
    pub async fn run(&self) {
        info!("worker started");
        loop {
            self.run_pass().await;

            if self.shutdown.is_shutdown() {
                self.set_phase(WorkerPhase::Stopped);
                info!("worker received quit signal");
                break;
            }

            self.set_phase(WorkerPhase::Idling);
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One discovery pass: scan, then attempt work on every discovered
    /// instance. Public so tests and single-shot callers can drive the loop
    /// by hand.
    pub async fn run_pass(&self) {
        self.set_phase(WorkerPhase::Discovering);

        let records = match self.backend.get_by_prefix(MACHINE_PREFIX).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "machine scan failed, skipping this cycle");
                return;
            }
        };

        self.set_phase(WorkerPhase::Dispatching);

        let mut machines = Vec::new();
        for record in &records {
            match Machine::decode(record) {
                Ok(machine) => machines.push(machine),
                Err(err) => {
                    // Corrupt or version-incompatible record. Leave it in
                    // place for an operator to inspect or repair.
                    error!(%err, "undecodable machine record, skipping");
                }
            }
        }

        debug!(count = machines.len(), "discovered machine instances");

        for machine in machines {
            let key = machine.key.clone();
            let outcome = self.dispatch(machine).await;
            debug!(key = %key, ?outcome, "dispatch attempt finished");
        }
    }

    /// Attempt work on a single instance: lock, advance, release. The lock
    /// release runs on every path, including handler-lookup failures.
    pub async fn dispatch(&self, mut machine: Machine) -> DispatchOutcome {
        let key = machine.key.clone();

        let token = match self.backend.try_lock(&key).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                // Another worker owns this instance right now.
                return DispatchOutcome::Contended;
            }
            Err(err) => {
                warn!(key = %key, %err, "lock attempt failed, retrying next cycle");
                return DispatchOutcome::Skipped;
            }
        };

        let outcome = self.advance(&mut machine).await;

        if let Err(err) = self.backend.unlock(token).await {
            // The hold-duration bound reclaims the lock on its own; a failed
            // release only delays the next acquisition.
            warn!(key = %key, %err, "failed to release machine lock");
        }

        outcome
    }

    /// Invoke the handler and persist the result. Caller holds the lock.
    async fn advance(&self, machine: &mut Machine) -> DispatchOutcome {
        let Some(tick) = self.registry.lookup(&machine.machine_type) else {
            warn!(
                key = %machine.key,
                machine_type = %machine.machine_type,
                "no handler registered for machine type, leaving instance untouched"
            );
            return DispatchOutcome::NoHandler;
        };

        let done = tick(machine);

        if done {
            if let Err(err) = self.backend.delete(&machine.key).await {
                warn!(key = %machine.key, %err, "failed to retire completed machine");
                return DispatchOutcome::Skipped;
            }
            info!(key = %machine.key, "machine complete, retired");
            return DispatchOutcome::Completed;
        }

        let record = match machine.encode() {
            Ok(record) => record,
            Err(err) => {
                error!(key = %machine.key, %err, "failed to encode advanced machine");
                return DispatchOutcome::Skipped;
            }
        };

        if let Err(err) = self
            .backend
            .put(&machine.key, &record, self.config.machine_ttl)
            .await
        {
            warn!(key = %machine.key, %err, "failed to save machine update");
            return DispatchOutcome::Skipped;
        }

        debug!(key = %machine.key, state = %machine.state, "saved machine update");
        DispatchOutcome::Advanced
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dsm-engine: submission and worker scheduling for distributed state
//! machinery
//!
//! [`Submitter`] publishes new machine instances to the backend;
//! [`Worker`] is the long-lived poll/lock/dispatch loop that advances them.

mod config;
mod submit;
mod worker;

pub use config::WorkerConfig;
pub use submit::{SubmitError, Submitter};
pub use worker::{DispatchOutcome, ShutdownHandle, Worker, WorkerPhase};

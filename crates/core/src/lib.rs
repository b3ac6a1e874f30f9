// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dsm-core: Core library for distributed state machinery
//!
//! This crate provides:
//! - The persisted machine record and its codec
//! - The handler registry mapping machine types to tick functions
//! - The coordination backend contract (key-value store with leases and
//!   named locks) plus an in-memory implementation for tests and demos
//! - Clock and id-generation seams for deterministic testing

pub mod backend;
pub mod clock;
pub mod id;
pub mod machine;
pub mod registry;

// Re-exports
pub use backend::{Backend, BackendError, LockToken, MemoryBackend};
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use machine::{machine_key, CodecError, Machine, MACHINE_PREFIX, MACHINE_TTL};
pub use registry::{Registry, TickFn};

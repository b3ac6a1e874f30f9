// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler registry mapping machine types to tick functions
//!
//! A tick function advances one instance by exactly one step: it mutates
//! `state` and `payload` in place and returns `true` once the instance has
//! reached its terminal condition. The registry is an owned value (shared
//! via `Arc`) rather than process-global state, so independently configured
//! worker loops and tests can coexist.

use crate::machine::Machine;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Per-type handler: advance one instance by one step, returning `true`
/// when the instance is complete and should be retired
pub type TickFn = dyn Fn(&mut Machine) -> bool + Send + Sync;

/// Registry of machine types and the tick functions that drive them
#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<String, Arc<TickFn>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler for a machine type. Last registration wins.
    /// Expected at startup, before worker loops consume the type.
    pub fn register<F>(&self, type_name: impl Into<String>, tick: F)
    where
        F: Fn(&mut Machine) -> bool + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        if handlers.insert(type_name.clone(), Arc::new(tick)).is_some() {
            warn!(machine_type = %type_name, "replacing registered handler");
        }
    }

    /// Look up the handler for a machine type
    pub fn lookup(&self, type_name: &str) -> Option<Arc<TickFn>> {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        handlers.get(type_name).cloned()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

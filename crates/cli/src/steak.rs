// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample consumer: the backyard grillmaster state machine
//!
//! A deliberately trivial machine type exercising the full engine surface:
//! JSON payload evolution, multi-step advancement, and terminal retirement.

use dsm_core::Machine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const MACHINE_TYPE: &str = "steak";

pub const INITIAL: &str = "INIT";
pub const SEASONED: &str = "SEASONED";
pub const GRILLHOT: &str = "GRILLHOT";
pub const SIDEONE: &str = "SIDEONE";
pub const COOKED: &str = "COOKED";
pub const DONE: &str = "DONE";

/// Progress of one steak, carried as the machine payload
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SteakGrillState {
    pub seasoned: bool,
    pub grill_hot: bool,
    pub cooked_side1: bool,
    pub cooked_side2: bool,
    pub rested: bool,
}

/// Advance a steak machine by one step. Returns true at the terminal state.
pub fn tick(machine: &mut Machine) -> bool {
    info!(key = %machine.key, state = %machine.state, "tick");

    let mut steak: SteakGrillState = if machine.payload.is_empty() {
        SteakGrillState::default()
    } else {
        match serde_json::from_slice(&machine.payload) {
            Ok(steak) => steak,
            Err(err) => {
                warn!(key = %machine.key, %err, "unreadable steak payload, starting over");
                SteakGrillState::default()
            }
        }
    };

    match machine.state.as_str() {
        INITIAL => {
            info!("season steak!");
            steak.seasoned = true;
            machine.state = SEASONED.to_string();
        }
        SEASONED => {
            info!("now heat that grill");
            steak.grill_hot = true; // magic instant-heating grill
            machine.state = GRILLHOT.to_string();
        }
        GRILLHOT => {
            info!("cook first side");
            steak.cooked_side1 = true;
            machine.state = SIDEONE.to_string();
        }
        SIDEONE => {
            info!("flip and cook second side");
            steak.cooked_side2 = true;
            machine.state = COOKED.to_string();
        }
        COOKED => {
            info!("rest steak");
            steak.rested = true;
            machine.state = DONE.to_string();
        }
        other => {
            warn!(state = %other, "steak machine in unknown state, leaving as is");
        }
    }

    match serde_json::to_vec(&steak) {
        Ok(payload) => machine.payload = payload,
        Err(err) => warn!(%err, "failed to encode steak payload"),
    }

    machine.state == DONE
}

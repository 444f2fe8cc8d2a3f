// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input normalization.
//!
//! Everything `cmd` accepts — bare action names, `(action, params)` pairs,
//! signals, or lists of any of these — normalizes to a flat list of
//! [`Instruction`]s before the strategy sees it. Normalization fails
//! atomically: if any instruction names an action outside the agent's
//! allowed set, none of them run.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeSet;

use crate::error::CmdError;
use crate::router::Router;
use crate::signal::Signal;
use crate::state::StateMap;

/// A normalized `(action, params)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub action: SmolStr,
    #[serde(default, skip_serializing_if = "StateMap::is_empty")]
    pub params: StateMap,
}

impl Instruction {
    pub fn new(action: impl Into<SmolStr>) -> Self {
        Self { action: action.into(), params: StateMap::new() }
    }

    pub fn with_params(action: impl Into<SmolStr>, params: StateMap) -> Self {
        Self { action: action.into(), params }
    }
}

/// Anything `cmd` accepts as input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A bare action identifier; params default to `{}`.
    Action(SmolStr),
    /// An `(action, params)` pair.
    Invoke(SmolStr, StateMap),
    /// An already-normalized instruction.
    Instruction(Instruction),
    /// A signal, resolved through the agent's signal routes; params come
    /// from the signal's data.
    Signal(Signal),
    /// A list of any of the above, flattened element-wise.
    Batch(Vec<Input>),
}

impl From<&str> for Input {
    fn from(action: &str) -> Self {
        Input::Action(SmolStr::new(action))
    }
}

impl From<Instruction> for Input {
    fn from(instruction: Instruction) -> Self {
        Input::Instruction(instruction)
    }
}

impl From<Signal> for Input {
    fn from(signal: Signal) -> Self {
        Input::Signal(signal)
    }
}

/// Normalize an input to an instruction list.
///
/// A signal with no matching route contributes nothing (router totality);
/// an instruction naming an unknown action fails the whole call with
/// `action_not_allowed`.
pub fn normalize(
    input: Input,
    routes: &Router<SmolStr>,
    allowed: &BTreeSet<SmolStr>,
) -> Result<Vec<Instruction>, CmdError> {
    let mut instructions = Vec::new();
    flatten(input, routes, &mut instructions);
    for instruction in &instructions {
        if !allowed.contains(&instruction.action) {
            return Err(CmdError::ActionNotAllowed(instruction.action.clone()));
        }
    }
    Ok(instructions)
}

fn flatten(input: Input, routes: &Router<SmolStr>, out: &mut Vec<Instruction>) {
    match input {
        Input::Action(action) => out.push(Instruction::new(action)),
        Input::Invoke(action, params) => out.push(Instruction::with_params(action, params)),
        Input::Instruction(instruction) => out.push(instruction),
        Input::Signal(signal) => {
            let params = signal.data_map();
            for action in routes.match_type(&signal.ty) {
                out.push(Instruction::with_params(action.clone(), params.clone()));
            }
        }
        Input::Batch(inputs) => {
            for input in inputs {
                flatten(input, routes, out);
            }
        }
    }
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod tests;

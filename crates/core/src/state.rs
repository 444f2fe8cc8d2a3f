// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State operations.
//!
//! Actions describe state changes as data; the strategy applies them
//! atomically to the agent's state map before `cmd` returns. Only the
//! external directives in an action's effect list ever leave the core.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Agent state is a JSON object map.
pub type StateMap = serde_json::Map<String, Value>;

/// An internal state operation produced by an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StateOp {
    /// Deep-merge the given map into state (maps merge recursively, other
    /// values replace).
    Set { values: StateMap },
    /// Replace the entire state map.
    Replace { values: StateMap },
    /// Remove top-level keys.
    DeleteKeys { keys: Vec<SmolStr> },
    /// Set a nested value, creating intermediate maps.
    SetPath { path: Vec<SmolStr>, value: Value },
    /// Remove a nested value; missing paths are a no-op.
    DeletePath { path: Vec<SmolStr> },
}

impl StateOp {
    pub fn set(values: StateMap) -> Self {
        StateOp::Set { values }
    }

    pub fn set_key(key: impl Into<String>, value: Value) -> Self {
        let mut values = StateMap::new();
        values.insert(key.into(), value);
        StateOp::Set { values }
    }

    pub fn set_path(path: &[&str], value: Value) -> Self {
        StateOp::SetPath { path: path.iter().map(|s| SmolStr::new(s)).collect(), value }
    }

    pub fn delete_path(path: &[&str]) -> Self {
        StateOp::DeletePath { path: path.iter().map(|s| SmolStr::new(s)).collect() }
    }
}

/// Apply one operation to a state map.
pub fn apply(state: &mut StateMap, op: &StateOp) {
    match op {
        StateOp::Set { values } => {
            for (key, value) in values {
                merge_value(state, key, value.clone());
            }
        }
        StateOp::Replace { values } => {
            *state = values.clone();
        }
        StateOp::DeleteKeys { keys } => {
            for key in keys {
                state.remove(key.as_str());
            }
        }
        StateOp::SetPath { path, value } => {
            set_path(state, path, value.clone());
        }
        StateOp::DeletePath { path } => {
            delete_path(state, path);
        }
    }
}

/// Apply a sequence of operations in order.
pub fn apply_all(state: &mut StateMap, ops: &[StateOp]) {
    for op in ops {
        apply(state, op);
    }
}

fn merge_value(state: &mut StateMap, key: &str, value: Value) {
    match (state.get_mut(key), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_value(existing, &k, v);
            }
        }
        (_, value) => {
            state.insert(key.to_string(), value);
        }
    }
}

fn set_path(state: &mut StateMap, path: &[SmolStr], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        state.insert(head.to_string(), value);
        return;
    }
    let entry = state
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(StateMap::new()));
    if !entry.is_object() {
        *entry = Value::Object(StateMap::new());
    }
    if let Value::Object(map) = entry {
        set_path(map, rest, value);
    }
}

fn delete_path(state: &mut StateMap, path: &[SmolStr]) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        state.remove(head.as_str());
        return;
    }
    if let Some(Value::Object(map)) = state.get_mut(head.as_str()) {
        delete_path(map, rest);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

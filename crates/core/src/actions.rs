// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actions: named units of business logic, authorized per agent.
//!
//! An action takes validated params and a read-only view of agent state and
//! returns a result plus an effect list. Internal effects (state ops,
//! FSM transitions) are applied by the strategy; external directives are
//! passed through to the runtime.

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;
use std::sync::Arc;

use crate::directive::Directive;
use crate::error::BuildError;
use crate::schema::Schema;
use crate::state::{StateMap, StateOp};
use crate::strategy::StrategyEnv;

/// Read-only context handed to an action.
pub struct ActionCtx<'a> {
    pub state: &'a StateMap,
    pub env: &'a StrategyEnv,
}

/// One entry in an action's effect list.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// Applied atomically to agent state before `cmd` returns.
    State(StateOp),
    /// Appended to the directive list `cmd` returns.
    Directive(Directive),
    /// Request an FSM phase change; only meaningful under the FSM strategy.
    Transition(SmolStr),
}

/// Structured action failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFailure {
    pub message: String,
    pub details: Value,
}

impl ActionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), details: Value::Null }
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

impl std::fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// What an action run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Ok { result: Value, effects: Vec<ActionEffect> },
    Err(ActionFailure),
}

impl ActionOutcome {
    pub fn ok(result: Value) -> Self {
        ActionOutcome::Ok { result, effects: Vec::new() }
    }

    pub fn ok_with(result: Value, effects: Vec<ActionEffect>) -> Self {
        ActionOutcome::Ok { result, effects }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ActionOutcome::Err(ActionFailure::new(message))
    }
}

/// A named unit of business logic.
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    /// Schema the params are validated against (strict) before `run`.
    fn params_schema(&self) -> Schema {
        Schema::new()
    }

    fn run(&self, params: &StateMap, ctx: &ActionCtx<'_>) -> ActionOutcome;
}

/// Define an action from a closure.
pub struct FnAction<F> {
    name: SmolStr,
    schema: Schema,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn(&StateMap, &ActionCtx<'_>) -> ActionOutcome + Send + Sync,
{
    pub fn new(name: impl Into<SmolStr>, f: F) -> Self {
        Self { name: name.into(), schema: Schema::new(), f }
    }

    pub fn with_schema(name: impl Into<SmolStr>, schema: Schema, f: F) -> Self {
        Self { name: name.into(), schema, f }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&StateMap, &ActionCtx<'_>) -> ActionOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn params_schema(&self) -> Schema {
        self.schema.clone()
    }

    fn run(&self, params: &StateMap, ctx: &ActionCtx<'_>) -> ActionOutcome {
        (self.f)(params, ctx)
    }
}

/// Actions registered for one agent module, keyed by name.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: IndexMap<SmolStr, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Arc<dyn Action>) -> Result<(), BuildError> {
        let name = SmolStr::new(action.name());
        if self.actions.contains_key(&name) {
            return Err(BuildError::DuplicateAction(name));
        }
        self.actions.insert(name, action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.actions.keys()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;

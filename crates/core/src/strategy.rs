// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy contract.
//!
//! A strategy decides how instructions drive actions. It owns the reserved
//! `__strategy__` slot in agent state exclusively — no other code reads or
//! writes it. The environment (id generator, clock) is injected so `cmd`
//! stays deterministic under test.

pub mod direct;
pub mod fsm;

use serde_json::Value;
use smol_str::SmolStr;
use std::sync::Arc;

use crate::actions::{ActionCtx, ActionEffect, ActionFailure, ActionOutcome, ActionRegistry};
use crate::agent::AgentId;
use crate::clock::{Clock, SystemClock};
use crate::directive::Directive;
use crate::error::CmdError;
use crate::id::{IdGen, UuidIdGen};
use crate::instruction::Instruction;
use crate::router::Route;
use crate::state::{self, StateMap};

/// Reserved state slot owned by the strategy.
pub const STRATEGY_KEY: &str = "__strategy__";
/// Reserved state slot carrying the parent reference of a child agent.
pub const PARENT_KEY: &str = "__parent__";

/// Pseudo-environment injected into strategies and actions.
#[derive(Clone)]
pub struct StrategyEnv {
    pub idgen: Arc<dyn IdGen>,
    pub clock: Arc<dyn Clock>,
}

impl StrategyEnv {
    /// Production environment: UUID v7 ids, system clock.
    pub fn production() -> Self {
        Self { idgen: Arc::new(UuidIdGen), clock: Arc::new(SystemClock) }
    }

    pub fn new(idgen: Arc<dyn IdGen>, clock: Arc<dyn Clock>) -> Self {
        Self { idgen, clock }
    }
}

impl Default for StrategyEnv {
    fn default() -> Self {
        Self::production()
    }
}

/// Context handed to strategy calls.
pub struct StrategyCtx<'a> {
    pub module: &'a str,
    pub agent_id: &'a AgentId,
    pub actions: &'a ActionRegistry,
    pub env: &'a StrategyEnv,
}

impl StrategyCtx<'_> {
    /// URI-reference source for signals emitted on behalf of this agent.
    pub fn source(&self) -> String {
        format!("/agents/{}", self.agent_id)
    }
}

/// Public execution status derived from strategy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Waiting,
    Success,
    Failure,
}

crate::simple_display! {
    RunStatus {
        Idle => "idle",
        Running => "running",
        Waiting => "waiting",
        Success => "success",
        Failure => "failure",
    }
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failure)
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(RunStatus::Idle),
            "running" => Some(RunStatus::Running),
            "waiting" => Some(RunStatus::Waiting),
            "success" => Some(RunStatus::Success),
            "failure" => Some(RunStatus::Failure),
            _ => None,
        }
    }
}

/// Stable public view of the strategy's execution state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrategySnapshot {
    pub status: RunStatus,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "StateMap::is_empty")]
    pub details: StateMap,
}

impl StrategySnapshot {
    pub fn idle() -> Self {
        Self { status: RunStatus::Idle, done: false, result: None, details: StateMap::new() }
    }
}

/// A strategy module. Implementations must derive `snapshot` exclusively
/// from the `__strategy__` slot of the given state.
pub trait Strategy: Send + Sync {
    /// Called once after base validation when an agent value is created.
    /// May seed `__strategy__`.
    fn init(
        &self,
        state: &mut StateMap,
        ctx: &StrategyCtx<'_>,
    ) -> Result<Vec<Directive>, CmdError> {
        let _ = (state, ctx);
        Ok(Vec::new())
    }

    /// Execute normalized instructions against the state, returning the
    /// directives to drain. Action failures are strategy policy; hard
    /// failures return `Err` and the caller discards all state changes.
    fn cmd(
        &self,
        state: &mut StateMap,
        instructions: &[Instruction],
        ctx: &StrategyCtx<'_>,
    ) -> Result<Vec<Directive>, CmdError>;

    /// Convert `__strategy__` into the public snapshot.
    fn snapshot(&self, state: &StateMap) -> StrategySnapshot;

    /// Routes this strategy contributes to the agent's signal router.
    fn signal_routes(&self) -> Vec<Route<SmolStr>> {
        Vec::new()
    }
}

/// Read the strategy slot as a map (empty if unset).
pub fn strategy_state(state: &StateMap) -> StateMap {
    match state.get(STRATEGY_KEY) {
        Some(Value::Object(map)) => map.clone(),
        _ => StateMap::new(),
    }
}

/// Mutate the strategy slot in place, creating it when absent.
pub fn with_strategy_state(state: &mut StateMap, f: impl FnOnce(&mut StateMap)) {
    let entry = state
        .entry(STRATEGY_KEY.to_string())
        .or_insert_with(|| Value::Object(StateMap::new()));
    if !entry.is_object() {
        *entry = Value::Object(StateMap::new());
    }
    if let Value::Object(map) = entry {
        f(map);
    }
}

/// Outcome of running one instruction through the shared action runner.
#[derive(Debug)]
pub(crate) struct InstructionRun {
    pub result: Value,
    pub directives: Vec<Directive>,
    pub transitions: Vec<SmolStr>,
}

/// Validate params and invoke the action, applying internal state effects.
///
/// Shared by the built-in strategies; transitions are collected for the
/// caller to interpret (Direct rejects them, FSM applies them).
pub(crate) fn run_instruction(
    state: &mut StateMap,
    instruction: &Instruction,
    ctx: &StrategyCtx<'_>,
) -> Result<InstructionRun, ActionFailure> {
    let Some(action) = ctx.actions.get(&instruction.action) else {
        return Err(ActionFailure::new(format!(
            "action '{}' not registered",
            instruction.action
        )));
    };

    if let Err(e) = action.params_schema().validate(&instruction.params, true) {
        return Err(ActionFailure::new(format!(
            "invalid params for '{}': {e}",
            instruction.action
        )));
    }

    let outcome = {
        let action_ctx = ActionCtx { state, env: ctx.env };
        action.run(&instruction.params, &action_ctx)
    };

    match outcome {
        ActionOutcome::Ok { result, effects } => {
            let mut directives = Vec::new();
            let mut transitions = Vec::new();
            for effect in effects {
                match effect {
                    ActionEffect::State(op) => state::apply(state, &op),
                    ActionEffect::Directive(directive) => directives.push(directive),
                    ActionEffect::Transition(next) => transitions.push(next),
                }
            }
            Ok(InstructionRun { result, directives, transitions })
        }
        ActionOutcome::Err(failure) => Err(failure),
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;

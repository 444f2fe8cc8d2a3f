// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FSM strategy: a finite-state machine gating execution.
//!
//! The current phase lives at `__strategy__.phase`. Instructions run only
//! when the current phase permits them; actions change phase by returning a
//! transition effect, validated against the declared edges. Terminal phases
//! map to `success`/`failure` in the public snapshot.

use serde_json::Value;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    run_instruction, strategy_state, with_strategy_state, RunStatus, Strategy, StrategyCtx,
    StrategySnapshot,
};
use crate::directive::Directive;
use crate::error::{BuildError, CmdError};
use crate::instruction::Instruction;
use crate::state::StateMap;

/// Hook run when a phase is entered or exited.
pub type PhaseHook = dyn Fn(&mut StateMap) + Send + Sync;

/// How a terminal phase maps into the public snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Success,
    Failure,
}

/// Compile-time FSM configuration.
#[derive(Clone, Default)]
pub struct FsmConfig {
    states: Vec<SmolStr>,
    initial: SmolStr,
    transitions: HashMap<SmolStr, Vec<SmolStr>>,
    /// Action name -> phases in which it may run. Unlisted actions run in
    /// any phase.
    gates: HashMap<SmolStr, Vec<SmolStr>>,
    terminal: HashMap<SmolStr, TerminalKind>,
    on_enter: HashMap<SmolStr, Arc<PhaseHook>>,
    on_exit: HashMap<SmolStr, Arc<PhaseHook>>,
}

impl FsmConfig {
    pub fn new<I, S>(states: I, initial: impl Into<SmolStr>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            initial: initial.into(),
            ..Self::default()
        }
    }

    /// Declare the allowed edges out of a phase.
    pub fn transition<I, S>(mut self, from: impl Into<SmolStr>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.transitions
            .insert(from.into(), to.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict an action to the given phases.
    pub fn gate<I, S>(mut self, action: impl Into<SmolStr>, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.gates
            .insert(action.into(), phases.into_iter().map(Into::into).collect());
        self
    }

    /// Mark a phase as terminal.
    pub fn terminal(mut self, phase: impl Into<SmolStr>, kind: TerminalKind) -> Self {
        self.terminal.insert(phase.into(), kind);
        self
    }

    pub fn on_enter(
        mut self,
        phase: impl Into<SmolStr>,
        hook: impl Fn(&mut StateMap) + Send + Sync + 'static,
    ) -> Self {
        self.on_enter.insert(phase.into(), Arc::new(hook));
        self
    }

    pub fn on_exit(
        mut self,
        phase: impl Into<SmolStr>,
        hook: impl Fn(&mut StateMap) + Send + Sync + 'static,
    ) -> Self {
        self.on_exit.insert(phase.into(), Arc::new(hook));
        self
    }

    fn check(&self) -> Result<(), String> {
        if self.states.is_empty() {
            return Err("no states declared".to_string());
        }
        if !self.states.contains(&self.initial) {
            return Err(format!("initial phase '{}' is not a declared state", self.initial));
        }
        for (from, tos) in &self.transitions {
            if !self.states.contains(from) {
                return Err(format!("transition from unknown phase '{from}'"));
            }
            for to in tos {
                if !self.states.contains(to) {
                    return Err(format!("transition to unknown phase '{to}'"));
                }
            }
        }
        for phase in self.terminal.keys() {
            if !self.states.contains(phase) {
                return Err(format!("terminal marker on unknown phase '{phase}'"));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for FsmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsmConfig")
            .field("states", &self.states)
            .field("initial", &self.initial)
            .field("transitions", &self.transitions)
            .field("gates", &self.gates)
            .finish()
    }
}

/// State-machine-gated strategy.
#[derive(Debug, Clone)]
pub struct FsmStrategy {
    config: FsmConfig,
}

impl FsmStrategy {
    pub fn new(config: FsmConfig) -> Result<Self, BuildError> {
        config.check().map_err(BuildError::StrategyInit)?;
        Ok(Self { config })
    }

    fn phase(&self, state: &StateMap) -> SmolStr {
        strategy_state(state)
            .get("phase")
            .and_then(Value::as_str)
            .map(SmolStr::new)
            .unwrap_or_else(|| self.config.initial.clone())
    }

    fn permits(&self, action: &str, phase: &str) -> bool {
        match self.config.gates.get(action) {
            Some(phases) => phases.iter().any(|p| p == phase),
            None => true,
        }
    }

    fn apply_transition(
        &self,
        state: &mut StateMap,
        from: &SmolStr,
        to: &SmolStr,
    ) -> Result<(), CmdError> {
        let allowed = self
            .config
            .transitions
            .get(from)
            .map(|tos| tos.contains(to))
            .unwrap_or(false);
        if !allowed {
            return Err(CmdError::Strategy(format!(
                "invalid_transition: {from} -> {to}"
            )));
        }
        if let Some(hook) = self.config.on_exit.get(from) {
            hook(state);
        }
        with_strategy_state(state, |s| {
            s.insert("phase".to_string(), Value::from(to.as_str()));
        });
        if let Some(hook) = self.config.on_enter.get(to) {
            hook(state);
        }
        Ok(())
    }
}

impl Strategy for FsmStrategy {
    fn init(
        &self,
        state: &mut StateMap,
        _ctx: &StrategyCtx<'_>,
    ) -> Result<Vec<Directive>, CmdError> {
        let initial = self.config.initial.clone();
        with_strategy_state(state, |s| {
            s.insert("phase".to_string(), Value::from(initial.as_str()));
            s.insert("status".to_string(), Value::from("idle"));
        });
        Ok(Vec::new())
    }

    fn cmd(
        &self,
        state: &mut StateMap,
        instructions: &[Instruction],
        ctx: &StrategyCtx<'_>,
    ) -> Result<Vec<Directive>, CmdError> {
        let mut directives = Vec::new();
        let mut last_result = Value::Null;

        for instruction in instructions {
            let phase = self.phase(state);
            if !self.permits(&instruction.action, &phase) {
                return Err(CmdError::Strategy(format!(
                    "invalid_transition: action '{}' not permitted in phase '{phase}'",
                    instruction.action
                )));
            }

            let run = match run_instruction(state, instruction, ctx) {
                Ok(run) => run,
                Err(failure) => {
                    with_strategy_state(state, |s| {
                        s.insert("status".to_string(), Value::from("failure"));
                        s.insert(
                            "error".to_string(),
                            serde_json::json!({
                                "action": instruction.action.as_str(),
                                "message": failure.message,
                            }),
                        );
                    });
                    directives.push(Directive::Error {
                        kind: SmolStr::new_static("action_failure"),
                        context: serde_json::json!({
                            "action": instruction.action.as_str(),
                            "message": failure.message,
                        }),
                    });
                    return Ok(directives);
                }
            };

            last_result = run.result;
            directives.extend(run.directives);
            for next in &run.transitions {
                let current = self.phase(state);
                self.apply_transition(state, &current, next)?;
            }
        }

        let phase = self.phase(state);
        let status = match self.config.terminal.get(&phase) {
            Some(TerminalKind::Success) => "success",
            Some(TerminalKind::Failure) => "failure",
            None => "running",
        };
        with_strategy_state(state, |s| {
            s.insert("status".to_string(), Value::from(status));
            s.insert("result".to_string(), last_result.clone());
        });
        Ok(directives)
    }

    fn snapshot(&self, state: &StateMap) -> StrategySnapshot {
        let slot = strategy_state(state);
        let phase = self.phase(state);
        let status = match self.config.terminal.get(&phase) {
            Some(TerminalKind::Success) => RunStatus::Success,
            Some(TerminalKind::Failure) => RunStatus::Failure,
            None => slot
                .get("status")
                .and_then(Value::as_str)
                .and_then(RunStatus::parse)
                .unwrap_or(RunStatus::Idle),
        };
        let mut details = StateMap::new();
        details.insert("phase".to_string(), Value::from(phase.as_str()));
        if let Some(error) = slot.get("error") {
            details.insert("error".to_string(), error.clone());
        }
        StrategySnapshot {
            status,
            done: status.is_terminal(),
            result: slot.get("result").cloned(),
            details,
        }
    }
}

#[cfg(test)]
#[path = "fsm_tests.rs"]
mod tests;

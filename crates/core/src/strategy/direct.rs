// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct strategy: sequential execution with first-error-wins
//! short-circuit.
//!
//! Each instruction runs through the pure action runner; internal state
//! effects apply immediately, external directives accumulate in order. On
//! the first failure an `Error` directive is appended, the status flips to
//! `failure`, and remaining instructions are skipped. State changes made by
//! earlier instructions are kept.

use serde_json::Value;
use smol_str::SmolStr;

use super::{
    run_instruction, strategy_state, with_strategy_state, RunStatus, Strategy, StrategyCtx,
    StrategySnapshot,
};
use crate::directive::Directive;
use crate::error::CmdError;
use crate::instruction::Instruction;
use crate::state::StateMap;

/// The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectStrategy;

impl DirectStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for DirectStrategy {
    fn init(
        &self,
        state: &mut StateMap,
        _ctx: &StrategyCtx<'_>,
    ) -> Result<Vec<Directive>, CmdError> {
        with_strategy_state(state, |s| {
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
        with_strategy_state(state, |s| {
            s.insert("status".to_string(), Value::from("running"));
        });

        let mut directives = Vec::new();
        let mut last_result = Value::Null;

        for instruction in instructions {
            let run = match run_instruction(state, instruction, ctx) {
                Ok(run) => run,
                Err(failure) => {
                    // First error wins; remaining instructions do not run.
                    with_strategy_state(state, |s| {
                        s.insert("status".to_string(), Value::from("failure"));
                        s.insert(
                            "error".to_string(),
                            serde_json::json!({
                                "action": instruction.action.as_str(),
                                "message": failure.message,
                                "details": failure.details,
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
            if let Some(next) = run.transitions.first() {
                return Err(CmdError::Strategy(format!(
                    "action '{}' requested transition to '{next}' outside an FSM strategy",
                    instruction.action
                )));
            }
            last_result = run.result;
            directives.extend(run.directives);
        }

        with_strategy_state(state, |s| {
            s.insert("status".to_string(), Value::from("success"));
            s.insert("result".to_string(), last_result.clone());
            s.remove("error");
        });
        Ok(directives)
    }

    fn snapshot(&self, state: &StateMap) -> StrategySnapshot {
        let slot = strategy_state(state);
        let status = slot
            .get("status")
            .and_then(Value::as_str)
            .and_then(RunStatus::parse)
            .unwrap_or(RunStatus::Idle);
        let mut details = StateMap::new();
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
#[path = "direct_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::actions::FnAction;
use crate::agent::AgentId;
use crate::schema::{FieldSpec, FieldType, Schema};
use crate::state::StateOp;
use crate::state;
use crate::test_support::fixed_env;
use serde_json::json;

fn registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry
        .register(Arc::new(FnAction::with_schema(
            "inc",
            Schema::new().field("by", FieldSpec::new(FieldType::Int)),
            |params: &StateMap, ctx: &ActionCtx<'_>| {
                let by = params.get("by").and_then(Value::as_i64).unwrap_or(1);
                let n = ctx.state.get("n").and_then(Value::as_i64).unwrap_or(0);
                ActionOutcome::ok_with(
                    json!(n + by),
                    vec![ActionEffect::State(StateOp::set_key("n", json!(n + by)))],
                )
            },
        )))
        .unwrap();
    registry
        .register(Arc::new(FnAction::new("fail", |_, _| ActionOutcome::error("boom"))))
        .unwrap();
    registry
}

#[test]
fn run_instruction_applies_state_effects() {
    let registry = registry();
    let env = fixed_env();
    let id = AgentId::new("a1");
    let ctx = StrategyCtx { module: "test", agent_id: &id, actions: &registry, env: &env };
    let mut state = state! {"n" => 1};

    let run = run_instruction(&mut state, &Instruction::with_params("inc", state! {"by" => 4}), &ctx)
        .unwrap();
    assert_eq!(run.result, json!(5));
    assert_eq!(state.get("n"), Some(&json!(5)));
    assert!(run.directives.is_empty());
    assert!(run.transitions.is_empty());
}

#[test]
fn run_instruction_validates_params_strictly() {
    let registry = registry();
    let env = fixed_env();
    let id = AgentId::new("a1");
    let ctx = StrategyCtx { module: "test", agent_id: &id, actions: &registry, env: &env };
    let mut state = StateMap::new();

    let err = run_instruction(
        &mut state,
        &Instruction::with_params("inc", state! {"by" => "three"}),
        &ctx,
    )
    .unwrap_err();
    assert!(err.message.contains("invalid params"));
}

#[test]
fn run_instruction_surfaces_action_failures() {
    let registry = registry();
    let env = fixed_env();
    let id = AgentId::new("a1");
    let ctx = StrategyCtx { module: "test", agent_id: &id, actions: &registry, env: &env };
    let mut state = StateMap::new();

    let err = run_instruction(&mut state, &Instruction::new("fail"), &ctx).unwrap_err();
    assert_eq!(err.message, "boom");
}

#[test]
fn run_instruction_rejects_unregistered_actions() {
    let registry = registry();
    let env = fixed_env();
    let id = AgentId::new("a1");
    let ctx = StrategyCtx { module: "test", agent_id: &id, actions: &registry, env: &env };
    let mut state = StateMap::new();

    let err = run_instruction(&mut state, &Instruction::new("ghost"), &ctx).unwrap_err();
    assert!(err.message.contains("not registered"));
}

#[test]
fn strategy_state_helpers() {
    let mut state = StateMap::new();
    assert!(strategy_state(&state).is_empty());

    with_strategy_state(&mut state, |s| {
        s.insert("status".to_string(), Value::from("running"));
    });
    assert_eq!(strategy_state(&state).get("status"), Some(&json!("running")));

    // A non-object slot is replaced rather than corrupted.
    state.insert(STRATEGY_KEY.to_string(), Value::from(42));
    with_strategy_state(&mut state, |s| {
        s.insert("status".to_string(), Value::from("idle"));
    });
    assert_eq!(strategy_state(&state).get("status"), Some(&json!("idle")));
}

#[test]
fn ctx_source_is_agent_uri() {
    let registry = ActionRegistry::new();
    let env = fixed_env();
    let id = AgentId::new("worker-7");
    let ctx = StrategyCtx { module: "test", agent_id: &id, actions: &registry, env: &env };
    assert_eq!(ctx.source(), "/agents/worker-7");
}

#[yare::parameterized(
    idle    = { RunStatus::Idle, false },
    running = { RunStatus::Running, false },
    waiting = { RunStatus::Waiting, false },
    success = { RunStatus::Success, true },
    failure = { RunStatus::Failure, true },
)]
fn terminal_statuses(status: RunStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

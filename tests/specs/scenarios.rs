// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios.

use crate::support::*;
use jido_core::actions::{ActionCtx, ActionEffect, ActionOutcome, FnAction};
use jido_core::agent::AgentDef;
use jido_core::strategy::RunStatus;
use jido_core::{
    CmdError, Directive, FsmConfig, FsmStrategy, NewAgentOpts, Signal, StateMap, TerminalKind,
};
use jido_runtime::ServerError;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Two increments land in order; done is a predicate over state.
#[tokio::test]
async fn counter_accumulates_casts() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(counter_def(), NewAgentOpts::new().id("c1"))
        .unwrap();

    handle.cast(signal("count.inc", json!({"by": 3}))).unwrap();
    handle.cast(signal("count.inc", json!({"by": 2}))).unwrap();

    let view = instance
        .await_state(&handle, WAIT, |state| int(state, "n").unwrap_or(0) >= 5)
        .await
        .unwrap();
    assert_eq!(int(&view.state, "n"), Some(5));
    instance.shutdown().await;
}

/// One order fans out to exactly two topics.
#[tokio::test]
async fn order_fans_out_to_both_topics() {
    let (instance, _out) = test_instance(64);
    let mut warehouse = instance.bus().subscribe("warehouse");
    let mut email = instance.bus().subscribe("email");
    let handle = instance
        .start_agent_def(order_def(), NewAgentOpts::new().id("orders"))
        .unwrap();

    handle.call(signal("order.placed", json!({"id": 42}))).await.unwrap();

    let shipped = collect(&mut warehouse, 1, WAIT).await;
    assert_eq!(shipped.len(), 1);
    assert_eq!(shipped[0].ty, "warehouse.ship");
    assert_eq!(shipped[0].data_map().get("id"), Some(&json!(42)));

    let mailed = collect(&mut email, 1, WAIT).await;
    assert_eq!(mailed.len(), 1);
    assert_eq!(mailed[0].ty, "email.send");
    assert_eq!(mailed[0].data_map().get("id"), Some(&json!(42)));

    // Exactly one each.
    assert!(warehouse.try_recv().is_err());
    assert!(email.try_recv().is_err());
    instance.shutdown().await;
}

/// Coordinator spawns a worker; the worker answers through the
/// injected parent reference.
#[tokio::test]
async fn coordinator_collects_worker_reply() {
    let (instance, _out) = test_instance(64);
    instance.register_module(worker_def());
    let coordinator = instance
        .start_agent_def(coordinator_def(), NewAgentOpts::new().id("coordinator"))
        .unwrap();

    coordinator.cast(signal("task.start", json!({"q": "x"}))).unwrap();

    let report = instance.await_child(&coordinator, "w", Duration::from_secs(5)).await.unwrap();
    assert!(report.done());

    let view = instance
        .await_state(&coordinator, WAIT, |state| {
            state.get("results").and_then(Value::as_array).map(Vec::len).unwrap_or(0) > 0
        })
        .await
        .unwrap();
    assert_eq!(view.get("results"), Some(&json!(["y"])));

    // Parent/child linking: the tracked child is the registered one.
    let process = coordinator.state().await.unwrap();
    assert_eq!(process.children.len(), 1);
    assert_eq!(process.children[0].tag, "w");
    let child = instance.whereis(process.children[0].id.as_str()).unwrap();
    assert_eq!(child.id(), &process.children[0].id);
    instance.shutdown().await;
}

/// A burst past capacity yields exactly one overflow; everything that
/// fit is processed normally.
#[tokio::test]
async fn queue_overflow_is_surfaced_and_bounded() {
    let (instance, mut out) = test_instance(3);
    let def = burst_def(4);
    let handle = instance.start_agent_def(def, NewAgentOpts::new()).unwrap();

    let err = handle.call(signal("burst.go", json!({}))).await.unwrap_err();
    assert!(matches!(err, ServerError::QueueOverflow));

    // The three directives that fit still drain.
    let emitted = collect(&mut out, 3, WAIT).await;
    assert_eq!(emitted.len(), 3);
    let copies: Vec<i64> = emitted
        .iter()
        .filter_map(|s| s.data_map().get("copy").and_then(Value::as_i64))
        .collect();
    assert_eq!(copies, vec![0, 1, 2]);
    assert!(out.try_recv().is_err());
    instance.shutdown().await;
}

/// FSM phases gate execution.
#[tokio::test]
async fn fsm_gates_work_until_started() {
    let (instance, _out) = test_instance(64);
    let handle = instance.start_agent_def(fsm_def(), NewAgentOpts::new()).unwrap();

    let err = handle.call(signal("fsm.work", json!({}))).await.unwrap_err();
    match err {
        ServerError::Cmd(CmdError::Strategy(msg)) => {
            assert!(msg.contains("invalid_transition"), "unexpected: {msg}")
        }
        other => panic!("expected strategy error, got {other:?}"),
    }

    handle.call(signal("fsm.start", json!({}))).await.unwrap();
    handle.call(signal("fsm.work", json!({}))).await.unwrap();
    let view = handle.call(signal("fsm.finish", json!({}))).await.unwrap();
    assert_eq!(view.snapshot.status, RunStatus::Success);
    assert!(view.snapshot.done);
    instance.shutdown().await;
}

/// A scheduled message is re-ingested exactly once after the delay.
#[tokio::test]
async fn schedule_delivers_exactly_once() {
    let (instance, _out) = test_instance(64);
    let handle = instance.start_agent_def(schedule_def(), NewAgentOpts::new()).unwrap();

    let started = std::time::Instant::now();
    handle.cast(signal("timer.arm", json!({"delay_ms": 100}))).unwrap();

    let view = instance
        .await_state(&handle, WAIT, |state| int(state, "n") == Some(1))
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(int(&view.state, "n"), Some(1));

    // No duplicates.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let view = handle.state().await.unwrap();
    assert_eq!(int(&view.agent.state, "n"), Some(1));
    instance.shutdown().await;
}

/// Module whose `burst.go` emits `copies` signals via default dispatch.
fn burst_def(copies: usize) -> Arc<AgentDef> {
    AgentDef::builder("burst")
        .action(Arc::new(FnAction::new("burst", move |_params: &StateMap, ctx: &ActionCtx<'_>| {
            let mut effects = Vec::new();
            for copy in 0..copies {
                match Signal::generated(ctx.env.idgen.as_ref(), "burst.copy", "/agents/burst") {
                    Ok(signal) => effects.push(ActionEffect::Directive(Directive::emit(
                        signal.data(json!({"copy": copy})),
                    ))),
                    Err(e) => return ActionOutcome::error(e.to_string()),
                }
            }
            ActionOutcome::ok_with(json!(copies), effects)
        })))
        .route("burst.go", "burst")
        .build()
        .unwrap_or_else(|e| panic!("burst def: {e}"))
}

/// FSM module: `idle -> running -> done`, `work` gated to `running`.
fn fsm_def() -> Arc<AgentDef> {
    let config = FsmConfig::new(["idle", "running", "done"], "idle")
        .transition("idle", ["running"])
        .transition("running", ["done"])
        .gate("work", ["running"])
        .terminal("done", TerminalKind::Success);
    let strategy = FsmStrategy::new(config).unwrap_or_else(|e| panic!("fsm config: {e}"));

    AgentDef::builder("gated")
        .strategy(Arc::new(strategy))
        .action(Arc::new(FnAction::new("start", |_: &StateMap, _: &ActionCtx<'_>| {
            ActionOutcome::ok_with(json!(null), vec![ActionEffect::Transition("running".into())])
        })))
        .action(Arc::new(FnAction::new("work", |_: &StateMap, ctx: &ActionCtx<'_>| {
            let done = ctx.state.get("work_done").and_then(Value::as_i64).unwrap_or(0);
            ActionOutcome::ok_with(
                json!(done + 1),
                vec![ActionEffect::State(jido_core::StateOp::set_key(
                    "work_done",
                    json!(done + 1),
                ))],
            )
        })))
        .action(Arc::new(FnAction::new("finish", |_: &StateMap, _: &ActionCtx<'_>| {
            ActionOutcome::ok_with(json!("done"), vec![ActionEffect::Transition("done".into())])
        })))
        .route("fsm.start", "start")
        .route("fsm.work", "work")
        .route("fsm.finish", "finish")
        .build()
        .unwrap_or_else(|e| panic!("fsm def: {e}"))
}

/// Module whose `timer.arm` schedules a tick back to itself; each tick
/// increments `n`.
fn schedule_def() -> Arc<AgentDef> {
    let inc = FnAction::new("inc", |_params: &StateMap, ctx: &ActionCtx<'_>| {
        let n = ctx.state.get("n").and_then(Value::as_i64).unwrap_or(0);
        ActionOutcome::ok_with(
            json!(n + 1),
            vec![ActionEffect::State(jido_core::StateOp::set_key("n", json!(n + 1)))],
        )
    });
    AgentDef::builder("ticker")
        .action(Arc::new(inc))
        .action(Arc::new(FnAction::new("arm", |params: &StateMap, ctx: &ActionCtx<'_>| {
            let delay = params.get("delay_ms").and_then(Value::as_u64).unwrap_or(100);
            match Signal::tick(ctx.env.idgen.as_ref(), "/agents/ticker") {
                Ok(tick) => ActionOutcome::ok_with(
                    json!(null),
                    vec![ActionEffect::Directive(Directive::Schedule {
                        delay: Duration::from_millis(delay),
                        message: Box::new(tick),
                    })],
                ),
                Err(e) => ActionOutcome::error(e.to_string()),
            }
        })))
        .route(jido_core::signal::types::TICK, "inc")
        .route("timer.arm", "arm")
        .build()
        .unwrap_or_else(|e| panic!("ticker def: {e}"))
}

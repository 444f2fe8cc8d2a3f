// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-crate property checks.

use crate::support::*;
use jido_core::actions::{ActionCtx, ActionEffect, ActionOutcome, FnAction};
use jido_core::agent::AgentDef;
use jido_core::directive::{OnParentDeath, SpawnOpts};
use jido_core::{Directive, NewAgentOpts, Signal, StateMap, StopReason};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Queue-FIFO: directives from ordered signals drain as the concatenation
/// of their directive lists.
#[tokio::test]
async fn signal_order_is_directive_order() {
    let (instance, mut out) = test_instance(256);
    let handle = instance.start_agent_def(echo_def(), NewAgentOpts::new()).unwrap();

    for seq in 0..4 {
        handle.cast(signal("echo.pair", json!({"seq": seq}))).unwrap();
    }

    // Each signal emits two copies; the stream must be (0,a)(0,b)(1,a)...
    let emitted = collect(&mut out, 8, WAIT).await;
    let observed: Vec<(i64, String)> = emitted
        .iter()
        .filter_map(|s| {
            let data = s.data_map();
            Some((
                data.get("seq").and_then(Value::as_i64)?,
                data.get("part").and_then(Value::as_str)?.to_string(),
            ))
        })
        .collect();
    let expected: Vec<(i64, String)> = (0..4)
        .flat_map(|seq| [(seq, "a".to_string()), (seq, "b".to_string())])
        .collect();
    assert_eq!(observed, expected);
    instance.shutdown().await;
}

/// No stop on completion: a terminal strategy status leaves the process
/// alive and queryable.
#[tokio::test]
async fn terminal_status_does_not_stop_the_process() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(counter_def(), NewAgentOpts::new().id("c1"))
        .unwrap();

    handle.call(signal("count.inc", json!({"by": 1}))).await.unwrap();
    let report = instance.await_status(&handle, WAIT).await.unwrap();
    assert!(report.done());

    assert!(handle.is_alive());
    assert!(instance.whereis("c1").is_some());
    let again = handle.call(signal("count.inc", json!({"by": 1}))).await.unwrap();
    assert_eq!(int(&again.state, "n"), Some(2));
    instance.shutdown().await;
}

/// Cron cancellation before the first fire produces zero deliveries.
#[tokio::test]
async fn cron_cancelled_before_first_fire_never_delivers() {
    let (instance, _out) = test_instance(64);
    let handle = instance.start_agent_def(cron_def(), NewAgentOpts::new()).unwrap();

    // One signal arms and immediately cancels the job; the two directives
    // drain back-to-back.
    handle.call(signal("cron.arm_and_cancel", json!({}))).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2200)).await;
    let view = handle.state().await.unwrap();
    assert_eq!(int(&view.agent.state, "n"), None);
    instance.shutdown().await;
}

/// Parent death policies: `stop` children go down with the parent,
/// `orphan` children survive with the parent ref cleared.
#[tokio::test]
async fn parent_death_applies_child_policy() {
    let (instance, _out) = test_instance(64);
    instance.register_module(counter_def());
    let parent = instance
        .start_agent_def(spawner_def(), NewAgentOpts::new().id("parent"))
        .unwrap();

    parent
        .call(signal("spawn.child", json!({"tag": "stopper", "policy": "stop"})))
        .await
        .unwrap();
    parent
        .call(signal("spawn.child", json!({"tag": "keeper", "policy": "orphan"})))
        .await
        .unwrap();

    let process = parent.state().await.unwrap();
    assert_eq!(process.children.len(), 2);
    let find = |tag: &str| {
        process
            .children
            .iter()
            .find(|c| c.tag == tag)
            .map(|c| c.id.clone())
            .unwrap_or_else(|| panic!("missing child {tag}"))
    };
    let stopper = find("stopper");
    let keeper = find("keeper");

    parent.stop(StopReason::Shutdown);

    // The stop-policy child exits with the parent.
    let gone = instance.clone();
    poll(WAIT, move || {
        let gone = gone.clone();
        let stopper = stopper.clone();
        async move { gone.whereis(stopper.as_str()).is_none() }
    })
    .await;

    // The orphan-policy child survives with its parent ref cleared.
    let keeper_handle = instance.whereis(keeper.as_str()).unwrap();
    let probe = keeper_handle.clone();
    poll(WAIT, move || {
        let probe = probe.clone();
        async move { probe.state().await.map(|v| v.parent.is_none()).unwrap_or(false) }
    })
    .await;
    assert!(keeper_handle.is_alive());
    instance.shutdown().await;
}

async fn poll<F, Fut>(timeout: Duration, mut pred: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if pred().await {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(15)).await;
    }
}

/// `echo.pair` emits two signals per input via default dispatch.
fn echo_def() -> Arc<AgentDef> {
    AgentDef::builder("echo")
        .action(Arc::new(FnAction::new("pair", |params: &StateMap, ctx: &ActionCtx<'_>| {
            let seq = params.get("seq").cloned().unwrap_or(Value::Null);
            let mut effects = Vec::new();
            for part in ["a", "b"] {
                match Signal::generated(ctx.env.idgen.as_ref(), "echo.copy", "/agents/echo") {
                    Ok(signal) => effects.push(ActionEffect::Directive(Directive::emit(
                        signal.data(json!({"seq": seq, "part": part})),
                    ))),
                    Err(e) => return ActionOutcome::error(e.to_string()),
                }
            }
            ActionOutcome::ok_with(json!(null), effects)
        })))
        .route("echo.pair", "pair")
        .build()
        .unwrap_or_else(|e| panic!("echo def: {e}"))
}

/// `cron.arm_and_cancel` registers an every-second cron delivering
/// `count.inc` and cancels it in the same effect list.
fn cron_def() -> Arc<AgentDef> {
    let inc = FnAction::new("inc", |_: &StateMap, ctx: &ActionCtx<'_>| {
        let n = ctx.state.get("n").and_then(Value::as_i64).unwrap_or(0);
        ActionOutcome::ok_with(
            json!(n + 1),
            vec![ActionEffect::State(jido_core::StateOp::set_key("n", json!(n + 1)))],
        )
    });
    AgentDef::builder("cronies")
        .action(Arc::new(inc))
        .action(Arc::new(FnAction::new("arm_and_cancel", |_: &StateMap, ctx: &ActionCtx<'_>| {
            match Signal::generated(ctx.env.idgen.as_ref(), "count.inc", "/agents/cronies") {
                Ok(tick) => ActionOutcome::ok_with(
                    json!(null),
                    vec![
                        ActionEffect::Directive(Directive::Cron {
                            expr: "* * * * * *".to_string(),
                            message: Box::new(tick.data(json!({}))),
                            job_id: "tick".into(),
                        }),
                        ActionEffect::Directive(Directive::CronCancel { job_id: "tick".into() }),
                    ],
                ),
                Err(e) => ActionOutcome::error(e.to_string()),
            }
        })))
        .route("count.inc", "inc")
        .route("cron.arm_and_cancel", "arm_and_cancel")
        .build()
        .unwrap_or_else(|e| panic!("cron def: {e}"))
}

/// `spawn.child` spawns a counter child with a per-child parent-death
/// policy.
fn spawner_def() -> Arc<AgentDef> {
    AgentDef::builder("spawner")
        .action(Arc::new(FnAction::new("spawn_child", |params: &StateMap, _: &ActionCtx<'_>| {
            let tag = params.get("tag").and_then(Value::as_str).unwrap_or("child");
            let policy = match params.get("policy").and_then(Value::as_str) {
                Some("stop") => OnParentDeath::Stop,
                Some("orphan") => OnParentDeath::Orphan,
                _ => OnParentDeath::Continue,
            };
            ActionOutcome::ok_with(
                json!(null),
                vec![ActionEffect::Directive(Directive::SpawnAgent {
                    module: "counter".into(),
                    tag: tag.into(),
                    opts: SpawnOpts { on_parent_death: policy, ..Default::default() },
                    meta: Value::Null,
                })],
            )
        })))
        .route("spawn.child", "spawn_child")
        .build()
        .unwrap_or_else(|e| panic!("spawner def: {e}"))
}

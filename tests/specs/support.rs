// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the spec suite.

use jido_core::actions::{ActionCtx, ActionEffect, ActionOutcome, FnAction};
use jido_core::agent::AgentDef;
use jido_core::dispatch::Dispatch;
use jido_core::schema::{FieldSpec, FieldType, Schema};
use jido_core::signal::Signal;
use jido_core::state::{StateMap, StateOp};
use jido_core::Directive;
use jido_runtime::{Instance, InstanceConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub const WAIT: Duration = Duration::from_secs(3);

/// Instance with default-dispatch emissions observable on the `out` topic.
pub fn test_instance(capacity: usize) -> (Instance, broadcast::Receiver<Signal>) {
    let instance = Instance::start(
        "specs",
        InstanceConfig::default()
            .mailbox_capacity(capacity)
            .default_dispatch(Dispatch::pubsub("out")),
    );
    let out = instance.bus().subscribe("out");
    (instance, out)
}

pub fn signal(ty: &str, data: Value) -> Signal {
    Signal::new(ty, "/specs").unwrap_or_else(|e| panic!("signal: {e}")).data(data)
}

pub async fn collect(
    rx: &mut broadcast::Receiver<Signal>,
    n: usize,
    timeout: Duration,
) -> Vec<Signal> {
    let mut signals = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;
    while signals.len() < n {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(signal)) => signals.push(signal),
            Ok(Err(_)) | Err(_) => break,
        }
    }
    signals
}

pub fn int(state: &StateMap, key: &str) -> Option<i64> {
    state.get(key).and_then(Value::as_i64)
}

/// The S1 counter: `state = {n: int = 0}`, `count.inc` routed to `inc`.
pub fn counter_def() -> Arc<AgentDef> {
    let inc = FnAction::with_schema(
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
    );
    AgentDef::builder("counter")
        .schema(Schema::new().field("n", FieldSpec::new(FieldType::Int).default_value(json!(0))))
        .action(Arc::new(inc))
        .route("count.inc", "inc")
        .build()
        .unwrap_or_else(|e| panic!("counter def: {e}"))
}

/// Order-taking module for the fan-out scenario: `order.placed` produces
/// one Emit per downstream topic.
pub fn order_def() -> Arc<AgentDef> {
    AgentDef::builder("orders")
        .action(Arc::new(FnAction::new("place_order", |params: &StateMap, ctx: &ActionCtx<'_>| {
            let id = params.get("id").cloned().unwrap_or(Value::Null);
            let ship = Signal::generated(ctx.env.idgen.as_ref(), "warehouse.ship", "/agents/orders");
            let mail = Signal::generated(ctx.env.idgen.as_ref(), "email.send", "/agents/orders");
            match (ship, mail) {
                (Ok(ship), Ok(mail)) => ActionOutcome::ok_with(
                    json!(null),
                    vec![
                        ActionEffect::Directive(Directive::Emit {
                            signal: ship.data(json!({"id": id})),
                            dispatch: Some(Dispatch::pubsub("warehouse")),
                        }),
                        ActionEffect::Directive(Directive::Emit {
                            signal: mail.data(json!({"id": id})),
                            dispatch: Some(Dispatch::pubsub("email")),
                        }),
                    ],
                ),
                _ => ActionOutcome::error("signal build failed"),
            }
        })))
        .route("order.placed", "place_order")
        .build()
        .unwrap_or_else(|e| panic!("order def: {e}"))
}

/// Coordinator for the parent/child scenario.
///
/// `task.start` spawns a worker under tag `w` and records the question;
/// `jido.child.started` kicks the worker; `task.done` collects the answer.
pub fn coordinator_def() -> Arc<AgentDef> {
    AgentDef::builder("coordinator")
        .schema(
            Schema::new()
                .field("results", FieldSpec::new(FieldType::List).default_value(json!([]))),
        )
        .action(Arc::new(FnAction::new("start_task", |params: &StateMap, _ctx: &ActionCtx<'_>| {
            let q = params.get("q").cloned().unwrap_or(Value::Null);
            ActionOutcome::ok_with(
                json!(null),
                vec![
                    ActionEffect::State(StateOp::set_key("q", q.clone())),
                    ActionEffect::Directive(Directive::SpawnAgent {
                        module: "worker".into(),
                        tag: "w".into(),
                        opts: Default::default(),
                        meta: json!({"q": q}),
                    }),
                ],
            )
        })))
        .action(Arc::new(FnAction::new("kick_child", |params: &StateMap, ctx: &ActionCtx<'_>| {
            let child_id = params.get("id").and_then(Value::as_str).unwrap_or_default();
            let q = ctx.state.get("q").cloned().unwrap_or(Value::Null);
            match Signal::generated(ctx.env.idgen.as_ref(), "task.run", "/agents/coordinator") {
                Ok(run) => ActionOutcome::ok_with(
                    json!(null),
                    vec![ActionEffect::Directive(Directive::Emit {
                        signal: run.data(json!({"q": q})),
                        dispatch: Some(Dispatch::named(child_id)),
                    })],
                ),
                Err(e) => ActionOutcome::error(e.to_string()),
            }
        })))
        .action(Arc::new(FnAction::new("record_result", |params: &StateMap, ctx: &ActionCtx<'_>| {
            let mut results = ctx
                .state
                .get("results")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            results.push(params.get("a").cloned().unwrap_or(Value::Null));
            ActionOutcome::ok_with(
                json!(results.len()),
                vec![ActionEffect::State(StateOp::set_key("results", Value::Array(results)))],
            )
        })))
        .route("task.start", "start_task")
        .route("jido.child.started", "kick_child")
        .route("task.done", "record_result")
        .build()
        .unwrap_or_else(|e| panic!("coordinator def: {e}"))
}

/// Worker for the parent/child scenario: answers `task.run` back to its
/// parent through the injected parent reference.
pub fn worker_def() -> Arc<AgentDef> {
    AgentDef::builder("worker")
        .action(Arc::new(FnAction::new("do_work", |_params: &StateMap, ctx: &ActionCtx<'_>| {
            let parent_id = ctx
                .state
                .get("__parent__")
                .and_then(|p| p.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match Signal::generated(ctx.env.idgen.as_ref(), "task.done", "/agents/worker") {
                Ok(done) => ActionOutcome::ok_with(
                    json!("y"),
                    vec![ActionEffect::Directive(Directive::Emit {
                        signal: done.data(json!({"a": "y"})),
                        dispatch: Some(Dispatch::named(parent_id)),
                    })],
                ),
                Err(e) => ActionOutcome::error(e.to_string()),
            }
        })))
        .route("task.run", "do_work")
        .build()
        .unwrap_or_else(|e| panic!("worker def: {e}"))
}

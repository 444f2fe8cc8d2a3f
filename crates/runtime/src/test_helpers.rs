// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for runtime tests.

use jido_core::actions::{ActionEffect, ActionOutcome, FnAction};
use jido_core::agent::AgentDef;
use jido_core::dispatch::Dispatch;
use jido_core::signal::Signal;
use jido_core::state::StateMap;
use jido_core::test_support::counter_builder;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::instance::{Instance, InstanceConfig};

/// Best-effort tracing init so `RUST_LOG` works when debugging tests.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Instance with emitted signals observable on the `out` topic.
pub(crate) fn test_instance(capacity: usize) -> (Instance, broadcast::Receiver<Signal>) {
    init_tracing();
    let instance = Instance::start(
        "test",
        InstanceConfig::default()
            .mailbox_capacity(capacity)
            .default_dispatch(Dispatch::pubsub("out")),
    );
    let out = instance.bus().subscribe("out");
    (instance, out)
}

/// The counter module extended with runtime-facing actions:
/// - `echo` emits `count.echoed` carrying its params (default dispatch)
/// - `echo_twice` emits two `count.echoed` signals
pub(crate) fn runtime_counter_def() -> Arc<AgentDef> {
    counter_builder()
        .action(Arc::new(FnAction::new("echo", echo_action(1))))
        .action(Arc::new(FnAction::new("echo_twice", echo_action(2))))
        .route("count.echo", "echo")
        .route("count.echo2", "echo_twice")
        .build()
        .unwrap_or_else(|e| panic!("def must build: {e}"))
}

fn echo_action(
    copies: usize,
) -> impl Fn(&StateMap, &jido_core::actions::ActionCtx<'_>) -> ActionOutcome + Send + Sync {
    move |params: &StateMap, ctx: &jido_core::actions::ActionCtx<'_>| {
        let mut effects = Vec::new();
        for i in 0..copies {
            let signal = Signal::generated(ctx.env.idgen.as_ref(), "count.echoed", "/agents/test");
            match signal {
                Ok(signal) => {
                    let mut data = params.clone();
                    data.insert("copy".to_string(), json!(i));
                    effects.push(ActionEffect::Directive(jido_core::Directive::emit(
                        signal.data(Value::Object(data)),
                    )));
                }
                Err(e) => return ActionOutcome::error(e.to_string()),
            }
        }
        ActionOutcome::ok_with(json!(params.get("seq").cloned().unwrap_or(Value::Null)), effects)
    }
}

/// Collect `n` signals from a broadcast receiver within the timeout.
pub(crate) async fn collect_signals(
    rx: &mut broadcast::Receiver<Signal>,
    n: usize,
    timeout: std::time::Duration,
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

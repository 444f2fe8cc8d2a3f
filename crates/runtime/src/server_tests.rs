// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{collect_signals, runtime_counter_def, test_instance};
use jido_core::NewAgentOpts;
use serde_json::json;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn signal(ty: &str, data: serde_json::Value) -> Signal {
    Signal::new(ty, "/test").unwrap_or_else(|e| panic!("signal: {e}")).data(data)
}

#[tokio::test]
async fn call_replies_after_directives_drain() {
    let (instance, mut out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new().id("c1"))
        .unwrap();

    let view = handle.call(signal("count.echo", json!({"seq": 1}))).await.unwrap();
    assert_eq!(view.id, jido_core::AgentId::new("c1"));

    // The emitted signal was dispatched before the reply.
    let emitted = out.try_recv().unwrap();
    assert_eq!(emitted.ty, "count.echoed");
    assert_eq!(emitted.data_map().get("seq"), Some(&json!(1)));
    instance.shutdown().await;
}

#[tokio::test]
async fn cast_is_fire_and_forget() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    handle.cast(signal("count.inc", json!({"by": 3}))).unwrap();
    handle.cast(signal("count.inc", json!({"by": 2}))).unwrap();

    let view = instance
        .await_state(&handle, WAIT, |state| {
            state.get("n").and_then(serde_json::Value::as_i64) == Some(5)
        })
        .await
        .unwrap();
    assert_eq!(view.get("n"), Some(&json!(5)));
    instance.shutdown().await;
}

#[tokio::test]
async fn unrouted_signal_is_a_noop() {
    let (instance, mut out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    let view = handle.call(signal("unknown.thing", json!({}))).await.unwrap();
    assert_eq!(view.get("n"), Some(&json!(0)));
    assert!(out.try_recv().is_err());
    instance.shutdown().await;
}

#[tokio::test]
async fn call_surfaces_queue_overflow() {
    let (instance, _out) = test_instance(1);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    // Two directives against capacity one: the second enqueue fails.
    let err = handle.call(signal("count.echo2", json!({"seq": 1}))).await.unwrap_err();
    assert!(matches!(err, ServerError::QueueOverflow));
    instance.shutdown().await;
}

#[tokio::test]
async fn directives_from_ordered_signals_drain_in_order() {
    let (instance, mut out) = test_instance(256);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    for seq in 0..5 {
        handle.cast(signal("count.echo", json!({"seq": seq}))).unwrap();
    }

    let signals = collect_signals(&mut out, 5, WAIT).await;
    let seqs: Vec<i64> = signals
        .iter()
        .filter_map(|s| s.data_map().get("seq").and_then(serde_json::Value::as_i64))
        .collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    instance.shutdown().await;
}

#[tokio::test]
async fn state_exposes_process_metadata() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new().id("c1"))
        .unwrap();
    handle.call(signal("count.inc", json!({"by": 1}))).await.unwrap();

    let view = handle.state().await.unwrap();
    assert_eq!(view.agent.id, jido_core::AgentId::new("c1"));
    assert_eq!(view.queue_depth, 0);
    assert!(!view.processing);
    assert!(view.children.is_empty());
    assert!(view.parent.is_none());
    instance.shutdown().await;
}

#[tokio::test]
async fn status_reports_done_after_success() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    let before = handle.status().await.unwrap();
    assert!(!before.done());

    handle.call(signal("count.inc", json!({"by": 1}))).await.unwrap();
    let after = handle.status().await.unwrap();
    assert!(after.done());
    assert_eq!(after.snapshot.status, jido_core::RunStatus::Success);
    instance.shutdown().await;
}

#[tokio::test]
async fn process_stays_alive_after_terminal_status() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    handle.call(signal("count.inc", json!({"by": 1}))).await.unwrap();
    assert!(handle.status().await.unwrap().done());

    // Done is a status, not an exit: the server keeps accepting signals.
    assert!(handle.is_alive());
    let view = handle.call(signal("count.inc", json!({"by": 1}))).await.unwrap();
    assert_eq!(view.get("n"), Some(&json!(2)));
    instance.shutdown().await;
}

#[tokio::test]
async fn stop_terminates_and_unregisters() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new().id("c1"))
        .unwrap();
    assert_eq!(instance.agent_count(), 1);

    handle.stop(jido_core::StopReason::Shutdown);
    crate::instance::poll_until(WAIT, || async {
        if instance.agent_count() == 0 { Some(Ok(())) } else { None }
    })
    .await
    .unwrap();
    assert!(instance.whereis("c1").is_none());
    instance.shutdown().await;
}

#[tokio::test]
async fn error_outcome_emits_error_signal() {
    let (instance, mut out) = test_instance(64);
    // A def whose veto plugin rejects everything under blocked.*
    struct Veto;
    impl jido_core::Plugin for Veto {
        fn name(&self) -> &str {
            "veto"
        }
        fn state_key(&self) -> &str {
            "veto"
        }
        fn handle_signal(
            &self,
            signal: &Signal,
            _ctx: &jido_core::PluginCtx<'_>,
        ) -> jido_core::SignalDecision {
            if signal.ty.starts_with("blocked.") {
                jido_core::SignalDecision::Error("policy".to_string())
            } else {
                jido_core::SignalDecision::Continue
            }
        }
    }
    let def = jido_core::test_support::counter_builder()
        .plugin(jido_core::PluginMount::new(std::sync::Arc::new(Veto)))
        .build()
        .unwrap();
    let handle = instance.start_agent_def(def, NewAgentOpts::new()).unwrap();

    let blocked = signal("blocked.thing", json!({}));
    let blocked_id = blocked.id.clone();
    let err = handle.call(blocked).await.unwrap_err();
    assert!(matches!(err, ServerError::Cmd(jido_core::CmdError::Strategy(_))));

    let error_signal = collect_signals(&mut out, 1, WAIT).await.remove(0);
    assert_eq!(error_signal.ty, jido_core::signal::types::ERROR);
    assert_eq!(error_signal.cause(), Some(blocked_id.as_str()));
    instance.shutdown().await;
}

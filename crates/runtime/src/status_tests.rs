// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{runtime_counter_def, test_instance};
use futures_util::StreamExt;
use jido_core::NewAgentOpts;
use serde_json::json;

#[tokio::test]
async fn stream_status_polls_until_done() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new().id("c1"))
        .unwrap();

    let signal = jido_core::Signal::new("count.inc", "/test")
        .unwrap()
        .data(json!({"by": 1}));
    handle.call(signal).await.unwrap();

    let mut stream = Box::pin(stream_status(handle.clone(), Duration::from_millis(5)));
    let report = stream.next().await.unwrap();
    assert_eq!(report.agent_id, AgentId::new("c1"));
    assert!(report.done());
    instance.shutdown().await;
}

#[tokio::test]
async fn stream_ends_when_the_server_goes_away() {
    let (instance, _out) = test_instance(64);
    let handle = instance
        .start_agent_def(runtime_counter_def(), NewAgentOpts::new())
        .unwrap();

    let mut stream = Box::pin(stream_status(handle.clone(), Duration::from_millis(5)));
    assert!(stream.next().await.is_some());

    handle.stop(jido_core::StopReason::Shutdown);
    // Drain until the poll hits the dead server.
    let mut remaining = 200;
    while stream.next().await.is_some() {
        remaining -= 1;
        assert!(remaining > 0, "stream never ended");
    }
    instance.shutdown().await;
}

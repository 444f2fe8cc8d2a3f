// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status snapshots and polling.

use futures_util::Stream;
use jido_core::agent::{AgentId, ParentRef};
use jido_core::state::StateMap;
use jido_core::strategy::StrategySnapshot;
use serde_json::Value;
use smol_str::SmolStr;
use std::time::Duration;

use crate::server::AgentHandle;

/// Public status: the strategy snapshot plus process metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub agent_id: AgentId,
    pub module: SmolStr,
    pub snapshot: StrategySnapshot,
}

impl StatusReport {
    pub fn done(&self) -> bool {
        self.snapshot.done
    }
}

/// Read-only view of an agent value, returned by `call` and `state`.
#[derive(Debug, Clone)]
pub struct AgentView {
    pub id: AgentId,
    pub module: SmolStr,
    pub state: StateMap,
    pub snapshot: StrategySnapshot,
}

impl AgentView {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }
}

/// Snapshot of one tracked child.
#[derive(Debug, Clone)]
pub struct ChildView {
    pub tag: SmolStr,
    pub id: AgentId,
    pub module: SmolStr,
    pub started_at_ms: u64,
    pub meta: Value,
}

/// Read-only view of the whole server process state.
#[derive(Debug, Clone)]
pub struct ProcessView {
    pub agent: AgentView,
    pub queue_depth: usize,
    pub queue_high_watermark: usize,
    pub processing: bool,
    pub children: Vec<ChildView>,
    pub parent: Option<ParentRef>,
}

/// Lazy sequence of status reports polled at a fixed interval.
///
/// The stream ends when the server goes away.
pub fn stream_status(
    handle: AgentHandle,
    interval: Duration,
) -> impl Stream<Item = StatusReport> {
    futures_util::stream::unfold(handle, move |handle| async move {
        tokio::time::sleep(interval).await;
        match handle.status().await {
            Ok(report) => Some((report, handle)),
            Err(_) => None,
        }
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

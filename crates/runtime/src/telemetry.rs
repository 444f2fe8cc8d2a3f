// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry targets and span helpers.
//!
//! Structured events are emitted through `tracing` under stable targets so
//! embedding applications can subscribe per concern.

use jido_core::agent::AgentId;
use jido_core::directive::Directive;
use jido_core::signal::Signal;

pub const SIGNAL: &str = "server.signal";
pub const CMD: &str = "agent.cmd";
pub const DIRECTIVE: &str = "server.directive";
pub const QUEUE: &str = "server.queue";
pub const CHILD: &str = "server.child";
pub const SCHEDULE: &str = "server.schedule";
pub const CRON: &str = "server.cron";

/// Signal ingress.
pub(crate) fn signal_start(agent_id: &AgentId, signal: &Signal) {
    tracing::debug!(
        target: SIGNAL,
        agent_id = %agent_id,
        signal_type = %signal.ty,
        id = %signal.id,
        "start"
    );
}

pub(crate) fn signal_stop(agent_id: &AgentId, signal: &Signal, elapsed_ms: u64) {
    tracing::debug!(
        target: SIGNAL,
        agent_id = %agent_id,
        signal_type = %signal.ty,
        id = %signal.id,
        elapsed_ms,
        "stop"
    );
}

/// `cmd` invocation measurements.
pub(crate) fn cmd_stop(agent_id: &AgentId, instruction_count: usize, elapsed_ms: u64) {
    tracing::debug!(
        target: CMD,
        agent_id = %agent_id,
        instruction_count,
        elapsed_ms,
        "stop"
    );
}

/// Directive execution: name and structured fields up front, outcome and
/// elapsed time after.
pub(crate) fn directive_start(agent_id: &AgentId, directive: &Directive) -> bool {
    let verbose = directive.verbose();
    if verbose {
        let info: String = directive
            .fields()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(
            target: DIRECTIVE,
            agent_id = %agent_id,
            "executing directive={} {}",
            directive.name(),
            info
        );
    }
    verbose
}

pub(crate) fn directive_stop(
    agent_id: &AgentId,
    directive: &Directive,
    verbose: bool,
    ok: bool,
    elapsed_ms: u64,
) {
    if verbose {
        tracing::info!(target: DIRECTIVE, agent_id = %agent_id, ok, elapsed_ms, "completed");
    } else {
        tracing::debug!(
            target: DIRECTIVE,
            agent_id = %agent_id,
            ok,
            elapsed_ms,
            "directive={}",
            directive.name()
        );
    }
}

pub(crate) fn queue_depth(agent_id: &AgentId, depth: usize, high_watermark: usize) {
    tracing::trace!(target: QUEUE, agent_id = %agent_id, depth, high_watermark, "depth");
}

pub(crate) fn queue_overflow(agent_id: &AgentId, signal: &Signal, capacity: usize) {
    tracing::warn!(
        target: QUEUE,
        agent_id = %agent_id,
        signal_type = %signal.ty,
        capacity,
        "overflow"
    );
}

pub(crate) fn child_started(agent_id: &AgentId, tag: &str, child_id: &AgentId) {
    tracing::info!(target: CHILD, agent_id = %agent_id, tag, child_id = %child_id, "started");
}

pub(crate) fn child_exit(agent_id: &AgentId, tag: &str, child_id: &AgentId, reason: &str) {
    tracing::info!(
        target: CHILD,
        agent_id = %agent_id,
        tag,
        child_id = %child_id,
        reason,
        "exit"
    );
}

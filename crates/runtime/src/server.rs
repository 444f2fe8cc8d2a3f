// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent server: one task owning one agent value.
//!
//! All mutations — agent value, directive queue, children, pending call
//! replies — happen on this single task. Incoming signals route through the
//! pure core (`Agent::cmd`); produced directives land in the bounded queue;
//! the loop alternates between mailbox messages and draining one directive
//! at a time. Synchronous callers get their reply once every directive
//! their signal produced has drained (tracked by queue watermark).

use jido_core::agent::{Agent, AgentId, ParentRef};
use jido_core::directive::{OnParentDeath, StopReason};
use jido_core::dispatch::Dispatch;
use jido_core::instruction::Input;
use jido_core::signal::Signal;
use jido_dispatch::{SignalSink, SinkError};
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::error::ServerError;
use crate::instance::InstanceShared;
use crate::queue::DirectiveQueue;
use crate::status::{AgentView, ChildView, ProcessView, StatusReport};
use crate::telemetry;

/// Messages handled by the server task.
pub(crate) enum ServerMsg {
    Call {
        signal: Signal,
        reply: oneshot::Sender<Result<AgentView, ServerError>>,
    },
    Cast {
        signal: Signal,
    },
    /// Async ingress: scheduler firings, task results, dispatched signals.
    Info {
        signal: Signal,
    },
    ChildExited {
        tag: SmolStr,
        id: AgentId,
        reason: String,
    },
    Orphaned {
        parent_id: AgentId,
    },
    GetState {
        reply: oneshot::Sender<ProcessView>,
    },
    GetStatus {
        reply: oneshot::Sender<StatusReport>,
    },
    Stop {
        reason: StopReason,
    },
}

/// Clonable reference to a running agent server.
#[derive(Clone)]
pub struct AgentHandle {
    id: AgentId,
    module: SmolStr,
    pub(crate) tx: mpsc::Sender<ServerMsg>,
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle").field("id", &self.id).finish()
    }
}

impl AgentHandle {
    pub(crate) fn new(id: AgentId, module: SmolStr, tx: mpsc::Sender<ServerMsg>) -> Self {
        Self { id, module, tx }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Synchronous send: replies with the agent value after every directive
    /// produced by this signal has drained.
    pub async fn call(&self, signal: Signal) -> Result<AgentView, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ServerMsg::Call { signal, reply })
            .await
            .map_err(|_| ServerError::InvalidServer)?;
        rx.await.map_err(|_| ServerError::InvalidServer)?
    }

    /// Fire-and-forget send. Errors are limited to enqueue failures.
    pub fn cast(&self, signal: Signal) -> Result<(), ServerError> {
        self.tx
            .try_send(ServerMsg::Cast { signal })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ServerError::QueueOverflow,
                mpsc::error::TrySendError::Closed(_) => ServerError::InvalidServer,
            })
    }

    /// Read-only process state snapshot.
    pub async fn state(&self) -> Result<ProcessView, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ServerMsg::GetState { reply })
            .await
            .map_err(|_| ServerError::InvalidServer)?;
        rx.await.map_err(|_| ServerError::InvalidServer)
    }

    /// Strategy snapshot plus process metadata.
    pub async fn status(&self) -> Result<StatusReport, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ServerMsg::GetStatus { reply })
            .await
            .map_err(|_| ServerError::InvalidServer)?;
        rx.await.map_err(|_| ServerError::InvalidServer)
    }

    /// Request termination. Idempotent; a dead server is already stopped.
    pub fn stop(&self, reason: StopReason) {
        let _ = self.tx.try_send(ServerMsg::Stop { reason });
    }

    /// Whether the server task is still accepting messages.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Mailbox sink for the dispatch layer.
    pub fn sink(&self) -> Arc<dyn SignalSink> {
        Arc::new(HandleSink { tx: self.tx.clone() })
    }

    /// Poll status until `done` or the timeout expires.
    pub async fn await_done(&self, timeout: Duration) -> Result<StatusReport, ServerError> {
        crate::instance::poll_until(timeout, || async {
            match self.status().await {
                Ok(report) if report.done() => Some(Ok(report)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        })
        .await
    }
}

/// Mailbox sink handed to the dispatch layer; wraps signals as `Info`.
pub(crate) struct HandleSink {
    pub(crate) tx: mpsc::Sender<ServerMsg>,
}

impl SignalSink for HandleSink {
    fn try_send(&self, signal: Signal) -> Result<(), SinkError> {
        self.tx.try_send(ServerMsg::Info { signal }).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

pub(crate) struct PendingReply {
    pub watermark: u64,
    pub reply: oneshot::Sender<Result<AgentView, ServerError>>,
}

pub(crate) struct ChildInfo {
    pub id: AgentId,
    pub module: SmolStr,
    pub handle: AgentHandle,
    pub started_at_ms: u64,
    pub meta: Value,
    pub on_parent_death: OnParentDeath,
}

/// Parent mailbox to notify when this server exits.
pub(crate) struct ParentNotify {
    pub tx: mpsc::Sender<ServerMsg>,
    pub tag: SmolStr,
}

pub(crate) struct AgentServer {
    pub(crate) agent: Agent,
    pub(crate) rx: mpsc::Receiver<ServerMsg>,
    pub(crate) self_tx: mpsc::Sender<ServerMsg>,
    pub(crate) queue: DirectiveQueue,
    pub(crate) children: HashMap<SmolStr, ChildInfo>,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) parent_notify: Option<ParentNotify>,
    pub(crate) on_parent_death: OnParentDeath,
    pub(crate) default_dispatch: Dispatch,
    pub(crate) shared: Arc<InstanceShared>,
    pub(crate) pending_replies: Vec<PendingReply>,
    pub(crate) timer_seq: u64,
}

impl AgentServer {
    pub(crate) async fn run(mut self) {
        tracing::debug!(agent_id = %self.agent.id(), module = self.agent.module(), "agent started");
        let reason = self.serve().await;
        self.terminate(reason);
    }

    async fn serve(&mut self) -> StopReason {
        loop {
            if self.queue.is_empty() {
                match self.rx.recv().await {
                    Some(msg) => {
                        if let Some(reason) = self.handle_msg(msg).await {
                            return reason;
                        }
                    }
                    None => return StopReason::Shutdown,
                }
            } else {
                match self.rx.try_recv() {
                    Ok(msg) => {
                        if let Some(reason) = self.handle_msg(msg).await {
                            return reason;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => {
                        if let Some(reason) = self.drain_one().await {
                            return reason;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Disconnected) => return StopReason::Shutdown,
                }
            }
        }
    }

    async fn handle_msg(&mut self, msg: ServerMsg) -> Option<StopReason> {
        match msg {
            ServerMsg::Call { signal, reply } => {
                match self.ingest(signal) {
                    Ok(watermark) => {
                        if self.queue.popped() >= watermark {
                            let _ = reply.send(Ok(self.agent_view()));
                        } else {
                            self.pending_replies.push(PendingReply { watermark, reply });
                        }
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
                None
            }
            ServerMsg::Cast { signal } | ServerMsg::Info { signal } => {
                if let Err(e) = self.ingest(signal) {
                    tracing::warn!(
                        agent_id = %self.agent.id(),
                        error = %e,
                        "async signal not processed"
                    );
                }
                None
            }
            ServerMsg::ChildExited { tag, id, reason } => {
                self.children.remove(&tag);
                telemetry::child_exit(self.agent.id(), &tag, &id, &reason);
                self.ingest_runtime_signal(|idgen, source| {
                    Signal::child_exit(idgen, source, &tag, id.as_str(), &reason)
                });
                None
            }
            ServerMsg::Orphaned { parent_id } => {
                if self.on_parent_death == OnParentDeath::Orphan {
                    let mut attrs = jido_core::StateMap::new();
                    attrs.insert(
                        jido_core::strategy::PARENT_KEY.to_string(),
                        Value::Null,
                    );
                    if let Ok(agent) = self.agent.set(attrs) {
                        self.agent = agent;
                    }
                    self.parent = None;
                }
                self.ingest_runtime_signal(|idgen, source| {
                    Signal::orphaned(idgen, source, parent_id.as_str())
                });
                None
            }
            ServerMsg::GetState { reply } => {
                let _ = reply.send(self.process_view());
                None
            }
            ServerMsg::GetStatus { reply } => {
                let _ = reply.send(self.status_report());
                None
            }
            ServerMsg::Stop { reason } => Some(reason),
        }
    }

    /// Route a signal through `cmd` and enqueue the produced directives.
    ///
    /// Returns the queue watermark a call reply must wait for. An overflow
    /// drops the signal's remaining directives and surfaces the error.
    pub(crate) fn ingest(&mut self, signal: Signal) -> Result<u64, ServerError> {
        telemetry::signal_start(self.agent.id(), &signal);
        let started = std::time::Instant::now();

        let route_count = self.agent.def().routes().match_type(&signal.ty).len();
        let outcome = self.agent.cmd(Input::Signal(signal.clone()));
        telemetry::cmd_stop(self.agent.id(), route_count, started.elapsed().as_millis() as u64);

        self.agent = outcome.agent;
        let origin = Arc::new(signal);

        if let Some(error) = outcome.error {
            // The Error directive still drains (emitting the error signal);
            // the caller gets the failure directly.
            for directive in outcome.directives {
                if self.queue.push(directive, Arc::clone(&origin)).is_err() {
                    telemetry::queue_overflow(self.agent.id(), &origin, self.queue.capacity());
                }
            }
            telemetry::signal_stop(self.agent.id(), &origin, started.elapsed().as_millis() as u64);
            return Err(error.into());
        }

        let mut watermark = self.queue.pushed();
        for directive in outcome.directives {
            match self.queue.push(directive, Arc::clone(&origin)) {
                Ok(seq) => watermark = seq,
                Err(e) => {
                    telemetry::queue_overflow(self.agent.id(), &origin, self.queue.capacity());
                    telemetry::signal_stop(
                        self.agent.id(),
                        &origin,
                        started.elapsed().as_millis() as u64,
                    );
                    return Err(e);
                }
            }
        }
        telemetry::queue_depth(self.agent.id(), self.queue.depth(), self.queue.high_watermark());
        telemetry::signal_stop(self.agent.id(), &origin, started.elapsed().as_millis() as u64);
        Ok(watermark)
    }

    /// Build and ingest a runtime signal (child exit, orphaned), logging
    /// rather than failing when it produces an error.
    fn ingest_runtime_signal(
        &mut self,
        build: impl FnOnce(
            &dyn jido_core::IdGen,
            String,
        ) -> Result<Signal, jido_core::SignalError>,
    ) {
        let idgen = Arc::clone(&self.agent.def().env().idgen);
        let source = format!("/agents/{}", self.agent.id());
        match build(idgen.as_ref(), source) {
            Ok(signal) => {
                if let Err(e) = self.ingest(signal) {
                    tracing::warn!(agent_id = %self.agent.id(), error = %e, "runtime signal dropped");
                }
            }
            Err(e) => {
                tracing::error!(agent_id = %self.agent.id(), error = %e, "runtime signal build failed");
            }
        }
    }

    async fn drain_one(&mut self) -> Option<StopReason> {
        let queued = self.queue.pop()?;
        let directive = queued.directive.clone();
        let verbose = telemetry::directive_start(self.agent.id(), &directive);
        let started = std::time::Instant::now();

        let outcome = self.exec_directive(queued).await;

        telemetry::directive_stop(
            self.agent.id(),
            &directive,
            verbose,
            matches!(outcome, crate::exec::ExecOutcome::Continue),
            started.elapsed().as_millis() as u64,
        );
        self.flush_replies();
        telemetry::queue_depth(self.agent.id(), self.queue.depth(), self.queue.high_watermark());

        match outcome {
            crate::exec::ExecOutcome::Continue => None,
            crate::exec::ExecOutcome::Stop(reason) => Some(reason),
        }
    }

    fn flush_replies(&mut self) {
        let popped = self.queue.popped();
        let mut i = 0;
        while i < self.pending_replies.len() {
            if self.pending_replies[i].watermark <= popped {
                let pending = self.pending_replies.swap_remove(i);
                let _ = pending.reply.send(Ok(self.agent_view()));
            } else {
                i += 1;
            }
        }
    }

    pub(crate) fn agent_view(&self) -> AgentView {
        AgentView {
            id: self.agent.id().clone(),
            module: SmolStr::new(self.agent.module()),
            state: self.agent.state().clone(),
            snapshot: self.agent.strategy_snapshot(),
        }
    }

    fn status_report(&self) -> StatusReport {
        StatusReport {
            agent_id: self.agent.id().clone(),
            module: SmolStr::new(self.agent.module()),
            snapshot: self.agent.strategy_snapshot(),
        }
    }

    fn process_view(&self) -> ProcessView {
        ProcessView {
            agent: self.agent_view(),
            queue_depth: self.queue.depth(),
            queue_high_watermark: self.queue.high_watermark(),
            processing: !self.queue.is_empty(),
            children: self
                .children
                .iter()
                .map(|(tag, child)| ChildView {
                    tag: tag.clone(),
                    id: child.id.clone(),
                    module: child.module.clone(),
                    started_at_ms: child.started_at_ms,
                    meta: child.meta.clone(),
                })
                .collect(),
            parent: self.parent.clone(),
        }
    }

    fn terminate(mut self, reason: StopReason) {
        for (_, child) in self.children.drain() {
            match child.on_parent_death {
                OnParentDeath::Stop => {
                    child.handle.stop(StopReason::Shutdown);
                }
                OnParentDeath::Continue | OnParentDeath::Orphan => {
                    let _ = child.handle.tx.try_send(ServerMsg::Orphaned {
                        parent_id: self.agent.id().clone(),
                    });
                }
            }
        }
        if let Some(notify) = self.parent_notify.take() {
            let _ = notify.tx.try_send(ServerMsg::ChildExited {
                tag: notify.tag,
                id: self.agent.id().clone(),
                reason: reason.to_string(),
            });
        }
        self.shared.registry.unregister(self.agent.id().as_str());
        self.shared.agents.lock().remove(self.agent.id());
        tracing::info!(agent_id = %self.agent.id(), %reason, "agent stopped");
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;

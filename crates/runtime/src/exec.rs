// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directive executors.
//!
//! One match arm per directive. Executors never propagate failures into the
//! drain loop: every error path logs and emits an error signal, and only an
//! explicit `Stop` halts the server.

use jido_core::agent::ParentRef;
use jido_core::directive::{Directive, StopReason};
use jido_core::signal::Signal;
use jido_core::NewAgentOpts;
use serde_json::{json, Value};
use smol_str::SmolStr;
use std::sync::Arc;

use crate::queue::QueuedDirective;
use crate::scheduler::TimerId;
use crate::server::{AgentServer, ChildInfo, ParentNotify, ServerMsg};
use crate::telemetry;

/// What a directive execution decided about the drain.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExecOutcome {
    Continue,
    Stop(StopReason),
}

impl AgentServer {
    pub(crate) async fn exec_directive(&mut self, queued: QueuedDirective) -> ExecOutcome {
        let origin = queued.origin;
        match queued.directive {
            Directive::Emit { signal, dispatch } => {
                let descriptor = dispatch
                    .or_else(|| signal.dispatch_hint.clone())
                    .unwrap_or_else(|| self.default_dispatch.clone());
                if let Err(e) = self.shared.dispatcher.dispatch(&signal, &descriptor).await {
                    tracing::warn!(
                        agent_id = %self.agent.id(),
                        dispatch = descriptor.name(),
                        error = %e,
                        "dispatch failed"
                    );
                    self.emit_error_signal(
                        "dispatch_error",
                        json!({"error": e.to_string(), "signal": signal.log_summary()}),
                        &origin,
                    )
                    .await;
                }
                ExecOutcome::Continue
            }

            Directive::Error { kind, context } => {
                tracing::error!(
                    agent_id = %self.agent.id(),
                    kind = %kind,
                    context = %context,
                    "error directive"
                );
                self.emit_error_signal(&kind, context, &origin).await;
                ExecOutcome::Continue
            }

            Directive::Spawn { task } => {
                match self.shared.workers.get(&task.name) {
                    Some(worker) => {
                        let payload = task.payload.clone();
                        let self_tx = self.self_tx.clone();
                        let agent_id = self.agent.id().clone();
                        self.shared.tasks.spawn(async move {
                            if let Some(signal) = worker.run(payload).await {
                                if self_tx.try_send(ServerMsg::Info { signal }).is_err() {
                                    tracing::debug!(
                                        agent_id = %agent_id,
                                        "task result dropped, agent gone"
                                    );
                                }
                            }
                        });
                    }
                    None => {
                        self.emit_error_signal(
                            "unknown_worker",
                            json!({"task": task.name.as_str()}),
                            &origin,
                        )
                        .await;
                    }
                }
                ExecOutcome::Continue
            }

            Directive::SpawnAgent { module, tag, opts, meta } => {
                self.exec_spawn_agent(module, tag, opts, meta, &origin).await;
                ExecOutcome::Continue
            }

            Directive::StopChild { tag, reason } => {
                match self.children.get(&tag) {
                    Some(child) => child.handle.stop(reason),
                    None => {
                        tracing::debug!(
                            agent_id = %self.agent.id(),
                            tag = %tag,
                            "stop_child: no child under tag"
                        );
                    }
                }
                ExecOutcome::Continue
            }

            Directive::Schedule { delay, message } => {
                if !self.shared.config.scheduler_enabled {
                    tracing::warn!(agent_id = %self.agent.id(), "scheduler disabled, dropping timer");
                    return ExecOutcome::Continue;
                }
                self.timer_seq += 1;
                let id = TimerId::delay(self.agent.id(), self.timer_seq);
                self.shared.scheduler.set_timer(
                    id,
                    delay,
                    self.agent.id().to_string(),
                    (*message).caused_by(origin.as_ref()),
                );
                ExecOutcome::Continue
            }

            Directive::Cron { expr, message, job_id } => {
                if !self.shared.config.scheduler_enabled {
                    tracing::warn!(agent_id = %self.agent.id(), "scheduler disabled, dropping cron");
                    return ExecOutcome::Continue;
                }
                let id = TimerId::cron(self.agent.id(), &job_id);
                if let Err(e) = self.shared.scheduler.set_cron(
                    id,
                    &expr,
                    self.agent.id().to_string(),
                    *message,
                ) {
                    self.emit_error_signal(
                        e.kind(),
                        json!({"expr": expr, "job_id": job_id.as_str(), "error": e.to_string()}),
                        &origin,
                    )
                    .await;
                }
                ExecOutcome::Continue
            }

            Directive::CronCancel { job_id } => {
                let id = TimerId::cron(self.agent.id(), &job_id);
                let existed = self.shared.scheduler.cancel_cron(&id);
                tracing::debug!(
                    target: telemetry::CRON,
                    agent_id = %self.agent.id(),
                    job_id = %job_id,
                    existed,
                    "cancelled"
                );
                ExecOutcome::Continue
            }

            Directive::Stop { reason } => {
                if reason == StopReason::Normal {
                    tracing::warn!(
                        agent_id = %self.agent.id(),
                        "Stop{{normal}} is discouraged; prefer a terminal status in state"
                    );
                }
                ExecOutcome::Stop(reason)
            }
        }
    }

    async fn exec_spawn_agent(
        &mut self,
        module: SmolStr,
        tag: SmolStr,
        opts: jido_core::SpawnOpts,
        meta: Value,
        origin: &Arc<Signal>,
    ) {
        if self.children.contains_key(&tag) {
            self.emit_error_signal("duplicate_tag", json!({"tag": tag.as_str()}), origin).await;
            return;
        }
        let Some(def) = self.shared.module(&module) else {
            self.emit_error_signal("unknown_module", json!({"module": module.as_str()}), origin)
                .await;
            return;
        };

        let parent_ref = ParentRef::new(self.agent.id().clone(), tag.clone(), meta.clone());
        let mut new_opts = NewAgentOpts::new()
            .state(opts.initial_state.clone())
            .parent(parent_ref);
        if let Some(id) = opts.id.clone() {
            new_opts = new_opts.id(id);
        }
        let notify = ParentNotify { tx: self.self_tx.clone(), tag: tag.clone() };

        match crate::instance::spawn_server(
            &self.shared,
            def,
            new_opts,
            opts.on_parent_death,
            Some(notify),
        ) {
            Ok(handle) => {
                let child_id = handle.id().clone();
                telemetry::child_started(self.agent.id(), &tag, &child_id);
                self.children.insert(
                    tag.clone(),
                    ChildInfo {
                        id: child_id.clone(),
                        module,
                        handle,
                        started_at_ms: self.agent.def().env().clock.epoch_ms(),
                        meta,
                        on_parent_death: opts.on_parent_death,
                    },
                );
                // The child is registered and accepting signals; tell the
                // strategy exactly once.
                let idgen = Arc::clone(&self.agent.def().env().idgen);
                let source = format!("/agents/{}", self.agent.id());
                match Signal::child_started(idgen.as_ref(), source, &tag, child_id.as_str()) {
                    Ok(signal) => {
                        let signal = signal.caused_by(origin.as_ref());
                        if let Err(e) = self.ingest(signal) {
                            tracing::warn!(agent_id = %self.agent.id(), error = %e, "child_started dropped");
                        }
                    }
                    Err(e) => {
                        tracing::error!(agent_id = %self.agent.id(), error = %e, "child_started build failed");
                    }
                }
            }
            Err(e) => {
                self.emit_error_signal(
                    e.kind(),
                    json!({"module": module.as_str(), "tag": tag.as_str(), "error": e.to_string()}),
                    origin,
                )
                .await;
            }
        }
    }

    /// Emit the canonical error signal via the server default dispatch.
    /// Failures here are logged only; this path never recurses.
    async fn emit_error_signal(&mut self, kind: &str, context: Value, origin: &Arc<Signal>) {
        let idgen = Arc::clone(&self.agent.def().env().idgen);
        let source = format!("/agents/{}", self.agent.id());
        let signal = match Signal::error_signal(idgen.as_ref(), source, kind, context) {
            Ok(signal) => signal.caused_by(origin.as_ref()),
            Err(e) => {
                tracing::error!(agent_id = %self.agent.id(), error = %e, "error signal build failed");
                return;
            }
        };
        if let Err(e) = self.shared.dispatcher.dispatch(&signal, &self.default_dispatch).await {
            tracing::warn!(agent_id = %self.agent.id(), error = %e, "error signal dispatch failed");
        }
    }
}


// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directives represent side effects the runtime needs to perform.
//!
//! `cmd` returns directives alongside the new agent value; the drain loop
//! hands each one to its executor in order. Directives never mutate agent
//! state — every state change is already present in the returned agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use std::time::Duration;

use crate::agent::AgentId;
use crate::dispatch::Dispatch;
use crate::signal::Signal;
use crate::state::StateMap;

/// Directives that need to be executed by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// Dispatch a signal using `dispatch` or the server default.
    Emit {
        signal: Signal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dispatch: Option<Dispatch>,
    },

    /// Record a failure as a structured event and emit an error signal.
    Error { kind: SmolStr, context: Value },

    /// Start a generic worker task; fire-and-forget.
    Spawn { task: TaskSpec },

    /// Start a child agent, track it under `tag`, inject the parent ref.
    SpawnAgent {
        module: SmolStr,
        tag: SmolStr,
        #[serde(default)]
        opts: SpawnOpts,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        meta: Value,
    },

    /// Stop a tracked child agent.
    StopChild { tag: SmolStr, reason: StopReason },

    /// Deliver `message` to self after the delay.
    Schedule {
        #[serde(with = "duration_serde")]
        delay: Duration,
        message: Box<Signal>,
    },

    /// Recurring delivery governed by a cron expression.
    Cron {
        expr: String,
        message: Box<Signal>,
        job_id: SmolStr,
    },

    /// Cancel a cron job.
    CronCancel { job_id: SmolStr },

    /// Stop self after the current drain step completes. Reserved for
    /// abnormal termination; logical completion is a terminal status in
    /// agent state.
    Stop { reason: StopReason },
}

/// Spec for a generic worker started by `Spawn`. The instance resolves
/// `name` against its worker registry; `payload` is handed to the factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl TaskSpec {
    pub fn new(name: impl Into<SmolStr>, payload: Value) -> Self {
        Self { name: name.into(), payload }
    }
}

/// Options for spawning a child agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnOpts {
    /// Child agent id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AgentId>,
    /// Initial state overlaid on schema defaults.
    #[serde(default, skip_serializing_if = "StateMap::is_empty")]
    pub initial_state: StateMap,
    /// What the child does when this parent goes away.
    #[serde(default)]
    pub on_parent_death: OnParentDeath,
}

/// Per-child policy applied when the parent exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnParentDeath {
    /// Keep running with the parent ref intact.
    #[default]
    Continue,
    /// Stop when the parent stops.
    Stop,
    /// Keep running but clear the parent ref.
    Orphan,
}

crate::simple_display! {
    OnParentDeath {
        Continue => "continue",
        Stop => "stop",
        Orphan => "orphan",
    }
}

/// Why an agent (or child) is stopping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Normal,
    Shutdown,
    Error(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Normal => write!(f, "normal"),
            StopReason::Shutdown => write!(f, "shutdown"),
            StopReason::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

impl Directive {
    /// Shorthand for the common emit-with-default-dispatch case.
    pub fn emit(signal: Signal) -> Self {
        Directive::Emit { signal, dispatch: None }
    }

    /// Build an `Error` directive from a command failure.
    pub fn from_error(err: &crate::error::CmdError) -> Self {
        Directive::Error {
            kind: SmolStr::new(err.kind()),
            context: Value::from(err.to_string()),
        }
    }

    /// Directive name for log spans (e.g., "spawn_agent", "emit")
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Emit { .. } => "emit",
            Directive::Error { .. } => "error",
            Directive::Spawn { .. } => "spawn",
            Directive::SpawnAgent { .. } => "spawn_agent",
            Directive::StopChild { .. } => "stop_child",
            Directive::Schedule { .. } => "schedule",
            Directive::Cron { .. } => "cron",
            Directive::CronCancel { .. } => "cron_cancel",
            Directive::Stop { .. } => "stop",
        }
    }

    /// Key-value pairs for structured logging
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Directive::Emit { signal, dispatch } => {
                let mut fields = vec![("signal", signal.log_summary())];
                if let Some(d) = dispatch {
                    fields.push(("dispatch", d.name().to_string()));
                }
                fields
            }
            Directive::Error { kind, .. } => vec![("kind", kind.to_string())],
            Directive::Spawn { task } => vec![("task", task.name.to_string())],
            Directive::SpawnAgent { module, tag, .. } => {
                vec![("module", module.to_string()), ("tag", tag.to_string())]
            }
            Directive::StopChild { tag, reason } => {
                vec![("tag", tag.to_string()), ("reason", reason.to_string())]
            }
            Directive::Schedule { delay, message } => vec![
                ("delay_ms", delay.as_millis().to_string()),
                ("signal", message.log_summary()),
            ],
            Directive::Cron { expr, job_id, .. } => {
                vec![("expr", expr.clone()), ("job_id", job_id.to_string())]
            }
            Directive::CronCancel { job_id } => vec![("job_id", job_id.to_string())],
            Directive::Stop { reason } => vec![("reason", reason.to_string())],
        }
    }

    /// Whether to show both 'started' and 'completed' or just 'executed',
    /// to control the verbosity for frequent directives.
    pub fn verbose(&self) -> bool {
        match self {
            // Show less information for very frequent signaling directives
            Directive::Emit { .. } => false,
            Directive::Schedule { .. } => false,
            Directive::CronCancel { .. } => false,
            // Maintain full information for infrequent and destructive directives
            _ => true,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        duration.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "directive_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance scheduler: delayed and cron-recurring signal delivery.
//!
//! One scheduler task per instance. `Schedule` directives register one-shot
//! timers, `Cron` directives register recurring jobs parsed by the `cron`
//! crate. Firings deliver through the registry into the owning agent's
//! mailbox, so the drain treats them like any other incoming signal.

use chrono::{DateTime, Utc};
use jido_core::agent::AgentId;
use jido_core::id::{IdGen, UuidIdGen};
use jido_core::signal::Signal;
use parking_lot::Mutex;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::ServerError;
use crate::registry::Registry;
use crate::telemetry;

jido_core::define_id! {
    /// Identifier for a scheduled timer or cron job.
    ///
    /// One-shot timers use `delay:{agent}:{seq}`; cron jobs use
    /// `cron:{agent}:{job_id}` so `CronCancel` can address them by job id.
    pub struct TimerId("tmr-");
}

impl TimerId {
    pub fn delay(agent: &AgentId, seq: u64) -> Self {
        Self::from_string(format!("delay:{agent}:{seq}"))
    }

    pub fn cron(agent: &AgentId, job_id: &str) -> Self {
        Self::from_string(format!("cron:{agent}:{job_id}"))
    }

    /// Parse this timer ID into a typed `TimerKind`.
    pub fn timer_kind(&self) -> Option<TimerKind<'_>> {
        TimerKind::parse(self.as_str())
    }
}

/// Parsed representation of a timer ID for type-safe routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind<'a> {
    Delay { agent: &'a str, seq: u64 },
    Cron { agent: &'a str, job_id: &'a str },
}

impl<'a> TimerKind<'a> {
    /// Parse a timer ID string. Returns `None` for unrecognized formats.
    pub fn parse(id: &'a str) -> Option<TimerKind<'a>> {
        if let Some(rest) = id.strip_prefix("delay:") {
            let (agent, seq) = rest.rsplit_once(':')?;
            return Some(TimerKind::Delay { agent, seq: seq.parse().ok()? });
        }
        if let Some(rest) = id.strip_prefix("cron:") {
            let (agent, job_id) = rest.split_once(':')?;
            return Some(TimerKind::Cron { agent, job_id });
        }
        None
    }
}

struct TimerEntry {
    id: TimerId,
    deadline: Instant,
    target: String,
    signal: Signal,
}

struct CronEntry {
    id: TimerId,
    schedule: cron::Schedule,
    next: DateTime<Utc>,
    target: String,
    signal: Signal,
}

#[derive(Default)]
struct SchedState {
    timers: Vec<TimerEntry>,
    crons: Vec<CronEntry>,
    stopped: bool,
}

/// Shared scheduler handle. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    state: Mutex<SchedState>,
    notify: Notify,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(SchedState::default()),
                notify: Notify::new(),
            }),
        }
    }

    /// Register a one-shot timer.
    pub fn set_timer(&self, id: TimerId, delay: Duration, target: String, signal: Signal) {
        {
            let mut state = self.inner.state.lock();
            // Re-registering an id replaces the pending timer.
            state.timers.retain(|t| t.id != id);
            state.timers.push(TimerEntry {
                id,
                deadline: Instant::now() + delay,
                target,
                signal,
            });
        }
        self.inner.notify.notify_one();
    }

    pub fn cancel_timer(&self, id: &TimerId) -> bool {
        let mut state = self.inner.state.lock();
        let before = state.timers.len();
        state.timers.retain(|t| t.id != *id);
        before != state.timers.len()
    }

    /// Register a recurring cron job. Fails fast on an unparsable
    /// expression or one with no upcoming firing.
    pub fn set_cron(
        &self,
        id: TimerId,
        expr: &str,
        target: String,
        signal: Signal,
    ) -> Result<(), ServerError> {
        let schedule = cron::Schedule::from_str(expr).map_err(|e| ServerError::InvalidCron {
            expr: expr.to_string(),
            reason: e.to_string(),
        })?;
        let next = schedule
            .after(&Utc::now())
            .next()
            .ok_or_else(|| ServerError::InvalidCron {
                expr: expr.to_string(),
                reason: "no upcoming firing".to_string(),
            })?;
        {
            let mut state = self.inner.state.lock();
            state.crons.retain(|c| c.id != id);
            state.crons.push(CronEntry { id, schedule, next, target, signal });
        }
        self.inner.notify.notify_one();
        Ok(())
    }

    /// Remove a cron job synchronously. Returns whether it existed.
    pub fn cancel_cron(&self, id: &TimerId) -> bool {
        let mut state = self.inner.state.lock();
        let before = state.crons.len();
        state.crons.retain(|c| c.id != *id);
        before != state.crons.len()
    }

    pub fn timer_count(&self) -> usize {
        self.inner.state.lock().timers.len()
    }

    pub fn cron_count(&self) -> usize {
        self.inner.state.lock().crons.len()
    }

    /// Stop the scheduler task; pending timers never fire.
    pub fn shutdown(&self) {
        self.inner.state.lock().stopped = true;
        self.inner.notify.notify_one();
    }

    /// Spawn the scheduler loop delivering firings through the registry.
    pub fn spawn(&self, registry: Arc<Registry>) -> tokio::task::JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(registry).await })
    }

    async fn run(self, registry: Arc<Registry>) {
        loop {
            let wake = {
                let state = self.inner.state.lock();
                if state.stopped {
                    break;
                }
                next_deadline(&state)
            };
            match wake {
                None => self.inner.notify.notified().await,
                Some(deadline) => {
                    tokio::select! {
                        _ = self.inner.notify.notified() => {}
                        _ = tokio::time::sleep_until(deadline) => {
                            self.fire_due(&registry);
                        }
                    }
                }
            }
        }
    }

    /// Deliver everything due right now.
    fn fire_due(&self, registry: &Registry) {
        let now = Instant::now();
        let utc = Utc::now();
        let mut deliveries: Vec<(TimerId, String, Signal, bool)> = Vec::new();
        {
            let mut state = self.inner.state.lock();
            let mut remaining = Vec::with_capacity(state.timers.len());
            for timer in state.timers.drain(..) {
                if timer.deadline <= now {
                    deliveries.push((timer.id, timer.target, timer.signal, false));
                } else {
                    remaining.push(timer);
                }
            }
            state.timers = remaining;

            let mut keep = Vec::with_capacity(state.crons.len());
            for mut entry in state.crons.drain(..) {
                if entry.next <= utc {
                    // Each firing gets a fresh signal id; the message body
                    // is the template from the directive.
                    let mut signal = entry.signal.clone();
                    signal.id = UuidIdGen.next_id();
                    deliveries.push((entry.id.clone(), entry.target.clone(), signal, true));
                    match entry.schedule.after(&utc).next() {
                        Some(next) => {
                            entry.next = next;
                            keep.push(entry);
                        }
                        None => {
                            tracing::debug!(target: telemetry::CRON, id = %entry.id, "cron exhausted");
                        }
                    }
                } else {
                    keep.push(entry);
                }
            }
            state.crons = keep;
        }

        for (id, target, signal, recurring) in deliveries {
            match registry.lookup(&target) {
                Some(registration) => match registration.sink.try_send(signal) {
                    Ok(()) => {
                        if recurring {
                            tracing::debug!(target: telemetry::CRON, %id, agent = %target, "fired");
                        } else {
                            tracing::debug!(target: telemetry::SCHEDULE, %id, agent = %target, "fired");
                        }
                    }
                    Err(e) => {
                        if recurring {
                            tracing::warn!(target: telemetry::CRON, %id, agent = %target, error = %e, "delivery failed");
                        } else {
                            tracing::warn!(target: telemetry::SCHEDULE, %id, agent = %target, error = %e, "delivery failed");
                        }
                    }
                },
                None => {
                    if recurring {
                        tracing::debug!(target: telemetry::CRON, %id, agent = %target, "target gone, dropping");
                    } else {
                        tracing::debug!(target: telemetry::SCHEDULE, %id, agent = %target, "target gone, dropping");
                    }
                }
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn next_deadline(state: &SchedState) -> Option<Instant> {
    let timer_min = state.timers.iter().map(|t| t.deadline).min();
    let cron_min = state
        .crons
        .iter()
        .map(|c| {
            let wait = (c.next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            Instant::now() + wait
        })
        .min();
    match (timer_min, cron_min) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

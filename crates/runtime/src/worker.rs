// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic workers started by the `Spawn` directive.
//!
//! A worker is fire-and-forget async work run under the instance task
//! supervisor. A worker may hand back one signal, which is delivered into
//! the spawning agent's mailbox like any other incoming signal.

use async_trait::async_trait;
use jido_core::signal::Signal;
use parking_lot::RwLock;
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;

/// Async work resolvable by name from a `Spawn` directive.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Run to completion. The returned signal, if any, is delivered back to
    /// the agent that spawned the task.
    async fn run(&self, payload: Value) -> Option<Signal>;
}

/// Instance-level worker table.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: RwLock<HashMap<SmolStr, Arc<dyn Worker>>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<SmolStr>, worker: Arc<dyn Worker>) {
        self.workers.write().insert(name.into(), worker);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Worker>> {
        self.workers.read().get(name).cloned()
    }
}

/// Define a worker from an async closure returning an optional reply
/// signal.
pub struct FnWorker<F> {
    f: F,
}

impl<F, Fut> FnWorker<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Option<Signal>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Worker for FnWorker<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Option<Signal>> + Send,
{
    async fn run(&self, payload: Value) -> Option<Signal> {
        (self.f)(payload).await
    }
}

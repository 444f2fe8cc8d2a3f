// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A Jido instance: registry + agents + task supervisor + scheduler.
//!
//! Instances are fully parameterized — no globals — so multiple instances
//! coexist in one address space and tests get full isolation. Shutdown
//! order: scheduler first (no new timers), then agents (children handled by
//! their parents' policies), then the task supervisor.

use jido_core::agent::{AgentDef, AgentId};
use jido_core::directive::{OnParentDeath, StopReason};
use jido_core::dispatch::{Dispatch, LogLevel};
use jido_core::signal::Signal;
use jido_core::{NewAgentOpts, StateMap};
use jido_dispatch::{Dispatcher, PubSubBus};
use parking_lot::{Mutex, RwLock};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use crate::error::ServerError;
use crate::queue::DirectiveQueue;
use crate::registry::{Registration, Registry};
use crate::scheduler::Scheduler;
use crate::server::{AgentHandle, AgentServer, HandleSink, ParentNotify};
use crate::status::{AgentView, StatusReport};
use crate::worker::{Worker, WorkerRegistry};

const POLL_INTERVAL: Duration = Duration::from_millis(15);

/// Instance-level options.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Capacity of each agent's mailbox and directive queue.
    pub mailbox_capacity: usize,
    /// Dispatch used by `Emit` when neither the directive nor the signal
    /// names one.
    pub default_dispatch: Dispatch,
    pub scheduler_enabled: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1024,
            default_dispatch: Dispatch::logger(LogLevel::Info),
            scheduler_enabled: true,
        }
    }
}

impl InstanceConfig {
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn default_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.default_dispatch = dispatch;
        self
    }

    pub fn scheduler_enabled(mut self, enabled: bool) -> Self {
        self.scheduler_enabled = enabled;
        self
    }
}

pub(crate) struct InstanceShared {
    pub(crate) name: SmolStr,
    pub(crate) config: InstanceConfig,
    pub(crate) registry: Arc<Registry>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) scheduler: Scheduler,
    pub(crate) workers: WorkerRegistry,
    pub(crate) tasks: TaskTracker,
    pub(crate) modules: RwLock<HashMap<SmolStr, Arc<AgentDef>>>,
    pub(crate) agents: Mutex<HashMap<AgentId, AgentHandle>>,
    pub(crate) joins: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    pub(crate) shutting_down: AtomicBool,
}

impl InstanceShared {
    pub(crate) fn module(&self, name: &str) -> Option<Arc<AgentDef>> {
        self.modules.read().get(name).cloned()
    }
}

/// A fully independent runtime. Cheap to clone.
#[derive(Clone)]
pub struct Instance {
    shared: Arc<InstanceShared>,
}

impl Instance {
    /// Start an instance: registry, dispatcher, task supervisor, and (when
    /// enabled) the scheduler task.
    pub fn start(name: impl Into<SmolStr>, config: InstanceConfig) -> Self {
        let registry = Arc::new(Registry::new());
        let bus = Arc::new(PubSubBus::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry) as Arc<dyn jido_dispatch::Resolver>,
            bus,
        ));
        let scheduler = Scheduler::new();
        if config.scheduler_enabled {
            let _ = scheduler.spawn(Arc::clone(&registry));
        }
        let shared = Arc::new(InstanceShared {
            name: name.into(),
            config,
            registry,
            dispatcher,
            scheduler,
            workers: WorkerRegistry::new(),
            tasks: TaskTracker::new(),
            modules: RwLock::new(HashMap::new()),
            agents: Mutex::new(HashMap::new()),
            joins: Mutex::new(Vec::new()),
            shutting_down: AtomicBool::new(false),
        });
        tracing::info!(instance = %shared.name, "instance started");
        Self { shared }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.shared.config
    }

    /// The topic bus behind the `pubsub` dispatch kind.
    pub fn bus(&self) -> Arc<PubSubBus> {
        Arc::clone(self.shared.dispatcher.bus())
    }

    /// Make an agent module spawnable by name (`SpawnAgent` directives
    /// resolve through this table).
    pub fn register_module(&self, def: Arc<AgentDef>) {
        self.shared.modules.write().insert(SmolStr::new(def.module()), def);
    }

    /// Register a generic worker for `Spawn` directives.
    pub fn register_worker(&self, name: impl Into<SmolStr>, worker: Arc<dyn Worker>) {
        self.shared.workers.register(name, worker);
    }

    /// Start an agent from a registered module name.
    pub fn start_agent(
        &self,
        module: &str,
        opts: NewAgentOpts,
    ) -> Result<AgentHandle, ServerError> {
        let def = self
            .shared
            .module(module)
            .ok_or_else(|| ServerError::UnknownModule(SmolStr::new(module)))?;
        spawn_server(&self.shared, def, opts, OnParentDeath::Continue, None)
    }

    /// Start an agent from a definition, registering the module as a side
    /// effect.
    pub fn start_agent_def(
        &self,
        def: Arc<AgentDef>,
        opts: NewAgentOpts,
    ) -> Result<AgentHandle, ServerError> {
        self.register_module(Arc::clone(&def));
        spawn_server(&self.shared, def, opts, OnParentDeath::Continue, None)
    }

    /// Request termination of an agent by id.
    pub fn stop_agent(&self, id: &str, reason: StopReason) -> Result<(), ServerError> {
        let handle = self.whereis(id).ok_or_else(|| ServerError::NotFound(id.to_string()))?;
        handle.stop(reason);
        Ok(())
    }

    pub fn whereis(&self, id: &str) -> Option<AgentHandle> {
        self.shared.agents.lock().get(id).cloned()
    }

    pub fn list_agents(&self) -> Vec<AgentId> {
        self.shared.registry.list().into_iter().map(|(id, _)| id).collect()
    }

    pub fn agent_count(&self) -> usize {
        self.shared.registry.count()
    }

    /// Poll `status` until the strategy reports done, or time out.
    pub async fn await_status(
        &self,
        handle: &AgentHandle,
        timeout: Duration,
    ) -> Result<StatusReport, ServerError> {
        handle.await_done(timeout).await
    }

    /// Poll the agent state until the predicate holds, or time out.
    pub async fn await_state(
        &self,
        handle: &AgentHandle,
        timeout: Duration,
        pred: impl Fn(&StateMap) -> bool,
    ) -> Result<AgentView, ServerError> {
        poll_until(timeout, || async {
            match handle.state().await {
                Ok(view) if pred(&view.agent.state) => Some(Ok(view.agent)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        })
        .await
    }

    /// Wait for the child under `tag` to reach a terminal status.
    pub async fn await_child(
        &self,
        parent: &AgentHandle,
        tag: &str,
        timeout: Duration,
    ) -> Result<StatusReport, ServerError> {
        poll_until(timeout, || async {
            let view = match parent.state().await {
                Ok(view) => view,
                Err(e) => return Some(Err(e)),
            };
            let child = view.children.iter().find(|c| c.tag == tag)?;
            let handle = self.whereis(child.id.as_str())?;
            match handle.status().await {
                Ok(report) if report.done() => Some(Ok(report)),
                Ok(_) => None,
                Err(_) => None,
            }
        })
        .await
    }

    /// Graceful shutdown: scheduler, then agents, then tasks.
    pub async fn shutdown(self) {
        self.shared.shutting_down.store(true, Ordering::SeqCst);
        self.shared.scheduler.shutdown();

        let handles: Vec<AgentHandle> = self.shared.agents.lock().values().cloned().collect();
        for handle in handles {
            handle.stop(StopReason::Shutdown);
        }
        let joins: Vec<_> = std::mem::take(&mut *self.shared.joins.lock());
        for join in joins {
            let _ = join.await;
        }

        self.shared.tasks.close();
        self.shared.tasks.wait().await;
        tracing::info!(instance = %self.shared.name, "instance stopped");
    }
}

/// Spawn an agent server. Shared by `start_agent` and the `SpawnAgent`
/// executor (which passes a parent notification).
pub(crate) fn spawn_server(
    shared: &Arc<InstanceShared>,
    def: Arc<AgentDef>,
    opts: NewAgentOpts,
    on_parent_death: OnParentDeath,
    parent_notify: Option<ParentNotify>,
) -> Result<AgentHandle, ServerError> {
    if shared.shutting_down.load(Ordering::SeqCst) {
        return Err(ServerError::ShuttingDown);
    }
    let (agent, init_directives) = def.new_agent(opts)?;
    let id = agent.id().clone();
    let module = SmolStr::new(agent.module());

    let (tx, rx) = mpsc::channel(shared.config.mailbox_capacity);
    shared.registry.register(
        id.as_str(),
        Registration {
            id: id.clone(),
            module: module.clone(),
            sink: Arc::new(HandleSink { tx: tx.clone() }),
        },
    )?;

    let mut queue = DirectiveQueue::new(shared.config.mailbox_capacity);
    if !init_directives.is_empty() {
        let env = def.env();
        match Signal::generated(env.idgen.as_ref(), "jido.agent.init", format!("/agents/{id}")) {
            Ok(init_signal) => {
                let origin = Arc::new(init_signal);
                for directive in init_directives {
                    if queue.push(directive, Arc::clone(&origin)).is_err() {
                        tracing::warn!(agent_id = %id, "init directive dropped, queue full");
                    }
                }
            }
            Err(e) => {
                tracing::error!(agent_id = %id, error = %e, "init signal build failed");
            }
        }
    }

    let parent = agent.parent();
    let server = AgentServer {
        agent,
        rx,
        self_tx: tx.clone(),
        queue,
        children: HashMap::new(),
        parent,
        parent_notify,
        on_parent_death,
        default_dispatch: shared.config.default_dispatch.clone(),
        shared: Arc::clone(shared),
        pending_replies: Vec::new(),
        timer_seq: 0,
    };

    let handle = AgentHandle::new(id.clone(), module, tx);
    shared.agents.lock().insert(id, handle.clone());
    let join = tokio::spawn(server.run());
    shared.joins.lock().push(join);
    Ok(handle)
}

/// Poll a closure at a fixed interval until it yields, or time out.
pub(crate) async fn poll_until<T, F, Fut>(timeout: Duration, mut f: F) -> Result<T, ServerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<Result<T, ServerError>>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(result) = f().await {
            return result;
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ServerError::Timeout);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;

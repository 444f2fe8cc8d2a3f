// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance name registry.
//!
//! Maps agent ids to mailbox sinks plus discovery metadata. Backs
//! `whereis`/`list_agents` and the `named` dispatch adapter (which is also
//! how direct "pid" delivery works — an agent id resolves straight to its
//! mailbox).

use jido_core::agent::AgentId;
use jido_dispatch::{Resolver, SignalSink};
use parking_lot::RwLock;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ServerError;

#[derive(Clone)]
pub struct Registration {
    pub id: AgentId,
    pub module: SmolStr,
    pub sink: Arc<dyn SignalSink>,
}

#[derive(Default)]
pub struct Registry {
    inner: RwLock<HashMap<String, Registration>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name. Names are unique; a second registration fails.
    pub fn register(&self, name: &str, registration: Registration) -> Result<(), ServerError> {
        let mut inner = self.inner.write();
        if inner.contains_key(name) {
            return Err(ServerError::AlreadyRegistered(name.to_string()));
        }
        inner.insert(name.to_string(), registration);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.inner.write().remove(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<Registration> {
        self.inner.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    pub fn list(&self) -> Vec<(AgentId, SmolStr)> {
        self.inner
            .read()
            .values()
            .map(|r| (r.id.clone(), r.module.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.read().len()
    }
}

impl Resolver for Registry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn SignalSink>> {
        self.lookup(name).map(|r| r.sink)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugins (skills): composable capabilities.
//!
//! A plugin contributes a disjoint state slot, optional schema for that
//! slot, actions, signal routes, and lifecycle hooks. Composition happens
//! when the agent definition is built — before any agent value exists —
//! so state-key clashes surface as build errors, not runtime surprises.

use serde_json::Value;
use smol_str::SmolStr;
use std::sync::Arc;

use crate::actions::Action;
use crate::error::CmdError;
use crate::instruction::Instruction;
use crate::router::Route;
use crate::schema::Schema;
use crate::signal::Signal;
use crate::state::StateMap;
use crate::strategy::StrategyEnv;

/// Context handed to plugin hooks.
pub struct PluginCtx<'a> {
    /// Full agent state, read-only.
    pub state: &'a StateMap,
    /// The slot this plugin owns.
    pub state_key: &'a str,
    /// Per-instance plugin configuration.
    pub config: &'a StateMap,
    pub env: &'a StrategyEnv,
}

impl PluginCtx<'_> {
    /// This plugin's slot of the agent state, empty if unset.
    pub fn slot(&self) -> StateMap {
        match self.state.get(self.state_key) {
            Some(Value::Object(map)) => map.clone(),
            _ => StateMap::new(),
        }
    }
}

/// What `handle_signal` decided.
pub enum SignalDecision {
    /// Proceed with the router's instructions.
    Continue,
    /// Replace the routed instructions with this one.
    Override(Instruction),
    /// Abort processing; an error signal is emitted.
    Error(String),
}

/// A named, versioned capability attached to an agent module.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.1.0"
    }

    /// Disjoint slot in agent state this plugin owns.
    fn state_key(&self) -> &str;

    /// Schema nested under the state key in the merged schema.
    fn schema(&self) -> Option<Schema> {
        None
    }

    /// Actions this plugin provides, unioned into the agent's set.
    fn actions(&self) -> Vec<Arc<dyn Action>> {
        Vec::new()
    }

    /// Signal routes this plugin contributes.
    fn routes(&self) -> Vec<Route<SmolStr>> {
        Vec::new()
    }

    /// Pure state initialization, run in declaration order at `new`.
    fn mount(&self, state: &mut StateMap, config: &StateMap) -> Result<(), CmdError> {
        let _ = (state, config);
        Ok(())
    }

    /// Inspect a signal before routing.
    fn handle_signal(&self, signal: &Signal, ctx: &PluginCtx<'_>) -> SignalDecision {
        let _ = (signal, ctx);
        SignalDecision::Continue
    }

    /// Rewrite an external-facing action result, threading in declaration
    /// order.
    fn transform_result(&self, action: &str, result: Value, ctx: &PluginCtx<'_>) -> Value {
        let _ = (action, ctx);
        result
    }
}

/// A plugin plus its per-module configuration.
#[derive(Clone)]
pub struct PluginMount {
    pub plugin: Arc<dyn Plugin>,
    pub config: StateMap,
}

impl PluginMount {
    pub fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self { plugin, config: StateMap::new() }
    }

    pub fn with_config(plugin: Arc<dyn Plugin>, config: StateMap) -> Self {
        Self { plugin, config }
    }
}

impl std::fmt::Debug for PluginMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginMount")
            .field("plugin", &self.plugin.name())
            .field("state_key", &self.plugin.state_key())
            .finish()
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent definition and the immutable agent value.
//!
//! An [`AgentDef`] is the module: merged schema, action set, strategy
//! binding, plugin mounts, and signal routes, assembled once through the
//! builder. An [`Agent`] is an immutable value over that definition; every
//! update produces a new value. [`Agent::cmd`] is the only pure entry point
//! turning inputs into `(agent', directives)`.

use serde_json::Value;
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::actions::{Action, ActionRegistry};
use crate::directive::Directive;
use crate::error::{BuildError, CmdError};
use crate::instruction::{normalize, Input, Instruction};
use crate::plugin::{PluginCtx, PluginMount, SignalDecision};
use crate::router::{Route, Router};
use crate::schema::{Schema, SchemaViolation};
use crate::signal::Signal;
use crate::state::StateMap;
use crate::strategy::{
    with_strategy_state, Strategy, StrategyCtx, StrategyEnv, StrategySnapshot, PARENT_KEY,
};

/// Unique identifier for an agent instance, stable within a Jido instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create a new AgentId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value of this AgentId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reference to the parent injected into a child agent's state under
/// `__parent__`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParentRef {
    pub id: AgentId,
    pub tag: SmolStr,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub meta: Value,
}

impl ParentRef {
    pub fn new(id: AgentId, tag: impl Into<SmolStr>, meta: Value) -> Self {
        Self { id, tag: tag.into(), meta }
    }
}

/// An agent module: everything shared by all values of one agent type.
pub struct AgentDef {
    module: SmolStr,
    schema: Schema,
    actions: ActionRegistry,
    allowed: BTreeSet<SmolStr>,
    strategy: Arc<dyn Strategy>,
    plugins: Vec<PluginMount>,
    routes: Router<SmolStr>,
    env: StrategyEnv,
}

impl fmt::Debug for AgentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDef")
            .field("module", &self.module)
            .field("actions", &self.allowed)
            .field("plugins", &self.plugins.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl AgentDef {
    pub fn builder(module: impl Into<SmolStr>) -> AgentDefBuilder {
        AgentDefBuilder::new(module)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn allowed_actions(&self) -> &BTreeSet<SmolStr> {
        &self.allowed
    }

    pub fn routes(&self) -> &Router<SmolStr> {
        &self.routes
    }

    pub fn env(&self) -> &StrategyEnv {
        &self.env
    }

    /// Create a new agent value: merged defaults, plugin mounts in
    /// declaration order, supplied state overlaid, then validated.
    ///
    /// Returns the agent and any directives seeded by the strategy's init.
    pub fn new_agent(
        self: &Arc<Self>,
        opts: NewAgentOpts,
    ) -> Result<(Agent, Vec<Directive>), CmdError> {
        let id = opts
            .id
            .unwrap_or_else(|| AgentId::new(self.env.idgen.next_id()));

        let mut state = self.schema.defaults();
        for mount in &self.plugins {
            let key = mount.plugin.state_key();
            if !state.contains_key(key) {
                state.insert(key.to_string(), Value::Object(StateMap::new()));
            }
            let config = opts
                .plugin_config
                .get(mount.plugin.name())
                .unwrap_or(&mount.config);
            mount.plugin.mount(&mut state, config)?;
        }
        for (key, value) in opts.state {
            state.insert(key, value);
        }
        if let Some(parent) = &opts.parent {
            state.insert(
                PARENT_KEY.to_string(),
                serde_json::to_value(parent).unwrap_or(Value::Null),
            );
        }

        let warnings = self.schema.validate(&state, false)?;
        warn_violations(&self.module, &warnings);

        let ctx = StrategyCtx {
            module: &self.module,
            agent_id: &id,
            actions: &self.actions,
            env: &self.env,
        };
        let directives = self.strategy.init(&mut state, &ctx)?;

        Ok((Agent { id, state, def: Arc::clone(self) }, directives))
    }
}

/// Options for creating an agent value.
#[derive(Default)]
pub struct NewAgentOpts {
    pub id: Option<AgentId>,
    pub state: StateMap,
    pub parent: Option<ParentRef>,
    /// Per-instance plugin configuration, keyed by plugin name; overrides
    /// the config given at build time.
    pub plugin_config: std::collections::HashMap<SmolStr, StateMap>,
}

impl NewAgentOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<AgentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn state(mut self, state: StateMap) -> Self {
        self.state = state;
        self
    }

    pub fn parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Builder assembling an agent module. Plugin composition (state-key
/// disjointness, schema nesting, action union, route merge) happens in
/// `build`; violations fail there, before any agent value exists.
pub struct AgentDefBuilder {
    module: SmolStr,
    schema: Schema,
    actions: Vec<Arc<dyn Action>>,
    strategy: Arc<dyn Strategy>,
    plugins: Vec<PluginMount>,
    routes: Vec<Route<SmolStr>>,
    env: StrategyEnv,
}

impl AgentDefBuilder {
    fn new(module: impl Into<SmolStr>) -> Self {
        Self {
            module: module.into(),
            schema: Schema::new(),
            actions: Vec::new(),
            strategy: Arc::new(crate::strategy::direct::DirectStrategy),
            plugins: Vec::new(),
            routes: Vec::new(),
            env: StrategyEnv::production(),
        }
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn action(mut self, action: Arc<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn plugin(mut self, mount: PluginMount) -> Self {
        self.plugins.push(mount);
        self
    }

    /// Route a signal-type pattern to an action.
    pub fn route(mut self, pattern: impl Into<String>, action: impl Into<SmolStr>) -> Self {
        self.routes.push(Route::new(pattern, action.into()));
        self
    }

    pub fn route_priority(
        mut self,
        pattern: impl Into<String>,
        action: impl Into<SmolStr>,
        priority: i32,
    ) -> Self {
        self.routes.push(Route::new(pattern, action.into()).priority(priority));
        self
    }

    pub fn env(mut self, env: StrategyEnv) -> Self {
        self.env = env;
        self
    }

    pub fn build(self) -> Result<Arc<AgentDef>, BuildError> {
        // State-key disjointness: plugin vs base schema, plugin vs plugin.
        let mut seen_keys: Vec<&str> = Vec::new();
        for mount in &self.plugins {
            let key = mount.plugin.state_key();
            if self.schema.has_field(key) {
                return Err(BuildError::StateKeyClash {
                    key: SmolStr::new(key),
                    other: "base schema".to_string(),
                });
            }
            if crate::schema::RESERVED_STATE_KEYS.contains(&key) || key.starts_with("__") {
                return Err(BuildError::StateKeyClash {
                    key: SmolStr::new(key),
                    other: "reserved runtime slot".to_string(),
                });
            }
            if seen_keys.contains(&key) {
                return Err(BuildError::StateKeyClash {
                    key: SmolStr::new(key),
                    other: "another plugin".to_string(),
                });
            }
            seen_keys.push(key);
        }

        // Merged schema: each plugin schema nests under its state key.
        let mut schema = self.schema;
        for mount in &self.plugins {
            if let Some(plugin_schema) = mount.plugin.schema() {
                schema = schema.nest(mount.plugin.state_key(), plugin_schema);
            }
        }

        // Merged action set: base actions must be unique, plugin actions
        // union (duplicates by name are dropped).
        let mut actions = ActionRegistry::new();
        for action in self.actions {
            actions.register(action)?;
        }
        for mount in &self.plugins {
            for action in mount.plugin.actions() {
                if !actions.contains(action.name()) {
                    actions.register(action)?;
                }
            }
        }
        let allowed: BTreeSet<SmolStr> = actions.names().cloned().collect();

        // Merged routes: explicit, then strategy, then plugins.
        let mut routes = self.routes;
        routes.extend(self.strategy.signal_routes());
        for mount in &self.plugins {
            routes.extend(mount.plugin.routes());
        }
        let router = Router::new(routes).map_err(|e| match e {
            crate::router::RouterError::BadPattern { pattern, reason } => {
                BuildError::BadPattern { pattern, reason }
            }
        })?;

        Ok(Arc::new(AgentDef {
            module: self.module,
            schema,
            actions,
            allowed,
            strategy: self.strategy,
            plugins: self.plugins,
            routes: router,
            env: self.env,
        }))
    }
}

/// Result of [`Agent::cmd`]. On error `agent` is the input agent unchanged
/// and `directives` holds a single `Error` directive carrying the failure.
#[derive(Debug)]
pub struct CmdOutcome {
    pub agent: Agent,
    pub directives: Vec<Directive>,
    pub error: Option<CmdError>,
}

/// An immutable agent value.
#[derive(Clone)]
pub struct Agent {
    id: AgentId,
    state: StateMap,
    def: Arc<AgentDef>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("module", &self.def.module)
            .finish()
    }
}

impl Agent {
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn module(&self) -> &str {
        &self.def.module
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn def(&self) -> &Arc<AgentDef> {
        &self.def
    }

    /// A top-level state value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// The parent reference, when this agent was spawned as a child.
    pub fn parent(&self) -> Option<ParentRef> {
        self.state
            .get(PARENT_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Merge top-level updates into state and revalidate.
    pub fn set(&self, attrs: StateMap) -> Result<Agent, CmdError> {
        let mut state = self.state.clone();
        for (key, value) in attrs {
            state.insert(key, value);
        }
        let warnings = self.def.schema.validate(&state, false)?;
        warn_violations(&self.def.module, &warnings);
        Ok(Agent { id: self.id.clone(), state, def: Arc::clone(&self.def) })
    }

    /// Validate current state. Strict mode upgrades missing-required
    /// warnings to errors.
    pub fn validate(&self, strict: bool) -> Result<Vec<SchemaViolation>, CmdError> {
        Ok(self.def.schema.validate(&self.state, strict)?)
    }

    /// The pure transition function: `(agent, input) -> (agent', directives)`.
    pub fn cmd(&self, input: Input) -> CmdOutcome {
        match self.cmd_inner(input) {
            Ok((agent, directives)) => CmdOutcome { agent, directives, error: None },
            Err(error) => CmdOutcome {
                agent: self.clone(),
                directives: vec![Directive::from_error(&error)],
                error: Some(error),
            },
        }
    }

    fn cmd_inner(&self, input: Input) -> Result<(Agent, Vec<Directive>), CmdError> {
        let env = &self.def.env;
        let instructions = match input {
            Input::Signal(signal) => self.route_signal(signal)?,
            other => normalize(other, &self.def.routes, &self.def.allowed)?,
        };

        let ctx = StrategyCtx {
            module: &self.def.module,
            agent_id: &self.id,
            actions: &self.def.actions,
            env,
        };

        let mut state = self.state.clone();
        let strategy = Arc::clone(&self.def.strategy);
        let cmd_result = catch_unwind(AssertUnwindSafe(|| {
            strategy.cmd(&mut state, &instructions, &ctx)
        }));
        let directives = match cmd_result {
            Ok(result) => result?,
            Err(panic) => {
                return Err(CmdError::Strategy(format!(
                    "strategy panicked: {}",
                    panic_message(panic.as_ref())
                )));
            }
        };

        let warnings = self.def.schema.validate(&state, false)?;
        warn_violations(&self.def.module, &warnings);

        self.apply_transform_hooks(&mut state, &instructions);

        Ok((
            Agent { id: self.id.clone(), state, def: Arc::clone(&self.def) },
            directives,
        ))
    }

    /// Route a signal through plugin `handle_signal` hooks, then the merged
    /// router.
    fn route_signal(&self, signal: Signal) -> Result<Vec<Instruction>, CmdError> {
        for mount in &self.def.plugins {
            let ctx = PluginCtx {
                state: &self.state,
                state_key: mount.plugin.state_key(),
                config: &mount.config,
                env: &self.def.env,
            };
            match mount.plugin.handle_signal(&signal, &ctx) {
                SignalDecision::Continue => {}
                SignalDecision::Override(instruction) => {
                    if !self.def.allowed.contains(&instruction.action) {
                        return Err(CmdError::ActionNotAllowed(instruction.action));
                    }
                    return Ok(vec![instruction]);
                }
                SignalDecision::Error(reason) => {
                    return Err(CmdError::Strategy(format!(
                        "plugin '{}' rejected signal: {reason}",
                        mount.plugin.name()
                    )));
                }
            }
        }
        normalize(Input::Signal(signal), &self.def.routes, &self.def.allowed)
    }

    /// Thread the strategy result through each plugin's `transform_result`
    /// in declaration order.
    fn apply_transform_hooks(&self, state: &mut StateMap, instructions: &[Instruction]) {
        if self.def.plugins.is_empty() || instructions.is_empty() {
            return;
        }
        let last_action = match instructions.last() {
            Some(instruction) => instruction.action.clone(),
            None => return,
        };
        let mut result = self.def.strategy.snapshot(state).result.unwrap_or(Value::Null);
        for mount in &self.def.plugins {
            let ctx = PluginCtx {
                state,
                state_key: mount.plugin.state_key(),
                config: &mount.config,
                env: &self.def.env,
            };
            result = mount.plugin.transform_result(&last_action, result.clone(), &ctx);
        }
        with_strategy_state(state, |s| {
            s.insert("result".to_string(), result);
        });
    }

    /// Public view of the strategy's execution state, derived exclusively
    /// from `__strategy__`.
    pub fn strategy_snapshot(&self) -> StrategySnapshot {
        self.def.strategy.snapshot(&self.state)
    }
}

fn warn_violations(module: &str, warnings: &[SchemaViolation]) {
    for warning in warnings {
        tracing::warn!(module, %warning, "state validation warning");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

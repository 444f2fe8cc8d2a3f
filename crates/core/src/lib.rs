// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jido-core: the pure functional agent core.
//!
//! Signals, the trie router, validated agent state, directives, and the
//! strategy contract — everything needed to compute
//! `cmd(agent, input) -> (agent', directives)` without a runtime.

pub mod macros;

pub mod actions;
pub mod agent;
pub mod clock;
pub mod directive;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod instruction;
pub mod plugin;
pub mod router;
pub mod schema;
pub mod signal;
pub mod state;
pub mod strategy;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use actions::{Action, ActionCtx, ActionEffect, ActionOutcome, ActionRegistry, FnAction};
pub use agent::{Agent, AgentDef, AgentDefBuilder, AgentId, CmdOutcome, NewAgentOpts, ParentRef};
pub use clock::{Clock, FakeClock, SystemClock};
pub use directive::{Directive, OnParentDeath, SpawnOpts, StopReason, TaskSpec};
pub use dispatch::{Dispatch, LogLevel};
pub use error::{BuildError, CmdError};
pub use id::{short, IdGen, SeqIdGen, UuidIdGen};
pub use instruction::{Input, Instruction};
pub use plugin::{Plugin, PluginCtx, PluginMount, SignalDecision};
pub use router::{Route, Router, RouterError};
pub use schema::{FieldSpec, FieldType, Schema, SchemaError, SchemaViolation};
pub use signal::{Signal, SignalError, SPEC_VERSION};
pub use state::{StateMap, StateOp};
pub use strategy::direct::DirectStrategy;
pub use strategy::fsm::{FsmConfig, FsmStrategy, TerminalKind};
pub use strategy::{RunStatus, Strategy, StrategyCtx, StrategyEnv, StrategySnapshot};

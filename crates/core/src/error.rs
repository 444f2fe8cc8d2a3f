// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the pure agent core.

use smol_str::SmolStr;
use thiserror::Error;

use crate::schema::SchemaError;

/// Errors raised while composing an agent definition.
///
/// These surface when [`crate::agent::AgentDef`] is built, before any agent
/// value exists — the Rust equivalent of the compile-time plugin checks.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("plugin state key '{key}' clashes with {other}")]
    StateKeyClash { key: SmolStr, other: String },

    #[error("bad route pattern '{pattern}': {reason}")]
    BadPattern { pattern: String, reason: String },

    #[error("duplicate action '{0}'")]
    DuplicateAction(SmolStr),

    #[error("strategy init failed: {0}")]
    StrategyInit(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors raised by [`crate::agent::Agent::cmd`] and its helpers.
///
/// On any of these the returned agent is the input agent unchanged and the
/// directive list carries a single `Error` directive describing the failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CmdError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("action not allowed: {0}")]
    ActionNotAllowed(SmolStr),

    #[error("strategy error: {0}")]
    Strategy(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CmdError {
    /// Short kind tag used in error signals and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            CmdError::InvalidInput(_) => "invalid_input",
            CmdError::ActionNotAllowed(_) => "action_not_allowed",
            CmdError::Strategy(_) => "strategy_error",
            CmdError::Schema(_) => "schema_error",
        }
    }
}

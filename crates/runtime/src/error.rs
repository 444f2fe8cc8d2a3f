// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy surfaced by the process API.

use jido_core::error::{BuildError, CmdError};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("agent not found: {0}")]
    NotFound(String),

    #[error("invalid server reference")]
    InvalidServer,

    #[error("mailbox queue at capacity")]
    QueueOverflow,

    #[error("agent id '{0}' already registered")]
    AlreadyRegistered(String),

    #[error("unknown agent module '{0}'")]
    UnknownModule(SmolStr),

    #[error("duplicate child tag '{0}'")]
    DuplicateTag(SmolStr),

    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("timeout")]
    Timeout,

    #[error("instance shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Cmd(#[from] CmdError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ServerError {
    /// Short kind tag used in error signals and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "not_found",
            ServerError::InvalidServer => "invalid_server",
            ServerError::QueueOverflow => "queue_overflow",
            ServerError::AlreadyRegistered(_) => "already_registered",
            ServerError::UnknownModule(_) => "unknown_module",
            ServerError::DuplicateTag(_) => "duplicate_tag",
            ServerError::InvalidCron { .. } => "invalid_cron",
            ServerError::Timeout => "timeout",
            ServerError::ShuttingDown => "shutting_down",
            ServerError::Cmd(e) => e.kind(),
            ServerError::Build(_) => "build_error",
        }
    }
}

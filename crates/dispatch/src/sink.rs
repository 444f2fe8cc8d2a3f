// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seams between dispatch and the runtime.

use jido_core::signal::Signal;
use std::sync::Arc;
use thiserror::Error;

/// Errors from delivering into a mailbox
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("mailbox full")]
    Full,
    #[error("mailbox closed")]
    Closed,
}

/// A mailbox that accepts signals without blocking.
///
/// Implemented by the runtime's agent servers; `try_send` must never block
/// the dispatching task.
pub trait SignalSink: Send + Sync {
    fn try_send(&self, signal: Signal) -> Result<(), SinkError>;
}

/// Name-to-sink resolution, implemented by the instance registry.
pub trait Resolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn SignalSink>>;
}

impl SignalSink for tokio::sync::mpsc::Sender<Signal> {
    fn try_send(&self, signal: Signal) -> Result<(), SinkError> {
        use tokio::sync::mpsc::error::TrySendError;
        tokio::sync::mpsc::Sender::try_send(self, signal).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

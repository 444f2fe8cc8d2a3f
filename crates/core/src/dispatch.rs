// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch descriptors.
//!
//! A [`Dispatch`] names *where* a signal should be delivered; the adapter
//! table in `jido-dispatch` decides *how*. Descriptors are plain data so
//! they can ride on `Emit` directives and signal dispatch hints.
//!
//! Direct process delivery is expressed as [`Dispatch::Named`] with an agent
//! id: every agent server registers its mailbox under its id, so registry
//! lookup is direct delivery.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::str::FromStr;

/// Delivery descriptor for an outgoing signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatch {
    /// Deliver to a mailbox registered in the instance registry.
    Named { name: SmolStr },

    /// Publish on an in-process topic bus.
    PubSub { topic: SmolStr },

    /// POST a CloudEvents JSON representation.
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        headers: Vec<(String, String)>,
    },

    /// Like `Http` plus an HMAC-SHA256 signature header.
    Webhook { url: String, secret: String },

    /// Emit through `tracing` at the given level.
    Logger { level: LogLevel },

    /// Print the wire JSON to stdout.
    Console,

    /// Swallow the signal.
    Noop,
}

impl Dispatch {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Dispatch::Named { name: name.into() }
    }

    pub fn pubsub(topic: impl Into<SmolStr>) -> Self {
        Dispatch::PubSub { topic: topic.into() }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Dispatch::Http { url: url.into(), headers: Vec::new() }
    }

    pub fn webhook(url: impl Into<String>, secret: impl Into<String>) -> Self {
        Dispatch::Webhook { url: url.into(), secret: secret.into() }
    }

    pub fn logger(level: LogLevel) -> Self {
        Dispatch::Logger { level }
    }

    /// Adapter name for log spans (e.g. "pubsub", "webhook")
    pub fn name(&self) -> &'static str {
        match self {
            Dispatch::Named { .. } => "named",
            Dispatch::PubSub { .. } => "pubsub",
            Dispatch::Http { .. } => "http",
            Dispatch::Webhook { .. } => "webhook",
            Dispatch::Logger { .. } => "logger",
            Dispatch::Console => "console",
            Dispatch::Noop => "noop",
        }
    }
}

/// Severity for the logger sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Trace => "trace",
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

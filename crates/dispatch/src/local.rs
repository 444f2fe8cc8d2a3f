// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observability sinks: logger, console, noop.

use jido_core::dispatch::LogLevel;
use jido_core::signal::Signal;

const TARGET: &str = "jido.dispatch";

/// Emit the signal through `tracing` at the given level.
pub(crate) fn log_signal(level: LogLevel, signal: &Signal) {
    let summary = signal.log_summary();
    match level {
        LogLevel::Trace => tracing::trace!(target: TARGET, %summary, "signal"),
        LogLevel::Debug => tracing::debug!(target: TARGET, %summary, "signal"),
        LogLevel::Info => tracing::info!(target: TARGET, %summary, "signal"),
        LogLevel::Warn => tracing::warn!(target: TARGET, %summary, "signal"),
        LogLevel::Error => tracing::error!(target: TARGET, %summary, "signal"),
    }
}

/// Print the wire JSON to stdout.
pub(crate) fn console(signal: &Signal) {
    match jido_wire::encode_string(signal) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(target: TARGET, error = %e, "console dispatch failed to encode"),
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fakes for other crates' tests.

use jido_core::signal::Signal;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::sink::{Resolver, SignalSink, SinkError};

/// A sink that records every signal it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Vec<Signal>>>,
    full: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Signal> {
        self.inner.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Make subsequent sends fail with `SinkError::Full`.
    pub fn set_full(&self, full: bool) {
        *self.full.lock() = full;
    }
}

impl SignalSink for RecordingSink {
    fn try_send(&self, signal: Signal) -> Result<(), SinkError> {
        if *self.full.lock() {
            return Err(SinkError::Full);
        }
        self.inner.lock().push(signal);
        Ok(())
    }
}

/// A resolver backed by a fixed name → sink table.
#[derive(Default)]
pub struct StaticResolver {
    sinks: Mutex<HashMap<String, Arc<dyn SignalSink>>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, sink: Arc<dyn SignalSink>) {
        self.sinks.lock().insert(name.into(), sink);
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, name: &str) -> Option<Arc<dyn SignalSink>> {
        self.sinks.lock().get(name).cloned()
    }
}

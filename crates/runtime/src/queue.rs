// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded FIFO queue of pending directives.
//!
//! Incoming signals are routed synchronously; the directives they produce
//! are appended here and drained one at a time. The queue is the
//! backpressure boundary: an enqueue past capacity fails with overflow and
//! the offending signal's remaining directives are dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use jido_core::directive::Directive;
use jido_core::signal::Signal;

use crate::error::ServerError;

/// A directive waiting to be drained, with the signal that produced it.
#[derive(Debug)]
pub struct QueuedDirective {
    pub directive: Directive,
    pub origin: Arc<Signal>,
    /// Monotonic enqueue sequence number.
    pub seq: u64,
}

#[derive(Debug)]
pub struct DirectiveQueue {
    items: VecDeque<QueuedDirective>,
    capacity: usize,
    pushed: u64,
    popped: u64,
    high_watermark: usize,
}

impl DirectiveQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
            pushed: 0,
            popped: 0,
            high_watermark: 0,
        }
    }

    /// Append a directive. Fails with `QueueOverflow` at capacity.
    pub fn push(
        &mut self,
        directive: Directive,
        origin: Arc<Signal>,
    ) -> Result<u64, ServerError> {
        if self.items.len() >= self.capacity {
            return Err(ServerError::QueueOverflow);
        }
        self.pushed += 1;
        let seq = self.pushed;
        self.items.push_back(QueuedDirective { directive, origin, seq });
        self.high_watermark = self.high_watermark.max(self.items.len());
        Ok(seq)
    }

    pub fn pop(&mut self) -> Option<QueuedDirective> {
        let item = self.items.pop_front();
        if item.is_some() {
            self.popped += 1;
        }
        item
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total directives ever enqueued; the watermark `call` replies wait on.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Total directives ever drained.
    pub fn popped(&self) -> u64 {
        self.popped
    }

    pub fn high_watermark(&self) -> usize {
        self.high_watermark
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

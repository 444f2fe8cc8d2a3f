// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process pub/sub topic bus.
//!
//! Topics are broadcast channels created lazily on first subscribe.
//! Publishing to a topic nobody subscribed to is a successful no-op.

use jido_core::signal::Signal;
use parking_lot::RwLock;
use smol_str::SmolStr;
use std::collections::HashMap;
use tokio::sync::broadcast;

const TOPIC_CAPACITY: usize = 256;

#[derive(Default)]
pub struct PubSubBus {
    topics: RwLock<HashMap<SmolStr, broadcast::Sender<Signal>>>,
}

impl PubSubBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic, creating it when absent.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Signal> {
        let mut topics = self.topics.write();
        topics
            .entry(SmolStr::new(topic))
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Publish a signal; returns how many subscribers received it.
    pub fn publish(&self, topic: &str, signal: Signal) -> usize {
        let topics = self.topics.read();
        match topics.get(topic) {
            // send fails only when every receiver is gone; that is a no-op
            // delivery, not an error.
            Some(sender) => sender.send(signal).unwrap_or(0),
            None => 0,
        }
    }

    /// Number of live topics (subscribed at least once).
    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch table: descriptor in, delivery out.

use jido_core::dispatch::Dispatch;
use jido_core::signal::Signal;
use std::sync::Arc;
use thiserror::Error;

use crate::bus::PubSubBus;
use crate::sink::{Resolver, SinkError};
use crate::{http, local};

/// Errors from dispatch adapters
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no sink registered under '{0}'")]
    NotFound(String),

    #[error("mailbox delivery failed: {0}")]
    Sink(#[from] SinkError),

    #[error("http dispatch failed: {0}")]
    Http(String),

    #[error(transparent)]
    Wire(#[from] jido_wire::WireError),
}

/// Resolves dispatch descriptors to deliveries.
///
/// One dispatcher per instance; adapters share the resolver (registry), the
/// topic bus, and a single HTTP client.
pub struct Dispatcher {
    resolver: Arc<dyn Resolver>,
    bus: Arc<PubSubBus>,
    client: reqwest::Client,
}

impl Dispatcher {
    pub fn new(resolver: Arc<dyn Resolver>, bus: Arc<PubSubBus>) -> Self {
        Self { resolver, bus, client: reqwest::Client::new() }
    }

    pub fn bus(&self) -> &Arc<PubSubBus> {
        &self.bus
    }

    /// Deliver a signal per the descriptor. Failures are returned, logged by
    /// the caller, and never propagate as panics.
    pub async fn dispatch(
        &self,
        signal: &Signal,
        descriptor: &Dispatch,
    ) -> Result<(), DispatchError> {
        match descriptor {
            Dispatch::Named { name } => {
                let sink = self
                    .resolver
                    .resolve(name)
                    .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;
                sink.try_send(signal.clone())?;
                Ok(())
            }
            Dispatch::PubSub { topic } => {
                let receivers = self.bus.publish(topic, signal.clone());
                tracing::trace!(
                    target: "jido.dispatch",
                    topic = %topic,
                    receivers,
                    "published"
                );
                Ok(())
            }
            Dispatch::Http { url, headers } => {
                let body = jido_wire::encode_string(signal)?;
                http::post(&self.client, url, headers, body).await
            }
            Dispatch::Webhook { url, secret } => {
                let body = jido_wire::encode_string(signal)?;
                let signature = http::signature(secret, &body);
                let headers = vec![(http::SIGNATURE_HEADER.to_string(), signature)];
                http::post(&self.client, url, &headers, body).await
            }
            Dispatch::Logger { level } => {
                local::log_signal(*level, signal);
                Ok(())
            }
            Dispatch::Console => {
                local::console(signal);
                Ok(())
            }
            Dispatch::Noop => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

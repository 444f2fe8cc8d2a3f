// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jido-dispatch: the adapter table turning dispatch descriptors into
//! deliveries.
//!
//! The runtime plugs its mailboxes in through [`SignalSink`] and its
//! registry through [`Resolver`]; everything else here is self-contained.
//! Adapter failures are reported, never panicked — a bad dispatch must not
//! take down the emitting agent.

mod bus;
mod dispatcher;
mod http;
mod local;
mod sink;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use bus::PubSubBus;
pub use dispatcher::{DispatchError, Dispatcher};
pub use sink::{Resolver, SignalSink, SinkError};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{RecordingSink, StaticResolver};

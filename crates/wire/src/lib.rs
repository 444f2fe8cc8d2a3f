// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CloudEvents 1.0.2 wire format for signals.
//!
//! Structured mode JSON: the four mandatory attributes at top level,
//! optional context attributes, and extensions flattened to top-level keys.
//! Parsers accept unknown top-level keys by routing them into extensions
//! (forward compatibility).
//!
//! Framing for socket transports: 4-byte length prefix (big-endian) + JSON
//! payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod frame;

pub use codec::{decode, decode_slice, encode, encode_string, WireError};
pub use frame::{read_message, write_message, MAX_FRAME_LEN};

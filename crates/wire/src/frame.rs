// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed message framing.
//!
//! 4-byte big-endian length prefix followed by the structured-mode JSON
//! payload. Used when an instance is embedded behind a local socket.

use jido_core::signal::Signal;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{decode_slice, encode_string, WireError};

/// Maximum frame size: 16 MiB.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Read one signal frame.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Signal, WireError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len, max: MAX_FRAME_LEN });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    decode_slice(&payload)
}

/// Write one signal frame.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    signal: &Signal,
) -> Result<(), WireError> {
    let payload = encode_string(signal)?;
    let bytes = payload.as_bytes();
    if bytes.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len: bytes.len(), max: MAX_FRAME_LEN });
    }
    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;

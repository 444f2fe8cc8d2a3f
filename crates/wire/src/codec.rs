// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured-mode CloudEvents JSON codec.

use jido_core::signal::{parse_type, Signal, RESERVED_ATTRIBUTES};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use thiserror::Error;

/// Errors from wire encoding/decoding
#[derive(Debug, Error)]
pub enum WireError {
    #[error("not a JSON object")]
    NotAnObject,

    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("invalid attribute '{name}': {reason}")]
    InvalidAttribute { name: &'static str, reason: String },

    #[error("extension '{0}' collides with a reserved attribute")]
    ReservedAttribute(String),

    #[error("unsupported specversion '{0}'")]
    UnsupportedVersion(String),

    #[error("frame of {len} bytes exceeds maximum {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode a signal as a structured-mode CloudEvents JSON object.
///
/// Extensions flatten to top-level keys; a key colliding with a core
/// attribute fails with [`WireError::ReservedAttribute`].
pub fn encode(signal: &Signal) -> Result<Value, WireError> {
    let mut map = Map::new();
    map.insert("id".to_string(), Value::from(signal.id.clone()));
    map.insert("source".to_string(), Value::from(signal.source.clone()));
    map.insert("type".to_string(), Value::from(signal.ty.as_str()));
    map.insert("specversion".to_string(), Value::from(signal.specversion.as_str()));
    if let Some(subject) = &signal.subject {
        map.insert("subject".to_string(), Value::from(subject.clone()));
    }
    if let Some(time) = &signal.time {
        map.insert("time".to_string(), Value::from(time.clone()));
    }
    if let Some(ct) = &signal.datacontenttype {
        map.insert("datacontenttype".to_string(), Value::from(ct.clone()));
    }
    if let Some(data) = &signal.data {
        map.insert("data".to_string(), data.clone());
    }
    for (name, value) in &signal.extensions {
        if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
            return Err(WireError::ReservedAttribute(name.to_string()));
        }
        map.insert(name.to_string(), value.clone());
    }
    Ok(Value::Object(map))
}

/// Encode a signal to a JSON string.
pub fn encode_string(signal: &Signal) -> Result<String, WireError> {
    Ok(serde_json::to_string(&encode(signal)?)?)
}

/// Decode a structured-mode CloudEvents JSON object into a signal.
///
/// Unknown top-level keys are routed into extensions. Any `1.x` spec
/// version is accepted.
pub fn decode(value: Value) -> Result<Signal, WireError> {
    let Value::Object(map) = value else {
        return Err(WireError::NotAnObject);
    };

    let id = required_string(&map, "id")?;
    let source = required_string(&map, "source")?;
    let ty = required_string(&map, "type")?;
    parse_type(&ty)
        .map_err(|e| WireError::InvalidAttribute { name: "type", reason: e.to_string() })?;
    let specversion = required_string(&map, "specversion")?;
    if !specversion.starts_with("1.") {
        return Err(WireError::UnsupportedVersion(specversion));
    }

    let mut signal = Signal::with_id(id, &ty, source)
        .map_err(|e| WireError::InvalidAttribute { name: "type", reason: e.to_string() })?;
    signal.specversion = specversion.into();

    for (key, value) in map {
        match key.as_str() {
            "id" | "source" | "type" | "specversion" => {}
            "subject" => signal.subject = value.as_str().map(str::to_string),
            "time" => signal.time = value.as_str().map(str::to_string),
            "datacontenttype" => signal.datacontenttype = value.as_str().map(str::to_string),
            "data" => signal.data = Some(value),
            // Forward compatibility: unknown top-level keys become extensions.
            _ => {
                signal.extensions.insert(SmolStr::from(key), value);
            }
        }
    }

    Ok(signal)
}

/// Decode a signal from raw JSON bytes.
pub fn decode_slice(bytes: &[u8]) -> Result<Signal, WireError> {
    decode(serde_json::from_slice(bytes)?)
}

fn required_string(map: &Map<String, Value>, name: &'static str) -> Result<String, WireError> {
    match map.get(name) {
        None | Some(Value::Null) => Err(WireError::MissingAttribute(name)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(WireError::InvalidAttribute {
            name,
            reason: "must be non-empty".to_string(),
        }),
        Some(other) => Err(WireError::InvalidAttribute {
            name,
            reason: format!("expected string, found {other}"),
        }),
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

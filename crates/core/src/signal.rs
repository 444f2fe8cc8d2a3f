// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CloudEvents-shaped signal type.
//!
//! Signals are the only message type crossing subsystem boundaries. They
//! model CloudEvents 1.0.2: four mandatory attributes (`id`, `source`,
//! `type`, `specversion`), optional context attributes, a structured `data`
//! payload, and named extensions. In memory the extensions live in their own
//! ordered map; the wire codec in `jido-wire` flattens them to top-level
//! keys.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;

use crate::dispatch::Dispatch;
use crate::id::IdGen;

/// The CloudEvents spec version every signal carries.
pub const SPEC_VERSION: &str = "1.0.2";

/// Core attribute names extensions must not shadow.
pub const RESERVED_ATTRIBUTES: &[&str] =
    &["id", "source", "type", "specversion", "subject", "time", "datacontenttype", "data"];

/// Extension naming the signal id this signal was produced in response to.
pub const CAUSE_EXTENSION: &str = "jidocause";

/// Well-known signal types emitted by the runtime itself.
pub mod types {
    /// A tracked child finished its init and is accepting signals.
    pub const CHILD_STARTED: &str = "jido.child.started";
    /// A tracked child process exited.
    pub const CHILD_EXIT: &str = "jido.child.exit";
    /// The parent of this agent went away.
    pub const ORPHANED: &str = "jido.agent.orphaned";
    /// Canonical error signal; data is `{kind, context}`.
    pub const ERROR: &str = "jido.agent.error";
    /// A scheduled timer fired.
    pub const TICK: &str = "jido.agent.tick";
}

/// Errors raised while constructing or mutating a signal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignalError {
    #[error("signal attribute '{0}' must be non-empty")]
    EmptyAttribute(&'static str),

    #[error("signal type '{0}' has an empty segment")]
    EmptyTypeSegment(String),

    #[error("signal type '{0}' contains a wildcard segment")]
    WildcardInType(String),

    #[error("extension name '{0}' shadows a core attribute")]
    ReservedExtension(String),

    #[error("extension name '{0}' is not lowercase alphanumeric")]
    InvalidExtensionName(String),
}

/// Split a signal type into its dot-separated segments, validating that no
/// segment is empty or a wildcard.
pub fn parse_type(ty: &str) -> Result<Vec<SmolStr>, SignalError> {
    if ty.is_empty() {
        return Err(SignalError::EmptyAttribute("type"));
    }
    let mut segments = Vec::new();
    for segment in ty.split('.') {
        if segment.is_empty() {
            return Err(SignalError::EmptyTypeSegment(ty.to_string()));
        }
        if segment.contains('*') {
            return Err(SignalError::WildcardInType(ty.to_string()));
        }
        segments.push(SmolStr::new(segment));
    }
    Ok(segments)
}

/// A CloudEvents 1.0.2 signal. Immutable after creation; the chainable
/// setters consume and return the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub ty: SmolStr,
    pub specversion: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<SmolStr, Value>,
    /// Private to the runtime: overrides the server's default dispatch when
    /// this signal is emitted. Never serialized.
    #[serde(skip)]
    pub dispatch_hint: Option<Dispatch>,
}

impl Signal {
    /// Create a signal with a freshly generated UUID v7 id.
    pub fn new(ty: impl AsRef<str>, source: impl Into<String>) -> Result<Self, SignalError> {
        Self::with_id(crate::id::UuidIdGen.next_id(), ty, source)
    }

    /// Create a signal drawing its id from the given generator (the
    /// deterministic path used by strategies and executors).
    pub fn generated(
        idgen: &dyn IdGen,
        ty: impl AsRef<str>,
        source: impl Into<String>,
    ) -> Result<Self, SignalError> {
        Self::with_id(idgen.next_id(), ty, source)
    }

    /// Create a signal with a caller-supplied id.
    pub fn with_id(
        id: impl Into<String>,
        ty: impl AsRef<str>,
        source: impl Into<String>,
    ) -> Result<Self, SignalError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SignalError::EmptyAttribute("id"));
        }
        let source = source.into();
        if source.is_empty() {
            return Err(SignalError::EmptyAttribute("source"));
        }
        let ty = ty.as_ref();
        parse_type(ty)?;
        Ok(Self {
            id,
            source,
            ty: SmolStr::new(ty),
            specversion: SmolStr::new_static(SPEC_VERSION),
            subject: None,
            time: None,
            datacontenttype: None,
            data: None,
            extensions: IndexMap::new(),
            dispatch_hint: None,
        })
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn datacontenttype(mut self, ct: impl Into<String>) -> Self {
        self.datacontenttype = Some(ct.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch_hint = Some(dispatch);
        self
    }

    /// Attach an extension attribute. Fails if the name shadows a core
    /// attribute or is not lowercase alphanumeric.
    pub fn extension(
        mut self,
        name: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> Result<Self, SignalError> {
        let name = name.as_ref();
        validate_extension_name(name)?;
        self.extensions.insert(SmolStr::new(name), value.into());
        Ok(self)
    }

    /// Record the signal this one was produced in response to.
    pub fn caused_by(mut self, cause: &Signal) -> Self {
        self.extensions.insert(SmolStr::new_static(CAUSE_EXTENSION), Value::from(cause.id.clone()));
        self
    }

    /// The dot-separated type segments. Valid by construction.
    pub fn type_segments(&self) -> Vec<SmolStr> {
        parse_type(&self.ty).unwrap_or_default()
    }

    /// Id of the signal this one was produced in response to, if recorded.
    pub fn cause(&self) -> Option<&str> {
        self.extensions.get(CAUSE_EXTENSION).and_then(Value::as_str)
    }

    /// Data payload as an object map, empty if absent or non-object.
    pub fn data_map(&self) -> serde_json::Map<String, Value> {
        match &self.data {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        }
    }

    /// One-line summary for structured logging.
    pub fn log_summary(&self) -> String {
        format!("type={} id={} source={}", self.ty, crate::id::short(&self.id, 12), self.source)
    }

    // --- well-known runtime signals ---

    /// Canonical error signal: `jido.agent.error` with `{kind, context}`.
    pub fn error_signal(
        idgen: &dyn IdGen,
        source: impl Into<String>,
        kind: impl AsRef<str>,
        context: Value,
    ) -> Result<Self, SignalError> {
        Ok(Self::generated(idgen, types::ERROR, source)?.data(serde_json::json!({
            "kind": kind.as_ref(),
            "context": context,
        })))
    }

    /// Emitted to a parent when a tracked child finishes init.
    pub fn child_started(
        idgen: &dyn IdGen,
        source: impl Into<String>,
        tag: &str,
        child_id: &str,
    ) -> Result<Self, SignalError> {
        Ok(Self::generated(idgen, types::CHILD_STARTED, source)?.data(serde_json::json!({
            "tag": tag,
            "id": child_id,
        })))
    }

    /// Emitted to a parent when a tracked child exits.
    pub fn child_exit(
        idgen: &dyn IdGen,
        source: impl Into<String>,
        tag: &str,
        child_id: &str,
        reason: &str,
    ) -> Result<Self, SignalError> {
        Ok(Self::generated(idgen, types::CHILD_EXIT, source)?.data(serde_json::json!({
            "tag": tag,
            "id": child_id,
            "reason": reason,
        })))
    }

    /// Delivered to each child when its parent goes away.
    pub fn orphaned(
        idgen: &dyn IdGen,
        source: impl Into<String>,
        parent_id: &str,
    ) -> Result<Self, SignalError> {
        Ok(Self::generated(idgen, types::ORPHANED, source)?.data(serde_json::json!({
            "parent_id": parent_id,
        })))
    }

    /// Timer-fired signal; the usual `Schedule` message.
    pub fn tick(idgen: &dyn IdGen, source: impl Into<String>) -> Result<Self, SignalError> {
        Self::generated(idgen, types::TICK, source)
    }
}

crate::builder! {
    pub struct SignalBuilder => Signal {
        into {
            id: String = "sig-test",
            source: String = "/test",
            ty: SmolStr = "test.signal",
            specversion: SmolStr = SPEC_VERSION,
        }
        option {
            subject: String = None,
            time: String = None,
            datacontenttype: String = None,
            data: Value = None,
            dispatch_hint: Dispatch = None,
        }
        computed {
            extensions: IndexMap<SmolStr, Value> = IndexMap::new(),
        }
    }
}

fn validate_extension_name(name: &str) -> Result<(), SignalError> {
    if name.is_empty()
        || !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(SignalError::InvalidExtensionName(name.to_string()));
    }
    if RESERVED_ATTRIBUTES.contains(&name) {
        return Err(SignalError::ReservedExtension(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;

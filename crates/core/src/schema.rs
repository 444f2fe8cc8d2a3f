// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative state schema.
//!
//! A schema names the fields an agent's state may carry: type, default, and
//! whether the field is required. Validation has two postures: non-strict
//! (the default) reports missing required fields as warnings, strict rejects
//! them. Type mismatches are always errors.
//!
//! Unknown top-level keys are allowed — agent state may carry scratch data —
//! except double-underscore keys, which are reserved for the runtime
//! (`__strategy__`, `__parent__`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;

use crate::state::StateMap;

/// Reserved top-level state slots the schema never describes.
pub const RESERVED_STATE_KEYS: &[&str] = &["__strategy__", "__parent__"];

/// Field type for schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Any,
    Nested(Schema),
}

impl FieldType {
    fn describes(&self, value: &Value) -> bool {
        match self {
            FieldType::Bool => value.is_boolean(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Str => value.is_string(),
            FieldType::List => value.is_array(),
            FieldType::Map | FieldType::Nested(_) => value.is_object(),
            FieldType::Any => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "string",
            FieldType::List => "list",
            FieldType::Map => "map",
            FieldType::Any => "any",
            FieldType::Nested(_) => "map",
        }
    }
}

/// A single field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(ty: FieldType) -> Self {
        Self { ty, required: false, default: None }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// One violation found while validating a state map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Dotted path to the offending field.
    pub path: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    MissingRequired,
    WrongType { expected: String, found: String },
    ReservedKey,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ViolationKind::MissingRequired => write!(f, "{}: missing required field", self.path),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "{}: expected {expected}, found {found}", self.path)
            }
            ViolationKind::ReservedKey => write!(f, "{}: reserved key", self.path),
        }
    }
}

/// Validation failure: every hard violation found, in field order.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("schema validation failed: {}", summary(.violations))]
pub struct SchemaError {
    pub violations: Vec<SchemaViolation>,
}

fn summary(violations: &[SchemaViolation]) -> String {
    violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; ")
}

/// Ordered field declarations for one level of agent state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: IndexMap<SmolStr, FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl AsRef<str>, spec: FieldSpec) -> Self {
        self.fields.insert(SmolStr::new(name.as_ref()), spec);
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.fields.keys()
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Nest another schema under the given key (plugin composition).
    pub fn nest(mut self, key: impl AsRef<str>, schema: Schema) -> Self {
        self.fields
            .insert(SmolStr::new(key.as_ref()), FieldSpec::new(FieldType::Nested(schema)));
        self
    }

    /// Seed state: every field with a declared default, nested schemas
    /// recursively.
    pub fn defaults(&self) -> StateMap {
        let mut state = StateMap::new();
        for (name, spec) in &self.fields {
            match (&spec.default, &spec.ty) {
                (Some(default), _) => {
                    state.insert(name.to_string(), default.clone());
                }
                (None, FieldType::Nested(nested)) => {
                    state.insert(name.to_string(), Value::Object(nested.defaults()));
                }
                (None, _) => {}
            }
        }
        state
    }

    /// Validate a state map.
    ///
    /// Returns the warnings (missing required fields in non-strict mode).
    /// Hard violations — type mismatches, reserved-key misuse, and missing
    /// required fields under strict — produce a [`SchemaError`].
    pub fn validate(
        &self,
        state: &StateMap,
        strict: bool,
    ) -> Result<Vec<SchemaViolation>, SchemaError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        self.check(state, "", strict, &mut errors, &mut warnings);
        for key in state.keys() {
            if key.starts_with("__") && !RESERVED_STATE_KEYS.contains(&key.as_str()) {
                errors.push(SchemaViolation {
                    path: key.clone(),
                    kind: ViolationKind::ReservedKey,
                });
            }
        }
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(SchemaError { violations: errors })
        }
    }

    fn check(
        &self,
        state: &StateMap,
        prefix: &str,
        strict: bool,
        errors: &mut Vec<SchemaViolation>,
        warnings: &mut Vec<SchemaViolation>,
    ) {
        for (name, spec) in &self.fields {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            match state.get(name.as_str()) {
                None | Some(Value::Null) => {
                    if spec.required {
                        let violation =
                            SchemaViolation { path, kind: ViolationKind::MissingRequired };
                        if strict {
                            errors.push(violation);
                        } else {
                            warnings.push(violation);
                        }
                    }
                }
                Some(value) => {
                    if !spec.ty.describes(value) {
                        errors.push(SchemaViolation {
                            path: path.clone(),
                            kind: ViolationKind::WrongType {
                                expected: spec.ty.name().to_string(),
                                found: json_type_name(value).to_string(),
                            },
                        });
                    } else if let (FieldType::Nested(nested), Value::Object(map)) =
                        (&spec.ty, value)
                    {
                        nested.check(map, &path, strict, errors, warnings);
                    }
                }
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

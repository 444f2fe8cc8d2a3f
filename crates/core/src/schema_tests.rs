// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::state;
use serde_json::json;

fn counter_schema() -> Schema {
    Schema::new()
        .field("n", FieldSpec::new(FieldType::Int).default_value(json!(0)))
        .field("name", FieldSpec::new(FieldType::Str).required())
}

#[test]
fn defaults_seed_declared_fields() {
    let state = counter_schema().defaults();
    assert_eq!(state.get("n"), Some(&json!(0)));
    assert!(!state.contains_key("name"));
}

#[test]
fn nested_defaults_recurse() {
    let schema = Schema::new().nest(
        "memory",
        Schema::new().field("entries", FieldSpec::new(FieldType::List).default_value(json!([]))),
    );
    let state = schema.defaults();
    assert_eq!(state.get("memory"), Some(&json!({"entries": []})));
}

#[test]
fn missing_required_warns_when_non_strict() {
    let schema = counter_schema();
    let warnings = schema.validate(&state! {"n" => 1}, false).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].path, "name");
    assert!(matches!(warnings[0].kind, ViolationKind::MissingRequired));
}

#[test]
fn missing_required_errors_when_strict() {
    let schema = counter_schema();
    let err = schema.validate(&state! {"n" => 1}, true).unwrap_err();
    assert_eq!(err.violations.len(), 1);
    assert!(matches!(err.violations[0].kind, ViolationKind::MissingRequired));
}

#[yare::parameterized(
    bool_field  = { FieldType::Bool, json!(true), json!("no") },
    int_field   = { FieldType::Int, json!(3), json!(3.5) },
    float_field = { FieldType::Float, json!(3.5), json!("x") },
    str_field   = { FieldType::Str, json!("s"), json!(1) },
    list_field  = { FieldType::List, json!([1]), json!({}) },
    map_field   = { FieldType::Map, json!({}), json!([1]) },
)]
fn type_checking(ty: FieldType, good: serde_json::Value, bad: serde_json::Value) {
    let schema = Schema::new().field("f", FieldSpec::new(ty));
    let mut state = StateMap::new();
    state.insert("f".to_string(), good);
    assert!(schema.validate(&state, true).is_ok());

    state.insert("f".to_string(), bad);
    let err = schema.validate(&state, true).unwrap_err();
    assert!(matches!(err.violations[0].kind, ViolationKind::WrongType { .. }));
}

#[test]
fn int_accepted_as_float() {
    let schema = Schema::new().field("f", FieldSpec::new(FieldType::Float));
    assert!(schema.validate(&state! {"f" => 3}, true).is_ok());
}

#[test]
fn any_field_accepts_everything() {
    let schema = Schema::new().field("f", FieldSpec::new(FieldType::Any));
    assert!(schema.validate(&state! {"f" => [1, "x", {}]}, true).is_ok());
}

#[test]
fn nested_violations_carry_dotted_paths() {
    let schema = Schema::new().nest(
        "memory",
        Schema::new().field("entries", FieldSpec::new(FieldType::List)),
    );
    let err = schema
        .validate(&state! {"memory" => {"entries": "nope"}}, true)
        .unwrap_err();
    assert_eq!(err.violations[0].path, "memory.entries");
}

#[test]
fn unknown_keys_allowed_except_reserved() {
    let schema = counter_schema();
    let ok = state! {"n" => 1, "name" => "c", "scratch" => true};
    assert!(schema.validate(&ok, true).is_ok());

    let reserved_ok = state! {"n" => 1, "name" => "c", "__strategy__" => {}};
    assert!(schema.validate(&reserved_ok, true).is_ok());

    let bad = state! {"n" => 1, "name" => "c", "__private__" => {}};
    let err = schema.validate(&bad, true).unwrap_err();
    assert!(matches!(err.violations[0].kind, ViolationKind::ReservedKey));
}

#[test]
fn null_counts_as_missing() {
    let schema = counter_schema();
    let err = schema.validate(&state! {"n" => 1, "name" => null}, true).unwrap_err();
    assert!(matches!(err.violations[0].kind, ViolationKind::MissingRequired));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders and helpers shared with other crates' tests.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::actions::{ActionEffect, ActionOutcome, FnAction};
use crate::agent::{AgentDef, AgentDefBuilder};
use crate::clock::FakeClock;
use crate::id::SeqIdGen;
use crate::schema::{FieldSpec, FieldType, Schema};
use crate::state::{StateMap, StateOp};
use crate::strategy::StrategyEnv;

/// Deterministic environment: sequential ids, frozen clock.
pub fn fixed_env() -> StrategyEnv {
    StrategyEnv::new(Arc::new(SeqIdGen::new()), Arc::new(FakeClock::new()))
}

/// Build a state map from key/value pairs.
///
/// ```ignore
/// let state = state!{"n" => 0, "name" => "counter"};
/// ```
#[macro_export]
macro_rules! state {
    ($( $key:expr => $value:tt ),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::state::StateMap::new();
        $( map.insert($key.to_string(), serde_json::json!($value)); )*
        map
    }};
}

/// A counter agent module: `state = {n: int = 0}`, one `inc` action taking
/// `{by: int}`. The workhorse fixture for runtime and spec tests.
pub fn counter_def() -> Arc<AgentDef> {
    counter_builder()
        .build()
        .unwrap_or_else(|e| unreachable!("counter def must build: {e}"))
}

/// The counter module as a builder, for tests that want to add routes or
/// swap the strategy.
pub fn counter_builder() -> AgentDefBuilder {
    let inc = FnAction::with_schema(
        "inc",
        Schema::new().field("by", FieldSpec::new(FieldType::Int)),
        |params: &StateMap, ctx: &crate::actions::ActionCtx<'_>| {
            let by = params.get("by").and_then(Value::as_i64).unwrap_or(1);
            let n = ctx.state.get("n").and_then(Value::as_i64).unwrap_or(0);
            ActionOutcome::ok_with(
                json!(n + by),
                vec![ActionEffect::State(StateOp::set_key("n", json!(n + by)))],
            )
        },
    );
    AgentDef::builder("counter")
        .schema(Schema::new().field("n", FieldSpec::new(FieldType::Int).default_value(json!(0))))
        .action(Arc::new(inc))
        .route("count.inc", "inc")
        .env(fixed_env())
}


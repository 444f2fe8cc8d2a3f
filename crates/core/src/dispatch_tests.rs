// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    trace   = { "trace", LogLevel::Trace },
    debug   = { "debug", LogLevel::Debug },
    info    = { "info", LogLevel::Info },
    warn    = { "warn", LogLevel::Warn },
    warning = { "warning", LogLevel::Warn },
    error   = { "error", LogLevel::Error },
)]
fn log_levels_parse(input: &str, expected: LogLevel) {
    assert_eq!(input.parse::<LogLevel>(), Ok(expected));
}

#[yare::parameterized(
    empty      = { "" },
    uppercase  = { "WARN" },
    unknown    = { "loud" },
)]
fn unknown_log_levels_rejected(input: &str) {
    assert!(input.parse::<LogLevel>().is_err());
}

#[test]
fn log_level_display_roundtrips_through_parse() {
    for level in [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ] {
        assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
    }
}

#[yare::parameterized(
    named   = { Dispatch::named("agent-1"), "named" },
    pubsub  = { Dispatch::pubsub("warehouse"), "pubsub" },
    http    = { Dispatch::http("http://localhost/hook"), "http" },
    webhook = { Dispatch::webhook("http://localhost/hook", "s3cret"), "webhook" },
    logger  = { Dispatch::logger(LogLevel::Info), "logger" },
    console = { Dispatch::Console, "console" },
    noop    = { Dispatch::Noop, "noop" },
)]
fn dispatch_names(dispatch: Dispatch, expected: &str) {
    assert_eq!(dispatch.name(), expected);
}

#[test]
fn dispatch_serde_roundtrip() {
    let dispatch = Dispatch::webhook("http://localhost/hook", "s3cret");
    let json = serde_json::to_value(&dispatch).unwrap();
    assert_eq!(json.get("kind"), Some(&serde_json::json!("webhook")));
    let back: Dispatch = serde_json::from_value(json).unwrap();
    assert_eq!(back, dispatch);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario tests exercising the public crate APIs
//! end-to-end: counter flows, fan-out, parent/child coordination, FSM
//! gating, scheduling, and backpressure.

#[path = "specs/support.rs"]
mod support;

#[path = "specs/scenarios.rs"]
mod scenarios;

#[path = "specs/properties.rs"]
mod properties;

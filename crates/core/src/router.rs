// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trie router from signal-type patterns to targets.
//!
//! Patterns are dot-joined segments: a literal matches itself, `*` matches
//! exactly one segment, `**` matches zero or more segments. At most one
//! `**` per pattern. Lookup walks the trie, backtracking only along the
//! wildcard edges; `match_type` never fails — an unmatched type yields an
//! empty list.

use smol_str::SmolStr;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouterError {
    #[error("bad pattern '{pattern}': {reason}")]
    BadPattern { pattern: String, reason: String },
}

fn bad_pattern(pattern: &str, reason: impl Into<String>) -> RouterError {
    RouterError::BadPattern { pattern: pattern.to_string(), reason: reason.into() }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(SmolStr),
    Single,
    Multi,
}

/// Parse and validate a pattern into segments.
fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouterError> {
    if pattern.is_empty() {
        return Err(bad_pattern(pattern, "empty pattern"));
    }
    let mut segments = Vec::new();
    let mut multi_seen = false;
    for raw in pattern.split('.') {
        let segment = match raw {
            "" => return Err(bad_pattern(pattern, "empty segment")),
            "*" => Segment::Single,
            "**" => {
                if multi_seen {
                    return Err(bad_pattern(pattern, "more than one '**'"));
                }
                multi_seen = true;
                Segment::Multi
            }
            literal => {
                if literal.contains('*') {
                    return Err(bad_pattern(pattern, format!("'*' inside segment '{literal}'")));
                }
                Segment::Literal(SmolStr::new(literal))
            }
        };
        segments.push(segment);
    }
    Ok(segments)
}

#[derive(Debug, Clone)]
struct Entry<T> {
    target: T,
    priority: i32,
    seq: usize,
}

#[derive(Debug)]
struct Node<T> {
    literal: HashMap<SmolStr, Node<T>>,
    single: Option<Box<Node<T>>>,
    multi: Option<Box<Node<T>>>,
    terminals: Vec<Entry<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self { literal: HashMap::new(), single: None, multi: None, terminals: Vec::new() }
    }
}

/// A route to insert: pattern, target, and optional priority (default 0).
#[derive(Debug, Clone)]
pub struct Route<T> {
    pub pattern: String,
    pub target: T,
    pub priority: i32,
}

impl<T> Route<T> {
    pub fn new(pattern: impl Into<String>, target: T) -> Self {
        Self { pattern: pattern.into(), target, priority: 0 }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Prefix trie from type patterns to targets.
#[derive(Debug)]
pub struct Router<T> {
    root: Node<T>,
    seq: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { root: Node::default(), seq: 0 }
    }
}

impl<T> Router<T> {
    pub fn new(routes: Vec<Route<T>>) -> Result<Self, RouterError> {
        let mut router = Self::default();
        for route in routes {
            router.insert(&route.pattern, route.target, route.priority)?;
        }
        Ok(router)
    }

    /// Number of routes inserted.
    pub fn len(&self) -> usize {
        self.seq
    }

    pub fn is_empty(&self) -> bool {
        self.seq == 0
    }

    /// Insert a route. Invalid patterns fail fast with `bad_pattern`.
    pub fn insert(&mut self, pattern: &str, target: T, priority: i32) -> Result<(), RouterError> {
        let segments = parse_pattern(pattern)?;
        let mut node = &mut self.root;
        for segment in &segments {
            node = match segment {
                Segment::Literal(lit) => node.literal.entry(lit.clone()).or_default(),
                Segment::Single => node.single.get_or_insert_with(Box::default),
                Segment::Multi => node.multi.get_or_insert_with(Box::default),
            };
        }
        node.terminals.push(Entry { target, priority, seq: self.seq });
        self.seq += 1;
        Ok(())
    }

    /// All targets whose pattern matches the given signal type, ordered by
    /// descending priority then insertion order. Never fails; an invalid or
    /// unmatched type yields an empty list.
    pub fn match_type(&self, ty: &str) -> Vec<&T> {
        let segments: Vec<&str> = ty.split('.').collect();
        if segments.iter().any(|s| s.is_empty() || s.contains('*')) {
            return Vec::new();
        }
        let mut hits: Vec<&Entry<T>> = Vec::new();
        collect(&self.root, &segments, &mut hits);
        hits.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        hits.into_iter().map(|e| &e.target).collect()
    }
}

fn collect<'r, T>(node: &'r Node<T>, rest: &[&str], hits: &mut Vec<&'r Entry<T>>) {
    if rest.is_empty() {
        hits.extend(node.terminals.iter());
        // `**` also matches zero trailing segments
        if let Some(multi) = &node.multi {
            collect(multi, rest, hits);
        }
        return;
    }
    if let Some(child) = node.literal.get(rest[0]) {
        collect(child, &rest[1..], hits);
    }
    if let Some(single) = &node.single {
        collect(single, &rest[1..], hits);
    }
    if let Some(multi) = &node.multi {
        // Greedy multi-wildcard: consume 0..=n segments, backtracking into
        // whatever follows the `**` edge.
        for skip in 0..=rest.len() {
            collect(multi, &rest[skip..], hits);
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

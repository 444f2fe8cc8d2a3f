// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn signature_is_stable_hex_hmac() {
    let a = signature("secret", r#"{"id":"sig-1"}"#);
    let b = signature("secret", r#"{"id":"sig-1"}"#);
    assert_eq!(a, b);
    assert!(a.starts_with("sha256="));
    // sha256 digest is 32 bytes -> 64 hex chars.
    assert_eq!(a.len(), "sha256=".len() + 64);
    assert!(a["sha256=".len()..].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn signature_varies_with_secret_and_body() {
    let base = signature("secret", "body");
    assert_ne!(signature("other", "body"), base);
    assert_ne!(signature("secret", "other body"), base);
}

#[tokio::test]
async fn post_to_unreachable_host_errors() {
    let client = reqwest::Client::new();
    // Reserved TEST-NET address; connection refused or timed out, never 2xx.
    let err = post(&client, "http://127.0.0.1:9/never", &[], "{}".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Http(_)));
}

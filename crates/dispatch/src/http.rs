// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP and signed-webhook delivery.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::dispatcher::DispatchError;

/// Content type for structured-mode CloudEvents.
pub(crate) const CONTENT_TYPE: &str = "application/cloudevents+json";
/// Header carrying the webhook HMAC signature.
pub(crate) const SIGNATURE_HEADER: &str = "x-jido-signature";

/// POST a JSON body, failing on transport errors and non-2xx statuses.
pub(crate) async fn post(
    client: &reqwest::Client,
    url: &str,
    headers: &[(String, String)],
    body: String,
) -> Result<(), DispatchError> {
    let mut request = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(body);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let response = request
        .send()
        .await
        .map_err(|e| DispatchError::Http(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(DispatchError::Http(format!("{url} responded {status}")));
    }
    Ok(())
}

/// Signature header value: `sha256=<hex hmac-sha256 of the body>`.
pub(crate) fn signature(secret: &str, body: &str) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // Hmac accepts keys of any length; unreachable in practice.
        Err(_) => return String::new(),
    };
    mac.update(body.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256=");
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

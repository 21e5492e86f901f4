// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP plumbing shared by both facade variants.

use std::time::Duration;

use accesspark_core::error::upstream_message;
use accesspark_core::relay::decode_body;
use accesspark_core::{AccessParkError, AuthSession, User};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

/// Per-request timeout for facade calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("accesspark/", env!("CARGO_PKG_VERSION"));

pub(crate) fn header_value(name: &str, value: &str) -> Result<HeaderValue, AccessParkError> {
    HeaderValue::from_str(value)
        .map_err(|e| AccessParkError::Config(format!("invalid {name} header value: {e}")))
}

pub(crate) fn bearer(token: &str) -> Result<HeaderValue, AccessParkError> {
    header_value("authorization", &format!("Bearer {token}"))
}

/// Builds a client sending `headers` on every request. A `User-Agent` in
/// `headers` wins over the crate default.
pub(crate) fn build_client(headers: HeaderMap) -> Result<reqwest::Client, AccessParkError> {
    let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);
    if !headers.contains_key(USER_AGENT) {
        builder = builder.user_agent(DEFAULT_USER_AGENT);
    }
    builder
        .default_headers(headers)
        .build()
        .map_err(|e| AccessParkError::Transport {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

pub(crate) fn transport(e: reqwest::Error) -> AccessParkError {
    AccessParkError::Transport {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Reads a response into its status and decoded body.
pub(crate) async fn read_response(
    response: reqwest::Response,
) -> Result<(u16, Value), AccessParkError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|e| AccessParkError::Transport {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    Ok((status, decode_body(&bytes)))
}

/// Builds the error for an upstream status >= 400.
pub(crate) fn remote_error(status: u16, body: &Value) -> AccessParkError {
    let message = match body {
        Value::String(text) if !text.trim().is_empty() => text.clone(),
        _ => upstream_message(body),
    };
    AccessParkError::Remote { status, message }
}

/// True when storage refused an upload because the object already exists.
pub(crate) fn is_duplicate(status: u16, body: &Value) -> bool {
    status == 409
        || body.get("statusCode").and_then(Value::as_str) == Some("409")
        || body.get("error").and_then(Value::as_str) == Some("Duplicate")
}

/// Normalizes a table response into rows.
pub(crate) fn into_rows(body: Value) -> Result<Vec<Value>, AccessParkError> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row @ Value::Object(_) => Ok(vec![row]),
        other => Err(AccessParkError::Decode {
            message: format!("expected rows, got {other}"),
            source: None,
        }),
    }
}

/// The single row returned by an insert with `return=representation`.
pub(crate) fn inserted_row(table: &str, body: Value) -> Result<Value, AccessParkError> {
    into_rows(body)?
        .into_iter()
        .next()
        .ok_or_else(|| AccessParkError::Decode {
            message: format!("insert into {table} returned no row"),
            source: None,
        })
}

/// Reads a session out of a token response. `None` when no token was issued.
pub(crate) fn parse_session(body: Value) -> Result<Option<AuthSession>, AccessParkError> {
    if body.get("access_token").and_then(Value::as_str).is_none() {
        return Ok(None);
    }
    serde_json::from_value(body)
        .map(Some)
        .map_err(|e| AccessParkError::decode("auth session", e))
}

pub(crate) fn require_session(body: Value) -> Result<AuthSession, AccessParkError> {
    parse_session(body)?.ok_or_else(|| AccessParkError::Decode {
        message: "sign in response carried no access token".into(),
        source: None,
    })
}

pub(crate) fn parse_user(body: Value) -> Result<User, AccessParkError> {
    serde_json::from_value(body).map_err(|e| AccessParkError::decode("user", e))
}

/// Unauthenticated answers to a "who am I" call mean "nobody", not failure.
pub(crate) fn is_unauthenticated(status: u16) -> bool {
    matches!(status, 401 | 403)
}

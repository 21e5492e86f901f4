// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the relay endpoint.
//!
//! `POST` carries an action and answers with the `{status, data}` envelope.
//! `GET ?action=storage` streams a stored object back so relay-mode public
//! URLs resolve. `OPTIONS` answers CORS preflights.

use std::str::FromStr;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use accesspark_core::{ActionKind, RelayAction, RelayEnvelope, RelayRequest};

use crate::error::RelayError;
use crate::server::RelayState;
use crate::upstream;

/// Query parameters accepted by `GET` on the relay path.
#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST on the relay path.
pub async fn post_relay(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<Json<RelayEnvelope>, RelayError> {
    relay_action(&state, &body).await.inspect_err(|e| {
        warn!(error = %e, status = %e.status(), "relay request failed");
    })
}

async fn relay_action(
    state: &RelayState,
    body: &[u8],
) -> Result<Json<RelayEnvelope>, RelayError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RelayError::Failed(format!("malformed request body: {e}")))?;

    // Unknown actions are rejected before their parameters are looked at.
    let kind = value
        .get("action")
        .and_then(Value::as_str)
        .and_then(|name| ActionKind::from_str(name).ok())
        .ok_or(RelayError::InvalidAction)?;

    let request: RelayRequest = serde_json::from_value(value)
        .map_err(|e| RelayError::Failed(format!("malformed {kind} request: {e}")))?;
    let call = upstream::plan(request)?;
    let envelope = state.upstream.execute(&call).await?;
    info!(action = %kind, upstream_status = envelope.status, "action relayed");
    Ok(Json(envelope))
}

/// GET on the relay path: only `action=storage` is served.
pub async fn get_relay(
    State(state): State<RelayState>,
    Query(query): Query<ObjectQuery>,
) -> Result<Response, RelayError> {
    let storage: &'static str = ActionKind::Storage.into();
    if query.action.as_deref() != Some(storage) {
        return Err(RelayError::InvalidAction);
    }
    let (Some(bucket), Some(path)) = (query.bucket, query.path) else {
        return Err(RelayError::Failed("storage requires bucket and path".into()));
    };

    let call = upstream::plan(RelayRequest::new(
        RelayAction::Storage { bucket, path },
        None,
    ))?;
    let object = state.upstream.fetch_object(&call).await.inspect_err(|e| {
        warn!(error = %e, "stored object fetch failed");
    })?;

    let status = StatusCode::from_u16(object.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::builder().status(status);
    if let Some(content_type) = object.content_type {
        response = response.header(header::CONTENT_TYPE, content_type);
    }
    response
        .body(Body::from(object.bytes))
        .map_err(|e| RelayError::Failed(format!("failed to build response: {e}")))
}

/// OPTIONS on the relay path. CORS headers are added by the layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn get_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

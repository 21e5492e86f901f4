// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of relay actions into upstream calls, and their execution.
//!
//! [`plan`] is the fixed action table. It is pure so the mapping can be checked
//! without a network. [`Upstream`] executes a planned call with the service key.

use std::time::Duration;

use accesspark_config::model::RelayServerConfig;
use accesspark_core::relay::decode_body;
use accesspark_core::{RelayAction, RelayEnvelope, RelayRequest};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::RelayError;

/// Cache lifetime attached to uploaded objects.
const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";

/// Whose credential goes into the upstream `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bearer {
    /// Always the service key.
    ServiceKey,
    /// The caller's token when given, otherwise the service key.
    CallerOrService(Option<String>),
}

/// Upstream request body.
#[derive(Clone, PartialEq)]
pub enum UpstreamBody {
    Empty,
    Json(Value),
    Binary { content_type: String, bytes: Vec<u8> },
}

impl std::fmt::Debug for UpstreamBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Json(_) => f.write_str("Json(..)"),
            Self::Binary {
                content_type,
                bytes,
            } => write!(f, "Binary({content_type}, {} bytes)", bytes.len()),
        }
    }
}

/// One planned call against the remote data service.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamCall {
    pub method: Method,
    /// Path plus optional query, e.g. `/rest/v1/parking_spots?select=*`.
    pub path: String,
    pub bearer: Bearer,
    /// Adds `Prefer: return=representation`.
    pub return_representation: bool,
    /// Adds `x-upsert: false` and a cache lifetime.
    pub no_overwrite: bool,
    pub body: UpstreamBody,
}

impl UpstreamCall {
    fn new(method: Method, path: String, bearer: Bearer) -> Self {
        Self {
            method,
            path,
            bearer,
            return_representation: false,
            no_overwrite: false,
            body: UpstreamBody::Empty,
        }
    }

    fn json(mut self, body: Value) -> Self {
        self.body = UpstreamBody::Json(body);
        self
    }

    fn returning(mut self) -> Self {
        self.return_representation = true;
        self
    }
}

/// Maps a relay request onto exactly one upstream call.
pub fn plan(request: RelayRequest) -> Result<UpstreamCall, RelayError> {
    let caller = Bearer::CallerOrService(request.token.filter(|t| !t.is_empty()));
    let call = match request.action {
        RelayAction::SignUp { email, password } => UpstreamCall::new(
            Method::POST,
            "/auth/v1/signup".into(),
            Bearer::ServiceKey,
        )
        .json(json!({"email": email, "password": password.0})),
        RelayAction::SignIn { email, password } => UpstreamCall::new(
            Method::POST,
            "/auth/v1/token?grant_type=password".into(),
            Bearer::ServiceKey,
        )
        .json(json!({"email": email, "password": password.0})),
        RelayAction::SignOut => {
            UpstreamCall::new(Method::POST, "/auth/v1/logout".into(), caller)
        }
        RelayAction::GetUser => UpstreamCall::new(Method::GET, "/auth/v1/user".into(), caller),
        RelayAction::Select { table, query } => {
            UpstreamCall::new(Method::GET, rest_path(&table, &query)?, caller)
        }
        RelayAction::Insert { table, data } => {
            UpstreamCall::new(Method::POST, rest_path(&table, "")?, caller)
                .json(data)
                .returning()
        }
        RelayAction::Update { table, data, query } => {
            UpstreamCall::new(Method::PATCH, rest_path(&table, &query)?, caller)
                .json(data)
                .returning()
        }
        RelayAction::Delete { table, query } => {
            UpstreamCall::new(Method::DELETE, rest_path(&table, &query)?, caller)
        }
        RelayAction::Storage { bucket, path } => {
            UpstreamCall::new(Method::GET, object_path(&bucket, &path)?, caller)
        }
        RelayAction::Upload {
            bucket,
            path,
            content_type,
            data_base64,
        } => {
            let bytes = STANDARD
                .decode(data_base64.as_bytes())
                .map_err(|e| RelayError::Failed(format!("upload payload is not base64: {e}")))?;
            let mut call = UpstreamCall::new(Method::POST, object_path(&bucket, &path)?, caller);
            call.no_overwrite = true;
            call.body = UpstreamBody::Binary {
                content_type,
                bytes,
            };
            call
        }
    };
    Ok(call)
}

/// `/storage/v1/object/{bucket}/{path}` after checking both parts.
pub fn object_path(bucket: &str, path: &str) -> Result<String, RelayError> {
    check_name("bucket", bucket)?;
    let segments_ok = !path.is_empty()
        && path
            .split('/')
            .all(|s| !s.is_empty() && s != "." && s != "..")
        && !path.contains(['?', '#', '\\']);
    if !segments_ok {
        return Err(RelayError::Failed(format!("invalid object path `{path}`")));
    }
    Ok(format!("/storage/v1/object/{bucket}/{path}"))
}

fn rest_path(table: &str, query: &str) -> Result<String, RelayError> {
    check_name("table", table)?;
    if query.contains('#') {
        return Err(RelayError::Failed("query must not contain `#`".into()));
    }
    let query = query.trim_start_matches('?');
    if query.is_empty() {
        Ok(format!("/rest/v1/{table}"))
    } else {
        Ok(format!("/rest/v1/{table}?{query}"))
    }
}

/// Table and bucket names are single path segments.
fn check_name(what: &str, name: &str) -> Result<(), RelayError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RelayError::Failed(format!("invalid {what} name `{name}`")))
    }
}

/// Raw upstream object response, passed back to GET callers unchanged.
#[derive(Debug)]
pub struct FetchedObject {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Executes planned calls against the remote data service.
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("base_url", &self.base_url)
            .field("service_key", &"[redacted]")
            .finish()
    }
}

impl Upstream {
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Failed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    pub fn from_config(config: &RelayServerConfig) -> Result<Self, RelayError> {
        let base_url = config
            .upstream_url
            .as_deref()
            .ok_or_else(|| RelayError::Failed("relay_server.upstream_url is not set".into()))?;
        let service_key = config
            .service_key
            .as_deref()
            .ok_or_else(|| RelayError::Failed("relay_server.service_key is not set".into()))?;
        Self::new(
            base_url,
            service_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn request(&self, call: &UpstreamCall) -> Result<reqwest::RequestBuilder, RelayError> {
        let token = match &call.bearer {
            Bearer::CallerOrService(Some(token)) => token.as_str(),
            Bearer::CallerOrService(None) | Bearer::ServiceKey => self.service_key.as_str(),
        };
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| RelayError::Failed(format!("invalid header value: {e}")))
        };

        let mut request = self
            .client
            .request(call.method.clone(), format!("{}{}", self.base_url, call.path))
            .header("apikey", header(&self.service_key)?)
            .header(AUTHORIZATION, header(&format!("Bearer {token}"))?);
        if call.return_representation {
            request = request.header("Prefer", "return=representation");
        }
        if call.no_overwrite {
            request = request
                .header("x-upsert", "false")
                .header("cache-control", UPLOAD_CACHE_CONTROL);
        }
        request = match &call.body {
            UpstreamBody::Empty => request.header(CONTENT_TYPE, "application/json"),
            UpstreamBody::Json(value) => request.json(value),
            UpstreamBody::Binary {
                content_type,
                bytes,
            } => request
                .header(CONTENT_TYPE, header(content_type)?)
                .body(bytes.clone()),
        };
        Ok(request)
    }

    async fn send(&self, call: &UpstreamCall) -> Result<reqwest::Response, RelayError> {
        self.request(call)?
            .send()
            .await
            .map_err(|e| RelayError::Failed(format!("upstream request failed: {e}")))
    }

    /// Executes a call and wraps the outcome, whatever its status.
    pub async fn execute(&self, call: &UpstreamCall) -> Result<RelayEnvelope, RelayError> {
        let response = self.send(call).await?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::Failed(format!("failed to read upstream body: {e}")))?;
        debug!(method = %call.method, status, "upstream call finished");
        Ok(RelayEnvelope {
            status,
            data: decode_body(&bytes),
        })
    }

    /// Fetches a stored object's raw bytes.
    pub async fn fetch_object(&self, call: &UpstreamCall) -> Result<FetchedObject, RelayError> {
        let response = self.send(call).await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::Failed(format!("failed to read upstream body: {e}")))?;
        debug!(status, len = bytes.len(), "stored object fetched");
        Ok(FetchedObject {
            status,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

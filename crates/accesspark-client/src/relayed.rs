// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facade variant that forwards every call through the same-origin relay.
//!
//! The client never holds a service credential. It posts `{action, token?, ...}`
//! to the relay and reads the upstream outcome out of the `{status, data}`
//! envelope, raising an error itself when `status >= 400`.

use accesspark_config::model::RelayClientConfig;
use accesspark_core::relay::Password;
use accesspark_core::{
    AccessParkError, AuthEvent, AuthSession, BackendAdapter, BackendMode, Credentials,
    HealthStatus, IdentityBackend, ObjectStorage, Query, RelayAction, RelayEnvelope,
    RelayRequest, StoredObject, TableBackend, User,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::http;
use crate::session::Session;

/// Access through the relay endpoint.
#[derive(Debug)]
pub struct RelayBackend {
    client: reqwest::Client,
    relay_url: Url,
    session: Session,
}

impl RelayBackend {
    /// Creates a relay facade posting to `relay_url`.
    pub fn new(relay_url: &str) -> Result<Self, AccessParkError> {
        let relay_url = Url::parse(relay_url).map_err(|e| {
            AccessParkError::Config(format!("relay url `{relay_url}` is invalid: {e}"))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: http::build_client(headers)?,
            relay_url,
            session: Session::new(),
        })
    }

    /// Creates a relay facade from the `[relay]` config section.
    pub fn from_config(config: &RelayClientConfig) -> Result<Self, AccessParkError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| AccessParkError::Config("relay.url is not set".into()))?;
        Self::new(url)
    }

    /// One round trip to the relay, returning the envelope as-is.
    async fn round_trip(
        &self,
        action: RelayAction,
        token: Option<String>,
    ) -> Result<RelayEnvelope, AccessParkError> {
        let kind = action.kind();
        let request = RelayRequest::new(action, token);
        let response = self
            .client
            .post(self.relay_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(http::transport)?;
        let (status, body) = http::read_response(response).await?;
        debug!(action = %kind, relay_status = status, "relay response received");

        if status != 200 {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| accesspark_core::error::upstream_message(&body));
            return Err(AccessParkError::Relay { status, message });
        }

        let envelope: RelayEnvelope =
            serde_json::from_value(body).map_err(|e| AccessParkError::decode("relay envelope", e))?;
        debug!(action = %kind, upstream_status = envelope.status, "relay envelope decoded");
        Ok(envelope)
    }

    /// Round trip with the held token, failing when the upstream status is >= 400.
    async fn call(&self, action: RelayAction) -> Result<Value, AccessParkError> {
        let envelope = self.round_trip(action, self.session.token()).await?;
        if envelope.is_error() {
            return Err(http::remote_error(envelope.status, &envelope.data));
        }
        Ok(envelope.data)
    }

    async fn authenticate(&self, action: RelayAction) -> Result<Value, AccessParkError> {
        // The relay always authenticates these with its service key.
        let envelope = self.round_trip(action, None).await?;
        if envelope.is_error() {
            return Err(http::remote_error(envelope.status, &envelope.data));
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl BackendAdapter for RelayBackend {
    fn name(&self) -> &str {
        "relay"
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Relay
    }

    async fn health_check(&self) -> Result<HealthStatus, AccessParkError> {
        let url = self
            .relay_url
            .join("/health")
            .map_err(|e| AccessParkError::Internal(format!("invalid health url: {e}")))?;
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Degraded(format!(
                "relay answered {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(http::transport(e).to_string())),
        }
    }
}

#[async_trait]
impl IdentityBackend for RelayBackend {
    async fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthSession>, AccessParkError> {
        credentials.validate()?;
        let data = self
            .authenticate(RelayAction::SignUp {
                email: credentials.email.trim().to_string(),
                password: Password(credentials.password.clone()),
            })
            .await?;
        let session = http::parse_session(data)?;
        if let Some(session) = &session {
            self.session.establish(session.clone());
        }
        Ok(session)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AccessParkError> {
        credentials.validate()?;
        let data = self
            .authenticate(RelayAction::SignIn {
                email: credentials.email.trim().to_string(),
                password: Password(credentials.password.clone()),
            })
            .await?;
        let session = http::require_session(data)?;
        self.session.establish(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AccessParkError> {
        if self.session.token().is_some() {
            if let Err(e) = self.call(RelayAction::SignOut).await {
                warn!(error = %e, "remote sign out failed, clearing local session anyway");
            }
        }
        self.session.clear();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AccessParkError> {
        let Some(token) = self.session.token() else {
            return Ok(None);
        };
        let envelope = self.round_trip(RelayAction::GetUser, Some(token)).await?;
        if http::is_unauthenticated(envelope.status) {
            return Ok(None);
        }
        if envelope.is_error() {
            return Err(http::remote_error(envelope.status, &envelope.data));
        }
        let user = http::parse_user(envelope.data)?;
        self.session.refresh_user(user.clone());
        Ok(Some(user))
    }

    async fn session(&self) -> Result<Option<AuthSession>, AccessParkError> {
        match self.current_user().await? {
            Some(_) => Ok(self.session.snapshot()),
            None => Ok(None),
        }
    }

    fn signed_in_user(&self) -> Option<User> {
        self.session.user()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.session.subscribe()
    }
}

#[async_trait]
impl TableBackend for RelayBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AccessParkError> {
        let data = self
            .call(RelayAction::Select {
                table: table.to_string(),
                query: query.to_query_string(),
            })
            .await?;
        http::into_rows(data)
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value, AccessParkError> {
        let data = self
            .call(RelayAction::Insert {
                table: table.to_string(),
                data: record,
            })
            .await?;
        http::inserted_row(table, data)
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, AccessParkError> {
        query.require_filter("update")?;
        let data = self
            .call(RelayAction::Update {
                table: table.to_string(),
                data: patch,
                query: query.filter_string(),
            })
            .await?;
        http::into_rows(data)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<(), AccessParkError> {
        query.require_filter("delete")?;
        self.call(RelayAction::Delete {
            table: table.to_string(),
            query: query.filter_string(),
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for RelayBackend {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        object: StoredObject,
    ) -> Result<String, AccessParkError> {
        let envelope = self
            .round_trip(
                RelayAction::Upload {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                    content_type: object.content_type,
                    data_base64: STANDARD.encode(&object.bytes),
                },
                self.session.token(),
            )
            .await?;
        if http::is_duplicate(envelope.status, &envelope.data) {
            return Err(AccessParkError::Conflict {
                what: format!("{bucket}/{path}"),
            });
        }
        if envelope.is_error() {
            return Err(http::remote_error(envelope.status, &envelope.data));
        }
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        let mut url = self.relay_url.clone();
        url.query_pairs_mut()
            .append_pair("action", "storage")
            .append_pair("bucket", bucket)
            .append_pair("path", path);
        url.to_string()
    }
}

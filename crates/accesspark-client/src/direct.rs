// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facade variant that talks to the remote data service directly.
//!
//! Every call is one round trip carrying the public API key. Once signed in,
//! the held bearer token replaces the key in the `Authorization` header.

use accesspark_config::model::RemoteConfig;
use accesspark_core::{
    AccessParkError, AuthEvent, AuthSession, BackendAdapter, BackendMode, Credentials,
    HealthStatus, IdentityBackend, ObjectStorage, Query, StoredObject, TableBackend, User,
};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::http;
use crate::session::Session;

/// Cache lifetime attached to uploaded objects.
const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";

/// Direct access to the remote data service.
pub struct DirectBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    session: Session,
}

impl std::fmt::Debug for DirectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("signed_in", &self.session.token().is_some())
            .finish()
    }
}

impl DirectBackend {
    /// Creates a direct facade for the service at `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AccessParkError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", http::header_value("apikey", api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: http::build_client(headers)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: Session::new(),
        })
    }

    /// Creates a direct facade from the `[remote]` config section.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, AccessParkError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| AccessParkError::Config("remote.base_url is not set".into()))?;
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| AccessParkError::Config("remote.api_key is not set".into()))?;
        Self::new(base_url, api_key)
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        }
    }

    /// Starts a request authorized with the held token, or the API key.
    fn request(
        &self,
        method: Method,
        url: String,
    ) -> Result<reqwest::RequestBuilder, AccessParkError> {
        let token = self.session.token().unwrap_or_else(|| self.api_key.clone());
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, http::bearer(&token)?))
    }

    /// Starts a request authorized with the API key regardless of the session.
    fn anonymous(
        &self,
        method: Method,
        url: String,
    ) -> Result<reqwest::RequestBuilder, AccessParkError> {
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, http::bearer(&self.api_key)?))
    }

    /// Sends and returns the decoded body, failing on status >= 400.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value, AccessParkError> {
        let (status, body) = self.execute_raw(request).await?;
        if status >= 400 {
            return Err(http::remote_error(status, &body));
        }
        Ok(body)
    }

    async fn execute_raw(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(u16, Value), AccessParkError> {
        let response = request.send().await.map_err(http::transport)?;
        let (status, body) = http::read_response(response).await?;
        debug!(status, "remote response received");
        Ok((status, body))
    }

    fn credentials_body(credentials: &Credentials) -> Value {
        json!({"email": credentials.email.trim(), "password": credentials.password})
    }
}

#[async_trait]
impl BackendAdapter for DirectBackend {
    fn name(&self) -> &str {
        "direct"
    }

    fn mode(&self) -> BackendMode {
        BackendMode::Direct
    }

    async fn health_check(&self) -> Result<HealthStatus, AccessParkError> {
        let request = self.anonymous(Method::GET, self.url("/auth/v1/health", ""))?;
        match self.execute(request).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl IdentityBackend for DirectBackend {
    async fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthSession>, AccessParkError> {
        credentials.validate()?;
        let request = self
            .anonymous(Method::POST, self.url("/auth/v1/signup", ""))?
            .json(&Self::credentials_body(credentials));
        let body = self.execute(request).await?;
        let session = http::parse_session(body)?;
        if let Some(session) = &session {
            self.session.establish(session.clone());
        }
        Ok(session)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AccessParkError> {
        credentials.validate()?;
        let request = self
            .anonymous(
                Method::POST,
                self.url("/auth/v1/token", "grant_type=password"),
            )?
            .json(&Self::credentials_body(credentials));
        let session = http::require_session(self.execute(request).await?)?;
        self.session.establish(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AccessParkError> {
        if self.session.token().is_some() {
            let outcome = match self.request(Method::POST, self.url("/auth/v1/logout", "")) {
                Ok(request) => self.execute(request).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                warn!(error = %e, "remote sign out failed, clearing local session anyway");
            }
        }
        self.session.clear();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AccessParkError> {
        if self.session.token().is_none() {
            return Ok(None);
        }
        let request = self.request(Method::GET, self.url("/auth/v1/user", ""))?;
        let (status, body) = self.execute_raw(request).await?;
        if http::is_unauthenticated(status) {
            return Ok(None);
        }
        if status >= 400 {
            return Err(http::remote_error(status, &body));
        }
        let user = http::parse_user(body)?;
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
impl TableBackend for DirectBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AccessParkError> {
        let url = self.url(&format!("/rest/v1/{table}"), &query.to_query_string());
        let body = self.execute(self.request(Method::GET, url)?).await?;
        http::into_rows(body)
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value, AccessParkError> {
        let request = self
            .request(Method::POST, self.url(&format!("/rest/v1/{table}"), ""))?
            .header("Prefer", "return=representation")
            .json(&record);
        let body = self.execute(request).await?;
        http::inserted_row(table, body)
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, AccessParkError> {
        query.require_filter("update")?;
        let url = self.url(&format!("/rest/v1/{table}"), &query.filter_string());
        let request = self
            .request(Method::PATCH, url)?
            .header("Prefer", "return=representation")
            .json(&patch);
        http::into_rows(self.execute(request).await?)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<(), AccessParkError> {
        query.require_filter("delete")?;
        let url = self.url(&format!("/rest/v1/{table}"), &query.filter_string());
        self.execute(self.request(Method::DELETE, url)?).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for DirectBackend {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        object: StoredObject,
    ) -> Result<String, AccessParkError> {
        let url = self.url(&format!("/storage/v1/object/{bucket}/{path}"), "");
        let request = self
            .request(Method::POST, url)?
            .header(CONTENT_TYPE, http::header_value("content-type", &object.content_type)?)
            .header("x-upsert", "false")
            .header("cache-control", UPLOAD_CACHE_CONTROL)
            .body(object.bytes);
        let (status, body) = self.execute_raw(request).await?;
        if http::is_duplicate(status, &body) {
            return Err(AccessParkError::Conflict {
                what: format!("{bucket}/{path}"),
            });
        }
        if status >= 400 {
            return Err(http::remote_error(status, &body));
        }
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accesspark_core::UserId;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_body() -> Value {
        json!({
            "access_token": "user-jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {"id": "u-1", "email": "nikos@example.gr"}
        })
    }

    async fn signed_in(server: &MockServer) -> DirectBackend {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(server)
            .await;
        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        backend
            .sign_in(&Credentials::new("nikos@example.gr", "secret"))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn select_sends_key_and_encoded_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/parking_spots"))
            .and(query_param("select", "*"))
            .and(query_param("status", "eq.approved"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let rows = backend
            .select("parking_spots", &Query::select("*").eq("status", "approved"))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"id": "a"})]);
    }

    #[tokio::test]
    async fn sign_in_stores_token_for_later_calls() {
        let server = MockServer::start().await;
        let backend = signed_in(&server).await;
        assert_eq!(
            backend.signed_in_user().map(|u| u.id),
            Some(UserId("u-1".into()))
        );

        Mock::given(method("POST"))
            .and(path("/rest/v1/parking_spots"))
            .and(header("authorization", "Bearer user-jwt"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"city": "Patras"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{"id": "new", "city": "Patras"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let row = backend
            .insert("parking_spots", json!({"city": "Patras"}))
            .await
            .unwrap();
        assert_eq!(row["id"], "new");
    }

    #[tokio::test]
    async fn sign_in_rejects_empty_credentials_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let err = backend.sign_in(&Credentials::new("", "")).await.unwrap_err();
        assert!(matches!(err, AccessParkError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_sign_in_surfaces_remote_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let err = backend
            .sign_in(&Credentials::new("a@b.gr", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Invalid login credentials"), "got: {err}");
        assert!(backend.signed_in_user().is_none());
    }

    #[tokio::test]
    async fn sign_up_without_session_leaves_caller_signed_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "u-9", "email": "x@y.gr"})),
            )
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let session = backend
            .sign_up(&Credentials::new("x@y.gr", "pw12345"))
            .await
            .unwrap();
        assert!(session.is_none());
        assert!(backend.signed_in_user().is_none());
    }

    #[tokio::test]
    async fn update_and_delete_refuse_unfiltered_queries() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let err = backend
            .update("parking_spots", json!({"status": "approved"}), &Query::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessParkError::MissingFilter { operation: "update" }));
        let err = backend
            .delete("parking_spots", &Query::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessParkError::MissingFilter { operation: "delete" }));
    }

    #[tokio::test]
    async fn update_is_scoped_by_filter() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/parking_spots"))
            .and(query_param("id", "eq.spot-1"))
            .and(header("prefer", "return=representation"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "spot-1", "status": "rejected"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let rows = backend
            .update(
                "parking_spots",
                json!({"status": "rejected"}),
                &Query::default().eq("id", "spot-1"),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn upload_never_overwrites() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/spot-images/spots/a.jpg"))
            .and(header("x-upsert", "false"))
            .and(header("content-type", "image/jpeg"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Key": "spot-images/spots/a.jpg"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/spot-images/spots/a.jpg"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })))
            .mount(&server)
            .await;

        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        let object = StoredObject {
            content_type: "image/jpeg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };
        let url = backend
            .upload_object("spot-images", "spots/a.jpg", object.clone())
            .await
            .unwrap();
        assert_eq!(
            url,
            format!("{}/storage/v1/object/public/spot-images/spots/a.jpg", server.uri())
        );

        let err = backend
            .upload_object("spot-images", "spots/a.jpg", object)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessParkError::Conflict { .. }));
    }

    #[tokio::test]
    async fn sign_out_clears_even_when_remote_fails() {
        let server = MockServer::start().await;
        let backend = signed_in(&server).await;
        let mut events = backend.subscribe();

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        backend.sign_out().await.unwrap();
        assert!(backend.signed_in_user().is_none());
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn current_user_is_none_when_signed_out_or_expired() {
        let server = MockServer::start().await;
        let backend = DirectBackend::new(&server.uri(), "anon-key").unwrap();
        assert!(backend.current_user().await.unwrap().is_none());

        let backend = signed_in(&server).await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "expired"})))
            .mount(&server)
            .await;
        assert!(backend.current_user().await.unwrap().is_none());
        assert!(backend.session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_service() {
        let backend = DirectBackend::new("http://127.0.0.1:9", "anon-key").unwrap();
        let status = backend.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }

    #[test]
    fn debug_hides_api_key() {
        let backend = DirectBackend::new("https://db.example.gr/", "anon-key").unwrap();
        let debug = format!("{backend:?}");
        assert!(!debug.contains("anon-key"));
        assert_eq!(
            backend.public_url("b", "p.png"),
            "https://db.example.gr/storage/v1/object/public/b/p.png"
        );
    }
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay router tests against a faked upstream data service.

use std::time::Duration;

use accesspark_relay::{RelayState, Upstream, router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_KEY: &str = "service-key";

fn app(upstream: &MockServer) -> Router {
    let upstream = Upstream::new(&upstream.uri(), SERVICE_KEY, Duration::from_secs(5)).unwrap();
    router(RelayState::new(upstream), "/api/relay")
}

async fn post_raw(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/relay")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: Router, body: Value) -> (StatusCode, Value) {
    post_raw(app, &body.to_string()).await
}

#[tokio::test]
async fn select_uses_caller_token() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/parking_spots"))
        .and(query_param("status", "eq.pending"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", SERVICE_KEY))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "p1"}])))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = post(
        app(&upstream),
        json!({
            "action": "select",
            "table": "parking_spots",
            "query": "select=*&status=eq.pending&order=created_at.desc",
            "token": "user-jwt"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": 200, "data": [{"id": "p1"}]}));
}

#[tokio::test]
async fn anonymous_select_falls_back_to_service_key() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/parking_spots"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = post(
        app(&upstream),
        json!({
            "action": "select",
            "table": "parking_spots",
            "query": "select=*&status=eq.approved"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn sign_in_ignores_caller_token() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("authorization", "Bearer service-key"))
        .and(body_json(json!({"email": "a@b.gr", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt"})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (_, body) = post(
        app(&upstream),
        json!({
            "action": "signInWithPassword",
            "email": "a@b.gr",
            "password": "pw",
            "token": "stale-jwt"
        }),
    )
    .await;
    assert_eq!(body["data"]["access_token"], "jwt");
}

#[tokio::test]
async fn insert_asks_for_representation_and_passes_status_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/parking_spots"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({"city": "Volos", "status": "pending"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "n1"}])))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, body) = post(
        app(&upstream),
        json!({
            "action": "insert",
            "table": "parking_spots",
            "data": {"city": "Volos", "status": "pending"},
            "token": "user-jwt"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 201);
}

#[tokio::test]
async fn upstream_errors_stay_inside_the_envelope() {
    let upstream = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/parking_spots"))
        .and(query_param("id", "eq.s1"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "permission denied"})),
        )
        .mount(&upstream)
        .await;

    let (status, body) = post(
        app(&upstream),
        json!({
            "action": "update",
            "table": "parking_spots",
            "data": {"status": "approved"},
            "query": "id=eq.s1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 403);
    assert_eq!(body["data"]["message"], "permission denied");
}

#[tokio::test]
async fn empty_and_text_bodies_are_normalized() {
    let upstream = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&upstream)
        .await;

    let (_, body) = post(
        app(&upstream),
        json!({"action": "delete", "table": "parking_spots", "query": "id=eq.s1"}),
    )
    .await;
    assert_eq!(body, json!({"status": 204, "data": null}));

    let (_, body) = post(app(&upstream), json!({"action": "signOut", "token": "jwt"})).await;
    assert_eq!(body, json!({"status": 502, "data": "Bad Gateway"}));
}

#[tokio::test]
async fn unknown_actions_are_rejected_without_upstream_calls() {
    let upstream = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    for body in [
        json!({"action": "dropTable", "table": "parking_spots"}),
        json!({"action": "Select", "table": "parking_spots"}),
        json!({"table": "parking_spots"}),
        json!({"action": 7}),
    ] {
        let (status, body) = post(app(&upstream), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid action"}));
    }
}

#[tokio::test]
async fn malformed_input_is_a_relay_failure() {
    let upstream = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let (status, body) = post_raw(app(&upstream), "{not json").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("malformed"));

    let (status, body) = post(app(&upstream), json!({"action": "insert"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, _) = post(
        app(&upstream),
        json!({"action": "select", "table": "../auth/v1/admin"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unreachable_upstream_is_a_relay_failure() {
    let upstream =
        Upstream::new("http://127.0.0.1:9", SERVICE_KEY, Duration::from_secs(2)).unwrap();
    let app = router(RelayState::new(upstream), "/api/relay");
    let (status, body) = post(app, json!({"action": "getUser"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("upstream request failed"));
}

#[tokio::test]
async fn upload_refuses_overwrite_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/spot-images/spots/u.png"))
        .and(header("x-upsert", "false"))
        .and(header("content-type", "image/png"))
        .and(header("authorization", "Bearer user-jwt"))
        .and(body_bytes(vec![1u8, 2, 3]))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Key": "spot-images/spots/u.png"})),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let (_, body) = post(
        app(&upstream),
        json!({
            "action": "upload",
            "bucket": "spot-images",
            "path": "spots/u.png",
            "content_type": "image/png",
            "data_base64": "AQID",
            "token": "user-jwt"
        }),
    )
    .await;
    assert_eq!(body["status"], 200);
}

#[tokio::test]
async fn get_streams_stored_objects() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/spot-images/spots/a.jpg"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0xFFu8, 0xD8, 0xFF], "image/jpeg"),
        )
        .mount(&upstream)
        .await;

    let request = Request::builder()
        .uri("/api/relay?action=storage&bucket=spot-images&path=spots%2Fa.jpg")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn get_with_other_action_is_invalid() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .uri("/api/relay?action=select&table=parking_spots")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/relay")
        .header("origin", "https://accesspark.example.gr")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let methods = response.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"), "got: {methods}");
    assert!(methods.contains("OPTIONS"), "got: {methods}");
    assert!(!methods.contains("GET"), "got: {methods}");
}

#[tokio::test]
async fn plain_options_and_health_answer_ok() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/relay")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

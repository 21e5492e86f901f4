// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay HTTP server built on axum.

use std::sync::Arc;

use accesspark_config::model::RelayServerConfig;
use accesspark_core::AccessParkError;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::upstream::Upstream;

/// Shared state for relay handlers.
#[derive(Clone, Debug)]
pub struct RelayState {
    pub upstream: Arc<Upstream>,
}

impl RelayState {
    pub fn new(upstream: Upstream) -> Self {
        Self {
            upstream: Arc::new(upstream),
        }
    }
}

/// Where the relay listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route the relay endpoint is mounted on.
    pub path: String,
}

impl From<&RelayServerConfig> for ServerConfig {
    fn from(config: &RelayServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            path: config.path.clone(),
        }
    }
}

/// Any origin may call the relay; browsers only need `Content-Type`.
/// Storage GETs are simple requests and never preflighted.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Builds the relay router:
/// - POST/GET/OPTIONS `{path}`
/// - GET /health
pub fn router(state: RelayState, path: &str) -> Router {
    Router::new()
        .route(
            path,
            post(handlers::post_relay)
                .get(handlers::get_relay)
                .options(handlers::preflight),
        )
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AccessParkError> {
    axum::serve(listener, app)
        .await
        .map_err(|e| AccessParkError::Transport {
            message: format!("relay server error: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Binds the configured address and serves the relay.
pub async fn start_server(config: &ServerConfig, state: RelayState) -> Result<(), AccessParkError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AccessParkError::Transport {
            message: format!("failed to bind relay to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(path = %config.path, "relay listening on {addr}");
    serve(listener, router(state, &config.path)).await
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `accesspark relay` command implementation.
//!
//! Serves the same-origin relay, forwarding structured actions to the remote
//! data service with the service key.

use accesspark_config::AccessParkConfig;
use accesspark_core::AccessParkError;
use accesspark_relay::{RelayState, ServerConfig, Upstream, start_server};
use tracing::info;

/// Runs the `accesspark relay` command until the server stops.
pub async fn run_relay(config: &AccessParkConfig) -> Result<(), AccessParkError> {
    let upstream = Upstream::from_config(&config.relay_server)
        .map_err(|e| AccessParkError::Config(e.to_string()))?;
    info!(upstream = ?upstream, "starting accesspark relay");

    let server = ServerConfig::from(&config.relay_server);
    tokio::select! {
        result = start_server(&server, RelayState::new(upstream)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping relay");
            Ok(())
        }
    }
}

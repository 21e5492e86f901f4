// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend access facade for accesspark.
//!
//! Two interchangeable variants implement [`BackendAccess`]:
//! [`DirectBackend`] talks to the remote data service with the public key,
//! [`RelayBackend`] forwards every call through the same-origin relay. The
//! variant is chosen once, at startup, from `backend.mode`.

pub mod direct;
pub mod geocode;
mod http;
pub mod relayed;
pub mod session;

use std::sync::Arc;

use accesspark_config::AccessParkConfig;
use accesspark_core::{AccessParkError, BackendAccess, BackendMode, ReverseGeocoder};
use tracing::info;

pub use direct::DirectBackend;
pub use geocode::NominatimGeocoder;
pub use relayed::RelayBackend;
pub use session::Session;

/// Builds the facade variant selected by `backend.mode`.
pub fn connect(config: &AccessParkConfig) -> Result<Arc<dyn BackendAccess>, AccessParkError> {
    let backend: Arc<dyn BackendAccess> = match config.backend.mode {
        BackendMode::Direct => Arc::new(DirectBackend::from_config(&config.remote)?),
        BackendMode::Relay => Arc::new(RelayBackend::from_config(&config.relay)?),
    };
    info!(mode = %config.backend.mode, "backend facade ready");
    Ok(backend)
}

/// Builds the reverse geocoder, or `None` when geocoding is disabled.
pub fn geocoder(
    config: &AccessParkConfig,
) -> Result<Option<Arc<dyn ReverseGeocoder>>, AccessParkError> {
    if !config.geocoding.enabled {
        return Ok(None);
    }
    let geocoder = NominatimGeocoder::from_config(&config.geocoding)?;
    Ok(Some(Arc::new(geocoder)))
}

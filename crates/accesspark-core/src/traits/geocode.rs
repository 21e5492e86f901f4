// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::AccessParkError;

/// Resolves coordinates to the name of the surrounding locality.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + 'static {
    /// Returns the city, town, village or suburb at the coordinates, if any.
    async fn locality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, AccessParkError>;
}

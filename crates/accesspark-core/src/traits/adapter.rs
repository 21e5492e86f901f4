// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by all backend facade variants.

use async_trait::async_trait;

use crate::error::AccessParkError;
use crate::types::{BackendMode, HealthStatus};

/// Identity and health of a facade variant.
#[async_trait]
pub trait BackendAdapter: Send + Sync + 'static {
    /// Human-readable name of this variant.
    fn name(&self) -> &str;

    /// Whether calls go direct or through the relay.
    fn mode(&self) -> BackendMode;

    /// Probes the service this variant talks to.
    async fn health_check(&self) -> Result<HealthStatus, AccessParkError>;
}

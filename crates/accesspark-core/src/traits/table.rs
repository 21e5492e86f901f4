// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level table operations.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AccessParkError;
use crate::query::Query;
use crate::traits::adapter::BackendAdapter;

/// Select, insert, update and delete against a remote table.
///
/// `update` and `delete` must fail with [`AccessParkError::MissingFilter`]
/// when the query carries no filter.
#[async_trait]
pub trait TableBackend: BackendAdapter {
    /// Returns the rows matching `query`.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, AccessParkError>;

    /// Inserts one record and returns it as persisted.
    async fn insert(&self, table: &str, record: Value) -> Result<Value, AccessParkError>;

    /// Applies `patch` to the rows matching `query` and returns them.
    async fn update(
        &self,
        table: &str,
        patch: Value,
        query: &Query,
    ) -> Result<Vec<Value>, AccessParkError>;

    /// Deletes the rows matching `query`.
    async fn delete(&self, table: &str, query: &Query) -> Result<(), AccessParkError>;
}

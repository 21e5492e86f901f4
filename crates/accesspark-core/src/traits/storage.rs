// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary object storage with public URL issuance.

use async_trait::async_trait;

use crate::error::AccessParkError;
use crate::traits::adapter::BackendAdapter;
use crate::types::StoredObject;

#[async_trait]
pub trait ObjectStorage: BackendAdapter {
    /// Stores `object` at `bucket/path` and returns its public URL.
    ///
    /// Existing objects are never overwritten.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        object: StoredObject,
    ) -> Result<String, AccessParkError>;

    /// The public URL an object at `bucket/path` resolves under.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend facade traits.
//!
//! Every facade variant extends [`BackendAdapter`] and uses `#[async_trait]`
//! so it can be held as `Arc<dyn BackendAccess>`.

pub mod adapter;
pub mod geocode;
pub mod identity;
pub mod storage;
pub mod table;

pub use adapter::BackendAdapter;
pub use geocode::ReverseGeocoder;
pub use identity::IdentityBackend;
pub use storage::ObjectStorage;
pub use table::TableBackend;

/// The full capability set used by listing operations.
///
/// Implemented automatically for anything providing identity, table and
/// storage operations.
pub trait BackendAccess: IdentityBackend + TableBackend + ObjectStorage {}

impl<T> BackendAccess for T where T: IdentityBackend + TableBackend + ObjectStorage {}

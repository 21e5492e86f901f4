// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for accesspark.
//!
//! This crate provides the listing domain types, the shared error type, and
//! the backend facade traits. The direct and relay facade variants, the relay
//! server and the listing operations all build on what is defined here.

pub mod error;
pub mod query;
pub mod relay;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AccessParkError;
pub use query::{Direction, Filter, Query};
pub use relay::{ActionKind, RelayAction, RelayEnvelope, RelayFailure, RelayRequest};
pub use types::{
    AuthEvent, AuthSession, BackendMode, Credentials, HealthStatus, NewParkingSpot, ParkingSpot,
    SpotDetail, SpotId, SpotStatus, StoredObject, SurfaceType, UNKNOWN_LOCATION, User, UserId,
};

pub use traits::{
    BackendAccess, BackendAdapter, IdentityBackend, ObjectStorage, ReverseGeocoder, TableBackend,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_facade_traits_are_exported() {
        fn _assert_adapter<T: BackendAdapter>() {}
        fn _assert_identity<T: IdentityBackend>() {}
        fn _assert_table<T: TableBackend>() {}
        fn _assert_storage<T: ObjectStorage>() {}
        fn _assert_access<T: BackendAccess>() {}
        fn _assert_geocoder<T: ReverseGeocoder>() {}
    }

    #[test]
    fn backend_access_is_object_safe() {
        fn _takes(_: std::sync::Arc<dyn BackendAccess>) {}
        fn _takes_geocoder(_: std::sync::Arc<dyn ReverseGeocoder>) {}
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SpotStatus::Pending.is_terminal());
        assert!(SpotStatus::Approved.is_terminal());
        assert!(SpotStatus::Rejected.is_terminal());
    }
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for accesspark integration tests.
//!
//! - [`MockBackend`] - in-memory facade with users, tables, objects and a
//!   round-trip counter
//! - [`MockGeocoder`] - reverse geocoder with a fixed answer

pub mod mock_backend;
pub mod mock_geocoder;

pub use mock_backend::{ADMINS_TABLE, MockBackend, PROFILES_TABLE};
pub use mock_geocoder::MockGeocoder;

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing lifecycle operations for accesspark.
//!
//! [`ListingService`] submits, moderates, fetches and deletes parking spot
//! listings over any [`BackendAccess`](accesspark_core::BackendAccess)
//! variant, and keeps the public and pending listing sets in a
//! [`ListingCache`] that mutations invalidate.

pub mod cache;
pub mod draft;
pub mod photo;
pub mod service;

pub use cache::{CacheKey, ListingCache};
pub use draft::{ListingDraft, Location};
pub use photo::{PhotoFile, photo_path};
pub use service::{DETAIL_COLUMNS, ListingService};

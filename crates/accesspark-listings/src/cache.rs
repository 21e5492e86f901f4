// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two logical listing caches.
//!
//! Every key carries a generation counter. Invalidation bumps the counter and
//! drops the cached value; a fetch records the generation it started under
//! and its result is only stored if no invalidation happened in between.

use std::sync::Arc;

use accesspark_core::ParkingSpot;
use dashmap::DashMap;
use strum::Display;

/// Which listing set a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CacheKey {
    /// Approved listings shown on the public map.
    Public,
    /// Listings waiting for moderation.
    Pending,
}

#[derive(Debug, Default)]
struct Entry {
    generation: u64,
    value: Option<Arc<[ParkingSpot]>>,
}

#[derive(Debug, Default)]
pub struct ListingCache {
    entries: DashMap<CacheKey, Entry>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached listing set, if present.
    pub fn get(&self, key: CacheKey) -> Option<Arc<[ParkingSpot]>> {
        self.entries.get(&key).and_then(|entry| entry.value.clone())
    }

    /// Current generation of `key`. Pass it back to [`store`](Self::store).
    pub fn generation(&self, key: CacheKey) -> u64 {
        self.entries.get(&key).map_or(0, |entry| entry.generation)
    }

    /// Stores `value` unless `key` was invalidated after `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub fn store(&self, key: CacheKey, generation: u64, value: Arc<[ParkingSpot]>) -> bool {
        let mut entry = self.entries.entry(key).or_default();
        if entry.generation != generation {
            return false;
        }
        entry.value = Some(value);
        true
    }

    pub fn invalidate(&self, key: CacheKey) {
        let mut entry = self.entries.entry(key).or_default();
        entry.generation += 1;
        entry.value = None;
    }

    pub fn invalidate_all(&self) {
        self.invalidate(CacheKey::Public);
        self.invalidate(CacheKey::Pending);
    }
}

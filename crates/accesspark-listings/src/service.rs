// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing lifecycle operations over the backend facade.

use std::sync::Arc;

use accesspark_config::AccessParkConfig;
use accesspark_config::model::ListingsConfig;
use accesspark_core::{
    AccessParkError, BackendAccess, Direction, ParkingSpot, Query, ReverseGeocoder, SpotDetail,
    SpotId, SpotStatus, UNKNOWN_LOCATION, User,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ListingCache};
use crate::draft::{ListingDraft, Location};
use crate::photo::{PhotoFile, photo_path};

/// Projection used by [`ListingService::fetch_listing_detail`].
pub const DETAIL_COLUMNS: &str =
    "*,approver:admins!fk_approver(email),submitter:profiles!fk_submitter(email)";

const ADMINS_TABLE: &str = "admins";

/// Submits, moderates and reads listings.
///
/// Mutations invalidate the public and pending caches only after the remote
/// call succeeds.
pub struct ListingService {
    backend: Arc<dyn BackendAccess>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    cache: ListingCache,
    config: ListingsConfig,
}

impl ListingService {
    pub fn new(backend: Arc<dyn BackendAccess>, config: ListingsConfig) -> Self {
        Self {
            backend,
            geocoder: None,
            cache: ListingCache::new(),
            config,
        }
    }

    /// Resolves missing cities through `geocoder`.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Connects the configured facade variant and geocoder.
    pub fn from_config(config: &AccessParkConfig) -> Result<Self, AccessParkError> {
        let backend = accesspark_client::connect(config)?;
        let service = Self::new(backend, config.listings.clone());
        Ok(match accesspark_client::geocoder(config)? {
            Some(geocoder) => service.with_geocoder(geocoder),
            None => service,
        })
    }

    pub fn backend(&self) -> &Arc<dyn BackendAccess> {
        &self.backend
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    /// Approved listings, served from cache when present.
    pub async fn fetch_public_listings(&self) -> Result<Arc<[ParkingSpot]>, AccessParkError> {
        let query = Query::default().eq("status", SpotStatus::Approved);
        self.cached(CacheKey::Public, query).await
    }

    /// Pending listings, newest first. Visibility is enforced by the backend.
    pub async fn fetch_pending_listings(&self) -> Result<Arc<[ParkingSpot]>, AccessParkError> {
        let query = Query::default()
            .eq("status", SpotStatus::Pending)
            .order_by("created_at", Direction::Desc);
        self.cached(CacheKey::Pending, query).await
    }

    /// Inserts a draft as a pending listing owned by the signed-in user.
    ///
    /// Fails without any network call when nobody is signed in or no location
    /// was chosen.
    pub async fn submit_listing(&self, draft: ListingDraft) -> Result<ParkingSpot, AccessParkError> {
        let user = self.require_user()?;
        let location = draft.location.ok_or_else(|| {
            AccessParkError::Validation("choose a location on the map before submitting".into())
        })?;
        location.validate()?;

        let city = match draft.city() {
            Some(city) => city.to_string(),
            None => self.resolve_city(location).await,
        };
        let spot = draft.into_new_spot(location, city);
        spot.validate()?;

        let mut record = serde_json::to_value(&spot)
            .map_err(|e| AccessParkError::Internal(format!("encode listing: {e}")))?;
        if let Value::Object(map) = &mut record {
            map.insert("status".into(), json!(SpotStatus::Pending));
            map.insert("submitted_by".into(), json!(user.id));
        }

        let row = self.backend.insert(&self.config.table, record).await?;
        let created: ParkingSpot = decode(row, "inserted listing")?;
        self.cache.invalidate_all();
        info!(id = %created.id, city = %created.city, "listing submitted");
        Ok(created)
    }

    /// Marks a listing approved by the signed-in moderator.
    ///
    /// The update matches on id only, so a listing that was already rejected
    /// or approved is overwritten. Concurrent moderation is last write wins.
    pub async fn approve_listing(&self, id: &SpotId) -> Result<ParkingSpot, AccessParkError> {
        require_id(id)?;
        let user = self.require_user()?;
        let patch = json!({
            "status": SpotStatus::Approved,
            "approved_by": user.id,
            "approved_at": Utc::now(),
        });
        let spot = self.moderate(id, patch).await?;
        info!(id = %id, moderator = %user.id, "listing approved");
        Ok(spot)
    }

    /// Marks a listing rejected.
    ///
    /// Like approval this matches on id only. Rejecting an approved listing
    /// leaves its `approved_by` and `approved_at` in place.
    pub async fn reject_listing(&self, id: &SpotId) -> Result<ParkingSpot, AccessParkError> {
        require_id(id)?;
        let user = self.require_user()?;
        let spot = self
            .moderate(id, json!({"status": SpotStatus::Rejected}))
            .await?;
        info!(id = %id, moderator = %user.id, "listing rejected");
        Ok(spot)
    }

    /// Removes a listing whatever its status.
    pub async fn delete_listing(&self, id: &SpotId) -> Result<(), AccessParkError> {
        require_id(id)?;
        self.backend
            .delete(&self.config.table, &Query::default().eq("id", id))
            .await?;
        self.cache.invalidate_all();
        info!(id = %id, "listing deleted");
        Ok(())
    }

    /// A single listing joined with its submitter and approver emails.
    pub async fn fetch_listing_detail(&self, id: &SpotId) -> Result<SpotDetail, AccessParkError> {
        require_id(id)?;
        let query = Query::select(DETAIL_COLUMNS).eq("id", id);
        let row = self
            .backend
            .select(&self.config.table, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AccessParkError::NotFound {
                what: format!("listing {id}"),
            })?;
        decode(row, "listing detail")
    }

    /// Uploads a photo under a fresh random name and returns its public URL.
    pub async fn upload_photo(&self, photo: PhotoFile) -> Result<String, AccessParkError> {
        let path = photo_path(&self.config.photo_prefix, &photo.name);
        let object = photo.into_object()?;
        let url = self
            .backend
            .upload_object(&self.config.photo_bucket, &path, object)
            .await?;
        debug!(bucket = %self.config.photo_bucket, path = %path, "photo uploaded");
        Ok(url)
    }

    /// Whether the signed-in user is listed as a moderator.
    pub async fn is_moderator(&self) -> Result<bool, AccessParkError> {
        let Some(user) = self.backend.signed_in_user() else {
            return Ok(false);
        };
        let query = Query::select("id").eq("id", &user.id).limit(1);
        let rows = self.backend.select(ADMINS_TABLE, &query).await?;
        Ok(!rows.is_empty())
    }

    async fn cached(
        &self,
        key: CacheKey,
        query: Query,
    ) -> Result<Arc<[ParkingSpot]>, AccessParkError> {
        if let Some(spots) = self.cache.get(key) {
            debug!(cache = %key, "listing cache hit");
            return Ok(spots);
        }
        let generation = self.cache.generation(key);
        let rows = self.backend.select(&self.config.table, &query).await?;
        let spots = rows
            .into_iter()
            .map(|row| decode(row, "listing"))
            .collect::<Result<Vec<ParkingSpot>, _>>()?;
        let spots: Arc<[ParkingSpot]> = Arc::from(spots);
        if !self.cache.store(key, generation, Arc::clone(&spots)) {
            debug!(cache = %key, "listing cache invalidated during fetch, not stored");
        }
        Ok(spots)
    }

    async fn moderate(&self, id: &SpotId, patch: Value) -> Result<ParkingSpot, AccessParkError> {
        let rows = self
            .backend
            .update(&self.config.table, patch, &Query::default().eq("id", id))
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AccessParkError::NotFound {
                what: format!("listing {id}"),
            })?;
        let spot = decode(row, "moderated listing")?;
        self.cache.invalidate_all();
        Ok(spot)
    }

    async fn resolve_city(&self, location: Location) -> String {
        let Some(geocoder) = &self.geocoder else {
            return UNKNOWN_LOCATION.to_string();
        };
        match geocoder
            .locality(location.latitude, location.longitude)
            .await
        {
            Ok(Some(city)) => city,
            Ok(None) => {
                warn!(?location, "no locality found, using fallback city");
                UNKNOWN_LOCATION.to_string()
            }
            Err(e) => {
                warn!(error = %e, ?location, "reverse geocoding failed, using fallback city");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }

    fn require_user(&self) -> Result<User, AccessParkError> {
        self.backend
            .signed_in_user()
            .ok_or(AccessParkError::LoginRequired)
    }
}

fn require_id(id: &SpotId) -> Result<(), AccessParkError> {
    if id.0.trim().is_empty() {
        return Err(AccessParkError::Validation(
            "listing id must not be empty".into(),
        ));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(row: Value, what: &str) -> Result<T, AccessParkError> {
    serde_json::from_value(row).map_err(|e| AccessParkError::decode(what, e))
}

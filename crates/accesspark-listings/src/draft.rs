// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing drafts as filled in by a submitter.

use accesspark_core::{AccessParkError, NewParkingSpot, SurfaceType};
use serde::{Deserialize, Serialize};

/// A point chosen on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate(&self) -> Result<(), AccessParkError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(AccessParkError::Validation(
                "latitude and longitude must be finite".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(AccessParkError::Validation(format!(
                "location ({}, {}) is out of range",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// A listing before submission.
///
/// `location` stays `None` until the submitter picks a point. `city` may be
/// left empty, in which case it is resolved from the location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub location: Option<Location>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub surface_type: SurfaceType,
    pub has_shade: bool,
    pub has_ramp_access: bool,
    pub is_free: bool,
    pub is_van_accessible: bool,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl ListingDraft {
    /// The explicitly entered city, if it is not blank.
    pub fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }

    /// Builds the insertable record once location and city are known.
    pub fn into_new_spot(self, location: Location, city: String) -> NewParkingSpot {
        NewParkingSpot {
            latitude: location.latitude,
            longitude: location.longitude,
            address: non_blank(self.address),
            city,
            surface_type: self.surface_type,
            has_shade: self.has_shade,
            has_ramp_access: self.has_ramp_access,
            is_free: self.is_free,
            is_van_accessible: self.is_van_accessible,
            photo_url: non_blank(self.photo_url),
            notes: non_blank(self.notes),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_range_checks() {
        assert!(Location::new(37.97, 23.72).validate().is_ok());
        assert!(Location::new(91.0, 0.0).validate().is_err());
        assert!(Location::new(0.0, -181.0).validate().is_err());
        assert!(Location::new(f64::INFINITY, 0.0).validate().is_err());
    }

    #[test]
    fn blank_city_counts_as_missing() {
        let mut draft = ListingDraft {
            city: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(draft.city(), None);
        draft.city = Some(" Chania ".into());
        assert_eq!(draft.city(), Some("Chania"));
    }

    #[test]
    fn new_spot_drops_blank_optionals() {
        let draft = ListingDraft {
            notes: Some(String::new()),
            address: Some("Odos Ermou 12".into()),
            has_ramp_access: true,
            surface_type: SurfaceType::Gravel,
            ..Default::default()
        };
        let spot = draft.into_new_spot(Location::new(38.0, 23.7), "Athens".into());
        assert_eq!(spot.notes, None);
        assert_eq!(spot.address.as_deref(), Some("Odos Ermou 12"));
        assert_eq!(spot.surface_type, SurfaceType::Gravel);
        assert!(spot.has_ramp_access);
        assert!(spot.validate().is_ok());
    }
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for parking spot listings, identities, and sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::error::AccessParkError;

/// City recorded when reverse geocoding cannot name a locality.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Opaque identifier of a persisted listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotId(pub String);

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a user in the remote identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by backend health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Which facade variant talks to the remote data service.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendMode {
    /// Calls go straight to the remote data service with the public key.
    #[default]
    Direct,
    /// Calls are forwarded through the same-origin relay.
    Relay,
}

/// Surface of the parking bay.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SurfaceType {
    #[default]
    Asphalt,
    Cobblestone,
    Gravel,
    Dirt,
}

/// Moderation state of a listing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpotStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SpotStatus {
    /// Approved and rejected listings never move again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A persisted parking spot row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: SpotId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "unknown_location", deserialize_with = "city_or_sentinel")]
    pub city: String,
    pub surface_type: SurfaceType,
    pub has_shade: bool,
    pub has_ramp_access: bool,
    pub is_free: bool,
    pub is_van_accessible: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: SpotStatus,
    #[serde(default)]
    pub submitted_by: Option<UserId>,
    #[serde(default)]
    pub approved_by: Option<UserId>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn unknown_location() -> String {
    UNKNOWN_LOCATION.to_string()
}

fn city_or_sentinel<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let city = Option::<String>::deserialize(deserializer)?;
    Ok(city
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(unknown_location))
}

/// Email projection of a joined identity (submitter or approver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEmail {
    #[serde(default)]
    pub email: Option<String>,
}

/// A listing joined with the identities that submitted and approved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotDetail {
    #[serde(flatten)]
    pub spot: ParkingSpot,
    #[serde(default)]
    pub submitter: Option<IdentityEmail>,
    #[serde(default)]
    pub approver: Option<IdentityEmail>,
}

impl SpotDetail {
    /// Display name of the submitter, `Anonymous` when unknown.
    pub fn submitter_email(&self) -> &str {
        self.submitter
            .as_ref()
            .and_then(|s| s.email.as_deref())
            .unwrap_or("Anonymous")
    }
}

/// The client-supplied part of a new listing.
///
/// `status` and `submitted_by` are added at submission time and are not part
/// of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParkingSpot {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub city: String,
    pub surface_type: SurfaceType,
    pub has_shade: bool,
    pub has_ramp_access: bool,
    pub is_free: bool,
    pub is_van_accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewParkingSpot {
    /// Checks the invariants every persisted row must hold.
    pub fn validate(&self) -> Result<(), AccessParkError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(AccessParkError::Validation(
                "latitude and longitude must be finite".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AccessParkError::Validation(format!(
                "latitude {} is out of range",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AccessParkError::Validation(format!(
                "longitude {} is out of range",
                self.longitude
            )));
        }
        if self.city.trim().is_empty() {
            return Err(AccessParkError::Validation("city must not be empty".into()));
        }
        Ok(())
    }
}

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A bearer session issued by sign up or sign in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<User>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

/// Email and password pair used for sign up and sign in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Rejects empty or malformed credentials before they are sent anywhere.
    pub fn validate(&self) -> Result<(), AccessParkError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(AccessParkError::Validation(
                "email and password must not be empty".into(),
            ));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(AccessParkError::Validation(format!(
                "`{email}` is not a valid email address"
            ))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Change notifications published by a facade's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

/// Binary payload destined for object storage.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn row() -> serde_json::Value {
        json!({
            "id": "6f1c",
            "latitude": 37.9715,
            "longitude": 23.7257,
            "address": null,
            "city": "Athens",
            "surface_type": "cobblestone",
            "has_shade": true,
            "has_ramp_access": false,
            "is_free": true,
            "is_van_accessible": false,
            "photo_url": null,
            "notes": "next to the pharmacy",
            "status": "pending",
            "submitted_by": "user-1",
            "approved_by": null,
            "approved_at": null,
            "created_at": "2025-05-02T09:14:00.123456+00:00",
            "updated_at": "2025-05-02T09:14:00.123456+00:00"
        })
    }

    #[test]
    fn parking_spot_deserializes_from_row() {
        let spot: ParkingSpot = serde_json::from_value(row()).unwrap();
        assert_eq!(spot.id, SpotId("6f1c".into()));
        assert_eq!(spot.surface_type, SurfaceType::Cobblestone);
        assert_eq!(spot.status, SpotStatus::Pending);
        assert_eq!(spot.submitted_by, Some(UserId("user-1".into())));
        assert!(spot.approved_at.is_none());
    }

    #[test]
    fn null_city_becomes_sentinel() {
        let mut value = row();
        value["city"] = serde_json::Value::Null;
        let spot: ParkingSpot = serde_json::from_value(value).unwrap();
        assert_eq!(spot.city, UNKNOWN_LOCATION);

        let mut value = row();
        value.as_object_mut().unwrap().remove("city");
        let spot: ParkingSpot = serde_json::from_value(value).unwrap();
        assert_eq!(spot.city, UNKNOWN_LOCATION);
    }

    #[test]
    fn detail_reads_joined_identities() {
        let mut value = row();
        value["submitter"] = json!({"email": "maria@example.gr"});
        value["approver"] = serde_json::Value::Null;
        let detail: SpotDetail = serde_json::from_value(value).unwrap();
        assert_eq!(detail.submitter_email(), "maria@example.gr");
        assert!(detail.approver.is_none());
        assert_eq!(detail.spot.city, "Athens");
    }

    #[test]
    fn enums_use_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&SpotStatus::Approved).unwrap(), "\"approved\"");
        assert_eq!(SurfaceType::from_str("gravel").unwrap(), SurfaceType::Gravel);
        assert_eq!(BackendMode::from_str("relay").unwrap(), BackendMode::Relay);
        assert_eq!(BackendMode::default(), BackendMode::Direct);
        assert!(SurfaceType::from_str("marble").is_err());
    }

    #[test]
    fn new_spot_validation_rejects_bad_coordinates() {
        let mut spot = NewParkingSpot {
            latitude: 40.6401,
            longitude: 22.9444,
            address: None,
            city: "Thessaloniki".into(),
            surface_type: SurfaceType::Asphalt,
            has_shade: false,
            has_ramp_access: true,
            is_free: true,
            is_van_accessible: false,
            photo_url: None,
            notes: None,
        };
        assert!(spot.validate().is_ok());

        spot.latitude = f64::NAN;
        assert!(matches!(spot.validate(), Err(AccessParkError::Validation(_))));

        spot.latitude = 95.0;
        assert!(spot.validate().is_err());
    }

    #[test]
    fn new_spot_omits_absent_optionals() {
        let spot = NewParkingSpot {
            latitude: 1.0,
            longitude: 2.0,
            address: None,
            city: "Patra".into(),
            surface_type: SurfaceType::Dirt,
            has_shade: false,
            has_ramp_access: false,
            is_free: false,
            is_van_accessible: true,
            photo_url: None,
            notes: None,
        };
        let value = serde_json::to_value(&spot).unwrap();
        assert!(value.get("photo_url").is_none());
        assert!(value.get("status").is_none());
        assert_eq!(value["surface_type"], "dirt");
    }

    #[test]
    fn credentials_validation() {
        assert!(Credentials::new("a@b.gr", "secret").validate().is_ok());
        assert!(Credentials::new("", "secret").validate().is_err());
        assert!(Credentials::new("a@b.gr", "").validate().is_err());
        assert!(Credentials::new("not-an-email", "secret").validate().is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let creds = Credentials::new("a@b.gr", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));

        let session = AuthSession {
            access_token: "eyJhbGciOi.secret".into(),
            refresh_token: Some("refresh-secret".into()),
            token_type: Some("bearer".into()),
            expires_in: Some(3600),
            user: None,
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[redacted]"));
    }
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `accesspark spots` and `accesspark signup` command implementations.
//!
//! Each invocation builds the configured facade variant, signs in when
//! credentials were given, and runs one listing lifecycle operation.
//! Moderation commands print a "no permission" notice for callers that are
//! not moderators instead of failing.

use std::path::{Path, PathBuf};

use accesspark_config::AccessParkConfig;
use accesspark_core::{
    AccessParkError, Credentials, IdentityBackend, ParkingSpot, SpotDetail, SpotId, SurfaceType,
};
use accesspark_listings::{ListingDraft, ListingService, Location, PhotoFile};
use clap::{Args, Subcommand};
use tracing::{debug, info};

/// Account credentials, read from flags or the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct Login {
    #[arg(long, env = "ACCESSPARK_EMAIL")]
    pub email: Option<String>,
    #[arg(long, env = "ACCESSPARK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Login {
    fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials::new(email, password)),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SpotsCommand {
    /// List approved spots.
    Public,
    /// List spots waiting for moderation, newest first.
    Pending,
    /// Show one spot with its submitter and approver.
    Show { id: String },
    /// Submit a new spot for moderation.
    Submit(SubmitArgs),
    /// Approve a pending spot.
    Approve { id: String },
    /// Reject a pending spot.
    Reject { id: String },
    /// Delete a spot.
    Delete { id: String },
    /// Upload a photo and print its public URL.
    Upload { file: PathBuf },
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    /// Looked up from the coordinates when omitted.
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long, default_value_t = SurfaceType::Asphalt)]
    pub surface: SurfaceType,
    #[arg(long)]
    pub shade: bool,
    #[arg(long)]
    pub ramp: bool,
    #[arg(long)]
    pub free: bool,
    #[arg(long)]
    pub van: bool,
    #[arg(long)]
    pub notes: Option<String>,
    /// Photo to upload and attach.
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

impl SubmitArgs {
    fn into_draft(self, photo_url: Option<String>) -> ListingDraft {
        ListingDraft {
            location: Some(Location::new(self.lat, self.lon)),
            address: self.address,
            city: self.city,
            surface_type: self.surface,
            has_shade: self.shade,
            has_ramp_access: self.ramp,
            is_free: self.free,
            is_van_accessible: self.van,
            photo_url,
            notes: self.notes,
        }
    }
}

/// Runs `accesspark signup`.
pub async fn run_signup(config: &AccessParkConfig, login: Login) -> Result<(), AccessParkError> {
    let credentials = login
        .credentials()
        .ok_or_else(|| AccessParkError::Validation("--email and --password are required".into()))?;
    let backend = accesspark_client::connect(config)?;
    match backend.sign_up(&credentials).await? {
        Some(_) => println!("account created and signed in as {}", credentials.email),
        None => println!(
            "account created for {}; confirm the email address before signing in",
            credentials.email
        ),
    }
    Ok(())
}

/// Runs one `accesspark spots` subcommand.
pub async fn run_spots(
    config: &AccessParkConfig,
    login: Login,
    json: bool,
    command: SpotsCommand,
) -> Result<(), AccessParkError> {
    let listings = ListingService::from_config(config)?;
    if let Some(credentials) = login.credentials() {
        listings.backend().sign_in(&credentials).await?;
        debug!(email = %credentials.email, "signed in");
    }

    match command {
        SpotsCommand::Public => {
            let spots = listings.fetch_public_listings().await?;
            print_spots(&spots, json)
        }
        SpotsCommand::Pending => {
            if !moderator(&listings).await? {
                return Ok(());
            }
            let spots = listings.fetch_pending_listings().await?;
            print_spots(&spots, json)
        }
        SpotsCommand::Show { id } => {
            let detail = listings.fetch_listing_detail(&SpotId(id)).await?;
            print_detail(&detail, json)
        }
        SpotsCommand::Submit(args) => {
            let photo_url = match &args.photo {
                Some(path) => Some(listings.upload_photo(read_photo(path).await?).await?),
                None => None,
            };
            let spot = listings.submit_listing(args.into_draft(photo_url)).await?;
            info!(id = %spot.id, "spot submitted for moderation");
            print_spot(&spot, json)
        }
        SpotsCommand::Approve { id } => {
            if !moderator(&listings).await? {
                return Ok(());
            }
            let spot = listings.approve_listing(&SpotId(id)).await?;
            print_spot(&spot, json)
        }
        SpotsCommand::Reject { id } => {
            if !moderator(&listings).await? {
                return Ok(());
            }
            let spot = listings.reject_listing(&SpotId(id)).await?;
            print_spot(&spot, json)
        }
        SpotsCommand::Delete { id } => {
            if !moderator(&listings).await? {
                return Ok(());
            }
            listings.delete_listing(&SpotId(id.clone())).await?;
            println!("deleted {id}");
            Ok(())
        }
        SpotsCommand::Upload { file } => {
            let url = listings.upload_photo(read_photo(&file).await?).await?;
            println!("{url}");
            Ok(())
        }
    }
}

async fn moderator(listings: &ListingService) -> Result<bool, AccessParkError> {
    let allowed = listings.is_moderator().await?;
    if !allowed {
        println!("You don't have permission to moderate spots.");
    }
    Ok(allowed)
}

async fn read_photo(path: &Path) -> Result<PhotoFile, AccessParkError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AccessParkError::Validation(format!("cannot read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(PhotoFile::new(name, bytes))
}

fn spot_line(spot: &ParkingSpot) -> String {
    let mut features = Vec::new();
    for (flag, label) in [
        (spot.has_ramp_access, "ramp"),
        (spot.is_van_accessible, "van"),
        (spot.has_shade, "shade"),
        (spot.is_free, "free"),
    ] {
        if flag {
            features.push(label);
        }
    }
    format!(
        "{}  {:<8}  {:<20}  ({:.5}, {:.5})  {}  {}",
        spot.id,
        spot.status,
        spot.city,
        spot.latitude,
        spot.longitude,
        spot.surface_type,
        features.join(",")
    )
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AccessParkError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AccessParkError::Internal(format!("render json: {e}")))
}

fn print_spots(spots: &[ParkingSpot], json: bool) -> Result<(), AccessParkError> {
    if json {
        println!("{}", to_json(spots)?);
    } else if spots.is_empty() {
        println!("no spots");
    } else {
        for spot in spots {
            println!("{}", spot_line(spot));
        }
    }
    Ok(())
}

fn print_spot(spot: &ParkingSpot, json: bool) -> Result<(), AccessParkError> {
    if json {
        println!("{}", to_json(spot)?);
    } else {
        println!("{}", spot_line(spot));
    }
    Ok(())
}

fn print_detail(detail: &SpotDetail, json: bool) -> Result<(), AccessParkError> {
    if json {
        println!("{}", to_json(detail)?);
        return Ok(());
    }
    println!("{}", spot_line(&detail.spot));
    println!("submitted by: {}", detail.submitter_email());
    if let Some(email) = detail.approver.as_ref().and_then(|a| a.email.as_deref()) {
        println!("approved by:  {email}");
    }
    if let Some(notes) = &detail.spot.notes {
        println!("notes:        {notes}");
    }
    if let Some(url) = &detail.spot.photo_url {
        println!("photo:        {url}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use accesspark_core::{SpotStatus, UserId};
    use chrono::Utc;

    #[test]
    fn credentials_need_both_fields() {
        let login = Login {
            email: Some("a@b.gr".into()),
            password: None,
        };
        assert!(login.credentials().is_none());
        let login = Login {
            password: Some("pw".into()),
            ..login
        };
        assert!(login.credentials().is_some());
    }

    #[test]
    fn spot_line_lists_features() {
        let spot = ParkingSpot {
            id: SpotId("s1".into()),
            latitude: 35.3387,
            longitude: 25.1442,
            address: None,
            city: "Heraklion".into(),
            surface_type: SurfaceType::Asphalt,
            has_shade: false,
            has_ramp_access: true,
            is_free: true,
            is_van_accessible: false,
            photo_url: None,
            notes: None,
            status: SpotStatus::Approved,
            submitted_by: Some(UserId("u1".into())),
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let line = spot_line(&spot);
        assert!(line.starts_with("s1  approved"));
        assert!(line.contains("Heraklion"));
        assert!(line.ends_with("ramp,free"));
    }

    #[tokio::test]
    async fn photo_is_read_with_its_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.webp");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let photo = read_photo(&path).await.unwrap();
        assert_eq!(photo.name, "ramp.webp");
        assert_eq!(photo.content_type, "image/webp");
        assert_eq!(photo.bytes, vec![1, 2, 3]);

        let err = read_photo(&dir.path().join("missing.png")).await.unwrap_err();
        assert!(matches!(err, AccessParkError::Validation(_)));
    }
}

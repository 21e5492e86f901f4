// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::fmt;

use accesspark_core::BackendMode;
use serde::{Deserialize, Serialize};

const REDACTED: &str = "[redacted]";

/// Top-level accesspark configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccessParkConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Facade variant selection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Remote data service used in direct mode.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Relay endpoint used in relay mode.
    #[serde(default)]
    pub relay: RelayClientConfig,

    /// Settings for serving the relay itself.
    #[serde(default)]
    pub relay_server: RelayServerConfig,

    /// Map provider settings, passed through to front ends.
    #[serde(default)]
    pub map: MapConfig,

    /// Reverse geocoding used to name the city of a new listing.
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Table and bucket names for listings.
    #[serde(default)]
    pub listings: ListingsConfig,
}

impl AccessParkConfig {
    /// A copy with every secret replaced, safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.remote.api_key.is_some() {
            copy.remote.api_key = Some(REDACTED.to_string());
        }
        if copy.relay_server.service_key.is_some() {
            copy.relay_server.service_key = Some(REDACTED.to_string());
        }
        if copy.map.provider_key.is_some() {
            copy.map.provider_key = Some(REDACTED.to_string());
        }
        copy
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// `direct` or `relay`. Chosen once at startup.
    #[serde(default)]
    pub mode: BackendMode,
}

/// Remote data service settings for direct mode.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the remote data service.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public API key. Row-level authorization is enforced server-side.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayClientConfig {
    /// Full URL of the relay endpoint, e.g. `https://example.gr/api/relay`.
    #[serde(default)]
    pub url: Option<String>,
}

/// Settings for `accesspark relay`.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayServerConfig {
    /// Host address to bind.
    #[serde(default = "default_relay_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// Route the relay endpoint is mounted on.
    #[serde(default = "default_relay_path")]
    pub path: String,

    /// Base URL of the remote data service the relay forwards to.
    #[serde(default)]
    pub upstream_url: Option<String>,

    /// Long-lived service key. Only the relay ever holds it.
    #[serde(default)]
    pub service_key: Option<String>,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_relay_port(),
            path: default_relay_path(),
            upstream_url: None,
            service_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for RelayServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("upstream_url", &self.upstream_url)
            .field("service_key", &self.service_key.as_ref().map(|_| REDACTED))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_relay_host() -> String {
    "127.0.0.1".to_string()
}

fn default_relay_port() -> u16 {
    8788
}

fn default_relay_path() -> String {
    "/api/relay".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Client-side map provider key.
    #[serde(default)]
    pub provider_key: Option<String>,

    /// Map style identifier.
    #[serde(default)]
    pub style_id: Option<String>,
}

impl fmt::Debug for MapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConfig")
            .field("provider_key", &self.provider_key.as_ref().map(|_| REDACTED))
            .field("style_id", &self.style_id)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeocodingConfig {
    /// Resolve the city of new listings from their coordinates.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the reverse geocoding service.
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,

    /// User-Agent sent with lookups, as the public service requires one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geocoding_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("accesspark/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListingsConfig {
    /// Table holding the listings.
    #[serde(default = "default_table")]
    pub table: String,

    /// Bucket photos are uploaded to.
    #[serde(default = "default_photo_bucket")]
    pub photo_bucket: String,

    /// Path prefix inside the bucket.
    #[serde(default = "default_photo_prefix")]
    pub photo_prefix: String,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            photo_bucket: default_photo_bucket(),
            photo_prefix: default_photo_prefix(),
        }
    }
}

fn default_table() -> String {
    "parking_spots".to_string()
}

fn default_photo_bucket() -> String {
    "spot-images".to_string()
}

fn default_photo_prefix() -> String {
    "spots".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AccessParkConfig::default();
        assert_eq!(config.app.log_level, "info");
        assert_eq!(config.backend.mode, BackendMode::Direct);
        assert_eq!(config.relay_server.port, 8788);
        assert_eq!(config.relay_server.path, "/api/relay");
        assert_eq!(config.listings.table, "parking_spots");
        assert_eq!(config.listings.photo_bucket, "spot-images");
        assert!(config.geocoding.enabled);
    }

    #[test]
    fn debug_output_hides_keys() {
        let mut config = AccessParkConfig::default();
        config.remote.api_key = Some("anon-key-123".into());
        config.relay_server.service_key = Some("service-key-456".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("anon-key-123"));
        assert!(!debug.contains("service-key-456"));
    }

    #[test]
    fn redacted_copy_hides_keys_but_keeps_urls() {
        let mut config = AccessParkConfig::default();
        config.remote.base_url = Some("https://db.example.gr".into());
        config.remote.api_key = Some("anon-key-123".into());
        let redacted = config.redacted();
        assert_eq!(redacted.remote.api_key.as_deref(), Some(REDACTED));
        assert_eq!(redacted.remote.base_url.as_deref(), Some("https://db.example.gr"));
        assert!(redacted.relay_server.service_key.is_none());
    }

    #[test]
    fn deny_unknown_fields_in_sections() {
        let result = toml::from_str::<AccessParkConfig>("[relay_server]\nprot = 80\n");
        assert!(result.is_err());
    }
}

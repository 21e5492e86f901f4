// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reverse geocoding against a Nominatim-compatible service.

use accesspark_config::model::GeocodingConfig;
use accesspark_core::{AccessParkError, ReverseGeocoder};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::http;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
}

impl Address {
    fn locality(self) -> Option<String> {
        [self.city, self.town, self.village, self.suburb]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
    }
}

/// Looks up the locality at a coordinate.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, AccessParkError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, http::header_value("user-agent", user_agent)?);
        Ok(Self {
            client: http::build_client(headers)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &GeocodingConfig) -> Result<Self, AccessParkError> {
        Self::new(&config.base_url, &config.user_agent)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn locality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, AccessParkError> {
        let url = format!(
            "{}/reverse?format=json&lat={latitude}&lon={longitude}",
            self.base_url
        );
        let response = self.client.get(url).send().await.map_err(http::transport)?;
        let (status, body) = http::read_response(response).await?;
        if status >= 400 {
            return Err(http::remote_error(status, &body));
        }
        let parsed: ReverseResponse = serde_json::from_value(body)
            .map_err(|e| AccessParkError::decode("reverse geocode", e))?;
        let locality = parsed.address.and_then(Address::locality);
        debug!(latitude, longitude, locality = ?locality, "reverse geocoded");
        Ok(locality)
    }
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: keys required by the
//! selected backend mode, parsable URLs, and relay route shape. All failures
//! are collected rather than returning on the first one.

use accesspark_core::BackendMode;
use url::Url;

use crate::diagnostic::ConfigError;
use crate::model::AccessParkConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Checks the shared sections plus the settings the selected facade variant
/// needs to connect.
pub fn validate_config(config: &AccessParkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    check_common(config, &mut errors);

    match config.backend.mode {
        BackendMode::Direct => {
            require_url(&mut errors, "remote.base_url", config.remote.base_url.as_deref());
            require_present(&mut errors, "remote.api_key", config.remote.api_key.as_deref());
        }
        BackendMode::Relay => {
            require_url(&mut errors, "relay.url", config.relay.url.as_deref());
        }
    }

    finish(errors)
}

/// Checks for serving the relay, which needs the upstream and its key but
/// no client-side backend settings.
pub fn validate_relay_server(config: &AccessParkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    check_common(config, &mut errors);
    require_url(
        &mut errors,
        "relay_server.upstream_url",
        config.relay_server.upstream_url.as_deref(),
    );
    require_present(
        &mut errors,
        "relay_server.service_key",
        config.relay_server.service_key.as_deref(),
    );
    if config.relay_server.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "relay_server.request_timeout_secs must be non-zero".to_string(),
        });
    }
    finish(errors)
}

fn finish(errors: Vec<ConfigError>) -> Result<(), Vec<ConfigError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_common(config: &AccessParkConfig, errors: &mut Vec<ConfigError>) {
    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` must be one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !config.relay_server.path.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "relay_server.path `{}` must start with `/`",
                config.relay_server.path
            ),
        });
    }

    if config.relay_server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "relay_server.port must be non-zero".to_string(),
        });
    }

    if let Some(upstream) = config.relay_server.upstream_url.as_deref() {
        check_url(errors, "relay_server.upstream_url", upstream);
    }

    if config.geocoding.enabled {
        check_url(errors, "geocoding.base_url", &config.geocoding.base_url);
    }

    for (key, value) in [
        ("listings.table", &config.listings.table),
        ("listings.photo_bucket", &config.listings.photo_bucket),
        ("listings.photo_prefix", &config.listings.photo_prefix),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }
}

fn require_present(errors: &mut Vec<ConfigError>, key: &str, value: Option<&str>) {
    if value.is_none_or(|v| v.trim().is_empty()) {
        errors.push(ConfigError::MissingKey {
            key: key.to_string(),
        });
    }
}

fn require_url(errors: &mut Vec<ConfigError>, key: &str, value: Option<&str>) {
    match value {
        Some(v) if !v.trim().is_empty() => check_url(errors, key, v),
        _ => errors.push(ConfigError::MissingKey {
            key: key.to_string(),
        }),
    }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigError::Validation {
            message: format!("{key} must use http or https, got `{}`", url.scheme()),
        }),
        Err(e) => errors.push(ConfigError::Validation {
            message: format!("{key} `{value}` is not a valid URL: {e}"),
        }),
    }
}

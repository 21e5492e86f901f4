// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./accesspark.toml` > `~/.config/accesspark/accesspark.toml`
//! > `/etc/accesspark/accesspark.toml` with environment variable overrides via
//! the `ACCESSPARK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AccessParkConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/accesspark/accesspark.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "accesspark.toml";

/// Section prefixes recognized in environment variable names.
///
/// `relay_server_` must be tried before `relay_` so that
/// `ACCESSPARK_RELAY_SERVER_PORT` lands in `relay_server.port`.
const ENV_SECTIONS: &[&str] = &[
    "app",
    "backend",
    "remote",
    "relay_server",
    "relay",
    "map",
    "geocoding",
    "listings",
];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("accesspark/accesspark.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/accesspark/accesspark.toml` (system-wide)
/// 3. `~/.config/accesspark/accesspark.toml` (user XDG config)
/// 4. `./accesspark.toml` (local directory)
/// 5. `ACCESSPARK_*` environment variables
pub fn load_config() -> Result<AccessParkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AccessParkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AccessParkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AccessParkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AccessParkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AccessParkConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Maps a lowercased, prefix-stripped env var name to its dotted config key.
///
/// Returns `None` for variables that do not belong to a config section, such as
/// `ACCESSPARK_EMAIL`, which the CLI reads on its own.
pub fn env_key_to_path(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|field| !field.is_empty())
            .map(|field| format!("{section}.{field}"))
    })
}

/// Environment provider using explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because field names contain
/// underscores: `ACCESSPARK_REMOTE_API_KEY` must map to `remote.api_key`.
fn env_provider() -> Env {
    Env::prefixed("ACCESSPARK_")
        .filter(|key| env_key_to_path(key.as_str()).is_some())
        .map(|key| {
            env_key_to_path(key.as_str())
                .unwrap_or_else(|| key.as_str().to_string())
                .into()
        })
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by the backend facade, the relay, and listing operations.

use thiserror::Error;

/// The primary error type used across all accesspark traits and operations.
#[derive(Debug, Error)]
pub enum AccessParkError {
    /// Configuration errors (missing URLs, keys, unparsable values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected before any network call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation needs an authenticated caller and none is signed in.
    #[error("login required")]
    LoginRequired,

    /// An update or delete was issued without a filter.
    #[error("refusing to {operation} without a filter")]
    MissingFilter { operation: &'static str },

    /// The remote data service answered with a status >= 400.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The relay itself failed (malformed request, unrecognized action, internal error).
    #[error("relay error ({status}): {message}")]
    Relay { status: u16, message: String },

    /// Connection, IO or HTTP client failures.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A response body did not have the expected shape.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single-row lookup matched nothing.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// An object already exists where an upload was attempted.
    #[error("already exists: {what}")]
    Conflict { what: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccessParkError {
    /// Wraps a serde error raised while decoding a response body.
    pub fn decode(context: &str, err: serde_json::Error) -> Self {
        Self::Decode {
            message: format!("{context}: {err}"),
            source: Some(Box::new(err)),
        }
    }

    /// Returns the upstream status for remote and relay failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } | Self::Relay { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for errors raised locally, before a request could leave the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::LoginRequired | Self::MissingFilter { .. } | Self::Config(_)
        )
    }
}

/// Extracts the most descriptive message from an upstream error body.
///
/// The remote service is not consistent about where it puts the message, so the
/// usual fields are tried in order before falling back to a generic text.
pub fn upstream_message(body: &serde_json::Value) -> String {
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| "Request failed".to_string())
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay-level failures and their HTTP rendering.

use accesspark_core::RelayFailure;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A failure of the relay itself, as opposed to an upstream error status.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The action is missing or not one the relay knows.
    #[error("Invalid action")]
    InvalidAction,

    /// Malformed input, or the upstream call could not be built or executed.
    #[error("{0}")]
    Failed(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidAction => StatusCode::BAD_REQUEST,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(RelayFailure {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

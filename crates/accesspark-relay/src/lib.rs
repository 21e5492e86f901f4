// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Same-origin relay for accesspark.
//!
//! The relay is the only component holding the service key. It accepts one
//! structured action per request, performs exactly one upstream call, and
//! reports the upstream outcome inside a `200 {status, data}` envelope.
//! `400` means the action was not recognized; `500` means the relay itself
//! failed.

pub mod error;
pub mod handlers;
pub mod server;
pub mod upstream;

pub use error::RelayError;
pub use server::{RelayState, ServerConfig, router, serve, start_server};
pub use upstream::{Upstream, UpstreamCall, plan};

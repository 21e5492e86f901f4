// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity operations: sign up, sign in, sign out, current user and session.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::AccessParkError;
use crate::traits::adapter::BackendAdapter;
use crate::types::{AuthEvent, AuthSession, Credentials, User};

/// Email/password identity operations backed by the remote identity provider.
///
/// The session obtained by `sign_up`/`sign_in` is owned by the implementing
/// instance and attached to every later call it makes.
#[async_trait]
pub trait IdentityBackend: BackendAdapter {
    /// Registers a new account. Credentials are validated before any request.
    ///
    /// Returns `None` when the provider created the account but issued no
    /// session yet, e.g. while email confirmation is pending.
    async fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthSession>, AccessParkError>;

    /// Exchanges credentials for a bearer session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AccessParkError>;

    /// Drops the held session. Always succeeds locally; the remote logout is
    /// best effort.
    async fn sign_out(&self) -> Result<(), AccessParkError>;

    /// Asks the identity provider who the held token belongs to.
    async fn current_user(&self) -> Result<Option<User>, AccessParkError>;

    /// Returns the held session, refreshed with the provider's view of the user.
    async fn session(&self) -> Result<Option<AuthSession>, AccessParkError>;

    /// The signed-in user as last seen locally. Never touches the network.
    fn signed_in_user(&self) -> Option<User>;

    /// Subscribes to sign-in and sign-out notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

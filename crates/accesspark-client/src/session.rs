// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-facade session state: the held bearer session and its change feed.

use std::sync::{PoisonError, RwLock};

use accesspark_core::{AuthEvent, AuthSession, User};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 16;

/// The bearer session held by one facade instance.
///
/// Nothing is persisted; a new process starts signed out.
#[derive(Debug)]
pub struct Session {
    current: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            current: RwLock::new(None),
            events,
        }
    }

    /// Bearer token to attach to calls, if signed in.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.read().as_ref().and_then(|s| s.user.clone())
    }

    pub fn snapshot(&self) -> Option<AuthSession> {
        self.read().clone()
    }

    /// Stores a freshly issued session and announces the sign-in.
    pub fn establish(&self, session: AuthSession) {
        let user = session.user.clone();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        if let Some(user) = user {
            debug!(user_id = %user.id, "session established");
            // No receivers is fine.
            let _ = self.events.send(AuthEvent::SignedIn(user));
        }
    }

    /// Replaces the user attached to the held session, if any.
    pub fn refresh_user(&self, user: User) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = guard.as_mut() {
            session.user = Some(user);
        }
    }

    /// Drops the held session. Announces the sign-out only if one was held.
    pub fn clear(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("session cleared");
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<AuthSession>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}

// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reverse geocoder returning a preset answer.

use std::sync::atomic::{AtomicUsize, Ordering};

use accesspark_core::{AccessParkError, ReverseGeocoder};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Locality(Option<String>),
    Failure(String),
}

/// A geocoder that always gives the same answer and counts lookups.
#[derive(Debug)]
pub struct MockGeocoder {
    answer: Answer,
    lookups: AtomicUsize,
}

impl MockGeocoder {
    /// Always resolves to `locality`.
    pub fn returning(locality: &str) -> Self {
        Self::with(Answer::Locality(Some(locality.to_string())))
    }

    /// Never finds a locality.
    pub fn nothing() -> Self {
        Self::with(Answer::Locality(None))
    }

    /// Always fails with a transport error.
    pub fn failing(message: &str) -> Self {
        Self::with(Answer::Failure(message.to_string()))
    }

    fn with(answer: Answer) -> Self {
        Self {
            answer,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    async fn locality(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<String>, AccessParkError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Answer::Locality(locality) => Ok(locality.clone()),
            Answer::Failure(message) => Err(AccessParkError::Transport {
                message: message.clone(),
                source: None,
            }),
        }
    }
}

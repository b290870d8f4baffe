//! External collaborators of a game session.
//!
//! The session controller never reaches for a global client: the roster
//! store, score store and auth service are handed to it as values
//! implementing these traits. `memory` backs tests and headless runs,
//! `firestore` talks to the hosted document store over `fetch`.
//!
//! Futures returned here are not `Send`; everything runs on the browser's
//! single event loop.
#![allow(async_fn_in_trait)]

pub mod firestore;
pub mod memory;

use crate::character::{Character, ScoreRecord};
use crate::error::GameError;

/// Read access to the hidden-character roster.
pub trait RosterStore {
    /// Every character record, in no particular order.
    async fn fetch_all(&self) -> Result<Vec<Character>, GameError>;
    /// The canonical record for `name`, `Ok(None)` if there is none.
    async fn fetch_one(&self, name: &str) -> Result<Option<Character>, GameError>;
}

/// Per-player final scores. Records are created once and never updated.
pub trait ScoreStore {
    async fn find_score(&self, name: &str) -> Result<Option<ScoreRecord>, GameError>;
    /// Create `record`; fails with [`GameError::AlreadyExists`] if a record
    /// with the same name is present.
    async fn create_score(&self, record: &ScoreRecord) -> Result<(), GameError>;
    /// Up to `limit` records, fastest first.
    async fn leaders(&self, limit: usize) -> Result<Vec<ScoreRecord>, GameError>;
}

/// Opaque identity handed out by the auth service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
}

pub trait AuthService {
    /// Resolves once the service has confirmed an anonymous identity.
    async fn sign_in_anonymously(&self) -> Result<Identity, GameError>;
}

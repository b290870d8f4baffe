//! In-memory backend with call counters and failure switches.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use tracing::debug;

use super::{AuthService, Identity, RosterStore, ScoreStore};
use crate::character::{Character, ScoreRecord, rank_scores};
use crate::error::GameError;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    characters: RefCell<Vec<Character>>,
    scores: RefCell<BTreeMap<String, ScoreRecord>>,
    // --- Failure switches ---
    pub fail_roster: Cell<bool>,
    pub fail_lookup: Cell<bool>,
    pub fail_auth: Cell<bool>,
    pub fail_scores: Cell<bool>,
    // --- Counters ---
    roster_fetches: Cell<u32>,
    lookups: Cell<u32>,
    sign_ins: Cell<u32>,
    score_writes: Cell<u32>,
}

impl MemoryBackend {
    pub fn new(characters: Vec<Character>) -> Self {
        Self { characters: RefCell::new(characters), ..Self::default() }
    }

    /// Seed an existing score record, bypassing the write counter.
    pub fn insert_score(&self, record: ScoreRecord) {
        self.scores.borrow_mut().insert(record.name.clone(), record);
    }

    pub fn score(&self, name: &str) -> Option<ScoreRecord> {
        self.scores.borrow().get(name).cloned()
    }

    pub fn score_count(&self) -> usize { self.scores.borrow().len() }
    pub fn roster_fetches(&self) -> u32 { self.roster_fetches.get() }
    pub fn lookups(&self) -> u32 { self.lookups.get() }
    pub fn sign_ins(&self) -> u32 { self.sign_ins.get() }
    pub fn score_writes(&self) -> u32 { self.score_writes.get() }
}

fn bump(counter: &Cell<u32>) {
    counter.set(counter.get() + 1);
}

impl RosterStore for MemoryBackend {
    async fn fetch_all(&self) -> Result<Vec<Character>, GameError> {
        bump(&self.roster_fetches);
        if self.fail_roster.get() {
            return Err(GameError::Network("roster unavailable".into()));
        }
        Ok(self.characters.borrow().clone())
    }

    async fn fetch_one(&self, name: &str) -> Result<Option<Character>, GameError> {
        bump(&self.lookups);
        if self.fail_lookup.get() {
            return Err(GameError::Network("lookup unavailable".into()));
        }
        Ok(self.characters.borrow().iter().find(|c| c.name == name).cloned())
    }
}

impl ScoreStore for MemoryBackend {
    async fn find_score(&self, name: &str) -> Result<Option<ScoreRecord>, GameError> {
        if self.fail_scores.get() {
            return Err(GameError::Network("scores unavailable".into()));
        }
        Ok(self.score(name))
    }

    async fn create_score(&self, record: &ScoreRecord) -> Result<(), GameError> {
        if self.fail_scores.get() {
            return Err(GameError::Network("scores unavailable".into()));
        }
        let mut scores = self.scores.borrow_mut();
        if scores.contains_key(&record.name) {
            return Err(GameError::AlreadyExists(record.name.clone()));
        }
        bump(&self.score_writes);
        debug!(name = %record.name, score = record.score, "memory: score created");
        scores.insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn leaders(&self, limit: usize) -> Result<Vec<ScoreRecord>, GameError> {
        if self.fail_scores.get() {
            return Err(GameError::Network("scores unavailable".into()));
        }
        let mut all: Vec<ScoreRecord> = self.scores.borrow().values().cloned().collect();
        rank_scores(&mut all);
        all.truncate(limit);
        Ok(all)
    }
}

impl AuthService for MemoryBackend {
    async fn sign_in_anonymously(&self) -> Result<Identity, GameError> {
        bump(&self.sign_ins);
        if self.fail_auth.get() {
            return Err(GameError::Auth("anonymous sign-in disabled".into()));
        }
        Ok(Identity { uid: format!("anon-{}", self.sign_ins.get()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_refuses_existing_names() {
        let store = MemoryBackend::default();
        store.insert_score(ScoreRecord::new("alice", 40));
        let err = pollster::block_on(store.create_score(&ScoreRecord::new("alice", 12)));
        assert_eq!(err, Err(GameError::AlreadyExists("alice".into())));
        assert_eq!(store.score("alice"), Some(ScoreRecord::new("alice", 40)));
        assert_eq!(store.score_writes(), 0);
    }

    #[test]
    fn leaders_are_ranked_and_limited() {
        let store = MemoryBackend::default();
        for (name, score) in [("c", 90), ("a", 20), ("b", 55)] {
            store.insert_score(ScoreRecord::new(name, score));
        }
        let top = pollster::block_on(store.leaders(2)).unwrap();
        assert_eq!(top, vec![ScoreRecord::new("a", 20), ScoreRecord::new("b", 55)]);
    }

    #[test]
    fn fetch_one_misses_unknown_names() {
        let store = MemoryBackend::new(vec![Character::new("Rex", 50, 50)]);
        assert_eq!(pollster::block_on(store.fetch_one("Tri")), Ok(None));
        assert_eq!(store.lookups(), 1);
    }
}

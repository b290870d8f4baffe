//! Async orchestration of a game session.
//!
//! The controller owns the [`Session`] behind a `RefCell` and never holds a
//! borrow across an `.await`: every flow snapshots what it needs, awaits
//! the external call, then re-borrows to apply the result. Stores, auth and
//! the stopwatch are injected, so tests drive it with in-memory fakes.

use std::cell::{Cell, Ref, RefCell};

use tracing::{debug, info, warn};

use super::{
    AUTH_FAILED_MESSAGE, DUPLICATE_PLAYER_MESSAGE, Leaders, MenuTarget, Notice, Progress,
    SCORE_SAVE_FAILED_MESSAGE, Session, Verdict,
};
use crate::character::ScoreRecord;
use crate::clock::Stopwatch;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::geometry::{PagePoint, SceneClick};
use crate::store::{AuthService, RosterStore, ScoreStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Not a guess: background click, no open menu, or nothing to guess.
    Ignored,
    Wrong,
    Correct,
    /// Correct, and it was the last one needed.
    Completed,
    LookupFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Dialog not accepting input (not over yet, or a submission in flight).
    Ignored,
    EmptyName,
    AuthFailed,
    Duplicate,
    StoreFailed,
    Saved(ScoreRecord),
}

pub struct Controller<B, W> {
    backend: B,
    stopwatch: W,
    session: RefCell<Session>,
    live: Cell<bool>,
}

impl<B, W: Stopwatch> Controller<B, W> {
    pub fn new(config: GameConfig, backend: B, stopwatch: W) -> Self {
        Self {
            backend,
            stopwatch,
            session: RefCell::new(Session::new(config)),
            live: Cell::new(true),
        }
    }

    pub fn session(&self) -> Ref<'_, Session> { self.session.borrow() }
    pub fn backend(&self) -> &B { &self.backend }
    pub fn stopwatch(&self) -> &W { &self.stopwatch }

    /// Detach from the page. Results of calls still in flight are dropped.
    pub fn teardown(&self) {
        debug!("session torn down");
        self.live.set(false);
    }

    pub fn is_live(&self) -> bool { self.live.get() }

    pub fn click_scene(&self, click: &SceneClick) {
        self.session.borrow_mut().click_scene(click);
    }

    fn apply_progress(&self, progress: Progress) {
        if progress == Progress::Completed {
            self.stopwatch.stop();
            info!(elapsed = self.stopwatch.elapsed_secs(), "stopwatch stopped");
        }
    }
}

impl<B: RosterStore, W: Stopwatch> Controller<B, W> {
    /// Fetch the roster once. On failure the session shows a retryable
    /// error; calling this again retries. Calls while a fetch is in flight
    /// or after the roster arrived return the current count untouched.
    pub async fn load_roster(&self) -> Result<usize, GameError> {
        let claimed = self.session.borrow_mut().begin_loading();
        if !claimed {
            return Ok(self.session.borrow().characters().len());
        }
        let fetched = self.backend.fetch_all().await;
        if !self.is_live() {
            debug!("roster arrived after teardown, discarded");
            return Ok(0);
        }
        match fetched {
            Ok(characters) => {
                let progress = self.session.borrow_mut().add_characters(characters);
                self.apply_progress(progress);
                Ok(self.session.borrow().characters().len())
            }
            Err(err) => {
                self.session.borrow_mut().fail_loading(err.to_string());
                Err(err)
            }
        }
    }

    /// Judge a click inside the choice menu.
    pub async fn choose(&self, target: &MenuTarget, page: PagePoint) -> GuessOutcome {
        let Some(pending) = self.session.borrow().begin_guess(target, page) else {
            return GuessOutcome::Ignored;
        };
        let lookup = self.backend.fetch_one(&pending.name).await;
        if !self.is_live() {
            return GuessOutcome::Ignored;
        }
        let canonical = match lookup {
            Ok(Some(character)) => character,
            Ok(None) => {
                warn!(name = %pending.name, "character missing from store");
                self.session.borrow_mut().set_notice(Notice::LookupFailed);
                return GuessOutcome::LookupFailed;
            }
            Err(err) => {
                warn!(name = %pending.name, %err, "character lookup failed");
                self.session.borrow_mut().set_notice(Notice::LookupFailed);
                return GuessOutcome::LookupFailed;
            }
        };
        let (verdict, progress) = self.session.borrow_mut().resolve_guess(&pending, &canonical);
        self.apply_progress(progress);
        match (verdict, progress) {
            (Verdict::Wrong, _) => GuessOutcome::Wrong,
            (Verdict::Correct, Progress::Completed) => GuessOutcome::Completed,
            (Verdict::Correct, Progress::Continue) => GuessOutcome::Correct,
        }
    }
}

impl<B: AuthService + ScoreStore, W: Stopwatch> Controller<B, W> {
    /// Save the final time under `typed` after an anonymous sign-in. A name
    /// that already has a record is refused and nothing is written.
    pub async fn submit_score(&self, typed: &str) -> SubmitOutcome {
        let started = self.session.borrow_mut().begin_submission(typed);
        let Some(username) = started else {
            return match self.session.borrow().error_message() {
                "" => SubmitOutcome::Ignored,
                _ => SubmitOutcome::EmptyName,
            };
        };

        let signed_in = self.backend.sign_in_anonymously().await;
        if !self.is_live() {
            return SubmitOutcome::Ignored;
        }
        match signed_in {
            Ok(identity) => {
                info!(uid = %identity.uid, %username, "auth confirmed");
                self.session.borrow_mut().auth_confirmed(identity.uid);
            }
            Err(err) => {
                warn!(%err, "anonymous sign-in failed");
                self.session.borrow_mut().reject_submission(AUTH_FAILED_MESSAGE);
                return SubmitOutcome::AuthFailed;
            }
        }

        let existing = self.backend.find_score(&username).await;
        if !self.is_live() {
            return SubmitOutcome::Ignored;
        }
        match existing {
            Ok(Some(existing)) => {
                info!(name = %existing.name, score = existing.score, "player already exists");
                self.session.borrow_mut().reject_submission(DUPLICATE_PLAYER_MESSAGE);
                return SubmitOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "score lookup failed");
                self.session.borrow_mut().reject_submission(SCORE_SAVE_FAILED_MESSAGE);
                return SubmitOutcome::StoreFailed;
            }
        }

        let record = ScoreRecord::new(username, self.stopwatch.elapsed_secs());
        let created = self.backend.create_score(&record).await;
        if !self.is_live() {
            debug!(name = %record.name, "score written after teardown");
            return SubmitOutcome::Ignored;
        }
        match created {
            Ok(()) => {}
            Err(GameError::AlreadyExists(name)) => {
                info!(%name, "player created concurrently");
                self.session.borrow_mut().reject_submission(DUPLICATE_PLAYER_MESSAGE);
                return SubmitOutcome::Duplicate;
            }
            Err(err) => {
                warn!(%err, "score write failed");
                self.session.borrow_mut().reject_submission(SCORE_SAVE_FAILED_MESSAGE);
                return SubmitOutcome::StoreFailed;
            }
        }

        info!(name = %record.name, score = record.score, "score saved");
        self.session.borrow_mut().score_saved(record.clone());
        self.load_leaders().await;
        SubmitOutcome::Saved(record)
    }

    /// Fill the scoreboard with the fastest players.
    pub async fn load_leaders(&self) {
        let limit = self.session.borrow().config().scoreboard_limit;
        let fetched = self.backend.leaders(limit).await;
        if !self.is_live() {
            return;
        }
        let result = match fetched {
            Ok(records) => Leaders::Loaded(records),
            Err(err) => {
                warn!(%err, "leaderboard unavailable");
                Leaders::Failed(err.to_string())
            }
        };
        self.session.borrow_mut().set_leaders(result);
    }
}

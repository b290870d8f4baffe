//! Game session state.
//!
//! [`Session`] owns the roster and a single [`Phase`] value describing what
//! is on screen. It is a plain reducer: every method is synchronous and the
//! async orchestration lives in [`controller`]. The roster is replaced as a
//! whole whenever a character is found; no reference to an individual
//! record outlives a method call.

pub mod controller;

use tracing::{debug, info, warn};

use crate::character::{Character, ScoreRecord};
use crate::config::GameConfig;
use crate::geometry::{PagePoint, SceneClick, ScenePoint, within_tolerance};

/// Shown when a record for the chosen player name already exists.
pub const DUPLICATE_PLAYER_MESSAGE: &str = "this player already exists!";
pub const EMPTY_NAME_MESSAGE: &str = "please enter a name";
pub const AUTH_FAILED_MESSAGE: &str = "could not sign in, please try again";
pub const SCORE_SAVE_FAILED_MESSAGE: &str = "could not save your score, please try again";

/// Transient message shown over the scene while playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    WrongGuess,
    /// The canonical record could not be fetched.
    LookupFailed,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::WrongGuess => "Wrong guess!",
            Notice::LookupFailed => "Something went wrong, try again!",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayState {
    /// Page anchor of the open choice menu.
    pub menu: Option<PagePoint>,
    pub notice: Option<Notice>,
}

/// Progress of the end-of-game name entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Waiting for the player to confirm a name; `error` is the last failure.
    Editing { error: Option<String> },
    AwaitingAuth { username: String },
    AwaitingScoreCheck { username: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Leaders {
    Loading,
    Loaded(Vec<ScoreRecord>),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Loading,
    LoadFailed(String),
    Playing(PlayState),
    /// End-of-game dialog.
    GameOver(Submission),
    Scoreboard { player: ScoreRecord, leaders: Leaders },
}

/// What a choice-menu click landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuTarget {
    /// A character button, carrying its label.
    Choice(String),
    /// Menu padding or background.
    Background,
}

impl MenuTarget {
    /// Classify a click by the tag of the element it hit.
    pub fn from_element(tag_name: &str, label: Option<String>) -> Self {
        match label {
            Some(name) if tag_name.eq_ignore_ascii_case("button") => MenuTarget::Choice(name),
            _ => MenuTarget::Background,
        }
    }
}

/// Everything the guess judge needs, captured before the canonical lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingGuess {
    pub name: String,
    pub click: ScenePoint,
    pub page: PagePoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
}

/// Returned by roster mutations; `Completed` means the game just ended and
/// the stopwatch must be stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Completed,
}

#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    characters: Vec<Character>,
    phase: Phase,
    /// Normalized position of the last scene click.
    click_position: Option<ScenePoint>,
    identity: Option<String>,
    /// A roster fetch has been started and not yet failed.
    roster_requested: bool,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            characters: Vec::new(),
            phase: Phase::Loading,
            click_position: None,
            identity: None,
            roster_requested: false,
        }
    }

    pub fn config(&self) -> &GameConfig { &self.config }
    pub fn phase(&self) -> &Phase { &self.phase }
    pub fn characters(&self) -> &[Character] { &self.characters }
    pub fn click_position(&self) -> Option<ScenePoint> { self.click_position }

    /// Page anchor of the choice menu while it is open.
    pub fn target_position(&self) -> Option<PagePoint> {
        match &self.phase {
            Phase::Playing(play) => play.menu,
            _ => None,
        }
    }

    /// Last submission error, empty when there is none.
    pub fn error_message(&self) -> &str {
        match &self.phase {
            Phase::GameOver(Submission::Editing { error: Some(msg) }) => msg,
            _ => "",
        }
    }

    /// Anonymous identity of the last successful sign-in.
    pub fn identity(&self) -> Option<&str> { self.identity.as_deref() }

    pub fn found_count(&self) -> usize {
        self.characters.iter().filter(|c| c.found_status).count()
    }

    /// Names offered in the choice menu: every character not yet found.
    pub fn menu_choices(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().filter(|c| !c.found_status).map(|c| c.name.as_str())
    }

    pub fn found_markers(&self) -> impl Iterator<Item = (&str, PagePoint)> {
        self.characters
            .iter()
            .filter(|c| c.found_status)
            .filter_map(|c| c.coordinates_on_page.map(|at| (c.name.as_str(), at)))
    }

    // --- Roster loading -----------------------------------------------------

    /// Claim the roster fetch. Only the first call, or the first after a
    /// failure, gets `true`; a loaded roster is never fetched again.
    pub fn begin_loading(&mut self) -> bool {
        let claimable = match self.phase {
            Phase::Loading => !self.roster_requested,
            Phase::LoadFailed(_) => true,
            _ => false,
        };
        if !claimable {
            debug!("roster already requested, load skipped");
            return false;
        }
        self.roster_requested = true;
        self.characters.clear();
        self.phase = Phase::Loading;
        true
    }

    /// Append records as they arrive. Names already present are dropped.
    pub fn add_characters(&mut self, incoming: Vec<Character>) -> Progress {
        let mut next = self.characters.clone();
        for character in incoming {
            if next.iter().any(|c| c.name == character.name) {
                warn!(name = %character.name, "duplicate character in roster, ignoring");
                continue;
            }
            next.push(character);
        }
        self.characters = next;
        if self.phase == Phase::Loading {
            info!(count = self.characters.len(), "roster loaded");
            self.phase = Phase::Playing(PlayState::default());
        }
        self.check_completion()
    }

    pub fn fail_loading(&mut self, message: String) {
        if self.phase != Phase::Loading {
            return;
        }
        warn!(%message, "roster load failed");
        self.roster_requested = false;
        self.phase = Phase::LoadFailed(message);
    }

    // --- Playing ------------------------------------------------------------

    /// Handle a click on the scene image: open the menu at the click and
    /// remember its normalized position. Clears any notice.
    pub fn click_scene(&mut self, click: &SceneClick) {
        let Phase::Playing(play) = &mut self.phase else {
            return;
        };
        let Some(point) = click.scene_point(self.config.scale_y_by_height) else {
            debug!("scene click on unsized image ignored");
            return;
        };
        play.menu = Some(click.page);
        play.notice = None;
        self.click_position = Some(point);
        debug!(x = point.x, y = point.y, "scene click");
    }

    /// Start judging a menu click. `None` when the click should be ignored:
    /// it missed the buttons, no menu is open, or the name is not guessable.
    pub fn begin_guess(&self, target: &MenuTarget, page: PagePoint) -> Option<PendingGuess> {
        let MenuTarget::Choice(name) = target else {
            return None;
        };
        let Phase::Playing(PlayState { menu: Some(_), .. }) = &self.phase else {
            return None;
        };
        let click = self.click_position?;
        let guessable = self.characters.iter().any(|c| &c.name == name && !c.found_status);
        if !guessable {
            debug!(%name, "guess for unknown or found character ignored");
            return None;
        }
        Some(PendingGuess { name: name.clone(), click, page })
    }

    /// Judge `guess` against the canonical record and apply the outcome.
    pub fn resolve_guess(&mut self, guess: &PendingGuess, canonical: &Character) -> (Verdict, Progress) {
        let verdict = if within_tolerance(guess.click, canonical.coordinates, self.config.tolerance) {
            Verdict::Correct
        } else {
            Verdict::Wrong
        };
        info!(name = %guess.name, ?verdict, "guess judged");
        match verdict {
            Verdict::Wrong => {
                self.set_notice(Notice::WrongGuess);
                (verdict, Progress::Continue)
            }
            Verdict::Correct => (verdict, self.mark_found(&canonical.name, guess.page)),
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        if let Phase::Playing(play) = &mut self.phase {
            play.notice = Some(notice);
        }
    }

    fn mark_found(&mut self, name: &str, at: PagePoint) -> Progress {
        if !matches!(self.phase, Phase::Playing(_)) {
            return Progress::Continue;
        }
        self.characters = self
            .characters
            .iter()
            .map(|c| if c.name == name && !c.found_status { c.found_at(at) } else { c.clone() })
            .collect();
        self.check_completion()
    }

    /// End the game once enough characters are found. Fires at most once:
    /// it only acts while playing.
    pub fn check_completion(&mut self) -> Progress {
        if !matches!(self.phase, Phase::Playing(_)) {
            return Progress::Continue;
        }
        let found = self.found_count();
        if found < self.config.completion_threshold {
            return Progress::Continue;
        }
        info!(found, "all characters found, game over");
        self.phase = Phase::GameOver(Submission::Editing { error: None });
        Progress::Completed
    }

    // --- Score submission ---------------------------------------------------

    /// Accept a typed name from the end dialog. Returns the trimmed name when
    /// the flow should proceed to sign-in.
    pub fn begin_submission(&mut self, typed: &str) -> Option<String> {
        if !matches!(self.phase, Phase::GameOver(Submission::Editing { .. })) {
            return None;
        }
        let username = typed.trim();
        if username.is_empty() {
            self.reject_submission(EMPTY_NAME_MESSAGE);
            return None;
        }
        self.phase = Phase::GameOver(Submission::AwaitingAuth { username: username.to_owned() });
        Some(username.to_owned())
    }

    pub fn auth_confirmed(&mut self, uid: String) {
        if let Phase::GameOver(Submission::AwaitingAuth { username }) = &self.phase {
            self.phase = Phase::GameOver(Submission::AwaitingScoreCheck { username: username.clone() });
            self.identity = Some(uid);
        }
    }

    /// Return to name entry with `message` shown.
    pub fn reject_submission(&mut self, message: &str) {
        if matches!(self.phase, Phase::GameOver(_)) {
            self.phase = Phase::GameOver(Submission::Editing { error: Some(message.to_owned()) });
        }
    }

    pub fn score_saved(&mut self, player: ScoreRecord) {
        if matches!(self.phase, Phase::GameOver(Submission::AwaitingScoreCheck { .. })) {
            self.phase = Phase::Scoreboard { player, leaders: Leaders::Loading };
        }
    }

    pub fn set_leaders(&mut self, result: Leaders) {
        if let Phase::Scoreboard { leaders, .. } = &mut self.phase {
            *leaders = result;
        }
    }
}

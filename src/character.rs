//! Roster and score records.

use crate::geometry::{PagePoint, ScenePoint};

/// A hidden character on the scene image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Character {
    /// Unique within a roster; doubles as label and document key.
    pub name: String,
    /// True location in image percent.
    pub coordinates: ScenePoint,
    pub found_status: bool,
    /// Where the player clicked when finding it; set only once found.
    pub coordinates_on_page: Option<PagePoint>,
}

impl Character {
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            coordinates: ScenePoint::new(x, y),
            found_status: false,
            coordinates_on_page: None,
        }
    }

    /// A found copy of this record, marked at `at`.
    pub fn found_at(&self, at: PagePoint) -> Self {
        Self {
            found_status: true,
            coordinates_on_page: Some(at),
            ..self.clone()
        }
    }
}

/// Final result persisted per player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreRecord {
    pub name: String,
    /// Elapsed whole seconds.
    pub score: u32,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, score: u32) -> Self {
        Self { name: name.into(), score }
    }
}

/// Fastest first, ties broken by name.
pub fn rank_scores(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.name.cmp(&b.name)));
}

//! Game configuration.
//!
//! Passed from JS as a JSON string to `start_game`. Every field has a serde
//! default so an empty object (`{}`) yields a playable local setup; only the
//! Firestore project needs to be filled in to reach the remote stores.

use serde::Deserialize;

use crate::error::GameError;

// ── Public Config Struct ──

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Inclusive hit-test window on each axis, in image percent.
    #[serde(default = "default_tolerance")]
    pub tolerance: i32,
    /// Number of found characters that ends the game.
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: usize,
    /// When false (the default) the Y click offset is divided by the image
    /// *width*, matching the coordinates stored for the shipped roster.
    #[serde(default)]
    pub scale_y_by_height: bool,
    #[serde(default = "default_scoreboard_limit")]
    pub scoreboard_limit: usize,
    #[serde(default = "default_image_src")]
    pub image_src: String,
    #[serde(default = "default_image_alt")]
    pub image_alt: String,
    #[serde(default = "default_root_id")]
    pub root_id: String,
    #[serde(default)]
    pub firestore: FirestoreConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FirestoreConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_characters_collection")]
    pub characters_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
}

// ── Defaults ──

fn default_tolerance() -> i32 { 1 }
fn default_completion_threshold() -> usize { 4 }
fn default_scoreboard_limit() -> usize { 10 }
fn default_image_src() -> String { "./zs9fTdh.gif".into() }
fn default_image_alt() -> String { "dinosaurs".into() }
fn default_root_id() -> String { "dh-root".into() }
fn default_characters_collection() -> String { "characters".into() }
fn default_users_collection() -> String { "users".into() }

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            tolerance: default_tolerance(),
            completion_threshold: default_completion_threshold(),
            scale_y_by_height: false,
            scoreboard_limit: default_scoreboard_limit(),
            image_src: default_image_src(),
            image_alt: default_image_alt(),
            root_id: default_root_id(),
            firestore: FirestoreConfig::default(),
        }
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        FirestoreConfig {
            project_id: String::new(),
            api_key: String::new(),
            characters_collection: default_characters_collection(),
            users_collection: default_users_collection(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, GameError> {
        let cfg: GameConfig =
            serde_json::from_str(text).map_err(|e| GameError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.tolerance < 0 {
            return Err(GameError::Config(format!(
                "tolerance must not be negative (got {})",
                self.tolerance
            )));
        }
        if self.completion_threshold == 0 {
            return Err(GameError::Config("completion_threshold must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = GameConfig::from_json("{}").unwrap();
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.tolerance, 1);
        assert_eq!(cfg.completion_threshold, 4);
        assert!(!cfg.scale_y_by_height);
        assert_eq!(cfg.firestore.users_collection, "users");
    }

    #[test]
    fn partial_firestore_section_keeps_collection_defaults() {
        let cfg = GameConfig::from_json(r#"{"firestore":{"project_id":"dinos","api_key":"k"}}"#)
            .unwrap();
        assert_eq!(cfg.firestore.project_id, "dinos");
        assert_eq!(cfg.firestore.characters_collection, "characters");
    }

    #[test]
    fn rejects_negative_tolerance_and_zero_threshold() {
        assert!(matches!(
            GameConfig::from_json(r#"{"tolerance":-1}"#),
            Err(GameError::Config(_))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"completion_threshold":0}"#),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(GameConfig::from_json("{"), Err(GameError::Config(_))));
    }
}

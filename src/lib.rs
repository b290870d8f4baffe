//! Dino Hunt core crate.
//!
//! Click the scene, pick a name from the menu, find every hidden dinosaur
//! before the clock runs away. Game state and judging are plain Rust
//! (`session`, `geometry`) and run under `cargo test` on the host; the
//! browser layer (`web`) and the Firestore backend are only exercised in
//! the page.

use wasm_bindgen::prelude::*;

pub mod character;
pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod session;
pub mod store;
mod web;

pub use character::{Character, ScoreRecord};
pub use config::GameConfig;
pub use error::GameError;
pub use session::controller::{Controller, GuessOutcome, SubmitOutcome};
pub use session::{MenuTarget, Phase, Session};
pub use web::PerformanceStopwatch;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // Forward tracing events to the browser console.
    tracing_wasm::set_as_global_default();
}

// -----------------------------------------------------------------------------
// JS entrypoints
// -----------------------------------------------------------------------------

/// Start a session. `config_json` is a [`GameConfig`] as JSON; `"{}"` uses
/// the defaults apart from the Firestore project, which must be set.
#[wasm_bindgen]
pub fn start_game(config_json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(config_json)?;
    web::start_game_mode(config)
}

/// Tear the current session down and clear its DOM.
#[wasm_bindgen]
pub fn stop_game() {
    web::stop_game_mode();
}

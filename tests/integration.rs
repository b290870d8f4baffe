// Integration tests (native) for the `dino-hunt` crate.
// These drive full sessions through the public controller API against the
// in-memory backend, so they run under `cargo test` on the host.

use dino_hunt::clock::{ManualStopwatch, Stopwatch};
use dino_hunt::geometry::{PagePoint, SceneClick};
use dino_hunt::session::{Leaders, Notice, Submission};
use dino_hunt::store::memory::MemoryBackend;
use dino_hunt::{
    Character, Controller, GameConfig, GuessOutcome, MenuTarget, Phase, ScoreRecord, SubmitOutcome,
};
use pollster::block_on;

type Game = Controller<MemoryBackend, ManualStopwatch>;

fn dinosaurs() -> Vec<Character> {
    vec![
        Character::new("Rex", 50, 50),
        Character::new("Tri", 10, 10),
        Character::new("Ptero", 90, 10),
        Character::new("Steg", 10, 90),
    ]
}

fn new_game(backend: MemoryBackend) -> Game {
    let game = Controller::new(GameConfig::default(), backend, ManualStopwatch::new(0));
    block_on(game.load_roster()).unwrap();
    game
}

// Click at image percent (x, y) on an 800px wide image. Offsets land mid-percent.
fn click(game: &Game, x: i32, y: i32) {
    game.click_scene(&SceneClick {
        offset_x: x as f64 * 8.0 + 4.0,
        offset_y: y as f64 * 8.0 + 4.0,
        page: PagePoint::new(100 + x * 8, 200 + y * 8),
        rendered_width: 800.0,
        rendered_height: 600.0,
    });
}

fn choose(game: &Game, name: &str) -> GuessOutcome {
    block_on(game.choose(&MenuTarget::Choice(name.into()), PagePoint::new(0, 0)))
}

fn find_all(game: &Game) {
    let outcomes: Vec<_> = dinosaurs()
        .iter()
        .map(|c| {
            click(game, c.coordinates.x + 1, c.coordinates.y - 1);
            choose(game, &c.name)
        })
        .collect();
    assert_eq!(
        outcomes,
        [GuessOutcome::Correct, GuessOutcome::Correct, GuessOutcome::Correct, GuessOutcome::Completed]
    );
}

#[test]
fn four_finds_end_the_game_and_stop_the_clock_once() {
    let game = new_game(MemoryBackend::new(dinosaurs()));
    game.stopwatch().advance(42);
    find_all(&game);

    assert_eq!(game.session().phase(), &Phase::GameOver(Submission::Editing { error: None }));
    assert_eq!(game.stopwatch().stop_calls(), 1);
    assert_eq!(game.session().found_count(), 4);
    assert_eq!(game.session().menu_choices().count(), 0);
}

#[test]
fn alice_is_saved_then_refused_in_a_new_session() {
    let backend = MemoryBackend::new(dinosaurs());
    let first = new_game(backend);
    first.stopwatch().advance(37);
    find_all(&first);
    first.stopwatch().advance(100);

    let saved = block_on(first.submit_score("alice"));
    assert_eq!(saved, SubmitOutcome::Saved(ScoreRecord::new("alice", 37)));
    assert_eq!(first.backend().score("alice"), Some(ScoreRecord::new("alice", 37)));
    match first.session().phase() {
        Phase::Scoreboard { player, .. } => assert_eq!(player.name, "alice"),
        other => panic!("expected scoreboard, got {other:?}"),
    }

    // Second session sharing the same score store.
    let store = MemoryBackend::new(dinosaurs());
    store.insert_score(first.backend().score("alice").unwrap());
    let second = new_game(store);
    second.stopwatch().advance(12);
    find_all(&second);

    assert_eq!(block_on(second.submit_score("alice")), SubmitOutcome::Duplicate);
    assert_eq!(second.session().error_message(), "this player already exists!");
    assert!(matches!(second.session().phase(), Phase::GameOver(Submission::Editing { .. })));
    assert_eq!(second.backend().score_writes(), 0);
    assert_eq!(second.backend().score("alice"), Some(ScoreRecord::new("alice", 37)));

    // A different name goes through.
    assert_eq!(
        block_on(second.submit_score("bob")),
        SubmitOutcome::Saved(ScoreRecord::new("bob", 12))
    );
}

#[test]
fn scoreboard_lists_fastest_players() {
    let backend = MemoryBackend::new(dinosaurs());
    backend.insert_score(ScoreRecord::new("slow", 300));
    backend.insert_score(ScoreRecord::new("quick", 20));
    let game = new_game(backend);
    game.stopwatch().advance(45);
    find_all(&game);
    assert!(matches!(block_on(game.submit_score("mid")), SubmitOutcome::Saved(_)));

    match game.session().phase() {
        Phase::Scoreboard { leaders: Leaders::Loaded(rows), .. } => {
            let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, ["quick", "mid", "slow"]);
        }
        other => panic!("expected loaded scoreboard, got {other:?}"),
    }
}

#[test]
fn off_by_two_is_wrong_and_changes_nothing() {
    let game = new_game(MemoryBackend::new(dinosaurs()));
    click(&game, 52, 50);
    assert_eq!(choose(&game, "Rex"), GuessOutcome::Wrong);
    click(&game, 50, 48);
    assert_eq!(choose(&game, "Rex"), GuessOutcome::Wrong);
    assert_eq!(game.session().found_count(), 0);
    match game.session().phase() {
        Phase::Playing(play) => assert_eq!(play.notice, Some(Notice::WrongGuess)),
        other => panic!("unexpected phase {other:?}"),
    }
}

#[test]
fn menu_background_click_is_a_no_op() {
    let game = new_game(MemoryBackend::new(dinosaurs()));
    click(&game, 50, 50);
    let outcome = block_on(game.choose(&MenuTarget::Background, PagePoint::new(0, 0)));
    assert_eq!(outcome, GuessOutcome::Ignored);
    assert_eq!(game.backend().lookups(), 0);
    assert!(game.session().characters().iter().all(|c| !c.found_status));
}

#[test]
fn three_character_roster_never_completes() {
    let game = new_game(MemoryBackend::new(dinosaurs().into_iter().take(3).collect()));
    for c in dinosaurs().iter().take(3) {
        click(&game, c.coordinates.x, c.coordinates.y);
        assert_eq!(choose(&game, &c.name), GuessOutcome::Correct);
    }
    assert!(matches!(game.session().phase(), Phase::Playing(_)));
    assert_eq!(game.stopwatch().stop_calls(), 0);
    assert!(!game.stopwatch().is_stopped());
    assert_eq!(game.stopwatch().elapsed_secs(), 0);
}

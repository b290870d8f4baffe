//! Browser front end.
//!
//! Builds the scene image, a timer badge and an overlay layer under the
//! configured root element, wires click listeners into the session
//! controller and re-renders the overlay from the session after every
//! change. The live controller sits in a thread-local slot so listeners and
//! spawned futures can reach it.

mod timer;

pub use timer::PerformanceStopwatch;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlImageElement, HtmlInputElement, MouseEvent, window};

use crate::clock::Stopwatch;
use crate::config::GameConfig;
use crate::geometry::{PagePoint, SceneClick};
use crate::session::controller::Controller;
use crate::session::{Leaders, MenuTarget, Phase, Session, Submission};
use crate::store::firestore::FirestoreBackend;

type WebController = Controller<FirestoreBackend, PerformanceStopwatch>;

const SCENE_ID: &str = "dh-scene";
const TIMER_ID: &str = "dh-timer";
const OVERLAY_ID: &str = "dh-overlay";
const MENU_ID: &str = "dh-menu";
const USERNAME_ID: &str = "dh-username";

// --- Inline styles ------------------------------------------------------------

const TARGET_BOX_STYLE: &str = "position:absolute; width:30px; height:30px; background-color:red;";
const MENU_STYLE: &str = "position:relative; top:-10px; left:35px; min-width:50px; min-height:65px; max-width:80px; background-color:black; display:flex; flex-direction:column;";
const CHOICE_STYLE: &str = "background:transparent; border:none; line-height:normal; color:white; cursor:pointer;";
const NOTICE_STYLE: &str = "position:fixed; top:30%; left:50%; transform:translate(-50%,-50%); width:130px; height:50px; background-color:black; color:white; text-align:center;";
const MARKER_STYLE: &str = "position:absolute; width:130px; height:50px; background-color:cyan; color:black; text-align:center;";
const DIALOG_STYLE: &str = "position:fixed; top:50%; left:50%; transform:translate(-50%,-50%); min-width:35%; min-height:55%; background-color:white; color:black; display:flex; flex-direction:column; align-items:center; z-index:40;";
const SCOREBOARD_STYLE: &str = "position:fixed; top:50%; left:50%; transform:translate(-50%,-50%); min-width:35%; min-height:55%; background-color:#cfeab0; color:black; display:flex; flex-direction:column; align-items:center; z-index:40;";
const TIMER_STYLE: &str = "position:fixed; top:10px; left:10px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); color:white; border-radius:6px; z-index:44;";

thread_local! {
    static GAME: RefCell<Option<Rc<WebController>>> = const { RefCell::new(None) };
}

fn current_game() -> Option<Rc<WebController>> {
    GAME.with(|g| g.borrow().clone())
}

fn document() -> Result<Document, JsValue> {
    window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn start_game_mode(config: GameConfig) -> Result<(), JsValue> {
    stop_game_mode();
    let doc = document()?;

    let root = match doc.get_element_by_id(&config.root_id) {
        Some(el) => el,
        None => {
            let el = doc.create_element("div")?;
            el.set_id(&config.root_id);
            doc.body().ok_or_else(|| JsValue::from_str("no body"))?.append_child(&el)?;
            el
        }
    };
    root.set_inner_html("");

    let scene: HtmlImageElement = doc.create_element("img")?.dyn_into()?;
    scene.set_id(SCENE_ID);
    scene.set_src(&config.image_src);
    scene.set_alt(&config.image_alt);
    scene.set_attribute("style", "max-width:100%; cursor:crosshair;")?;
    root.append_child(&scene)?;

    let timer_badge = doc.create_element("div")?;
    timer_badge.set_id(TIMER_ID);
    timer_badge.set_attribute("style", TIMER_STYLE)?;
    root.append_child(&timer_badge)?;

    let overlay = doc.create_element("div")?;
    overlay.set_id(OVERLAY_ID);
    root.append_child(&overlay)?;

    let backend = FirestoreBackend::new(config.firestore.clone())?;
    let game = Rc::new(Controller::new(config, backend, PerformanceStopwatch::start()));
    GAME.with(|g| g.replace(Some(game.clone())));
    info!("game session started");

    // Scene clicks open the choice menu at the pointer.
    {
        let image = scene.clone();
        let closure = Closure::wrap(Box::new(move |evt: MouseEvent| {
            let Some(game) = current_game() else { return };
            let click = SceneClick {
                offset_x: evt.offset_x() as f64,
                offset_y: evt.offset_y() as f64,
                page: PagePoint::new(evt.page_x(), evt.page_y()),
                rendered_width: image.width() as f64,
                rendered_height: image.height() as f64,
            };
            game.click_scene(&click);
            rerender(&game);
        }) as Box<dyn FnMut(_)>);
        scene.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // One delegated listener for everything drawn into the overlay.
    {
        let closure = Closure::wrap(Box::new(move |evt: MouseEvent| {
            let Some(game) = current_game() else { return };
            let Some(target) = evt.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let page = PagePoint::new(evt.page_x(), evt.page_y());
            match target.get_attribute("data-action").as_deref() {
                Some("confirm") => on_confirm(game),
                Some("retry") => spawn_roster_load(game),
                _ => {
                    if let Some(MenuTarget::Choice(name)) = menu_target(&target) {
                        on_choice(game, MenuTarget::Choice(name), page);
                    }
                }
            }
        }) as Box<dyn FnMut(_)>);
        overlay.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    rerender(&game);
    start_timer_loop(&game);
    spawn_roster_load(game);
    Ok(())
}

pub fn stop_game_mode() {
    if let Some(game) = GAME.with(|g| g.borrow_mut().take()) {
        game.teardown();
        if let Ok(doc) = document() {
            if let Some(root) = doc.get_element_by_id(&game.session().config().root_id) {
                root.set_inner_html("");
            }
        }
        info!("game session stopped");
    }
}

fn spawn_roster_load(game: Rc<WebController>) {
    spawn_local(async move {
        if let Err(err) = game.load_roster().await {
            error!(%err, "could not load characters");
        }
        rerender(&game);
    });
}

/// Classify a click inside the choice menu; `None` outside it.
fn menu_target(target: &Element) -> Option<MenuTarget> {
    target.closest(&format!("#{MENU_ID}")).ok().flatten()?;
    Some(MenuTarget::from_element(&target.tag_name(), target.get_attribute("data-name")))
}

fn on_choice(game: Rc<WebController>, target: MenuTarget, page: PagePoint) {
    spawn_local(async move {
        let outcome = game.choose(&target, page).await;
        debug!(?outcome, "choice handled");
        rerender(&game);
    });
}

fn on_confirm(game: Rc<WebController>) {
    let typed = document()
        .ok()
        .and_then(|doc| username_input(&doc))
        .map(|input| input.value())
        .unwrap_or_default();
    spawn_local(async move {
        let outcome = game.submit_score(&typed).await;
        debug!(?outcome, "submission handled");
        rerender(&game);
    });
}

fn username_input(doc: &Document) -> Option<HtmlInputElement> {
    doc.get_element_by_id(USERNAME_ID)?.dyn_into().ok()
}

fn rerender(game: &WebController) {
    if !game.is_live() {
        return;
    }
    if let Err(err) = render(&game.session()) {
        error!(?err, "render failed");
    }
}

// --- Rendering ------------------------------------------------------------------

fn render(session: &Session) -> Result<(), JsValue> {
    let doc = document()?;
    let Some(overlay) = doc.get_element_by_id(OVERLAY_ID) else {
        return Ok(());
    };
    let typed = username_input(&doc).map(|input| input.value()).unwrap_or_default();
    overlay.set_inner_html("");

    for (name, at) in session.found_markers() {
        let marker = styled(&doc, "div", MARKER_STYLE)?;
        place(&marker, MARKER_STYLE, at)?;
        marker.set_text_content(Some(name));
        overlay.append_child(&marker)?;
    }

    match session.phase() {
        Phase::Loading => {
            let note = styled(&doc, "div", NOTICE_STYLE)?;
            note.set_text_content(Some("Loading..."));
            overlay.append_child(&note)?;
        }
        Phase::LoadFailed(message) => {
            let panel = styled(&doc, "div", NOTICE_STYLE)?;
            let text = doc.create_element("p")?;
            text.set_text_content(Some(&format!("Could not load the game: {message}")));
            panel.append_child(&text)?;
            let retry = button(&doc, "Retry", "background:white; color:black;")?;
            retry.set_attribute("data-action", "retry")?;
            panel.append_child(&retry)?;
            overlay.append_child(&panel)?;
        }
        Phase::Playing(play) => {
            if let Some(at) = play.menu {
                let target_box = styled(&doc, "div", TARGET_BOX_STYLE)?;
                place(&target_box, TARGET_BOX_STYLE, at)?;
                let menu = styled(&doc, "div", MENU_STYLE)?;
                menu.set_id(MENU_ID);
                for name in session.menu_choices() {
                    let choice = button(&doc, name, CHOICE_STYLE)?;
                    choice.set_attribute("data-name", name)?;
                    menu.append_child(&choice)?;
                }
                target_box.append_child(&menu)?;
                overlay.append_child(&target_box)?;
            }
            if let Some(notice) = play.notice {
                let note = styled(&doc, "div", NOTICE_STYLE)?;
                note.set_text_content(Some(notice.text()));
                overlay.append_child(&note)?;
            }
        }
        Phase::GameOver(submission) => {
            let dialog = styled(&doc, "div", DIALOG_STYLE)?;
            let prompt = doc.create_element("p")?;
            prompt.set_text_content(Some("please enter your name to save your score:"));
            dialog.append_child(&prompt)?;
            if !session.error_message().is_empty() {
                let err = doc.create_element("p")?;
                err.set_class_name("error-msg");
                err.set_text_content(Some(session.error_message()));
                dialog.append_child(&err)?;
            }
            let input: HtmlInputElement = doc.create_element("input")?.dyn_into()?;
            input.set_id(USERNAME_ID);
            input.set_type("text");
            input.set_value(&typed);
            dialog.append_child(&input)?;
            let busy = !matches!(submission, Submission::Editing { .. });
            let confirm = button(&doc, if busy { "Saving..." } else { "Confirm" }, "")?;
            if busy {
                confirm.set_attribute("disabled", "")?;
            } else {
                confirm.set_attribute("data-action", "confirm")?;
            }
            dialog.append_child(&confirm)?;
            overlay.append_child(&dialog)?;
        }
        Phase::Scoreboard { player, leaders } => {
            let board = styled(&doc, "div", SCOREBOARD_STYLE)?;
            let title = doc.create_element("h2")?;
            title.set_text_content(Some("Scoreboard"));
            board.append_child(&title)?;
            let own = doc.create_element("p")?;
            own.set_text_content(Some(&format!("{}: {}s", player.name, player.score)));
            board.append_child(&own)?;
            match leaders {
                Leaders::Loading => {
                    let p = doc.create_element("p")?;
                    p.set_text_content(Some("Loading scores..."));
                    board.append_child(&p)?;
                }
                Leaders::Loaded(records) => {
                    let list = doc.create_element("ol")?;
                    for record in records {
                        let item = doc.create_element("li")?;
                        item.set_text_content(Some(&format!("{} - {}s", record.name, record.score)));
                        list.append_child(&item)?;
                    }
                    board.append_child(&list)?;
                }
                Leaders::Failed(message) => {
                    let p = doc.create_element("p")?;
                    p.set_class_name("error-msg");
                    p.set_text_content(Some(&format!("Could not load scores: {message}")));
                    board.append_child(&p)?;
                }
            }
            overlay.append_child(&board)?;
        }
    }
    Ok(())
}

fn styled(doc: &Document, tag: &str, style: &str) -> Result<Element, JsValue> {
    let el = doc.create_element(tag)?;
    if !style.is_empty() {
        el.set_attribute("style", style)?;
    }
    Ok(el)
}

fn place(el: &Element, base_style: &str, at: PagePoint) -> Result<(), JsValue> {
    el.set_attribute("style", &format!("{base_style} left:{}px; top:{}px;", at.x, at.y))
}

fn button(doc: &Document, label: &str, style: &str) -> Result<Element, JsValue> {
    let el = styled(doc, "button", style)?;
    el.set_text_content(Some(label));
    Ok(el)
}

// --- Timer badge loop -------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_timer_loop(game: &Rc<WebController>) {
    let session = Rc::downgrade(game);
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        // Session gone or replaced: drop the loop.
        let Some(game) = session.upgrade().filter(|g| g.is_live()) else { return };
        if let Some(badge) = document().ok().and_then(|d| d.get_element_by_id(TIMER_ID)) {
            badge.set_text_content(Some(&format!("{}s", game.stopwatch().elapsed_secs())));
        }
        if !game.stopwatch().is_running() {
            return;
        }
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::session::EMPTY_NAME_MESSAGE;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn overlay() -> Element {
        let doc = document().unwrap();
        if let Some(el) = doc.get_element_by_id(OVERLAY_ID) {
            return el;
        }
        let el = doc.create_element("div").unwrap();
        el.set_id(OVERLAY_ID);
        doc.body().unwrap().append_child(&el).unwrap();
        el
    }

    fn click_at(session: &mut Session, x: i32, y: i32) {
        session.click_scene(&SceneClick {
            offset_x: x as f64 + 0.5,
            offset_y: y as f64 + 0.5,
            page: PagePoint::new(x, y),
            rendered_width: 100.0,
            rendered_height: 100.0,
        });
    }

    fn session_with_open_menu() -> Session {
        let mut session = Session::new(GameConfig::default());
        session.add_characters(vec![Character::new("Rex", 50, 50), Character::new("Tri", 10, 10)]);
        click_at(&mut session, 50, 50);
        session
    }

    #[wasm_bindgen_test]
    fn menu_lists_unfound_characters_as_buttons() {
        let overlay = overlay();
        render(&session_with_open_menu()).unwrap();
        let buttons = overlay.query_selector_all(&format!("#{MENU_ID} button")).unwrap();
        assert_eq!(buttons.length(), 2);
        let rex = overlay.query_selector("[data-name='Rex']").unwrap().unwrap();
        assert_eq!(rex.text_content().as_deref(), Some("Rex"));
    }

    #[wasm_bindgen_test]
    fn menu_background_dispatches_no_guess() {
        let overlay = overlay();
        render(&session_with_open_menu()).unwrap();
        let menu = overlay.query_selector(&format!("#{MENU_ID}")).unwrap().unwrap();
        assert_eq!(menu_target(&menu), Some(MenuTarget::Background));

        let button = overlay.query_selector("[data-name='Tri']").unwrap().unwrap();
        assert_eq!(menu_target(&button), Some(MenuTarget::Choice("Tri".into())));

        // Outside the menu nothing is classified at all.
        assert_eq!(menu_target(&overlay), None);
    }

    #[wasm_bindgen_test]
    fn found_character_gets_a_marker() {
        let overlay = overlay();
        let mut session = session_with_open_menu();
        let pending = session
            .begin_guess(&MenuTarget::Choice("Rex".into()), PagePoint::new(120, 80))
            .unwrap();
        session.resolve_guess(&pending, &Character::new("Rex", 50, 50));
        render(&session).unwrap();
        assert!(overlay.text_content().unwrap_or_default().contains("Rex"));
        assert!(overlay.query_selector("[data-name='Rex']").unwrap().is_none());
    }

    #[wasm_bindgen_test]
    fn failed_load_offers_retry() {
        let overlay = overlay();
        let mut session = Session::new(GameConfig::default());
        session.begin_loading();
        session.fail_loading("offline".into());
        render(&session).unwrap();
        assert!(overlay.query_selector("[data-action='retry']").unwrap().is_some());
        assert!(overlay.text_content().unwrap_or_default().contains("offline"));
    }

    #[wasm_bindgen_test]
    fn dialog_shows_submission_error() {
        let overlay = overlay();
        let config = GameConfig { completion_threshold: 1, ..GameConfig::default() };
        let mut session = Session::new(config);
        session.add_characters(vec![Character::new("Rex", 50, 50)]);
        click_at(&mut session, 50, 50);
        let pending = session
            .begin_guess(&MenuTarget::Choice("Rex".into()), PagePoint::new(0, 0))
            .unwrap();
        session.resolve_guess(&pending, &Character::new("Rex", 50, 50));
        session.begin_submission("  ");
        render(&session).unwrap();
        let err = overlay.query_selector(".error-msg").unwrap().unwrap();
        assert_eq!(err.text_content().as_deref(), Some(EMPTY_NAME_MESSAGE));
        assert!(overlay.query_selector("[data-action='confirm']").unwrap().is_some());
    }
}

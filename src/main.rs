//! Booth Catch entry point
//!
//! On the web this wires a `Session` to DOM timers, keys and fetch. Natively
//! it plays a few seeded autoplay sessions against the in-memory booth.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, HtmlDocument, KeyboardEvent, Request, RequestInit, Response};

    use booth_catch::audio::AudioManager;
    use booth_catch::booth::{BoothError, ScoreSink, ScoreSubmission};
    use booth_catch::consts::*;
    use booth_catch::feedback::{end_badge, end_message, focus_level, level_anecdote, level_name};
    use booth_catch::leaderboard::RunRecord;
    use booth_catch::sim::{GamePhase, Session};
    use booth_catch::{PlayerIdentity, RecentRuns, SessionParams};

    const SCORES_ENDPOINT: &str = "/api/scores";
    const LANE_KEYS: [&str; LANE_COUNT] = ["d", "f", "j", "k"];

    /// Posts scores to the booth API without waiting for the answer
    struct FetchSink;

    impl ScoreSink for FetchSink {
        fn submit(&mut self, submission: ScoreSubmission) -> Result<(), BoothError> {
            let Some(window) = web_sys::window() else {
                return Err(BoothError::Storage);
            };
            let init = RequestInit::new();
            init.set_method("POST");
            init.set_body(&JsValue::from_str(&submission.to_json()));
            let request =
                Request::new_with_str_and_init(SCORES_ENDPOINT, &init).map_err(|_| BoothError::Storage)?;
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(|_| BoothError::Storage)?;

            let pending = window.fetch_with_request(&request);
            wasm_bindgen_futures::spawn_local(async move {
                match JsFuture::from(pending).await {
                    Ok(value) => {
                        if let Ok(response) = value.dyn_into::<Response>() {
                            if !response.ok() {
                                log::debug!("Score endpoint answered {}", response.status());
                            }
                        }
                    }
                    Err(e) => log::debug!("Score post failed: {:?}", e),
                }
            });
            Ok(())
        }
    }

    struct Game {
        session: Session,
        audio: AudioManager,
        player: PlayerIdentity,
        runs: RecentRuns,
        last_time: f64,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(params: &SessionParams, player: PlayerIdentity) -> Self {
            let seed = js_sys::Date::now() as u64;
            let session = Session::new(params, seed);
            Self {
                last_phase: session.phase(),
                session,
                audio: AudioManager::new(),
                player,
                runs: RecentRuns::load(),
                last_time: js_sys::Date::now(),
            }
        }

        /// Interval callback: advance by wall time since the last call
        fn update(&mut self, now: f64) {
            let dt = (now - self.last_time).clamp(0.0, 1_000.0) as u64;
            self.last_time = now;
            if self.session.phase() != GamePhase::Playing {
                return;
            }
            self.session.advance(dt);
            self.play_cues();
            self.on_phase_change();
        }

        fn tap(&mut self, lane: u8) {
            self.audio.resume();
            self.session.tap(lane);
            self.play_cues();
            self.on_phase_change();
        }

        fn play_cues(&mut self) {
            for effect in self.session.take_new_effects() {
                self.audio.play(effect.cue());
            }
        }

        fn on_phase_change(&mut self) {
            let phase = self.session.phase();
            if phase == self.last_phase {
                return;
            }
            self.last_phase = phase;

            if phase == GamePhase::Ended {
                self.session.finish(&mut FetchSink, &self.player);
                if let Some(summary) = self.session.summary() {
                    let rank = self.runs.add(RunRecord {
                        score: summary.score,
                        max_combo: summary.max_combo,
                        skin: self.session.state().skin,
                        level: summary.level,
                        time: chrono::Local::now().format("%H:%M").to_string(),
                    });
                    if rank.is_some() {
                        self.runs.save();
                    }
                }
            }
        }

        fn update_hud(&self, document: &Document) {
            let state = self.session.state();
            set_text(document, "hud-score", &state.score.to_string());
            set_text(document, "hud-combo", &format!("x{}", state.combo));
            set_text(document, "hud-level", &format!("{}/{}", state.level, TOTAL_LEVELS));
            set_text(document, "hud-time", &format!("{}s", state.level_time_remaining_secs()));
            let best = self.runs.top_score().map(|s| s.to_string()).unwrap_or_else(|| "-".into());
            set_text(document, "hud-best", &best);

            let (label, color) = focus_level(state.focus);
            set_text(document, "hud-focus", &format!("{:.0}% {}", state.focus, label));
            if let Some(el) = document.get_element_by_id("hud-focus") {
                let _ = el.set_attribute("style", &format!("color: {color}"));
            }

            let comment = self.session.comment().map(|c| c.text).unwrap_or("");
            set_text(document, "comment", comment);

            for lane in 0..LANE_COUNT {
                let flash = self
                    .session
                    .effects()
                    .iter()
                    .rev()
                    .find(|e| e.lane as usize == lane)
                    .map(|e| format!("lane hit-{}", serde_json::to_string(&e.kind).unwrap_or_default().trim_matches('"')))
                    .unwrap_or_else(|| "lane".to_string());
                if let Some(el) = document.get_element_by_id(&format!("lane-{lane}")) {
                    let _ = el.set_attribute("class", &flash);
                }
            }

            show(document, "pause-menu", state.phase == GamePhase::Paused);
            show(document, "level-transition", state.phase == GamePhase::LevelTransition);
            if state.phase == GamePhase::LevelTransition {
                if let Some((name, subtitle)) = level_name(state.level + 1) {
                    set_text(document, "next-level-name", &format!("{name} - {subtitle}"));
                }
                if let Some((title, text, _)) = level_anecdote(state.level) {
                    set_text(document, "level-anecdote", &format!("{title}: {text}"));
                }
            }

            show(document, "game-over", state.phase == GamePhase::Ended);
            if let Some(summary) = self.session.summary() {
                set_text(document, "final-score", &summary.score.to_string());
                set_text(document, "final-combo", &summary.max_combo.to_string());
                set_text(document, "final-badge", end_badge(summary.score));
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        let query = window.location().search().unwrap_or_default();
        let params = SessionParams::from_query(&query);
        let cookies = document
            .clone()
            .dyn_into::<HtmlDocument>()
            .ok()
            .and_then(|d| d.cookie().ok())
            .unwrap_or_default();
        let player = PlayerIdentity::from_cookies(&cookies);
        if !player.is_registered() {
            log::warn!("No registration cookies, score will not be accepted");
        }

        let game = Rc::new(RefCell::new(Game::new(&params, player)));
        log::info!("Booth Catch running ({})", params.to_query());

        setup_timer(&window, &document, game.clone());
        setup_keys(&window, game.clone());
        setup_lane_taps(&document, game.clone());
        setup_auto_pause(&document, game.clone());

        let mut rng = Pcg32::seed_from_u64(js_sys::Date::now() as u64);
        set_text(&document, "end-message", end_message(&mut rng));
    }

    fn setup_timer(window: &web_sys::Window, document: &Document, game: Rc<RefCell<Game>>) {
        let document = document.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let mut g = game.borrow_mut();
            g.update(js_sys::Date::now());
            g.update_hud(&document);
        });
        let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TICK_MS as i32,
        );
        closure.forget();
    }

    fn setup_keys(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let key = event.key().to_lowercase();
            let mut g = game.borrow_mut();
            if let Some(lane) = LANE_KEYS.iter().position(|k| *k == key) {
                g.tap(lane as u8);
                return;
            }
            match key.as_str() {
                "m" => {
                    let muted = g.audio.toggle_muted();
                    log::info!("Muted: {muted}");
                }
                "escape" => {
                    let paused = g.session.toggle_pause();
                    log::info!("Paused: {paused}");
                }
                "enter" => {
                    if g.session.continue_level() {
                        g.last_time = js_sys::Date::now();
                        g.last_phase = g.session.phase();
                    }
                }
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_lane_taps(document: &Document, game: Rc<RefCell<Game>>) {
        for lane in 0..LANE_COUNT {
            let Some(el) = document.get_element_by_id(&format!("lane-{lane}")) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PointerEvent| {
                event.prevent_default();
                game.borrow_mut().tap(lane as u8);
            });
            let _ = el.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                if g.session.phase() == GamePhase::Playing {
                    g.session.toggle_pause();
                    log::info!("Auto-paused (tab hidden)");
                }
            } else {
                g.last_time = js_sys::Date::now();
            }
        });
        let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use booth_catch::booth::gate::{AccessGate, PageRequest, Route};
    use booth_catch::booth::{AdminStats, BoothConfig, LeaderboardQuery, Registration, ScoreBoard};
    use booth_catch::leaderboard::LEADERBOARD_SIZE;
    use booth_catch::sim::{GamePhase, Session};
    use booth_catch::{PlayerIdentity, SessionParams, Skin};

    env_logger::init();
    log::info!("Booth Catch (native) demo starting...");

    let config = BoothConfig::from_env();
    let mut gate = AccessGate::new(&config);
    if !gate.hours.is_open(chrono::Utc::now()) {
        log::warn!("Booth is closed right now, running the demo anyway");
        gate.hours.bypass = true;
    }
    let mut board = ScoreBoard::new();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2026);

    let players = [
        ("Zoé", "Dupont", "zoe@he2b.be", "Zen Poulpe 42"),
        ("Malik", "Janssens", "malik@he2b.be", "Turbo Poulpito 17"),
    ];

    for (i, (first, last, email, pseudo)) in players.iter().enumerate() {
        let registration = Registration {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            pseudo: pseudo.to_string(),
        };
        if let Err(e) = board.register(&registration) {
            log::warn!("Registration refused: {e}");
            continue;
        }
        let player = PlayerIdentity {
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            pseudo: registration.pseudo,
        };

        // One more run than the cap, to show the limiter kicking in
        for run in 0..=booth_catch::consts::SUBMISSION_CAP as u64 {
            let request = PageRequest::get("/fr/game").with_cookie(&player.to_cookie_header());
            match gate.route(&request, chrono::Utc::now(), &board) {
                Route::Pass => {}
                other => {
                    log::info!("{} turned away: {:?}", player.email, other);
                    break;
                }
            }

            let params = SessionParams {
                skin: Skin::ALL[(i + run as usize) % Skin::ALL.len()],
                difficulty: (run % 3 + 1) as u8,
            };
            let mut session = Session::new(&params, seed + i as u64 * 100 + run);
            session.autoplay = true;
            while session.phase() != GamePhase::Ended {
                if !session.continue_level() {
                    session.advance(1_000);
                }
            }
            session.finish(&mut board, &player);
        }
    }

    match board.top(LEADERBOARD_SIZE) {
        Ok(top) => {
            for (rank, entry) in top.iter().enumerate() {
                println!("{:>2}. {:<24} {:>6}", rank + 1, entry.display_name(), entry.score);
            }
        }
        Err(e) => log::error!("Leaderboard unavailable: {e}"),
    }

    match serde_json::to_string_pretty(&AdminStats::collect(&board)) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize stats: {e}"),
    }
}

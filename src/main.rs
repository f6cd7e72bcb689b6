//! Math Galaxy entry point
//!
//! The browser build wires the engine to the page's DOM. The native build
//! plays a headless demo session so the engine can be exercised from a terminal.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent, PageTransitionEvent,
        Window,
    };

    use math_galaxy::consts::*;
    use math_galaxy::sim::{DestroyEffect, Engine, PlayArea, RenderSink};
    use math_galaxy::{Difficulty, Settings};

    const PARTICLES_PER_BURST: u32 = 12;
    const PARTICLE_LIFETIME_MS: i32 = 700;
    const PARTICLE_SPREAD: f64 = 250.0;
    const DAMAGE_FLASH_MS: i32 = 200;
    const REJECT_SHAKE_MS: i32 = 100;

    /// Run `f` once after `ms` milliseconds
    fn after(window: &Window, ms: i32, f: impl FnOnce() + 'static) {
        let callback = Closure::once_into_js(f);
        if window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)
            .is_err()
        {
            log::warn!("setTimeout failed");
        }
    }

    fn place(el: &HtmlElement, pos: Vec2) {
        let style = el.style();
        let _ = style.set_property("left", &format!("{}px", pos.x));
        let _ = style.set_property("top", &format!("{}px", pos.y));
    }

    /// Renders engine notifications as absolutely positioned divs
    struct DomSink {
        window: Window,
        document: Document,
        area: HtmlElement,
        input: HtmlInputElement,
        asteroids: HashMap<u32, HtmlElement>,
    }

    impl DomSink {
        fn new(window: Window, document: Document) -> Option<Self> {
            let area = document
                .get_element_by_id("game-area")?
                .dyn_into::<HtmlElement>()
                .ok()?;
            let input = document
                .get_element_by_id("player-input")?
                .dyn_into::<HtmlInputElement>()
                .ok()?;
            Some(Self {
                window,
                document,
                area,
                input,
                asteroids: HashMap::new(),
            })
        }

        fn play_area(&self) -> PlayArea {
            let (w, h) = (self.area.client_width(), self.area.client_height());
            PlayArea {
                width: (w > 0).then_some(w as f32),
                height: (h > 0).then_some(h as f32),
            }
        }

        fn create_div(&self, class: &str) -> Option<HtmlElement> {
            let el = self.document.create_element("div").ok()?;
            el.set_class_name(class);
            el.dyn_into::<HtmlElement>().ok()
        }

        /// Particle burst centered on an asteroid. CSS animates `--dx/--dy/--rot`.
        fn explode(&self, pos: Vec2, class: &str) {
            let center = pos + Vec2::splat(OBJECT_SIZE / 2.0);
            for _ in 0..PARTICLES_PER_BURST {
                let Some(particle) = self.create_div(class) else {
                    continue;
                };
                place(&particle, center);

                let dx = (js_sys::Math::random() - 0.5) * PARTICLE_SPREAD;
                let dy = (js_sys::Math::random() - 0.5) * PARTICLE_SPREAD;
                let rot = js_sys::Math::random() * 360.0;
                let style = particle.style();
                let _ = style.set_property("--dx", &format!("{dx:.0}px"));
                let _ = style.set_property("--dy", &format!("{dy:.0}px"));
                let _ = style.set_property("--rot", &format!("{rot:.0}deg"));

                if self.area.append_child(&particle).is_err() {
                    continue;
                }
                after(&self.window, PARTICLE_LIFETIME_MS, move || particle.remove());
            }
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(&self, id: &str, hidden: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("hidden", hidden);
            }
        }

        /// Add `class` to `el`, drop it again after `ms`
        fn pulse_class(&self, el: &HtmlElement, class: &'static str, ms: i32) {
            let _ = el.class_list().add_1(class);
            let el = el.clone();
            after(&self.window, ms, move || {
                let _ = el.class_list().remove_1(class);
            });
        }
    }

    impl RenderSink for DomSink {
        fn clear_objects(&mut self) {
            for (_, el) in self.asteroids.drain() {
                el.remove();
            }
        }

        fn create_object(&mut self, id: u32, pos: Vec2, label: &str, category: &str) {
            let Some(el) = self.create_div(&format!("asteroid {category}")) else {
                log::warn!("Could not create asteroid #{}", id);
                return;
            };
            el.set_text_content(Some(label));
            place(&el, pos);
            if self.area.append_child(&el).is_ok() {
                self.asteroids.insert(id, el);
            }
        }

        fn move_object(&mut self, id: u32, pos: Vec2) {
            if let Some(el) = self.asteroids.get(&id) {
                place(el, pos);
            }
        }

        fn destroy_object(&mut self, id: u32, pos: Vec2, effect: DestroyEffect) {
            if let Some(el) = self.asteroids.remove(&id) {
                el.remove();
            }
            let class = match effect {
                DestroyEffect::Reward => "particle",
                DestroyEffect::NoReward => "particle ember",
            };
            self.explode(pos, class);
        }

        fn flash_damage(&mut self, health: u32) {
            log::debug!("Shields at {}%", health);
            self.pulse_class(&self.area, "flash-red", DAMAGE_FLASH_MS);
        }

        fn reject_input(&mut self) {
            let input: &HtmlElement = &self.input;
            self.pulse_class(input, "shake", REJECT_SHAKE_MS);
        }

        fn show_game_over(&mut self, final_score: u32) {
            self.set_text("final-score", &final_score.to_string());
            self.set_hidden("game-over-screen", false);
        }
    }

    /// Game instance holding engine and page bindings
    struct Game {
        engine: Engine,
        sink: DomSink,
        last_time: Option<f64>,
    }

    impl Game {
        fn frame(&mut self, time: f64) {
            let dt = self
                .last_time
                .map(|last| (time - last).clamp(0.0, MAX_FRAME_MS))
                .unwrap_or(0.0);
            self.last_time = Some(time);

            let area = self.sink.play_area();
            self.engine.advance(dt, area);
            self.engine.dispatch_events(&mut self.sink);
            self.update_hud();
        }

        fn start(&mut self) {
            self.engine.start();
            self.sink.set_hidden("start-screen", true);
            self.sink.set_hidden("game-over-screen", true);
            self.sink.input.set_value("");
            let _ = self.sink.input.focus();
            self.engine.dispatch_events(&mut self.sink);
            self.update_hud();
        }

        fn restart(&mut self) {
            self.engine.restart();
            self.sink.set_hidden("game-over-screen", true);
            self.sink.input.set_value("");
            let _ = self.sink.input.focus();
            self.engine.dispatch_events(&mut self.sink);
            self.update_hud();
        }

        fn submit(&mut self) {
            let raw = self.sink.input.value();
            self.sink.input.set_value("");
            self.engine.submit_answer(&raw);
            self.engine.dispatch_events(&mut self.sink);
            self.update_hud();
        }

        fn update_hud(&self) {
            self.sink.set_text("score", &self.engine.score().to_string());
            self.sink.set_text("health", &self.engine.health().to_string());
        }
    }

    /// Settings from `data-settings` on the play area, then `?difficulty=` from the URL
    fn load_settings(window: &Window, area: &HtmlElement) -> Settings {
        let mut settings = Settings::default();

        if let Some(json) = area.get_attribute("data-settings") {
            match Settings::from_json(&json) {
                Ok(parsed) => settings = parsed,
                Err(e) => log::warn!("Ignoring data-settings: {}", e),
            }
        }

        let search = window.location().search().unwrap_or_default();
        for pair in search.trim_start_matches('?').split('&') {
            if let Some(value) = pair.strip_prefix("difficulty=") {
                match Difficulty::from_str(value) {
                    Some(preset) => settings.apply_preset(preset),
                    None => log::warn!("Unknown difficulty {:?}", value),
                }
            }
        }

        settings
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let Some(sink) = DomSink::new(window.clone(), document.clone()) else {
            log::error!("Page is missing #game-area or #player-input");
            return;
        };
        let settings = load_settings(&window, &sink.area);
        let seed = js_sys::Date::now() as u64;
        log::info!(
            "Math Galaxy starting ({}, seed {})",
            settings.difficulty.as_str(),
            seed
        );

        let game = Rc::new(RefCell::new(Game {
            engine: Engine::new(seed, settings),
            sink,
            last_time: None,
        }));

        setup_answer_input(game.clone());
        setup_buttons(&document, game.clone());
        setup_teardown(&window, game.clone());
        request_animation_frame(game);
    }

    fn setup_answer_input(game: Rc<RefCell<Game>>) {
        let input = game.borrow().sink.input.clone();
        // Submit on Enter only, never per keystroke
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                event.prevent_default();
                game.borrow_mut().submit();
            }
        });
        if input
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::error!("Could not listen for answers");
        }
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Cancel the engine's activities when the page goes away, re-arm them if
    /// the page comes back from the back/forward cache
    fn setup_teardown(window: &Window, game: Rc<RefCell<Game>>) {
        let hide_game = game.clone();
        let on_hide = Closure::<dyn FnMut(_)>::new(move |_event: PageTransitionEvent| {
            hide_game.borrow_mut().engine.shutdown();
        });
        let _ = window.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref());
        on_hide.forget();

        let on_show = Closure::<dyn FnMut(_)>::new(move |event: PageTransitionEvent| {
            if !event.persisted() {
                return;
            }
            let mut game = game.borrow_mut();
            // Don't count the time spent in the cache
            game.last_time = None;
            game.engine.resume();
        });
        let _ = window.add_event_listener_with_callback("pageshow", on_show.as_ref().unchecked_ref());
        on_show.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Math Galaxy (native) starting...");
    log::info!("Browser build: `trunk serve`. Running headless demo instead.");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(2024);
    demo::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless session with a bot gunner
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use math_galaxy::Settings;
    use math_galaxy::sim::{DestroyEffect, Engine, GameEvent, GamePhase, PlayArea};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const FRAME_MS: f64 = 16.0;
    /// The bot fires once per this many frames
    const AIM_FRAMES: u32 = 45;
    /// Chance the bot types the right answer
    const ACCURACY: f64 = 0.85;
    /// Give up after five simulated minutes
    const MAX_FRAMES: u32 = 5 * 60 * 1000 / 16;

    pub fn run(seed: u64) {
        let area = PlayArea::new(600.0, 600.0);
        let mut engine = Engine::new(seed, Settings::default());
        let mut aim = Pcg32::seed_from_u64(seed ^ 0x5eed);
        let (mut hits, mut misses, mut crashes) = (0u32, 0u32, 0u32);

        engine.start();
        for frame in 1..=MAX_FRAMES {
            engine.advance(FRAME_MS, area);

            if frame % AIM_FRAMES == 0 {
                // Aim at whatever is closest to the ship
                let target = engine
                    .problems()
                    .iter()
                    .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                    .map(|p| p.expected_answer);
                if let Some(answer) = target {
                    let typed = if aim.random_bool(ACCURACY) {
                        answer.to_string()
                    } else {
                        (answer + 1).to_string()
                    };
                    engine.submit_answer(&typed);
                }
            }

            for event in engine.drain_events() {
                match event {
                    GameEvent::Destroyed { effect, .. } => match effect {
                        DestroyEffect::Reward => hits += 1,
                        DestroyEffect::NoReward => crashes += 1,
                    },
                    GameEvent::InputRejected => misses += 1,
                    GameEvent::GameOver { final_score } => {
                        log::info!("Game over at frame {} with score {}", frame, final_score);
                    }
                    _ => {}
                }
            }

            if engine.phase() == GamePhase::GameOver {
                break;
            }
        }

        log::info!(
            "Demo finished: score {}, shields {}%, {} hits, {} wrong answers, {} crashes, spawn interval {} ms",
            engine.score(),
            engine.health(),
            hits,
            misses,
            crashes,
            engine.spawn_interval_ms()
        );
        engine.shutdown();
    }
}

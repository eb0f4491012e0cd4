//! Dream Kite entry point
//!
//! Handles platform-specific initialization and runs the flight loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use dream_kite::Tuning;
    use dream_kite::consts::*;
    use dream_kite::sim::{
        DirectionKeys, FlightEvent, FlightPhase, FlightSession, TensionBand, TickInput, TugCommand,
        tick,
    };

    /// Thumb travel (CSS pixels) for a full-strength joystick tug
    const JOYSTICK_RADIUS: f32 = 60.0;

    /// Game instance holding all state
    struct Game {
        session: FlightSession,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Held arrow keys
        keys: DirectionKeys,
        /// Where the current mouse drag began
        drag_start: Option<Vec2>,
        /// Where the current touch began (virtual joystick center)
        touch_origin: Option<Vec2>,
        best_score: u64,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                session: FlightSession::new(seed, Tuning::default()),
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                keys: DirectionKeys::default(),
                drag_start: None,
                touch_origin: None,
                best_score: 0,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.session, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.tug = None;
                self.input.pause = false;
                self.input.restart = false;
                self.input.pickups.clear();

                for event in self.session.drain_events() {
                    self.handle_event(event);
                }
            }
        }

        fn handle_event(&mut self, event: FlightEvent) {
            match event {
                FlightEvent::GameOver { score } => {
                    self.best_score = self.best_score.max(score);
                }
                FlightEvent::ThemeChanged(theme) => {
                    log::debug!("Scenery now {}", theme.as_str());
                }
                FlightEvent::Damaged { amount } => {
                    log::trace!("String damaged by {:.2}", amount);
                }
                _ => {}
            }
        }

        fn restart(&mut self, seed: u64) {
            self.session.reset(seed);
            self.accumulator = 0.0;
            self.input = TickInput::default();
            self.keys = DirectionKeys::default();
            self.drag_start = None;
            self.touch_origin = None;
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let session = &self.session;

            if let Some(el) = document.query_selector("#hud-health .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("{:.0}", session.health.value())));
            }
            if let Some(el) = document.get_element_by_id("health-bar") {
                let class = if session.health.is_warning() {
                    "health-bar warning"
                } else {
                    "health-bar"
                };
                let _ = el.set_attribute("class", class);
                let _ = el.set_attribute(
                    "style",
                    &format!("width: {:.1}%", session.health.fraction() * 100.0),
                );
            }

            if let Some(el) = document.query_selector("#hud-tension .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("{:.1}", session.string.tension)));
            }
            if let Some(el) = document.get_element_by_id("hud-tension") {
                let band = match session.string.band() {
                    TensionBand::Slack => "hud-item slack",
                    TensionBand::Strained => "hud-item strained",
                    TensionBand::Critical => "hud-item critical",
                };
                let _ = el.set_attribute("class", band);
            }
            if let Some(el) = document.query_selector("#hud-length .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("{:.1}", session.string.length())));
            }
            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&session.score.to_string()));
            }

            if let Some(el) = document.get_element_by_id("pause-menu") {
                let class = if session.phase == FlightPhase::Paused {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.get_element_by_id("game-over") {
                if session.is_game_over() {
                    let _ = el.set_attribute("class", "");
                    if let Some(score_el) = document.get_element_by_id("final-score") {
                        score_el.set_text_content(Some(&session.score.to_string()));
                    }
                    if let Some(best_el) = document.get_element_by_id("best-score") {
                        best_el.set_text_content(Some(&self.best_score.to_string()));
                    }
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Dream Kite starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));

        setup_pointer_handlers(&canvas, game.clone());
        setup_touch_handlers(&canvas, game.clone());
        setup_keyboard_handlers(game.clone())?;
        setup_restart_button(&document, game.clone());
        setup_auto_pause(&document, game.clone());

        request_animation_frame(game);

        log::info!("Dream Kite running!");
        Ok(())
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Drag start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.drag_start = Some(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Drag
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if let Some(start) = g.drag_start {
                    let current = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                    g.input.tug = Some(TugCommand::PointerDrag { start, current });
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.drag_start.take().is_some() {
                    g.input.tug = Some(TugCommand::Release);
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// First touch position relative to the canvas
    fn touch_position(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some(Vec2::new(
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        ))
    }

    fn setup_touch_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().touch_origin = touch_position(&canvas_clone, &event);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Virtual joystick: offset from the touch origin
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                let (Some(origin), Some(current)) =
                    (g.touch_origin, touch_position(&canvas_clone, &event))
                else {
                    return;
                };
                let offset = current - origin;
                let angle = offset.y.atan2(offset.x);
                let force = (offset.length() / JOYSTICK_RADIUS).min(1.0);
                g.input.tug = Some(TugCommand::Joystick { angle, force });
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                let mut g = game.borrow_mut();
                g.touch_origin = None;
                g.input.tug = Some(TugCommand::Release);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn arrow_bit(key: &str) -> Option<u8> {
        match key {
            "ArrowUp" => Some(DirectionKeys::UP),
            "ArrowDown" => Some(DirectionKeys::DOWN),
            "ArrowLeft" => Some(DirectionKeys::LEFT),
            "ArrowRight" => Some(DirectionKeys::RIGHT),
            _ => None,
        }
    }

    fn setup_keyboard_handlers(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if let Some(bit) = arrow_bit(&key) {
                    event.prevent_default();
                    g.keys = DirectionKeys::from_bits(g.keys.bits() | bit);
                    g.input.tug = Some(TugCommand::Keys(g.keys));
                    return;
                }
                match key.as_str() {
                    "Escape" => g.input.pause = true,
                    "r" | "R" if g.session.is_game_over() => g.input.restart = true,
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(bit) = arrow_bit(&event.key()) {
                    let mut g = game.borrow_mut();
                    g.keys = DirectionKeys::from_bits(g.keys.bits() & !bit);
                    g.input.tug = Some(TugCommand::Keys(g.keys));
                }
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
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
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
                log::info!("Flight restarted with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut g = game.borrow_mut();
                if g.session.phase == FlightPhase::Flying {
                    g.input.pause = true;
                    log::info!("Auto-paused (tab hidden)");
                }
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use dream_kite::{DifficultyPreset, Tuning};

    env_logger::init();
    log::info!("Dream Kite (native) starting...");
    log::info!("Interactive flight runs in the browser; running a headless demo flight");

    // Usage: dream-kite [seed] [preset | tuning.json]
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        None => Tuning::default(),
        Some(arg) => match DifficultyPreset::from_str(&arg) {
            Some(preset) => Tuning::from_preset(preset),
            None => match Tuning::from_file(&arg) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Failed to load tuning from {}: {}", arg, e);
                    std::process::exit(1);
                }
            },
        },
    };

    demo::run(seed, tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {}

/// Scripted flight with a pseudo-player, used to eyeball balance natively
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use dream_kite::Tuning;
    use dream_kite::consts::SIM_DT;
    use dream_kite::sim::{FlightEvent, FlightSession, Sphere, TickInput, TugCommand, spark_value, tick};
    use glam::Vec3;

    const DEMO_SECONDS: u32 = 180;

    #[derive(Debug, Default)]
    struct FlightLog {
        gusts: u32,
        damage: f32,
        obstacle_hits: u32,
        sparks: u32,
        peak_tension: f32,
    }

    pub fn run(seed: u64, tuning: Tuning) {
        let mut session = FlightSession::new(seed, tuning);
        let mut summary = FlightLog::default();
        let total_ticks = (DEMO_SECONDS as f32 / SIM_DT) as u64;

        for t in 0..total_ticks {
            let input = scripted_input(t, &session);
            tick(&mut session, &input, SIM_DT);
            summary.peak_tension = summary.peak_tension.max(session.string.tension);

            for event in session.drain_events() {
                match event {
                    FlightEvent::GustStarted { .. } => summary.gusts += 1,
                    FlightEvent::Damaged { amount } => summary.damage += amount,
                    FlightEvent::ObstacleHit => summary.obstacle_hits += 1,
                    FlightEvent::PickupCollected { .. } => summary.sparks += 1,
                    FlightEvent::ThemeChanged(theme) => {
                        println!("[{:>6.1}s] entering the {}", session.elapsed, theme.as_str());
                    }
                    FlightEvent::GameOver { score } => {
                        println!("[{:>6.1}s] string snapped, score {}", session.elapsed, score);
                    }
                    _ => {}
                }
            }
            if session.is_game_over() {
                break;
            }
        }

        let kite = session.kite_position();
        println!("\nDemo flight (seed {})", seed);
        println!("  flight time:   {:.1}s", session.elapsed);
        println!("  final kite:    ({:.1}, {:.1}, {:.1})", kite.x, kite.y, kite.z);
        println!("  string length: {:.1}", session.string.length());
        println!("  health:        {:.1}", session.health.value());
        println!("  peak tension:  {:.1}", summary.peak_tension);
        println!("  gusts:         {}", summary.gusts);
        println!("  damage taken:  {:.1}", summary.damage);
        println!("  obstacle hits: {}", summary.obstacle_hits);
        println!("  sparks:        {} (score {})", summary.sparks, session.score);
    }

    /// Tug in bursts, collect a spark every few seconds, and drift a cloud
    /// through the string now and then
    fn scripted_input(t: u64, session: &FlightSession) -> TickInput {
        let secs = t as f32 * SIM_DT;
        let mut input = TickInput::default();

        match t % 240 {
            0 => {
                input.tug = Some(TugCommand::Joystick {
                    angle: secs.sin() * std::f32::consts::PI,
                    force: 0.7,
                })
            }
            60 => input.tug = Some(TugCommand::Release),
            _ => {}
        }

        if t % 300 == 150 {
            input.pickups.push(spark_value((secs * 0.37).fract()));
        }

        if t % 1200 == 600 {
            let midpoint = session.kite_position() * 0.5;
            input.obstacles.push(Sphere::new(midpoint + Vec3::X * 0.5, 1.5));
        }

        input
    }
}

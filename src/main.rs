//! Arcade Loop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

    use arcade_loop::Settings;
    use arcade_loop::audio::WebSynth;
    use arcade_loop::error::RenderError;
    use arcade_loop::platform::{FrameScheduler, GameLoop, Key, PointerButton};
    use arcade_loop::renderer::{Hud, PresentOptions, RenderState, Viewport, build_scene};
    use arcade_loop::sim::GamePhase;

    /// requestAnimationFrame-backed scheduler
    struct WebScheduler {
        game: Weak<RefCell<WebGame>>,
    }

    impl FrameScheduler for WebScheduler {
        type Handle = i32;

        fn request_frame(&mut self) -> Option<i32> {
            let window = web_sys::window()?;
            let game = self.game.clone();
            let closure = Closure::once(move |time: f64| frame(game, time));
            let handle = window
                .request_animation_frame(closure.as_ref().unchecked_ref())
                .ok()?;
            closure.forget();
            Some(handle)
        }

        fn cancel_frame(&mut self, handle: i32) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
    }

    /// Everything the page keeps alive between frames
    struct WebGame {
        game: GameLoop<WebScheduler, WebSynth>,
        settings: Settings,
        render_state: Option<RenderState>,
        /// Canvas size in CSS pixels
        viewport: Viewport,
        last_hud: Option<Hud>,
    }

    impl WebGame {
        fn resize(&mut self, canvas: &HtmlCanvasElement) {
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let client_w = canvas.client_width().max(0) as f32;
            let client_h = canvas.client_height().max(0) as f32;
            let width = (client_w as f64 * dpr) as u32;
            let height = (client_h as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);

            self.viewport = Viewport::new(client_w, client_h);
            self.game.set_screen_center(self.viewport.center());
            if let Some(render_state) = &mut self.render_state {
                render_state.resize(width, height);
            }
        }

        fn render(&mut self) {
            let options = PresentOptions::from_settings(&self.settings);
            let Some(scene) = build_scene(&self.game.state, self.viewport, options) else {
                return;
            };
            if let Some(render_state) = &mut self.render_state {
                match render_state.render(&scene) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
            self.update_hud(scene.hud);
        }

        /// Push HUD values into the DOM, touching only what changed
        fn update_hud(&mut self, hud: Hud) {
            if self.last_hud.as_ref() == Some(&hud) {
                return;
            }
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            set_bar(&document, "hp-bar", hud.health);
            set_bar(&document, "stamina-bar", hud.stamina);
            set_bar(&document, "heat-bar", hud.heat);
            set_bar(&document, "xp-bar", hud.xp);
            set_text(&document, "score", &hud.score.to_string());
            set_text(&document, "wave", &hud.wave.to_string());
            set_text(&document, "level", &hud.level.to_string());
            if let Some(el) = document.get_element_by_id("timer") {
                match hud.time_left {
                    Some(secs) => {
                        el.set_text_content(Some(&format!("{}:{:02}", secs / 60, secs % 60)));
                        let _ = el.set_attribute("class", "");
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }

            if let Some(el) = document.get_element_by_id("heat-bar") {
                let class = if hud.overheated { "bar overheated" } else { "bar" };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.get_element_by_id("banner") {
                let banner = if let Some(error) = self.game.halted() {
                    Some((format!("ERROR: {} - PRESS RESTART", error), 1.0))
                } else {
                    hud.banner.clone()
                };
                match banner {
                    Some((text, alpha)) => {
                        el.set_text_content(Some(&text));
                        let _ = el.set_attribute("class", "");
                        if let Ok(el) = el.dyn_into::<HtmlElement>() {
                            let _ = el.style().set_property("opacity", &format!("{:.2}", alpha));
                        }
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }

            for (id, phase) in [
                ("start-btn", GamePhase::Menu),
                ("restart-btn", GamePhase::GameOver),
            ] {
                if let Some(el) = document.get_element_by_id(id) {
                    let class = if hud.phase == phase || (id == "restart-btn" && self.game.halted().is_some()) {
                        ""
                    } else {
                        "hidden"
                    };
                    let _ = el.set_attribute("class", class);
                }
            }

            self.last_hud = Some(hud);
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_bar(document: &Document, id: &str, ratio: f32) {
        if let Some(el) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = el
                .style()
                .set_property("width", &format!("{:.1}%", ratio.clamp(0.0, 1.0) * 100.0));
        }
    }

    /// One animation frame: simulate, draw, refresh the HUD
    fn frame(game: Weak<RefCell<WebGame>>, time: f64) {
        let Some(game) = game.upgrade() else { return };
        let mut g = game.borrow_mut();
        g.game.on_frame(time);
        g.render();
    }

    fn seed() -> u64 {
        js_sys::Date::now() as u64
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("logger init failed: {}", e).into());
        }

        log::info!("Arcade Loop starting...");

        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element; nothing to draw into");
            return;
        };

        let settings = Settings::load();
        let seed = seed();
        let game = Rc::new_cyclic(|weak: &Weak<RefCell<WebGame>>| {
            let scheduler = WebScheduler { game: weak.clone() };
            RefCell::new(WebGame {
                game: GameLoop::new(&settings, seed, scheduler, WebSynth::new()),
                settings: settings.clone(),
                render_state: None,
                viewport: Viewport::new(0.0, 0.0),
                last_hud: None,
            })
        });
        game.borrow_mut().resize(&canvas);

        log::info!("Game initialized with seed: {}", seed);

        // The simulation runs without a GPU; only drawing is skipped
        match init_renderer(&canvas).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("WebGPU unavailable, running without a canvas: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_joystick(&document, game.clone());
        setup_buttons(&document, game.clone());
        setup_lifecycle(&canvas, game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Menu frames run until the player starts
        game.borrow_mut().game.boot();

        log::info!("Arcade Loop running!");
    }

    async fn init_renderer(canvas: &HtmlCanvasElement) -> Result<RenderState, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(surface, &adapter, canvas.width(), canvas.height()).await
    }

    fn add_listener(
        target: &web_sys::EventTarget,
        kind: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else { return };

        // Keyboard
        {
            let game = game.clone();
            add_listener(&window, "keydown", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
                let Some(key) = Key::from_code(&event.code()) else { return };
                event.prevent_default();
                let mut web = game.borrow_mut();
                let g = &mut web.game;
                match key {
                    Key::Start if g.state.phase == GamePhase::GameOver || g.halted().is_some() => {
                        g.restart(seed())
                    }
                    Key::Start => g.start(),
                    _ => {
                        g.user_gesture();
                        g.input.key_down(key);
                    }
                }
            });
        }
        {
            let game = game.clone();
            add_listener(&window, "keyup", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
                if let Some(key) = Key::from_code(&event.code()) {
                    game.borrow_mut().game.input.key_up(key);
                }
            });
        }

        // Mouse aim
        {
            let game = game.clone();
            add_listener(canvas, "mousemove", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
                let at = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut().game.input.pointer_moved(at);
            });
        }
        {
            let game = game.clone();
            add_listener(canvas, "mouseleave", move |_event: web_sys::Event| {
                game.borrow_mut().game.input.pointer_left();
            });
        }

        // Mouse buttons: primary fires, secondary triggers the skill
        {
            let game = game.clone();
            add_listener(canvas, "mousedown", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
                if let Some(button) = PointerButton::from_index(event.button()) {
                    let mut g = game.borrow_mut();
                    g.game.user_gesture();
                    g.game.input.button_down(button);
                }
            });
        }
        {
            let game = game.clone();
            add_listener(&window, "mouseup", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
                if let Some(button) = PointerButton::from_index(event.button()) {
                    game.borrow_mut().game.input.button_up(button);
                }
            });
        }
        add_listener(canvas, "contextmenu", |event: web_sys::Event| {
            event.prevent_default();
        });
    }

    /// Virtual joystick on `#joystick-zone`, knob drawn by `#joystick-knob`
    fn setup_joystick(document: &Document, game: Rc<RefCell<WebGame>>) {
        let Some(zone) = document
            .get_element_by_id("joystick-zone")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let knob = document
            .get_element_by_id("joystick-knob")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        let move_knob = move |offset: Vec2| {
            if let Some(knob) = &knob {
                let _ = knob.style().set_property(
                    "transform",
                    &format!("translate({:.1}px, {:.1}px)", offset.x, offset.y),
                );
            }
        };

        {
            let game = game.clone();
            let zone_el = zone.clone();
            add_listener(&zone, "touchstart", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else { return };
                event.prevent_default();
                let Some(touch) = event.changed_touches().get(0) else { return };
                let rect = zone_el.get_bounding_client_rect();
                let center = Vec2::new(
                    (rect.left() + rect.width() / 2.0) as f32,
                    (rect.top() + rect.height() / 2.0) as f32,
                );
                let at = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                let mut g = game.borrow_mut();
                g.game.user_gesture();
                g.game.input.joystick.begin(touch.identifier(), center, at);
            });
        }
        {
            let game = game.clone();
            let move_knob = move_knob.clone();
            add_listener(&zone, "touchmove", move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else { return };
                event.prevent_default();
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    if let Some(touch) = touches.get(i) {
                        let at = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                        g.game.input.joystick.update(touch.identifier(), at);
                    }
                }
                move_knob(g.game.input.joystick.knob_offset());
            });
        }
        for kind in ["touchend", "touchcancel"] {
            let game = game.clone();
            let move_knob = move_knob.clone();
            add_listener(&zone, kind, move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else { return };
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    if let Some(touch) = touches.get(i) {
                        g.game.input.joystick.end(touch.identifier());
                    }
                }
                move_knob(g.game.input.joystick.knob_offset());
            });
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<WebGame>>) {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            add_listener(&btn, "click", move |_event: web_sys::Event| {
                game.borrow_mut().game.start();
            });
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let game = game.clone();
            add_listener(&btn, "click", move |_event: web_sys::Event| {
                let seed = seed();
                game.borrow_mut().game.restart(seed);
                log::info!("Game restarted with seed: {}", seed);
            });
        }

        if let Some(btn) = document.get_element_by_id("pause-btn") {
            add_listener(&btn, "click", move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                g.game.user_gesture();
                g.game.toggle_pause();
            });
        }
    }

    /// Resize, focus and page lifetime handling
    fn setup_lifecycle(canvas: &HtmlCanvasElement, game: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        {
            let game = game.clone();
            let canvas = canvas.clone();
            add_listener(&window, "resize", move |_event: web_sys::Event| {
                game.borrow_mut().resize(&canvas);
            });
        }

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            add_listener(&document, "visibilitychange", move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().game.auto_pause();
                    log::info!("Auto-paused (tab hidden)");
                }
            });
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            add_listener(&window, "blur", move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                g.game.auto_pause();
                if g.settings.mute_on_blur {
                    g.game.audio.set_muted(true);
                }
            });
        }
        {
            let game = game.clone();
            add_listener(&window, "focus", move |_event: web_sys::Event| {
                game.borrow_mut().game.audio.set_muted(false);
            });
        }

        add_listener(&window, "pagehide", move |_event: web_sys::Event| {
            game.borrow_mut().game.teardown();
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless run: scripted input through the same loop the browser drives
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arcade_loop::Settings;
    use arcade_loop::audio::NullSynth;
    use arcade_loop::platform::{GameLoop, Key, ManualScheduler};
    use arcade_loop::renderer::{PresentOptions, Viewport, build_scene};

    env_logger::init();
    log::info!("Arcade Loop (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    let settings = Settings::load();
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xA4CADE);
    let mut game = GameLoop::new(&settings, seed, ManualScheduler::default(), NullSynth::default());
    game.set_screen_center(glam::Vec2::new(400.0, 300.0));
    game.start();

    let viewport = Viewport::new(800.0, 600.0);
    let options = PresentOptions::from_settings(&settings);
    let mut timestamp = 0.0;

    // Ten simulated minutes at 60 Hz, strafing and firing
    for frame in 0..36_000u32 {
        if !game.is_scheduled() {
            break;
        }
        let key = if (frame / 120) % 2 == 0 { Key::Left } else { Key::Right };
        game.input.key_up(Key::Left);
        game.input.key_up(Key::Right);
        game.input.key_down(key);
        game.input.key_down(Key::Fire);
        if frame % 300 == 0 {
            game.input.press(Key::Skill);
        }

        game.on_frame(timestamp);
        timestamp += 1000.0 / 60.0;

        if frame % 600 == 0 {
            let draws = build_scene(&game.state, viewport, options).map_or(0, |s| s.commands.len());
            let s = &game.state.session;
            log::info!(
                "t={:>5.1}s wave={} level={} score={} hp={:.0} enemies={} draws={}",
                s.elapsed,
                s.wave,
                s.level,
                s.score,
                game.state.world.player.hp,
                game.state.enemy_count(),
                draws
            );
        }
    }

    if let Some(error) = game.halted() {
        log::error!("Run halted: {}", error);
    }
    let s = &game.state.session;
    println!(
        "phase={:?} wave={} level={} kills={} score={} elapsed={:.1}s",
        game.state.phase, s.wave, s.level, s.kills, s.score, s.elapsed
    );
    game.teardown();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

//! Token Rush entry point
//!
//! On the web this hosts the canvas, input and frame loop; the surrounding
//! page validates the stake and calls `start_round`. Natively it plays one
//! headless round on autopilot and replays it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use token_rush::audio::{AudioManager, cues_for};
    use token_rush::input::InputAdapter;
    use token_rush::renderer::{Effects, MeshSurface, RenderState, paint};
    use token_rush::settlement::Settlement;
    use token_rush::{
        DeviceProfile, FrameStatus, LoopHandle, OutcomeReport, RoundController, RoundPhase, RoundRequest,
        SettlementError, Settings,
    };

    /// Session issued by the backend when it accepted the stake
    #[derive(Debug, Clone)]
    struct Session {
        id: String,
        auth_token: String,
    }

    /// Posts the outcome to the backend without blocking the frame loop
    struct HttpSettlement {
        api_base: String,
        session: Rc<RefCell<Option<Session>>>,
        /// Session each undelivered report belongs to, keyed by replay digest
        owners: Rc<RefCell<HashMap<String, Session>>>,
        /// Requests that failed after dispatch, handed back through `poll_failures`
        failed: Rc<RefCell<Vec<OutcomeReport>>>,
    }

    fn js_err(err: JsValue) -> SettlementError {
        SettlementError::Unavailable(format!("{:?}", err))
    }

    impl Settlement for HttpSettlement {
        fn submit(&mut self, report: &OutcomeReport) -> Result<(), SettlementError> {
            // A retried report keeps the session it was played under
            let owner = self.owners.borrow().get(&report.replay_digest).cloned();
            let Some(session) = owner.or_else(|| self.session.borrow().clone()) else {
                return Err(SettlementError::Unavailable("no active session".into()));
            };
            self.owners
                .borrow_mut()
                .insert(report.replay_digest.clone(), session.clone());
            let body = serde_json::json!({
                "sessionId": session.id,
                "result": report.outcome.as_str(),
                "ticksElapsed": report.ticks_elapsed,
                "replayDigest": report.replay_digest,
            })
            .to_string();

            let headers = web_sys::Headers::new().map_err(js_err)?;
            headers.set("Content-Type", "application/json").map_err(js_err)?;
            headers
                .set("Authorization", &format!("Bearer {}", session.auth_token))
                .map_err(js_err)?;
            let init = web_sys::RequestInit::new();
            init.set_method("POST");
            init.set_headers(&headers);
            init.set_body(&JsValue::from_str(&body));
            let url = format!("{}/game/result", self.api_base);
            let request = web_sys::Request::new_with_str_and_init(&url, &init).map_err(js_err)?;
            let window = web_sys::window().ok_or_else(|| SettlementError::Unavailable("no window".into()))?;
            let promise = window.fetch_with_request(&request);

            let failed = self.failed.clone();
            let owners = self.owners.clone();
            let report = report.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let delivered = match JsFuture::from(promise).await {
                    Ok(resp) => {
                        let resp: web_sys::Response = resp.unchecked_into();
                        if !resp.ok() {
                            log::warn!("Settlement rejected: HTTP {}", resp.status());
                        }
                        resp.ok()
                    }
                    Err(e) => {
                        log::warn!("Settlement request failed: {:?}", e);
                        false
                    }
                };
                if delivered {
                    log::info!("Outcome settled for session {}", session.id);
                    owners.borrow_mut().remove(&report.replay_digest);
                } else {
                    failed.borrow_mut().push(report);
                }
            });
            Ok(())
        }

        fn poll_failures(&mut self) -> Vec<OutcomeReport> {
            std::mem::take(&mut *self.failed.borrow_mut())
        }
    }

    /// Game instance holding all state
    struct Game {
        rounds: RoundController,
        input: InputAdapter,
        effects: Effects,
        mesh: MeshSurface,
        render_state: Option<RenderState>,
        audio: AudioManager,
        settings: Settings,
        device: DeviceProfile,
        arena: Vec2,
        session: Rc<RefCell<Option<Session>>>,
    }

    thread_local! {
        static GAME: RefCell<Option<Game>> = const { RefCell::new(None) };
    }

    fn with_game<T>(f: impl FnOnce(&mut Game) -> T) -> Option<T> {
        GAME.with(|game| game.borrow_mut().as_mut().map(f))
    }

    impl Game {
        fn frame(&mut self, handle: LoopHandle, time: f64) -> FrameStatus {
            self.rounds.poll_settlement();
            let status = self.rounds.frame(handle, time, &mut self.input);
            if status == FrameStatus::Stale {
                return status;
            }

            for event in self.rounds.drain_events() {
                for cue in cues_for(&event) {
                    self.audio.play(cue);
                }
                self.effects.apply(&event, &self.settings);
            }

            if let Some(state) = self.rounds.state() {
                if self.rounds.phase() != RoundPhase::Paused {
                    self.effects.update(state, &self.settings);
                }
                paint(
                    &mut self.mesh,
                    state,
                    &self.effects,
                    &self.settings,
                    self.rounds.countdown_display(),
                );
                render(&mut self.render_state, &self.mesh);
            }

            if let FrameStatus::Finished(report) = &status {
                show_result(report);
            }
            self.update_hud();
            status
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(el) = document.query_selector("#hud-timer .hud-value").ok().flatten() {
                let remaining = self.rounds.timer_remaining().unwrap_or(0.0);
                el.set_text_content(Some(&format!("{:.1}", remaining)));
            }
            if let Some(state) = self.rounds.state() {
                if let Some(el) = document.query_selector("#hud-tokens .hud-value").ok().flatten() {
                    el.set_text_content(Some(&format!(
                        "{}/{}",
                        state.collected_count(),
                        state.rewards.len()
                    )));
                }
            }
            if let Some(el) = document.get_element_by_id("pause-menu") {
                let class = if self.rounds.phase() == RoundPhase::Paused { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    fn render(render_state: &mut Option<RenderState>, mesh: &MeshSurface) {
        let Some(render_state) = render_state else { return };
        match render_state.render(mesh) {
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

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    fn show_result(report: &OutcomeReport) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("result-text"))
        {
            let text = match report.outcome {
                token_rush::Outcome::Win => "YOU WIN!",
                token_rush::Outcome::Lose => "YOU LOSE!",
            };
            el.set_text_content(Some(text));
        }
        set_hidden("result-overlay", false);
    }

    fn schedule(handle: LoopHandle) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| game_loop(handle, time));
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(handle: LoopHandle, time: f64) {
        if let Some(FrameStatus::Continue) = with_game(|g| g.frame(handle, time)) {
            schedule(handle);
        }
    }

    /// Called by the page once the backend accepted the stake
    #[wasm_bindgen]
    pub fn start_round(session_id: String, auth_token: String) -> Result<(), JsValue> {
        let handle = with_game(|g| {
            if let Err(e) = g.rounds.retry_settlement() {
                log::warn!("{} earlier result(s) still unsettled: {}", g.rounds.unsettled_reports().len(), e);
            }
            let validated = !session_id.is_empty();
            *g.session.borrow_mut() = validated.then(|| Session {
                id: session_id,
                auth_token,
            });
            let request = RoundRequest {
                stake_validated: validated,
                ..RoundRequest::new(g.device, g.arena.x, g.arena.y, js_sys::Date::now() as u64)
            };
            let handle = g.rounds.start_round(&request)?;
            g.input.reset();
            g.effects.clear();
            g.audio.resume();
            Ok::<_, token_rush::RoundError>(handle)
        })
        .ok_or_else(|| JsValue::from_str("game not initialized"))?
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        set_hidden("result-overlay", true);
        schedule(handle);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn toggle_pause() {
        with_game(|g| {
            let result = match g.rounds.phase() {
                RoundPhase::Active => g.rounds.pause(),
                RoundPhase::Paused => g.rounds.resume(),
                _ => Ok(()),
            };
            if let Err(e) = result {
                log::warn!("{}", e);
            }
        });
    }

    #[wasm_bindgen]
    pub fn watch_replay() {
        let handle = with_game(|g| match g.rounds.start_replay() {
            Ok(handle) => {
                g.effects.clear();
                handle
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        })
        .flatten();
        if let Some(handle) = handle {
            set_hidden("result-overlay", true);
            schedule(handle);
        }
    }

    /// Re-send results whose settlement failed; returns how many are still pending
    #[wasm_bindgen]
    pub fn retry_settlement() -> usize {
        with_game(|g| {
            if let Err(e) = g.rounds.retry_settlement() {
                log::warn!("{}", e);
            }
            g.rounds.unsettled_reports().len()
        })
        .unwrap_or(0)
    }

    #[wasm_bindgen]
    pub fn toggle_mute() {
        with_game(|g| {
            g.settings.muted = !g.settings.muted;
            g.audio.set_muted(g.settings.muted);
            g.settings.save();
        });
    }

    #[wasm_bindgen]
    pub fn close_result() {
        with_game(|g| {
            if let Err(e) = g.rounds.dismiss() {
                log::warn!("{}", e);
            }
        });
        set_hidden("result-overlay", true);
    }

    /// Canvas-relative position of the first touch
    fn touch_pos(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some(Vec2::new(
            touch.client_x() as f32 - rect.left() as f32,
            touch.client_y() as f32 - rect.top() as f32,
        ))
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement) {
        // Mouse hover steers the player
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                with_game(|g| {
                    g.input
                        .pointer_moved(Vec2::new(event.offset_x() as f32, event.offset_y() as f32))
                });
            });
            let _ = canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start grabs the player if close enough
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(pos) = touch_pos(&canvas_clone, &event) else { return };
                with_game(|g| {
                    if let Some(state) = g.rounds.state() {
                        let player = state.player.clone();
                        let slop = state.config.drag_grab_slop;
                        g.input.touch_start(pos, &player, slop);
                    }
                });
            });
            let _ = canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_pos(&canvas_clone, &event) {
                    with_game(|g| g.input.touch_move(pos));
                }
            });
            let _ = canvas.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                with_game(|g| g.input.touch_end());
            });
            let _ = canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            let _ = canvas.add_event_listener_with_callback("touchcancel", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                match event.key().as_str() {
                    "Escape" | "p" | "P" => toggle_pause(),
                    "r" | "R" => watch_replay(),
                    "m" | "M" => toggle_mute(),
                    _ => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons() {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        for (id, action) in [
            ("replay-btn", watch_replay as fn()),
            ("close-btn", close_result as fn()),
            ("resume-btn", toggle_pause as fn()),
        ] {
            if let Some(btn) = document.get_element_by_id(id) {
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| action());
                let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Token Rush starting...");

        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };

        // Arena is the canvas in CSS pixels; the backing store is DPR-scaled
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let arena = Vec2::new(client_w as f32, client_h as f32);

        let device = window
            .navigator()
            .user_agent()
            .map(|ua| DeviceProfile::from_user_agent(&ua))
            .unwrap_or_default();
        log::info!("Device profile: {}", device.as_str());

        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let render_state = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                match instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await
                {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        RenderState::new(surface, &adapter, width, height, arena)
                            .await
                            .map_err(|e| log::error!("Failed to create device: {}", e))
                            .ok()
                    }
                    Err(e) => {
                        log::error!("Failed to get adapter: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                None
            }
        };

        let session = Rc::new(RefCell::new(None));
        let api_base = document
            .body()
            .and_then(|b| b.get_attribute("data-api-base"))
            .unwrap_or_default();
        let settlement = HttpSettlement {
            api_base,
            session: session.clone(),
            owners: Rc::new(RefCell::new(HashMap::new())),
            failed: Rc::new(RefCell::new(Vec::new())),
        };

        let game = Game {
            rounds: RoundController::new(Box::new(settlement)),
            input: InputAdapter::new(),
            effects: Effects::new(js_sys::Date::now() as u64),
            mesh: MeshSurface::new(settings.quality.circle_segments()),
            render_state,
            audio,
            settings,
            device,
            arena,
            session,
        };
        GAME.with(|g| *g.borrow_mut() = Some(game));

        setup_input_handlers(&canvas);
        setup_buttons();

        log::info!("Token Rush ready, waiting for a validated stake");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Token Rush (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut device = token_rush::DeviceProfile::Desktop;
    let mut seed = 42;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--device" => match iter.next().and_then(|s| token_rush::DeviceProfile::from_str(s)) {
                Some(profile) => device = profile,
                None => log::warn!("Unknown device profile, keeping {}", device.as_str()),
            },
            "--seed" => match iter.next().and_then(|s| s.parse().ok()) {
                Some(value) => seed = value,
                None => log::warn!("Invalid seed, keeping {}", seed),
            },
            other => log::warn!("Ignoring argument {}", other),
        }
    }

    match headless::run(device, seed) {
        Ok(report) => println!(
            "{} after {} ticks, replay {}",
            report.outcome.as_str(),
            report.ticks_elapsed,
            report.replay_digest
        ),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use token_rush::input::{InputAdapter, autopilot_target};
    use token_rush::renderer::{Effects, MeshSurface, paint};
    use token_rush::settlement::LogSettlement;
    use token_rush::{DeviceProfile, FrameStatus, OutcomeReport, RoundController, RoundError, RoundRequest, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Play one round on autopilot, then replay it
    pub fn run(device: DeviceProfile, seed: u64) -> Result<OutcomeReport, RoundError> {
        let mut rounds = RoundController::new(Box::new(LogSettlement::new()));
        let mut input = InputAdapter::new();
        let settings = Settings::load();
        let mut effects = Effects::new(seed);
        let mut mesh = MeshSurface::new(settings.quality.circle_segments());

        let handle = rounds.start_round(&RoundRequest::new(device, 800.0, 600.0, seed))?;
        let mut now = 0.0;
        let report = loop {
            if let Some(target) = rounds.state().and_then(autopilot_target) {
                input.pointer_moved(target);
            }
            let status = rounds.frame(handle, now, &mut input);
            for event in rounds.drain_events() {
                effects.apply(&event, &settings);
            }
            if let Some(state) = rounds.state() {
                effects.update(state, &settings);
                paint(&mut mesh, state, &effects, &settings, rounds.countdown_display());
            }
            match status {
                FrameStatus::Continue => now += FRAME_MS,
                FrameStatus::Finished(report) => break report,
                FrameStatus::Stopped | FrameStatus::Stale => {
                    return Err(RoundError::InvalidPhase {
                        operation: "finish the round",
                        phase: rounds.phase().as_str(),
                    });
                }
            }
        };
        log::info!("Last frame tessellated to {} vertices", mesh.vertices.len());

        if let Some(handle) = rounds.start_replay()? {
            let mut frames = 0;
            while rounds.frame(handle, now, &mut input) == FrameStatus::Continue {
                now += FRAME_MS;
                frames += 1;
            }
            log::info!("Replay played in {} frames", frames);
        }
        Ok(report)
    }
}

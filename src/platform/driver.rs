//! Host frame-loop driver
//!
//! [`GameLoop`] ties together the game state, the input sampler, audio and a
//! [`FrameScheduler`] (requestAnimationFrame in the browser, a manual queue in
//! tests and the native demo). Each host frame runs exactly one tick.

use glam::Vec2;

use super::input::{InputSampler, Key};
use crate::audio::{AudioManager, SynthBackend};
use crate::consts::FIRST_FRAME_DT;
use crate::error::SimError;
use crate::settings::Settings;
use crate::sim::{FrameReport, GamePhase, GameState, tick};

/// Host frame-callback source
pub trait FrameScheduler {
    type Handle: Copy + std::fmt::Debug;

    /// Ask for one callback on the next frame; `None` if the host refused
    fn request_frame(&mut self) -> Option<Self::Handle>;

    /// Cancel a previously requested callback
    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Scheduler that only records requests; the owner delivers frames by hand
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    next: u32,
    /// Outstanding request, if any
    pub pending: Option<u32>,
    pub requested: u32,
    pub cancelled: u32,
}

impl FrameScheduler for ManualScheduler {
    type Handle = u32;

    fn request_frame(&mut self) -> Option<u32> {
        self.next += 1;
        self.requested += 1;
        self.pending = Some(self.next);
        Some(self.next)
    }

    fn cancel_frame(&mut self, handle: u32) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
        self.cancelled += 1;
    }
}

/// Owns everything one running game needs
pub struct GameLoop<S: FrameScheduler, B: SynthBackend> {
    pub state: GameState,
    pub input: InputSampler,
    pub audio: AudioManager<B>,
    scheduler: S,
    pending: Option<S::Handle>,
    last_timestamp: Option<f64>,
    /// Where the player is drawn on screen (pointer aim origin)
    screen_center: Vec2,
    halted: Option<SimError>,
    last_report: FrameReport,
}

impl<S: FrameScheduler, B: SynthBackend> GameLoop<S, B> {
    pub fn new(settings: &Settings, seed: u64, scheduler: S, backend: B) -> Self {
        Self {
            state: GameState::new(seed, settings.tuning.clone()),
            input: InputSampler::new(),
            audio: AudioManager::new(backend, settings),
            scheduler,
            pending: None,
            last_timestamp: None,
            screen_center: Vec2::ZERO,
            halted: None,
            last_report: FrameReport::default(),
        }
    }

    pub fn set_screen_center(&mut self, center: Vec2) {
        self.screen_center = center;
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Error that stopped the loop, if any
    pub fn halted(&self) -> Option<&SimError> {
        self.halted.as_ref()
    }

    pub fn last_report(&self) -> &FrameReport {
        &self.last_report
    }

    /// Begin the loop without starting a session (menu shows)
    pub fn boot(&mut self) {
        self.ensure_scheduled();
    }

    /// Start action from a user gesture: activates audio and queues `Start`
    pub fn start(&mut self) {
        self.user_gesture();
        self.input.press(Key::Start);
        self.ensure_scheduled();
    }

    /// Any user gesture is a chance to (re)activate audio
    pub fn user_gesture(&mut self) {
        self.audio.activate();
    }

    /// Toggle pause on the next frame
    pub fn toggle_pause(&mut self) {
        self.input.press(Key::Pause);
    }

    /// Pause if currently playing (focus lost, tab hidden)
    pub fn auto_pause(&mut self) {
        self.input.release_all();
        if self.state.phase == GamePhase::Playing {
            self.input.press(Key::Pause);
            log::info!("Auto-paused");
        }
    }

    /// Fresh run. A halted loop gets a brand new state first.
    pub fn restart(&mut self, seed: u64) {
        if self.halted.take().is_some() {
            log::info!("Recovering halted loop with seed {}", seed);
            let tuning = self.state.tuning.clone();
            self.state = GameState::new(seed, tuning);
        }
        self.last_timestamp = None;
        self.start();
    }

    /// One host frame at `timestamp_ms` (monotonic milliseconds)
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Option<&FrameReport> {
        self.pending = None;
        if self.halted.is_some() {
            return None;
        }

        let dt = match self.last_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0) as f32,
            None => FIRST_FRAME_DT,
        };
        self.last_timestamp = Some(timestamp_ms);

        // Next frame is requested up front and cancelled if this one ends the run
        self.ensure_scheduled();

        let input = self.input.sample(self.screen_center);
        match tick(&mut self.state, &input, dt) {
            Ok(report) => {
                self.audio.play_events(&report.events, timestamp_ms / 1000.0);
                if self.state.phase == GamePhase::GameOver {
                    self.cancel_pending();
                    if report.has(crate::sim::GameEvent::GameOver) {
                        log::info!("Loop stopped at game over");
                    }
                }
                self.last_report = report;
                Some(&self.last_report)
            }
            Err(e) => {
                self.halt(e);
                None
            }
        }
    }

    fn halt(&mut self, error: SimError) {
        log::error!("Simulation halted: {}", error);
        self.cancel_pending();
        self.halted = Some(error);
    }

    /// Stop for good: cancel the pending frame and release audio
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.audio.suspend();
        self.input.release_all();
        log::info!("Loop torn down");
    }

    fn ensure_scheduled(&mut self) {
        if self.pending.is_none() && self.halted.is_none() {
            self.pending = self.scheduler.request_frame();
            if self.pending.is_none() {
                log::warn!("Host refused a frame request");
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

//! Audio system
//!
//! Procedurally generated sound effects - no external files needed!
//!
//! Each [`SoundEffect`] is a short list of [`Tone`]s. The [`AudioManager`]
//! throttles repeats per effect and hands tones to a [`SynthBackend`]: Web
//! Audio oscillators in the browser, a silent sink natively.

use std::collections::HashMap;

use crate::error::AudioError;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player weapon volley
    Shoot,
    /// Enemy wounded
    Hit,
    /// Enemy destroyed
    EnemyDeath,
    /// Player took damage
    Hurt,
    /// Pickup collected
    Collect,
    /// Level up arpeggio
    LevelUp,
    /// New wave announcement
    WaveStart,
    /// Weapon overheated
    Warning,
    /// Session started
    Start,
    /// Game over
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator note with an exponential fade-out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Waveform,
    /// Start frequency in Hz
    pub freq: f32,
    /// Frequency change reached at the end of the note (0 for none)
    pub slide: f32,
    /// Delay after the trigger, seconds
    pub offset: f64,
    pub duration: f64,
    /// Peak gain before master/sfx volume
    pub volume: f32,
}

const fn tone(wave: Waveform, freq: f32, slide: f32, offset: f64, duration: f64, volume: f32) -> Tone {
    Tone {
        wave,
        freq,
        slide,
        offset,
        duration,
        volume,
    }
}

use Waveform::*;

const SHOOT: [Tone; 1] = [tone(Triangle, 400.0, -300.0, 0.0, 0.1, 0.15)];
const HIT: [Tone; 1] = [tone(Sawtooth, 100.0, -50.0, 0.0, 0.1, 0.12)];
const ENEMY_DEATH: [Tone; 1] = [tone(Square, 150.0, -100.0, 0.0, 0.2, 0.15)];
const HURT: [Tone; 2] = [
    tone(Sawtooth, 200.0, -150.0, 0.0, 0.1, 0.25),
    tone(Sine, 60.0, 0.0, 0.0, 0.12, 0.3),
];
const COLLECT: [Tone; 1] = [tone(Sine, 800.0, 400.0, 0.0, 0.3, 0.18)];
const LEVEL_UP: [Tone; 3] = [
    tone(Sine, 440.0, 0.0, 0.0, 0.5, 0.15),
    tone(Sine, 554.0, 0.0, 0.1, 0.5, 0.15),
    tone(Sine, 659.0, 0.0, 0.2, 0.8, 0.15),
];
const WAVE_START: [Tone; 4] = [
    tone(Triangle, 400.0, 0.0, 0.0, 0.4, 0.2),
    tone(Triangle, 500.0, 0.0, 0.1, 0.4, 0.2),
    tone(Triangle, 600.0, 0.0, 0.2, 0.4, 0.2),
    tone(Triangle, 800.0, 0.0, 0.3, 0.4, 0.2),
];
const WARNING: [Tone; 1] = [tone(Square, 800.0, 0.0, 0.0, 0.1, 0.06)];
const START: [Tone; 1] = [tone(Triangle, 200.0, 400.0, 0.0, 0.2, 0.2)];
const GAME_OVER: [Tone; 4] = [
    tone(Sine, 400.0, 0.0, 0.0, 0.3, 0.3),
    tone(Sine, 350.0, 0.0, 0.2, 0.3, 0.3),
    tone(Sine, 300.0, 0.0, 0.4, 0.3, 0.3),
    tone(Sine, 200.0, 0.0, 0.6, 0.3, 0.3),
];

impl SoundEffect {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            SoundEffect::Shoot => &SHOOT,
            SoundEffect::Hit => &HIT,
            SoundEffect::EnemyDeath => &ENEMY_DEATH,
            SoundEffect::Hurt => &HURT,
            SoundEffect::Collect => &COLLECT,
            SoundEffect::LevelUp => &LEVEL_UP,
            SoundEffect::WaveStart => &WAVE_START,
            SoundEffect::Warning => &WARNING,
            SoundEffect::Start => &START,
            SoundEffect::GameOver => &GAME_OVER,
        }
    }

    /// Sound for a gameplay event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::SessionStarted | GameEvent::Resumed => Some(SoundEffect::Start),
            GameEvent::Shoot => Some(SoundEffect::Shoot),
            GameEvent::Hit { .. } => Some(SoundEffect::Hit),
            GameEvent::Kill { .. } => Some(SoundEffect::EnemyDeath),
            GameEvent::PlayerHurt => Some(SoundEffect::Hurt),
            GameEvent::Pickup => Some(SoundEffect::Collect),
            GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            GameEvent::WaveStart { .. } => Some(SoundEffect::WaveStart),
            GameEvent::Overheated => Some(SoundEffect::Warning),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
            GameEvent::Paused => None,
        }
    }
}

/// Rate limit per sound key: a repeat inside `window` seconds is dropped
#[derive(Debug, Clone)]
pub struct SoundThrottle {
    window: f64,
    last_played: HashMap<SoundEffect, f64>,
}

impl SoundThrottle {
    pub fn new(window: f64) -> Self {
        Self {
            window: window.max(0.0),
            last_played: HashMap::new(),
        }
    }

    /// Record a play at `now` (seconds) if allowed
    pub fn allow(&mut self, effect: SoundEffect, now: f64) -> bool {
        match self.last_played.get(&effect) {
            Some(&last) if now - last < self.window => false,
            _ => {
                self.last_played.insert(effect, now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_played.clear();
    }
}

/// Something that can turn tones into sound
pub trait SynthBackend {
    /// Create or resume the output. Browsers only allow this during a user gesture,
    /// and may finish (or refuse) it asynchronously.
    fn resume(&mut self) -> Result<(), AudioError>;
    /// Whether output is actually running right now
    fn is_running(&self) -> bool;
    /// Schedule one tone at `gain` (already volume-scaled)
    fn emit(&mut self, tone: &Tone, gain: f32);
    /// Suspend output (tab hidden, teardown)
    fn suspend(&mut self) {}
}

/// Silent backend for native builds and tests
#[derive(Debug, Default, Clone)]
pub struct NullSynth {
    /// Tones emitted so far
    pub emitted: usize,
    running: bool,
}

impl SynthBackend for NullSynth {
    fn resume(&mut self) -> Result<(), AudioError> {
        self.running = true;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn emit(&mut self, _tone: &Tone, _gain: f32) {
        self.emitted += 1;
    }

    fn suspend(&mut self) {
        self.running = false;
    }
}

/// Audio manager for the game
pub struct AudioManager<B: SynthBackend> {
    backend: B,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    throttle: SoundThrottle,
}

impl<B: SynthBackend> AudioManager<B> {
    pub fn new(backend: B, settings: &crate::settings::Settings) -> Self {
        Self {
            backend,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            muted: false,
            throttle: SoundThrottle::new(settings.sound_throttle_secs),
        }
    }

    /// Activate output on a user gesture.
    ///
    /// Asks the backend again on every gesture until it reports running, so a
    /// refused or later re-suspended context recovers on the next click or key.
    pub fn activate(&mut self) -> bool {
        if self.backend.is_running() {
            return true;
        }
        match self.backend.resume() {
            Ok(()) if self.backend.is_running() => log::info!("Audio activated"),
            Ok(()) => log::debug!("Audio resume pending, will retry on next gesture"),
            Err(e) => log::warn!("Audio activation failed, will retry: {}", e),
        }
        self.backend.is_running()
    }

    pub fn is_active(&self) -> bool {
        self.backend.is_running()
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect at time `now` (seconds). Returns whether it played.
    pub fn play(&mut self, effect: SoundEffect, now: f64) -> bool {
        let vol = self.effective_volume();
        if vol <= 0.0 || !self.backend.is_running() {
            return false;
        }
        if !self.throttle.allow(effect, now) {
            return false;
        }
        for tone in effect.tones() {
            self.backend.emit(tone, tone.volume * vol);
        }
        true
    }

    /// Play whatever sounds a frame's events call for
    pub fn play_events(&mut self, events: &[GameEvent], now: f64) {
        for event in events {
            if let Some(effect) = SoundEffect::for_event(event) {
                self.play(effect, now);
            }
        }
    }

    /// Stop output; a later gesture activates it again
    pub fn suspend(&mut self) {
        self.backend.suspend();
        self.throttle.reset();
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebSynth;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    use super::{SynthBackend, Tone, Waveform};
    use crate::error::AudioError;

    /// Web Audio backend, context created lazily on the first gesture
    #[derive(Default)]
    pub struct WebSynth {
        ctx: Option<AudioContext>,
    }

    impl WebSynth {
        pub fn new() -> Self {
            Self::default()
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    impl SynthBackend for WebSynth {
        fn resume(&mut self) -> Result<(), AudioError> {
            // A closed context cannot be resumed; start over with a new one
            if self
                .ctx
                .as_ref()
                .is_some_and(|ctx| ctx.state() == AudioContextState::Closed)
            {
                self.ctx = None;
            }
            if self.ctx.is_none() {
                // May fail outside a secure context
                let ctx = AudioContext::new().map_err(|_| AudioError::Unavailable)?;
                self.ctx = Some(ctx);
            }
            let Some(ctx) = &self.ctx else {
                return Err(AudioError::Unavailable);
            };
            if ctx.state() != AudioContextState::Running {
                let promise = ctx
                    .resume()
                    .map_err(|e| AudioError::Rejected(format!("{:?}", e)))?;
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = JsFuture::from(promise).await {
                        log::warn!("Audio resume rejected: {:?}", e);
                    }
                });
            }
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.ctx
                .as_ref()
                .is_some_and(|ctx| ctx.state() == AudioContextState::Running)
        }

        fn emit(&mut self, tone: &Tone, gain_value: f32) {
            let Some(ctx) = &self.ctx else { return };
            let osc_type = match tone.wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
                Waveform::Triangle => OscillatorType::Triangle,
            };
            let Some((osc, gain)) = Self::create_osc(ctx, tone.freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + tone.offset;
            let end = t + tone.duration;

            gain.gain().set_value_at_time(gain_value.max(0.001), t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.001, end).ok();
            osc.frequency().set_value_at_time(tone.freq, t).ok();
            if tone.slide != 0.0 {
                let target = (tone.freq + tone.slide).max(1.0);
                osc.frequency().exponential_ramp_to_value_at_time(target, end).ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(end).ok();
        }

        fn suspend(&mut self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.suspend();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    /// Backend that fails activation a set number of times, then accepts a
    /// number of resumes that leave it suspended before it really starts
    #[derive(Default)]
    struct FlakySynth {
        failures_left: u32,
        silent_resumes_left: u32,
        running: bool,
        resumes: u32,
        emitted: Vec<Tone>,
    }

    impl SynthBackend for FlakySynth {
        fn resume(&mut self) -> Result<(), AudioError> {
            self.resumes += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(AudioError::Rejected("not allowed".into()));
            }
            if self.silent_resumes_left > 0 {
                self.silent_resumes_left -= 1;
                return Ok(());
            }
            self.running = true;
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn suspend(&mut self) {
            self.running = false;
        }

        fn emit(&mut self, tone: &Tone, _gain: f32) {
            self.emitted.push(*tone);
        }
    }

    #[test]
    fn test_throttle_window() {
        let mut t = SoundThrottle::new(0.05);
        assert!(t.allow(SoundEffect::Shoot, 1.0));
        assert!(!t.allow(SoundEffect::Shoot, 1.03));
        assert!(t.allow(SoundEffect::Hit, 1.03));
        assert!(t.allow(SoundEffect::Shoot, 1.06));
    }

    #[test]
    fn test_silent_until_activated_and_retries() {
        let backend = FlakySynth {
            failures_left: 1,
            ..Default::default()
        };
        let mut audio = AudioManager::new(backend, &Settings::default());
        assert!(!audio.play(SoundEffect::Shoot, 0.0));
        assert!(!audio.activate());
        assert!(audio.activate());
        assert!(audio.play(SoundEffect::Shoot, 0.0));
        assert_eq!(audio.backend().emitted.len(), 1);
    }

    #[test]
    fn test_pending_resume_is_retried_until_running() {
        let backend = FlakySynth {
            silent_resumes_left: 2,
            ..Default::default()
        };
        let mut audio = AudioManager::new(backend, &Settings::default());
        assert!(!audio.activate());
        assert!(!audio.play(SoundEffect::Shoot, 0.0));
        assert!(!audio.activate());
        assert!(audio.activate());
        assert_eq!(audio.backend().resumes, 3);

        // Once running, further gestures do not poke the backend
        assert!(audio.activate());
        assert_eq!(audio.backend().resumes, 3);
        assert!(audio.play(SoundEffect::Shoot, 0.0));
    }

    #[test]
    fn test_context_suspended_behind_our_back_is_resumed() {
        let mut audio = AudioManager::new(FlakySynth::default(), &Settings::default());
        assert!(audio.activate());

        // The browser suspends the context (tab switch) without telling us
        audio.backend.running = false;
        assert!(!audio.is_active());
        assert!(!audio.play(SoundEffect::Hit, 1.0));

        assert!(audio.activate());
        assert!(audio.play(SoundEffect::Hit, 1.0));
        assert_eq!(audio.backend().resumes, 2);
    }

    #[test]
    fn test_level_up_is_an_arpeggio() {
        let tones = SoundEffect::LevelUp.tones();
        let freqs: Vec<f32> = tones.iter().map(|t| t.freq).collect();
        assert_eq!(freqs, vec![440.0, 554.0, 659.0]);
        assert!(tones.windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn test_events_map_to_sounds_with_throttle() {
        let mut audio = AudioManager::new(NullSynth::default(), &Settings::default());
        audio.activate();
        let events = [
            GameEvent::Hit { target: 1 },
            GameEvent::Hit { target: 2 },
            GameEvent::Paused,
        ];
        audio.play_events(&events, 0.0);
        assert_eq!(audio.backend().emitted, 1);
    }

    #[test]
    fn test_muted_plays_nothing() {
        let mut audio = AudioManager::new(NullSynth::default(), &Settings::default());
        audio.activate();
        audio.set_muted(true);
        assert!(!audio.play(SoundEffect::GameOver, 0.0));
        audio.set_muted(false);
        assert!(audio.play(SoundEffect::GameOver, 0.0));
        assert_eq!(audio.backend().emitted, 4);
    }
}

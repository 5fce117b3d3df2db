//! Frame tick
//!
//! Advances the lifecycle phase machine and, while playing, runs one frame
//! of the pipeline: spawn, step, resolve, progress, cleanup, effects.

use glam::Vec2;

use super::state::{GameEvent, GamePhase, GameState};
use super::{collision, progression, spawner, step};
use crate::error::SimError;

/// Input commands for a single frame (produced by the input sampler)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired movement direction, magnitude at most 1
    pub movement: Vec2,
    /// Aim direction relative to the player, if the player is aiming manually
    pub aim: Option<Vec2>,
    /// Fire held
    pub fire: bool,
    /// Run held (spends stamina)
    pub run: bool,
    /// Skill pressed this frame
    pub skill: bool,
    /// Interact held (pulls nearby pickups)
    pub interact: bool,
    /// Pause toggle pressed this frame
    pub pause: bool,
    /// Start / restart pressed this frame
    pub start: bool,
}

/// What happened during one call to [`tick`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub events: Vec<GameEvent>,
    /// Whether the world was simulated (false while in menu, paused or game over)
    pub simulated: bool,
}

impl FrameReport {
    pub fn has(&self, event: GameEvent) -> bool {
        self.events.contains(&event)
    }
}

/// Advance the game by one frame of `dt` seconds.
///
/// `dt` is clamped to `[0, tuning.max_frame_dt]`. An `Err` means the state
/// broke an invariant and the loop must halt.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Result<FrameReport, SimError> {
    let mut report = FrameReport::default();
    let dt = if dt.is_finite() {
        dt.clamp(0.0, state.tuning.max_frame_dt)
    } else {
        0.0
    };

    match state.phase {
        GamePhase::Menu | GamePhase::GameOver => {
            if input.start {
                start_session(state, &mut report.events);
            } else {
                state.effects.tick(dt);
                return Ok(report);
            }
        }
        GamePhase::Paused => {
            if input.pause {
                state.phase = GamePhase::Playing;
                report.events.push(GameEvent::Resumed);
                log::info!("Resumed");
            } else {
                return Ok(report);
            }
        }
        GamePhase::Playing => {
            if input.pause {
                state.phase = GamePhase::Paused;
                report.events.push(GameEvent::Paused);
                log::info!("Paused");
                return Ok(report);
            }
        }
    }

    simulate(state, input, dt, &mut report.events);
    report.simulated = true;

    state.normalize_order();
    state.validate()?;
    Ok(report)
}

fn start_session(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.phase == GamePhase::GameOver {
        log::info!(
            "Restarting after score {} (wave {})",
            state.session.score,
            state.session.wave
        );
    }
    state.reset();
    state.phase = GamePhase::Playing;
    let hazards = state.tuning.hazards_per_wave;
    spawner::spawn_hazards(state, hazards);
    state.effects.banner("WAVE 1", 2.0);
    events.push(GameEvent::SessionStarted);
    log::info!("Session started (seed {})", state.seed);
}

fn simulate(state: &mut GameState, input: &TickInput, dt: f32, events: &mut Vec<GameEvent>) {
    spawner::update(state, dt);
    let output = step::advance(state, input, dt, events);
    collision::resolve(state, &output.blasts, events);
    progression::update(state, events);
    state.cleanup();
    state.effects.tick(dt);

    // Camera shake decays per frame, independent of dt
    let session = &mut state.session;
    session.shake *= 0.9;
    if session.shake < 0.5 {
        session.shake = 0.0;
    }
    session.elapsed += dt;
    session.frame += 1;
    if let Some(left) = &mut session.time_left {
        *left = (*left - dt).max(0.0);
    }

    let out_of_time = state.session.out_of_time();
    if !state.world.player.alive || out_of_time {
        state.phase = GamePhase::GameOver;
        events.push(GameEvent::GameOver);
        log::info!(
            "Game over ({}): score {}, wave {}, level {}, kills {}",
            if out_of_time { "time up" } else { "player down" },
            state.session.score,
            state.session.wave,
            state.session.level,
            state.session.kills
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FIRST_FRAME_DT;
    use crate::settings::Tuning;
    use crate::sim::entity::{Entity, Team};

    const DT: f32 = FIRST_FRAME_DT;

    /// Tuning with spawning and auto-fire switched off
    fn still_tuning() -> Tuning {
        Tuning {
            auto_fire: false,
            spawn_interval: 1.0e6,
            pickup_interval: 1.0e6,
            hazards_per_wave: 0,
            ..Tuning::default()
        }
    }

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed, still_tuning());
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &start, 0.0).unwrap();
        state
    }

    #[test]
    fn test_menu_to_playing() {
        let mut state = GameState::new(1, still_tuning());
        let report = tick(&mut state, &TickInput::default(), DT).unwrap();
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(!report.simulated);

        let start = TickInput {
            start: true,
            ..Default::default()
        };
        let report = tick(&mut state, &start, DT).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(report.has(GameEvent::SessionStarted));
        assert!(report.simulated);
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut state = playing(2);
        let id = state.next_entity_id();
        let profile = state.tuning.chaser;
        state
            .world
            .enemies
            .push(Entity::chaser(id, Vec2::new(300.0, 0.0), &profile, None));

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        let report = tick(&mut state, &pause, DT).unwrap();
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(report.has(GameEvent::Paused));

        let frozen = state.clone();
        for _ in 0..30 {
            let input = TickInput {
                movement: Vec2::X,
                fire: true,
                ..Default::default()
            };
            let report = tick(&mut state, &input, DT).unwrap();
            assert!(!report.simulated);
        }
        assert_eq!(state.world.enemies, frozen.world.enemies);
        assert_eq!(state.world.player, frozen.world.player);
        assert_eq!(state.session.frame, frozen.session.frame);

        let report = tick(&mut state, &pause, DT).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(report.has(GameEvent::Resumed));
        assert!(state.world.enemies[0].pos.x < 300.0);
    }

    #[test]
    fn test_hazard_drains_health_per_frame() {
        let mut state = playing(3);
        let id = state.next_entity_id();
        state
            .world
            .hazards
            .push(Entity::hazard(id, Vec2::new(20.0, 0.0), 30.0, 1.0));
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT).unwrap();
        }
        assert_eq!(state.world.player.hp, 90.0);
    }

    #[test]
    fn test_projectile_kills_over_three_hits() {
        let mut state = playing(4);
        let id = state.next_entity_id();
        let profile = state.tuning.chaser;
        // Stationary target: zero speed chaser
        let mut target = Entity::chaser(id, Vec2::new(200.0, 0.0), &profile, None);
        target.behavior = crate::sim::entity::Behavior::Chaser {
            speed: 0.0,
            dash: None,
        };
        state.world.enemies.push(target);

        let mut expected = [35.0, 10.0].into_iter();
        for hit in 0..3 {
            let pid = state.next_entity_id();
            state.world.projectiles.push(Entity::projectile(
                pid,
                Team::Player,
                Vec2::new(195.0, 0.0),
                Vec2::new(1.0, 0.0),
                25.0,
                1.0,
                None,
                0.0,
            ));
            let report = tick(&mut state, &TickInput::default(), DT).unwrap();
            if hit < 2 {
                assert!(report.has(GameEvent::Hit { target: id }));
                assert_eq!(state.world.enemies[0].hp, expected.next().unwrap());
            } else {
                assert!(report.has(GameEvent::Kill { target: id }));
                assert!(state.world.enemies.is_empty());
                assert_eq!(state.session.score, profile.reward);
            }
        }
    }

    #[test]
    fn test_death_is_reported_once() {
        let mut state = playing(5);
        state.world.player.hp = 1.5;
        let id = state.next_entity_id();
        state
            .world
            .hazards
            .push(Entity::hazard(id, Vec2::ZERO, 30.0, 1.0));

        let mut game_overs = 0;
        for _ in 0..10 {
            let report = tick(&mut state, &TickInput::default(), DT).unwrap();
            game_overs += report.events.iter().filter(|e| **e == GameEvent::GameOver).count();
        }
        assert_eq!(game_overs, 1);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.world.player.hp, 0.0);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut state = playing(6);
        state.world.player.apply_damage(1000.0);
        tick(&mut state, &TickInput::default(), DT).unwrap();
        assert_eq!(state.phase, GamePhase::GameOver);

        let start = TickInput {
            start: true,
            ..Default::default()
        };
        let report = tick(&mut state, &start, DT).unwrap();
        assert!(report.has(GameEvent::SessionStarted));
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.world.player.alive);
        assert_eq!(state.session.score, 0);
    }

    #[test]
    fn test_timed_run_ends_when_clock_runs_out() {
        let mut state = GameState::new(
            9,
            Tuning {
                time_limit: Some(2.0),
                ..still_tuning()
            },
        );
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &start, 0.0).unwrap();
        assert_eq!(state.session.time_left, Some(2.0));

        let mut game_overs = 0;
        for _ in 0..19 {
            let report = tick(&mut state, &TickInput::default(), 0.1).unwrap();
            game_overs += report.events.iter().filter(|e| **e == GameEvent::GameOver).count();
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(game_overs, 0);

        for _ in 0..5 {
            let report = tick(&mut state, &TickInput::default(), 0.1).unwrap();
            game_overs += report.events.iter().filter(|e| **e == GameEvent::GameOver).count();
        }
        assert_eq!(game_overs, 1);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.session.time_left, Some(0.0));
        assert!(state.world.player.alive);

        // Restart refills the clock
        tick(&mut state, &start, 0.0).unwrap();
        assert_eq!(state.session.time_left, Some(2.0));
    }

    #[test]
    fn test_untimed_run_never_times_out() {
        let mut state = playing(10);
        assert_eq!(state.session.time_left, None);
        for _ in 0..3600 {
            tick(&mut state, &TickInput::default(), 0.1).unwrap();
        }
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut state = playing(7);
        state.world.player.vel = Vec2::new(100.0, 0.0);
        tick(&mut state, &TickInput::default(), 5.0).unwrap();
        assert!((state.session.elapsed - state.tuning.max_frame_dt).abs() < 1e-6);

        let before = state.session.elapsed;
        tick(&mut state, &TickInput::default(), f32::NAN).unwrap();
        tick(&mut state, &TickInput::default(), -1.0).unwrap();
        assert_eq!(state.session.elapsed, before);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99999, Tuning::default());
        let mut b = GameState::new(99999, Tuning::default());
        let inputs = [
            TickInput {
                start: true,
                ..Default::default()
            },
            TickInput {
                movement: Vec2::new(0.6, 0.8),
                run: true,
                ..Default::default()
            },
            TickInput {
                aim: Some(Vec2::new(0.0, -1.0)),
                fire: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            let ra = tick(&mut a, input, DT);
            let rb = tick(&mut b, input, DT);
            assert_eq!(ra, rb);
        }
        assert_eq!(a.world.enemies, b.world.enemies);
        assert_eq!(a.world.player, b.world.player);
        assert_eq!(a.session.score, b.session.score);
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let mut state = playing(8);
        state.world.player.hp = f32::NAN;
        let result = tick(&mut state, &TickInput::default(), DT);
        assert!(matches!(result, Err(SimError::NonFinite { what: "health", .. })));
    }
}

//! Property tests over whole runs driven through the public API

use std::collections::HashSet;

use glam::Vec2;
use proptest::prelude::*;

use arcade_loop::persistence::Snapshot;
use arcade_loop::settings::{BoundaryPolicy, Tuning};
use arcade_loop::sim::step::apply_boundary;
use arcade_loop::sim::{Aabb, Entity, GameEvent, GamePhase, GameState, TickInput, tick};

const DT: f32 = 1.0 / 60.0;

fn start() -> TickInput {
    TickInput {
        start: true,
        ..Default::default()
    }
}

/// Input pattern that keeps the player moving and shooting
fn scripted(frame: u32) -> TickInput {
    let angle = frame as f32 * 0.05;
    TickInput {
        movement: Vec2::new(angle.cos(), angle.sin()),
        fire: true,
        skill: frame % 90 == 0,
        run: frame % 200 < 50,
        ..Default::default()
    }
}

fn running(seed: u64, frames: u32) -> GameState {
    let mut state = GameState::new(seed, Tuning::default());
    tick(&mut state, &start(), DT).unwrap();
    for f in 0..frames {
        tick(&mut state, &scripted(f), DT).unwrap();
    }
    state
}

fn positions(state: &GameState) -> Vec<(u32, Vec2)> {
    let w = &state.world;
    std::iter::once(&w.player)
        .chain(&w.enemies)
        .chain(&w.hazards)
        .chain(&w.projectiles)
        .chain(&w.pickups)
        .map(|e| (e.id, e.pos))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn zero_dt_moves_nothing(seed in any::<u64>(), warmup in 0u32..240) {
        let mut state = running(seed, warmup);
        prop_assume!(state.phase == GamePhase::Playing);
        let before = positions(&state);
        let elapsed = state.session.elapsed;

        tick(&mut state, &TickInput::default(), 0.0).unwrap();

        let after = positions(&state);
        for (id, pos) in &before {
            if let Some((_, moved)) = after.iter().find(|(other, _)| other == id) {
                prop_assert_eq!(pos, moved, "entity {} moved on a zero-length frame", id);
            }
        }
        prop_assert_eq!(state.session.elapsed, elapsed);
    }

    #[test]
    fn dt_is_clamped(seed in any::<u64>(), dt in prop_oneof![
        -10.0f32..10.0,
        Just(f32::NAN),
        Just(f32::INFINITY),
    ]) {
        let mut state = running(seed, 1);
        let elapsed = state.session.elapsed;
        let max = state.tuning.max_frame_dt;
        tick(&mut state, &TickInput::default(), dt).unwrap();

        let expected = if dt.is_finite() { dt.clamp(0.0, max) } else { 0.0 };
        prop_assert!((state.session.elapsed - elapsed - expected).abs() < 1e-5);
    }

    #[test]
    fn death_happens_exactly_once(seed in any::<u64>(), damage in 1.0f32..60.0) {
        let mut state = running(seed, 0);
        let id = state.next_entity_id();
        state.world.hazards.push(Entity::hazard(id, Vec2::ZERO, 40.0, damage));

        let mut game_overs = 0;
        for f in 0..600 {
            let report = tick(&mut state, &TickInput::default(), DT).unwrap();
            game_overs += report.events.iter().filter(|e| **e == GameEvent::GameOver).count();
            if f > 0 && state.phase == GamePhase::GameOver {
                // Frames after death run nothing and report nothing new
                prop_assert!(!report.simulated || report.has(GameEvent::GameOver));
            }
        }
        prop_assert_eq!(game_overs, 1);
        prop_assert_eq!(state.phase, GamePhase::GameOver);
        prop_assert!(!state.world.player.alive);
    }

    #[test]
    fn killed_enemies_are_never_hit_again(seed in any::<u64>()) {
        let mut state = GameState::new(seed, Tuning {
            spawn_interval: 0.2,
            ..Tuning::default()
        });
        tick(&mut state, &start(), DT).unwrap();

        let mut dead: HashSet<u32> = HashSet::new();
        for f in 0..900 {
            let report = tick(&mut state, &scripted(f), DT).unwrap();
            for event in &report.events {
                match event {
                    GameEvent::Hit { target } => prop_assert!(!dead.contains(target)),
                    GameEvent::Kill { target } => prop_assert!(dead.insert(*target), "killed {} twice", target),
                    _ => {}
                }
            }
            prop_assert!(state.world.enemies.iter().all(|e| e.alive));
            if state.phase == GamePhase::GameOver {
                break;
            }
        }
    }

    #[test]
    fn snapshot_restore_is_seamless(seed in any::<u64>(), warmup in 0u32..300) {
        let mut state = running(seed, warmup);
        let json = Snapshot::capture(&state).to_json().unwrap();
        let mut restored = Snapshot::from_json(&json).unwrap().into_state();

        for f in 0..120 {
            let a = tick(&mut state, &scripted(warmup + f), DT).unwrap();
            let b = tick(&mut restored, &scripted(warmup + f), DT).unwrap();
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(
            serde_json::to_string(&state).unwrap(),
            serde_json::to_string(&restored).unwrap()
        );
    }

    #[test]
    fn despawn_boundary_is_strict(distance in 1.0f32..5000.0) {
        let bounds = Aabb::from_center(Vec2::ZERO, Vec2::splat(10_000.0));
        let policy = BoundaryPolicy::Despawn { max_distance: distance };

        let mut at_edge = Entity::hazard(1, Vec2::new(distance, 0.0), 1.0, 0.0);
        apply_boundary(&mut at_edge, &bounds, Vec2::ZERO, policy);
        prop_assert!(at_edge.alive);

        let mut beyond = Entity::hazard(2, Vec2::new(0.0, -distance * 1.001), 1.0, 0.0);
        apply_boundary(&mut beyond, &bounds, Vec2::ZERO, policy);
        prop_assert!(!beyond.alive);
    }

    #[test]
    fn clamp_keeps_entities_inside(x in -5000.0f32..5000.0, y in -5000.0f32..5000.0) {
        let bounds = Aabb::from_center(Vec2::ZERO, Vec2::new(800.0, 600.0));
        let mut e = Entity::hazard(1, Vec2::new(x, y), 10.0, 0.0);
        apply_boundary(&mut e, &bounds, Vec2::ZERO, BoundaryPolicy::Clamp);
        prop_assert!(bounds.shrink(10.0).contains(e.pos));

        // Applying it again changes nothing
        let once = e.pos;
        apply_boundary(&mut e, &bounds, Vec2::ZERO, BoundaryPolicy::Clamp);
        prop_assert_eq!(e.pos, once);
    }

    #[test]
    fn paused_world_stays_frozen(seed in any::<u64>(), frames in 1u32..300) {
        let mut state = running(seed, 30);
        prop_assume!(state.phase == GamePhase::Playing);
        let pause = TickInput { pause: true, ..Default::default() };
        tick(&mut state, &pause, DT).unwrap();
        let frozen = positions(&state);

        for f in 0..frames {
            tick(&mut state, &scripted(f), DT).unwrap();
        }
        prop_assert_eq!(state.phase, GamePhase::Paused);
        prop_assert_eq!(positions(&state), frozen);
    }
}

//! Enemy, pickup and hazard spawning
//!
//! All randomness comes from the state's seeded RNG so a run replays exactly.

use glam::Vec2;
use rand::Rng;

use super::entity::{Dash, Entity, PickupKind, ShotSpec};
use super::state::GameState;
use crate::heading;

/// Count down spawn timers and create whatever is due
pub fn update(state: &mut GameState, dt: f32) {
    state.spawn.enemy -= dt;
    if state.spawn.enemy <= 0.0 {
        state.spawn.enemy += state.tuning.spawn_interval;
        if state.enemy_count() < enemy_cap(state) {
            spawn_enemy(state);
        }
    }

    state.spawn.pickup += dt;
    if state.spawn.pickup >= state.tuning.pickup_interval {
        state.spawn.pickup = 0.0;
        spawn_pickup(state);
    }
}

/// Live-enemy ceiling for the current wave
pub fn enemy_cap(state: &GameState) -> usize {
    let t = &state.tuning;
    t.enemy_cap_base + state.session.wave.saturating_sub(1) as usize * t.enemy_cap_per_wave
}

/// A chance squeezed into `[0, 1]`; NaN counts as never
fn probability(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}

/// Random point on a ring around the player, pulled back inside the world
fn ring_point(state: &mut GameState, distance: f32, radius: f32) -> Vec2 {
    let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
    let p = state.world.player.pos + heading(angle) * distance;
    let inner = state.world.bounds.shrink(radius);
    p.clamp(inner.min, inner.max)
}

/// Pick an archetype and place it on the spawn ring
pub fn spawn_enemy(state: &mut GameState) {
    let t = state.tuning.clone();
    let elite =
        state.session.score >= t.elite_after_score && state.rng.random_bool(probability(t.elite_chance));
    let shooter = !elite
        && state.session.wave >= t.shooter_from_wave
        && state.rng.random_bool(0.5);
    let patrol = !elite && !shooter && state.rng.random_bool(probability(t.patrol_chance));

    let id = state.next_entity_id();
    let enemy = if elite {
        let pos = ring_point(state, t.spawn_distance, t.elite.radius);
        let dash = Dash {
            timer: 0.0,
            period: t.dash_period,
            duration: t.dash_duration,
            speed: t.dash_speed,
        };
        Entity::chaser(id, pos, &t.elite, Some(dash))
    } else if shooter {
        let pos = ring_point(state, t.spawn_distance, t.shooter.radius);
        let shot = ShotSpec {
            speed: t.shooter_shot_speed,
            damage: t.shooter_shot_damage,
            ttl: t.projectile_ttl * 2.0,
        };
        Entity::shooter(id, pos, &t.shooter, t.shooter_range, t.shooter_fire_interval, shot)
    } else if patrol {
        let pos = ring_point(state, t.spawn_distance, t.patrol.radius);
        let axis = if state.rng.random_bool(0.5) { Vec2::X } else { Vec2::Y };
        Entity::patrol(id, pos, &t.patrol, axis, t.patrol_interval)
    } else {
        let pos = ring_point(state, t.spawn_distance, t.chaser.radius);
        Entity::chaser(id, pos, &t.chaser, None)
    };

    log::trace!("Spawned enemy {} at {:?}", enemy.id, enemy.pos);
    state.world.enemies.push(enemy);
}

pub fn spawn_pickup(state: &mut GameState) {
    let kind = match state.rng.random_range(0..3) {
        0 => PickupKind::Heal(state.tuning.pickup_heal),
        1 => PickupKind::Coolant,
        _ => PickupKind::Stamina,
    };
    let distance = state.tuning.pickup_distance;
    let pos = ring_point(state, distance, crate::consts::PICKUP_RADIUS);
    let id = state.next_entity_id();
    let ttl = state.tuning.pickup_ttl;
    state.world.pickups.push(Entity::pickup(id, pos, kind, ttl));
}

/// Drop `count` hazards somewhere between the player and the spawn ring
pub fn spawn_hazards(state: &mut GameState, count: u32) {
    let radius = state.tuning.hazard_radius;
    let damage = state.tuning.hazard_damage_per_tick;
    let max = state.tuning.spawn_distance;
    for _ in 0..count {
        let distance = state.rng.random_range(radius * 4.0..max.max(radius * 4.0 + 1.0));
        let pos = ring_point(state, distance, radius);
        let id = state.next_entity_id();
        state.world.hazards.push(Entity::hazard(id, pos, radius, damage));
    }
}

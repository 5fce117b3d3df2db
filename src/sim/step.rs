//! Simulation step
//!
//! Advances every live entity by `dt`: motion integration, behavior dispatch,
//! static geometry, boundary policy. Runs before collision resolution.

use glam::Vec2;

use super::entity::{Behavior, Entity, Splash, Team};
use super::geometry::{Aabb, Level};
use super::state::{GameEvent, GameState};
use super::tick::TickInput;
use crate::settings::BoundaryPolicy;
use crate::{direction_to, heading};

/// Area blast requested this frame (player skill), resolved by the collision pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    pub pos: Vec2,
    pub radius: f32,
    pub damage: f32,
}

/// Frame-local requests the step hands to the resolver
#[derive(Debug, Default)]
pub struct StepOutput {
    pub blasts: Vec<Blast>,
}

/// Advance all entities by `dt` seconds
pub fn advance(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) -> StepOutput {
    let mut out = StepOutput::default();

    step_player(state, input, dt, &mut out, events);
    fire_player_weapon(state, input, dt, events);
    step_enemies(state, dt);
    step_projectiles(state, dt);
    step_pickups(state, input, dt);
    step_particles(state, dt);

    out
}

fn step_player(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    out: &mut StepOutput,
    events: &mut Vec<GameEvent>,
) {
    let t = &state.tuning;
    let session = &mut state.session;
    let player = &mut state.world.player;
    if !player.alive {
        return;
    }

    let moving = input.movement.length_squared() > 0.0;
    let running = input.run && moving && session.stamina.value > 0.0;
    if running {
        session.stamina.add(-t.stamina_drain * dt);
    } else {
        session.stamina.add(t.stamina_regen * dt);
    }

    // Accelerate, then apply friction drag
    let mut vel = player.vel + input.movement * t.player_accel * dt;
    vel *= (1.0 - t.friction * dt).max(0.0);
    let max_speed = t.player_max_speed * if running { t.run_multiplier } else { 1.0 };
    if vel.length() > max_speed {
        vel = vel.normalize_or_zero() * max_speed;
    }
    player.vel = vel;
    decay_push(player, t.push_decay, dt);

    let delta = (player.vel + player.push) * dt;
    integrate(player, &state.world.level, delta, true);
    clamp_to(player, &state.world.bounds);

    // Skill: shockwave around the player
    state.weapon.skill_cooldown = (state.weapon.skill_cooldown - dt).max(0.0);
    if input.skill
        && state.weapon.skill_cooldown <= 0.0
        && session.stamina.value >= t.skill_stamina_cost
    {
        session.stamina.add(-t.skill_stamina_cost);
        state.weapon.skill_cooldown = t.skill_cooldown;
        out.blasts.push(Blast {
            pos: player.pos,
            radius: t.skill_radius,
            damage: t.skill_damage,
        });
        state.effects.flash([0.6, 0.9, 1.0, 0.35], 0.15);
        events.push(GameEvent::Shoot);
    }
}

fn fire_player_weapon(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let t = state.tuning.clone();
    let session = &mut state.session;

    session.heat.add(-t.heat_cooling * dt);
    if session.overheated && session.heat.value <= t.heat_max * t.heat_recover_ratio {
        session.overheated = false;
        log::debug!("Weapon cooled down");
    }

    state.weapon.cooldown = (state.weapon.cooldown - dt).max(0.0);
    let wants_fire = input.fire || t.auto_fire;
    if !state.world.player.alive
        || !wants_fire
        || state.weapon.cooldown > 0.0
        || session.overheated
    {
        return;
    }

    let origin = state.world.player.pos;
    let aim = input
        .aim
        .and_then(|a| direction_to(Vec2::ZERO, a))
        .or_else(|| nearest_enemy_direction(state, origin, t.auto_aim_range))
        .unwrap_or_else(|| heading(state.session.elapsed * 6.0));

    let angle = aim.y.atan2(aim.x);
    let count = state.weapon.bullet_count.max(1);
    let start = angle - t.spread * (count - 1) as f32 / 2.0;
    let splash = t.splash_radius.map(|radius| Splash {
        radius,
        damage: t.splash_damage,
    });

    for i in 0..count {
        let dir = heading(start + t.spread * i as f32);
        let id = state.next_entity_id();
        state.world.projectiles.push(Entity::projectile(
            id,
            Team::Player,
            origin,
            dir * t.projectile_speed,
            state.weapon.damage,
            t.projectile_ttl,
            splash,
            t.knockback,
        ));
    }
    state.weapon.cooldown = state.weapon.fire_interval;
    events.push(GameEvent::Shoot);

    let session = &mut state.session;
    session.heat.add(t.heat_per_shot);
    if session.heat.is_full() && !session.overheated {
        session.overheated = true;
        events.push(GameEvent::Overheated);
        log::debug!("Weapon overheated");
    }
}

/// Direction to the nearest live enemy within `range` (ties: lower id)
fn nearest_enemy_direction(state: &GameState, from: Vec2, range: f32) -> Option<Vec2> {
    state
        .world
        .enemies
        .iter()
        .filter(|e| e.alive)
        .map(|e| (e.pos.distance(from), e.id, e.pos))
        .filter(|(d, _, _)| *d < range)
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .and_then(|(_, _, pos)| direction_to(from, pos))
}

fn step_enemies(state: &mut GameState, dt: f32) {
    let target = state.world.player.pos;
    let push_decay = state.tuning.push_decay;
    let policy = state.tuning.enemy_boundary;
    let mut shots = Vec::new();

    for enemy in state.world.enemies.iter_mut().filter(|e| e.alive) {
        let to_player = direction_to(enemy.pos, target);
        let dist = enemy.pos.distance(target);

        match &mut enemy.behavior {
            Behavior::Chaser { speed, dash } => {
                let mut current = *speed;
                if let Some(dash) = dash {
                    dash.advance(dt);
                    if dash.is_dashing() {
                        current = dash.speed;
                    }
                }
                enemy.vel = to_player.map_or(Vec2::ZERO, |d| d * current);
            }
            Behavior::Patrol {
                speed,
                axis,
                timer,
                interval,
                forward,
            } => {
                *timer += dt;
                if *timer >= *interval {
                    *timer -= *interval;
                    *forward = !*forward;
                }
                let sign = if *forward { 1.0 } else { -1.0 };
                enemy.vel = *axis * *speed * sign;
            }
            Behavior::Shooter {
                speed,
                range,
                fire_timer,
                fire_interval,
                shot,
            } => {
                enemy.vel = match to_player {
                    Some(d) if dist > *range => d * *speed,
                    _ => Vec2::ZERO,
                };
                *fire_timer = (*fire_timer - dt).max(0.0);
                if *fire_timer <= 0.0 && dist <= *range * 1.25 {
                    if let Some(d) = to_player {
                        shots.push((enemy.pos, d, *shot));
                        *fire_timer = *fire_interval;
                    }
                }
            }
            Behavior::Player
            | Behavior::Hazard
            | Behavior::Projectile { .. }
            | Behavior::Pickup { .. } => {}
        }

        decay_push(enemy, push_decay, dt);
        let delta = (enemy.vel + enemy.push) * dt;
        integrate(enemy, &state.world.level, delta, true);
        apply_boundary(enemy, &state.world.bounds, target, policy);
    }

    for (pos, dir, shot) in shots {
        let id = state.next_entity_id();
        state.world.projectiles.push(Entity::projectile(
            id,
            Team::Enemy,
            pos,
            dir * shot.speed,
            shot.damage,
            shot.ttl,
            None,
            0.0,
        ));
    }
}

fn step_projectiles(state: &mut GameState, dt: f32) {
    let target = state.world.player.pos;
    let policy = state.tuning.projectile_boundary;
    let level = &state.world.level;

    for p in state.world.projectiles.iter_mut().filter(|p| p.alive) {
        let delta = p.vel * dt;
        integrate(p, level, delta, false);
        if level.blocks_circle(p.pos, p.radius) {
            p.alive = false;
            continue;
        }
        apply_boundary(p, &state.world.bounds, target, policy);
        p.tick_ttl(dt);
    }
}

fn step_pickups(state: &mut GameState, input: &TickInput, dt: f32) {
    let target = state.world.player.pos;
    let t = &state.tuning;

    for pickup in state.world.pickups.iter_mut().filter(|p| p.alive) {
        if input.interact && pickup.pos.distance(target) < t.interact_radius {
            if let Some(d) = direction_to(pickup.pos, target) {
                let delta = d * t.interact_pull_speed * dt;
                integrate(pickup, &state.world.level, delta, false);
            }
        }
        pickup.tick_ttl(dt);
    }
}

fn step_particles(state: &mut GameState, dt: f32) {
    for p in &mut state.world.particles {
        p.pos += p.vel * dt;
        p.vel *= (1.0 - 3.0 * dt).max(0.0);
        p.life -= dt;
    }
}

fn decay_push(entity: &mut Entity, rate: f32, dt: f32) {
    entity.push *= (1.0 - rate * dt).max(0.0);
    if entity.push.length_squared() < 1e-4 {
        entity.push = Vec2::ZERO;
    }
}

/// Move by `delta`, optionally sliding along static geometry.
///
/// A non-finite result leaves the entity where it was for this frame.
pub fn integrate(entity: &mut Entity, level: &Level, delta: Vec2, slide: bool) {
    let next = if slide {
        level.slide(entity.pos, entity.radius, delta)
    } else {
        entity.pos + delta
    };
    if next.is_finite() {
        entity.pos = next;
    } else {
        log::warn!("Skipping motion for entity {}: non-finite position", entity.id);
        if !entity.vel.is_finite() {
            entity.vel = Vec2::ZERO;
        }
        if !entity.push.is_finite() {
            entity.push = Vec2::ZERO;
        }
    }
}

fn clamp_to(entity: &mut Entity, bounds: &Aabb) {
    let inner = bounds.shrink(entity.radius);
    let clamped = entity.pos.clamp(inner.min, inner.max);
    if clamped.x != entity.pos.x {
        entity.vel.x = 0.0;
    }
    if clamped.y != entity.pos.y {
        entity.vel.y = 0.0;
    }
    entity.pos = clamped;
}

/// Enforce a boundary policy.
///
/// Despawn uses a strict `>`: an entity exactly at `max_distance` stays.
pub fn apply_boundary(entity: &mut Entity, bounds: &Aabb, anchor: Vec2, policy: BoundaryPolicy) {
    match policy {
        BoundaryPolicy::Clamp => clamp_to(entity, bounds),
        BoundaryPolicy::Reflect { restitution } => {
            let inner = bounds.shrink(entity.radius);
            if entity.pos.x < inner.min.x {
                entity.pos.x = inner.min.x;
                entity.vel.x = entity.vel.x.abs() * restitution;
            } else if entity.pos.x > inner.max.x {
                entity.pos.x = inner.max.x;
                entity.vel.x = -entity.vel.x.abs() * restitution;
            }
            if entity.pos.y < inner.min.y {
                entity.pos.y = inner.min.y;
                entity.vel.y = entity.vel.y.abs() * restitution;
            } else if entity.pos.y > inner.max.y {
                entity.pos.y = inner.max.y;
                entity.vel.y = -entity.vel.y.abs() * restitution;
            }
        }
        BoundaryPolicy::Despawn { max_distance } => {
            if entity.pos.distance(anchor) > max_distance {
                entity.alive = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::entity::PickupKind;
    use crate::sim::state::GamePhase;

    fn quiet_state() -> GameState {
        let mut tuning = Tuning::default();
        tuning.auto_fire = false;
        let mut state = GameState::new(1, tuning);
        state.phase = GamePhase::Playing;
        state
    }

    fn push_chaser(state: &mut GameState, pos: Vec2) -> u32 {
        let id = state.next_entity_id();
        let profile = state.tuning.chaser;
        state.world.enemies.push(Entity::chaser(id, pos, &profile, None));
        id
    }

    #[test]
    fn test_zero_dt_keeps_positions() {
        let mut state = quiet_state();
        state.world.player.vel = Vec2::new(50.0, -20.0);
        push_chaser(&mut state, Vec2::new(100.0, 0.0));
        let id = state.next_entity_id();
        state.world.projectiles.push(Entity::projectile(
            id,
            Team::Player,
            Vec2::new(-50.0, 0.0),
            Vec2::new(300.0, 0.0),
            1.0,
            1.0,
            None,
            0.0,
        ));
        let before = state.clone();
        let input = TickInput {
            movement: Vec2::X,
            ..Default::default()
        };
        advance(&mut state, &input, 0.0, &mut Vec::new());

        assert_eq!(state.world.player.pos, before.world.player.pos);
        assert_eq!(state.world.enemies[0].pos, before.world.enemies[0].pos);
        assert_eq!(state.world.projectiles[0].pos, before.world.projectiles[0].pos);
    }

    #[test]
    fn test_friction_decays_player_velocity() {
        let mut state = quiet_state();
        state.world.player.vel = Vec2::new(200.0, 0.0);
        advance(&mut state, &TickInput::default(), 0.05, &mut Vec::new());
        // vel *= 1 - 8 * 0.05
        assert!((state.world.player.vel.x - 120.0).abs() < 1e-3);
        assert!((state.world.player.pos.x - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_run_spends_stamina_and_raises_speed_cap() {
        let mut state = quiet_state();
        let run = TickInput {
            movement: Vec2::X,
            run: true,
            ..Default::default()
        };
        state.world.player.vel = Vec2::new(2000.0, 0.0);
        advance(&mut state, &run, 0.1, &mut Vec::new());
        // (2000 + 2400 * 0.1) * (1 - 8 * 0.1) = 448, capped at 240 * 1.6
        assert!((state.world.player.vel.x - 384.0).abs() < 1e-3);
        assert!((state.session.stamina.value - 96.5).abs() < 1e-3);

        let walk = TickInput {
            movement: Vec2::X,
            ..Default::default()
        };
        state.world.player.vel = Vec2::new(2000.0, 0.0);
        advance(&mut state, &walk, 0.1, &mut Vec::new());
        assert!((state.world.player.vel.x - 240.0).abs() < 1e-3);
        assert!((state.session.stamina.value - 98.5).abs() < 1e-3);
    }

    #[test]
    fn test_run_without_stamina_is_a_walk() {
        let mut state = quiet_state();
        state.session.stamina.value = 0.0;
        state.world.player.vel = Vec2::new(2000.0, 0.0);
        let run = TickInput {
            movement: Vec2::X,
            run: true,
            ..Default::default()
        };
        advance(&mut state, &run, 0.1, &mut Vec::new());
        assert!((state.world.player.vel.x - 240.0).abs() < 1e-3);
        // Not running, so it regenerates
        assert!((state.session.stamina.value - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_interact_pulls_pickups_in_radius() {
        let mut state = quiet_state();
        for pos in [Vec2::new(100.0, 0.0), Vec2::new(0.0, 250.0)] {
            let id = state.next_entity_id();
            state
                .world
                .pickups
                .push(Entity::pickup(id, pos, PickupKind::Coolant, 10.0));
        }

        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        assert_eq!(state.world.pickups[0].pos, Vec2::new(100.0, 0.0));

        let interact = TickInput {
            interact: true,
            ..Default::default()
        };
        advance(&mut state, &interact, 0.1, &mut Vec::new());
        // 300 px/s toward the player for 0.1 s
        assert!((state.world.pickups[0].pos - Vec2::new(70.0, 0.0)).length() < 1e-3);
        assert_eq!(state.world.pickups[1].pos, Vec2::new(0.0, 250.0));
    }

    #[test]
    fn test_auto_aim_nearest_enemy_tie_to_lower_id() {
        let mut state = quiet_state();
        let below = push_chaser(&mut state, Vec2::new(0.0, 200.0));
        let right = push_chaser(&mut state, Vec2::new(200.0, 0.0));
        push_chaser(&mut state, Vec2::new(-300.0, 0.0));
        assert!(below < right);

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        advance(&mut state, &fire, 0.0, &mut Vec::new());
        assert_eq!(state.world.projectiles.len(), 1);
        let vel = state.world.projectiles[0].vel;
        assert!((vel - Vec2::new(0.0, 720.0)).length() < 1e-2);
    }

    #[test]
    fn test_auto_aim_ignores_enemies_out_of_range() {
        let mut state = quiet_state();
        push_chaser(&mut state, Vec2::new(0.0, -700.0));
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        advance(&mut state, &fire, 0.0, &mut Vec::new());
        // Falls back to the sweeping heading, which starts along +x
        let vel = state.world.projectiles[0].vel;
        assert!((vel - Vec2::new(720.0, 0.0)).length() < 1e-2);
    }

    #[test]
    fn test_chaser_seeks_player() {
        let mut state = quiet_state();
        push_chaser(&mut state, Vec2::new(100.0, 0.0));
        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        let e = &state.world.enemies[0];
        assert!((e.vel - Vec2::new(-120.0, 0.0)).length() < 1e-3);
        assert!((e.pos.x - 88.0).abs() < 1e-3);
    }

    #[test]
    fn test_chaser_on_top_of_player_does_not_nan() {
        let mut state = quiet_state();
        push_chaser(&mut state, Vec2::ZERO);
        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        assert!(state.world.enemies[0].pos.is_finite());
        assert_eq!(state.world.enemies[0].pos, Vec2::ZERO);
    }

    #[test]
    fn test_non_finite_motion_is_skipped() {
        let mut state = quiet_state();
        let id = push_chaser(&mut state, Vec2::new(10.0, 10.0));
        let e = state.world.enemies.iter_mut().find(|e| e.id == id).unwrap();
        e.push = Vec2::new(f32::NAN, 0.0);
        let before = e.pos;
        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        let e = &state.world.enemies[0];
        assert_eq!(e.pos, before);
        assert!(e.is_finite());
    }

    #[test]
    fn test_patrol_turns_on_interval() {
        let mut state = quiet_state();
        let id = state.next_entity_id();
        let profile = state.tuning.patrol;
        state
            .world
            .enemies
            .push(Entity::patrol(id, Vec2::new(300.0, 0.0), &profile, Vec2::X, 1.0));
        for _ in 0..9 {
            advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        }
        assert!(state.world.enemies[0].vel.x > 0.0);
        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        advance(&mut state, &TickInput::default(), 0.05, &mut Vec::new());
        assert!(state.world.enemies[0].vel.x < 0.0);
    }

    #[test]
    fn test_shooter_fires_in_range() {
        let mut state = quiet_state();
        let id = state.next_entity_id();
        let profile = state.tuning.shooter;
        let shot = super::super::entity::ShotSpec {
            speed: 100.0,
            damage: 5.0,
            ttl: 2.0,
        };
        state.world.enemies.push(Entity::shooter(
            id,
            Vec2::new(200.0, 0.0),
            &profile,
            300.0,
            0.5,
            shot,
        ));
        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        assert!(state.world.projectiles.is_empty());
        assert_eq!(state.world.enemies[0].vel, Vec2::ZERO);
        for _ in 0..6 {
            advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        }
        assert_eq!(state.world.projectiles.len(), 1);
        assert_eq!(state.world.projectiles[0].team, Team::Enemy);
        assert!(state.world.projectiles[0].vel.x < 0.0);
    }

    #[test]
    fn test_weapon_volley_and_overheat() {
        let mut state = quiet_state();
        state.weapon.bullet_count = 3;
        state.tuning.heat_per_shot = 60.0;
        let input = TickInput {
            fire: true,
            aim: Some(Vec2::X),
            ..Default::default()
        };
        let mut events = Vec::new();
        advance(&mut state, &input, 0.0, &mut events);
        assert_eq!(state.world.projectiles.len(), 3);
        assert!(events.contains(&GameEvent::Shoot));

        // Cooldown blocks the next shot
        advance(&mut state, &input, 0.0, &mut events);
        assert_eq!(state.world.projectiles.len(), 3);

        // Second volley fills the heat meter
        let fire_interval = state.weapon.fire_interval;
        advance(&mut state, &input, fire_interval, &mut events);
        assert!(state.session.overheated);
        assert!(events.contains(&GameEvent::Overheated));
        let count = state.world.projectiles.len();
        let fire_interval = state.weapon.fire_interval;
        advance(&mut state, &input, fire_interval, &mut events);
        assert_eq!(state.world.projectiles.len(), count);
    }

    #[test]
    fn test_projectile_ttl_and_walls() {
        let mut state = quiet_state();
        state.world.level.walls.push(Aabb::new(
            Vec2::new(50.0, -10.0),
            Vec2::new(60.0, 10.0),
        ));
        let id = state.next_entity_id();
        state.world.projectiles.push(Entity::projectile(
            id,
            Team::Player,
            Vec2::new(40.0, 0.0),
            Vec2::new(100.0, 0.0),
            1.0,
            5.0,
            None,
            0.0,
        ));
        let id = state.next_entity_id();
        state.world.projectiles.push(Entity::projectile(
            id,
            Team::Player,
            Vec2::new(0.0, 100.0),
            Vec2::ZERO,
            1.0,
            0.05,
            None,
            0.0,
        ));
        advance(&mut state, &TickInput::default(), 0.1, &mut Vec::new());
        assert!(state.world.projectiles.iter().all(|p| !p.alive));
    }

    #[test]
    fn test_boundary_despawn_threshold_is_stable() {
        let bounds = Aabb::from_center(Vec2::ZERO, Vec2::splat(1000.0));
        let policy = BoundaryPolicy::Despawn { max_distance: 100.0 };
        let mut e = Entity::hazard(1, Vec2::new(100.0, 0.0), 5.0, 0.0);
        for _ in 0..10 {
            apply_boundary(&mut e, &bounds, Vec2::ZERO, policy);
            assert!(e.alive);
        }
        e.pos.x = 100.01;
        apply_boundary(&mut e, &bounds, Vec2::ZERO, policy);
        assert!(!e.alive);
    }

    #[test]
    fn test_boundary_clamp_and_reflect_idempotent_at_edge() {
        let bounds = Aabb::from_center(Vec2::ZERO, Vec2::splat(100.0));
        let mut e = Entity::hazard(1, Vec2::new(95.0, 0.0), 5.0, 0.0);
        e.vel = Vec2::new(10.0, 0.0);
        apply_boundary(&mut e, &bounds, Vec2::ZERO, BoundaryPolicy::Clamp);
        assert_eq!(e.pos.x, 95.0);
        assert_eq!(e.vel.x, 10.0);

        let reflect = BoundaryPolicy::Reflect { restitution: 0.5 };
        e.pos.x = 120.0;
        apply_boundary(&mut e, &bounds, Vec2::ZERO, reflect);
        assert_eq!(e.pos.x, 95.0);
        assert_eq!(e.vel.x, -5.0);
        apply_boundary(&mut e, &bounds, Vec2::ZERO, reflect);
        assert_eq!(e.pos.x, 95.0);
        assert_eq!(e.vel.x, -5.0);
    }

    #[test]
    fn test_skill_requests_blast() {
        let mut state = quiet_state();
        let input = TickInput {
            skill: true,
            ..Default::default()
        };
        let out = advance(&mut state, &input, 0.016, &mut Vec::new());
        assert_eq!(out.blasts.len(), 1);
        let again = advance(&mut state, &input, 0.016, &mut Vec::new());
        assert!(again.blasts.is_empty());
    }
}

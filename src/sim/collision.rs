//! Collision detection and event resolution
//!
//! Runs once per frame after the simulation step. Every pass walks its
//! collections in ascending ID order so outcomes never depend on insertion
//! order. An entity killed earlier in the frame is skipped by later passes.

use glam::Vec2;

use super::entity::{Behavior, DamageOutcome, Entity, EntityId, PickupKind, Team, circles_overlap};
use super::progression;
use super::state::{GameEvent, GameState, burst};
use super::step::Blast;

const HIT_COLOR: [f32; 4] = [1.0, 0.85, 0.3, 1.0];
const KILL_COLOR: [f32; 4] = [1.0, 0.35, 0.2, 1.0];
const HURT_FLASH: [f32; 4] = [1.0, 0.0, 0.0, 0.3];

/// Resolve all overlaps for this frame
pub fn resolve(state: &mut GameState, blasts: &[Blast], events: &mut Vec<GameEvent>) {
    player_projectiles_vs_enemies(state, events);
    for blast in blasts {
        apply_blast(state, blast, events);
    }

    let mut hurt = 0.0;
    hurt += enemy_projectiles_vs_player(state);
    hurt += contact_damage(&state.world.hazards, &state.world.player);
    hurt += contact_damage(&state.world.enemies, &state.world.player);
    if hurt > 0.0 {
        hurt_player(state, hurt, events);
    }

    collect_pickups(state, events);
}

/// Live enemy overlapping `pos`/`radius` that is closest to `pos`.
///
/// Ties on distance go to the lower ID.
pub fn nearest_overlapping(enemies: &[Entity], pos: Vec2, radius: f32) -> Option<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.alive && circles_overlap(pos, radius, e.pos, e.radius))
        .min_by(|(_, a), (_, b)| {
            a.pos
                .distance_squared(pos)
                .total_cmp(&b.pos.distance_squared(pos))
                .then(a.id.cmp(&b.id))
        })
        .map(|(i, _)| i)
}

fn player_projectiles_vs_enemies(state: &mut GameState, events: &mut Vec<GameEvent>) {
    for pi in 0..state.world.projectiles.len() {
        let p = &state.world.projectiles[pi];
        if !p.alive || p.team != Team::Player {
            continue;
        }
        let Behavior::Projectile {
            damage,
            splash,
            knockback,
        } = p.behavior
        else {
            continue;
        };
        let (pos, radius, heading) = (p.pos, p.radius, p.vel.normalize_or_zero());

        let Some(ei) = nearest_overlapping(&state.world.enemies, pos, radius) else {
            continue;
        };

        // Consumed on first contact
        state.world.projectiles[pi].alive = false;
        let target = state.world.enemies[ei].id;
        state.world.enemies[ei].push += heading * knockback;
        damage_enemy(state, ei, damage, events);

        // Splash covers the primary target too; a dead one is skipped
        if let Some(splash) = splash {
            for ej in 0..state.world.enemies.len() {
                let e = &state.world.enemies[ej];
                if !e.alive {
                    continue;
                }
                if pos.distance(e.pos) < splash.radius + e.radius {
                    damage_enemy(state, ej, splash.damage, events);
                }
            }
            log::trace!("Splash from projectile hit on {}", target);
        }
    }
}

fn apply_blast(state: &mut GameState, blast: &Blast, events: &mut Vec<GameEvent>) {
    let knockback = state.tuning.knockback;
    for ei in 0..state.world.enemies.len() {
        let e = &state.world.enemies[ei];
        if !e.alive || !circles_overlap(blast.pos, blast.radius, e.pos, e.radius) {
            continue;
        }
        let away = (e.pos - blast.pos).normalize_or_zero();
        state.world.enemies[ei].push += away * knockback * 2.0;
        damage_enemy(state, ei, blast.damage, events);
    }
}

/// Damage one enemy; a kill is credited exactly once
fn damage_enemy(state: &mut GameState, index: usize, amount: f32, events: &mut Vec<GameEvent>) {
    let cap = state.tuning.max_particles;
    let enemy = &mut state.world.enemies[index];
    let (id, pos) = (enemy.id, enemy.pos);
    match enemy.apply_damage(amount) {
        DamageOutcome::Ignored => {}
        DamageOutcome::Wounded => {
            events.push(GameEvent::Hit { target: id });
            burst(&mut state.world.particles, &mut state.rng, pos, HIT_COLOR, 3, cap);
        }
        DamageOutcome::Killed => {
            let (reward, xp, elite) = (enemy.reward, enemy.xp, enemy.elite);
            events.push(GameEvent::Kill { target: id });
            let count = if elite { 24 } else { 10 };
            burst(&mut state.world.particles, &mut state.rng, pos, KILL_COLOR, count, cap);
            progression::award_kill(state, reward, xp, elite, pos);
            log::debug!("Enemy {} killed (+{})", id, reward);
        }
    }
}

/// Total damage from hostile projectiles touching the player; they are consumed
fn enemy_projectiles_vs_player(state: &mut GameState) -> f32 {
    let player = &state.world.player;
    if !player.alive {
        return 0.0;
    }
    let mut total = 0.0;
    for p in state.world.projectiles.iter_mut() {
        if !p.alive || !p.team.opposes(player.team) || !p.overlaps(player) {
            continue;
        }
        if let Behavior::Projectile { damage, .. } = p.behavior {
            total += damage;
            p.alive = false;
        }
    }
    total
}

/// Per-frame contact damage from every live overlapping source
fn contact_damage(sources: &[Entity], player: &Entity) -> f32 {
    if !player.alive {
        return 0.0;
    }
    sources
        .iter()
        .filter(|s| s.alive && s.contact_damage > 0.0 && s.overlaps(player))
        .map(|s| s.contact_damage)
        .sum()
}

fn hurt_player(state: &mut GameState, amount: f32, events: &mut Vec<GameEvent>) {
    if state.world.player.apply_damage(amount) == DamageOutcome::Ignored {
        return;
    }
    let session = &mut state.session;
    session.shake = session.shake.max(state.tuning.shake_on_hurt);
    state.effects.flash(HURT_FLASH, 0.1);
    events.push(GameEvent::PlayerHurt);
}

fn collect_pickups(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if !state.world.player.alive {
        return;
    }
    let mut collected: Vec<(EntityId, PickupKind, Vec2)> = Vec::new();
    for pickup in state.world.pickups.iter_mut() {
        if !pickup.alive || !pickup.overlaps(&state.world.player) {
            continue;
        }
        if let Behavior::Pickup { kind } = pickup.behavior {
            pickup.alive = false;
            collected.push((pickup.id, kind, pickup.pos));
        }
    }

    for (id, kind, pos) in collected {
        let label = match kind {
            PickupKind::Heal(amount) => {
                state.world.player.heal(amount);
                "+HP"
            }
            PickupKind::Coolant => {
                state.session.heat.value = 0.0;
                state.session.overheated = false;
                "COOLED"
            }
            PickupKind::Stamina => {
                let max = state.session.stamina.max;
                state.session.stamina.add(max);
                "+STAMINA"
            }
        };
        log::debug!("Collected pickup {} ({:?})", id, kind);
        state.effects.floating_text(label, pos);
        events.push(GameEvent::Pickup);
    }
}

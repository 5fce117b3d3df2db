//! Score, experience, level-ups and waves

use glam::Vec2;
use rand::Rng;

use super::spawner;
use super::state::{GameEvent, GameState};

/// Weapon upgrade granted on level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    FireRate,
    Damage,
    Multishot,
}

impl Upgrade {
    pub fn label(self) -> &'static str {
        match self {
            Upgrade::FireRate => "FIRE RATE UP",
            Upgrade::Damage => "DAMAGE UP",
            Upgrade::Multishot => "MULTISHOT",
        }
    }
}

/// Credit a kill: score, xp, elite feedback
pub fn award_kill(
    state: &mut GameState,
    reward: u64,
    xp: u32,
    elite: bool,
    at: Vec2,
) {
    let session = &mut state.session;
    session.score += reward;
    session.xp += xp;
    session.kills += 1;
    if elite {
        session.shake = session.shake.max(state.tuning.shake_on_elite_kill);
        state.effects.floating_text(format!("+{}", reward), at);
    }
}

/// Apply any pending level-ups and wave transitions
pub fn update(state: &mut GameState, events: &mut Vec<GameEvent>) {
    while state.session.next_level_xp > 0 && state.session.xp >= state.session.next_level_xp {
        level_up(state, events);
    }

    let step = state.tuning.wave_score_step;
    while step > 0 && state.session.score >= step * state.session.wave as u64 {
        state.session.wave += 1;
        let wave = state.session.wave;
        log::info!("Wave {} started", wave);
        events.push(GameEvent::WaveStart { wave });
        state.effects.banner(format!("WAVE {}", wave), 2.0);
        let hazards = state.tuning.hazards_per_wave;
        spawner::spawn_hazards(state, hazards);
    }
}

fn level_up(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let session = &mut state.session;
    session.xp -= session.next_level_xp;
    session.level += 1;
    let grown = (session.next_level_xp as f32 * state.tuning.level_xp_growth).floor() as u32;
    session.next_level_xp = grown.max(session.next_level_xp + 1);
    let level = session.level;

    let player = &mut state.world.player;
    player.heal(player.max_hp);

    let upgrade = match state.rng.random_range(0..3) {
        0 => Upgrade::FireRate,
        1 => Upgrade::Damage,
        _ => Upgrade::Multishot,
    };
    apply_upgrade(state, upgrade);

    log::info!("Level {} reached: {:?}", level, upgrade);
    events.push(GameEvent::LevelUp { level });
    let pos = state.world.player.pos - Vec2::new(0.0, state.world.player.radius * 2.0);
    state.effects.floating_text(upgrade.label(), pos);
}

pub fn apply_upgrade(state: &mut GameState, upgrade: Upgrade) {
    let t = &state.tuning;
    let weapon = &mut state.weapon;
    match upgrade {
        Upgrade::FireRate => {
            weapon.fire_interval = (weapon.fire_interval - t.fire_interval_step).max(t.min_fire_interval);
        }
        Upgrade::Damage => weapon.damage += t.projectile_damage * 0.2,
        Upgrade::Multishot => weapon.bullet_count += 1,
    }
}

//! Game state and core simulation types
//!
//! `GameState` is the single owner of the world, the session counters and the
//! RNG. Every pipeline stage receives it by reference; there are no globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::EffectQueue;
use super::entity::{Entity, EntityId};
use super::geometry::{Aabb, Level};
use crate::error::SimError;
use crate::settings::Tuning;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for the start action
    Menu,
    /// Active gameplay
    Playing,
    /// Simulation frozen until resumed
    Paused,
    /// Player died; only a restart leaves this phase
    GameOver,
}

/// Gameplay events emitted during a frame (drive audio and HUD feedback)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    Paused,
    Resumed,
    Shoot,
    Hit { target: EntityId },
    Kill { target: EntityId },
    PlayerHurt,
    Pickup,
    LevelUp { level: u32 },
    WaveStart { wave: u32 },
    Overheated,
    GameOver,
}

/// A bounded resource (stamina, heat)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    pub value: f32,
    pub max: f32,
}

impl Meter {
    pub fn full(max: f32) -> Self {
        Self { value: max, max }
    }

    pub fn empty(max: f32) -> Self {
        Self { value: 0.0, max }
    }

    pub fn add(&mut self, amount: f32) {
        self.value = (self.value + amount).clamp(0.0, self.max);
    }

    pub fn ratio(&self) -> f32 {
        if self.max > 0.0 {
            (self.value / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    /// Seconds left
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

/// Emit `count` particles at `pos`, respecting the particle cap
pub fn burst(
    particles: &mut Vec<Particle>,
    rng: &mut Pcg32,
    pos: Vec2,
    color: [f32; 4],
    count: usize,
    cap: usize,
) {
    use rand::Rng;

    let room = cap.saturating_sub(particles.len());
    for _ in 0..count.min(room) {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(40.0..300.0);
        let life = rng.random_range(0.3..0.7);
        particles.push(Particle {
            pos,
            vel: crate::heading(angle) * speed,
            color,
            life,
            max_life: life,
            size: rng.random_range(1.0..4.0),
        });
    }
}

/// All live entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub player: Entity,
    pub enemies: Vec<Entity>,
    pub hazards: Vec<Entity>,
    pub projectiles: Vec<Entity>,
    pub pickups: Vec<Entity>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub level: Level,
    /// Playable extent
    pub bounds: Aabb,
}

/// Player weapon stats (upgraded on level-up)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: f32,
    pub fire_interval: f32,
    pub bullet_count: u32,
    pub cooldown: f32,
    pub skill_cooldown: f32,
}

impl Weapon {
    pub fn from_tuning(t: &Tuning) -> Self {
        Self {
            damage: t.projectile_damage,
            fire_interval: t.fire_interval,
            bullet_count: t.bullet_count,
            cooldown: 0.0,
            skill_cooldown: 0.0,
        }
    }
}

/// Ephemeral per-run counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub score: u64,
    pub wave: u32,
    pub level: u32,
    pub xp: u32,
    pub next_level_xp: u32,
    pub kills: u32,
    /// Seconds of simulated play
    pub elapsed: f32,
    /// Simulated frames
    pub frame: u64,
    pub stamina: Meter,
    pub heat: Meter,
    pub overheated: bool,
    /// Camera shake magnitude (decays every frame)
    pub shake: f32,
    /// Seconds left on the clock of a timed run
    pub time_left: Option<f32>,
}

impl Session {
    pub fn new(t: &Tuning) -> Self {
        Self {
            score: 0,
            wave: 1,
            level: 1,
            xp: 0,
            next_level_xp: t.first_level_xp,
            kills: 0,
            elapsed: 0.0,
            frame: 0,
            stamina: Meter::full(t.stamina_max),
            heat: Meter::empty(t.heat_max),
            overheated: false,
            shake: 0.0,
            time_left: t.time_limit,
        }
    }

    /// Whether a timed run has used up its clock
    pub fn out_of_time(&self) -> bool {
        self.time_left.is_some_and(|left| left <= 0.0)
    }

    pub fn xp_ratio(&self) -> f32 {
        if self.next_level_xp > 0 {
            (self.xp as f32 / self.next_level_xp as f32).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Spawn countdowns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnTimers {
    /// Seconds until the next enemy spawn
    pub enemy: f32,
    /// Seconds since the last pickup spawn
    pub pickup: f32,
}

impl SpawnTimers {
    /// First enemy arrives one interval into the run
    pub fn new(t: &Tuning) -> Self {
        Self {
            enemy: t.spawn_interval,
            pickup: 0.0,
        }
    }
}

/// Complete game state (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub world: World,
    pub session: Session,
    pub weapon: Weapon,
    pub spawn: SpawnTimers,
    pub effects: EffectQueue,
    pub tuning: Tuning,
    /// Next entity ID
    next_id: EntityId,
}

impl GameState {
    /// Create a new game state in the menu phase
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let bounds = Aabb::from_center(Vec2::ZERO, tuning.world_half_extent);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            world: World {
                player: Entity::player(0, Vec2::ZERO),
                enemies: Vec::new(),
                hazards: Vec::new(),
                projectiles: Vec::new(),
                pickups: Vec::new(),
                particles: Vec::new(),
                level: Level::default(),
                bounds,
            },
            session: Session::new(&tuning),
            weapon: Weapon::from_tuning(&tuning),
            spawn: SpawnTimers::new(&tuning),
            effects: EffectQueue::default(),
            tuning,
            next_id: 1,
        };
        let id = state.next_entity_id();
        state.world.player = Entity::player(id, Vec2::ZERO);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Re-initialize world and session for a fresh run.
    ///
    /// Level geometry and tuning survive; the RNG keeps its stream.
    pub fn reset(&mut self) {
        self.world.enemies.clear();
        self.world.hazards.clear();
        self.world.projectiles.clear();
        self.world.pickups.clear();
        self.world.particles.clear();
        self.world.bounds = Aabb::from_center(Vec2::ZERO, self.tuning.world_half_extent);
        let id = self.next_entity_id();
        self.world.player = Entity::player(id, Vec2::ZERO);
        self.session = Session::new(&self.tuning);
        self.weapon = Weapon::from_tuning(&self.tuning);
        self.spawn = SpawnTimers::new(&self.tuning);
        self.effects.clear();
    }

    /// Live enemy count
    pub fn enemy_count(&self) -> usize {
        self.world.enemies.iter().filter(|e| e.alive).count()
    }

    /// Find any entity by id (player included)
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let w = &self.world;
        std::iter::once(&w.player)
            .chain(&w.enemies)
            .chain(&w.hazards)
            .chain(&w.projectiles)
            .chain(&w.pickups)
            .find(|e| e.id == id)
    }

    /// Drop dead entities and expired particles
    pub fn cleanup(&mut self) {
        let w = &mut self.world;
        w.enemies.retain(|e| e.alive);
        w.hazards.retain(|e| e.alive);
        w.projectiles.retain(|e| e.alive);
        w.pickups.retain(|e| e.alive);
        w.particles.retain(|p| p.life > 0.0);
    }

    /// Post-frame consistency check; any failure halts the loop
    pub fn validate(&self) -> Result<(), SimError> {
        let w = &self.world;
        if !matches!(w.player.behavior, super::entity::Behavior::Player) {
            return Err(SimError::MissingPlayer);
        }
        for e in std::iter::once(&w.player)
            .chain(&w.enemies)
            .chain(&w.hazards)
            .chain(&w.projectiles)
            .chain(&w.pickups)
        {
            if !e.pos.is_finite() {
                return Err(SimError::NonFinite {
                    id: e.id,
                    what: "position",
                });
            }
            if !e.hp.is_finite() {
                return Err(SimError::NonFinite {
                    id: e.id,
                    what: "health",
                });
            }
        }
        if let Some(e) = w
            .enemies
            .iter()
            .chain(&w.hazards)
            .chain(&w.projectiles)
            .chain(&w.pickups)
            .find(|e| !e.alive)
        {
            return Err(SimError::DeadEntityRetained { id: e.id });
        }
        Ok(())
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.world.enemies.sort_by_key(|e| e.id);
        self.world.hazards.sort_by_key(|e| e.id);
        self.world.projectiles.sort_by_key(|e| e.id);
        self.world.pickups.sort_by_key(|e| e.id);
    }
}

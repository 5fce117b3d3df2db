//! Entities and their behavior kinds
//!
//! One `Entity` struct covers the player, enemies, hazards, projectiles and
//! pickups. What an entity *does* each frame is decided by its [`Behavior`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::EnemyProfile;

pub type EntityId = u32;

/// Faction tag; projectiles only hit the opposing team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
    Neutral,
}

impl Team {
    /// Whether an entity of this team is hostile to `other`
    pub fn opposes(self, other: Team) -> bool {
        matches!(
            (self, other),
            (Team::Player, Team::Enemy) | (Team::Enemy, Team::Player)
        )
    }
}

/// Burst-speed cycle for elite chasers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    pub timer: f32,
    pub period: f32,
    pub duration: f32,
    pub speed: f32,
}

impl Dash {
    /// Dashing during the last `duration` seconds of every period
    pub fn is_dashing(&self) -> bool {
        self.timer >= self.period - self.duration
    }

    pub fn advance(&mut self, dt: f32) {
        self.timer += dt;
        if self.timer >= self.period {
            self.timer -= self.period;
        }
    }
}

/// Area damage applied around a projectile's impact point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Splash {
    pub radius: f32,
    pub damage: f32,
}

/// Shot fired by a shooter enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotSpec {
    pub speed: f32,
    pub damage: f32,
    pub ttl: f32,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    /// Restore health (capped at max)
    Heal(f32),
    /// Vent all weapon heat
    Coolant,
    /// Refill stamina
    Stamina,
}

/// Per-frame behavior, dispatched by `match` in the simulation step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Player,
    /// Steers straight at the player every frame
    Chaser { speed: f32, dash: Option<Dash> },
    /// Walks back and forth along `axis`, turning around every `interval` seconds
    Patrol {
        speed: f32,
        axis: Vec2,
        timer: f32,
        interval: f32,
        forward: bool,
    },
    /// Closes to `range`, then holds position and fires at the player
    Shooter {
        speed: f32,
        range: f32,
        fire_timer: f32,
        fire_interval: f32,
        shot: ShotSpec,
    },
    /// Never moves; hurts the player on every overlapping frame
    Hazard,
    Projectile {
        damage: f32,
        splash: Option<Splash>,
        knockback: f32,
    },
    Pickup { kind: PickupKind },
}

/// Result of applying damage to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Entity was already dead; nothing changed
    Ignored,
    /// Damage applied, entity still alive
    Wounded,
    /// This hit killed the entity (reported exactly once per entity)
    Killed,
}

/// A simulated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub team: Team,
    pub behavior: Behavior,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Knockback impulse, decays over time
    #[serde(default)]
    pub push: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Seconds left before automatic removal
    pub ttl: Option<f32>,
    /// Damage dealt to the player per overlapping frame
    pub contact_damage: f32,
    /// Score awarded on death
    pub reward: u64,
    /// Experience awarded on death
    pub xp: u32,
    /// Elites shake the camera when they die
    #[serde(default)]
    pub elite: bool,
    pub alive: bool,
}

impl Entity {
    fn base(id: EntityId, team: Team, behavior: Behavior, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            team,
            behavior,
            pos,
            vel: Vec2::ZERO,
            push: Vec2::ZERO,
            radius,
            hp: 1.0,
            max_hp: 1.0,
            ttl: None,
            contact_damage: 0.0,
            reward: 0,
            xp: 0,
            elite: false,
            alive: true,
        }
    }

    pub fn player(id: EntityId, pos: Vec2) -> Self {
        let mut e = Self::base(id, Team::Player, Behavior::Player, pos, PLAYER_RADIUS);
        e.hp = PLAYER_MAX_HP;
        e.max_hp = PLAYER_MAX_HP;
        e
    }

    fn enemy(id: EntityId, behavior: Behavior, pos: Vec2, profile: &EnemyProfile) -> Self {
        let mut e = Self::base(id, Team::Enemy, behavior, pos, profile.radius);
        e.hp = profile.hp;
        e.max_hp = profile.hp;
        e.contact_damage = profile.contact_damage;
        e.reward = profile.reward;
        e.xp = profile.xp;
        e
    }

    pub fn chaser(id: EntityId, pos: Vec2, profile: &EnemyProfile, dash: Option<Dash>) -> Self {
        let mut e = Self::enemy(
            id,
            Behavior::Chaser {
                speed: profile.speed,
                dash,
            },
            pos,
            profile,
        );
        e.elite = dash.is_some();
        e
    }

    pub fn patrol(id: EntityId, pos: Vec2, profile: &EnemyProfile, axis: Vec2, interval: f32) -> Self {
        Self::enemy(
            id,
            Behavior::Patrol {
                speed: profile.speed,
                axis: axis.normalize_or_zero(),
                timer: 0.0,
                interval,
                forward: true,
            },
            pos,
            profile,
        )
    }

    pub fn shooter(
        id: EntityId,
        pos: Vec2,
        profile: &EnemyProfile,
        range: f32,
        fire_interval: f32,
        shot: ShotSpec,
    ) -> Self {
        Self::enemy(
            id,
            Behavior::Shooter {
                speed: profile.speed,
                range,
                fire_timer: fire_interval,
                fire_interval,
                shot,
            },
            pos,
            profile,
        )
    }

    pub fn hazard(id: EntityId, pos: Vec2, radius: f32, damage_per_tick: f32) -> Self {
        let mut e = Self::base(id, Team::Neutral, Behavior::Hazard, pos, radius);
        e.contact_damage = damage_per_tick;
        e
    }

    #[allow(clippy::too_many_arguments)]
    pub fn projectile(
        id: EntityId,
        team: Team,
        pos: Vec2,
        vel: Vec2,
        damage: f32,
        ttl: f32,
        splash: Option<Splash>,
        knockback: f32,
    ) -> Self {
        let mut e = Self::base(
            id,
            team,
            Behavior::Projectile {
                damage,
                splash,
                knockback,
            },
            pos,
            PROJECTILE_RADIUS,
        );
        e.vel = vel;
        e.ttl = Some(ttl);
        e
    }

    pub fn pickup(id: EntityId, pos: Vec2, kind: PickupKind, ttl: f32) -> Self {
        let mut e = Self::base(id, Team::Neutral, Behavior::Pickup { kind }, pos, PICKUP_RADIUS);
        e.ttl = Some(ttl);
        e
    }

    /// Circle overlap test (strict: touching edges do not overlap)
    pub fn overlaps(&self, other: &Entity) -> bool {
        circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }

    /// Subtract `amount` from health; death is terminal
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.alive = false;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded
        }
    }

    /// Restore health up to max
    pub fn heal(&mut self, amount: f32) {
        if self.alive {
            self.hp = (self.hp + amount).min(self.max_hp);
        }
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Count down time-to-live; marks the entity dead at zero
    pub fn tick_ttl(&mut self, dt: f32) {
        if let Some(ttl) = self.ttl.as_mut() {
            *ttl -= dt;
            if *ttl <= 0.0 {
                *ttl = 0.0;
                self.alive = false;
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.push.is_finite()
    }
}

/// `distance(a, b) < ra + rb`
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

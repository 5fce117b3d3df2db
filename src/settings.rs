//! Game settings and tuning
//!
//! Everything gameplay-relevant is data-driven through [`Tuning`]; [`Settings`]
//! adds the player-facing preferences (audio, reduced motion). Loaded from JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// What happens to an entity that leaves the playable area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Pin the entity inside the world extent
    Clamp,
    /// Bounce off the world extent, scaling the reflected velocity
    Reflect { restitution: f32 },
    /// Remove the entity once it is farther than `max_distance` from the player
    Despawn { max_distance: f32 },
}

/// Stat block for one enemy archetype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub radius: f32,
    pub hp: f32,
    pub speed: f32,
    /// Damage dealt to the player on every overlapping frame
    pub contact_damage: f32,
    /// Score awarded on death
    pub reward: u64,
    /// Experience awarded on death
    pub xp: u32,
}

/// Gameplay balance, all units in world pixels and seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// World spans `[-half_extent, +half_extent]` on both axes
    pub world_half_extent: Vec2,
    pub max_frame_dt: f32,
    /// Session length in seconds; `None` runs until the player dies
    pub time_limit: Option<f32>,

    // === Player ===
    pub player_accel: f32,
    pub player_max_speed: f32,
    pub run_multiplier: f32,
    /// Velocity decay per second for player-controlled motion
    pub friction: f32,
    pub stamina_max: f32,
    pub stamina_drain: f32,
    pub stamina_regen: f32,

    // === Weapon ===
    pub auto_fire: bool,
    pub fire_interval: f32,
    pub min_fire_interval: f32,
    pub fire_interval_step: f32,
    pub projectile_speed: f32,
    pub projectile_ttl: f32,
    pub projectile_damage: f32,
    pub bullet_count: u32,
    pub spread: f32,
    pub knockback: f32,
    pub auto_aim_range: f32,
    pub heat_max: f32,
    pub heat_per_shot: f32,
    pub heat_cooling: f32,
    /// Overheat clears once heat drops below `heat_max * heat_recover_ratio`
    pub heat_recover_ratio: f32,
    /// Area damage on impact; `None` disables splash
    pub splash_radius: Option<f32>,
    pub splash_damage: f32,
    pub skill_radius: f32,
    pub skill_damage: f32,
    pub skill_cooldown: f32,
    pub skill_stamina_cost: f32,
    pub interact_radius: f32,
    pub interact_pull_speed: f32,

    // === Enemies ===
    pub chaser: EnemyProfile,
    pub elite: EnemyProfile,
    pub patrol: EnemyProfile,
    pub shooter: EnemyProfile,
    pub elite_after_score: u64,
    pub elite_chance: f64,
    pub shooter_from_wave: u32,
    pub patrol_chance: f64,
    pub dash_period: f32,
    pub dash_duration: f32,
    pub dash_speed: f32,
    pub patrol_interval: f32,
    pub shooter_range: f32,
    pub shooter_fire_interval: f32,
    pub shooter_shot_speed: f32,
    pub shooter_shot_damage: f32,
    /// Knockback decay rate per second
    pub push_decay: f32,

    // === Hazards & pickups ===
    pub hazard_radius: f32,
    pub hazard_damage_per_tick: f32,
    pub hazards_per_wave: u32,
    pub pickup_interval: f32,
    pub pickup_distance: f32,
    pub pickup_ttl: f32,
    pub pickup_heal: f32,

    // === Spawning & progression ===
    pub spawn_interval: f32,
    pub spawn_distance: f32,
    pub enemy_cap_base: usize,
    pub enemy_cap_per_wave: usize,
    pub wave_score_step: u64,
    pub first_level_xp: u32,
    pub level_xp_growth: f32,

    // === Boundaries ===
    pub enemy_boundary: BoundaryPolicy,
    pub projectile_boundary: BoundaryPolicy,

    // === Feedback ===
    pub shake_on_hurt: f32,
    pub shake_on_elite_kill: f32,
    pub max_particles: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world_half_extent: Vec2::new(2000.0, 2000.0),
            max_frame_dt: MAX_FRAME_DT,
            time_limit: None,

            player_accel: 2400.0,
            player_max_speed: 240.0,
            run_multiplier: 1.6,
            friction: 8.0,
            stamina_max: 100.0,
            stamina_drain: 35.0,
            stamina_regen: 20.0,

            auto_fire: true,
            fire_interval: 0.25,
            min_fire_interval: 0.08,
            fire_interval_step: 0.03,
            projectile_speed: 720.0,
            projectile_ttl: 1.0,
            projectile_damage: 25.0,
            bullet_count: 1,
            spread: 0.2,
            knockback: 150.0,
            auto_aim_range: 600.0,
            heat_max: 100.0,
            heat_per_shot: 6.0,
            heat_cooling: 30.0,
            heat_recover_ratio: 0.3,
            splash_radius: None,
            splash_damage: 10.0,
            skill_radius: 140.0,
            skill_damage: 40.0,
            skill_cooldown: 6.0,
            skill_stamina_cost: 30.0,
            interact_radius: 200.0,
            interact_pull_speed: 300.0,

            chaser: EnemyProfile {
                radius: 12.0,
                hp: 60.0,
                speed: 120.0,
                contact_damage: 0.5,
                reward: 10,
                xp: 1,
            },
            elite: EnemyProfile {
                radius: 20.0,
                hp: 250.0,
                speed: 90.0,
                contact_damage: 1.0,
                reward: 50,
                xp: 5,
            },
            patrol: EnemyProfile {
                radius: 14.0,
                hp: 75.0,
                speed: 80.0,
                contact_damage: 0.75,
                reward: 15,
                xp: 2,
            },
            shooter: EnemyProfile {
                radius: 14.0,
                hp: 50.0,
                speed: 100.0,
                contact_damage: 0.5,
                reward: 20,
                xp: 3,
            },
            elite_after_score: 50,
            elite_chance: 0.1,
            shooter_from_wave: 3,
            patrol_chance: 0.15,
            dash_period: 3.3,
            dash_duration: 0.35,
            dash_speed: 480.0,
            patrol_interval: 2.0,
            shooter_range: 320.0,
            shooter_fire_interval: 1.5,
            shooter_shot_speed: 360.0,
            shooter_shot_damage: 8.0,
            push_decay: 6.0,

            hazard_radius: 30.0,
            hazard_damage_per_tick: 1.0,
            hazards_per_wave: 1,
            pickup_interval: 10.0,
            pickup_distance: 300.0,
            pickup_ttl: 20.0,
            pickup_heal: 20.0,

            spawn_interval: 1.0,
            spawn_distance: 700.0,
            enemy_cap_base: 50,
            enemy_cap_per_wave: 2,
            wave_score_step: 200,
            first_level_xp: 20,
            level_xp_growth: 1.5,

            enemy_boundary: BoundaryPolicy::Despawn {
                max_distance: 1500.0,
            },
            projectile_boundary: BoundaryPolicy::Despawn {
                max_distance: 1200.0,
            },

            shake_on_hurt: 5.0,
            shake_on_elite_kill: 10.0,
            max_particles: MAX_PARTICLES,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gameplay balance
    pub tuning: Tuning,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Minimum seconds between two plays of the same sound
    pub sound_throttle_secs: f64,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no camera shake, no screen flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            sound_throttle_secs: 0.05,
            mute_on_blur: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Element id of the inline JSON config block (web)
    #[allow(dead_code)]
    const CONFIG_ELEMENT_ID: &'static str = "arcade-config";

    /// Environment variable naming a JSON config file (native)
    pub const CONFIG_ENV: &'static str = "ARCADE_LOOP_CONFIG";

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tuning;
        if !(t.max_frame_dt > 0.0 && t.max_frame_dt <= 1.0) {
            return Err(invalid("tuning.max_frame_dt", "must be in (0, 1]"));
        }
        if !(t.world_half_extent.x > 0.0 && t.world_half_extent.y > 0.0) {
            return Err(invalid("tuning.world_half_extent", "must be positive"));
        }
        if let Some(limit) = t.time_limit {
            if !(limit > 0.0 && limit.is_finite()) {
                return Err(invalid("tuning.time_limit", "must be positive"));
            }
        }
        for (field, secs) in [
            ("tuning.spawn_interval", t.spawn_interval),
            ("tuning.pickup_interval", t.pickup_interval),
            ("tuning.pickup_ttl", t.pickup_ttl),
        ] {
            if !(secs > 0.0) {
                return Err(invalid(field, "must be positive"));
            }
        }
        for (field, profile) in [
            ("tuning.chaser", &t.chaser),
            ("tuning.elite", &t.elite),
            ("tuning.patrol", &t.patrol),
            ("tuning.shooter", &t.shooter),
        ] {
            if !(profile.hp > 0.0 && profile.radius > 0.0) {
                return Err(invalid(field, "hp and radius must be positive"));
            }
        }
        if !(t.fire_interval > 0.0 && t.min_fire_interval > 0.0) {
            return Err(invalid("tuning.fire_interval", "must be positive"));
        }
        if t.bullet_count == 0 {
            return Err(invalid("tuning.bullet_count", "must be at least 1"));
        }
        if !(t.friction >= 0.0) {
            return Err(invalid("tuning.friction", "must be non-negative"));
        }
        if !(t.level_xp_growth >= 1.0) {
            return Err(invalid("tuning.level_xp_growth", "must be >= 1"));
        }
        for (field, chance) in [
            ("tuning.elite_chance", t.elite_chance),
            ("tuning.patrol_chance", t.patrol_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(field, "must be in [0, 1]"));
            }
        }
        for (field, policy) in [
            ("tuning.enemy_boundary", t.enemy_boundary),
            ("tuning.projectile_boundary", t.projectile_boundary),
        ] {
            match policy {
                BoundaryPolicy::Reflect { restitution } if !(0.0..=1.0).contains(&restitution) => {
                    return Err(invalid(field, "restitution must be in [0, 1]"));
                }
                BoundaryPolicy::Despawn { max_distance } if !(max_distance > 0.0) => {
                    return Err(invalid(field, "max_distance must be positive"));
                }
                _ => {}
            }
        }
        if !(0.0..=1.0).contains(&self.master_volume) || !(0.0..=1.0).contains(&self.sfx_volume) {
            return Err(invalid("volume", "must be in [0, 1]"));
        }
        if !(self.sound_throttle_secs >= 0.0) {
            return Err(invalid("sound_throttle_secs", "must be non-negative"));
        }
        Ok(())
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective screen flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        !self.reduced_motion
    }

    /// Load settings from the inline config element (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        match json.map(|j| Self::from_json(&j)) {
            Some(Ok(settings)) => {
                log::info!("Loaded settings from #{}", Self::CONFIG_ELEMENT_ID);
                settings
            }
            Some(Err(e)) => {
                log::warn!("Ignoring invalid settings: {}", e);
                Self::default()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from the file named by `ARCADE_LOOP_CONFIG` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::CONFIG_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::load_file(std::path::Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path, e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

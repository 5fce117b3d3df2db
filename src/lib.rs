//! Arcade Loop - a real-time arcade simulation loop
//!
//! Core modules:
//! - `sim`: Frame simulation (entities, motion, collisions, game state)
//! - `renderer`: Read-only presentation and the WebGPU pipeline
//! - `platform`: Input sampling and the host frame-loop driver
//! - `audio`: Procedural sound effects with per-key throttling
//! - `persistence`: In-memory snapshot envelope
//! - `settings`: Data-driven tuning and preferences

pub mod audio;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{AudioError, ConfigError, RenderError, SimError, SnapshotError};
pub use settings::{BoundaryPolicy, Settings, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the simulation will accept (tab-suspend resume guard)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Frame delta assumed for the very first frame (no previous timestamp)
    pub const FIRST_FRAME_DT: f32 = 1.0 / 60.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_MAX_HP: f32 = 100.0;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 4.0;

    /// Pickup radius
    pub const PICKUP_RADIUS: f32 = 8.0;

    /// Maximum cosmetic particles alive at once
    pub const MAX_PARTICLES: usize = 256;
}

/// Direction from `from` to `to`, or `None` when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    let delta = to - from;
    let len = delta.length();
    if len > f32::EPSILON && len.is_finite() {
        Some(delta / len)
    } else {
        None
    }
}

/// Clamp a vector's magnitude to at most 1
#[inline]
pub fn clamp_unit(v: Vec2) -> Vec2 {
    let len = v.length();
    if len > 1.0 { v / len } else { v }
}

/// Unit vector for an angle (radians)
#[inline]
pub fn heading(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

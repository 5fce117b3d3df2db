//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable `dt`, clamped per frame
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod entity;
pub mod geometry;
pub mod progression;
pub mod spawner;
pub mod state;
pub mod step;
pub mod tick;

pub use effects::{Effect, EffectKind, EffectQueue};
pub use entity::{Behavior, DamageOutcome, Dash, Entity, EntityId, PickupKind, ShotSpec, Splash, Team};
pub use geometry::{Aabb, Level, Tile, TileMap};
pub use state::{GameEvent, GamePhase, GameState, Meter, Particle, Session, Weapon, World};
pub use step::Blast;
pub use tick::{FrameReport, TickInput, tick};

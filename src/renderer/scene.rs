//! Read-only presentation
//!
//! [`build_scene`] turns a `&GameState` into layered draw commands plus HUD
//! values. It never mutates the state; the GPU pipeline and the DOM HUD
//! consume its output.

use glam::Vec2;

use super::vertex::colors;
use crate::sim::{Aabb, Behavior, EffectKind, Entity, GamePhase, GameState, PickupKind, Tile};

/// Drawing order, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Ground,
    Geometry,
    Entities,
    Effects,
    Overlay,
}

/// A shape in world coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Circle {
        center: Vec2,
        radius: f32,
        color: [f32; 4],
    },
    Ring {
        center: Vec2,
        inner: f32,
        outer: f32,
        color: [f32; 4],
    },
    Rect {
        min: Vec2,
        max: Vec2,
        color: [f32; 4],
    },
    /// Text for hosts that can draw it; the triangle pipeline skips it
    Text {
        pos: Vec2,
        text: String,
        color: [f32; 4],
    },
    /// Covers the whole viewport
    Fullscreen { color: [f32; 4] },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub layer: Layer,
    pub primitive: Primitive,
}

/// Output surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * 0.5
    }
}

/// World-to-screen mapping, one world unit per pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World point at the viewport center
    pub center: Vec2,
    pub viewport: Viewport,
}

impl Camera {
    /// World rectangle currently visible
    pub fn visible(&self) -> Aabb {
        Aabb::from_center(
            self.center,
            Vec2::new(self.viewport.width, self.viewport.height) * 0.5,
        )
    }

    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        p - self.center + self.viewport.center()
    }

    /// World point to normalized device coordinates (world y points down)
    pub fn world_to_ndc(&self, p: Vec2) -> Vec2 {
        let s = self.world_to_screen(p);
        Vec2::new(
            s.x / self.viewport.width * 2.0 - 1.0,
            1.0 - s.y / self.viewport.height * 2.0,
        )
    }
}

/// Presentation switches (accessibility)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentOptions {
    pub screen_shake: bool,
    pub flashes: bool,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self {
            screen_shake: true,
            flashes: true,
        }
    }
}

impl PresentOptions {
    pub fn from_settings(settings: &crate::settings::Settings) -> Self {
        Self {
            screen_shake: settings.effective_screen_shake(),
            flashes: settings.effective_flash(),
        }
    }
}

/// Values the DOM HUD shows
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub health: f32,
    pub stamina: f32,
    pub heat: f32,
    pub xp: f32,
    pub overheated: bool,
    pub score: u64,
    pub wave: u32,
    pub level: u32,
    pub phase: GamePhase,
    /// Whole seconds left on a timed run
    pub time_left: Option<u32>,
    /// Banner text and its fade alpha
    pub banner: Option<(String, f32)>,
}

impl Hud {
    pub fn from_state(state: &GameState) -> Self {
        let s = &state.session;
        let banner = match state.phase {
            GamePhase::Menu => Some(("PRESS ENTER TO START".to_string(), 1.0)),
            GamePhase::Paused => Some(("PAUSED".to_string(), 1.0)),
            GamePhase::GameOver if s.out_of_time() => {
                Some((format!("TIME UP - SCORE {}", s.score), 1.0))
            }
            GamePhase::GameOver => Some((format!("GAME OVER - SCORE {}", s.score), 1.0)),
            GamePhase::Playing => state
                .effects
                .banner_text()
                .map(|(text, alpha)| (text.to_string(), alpha)),
        };
        Self {
            health: state.world.player.health_ratio(),
            stamina: s.stamina.ratio(),
            heat: s.heat.ratio(),
            xp: s.xp_ratio(),
            overheated: s.overheated,
            score: s.score,
            wave: s.wave,
            level: s.level,
            phase: state.phase,
            time_left: s.time_left.map(|left| left.ceil() as u32),
            banner,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    /// Sorted by layer; insertion order kept within a layer
    pub commands: Vec<DrawCommand>,
    pub hud: Hud,
}

impl Scene {
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &Primitive> {
        self.commands
            .iter()
            .filter(move |c| c.layer == layer)
            .map(|c| &c.primitive)
    }
}

/// Deterministic shake offset for a frame
fn shake_offset(frame: u64, magnitude: f32) -> Vec2 {
    if magnitude <= 0.0 {
        return Vec2::ZERO;
    }
    let t = frame as f32;
    Vec2::new((t * 12.9898).sin(), (t * 78.233).cos()) * magnitude
}

struct Builder {
    commands: Vec<DrawCommand>,
    cull: Aabb,
}

impl Builder {
    fn push(&mut self, layer: Layer, primitive: Primitive) {
        self.commands.push(DrawCommand { layer, primitive });
    }

    fn visible(&self, pos: Vec2, radius: f32) -> bool {
        self.cull.intersects_circle(pos, radius.max(1.0)) || self.cull.contains(pos)
    }

    fn entity(&mut self, e: &Entity, color: [f32; 4]) {
        if !e.alive || !self.visible(e.pos, e.radius) {
            return;
        }
        self.push(
            Layer::Entities,
            Primitive::Circle {
                center: e.pos,
                radius: e.radius,
                color,
            },
        );
    }

    /// Thin health bar above a wounded entity
    fn health_bar(&mut self, e: &Entity) {
        if !e.alive || e.hp >= e.max_hp || !self.visible(e.pos, e.radius) {
            return;
        }
        let width = e.radius * 2.0;
        let min = e.pos + Vec2::new(-e.radius, -e.radius - 8.0);
        self.push(
            Layer::Entities,
            Primitive::Rect {
                min,
                max: min + Vec2::new(width, 3.0),
                color: colors::BAR_BACK,
            },
        );
        self.push(
            Layer::Entities,
            Primitive::Rect {
                min,
                max: min + Vec2::new(width * e.health_ratio(), 3.0),
                color: colors::BAR_FILL,
            },
        );
    }
}

fn enemy_color(e: &Entity) -> [f32; 4] {
    if e.elite {
        return colors::ELITE;
    }
    match e.behavior {
        Behavior::Patrol { .. } => colors::PATROL,
        Behavior::Shooter { .. } => colors::SHOOTER,
        _ => colors::CHASER,
    }
}

/// Build the draw list for one frame; `None` when there is nothing to draw into
pub fn build_scene(state: &GameState, viewport: Viewport, options: PresentOptions) -> Option<Scene> {
    if viewport.is_empty() {
        return None;
    }

    let jitter = if options.screen_shake {
        shake_offset(state.session.frame, state.session.shake)
    } else {
        Vec2::ZERO
    };
    let camera = Camera {
        center: state.world.player.pos + jitter,
        viewport,
    };
    let visible = camera.visible();
    let mut b = Builder {
        commands: Vec::new(),
        cull: Aabb::new(visible.min - Vec2::splat(64.0), visible.max + Vec2::splat(64.0)),
    };

    // Ground: play area and its rim
    let bounds = state.world.bounds;
    b.push(
        Layer::Ground,
        Primitive::Rect {
            min: bounds.min,
            max: bounds.max,
            color: colors::GROUND,
        },
    );

    // Geometry
    for wall in &state.world.level.walls {
        b.push(
            Layer::Geometry,
            Primitive::Rect {
                min: wall.min,
                max: wall.max,
                color: colors::WALL,
            },
        );
    }
    if let Some(tiles) = &state.world.level.tiles {
        let (x0, y0) = tiles.cell_of(visible.min);
        let (x1, y1) = tiles.cell_of(visible.max);
        for y in y0.max(0)..=y1 {
            for x in x0.max(0)..=x1 {
                if tiles.get(x, y) == Some(Tile::Wall) {
                    let cell = tiles.cell_box(x, y);
                    b.push(
                        Layer::Geometry,
                        Primitive::Rect {
                            min: cell.min,
                            max: cell.max,
                            color: colors::WALL,
                        },
                    );
                }
            }
        }
    }

    // Entities
    for hazard in &state.world.hazards {
        if hazard.alive && b.visible(hazard.pos, hazard.radius) {
            b.push(
                Layer::Entities,
                Primitive::Ring {
                    center: hazard.pos,
                    inner: hazard.radius * 0.8,
                    outer: hazard.radius,
                    color: colors::HAZARD,
                },
            );
        }
    }
    for pickup in &state.world.pickups {
        let color = match pickup.behavior {
            Behavior::Pickup {
                kind: PickupKind::Heal(_),
            } => colors::PICKUP_HEAL,
            Behavior::Pickup {
                kind: PickupKind::Coolant,
            } => colors::PICKUP_COOLANT,
            _ => colors::PICKUP_STAMINA,
        };
        b.entity(pickup, color);
    }
    for enemy in &state.world.enemies {
        b.entity(enemy, enemy_color(enemy));
        b.health_bar(enemy);
    }
    for p in &state.world.projectiles {
        let color = match p.team {
            crate::sim::Team::Player => colors::PLAYER_SHOT,
            _ => colors::ENEMY_SHOT,
        };
        b.entity(p, color);
    }
    let player = &state.world.player;
    if player.alive {
        b.entity(player, colors::PLAYER);
    }

    // Effects
    for particle in &state.world.particles {
        if particle.life <= 0.0 || !b.visible(particle.pos, particle.size) {
            continue;
        }
        let fade = (particle.life / particle.max_life.max(f32::EPSILON)).clamp(0.0, 1.0);
        let mut color = particle.color;
        color[3] *= fade;
        b.push(
            Layer::Effects,
            Primitive::Circle {
                center: particle.pos,
                radius: particle.size * fade.max(0.3),
                color,
            },
        );
    }
    for effect in state.effects.iter() {
        match &effect.kind {
            EffectKind::Flash { color } if options.flashes => {
                let mut color = *color;
                color[3] *= effect.alpha();
                b.push(Layer::Effects, Primitive::Fullscreen { color });
            }
            EffectKind::FloatingText { text, pos } => {
                let mut color = colors::TEXT;
                color[3] = effect.alpha();
                b.push(
                    Layer::Effects,
                    Primitive::Text {
                        pos: *pos,
                        text: text.clone(),
                        color,
                    },
                );
            }
            _ => {}
        }
    }

    // Overlay: dim everything outside active play
    if state.phase != GamePhase::Playing {
        b.push(Layer::Overlay, Primitive::Fullscreen { color: colors::DIM });
    }

    let mut commands = b.commands;
    commands.sort_by_key(|c| c.layer);

    Some(Scene {
        camera,
        commands,
        hud: Hud::from_state(state),
    })
}

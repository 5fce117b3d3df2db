//! Static level geometry: axis-aligned walls and tile grids
//!
//! Lookups outside a grid are never an error; they simply mean "no wall".

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, half_extent: Vec2) -> Self {
        Self::new(center - half_extent, center + half_extent)
    }

    /// Point of the box nearest to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Box-vs-circle test via the closest point (strict)
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) < radius * radius
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Shrink by `margin` on every side (never inverts)
    pub fn shrink(&self, margin: f32) -> Self {
        let center = (self.min + self.max) * 0.5;
        let half = ((self.max - self.min) * 0.5 - Vec2::splat(margin)).max(Vec2::ZERO);
        Self::from_center(center, half)
    }
}

/// Tile kinds in a hand-authored grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Wall,
}

/// Row-major tile grid anchored at `origin` (top-left corner)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub origin: Vec2,
    pub cell_size: f32,
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Tile>,
}

impl TileMap {
    /// Build from rows of characters: `#` is a wall, anything else is empty
    pub fn from_rows(origin: Vec2, cell_size: f32, rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut tiles = vec![Tile::Empty; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    tiles[y * width + x] = Tile::Wall;
                }
            }
        }
        Self {
            origin,
            cell_size,
            width,
            height,
            tiles,
        }
    }

    /// Tile at grid coordinates; `None` outside the grid
    pub fn get(&self, x: i64, y: i64) -> Option<Tile> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y * self.width + x).copied()
    }

    /// Grid cell containing a world point
    pub fn cell_of(&self, p: Vec2) -> (i64, i64) {
        let local = (p - self.origin) / self.cell_size;
        (local.x.floor() as i64, local.y.floor() as i64)
    }

    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        matches!(self.get(x, y), Some(Tile::Wall))
    }

    pub fn cell_box(&self, x: i64, y: i64) -> Aabb {
        let min = self.origin + Vec2::new(x as f32, y as f32) * self.cell_size;
        Aabb::new(min, min + Vec2::splat(self.cell_size))
    }

    /// Whether a circle touches any wall tile
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        if !(self.cell_size > 0.0) || !center.is_finite() {
            return false;
        }
        let (x0, y0) = self.cell_of(center - Vec2::splat(radius));
        let (x1, y1) = self.cell_of(center + Vec2::splat(radius));
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.is_solid(x, y) && self.cell_box(x, y).intersects_circle(center, radius) {
                    return true;
                }
            }
        }
        false
    }
}

/// All static geometry of a level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub walls: Vec<Aabb>,
    pub tiles: Option<TileMap>,
}

impl Level {
    pub fn blocks_circle(&self, center: Vec2, radius: f32) -> bool {
        self.walls.iter().any(|w| w.intersects_circle(center, radius))
            || self
                .tiles
                .as_ref()
                .is_some_and(|t| t.intersects_circle(center, radius))
    }

    /// Move a circle by `delta`, sliding along walls one axis at a time.
    ///
    /// An axis whose move would end inside a wall is not applied.
    pub fn slide(&self, pos: Vec2, radius: f32, delta: Vec2) -> Vec2 {
        if self.walls.is_empty() && self.tiles.is_none() {
            return pos + delta;
        }
        let mut out = pos;
        let try_x = Vec2::new(out.x + delta.x, out.y);
        if !self.blocks_circle(try_x, radius) {
            out = try_x;
        }
        let try_y = Vec2::new(out.x, out.y + delta.y);
        if !self.blocks_circle(try_y, radius) {
            out = try_y;
        }
        out
    }
}

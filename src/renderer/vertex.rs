//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
    pub const GROUND: [f32; 4] = [0.06, 0.07, 0.11, 1.0];
    pub const WALL: [f32; 4] = [0.3, 0.3, 0.4, 1.0];
    pub const PLAYER: [f32; 4] = [0.2, 0.8, 0.4, 1.0];
    pub const CHASER: [f32; 4] = [0.9, 0.3, 0.3, 1.0];
    pub const PATROL: [f32; 4] = [0.9, 0.6, 0.2, 1.0];
    pub const SHOOTER: [f32; 4] = [0.7, 0.3, 0.9, 1.0];
    pub const ELITE: [f32; 4] = [0.9, 0.85, 0.3, 1.0]; // Gold
    pub const HAZARD: [f32; 4] = [0.6, 0.2, 0.8, 0.8];
    pub const PLAYER_SHOT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const ENEMY_SHOT: [f32; 4] = [1.0, 0.4, 0.2, 1.0];
    pub const PICKUP_HEAL: [f32; 4] = [0.3, 1.0, 0.5, 1.0];
    pub const PICKUP_COOLANT: [f32; 4] = [0.4, 0.7, 1.0, 1.0];
    pub const PICKUP_STAMINA: [f32; 4] = [1.0, 0.9, 0.4, 1.0];
    pub const BAR_BACK: [f32; 4] = [0.1, 0.1, 0.1, 0.8];
    pub const BAR_FILL: [f32; 4] = [0.9, 0.2, 0.2, 1.0];
    pub const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const DIM: [f32; 4] = [0.0, 0.0, 0.0, 0.55];
}

//! Presentation
//!
//! [`scene`] reads the game state into layered draw commands and HUD values,
//! [`shapes`] tessellates them into triangles and [`pipeline`] draws them
//! with wgpu.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::{Camera, DrawCommand, Hud, Layer, PresentOptions, Primitive, Scene, Viewport, build_scene};

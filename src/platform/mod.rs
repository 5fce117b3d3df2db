//! Platform layer
//!
//! Host-facing pieces that sit outside the deterministic simulation:
//! - Input sampling (keyboard, pointer, touch joystick)
//! - The frame-loop driver and its scheduler seam

pub mod driver;
pub mod input;

pub use driver::{FrameScheduler, GameLoop, ManualScheduler};
pub use input::{InputSampler, Joystick, Key, PointerButton};

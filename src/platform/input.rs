//! Input sampling
//!
//! Host events (keys, pointer, touch) land in an [`InputSampler`] as they
//! arrive. Once per frame the loop calls [`InputSampler::sample`] to get a
//! [`TickInput`] snapshot; edge triggers are cleared at that point.
//!
//! Frame lifecycle: events → sample() → (edges cleared) → events → ...

use std::collections::HashSet;

use glam::Vec2;

use crate::clamp_unit;
use crate::sim::TickInput;

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Run,
    Fire,
    Skill,
    Interact,
    Pause,
    Start,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` (or `.key`) string
    pub fn from_code(code: &str) -> Option<Key> {
        let key = match code {
            "KeyW" | "ArrowUp" | "w" | "W" => Key::Up,
            "KeyS" | "ArrowDown" | "s" | "S" => Key::Down,
            "KeyA" | "ArrowLeft" | "a" | "A" => Key::Left,
            "KeyD" | "ArrowRight" | "d" | "D" => Key::Right,
            "ShiftLeft" | "ShiftRight" | "Shift" => Key::Run,
            "Space" | " " => Key::Fire,
            "KeyQ" | "q" | "Q" => Key::Skill,
            "KeyE" | "e" | "E" => Key::Interact,
            "Escape" | "KeyP" | "p" | "P" => Key::Pause,
            "Enter" | "NumpadEnter" => Key::Start,
            _ => return None,
        };
        Some(key)
    }
}

/// Pointer buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button: fire
    Primary,
    /// Right mouse button: skill
    Secondary,
}

impl PointerButton {
    /// Map `MouseEvent.button`
    pub fn from_index(index: i16) -> Option<Self> {
        match index {
            0 => Some(PointerButton::Primary),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

/// On-screen virtual joystick driven by a single touch
#[derive(Debug, Clone, PartialEq)]
pub struct Joystick {
    /// Touch identifier currently steering, if any
    pub touch_id: Option<i32>,
    pub center: Vec2,
    pub current: Vec2,
    /// Knob travel in screen pixels
    pub max_dist: f32,
}

impl Default for Joystick {
    fn default() -> Self {
        Self {
            touch_id: None,
            center: Vec2::ZERO,
            current: Vec2::ZERO,
            max_dist: 60.0,
        }
    }
}

impl Joystick {
    pub fn is_active(&self) -> bool {
        self.touch_id.is_some()
    }

    /// Claim the joystick for a touch. Ignored while another touch owns it.
    pub fn begin(&mut self, touch_id: i32, center: Vec2, at: Vec2) {
        if self.touch_id.is_none() {
            self.touch_id = Some(touch_id);
            self.center = center;
            self.current = at;
        }
    }

    pub fn update(&mut self, touch_id: i32, at: Vec2) {
        if self.touch_id == Some(touch_id) {
            self.current = at;
        }
    }

    pub fn end(&mut self, touch_id: i32) {
        if self.touch_id == Some(touch_id) {
            *self = Self {
                max_dist: self.max_dist,
                ..Self::default()
            };
        }
    }

    /// Knob offset from the center, clamped to `max_dist`
    pub fn knob_offset(&self) -> Vec2 {
        let offset = self.current - self.center;
        if self.max_dist > 0.0 {
            offset.clamp_length_max(self.max_dist)
        } else {
            Vec2::ZERO
        }
    }

    /// Steering vector with magnitude in `[0, 1]`
    pub fn vector(&self) -> Vec2 {
        if !self.is_active() || self.max_dist <= 0.0 {
            return Vec2::ZERO;
        }
        clamp_unit(self.knob_offset() / self.max_dist)
    }
}

/// Accumulates host input events between frames
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
    buttons: HashSet<PointerButton>,
    buttons_pressed: HashSet<PointerButton>,
    /// Last pointer position in screen pixels, `None` once it leaves the surface
    pointer: Option<Vec2>,
    pub joystick: Joystick,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        // Auto-repeat does not count as a fresh press
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Inject a one-frame press without a matching release (UI buttons)
    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn pointer_moved(&mut self, at: Vec2) {
        self.pointer = Some(at);
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.buttons.clear();
    }

    pub fn button_down(&mut self, button: PointerButton) {
        if self.buttons.insert(button) {
            self.buttons_pressed.insert(button);
        }
    }

    pub fn button_up(&mut self, button: PointerButton) {
        self.buttons.remove(&button);
    }

    /// Drop everything held (window blur: key-up events will never arrive)
    pub fn release_all(&mut self) {
        self.held.clear();
        self.buttons.clear();
        self.joystick = Joystick {
            max_dist: self.joystick.max_dist,
            ..Joystick::default()
        };
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn key_axis(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.is_held(Key::Up) {
            v.y -= 1.0;
        }
        if self.is_held(Key::Down) {
            v.y += 1.0;
        }
        if self.is_held(Key::Left) {
            v.x -= 1.0;
        }
        if self.is_held(Key::Right) {
            v.x += 1.0;
        }
        v.normalize_or_zero()
    }

    /// Snapshot the current input for one frame and clear edge triggers.
    ///
    /// `screen_center` is where the player is drawn; pointer aim is relative to it.
    pub fn sample(&mut self, screen_center: Vec2) -> TickInput {
        let movement = if self.joystick.is_active() {
            self.joystick.vector()
        } else {
            self.key_axis()
        };

        let aim = self
            .pointer
            .and_then(|p| crate::direction_to(screen_center, p));

        let input = TickInput {
            movement: clamp_unit(movement),
            aim,
            fire: self.is_held(Key::Fire) || self.buttons.contains(&PointerButton::Primary),
            run: self.is_held(Key::Run),
            skill: self.pressed.contains(&Key::Skill)
                || self.buttons_pressed.contains(&PointerButton::Secondary),
            interact: self.is_held(Key::Interact),
            pause: self.pressed.contains(&Key::Pause),
            start: self.pressed.contains(&Key::Start),
        };

        self.pressed.clear();
        self.buttons_pressed.clear();
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Up));
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code("Escape"), Some(Key::Pause));
        assert_eq!(Key::from_code("KeyP"), Some(Key::Pause));
        assert_eq!(Key::from_code("Enter"), Some(Key::Start));
        assert_eq!(Key::from_code("KeyZ"), None);
    }

    #[test]
    fn test_diagonal_movement_is_unit() {
        let mut s = InputSampler::new();
        s.key_down(Key::Up);
        s.key_down(Key::Right);
        let input = s.sample(Vec2::ZERO);
        assert!((input.movement.length() - 1.0).abs() < 1e-6);
        assert!(input.movement.x > 0.0 && input.movement.y < 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut s = InputSampler::new();
        s.key_down(Key::Left);
        s.key_down(Key::Right);
        assert_eq!(s.sample(Vec2::ZERO).movement, Vec2::ZERO);
    }

    #[test]
    fn test_edges_cleared_after_sample() {
        let mut s = InputSampler::new();
        s.key_down(Key::Pause);
        s.key_down(Key::Fire);
        let first = s.sample(Vec2::ZERO);
        assert!(first.pause && first.fire);
        // Held keys persist, presses do not
        let second = s.sample(Vec2::ZERO);
        assert!(!second.pause);
        assert!(second.fire);
        // Auto-repeat keydown is not a new press
        s.key_down(Key::Pause);
        assert!(!s.sample(Vec2::ZERO).pause);
    }

    #[test]
    fn test_joystick_overrides_keys_and_clamps() {
        let mut s = InputSampler::new();
        s.key_down(Key::Left);
        s.joystick.begin(7, Vec2::new(100.0, 100.0), Vec2::new(100.0, 100.0));
        s.joystick.update(7, Vec2::new(400.0, 100.0));
        let input = s.sample(Vec2::ZERO);
        assert!((input.movement - Vec2::X).length() < 1e-6);
        assert_eq!(s.joystick.knob_offset(), Vec2::new(60.0, 0.0));

        s.joystick.update(7, Vec2::new(100.0, 130.0));
        let input = s.sample(Vec2::ZERO);
        assert!((input.movement - Vec2::new(0.0, 0.5)).length() < 1e-6);

        // A second finger does not steal the stick
        s.joystick.begin(8, Vec2::ZERO, Vec2::ZERO);
        assert_eq!(s.joystick.touch_id, Some(7));

        s.joystick.end(7);
        assert_eq!(s.sample(Vec2::ZERO).movement, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_pointer_aim_relative_to_center() {
        let mut s = InputSampler::new();
        s.pointer_moved(Vec2::new(200.0, 100.0));
        let input = s.sample(Vec2::new(100.0, 100.0));
        assert_eq!(input.aim, Some(Vec2::X));
        // Pointer exactly at the center gives no aim
        s.pointer_moved(Vec2::new(100.0, 100.0));
        assert_eq!(s.sample(Vec2::new(100.0, 100.0)).aim, None);
    }

    #[test]
    fn test_pointer_buttons() {
        let mut s = InputSampler::new();
        s.button_down(PointerButton::Primary);
        s.button_down(PointerButton::Secondary);
        let input = s.sample(Vec2::ZERO);
        assert!(input.fire && input.skill);
        let input = s.sample(Vec2::ZERO);
        assert!(input.fire && !input.skill);
        s.release_all();
        assert!(!s.sample(Vec2::ZERO).fire);
    }
}

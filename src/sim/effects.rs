//! Transient visual effects with per-entry lifetimes
//!
//! Counted down once per frame by the tick, read by presentation.
//! Nothing here affects gameplay.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Full-screen color wash (damage flash)
    Flash { color: [f32; 4] },
    /// World-space text that drifts upward
    FloatingText { text: String, pos: Vec2 },
    /// Centered announcement ("WAVE 3")
    Banner { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub remaining: f32,
    pub duration: f32,
}

impl Effect {
    /// 1.0 when fresh, fading linearly to 0.0
    pub fn alpha(&self) -> f32 {
        if self.duration > 0.0 {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Upward drift of floating text, pixels per second
pub const FLOATING_TEXT_RISE: f32 = 60.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectQueue {
    effects: Vec<Effect>,
}

impl EffectQueue {
    pub fn push(&mut self, kind: EffectKind, duration: f32) {
        if duration > 0.0 {
            self.effects.push(Effect {
                kind,
                remaining: duration,
                duration,
            });
        }
    }

    pub fn flash(&mut self, color: [f32; 4], duration: f32) {
        self.push(EffectKind::Flash { color }, duration);
    }

    pub fn floating_text(&mut self, text: impl Into<String>, pos: Vec2) {
        self.push(
            EffectKind::FloatingText {
                text: text.into(),
                pos,
            },
            1.0,
        );
    }

    /// Replaces any banner still showing
    pub fn banner(&mut self, text: impl Into<String>, duration: f32) {
        self.effects
            .retain(|e| !matches!(e.kind, EffectKind::Banner { .. }));
        self.push(EffectKind::Banner { text: text.into() }, duration);
    }

    /// Count down lifetimes and drop expired entries
    pub fn tick(&mut self, dt: f32) {
        for effect in &mut self.effects {
            effect.remaining -= dt;
            if let EffectKind::FloatingText { pos, .. } = &mut effect.kind {
                pos.y -= FLOATING_TEXT_RISE * dt;
            }
        }
        self.effects.retain(|e| e.remaining > 0.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn banner_text(&self) -> Option<(&str, f32)> {
        self.effects.iter().find_map(|e| match &e.kind {
            EffectKind::Banner { text } => Some((text.as_str(), e.alpha())),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

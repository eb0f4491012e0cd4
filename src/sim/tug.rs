//! Player tug input
//!
//! Device input (pointer drag, arrow keys, touch joystick) becomes a bounded
//! 2D force in the x/y plane. The host writes the latest command into a
//! single slot; the tick samples it once. When nothing drives the force it
//! decays back to zero.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::tuning::ControlTuning;

/// Arrow key state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionKeys {
    pub const UP: u8 = 1;
    pub const DOWN: u8 = 1 << 1;
    pub const LEFT: u8 = 1 << 2;
    pub const RIGHT: u8 = 1 << 3;

    /// Decode a key bitmask (unknown bits are ignored)
    pub fn from_bits(bits: u8) -> Self {
        Self {
            up: bits & Self::UP != 0,
            down: bits & Self::DOWN != 0,
            left: bits & Self::LEFT != 0,
            right: bits & Self::RIGHT != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.up {
            bits |= Self::UP;
        }
        if self.down {
            bits |= Self::DOWN;
        }
        if self.left {
            bits |= Self::LEFT;
        }
        if self.right {
            bits |= Self::RIGHT;
        }
        bits
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Latest input intent from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TugCommand {
    /// Pointer held down at `start`, now at `current` (screen pixels, y down)
    PointerDrag { start: Vec2, current: Vec2 },
    /// Arrow keys currently held
    Keys(DirectionKeys),
    /// Joystick angle (radians, screen convention) and normalized force 0..1
    Joystick { angle: f32, force: f32 },
    /// Input released; the force decays from here
    Release,
}

/// Single-slot tug force buffer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TugInput {
    vector: Vec3,
    /// Arrow keys held as of the last key command
    keys: DirectionKeys,
    /// Whether an input source is currently holding the force
    driven: bool,
}

impl TugInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the latest command, replacing whatever was there
    pub fn apply(&mut self, command: TugCommand, tuning: &ControlTuning) {
        let max = tuning.max_tug_force;
        match command {
            TugCommand::PointerDrag { start, current } => {
                self.vector = pointer_drag_force(start, current, tuning.pointer_sensitivity, max);
                self.driven = true;
            }
            TugCommand::Keys(keys) => {
                self.keys = keys;
                self.vector = keyboard_force(keys, tuning.key_increment, max);
                self.driven = keys.any();
            }
            TugCommand::Joystick { angle, force } => {
                self.vector = joystick_force(angle, force, max);
                self.driven = true;
            }
            // Keys still held take over from the released pointer
            TugCommand::Release if self.keys.any() => {
                self.vector = keyboard_force(self.keys, tuning.key_increment, max);
                self.driven = true;
            }
            TugCommand::Release => self.driven = false,
        }
    }

    /// Shed `rate` of each axis; axes under `epsilon` snap to exactly zero
    pub fn decay_toward_zero(&mut self, rate: f32, epsilon: f32) {
        let keep = 1.0 - rate.clamp(0.0, 1.0);
        let decay = |c: f32| if c.abs() < epsilon { 0.0 } else { c * keep };
        self.vector = Vec3::new(decay(self.vector.x), decay(self.vector.y), decay(self.vector.z));
    }

    #[inline]
    pub fn vector(&self) -> Vec3 {
        self.vector
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.vector.length()
    }

    #[inline]
    pub fn is_driven(&self) -> bool {
        self.driven
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drag delta scaled by sensitivity; dragging up the screen is +y
pub fn pointer_drag_force(start: Vec2, current: Vec2, sensitivity: f32, max: f32) -> Vec3 {
    let delta = Vec2::new(current.x - start.x, start.y - current.y);
    bound(Vec3::new(delta.x, delta.y, 0.0) * sensitivity, max)
}

/// Each held key adds a fixed increment on its axis
pub fn keyboard_force(keys: DirectionKeys, increment: f32, max: f32) -> Vec3 {
    let mut force = Vec3::ZERO;
    if keys.up {
        force.y += increment;
    }
    if keys.down {
        force.y -= increment;
    }
    if keys.left {
        force.x -= increment;
    }
    if keys.right {
        force.x += increment;
    }
    bound(force, max)
}

/// Joystick angle + force (0..1) scaled to `max`, y flipped into world space
pub fn joystick_force(angle: f32, force: f32, max: f32) -> Vec3 {
    let force = if force.is_finite() {
        force.clamp(0.0, 1.0)
    } else {
        0.0
    };
    bound(
        Vec3::new(angle.cos() * force * max, -angle.sin() * force * max, 0.0),
        max,
    )
}

/// Clamp per axis, then cap the magnitude; anything non-finite becomes zero
fn bound(v: Vec3, max: f32) -> Vec3 {
    if !v.is_finite() || !(max > 0.0) {
        return Vec3::ZERO;
    }
    v.clamp(Vec3::splat(-max), Vec3::splat(max))
        .clamp_length_max(max)
}

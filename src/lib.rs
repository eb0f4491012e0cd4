//! Dream Kite - tethered kite flight through procedural wind
//!
//! Core modules:
//! - `sim`: Deterministic flight simulation (wind, kite body, string, health)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::{DifficultyPreset, Tuning, TuningError};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz, matching the browser frame callback)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World gravity (m/s²)
    pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);

    /// Where the kite appears at session start
    pub const KITE_SPAWN: Vec3 = Vec3::new(0.0, 10.0, 0.0);
    /// Fixed end of the string (the player's hands)
    pub const ANCHOR_POSITION: Vec3 = Vec3::ZERO;
    /// Kite half-extent along its spars
    pub const KITE_SIZE: f32 = 2.0;

    /// String length bounds
    pub const MIN_STRING_LENGTH: f32 = 5.0;
    pub const MAX_STRING_LENGTH: f32 = 30.0;
    pub const BASE_STRING_LENGTH: f32 = 15.0;
    /// Most points a sampled string curve may have
    pub const MAX_STRING_SEGMENTS: usize = 256;

    /// Health bounds
    pub const MAX_HEALTH: f32 = 100.0;

    /// Maximum tug force magnitude
    pub const MAX_TUG_FORCE: f32 = 10.0;

    /// Magnitudes below this are treated as zero when normalizing
    pub const VECTOR_EPSILON: f32 = 1e-6;
}

/// Normalize a vector, or `None` when it is too short or not finite to have a direction
#[inline]
pub fn try_direction(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if !len.is_finite() || len <= consts::VECTOR_EPSILON {
        return None;
    }
    Some(v / len)
}

/// Unit direction from horizontal/vertical angles in degrees (forward is -z)
#[inline]
pub fn direction_from_angles(horizontal_deg: f32, vertical_deg: f32) -> Vec3 {
    let h = horizontal_deg.to_radians();
    let v = vertical_deg.to_radians();
    Vec3::new(h.sin() * v.cos(), v.sin(), -h.cos() * v.cos())
}

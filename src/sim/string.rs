//! Kite string
//!
//! The string is a maximum-distance tether between a fixed anchor and the
//! kite. Tension comes from overstretch (before the constraint pulls the kite
//! back) plus the player's tug. The sampled curve sags when the string is
//! slack and straightens as tension rises.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::kite::KiteBody;
use crate::consts::{MAX_STRING_SEGMENTS, VECTOR_EPSILON};
use crate::try_direction;
use crate::tuning::StringTuning;

/// Position, velocity and inverse mass of one end of a tether
///
/// An inverse mass of zero pins the point in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMass {
    pub position: Vec3,
    pub velocity: Vec3,
    pub inv_mass: f32,
}

impl PointMass {
    /// Immovable point
    pub fn fixed(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            inv_mass: 0.0,
        }
    }
}

/// Pulls two points back toward a target distance
///
/// Corrections are split by inverse mass, so a fixed end never moves.
pub trait DistanceConstraint {
    fn apply(&self, a: &mut PointMass, b: &mut PointMass, target_distance: f32);
}

/// Inextensible rope: only resists stretching, never pushes the ends apart
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RopeConstraint {
    /// Fraction of the overstretch removed per iteration (0..=1)
    pub stiffness: f32,
    pub iterations: u32,
}

impl Default for RopeConstraint {
    fn default() -> Self {
        Self {
            stiffness: 1.0,
            iterations: 4,
        }
    }
}

impl DistanceConstraint for RopeConstraint {
    fn apply(&self, a: &mut PointMass, b: &mut PointMass, target_distance: f32) {
        let w_sum = a.inv_mass + b.inv_mass;
        if w_sum <= 0.0 {
            return;
        }

        let mut axis = None;
        for _ in 0..self.iterations {
            let delta = b.position - a.position;
            let distance = delta.length();
            if distance <= target_distance || distance <= VECTOR_EPSILON {
                break;
            }
            let dir = delta / distance;
            let correction = (distance - target_distance) * self.stiffness.clamp(0.0, 1.0);
            a.position += dir * correction * (a.inv_mass / w_sum);
            b.position -= dir * correction * (b.inv_mass / w_sum);
            axis = Some(dir);
        }

        // A taut rope also stops the ends separating any further
        if let Some(dir) = axis {
            let separating = (b.velocity - a.velocity).dot(dir);
            if separating > 0.0 {
                a.velocity += dir * separating * (a.inv_mass / w_sum);
                b.velocity -= dir * separating * (b.inv_mass / w_sum);
            }
        }
    }
}

/// How taut the string is, for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensionBand {
    Slack,
    Strained,
    Critical,
}

impl TensionBand {
    pub fn classify(tension: f32) -> Self {
        if tension < 5.0 {
            TensionBand::Slack
        } else if tension < 15.0 {
            TensionBand::Strained
        } else {
            TensionBand::Critical
        }
    }
}

/// String state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringState {
    /// Allowed kite distance, always within `[min_length, max_length]`
    length: f32,
    pub min_length: f32,
    pub max_length: f32,
    /// Distance the constraint currently enforces
    pub constraint_distance: f32,
    /// Last computed tension (never negative)
    pub tension: f32,
    /// Player tug, copied in from the input slot each tick
    pub tug_force: Vec3,
    pub anchor: Vec3,
    /// String shape, recomputed every tick
    #[serde(skip)]
    samples: Vec<Vec3>,
}

impl StringState {
    pub fn new(anchor: Vec3, tuning: &StringTuning) -> Self {
        let min_length = tuning.min_length.max(VECTOR_EPSILON);
        let max_length = tuning.max_length.max(min_length);
        let length = tuning.base_length.clamp(min_length, max_length);
        Self {
            length,
            min_length,
            max_length,
            constraint_distance: length,
            tension: 0.0,
            tug_force: Vec3::ZERO,
            anchor,
            samples: Vec::with_capacity(tuning.segments.min(MAX_STRING_SEGMENTS)),
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Point the constraint at the current length
    pub fn enforce_length(&mut self) {
        self.constraint_distance = self.length;
    }

    /// Overstretch tension plus tug tension, stored and returned
    pub fn compute_tension(&mut self, kite_position: Vec3, stiffness: f32) -> f32 {
        let distance = kite_position.distance(self.anchor);
        let slack = ((distance - self.length) * stiffness).max(0.0);
        let tug = self.tug_force.length();
        let tension = slack + tug;
        self.tension = if tension.is_finite() { tension } else { 0.0 };
        self.tension
    }

    /// Pull the kite toward the anchor with the tug magnitude
    pub fn apply_tug_force(&self, kite: &mut KiteBody) {
        let magnitude = self.tug_force.length();
        if !(magnitude > 0.0) {
            return;
        }
        if let Some(toward_anchor) = try_direction(self.anchor - kite.position) {
            kite.apply_force(toward_anchor * magnitude);
        }
    }

    /// Run the distance constraint between the fixed anchor and the kite
    pub fn constrain<C: DistanceConstraint + ?Sized>(&self, kite: &mut KiteBody, constraint: &C) {
        let mut anchor = PointMass::fixed(self.anchor);
        let mut body = kite.point_mass();
        constraint.apply(&mut anchor, &mut body, self.constraint_distance);
        kite.set_point_mass(&body);
    }

    /// Resample the string shape from anchor (first) to kite (last)
    ///
    /// Points interpolate linearly and then drop by `t(1-t)` times the sag,
    /// which shrinks to nothing as tension approaches `taut_tension`.
    pub fn sample_curve(
        &mut self,
        kite_position: Vec3,
        segment_count: usize,
        max_sag: f32,
        taut_tension: f32,
    ) -> &[Vec3] {
        let count = segment_count.clamp(2, MAX_STRING_SEGMENTS);
        let tightness = if taut_tension > 0.0 {
            (self.tension / taut_tension).min(1.0)
        } else {
            1.0
        };
        let sag = (1.0 - tightness) * max_sag;
        let last = (count - 1) as f32;
        let anchor = self.anchor;

        self.samples.clear();
        self.samples.extend((0..count).map(|i| {
            if i == 0 {
                return anchor;
            }
            if i == count - 1 {
                return kite_position;
            }
            let t = i as f32 / last;
            let mut point = anchor.lerp(kite_position, t);
            point.y -= t * (1.0 - t) * sag;
            point
        }));
        &self.samples
    }

    /// Last sampled shape
    #[inline]
    pub fn samples(&self) -> &[Vec3] {
        &self.samples
    }

    /// Lengthen (pickups); returns the clamped length
    pub fn extend(&mut self, amount: f32) -> f32 {
        self.set_length(self.length + amount)
    }

    /// Shorten (damage); returns the clamped length
    pub fn shorten(&mut self, amount: f32) -> f32 {
        self.set_length(self.length - amount)
    }

    fn set_length(&mut self, length: f32) -> f32 {
        if !length.is_nan() {
            self.length = length.clamp(self.min_length, self.max_length);
        }
        self.length
    }

    pub fn band(&self) -> TensionBand {
        TensionBand::classify(self.tension)
    }

    /// 0 when relaxed, 1 when critical; blend factor for the string colour
    pub fn tension_tint(&self) -> f32 {
        ((self.tension - 5.0) / 20.0).clamp(0.0, 1.0)
    }
}

/// Damage for one tick of tension, or `None` at or below the threshold
pub fn tension_damage(tension: f32, threshold: f32, scale: f32) -> Option<f32> {
    if tension > threshold {
        Some((tension - threshold) * scale)
    } else {
        None
    }
}

//! Data-driven game balance
//!
//! Every constant the flight simulation reads lives here so a host can ship
//! alternate balance as JSON without recompiling.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors from loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    /// JSON could not be parsed into a `Tuning`
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tuning file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A value parsed but is outside what the simulation accepts
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Relaxed,
    #[default]
    Normal,
    Stormy,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Relaxed => "Relaxed",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Stormy => "Stormy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(DifficultyPreset::Relaxed),
            "normal" => Some(DifficultyPreset::Normal),
            "stormy" | "hard" => Some(DifficultyPreset::Stormy),
            _ => None,
        }
    }

    /// Multiplier on the per-tick gust start probability
    pub fn gust_frequency(&self) -> f32 {
        match self {
            DifficultyPreset::Relaxed => 0.5,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Stormy => 2.0,
        }
    }

    /// Multiplier on base wind strength
    pub fn wind_strength(&self) -> f32 {
        match self {
            DifficultyPreset::Relaxed => 0.8,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Stormy => 1.3,
        }
    }
}

/// Wind model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindTuning {
    pub base_strength: f32,
    /// Initial base direction, degrees (0 = forward, 90 = right)
    pub base_horizontal_deg: f32,
    /// Initial base direction, degrees (0 = horizontal, 90 = up)
    pub base_vertical_deg: f32,
    /// Noise phase advance per second
    pub variation_speed: f32,
    /// Chance of a gust starting on any idle tick (at difficulty 0)
    pub gust_probability: f32,
    pub gust_duration_min: f32,
    pub gust_duration_max: f32,
    pub gust_strength_min: f32,
    pub gust_strength_max: f32,
    pub gust_transition_in: f32,
    pub gust_transition_out: f32,
    /// Per-axis gust direction perturbation at difficulty 0
    pub gust_spread: f32,
    /// Extra perturbation added at difficulty 1
    pub gust_spread_per_difficulty: f32,
    /// Fraction of the remaining gap `current` closes toward `target` each tick
    pub smoothing: f32,
}

impl Default for WindTuning {
    fn default() -> Self {
        Self {
            base_strength: 5.0,
            base_horizontal_deg: -30.0,
            base_vertical_deg: 10.0,
            variation_speed: 0.5,
            gust_probability: 0.005,
            gust_duration_min: 1.0,
            gust_duration_max: 3.0,
            gust_strength_min: 2.0,
            gust_strength_max: 8.0,
            gust_transition_in: 0.5,
            gust_transition_out: 0.8,
            gust_spread: 0.3,
            gust_spread_per_difficulty: 0.2,
            smoothing: 0.1,
        }
    }
}

/// Kite rigid body and aerodynamics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KiteTuning {
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub lift_coefficient: f32,
    pub drag_coefficient: f32,
    /// Kite footprint used for collision queries
    pub size: f32,
}

impl Default for KiteTuning {
    fn default() -> Self {
        Self {
            mass: 0.5,
            linear_damping: 0.3,
            angular_damping: 0.8,
            lift_coefficient: 2.0,
            drag_coefficient: 0.3,
            size: KITE_SIZE,
        }
    }
}

/// String constraint, tension and sag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StringTuning {
    pub min_length: f32,
    pub max_length: f32,
    pub base_length: f32,
    /// Tension per unit of overstretch
    pub stiffness: f32,
    /// Tension above which the string takes damage
    pub tension_threshold: f32,
    /// Damage per unit of tension above the threshold, per tick
    pub damage_scale: f32,
    /// String length lost per point of tension damage
    pub shorten_per_damage: f32,
    /// Sag at the midpoint of a fully slack string
    pub max_sag: f32,
    /// Tension at which the sampled curve becomes a straight line
    pub taut_tension: f32,
    pub segments: usize,
    /// String gained per point of pickup value
    pub extend_per_value: f32,
}

impl Default for StringTuning {
    fn default() -> Self {
        Self {
            min_length: MIN_STRING_LENGTH,
            max_length: MAX_STRING_LENGTH,
            base_length: BASE_STRING_LENGTH,
            stiffness: 10.0,
            tension_threshold: 20.0,
            damage_scale: 0.1,
            shorten_per_damage: 0.05,
            max_sag: 2.0,
            taut_tension: 5.0,
            segments: 10,
            extend_per_value: 0.5,
        }
    }
}

/// String health
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthTuning {
    /// Damage from the kite or string touching an obstacle
    pub obstacle_damage: f32,
}

impl Default for HealthTuning {
    fn default() -> Self {
        Self {
            obstacle_damage: 10.0,
        }
    }
}

/// Player tug input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlTuning {
    pub max_tug_force: f32,
    pub key_increment: f32,
    pub pointer_sensitivity: f32,
    /// Fraction of tug force shed per tick once input is released
    pub decay_rate: f32,
    /// Residual force snapped to zero while decaying
    pub decay_epsilon: f32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            max_tug_force: MAX_TUG_FORCE,
            key_increment: 0.5,
            pointer_sensitivity: 0.01,
            decay_rate: 0.1,
            decay_epsilon: 0.1,
        }
    }
}

/// Difficulty ramp and theme schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressTuning {
    /// Seconds of flight until difficulty reaches 1
    pub difficulty_ramp_secs: f32,
    pub forests_at_secs: f32,
    pub cities_at_secs: f32,
}

impl Default for ProgressTuning {
    fn default() -> Self {
        Self {
            difficulty_ramp_secs: 120.0,
            forests_at_secs: 60.0,
            cities_at_secs: 120.0,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub wind: WindTuning,
    pub kite: KiteTuning,
    pub string: StringTuning,
    pub health: HealthTuning,
    pub controls: ControlTuning,
    pub progress: ProgressTuning,
}

impl Tuning {
    /// Create tuning from a difficulty preset (applies preset multipliers)
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut tuning = Self::default();
        tuning.wind.gust_probability *= preset.gust_frequency();
        tuning.wind.base_strength *= preset.wind_strength();
        tuning
    }

    /// Parse and validate tuning from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
            TuningError::Invalid {
                field,
                reason: reason.into(),
            }
        }
        fn range(field: &'static str, min: f32, max: f32) -> Result<(), TuningError> {
            if !(min.is_finite() && max.is_finite()) || min > max {
                return Err(invalid(field, format!("expected min <= max, got {min}..{max}")));
            }
            Ok(())
        }
        fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, format!("expected a finite value >= 0, got {value}")));
            }
            Ok(())
        }
        fn unit(field: &'static str, value: f32) -> Result<(), TuningError> {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("expected 0..=1, got {value}")));
            }
            Ok(())
        }

        let w = &self.wind;
        if !(w.base_strength >= 0.0) {
            return Err(invalid("wind.base_strength", "must be non-negative"));
        }
        non_negative("wind.variation_speed", w.variation_speed)?;
        non_negative("wind.gust_transition_in", w.gust_transition_in)?;
        non_negative("wind.gust_transition_out", w.gust_transition_out)?;
        non_negative("wind.gust_spread", w.gust_spread)?;
        non_negative("wind.gust_spread_per_difficulty", w.gust_spread_per_difficulty)?;
        unit("wind.gust_probability", w.gust_probability)?;
        unit("wind.smoothing", w.smoothing)?;
        range("wind.gust_duration", w.gust_duration_min, w.gust_duration_max)?;
        range("wind.gust_strength", w.gust_strength_min, w.gust_strength_max)?;
        if w.gust_duration_min <= 0.0 {
            return Err(invalid("wind.gust_duration_min", "must be positive"));
        }

        let k = &self.kite;
        if !(k.mass > 0.0) {
            return Err(invalid("kite.mass", "must be positive"));
        }
        unit("kite.linear_damping", k.linear_damping)?;
        unit("kite.angular_damping", k.angular_damping)?;

        let s = &self.string;
        range("string.length", s.min_length, s.max_length)?;
        if s.min_length <= 0.0 {
            return Err(invalid("string.min_length", "must be positive"));
        }
        if !(s.min_length..=s.max_length).contains(&s.base_length) {
            return Err(invalid("string.base_length", "must lie within min..max length"));
        }
        if !(2..=MAX_STRING_SEGMENTS).contains(&s.segments) {
            return Err(invalid(
                "string.segments",
                format!("expected 2..={MAX_STRING_SEGMENTS} sample points, got {}", s.segments),
            ));
        }
        non_negative("string.stiffness", s.stiffness)?;
        non_negative("string.tension_threshold", s.tension_threshold)?;
        non_negative("string.damage_scale", s.damage_scale)?;
        non_negative("string.shorten_per_damage", s.shorten_per_damage)?;
        non_negative("string.max_sag", s.max_sag)?;
        non_negative("string.taut_tension", s.taut_tension)?;
        non_negative("string.extend_per_value", s.extend_per_value)?;

        let c = &self.controls;
        if !(c.max_tug_force >= 0.0) {
            return Err(invalid("controls.max_tug_force", "must be non-negative"));
        }
        unit("controls.decay_rate", c.decay_rate)?;

        if !(self.progress.difficulty_ramp_secs > 0.0) {
            return Err(invalid("progress.difficulty_ramp_secs", "must be positive"));
        }

        Ok(())
    }
}

//! Flight session state
//!
//! One `FlightSession` owns everything the simulation mutates: wind, tug
//! input, kite body, string and health, plus the seeded RNG. Resetting
//! rebuilds all of it at once so nothing from a previous run leaks into the
//! next.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::health::HealthState;
use super::kite::KiteBody;
use super::string::{RopeConstraint, StringState};
use super::tug::TugInput;
use super::wind::WindState;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightPhase {
    /// Simulation advancing
    Flying,
    /// Frozen until unpaused
    Paused,
    /// String health ran out; terminal
    GameOver,
}

/// Scenery theme, advanced by flight time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Islands,
    Forests,
    Cities,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Islands => "islands",
            Theme::Forests => "forests",
            Theme::Cities => "cities",
        }
    }
}

/// Something the host should react to, produced during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlightEvent {
    /// String took damage (tension or obstacle)
    Damaged { amount: f32 },
    /// Damage cost string length
    StringShortened { length: f32 },
    GustStarted { strength: f32, duration: f32 },
    GustEnded,
    ThemeChanged(Theme),
    PickupCollected { value: u32 },
    ObstacleHit,
    /// Emitted exactly once per session
    GameOver { score: u64 },
}

/// Spark value range (bigger sparks are worth more)
pub const SPARK_VALUE_MIN: u32 = 1;
pub const SPARK_VALUE_MAX: u32 = 5;

/// Value of a spark from its size normalized to [0, 1]
pub fn spark_value(normalized_size: f32) -> u32 {
    let size = if normalized_size.is_finite() {
        normalized_size.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let span = (SPARK_VALUE_MAX - SPARK_VALUE_MIN) as f32;
    SPARK_VALUE_MIN + (size * span).floor() as u32
}

/// Complete flight session (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct FlightSession {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: FlightPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Seconds of flight (not advanced while paused)
    pub elapsed: f32,
    pub theme: Theme,
    pub score: u64,
    pub wind: WindState,
    pub tug: TugInput,
    pub kite: KiteBody,
    pub string: StringState,
    pub health: HealthState,
    pub constraint: RopeConstraint,
    /// Events from the most recent tick
    pub(crate) events: Vec<FlightEvent>,
    pub(crate) rng: Pcg32,
}

impl FlightSession {
    /// Create a new session with the given seed
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let wind = WindState::new(&tuning.wind, &mut rng);
        let kite = KiteBody::new(KITE_SPAWN, &tuning.kite);
        let string = StringState::new(ANCHOR_POSITION, &tuning.string);

        log::info!("Flight session started with seed: {}", seed);

        Self {
            seed,
            tuning,
            phase: FlightPhase::Flying,
            time_ticks: 0,
            elapsed: 0.0,
            theme: Theme::Islands,
            score: 0,
            wind,
            tug: TugInput::new(),
            kite,
            string,
            health: HealthState::new(),
            constraint: RopeConstraint::default(),
            events: Vec::new(),
            rng,
        }
    }

    /// Rebuild every component from scratch, keeping the tuning
    pub fn reset(&mut self, seed: u64) {
        let tuning = std::mem::take(&mut self.tuning);
        *self = Self::new(seed, tuning);
    }

    /// 0 at takeoff, reaching 1 after the configured ramp
    pub fn difficulty(&self) -> f32 {
        (self.elapsed / self.tuning.progress.difficulty_ramp_secs).clamp(0.0, 1.0)
    }

    /// Theme the schedule calls for at the current flight time
    pub fn scheduled_theme(&self) -> Theme {
        let progress = &self.tuning.progress;
        if self.elapsed >= progress.cities_at_secs {
            Theme::Cities
        } else if self.elapsed >= progress.forests_at_secs {
            Theme::Forests
        } else {
            Theme::Islands
        }
    }

    /// Spark collected: lengthen the string, repair health, add score
    pub fn collect_pickup(&mut self, value: u32) {
        if self.phase == FlightPhase::GameOver {
            return;
        }
        let amount = value as f32;
        self.string.extend(amount * self.tuning.string.extend_per_value);
        self.health.apply_repair(amount);
        self.score += u64::from(value);
        self.events.push(FlightEvent::PickupCollected { value });
    }

    /// Damage the string: costs health and length, may end the session
    pub(crate) fn damage(&mut self, amount: f32) {
        if !(amount > 0.0) || self.phase == FlightPhase::GameOver {
            return;
        }
        let depleted = self.health.apply_damage(amount);
        self.events.push(FlightEvent::Damaged { amount });

        let before = self.string.length();
        let length = self
            .string
            .shorten(amount * self.tuning.string.shorten_per_damage);
        if length < before {
            log::debug!("String shortened to {:.2}", length);
            self.events.push(FlightEvent::StringShortened { length });
        }

        if depleted {
            self.phase = FlightPhase::GameOver;
            log::info!("Game over: string snapped (score {})", self.score);
            self.events.push(FlightEvent::GameOver { score: self.score });
        }
    }

    /// Events produced by the last tick
    pub fn events(&self) -> &[FlightEvent] {
        &self.events
    }

    /// Take the last tick's events
    pub fn drain_events(&mut self) -> Vec<FlightEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn kite_position(&self) -> Vec3 {
        self.kite.position
    }

    /// Sampled string shape from the last tick, anchor first
    #[inline]
    pub fn string_samples(&self) -> &[Vec3] {
        self.string.samples()
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == FlightPhase::GameOver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_spawns_at_rest() {
        let session = FlightSession::new(7, Tuning::default());
        assert_eq!(session.phase, FlightPhase::Flying);
        assert_eq!(session.kite_position(), KITE_SPAWN);
        assert_eq!(session.string.length(), BASE_STRING_LENGTH);
        assert_eq!(session.health.value(), MAX_HEALTH);
        assert_eq!(session.difficulty(), 0.0);
        assert_eq!(session.theme, Theme::Islands);
    }

    #[test]
    fn test_difficulty_and_theme_follow_flight_time() {
        let mut session = FlightSession::new(7, Tuning::default());
        session.elapsed = 60.0;
        assert!((session.difficulty() - 0.5).abs() < 1e-6);
        assert_eq!(session.scheduled_theme(), Theme::Forests);
        session.elapsed = 500.0;
        assert_eq!(session.difficulty(), 1.0);
        assert_eq!(session.scheduled_theme(), Theme::Cities);
    }

    #[test]
    fn test_pickup_extends_repairs_and_scores() {
        let mut session = FlightSession::new(7, Tuning::default());
        session.health.apply_damage(30.0);
        session.collect_pickup(4);
        assert_eq!(session.string.length(), BASE_STRING_LENGTH + 2.0);
        assert_eq!(session.health.value(), 74.0);
        assert_eq!(session.score, 4);
        assert_eq!(session.events(), &[FlightEvent::PickupCollected { value: 4 }]);
    }

    #[test]
    fn test_damage_to_zero_ends_session_once() {
        let mut session = FlightSession::new(7, Tuning::default());
        session.damage(60.0);
        assert_eq!(session.string.length(), BASE_STRING_LENGTH - 3.0);
        session.damage(60.0);
        session.damage(60.0);
        assert!(session.is_game_over());
        assert_eq!(session.health.value(), 0.0);
        let game_overs = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, FlightEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_reset_rebuilds_everything() {
        let mut session = FlightSession::new(7, Tuning::default());
        session.kite.position = Vec3::new(50.0, 50.0, 50.0);
        session.string.extend(10.0);
        session.damage(500.0);
        session.elapsed = 99.0;
        session.score = 12;

        session.reset(8);

        let fresh = FlightSession::new(8, Tuning::default());
        assert_eq!(session.seed, 8);
        assert_eq!(session.phase, FlightPhase::Flying);
        assert_eq!(session.kite_position(), KITE_SPAWN);
        assert_eq!(session.string.length(), BASE_STRING_LENGTH);
        assert_eq!(session.health.value(), MAX_HEALTH);
        assert_eq!(session.score, 0);
        assert_eq!(session.elapsed, 0.0);
        assert_eq!(session.wind.noise_offsets, fresh.wind.noise_offsets);
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_spark_value_from_size() {
        assert_eq!(spark_value(0.0), 1);
        assert_eq!(spark_value(0.5), 3);
        assert_eq!(spark_value(1.0), 5);
        assert_eq!(spark_value(-3.0), 1);
        assert_eq!(spark_value(f32::NAN), 1);
    }
}

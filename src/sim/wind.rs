//! Procedural wind
//!
//! The wind vector is built from three layers:
//! - a base direction and strength
//! - smooth sine/cosine "noise" variation, one decorrelated offset per axis
//! - occasional gusts that ease in and out
//!
//! Both the variation and the gusts grow with difficulty. The vector the kite
//! actually feels (`current`) chases `target` with exponential smoothing, so
//! the wind never jumps from one tick to the next.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::WindTuning;
use crate::{direction_from_angles, try_direction};

/// Range of the random per-axis noise offsets
const NOISE_OFFSET_RANGE: f32 = 1000.0;

/// Variation amplitude gained at difficulty 1 (multiplier is `1 + this * difficulty`)
const VARIATION_DIFFICULTY_GAIN: f32 = 0.5;
/// Gust strength gained at difficulty 1
const GUST_STRENGTH_DIFFICULTY_GAIN: f32 = 0.5;

/// An active gust
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gust {
    /// Unit direction
    pub direction: Vec3,
    pub strength: f32,
    /// Total length in seconds
    pub duration: f32,
    pub time_remaining: f32,
    /// Seconds spent ramping up
    pub transition_in: f32,
    /// Seconds spent ramping down
    pub transition_out: f32,
}

impl Gust {
    /// Roll a new gust around `base_direction`
    pub fn spawn<R: Rng>(
        base_direction: Vec3,
        difficulty: f32,
        tuning: &WindTuning,
        rng: &mut R,
    ) -> Self {
        let duration = lerp(
            tuning.gust_duration_min,
            tuning.gust_duration_max,
            rng.random::<f32>(),
        );

        let scale = 1.0 + difficulty * GUST_STRENGTH_DIFFICULTY_GAIN;
        let strength = lerp(
            tuning.gust_strength_min * scale,
            tuning.gust_strength_max * scale,
            rng.random::<f32>(),
        );

        let spread = tuning.gust_spread + difficulty * tuning.gust_spread_per_difficulty;
        let perturbation = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        ) * spread;
        let direction = try_direction(base_direction + perturbation).unwrap_or(base_direction);

        Self {
            direction,
            strength,
            duration,
            time_remaining: duration,
            transition_in: tuning.gust_transition_in,
            transition_out: tuning.gust_transition_out,
        }
    }

    /// Seconds since the gust started
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.duration - self.time_remaining
    }

    /// Ramp factor in [0, 1]: rises over `transition_in`, falls over `transition_out`
    ///
    /// Taking the lower of the two ramps keeps short gusts (shorter than both
    /// transitions combined) continuous instead of dropping from one ramp to
    /// the other.
    pub fn ease(&self) -> f32 {
        let rise = if self.transition_in > 0.0 {
            self.elapsed() / self.transition_in
        } else {
            1.0
        };
        let fall = if self.transition_out > 0.0 {
            self.time_remaining / self.transition_out
        } else {
            1.0
        };
        rise.min(fall).clamp(0.0, 1.0)
    }

    /// Wind added by this gust right now
    #[inline]
    pub fn contribution(&self) -> Vec3 {
        self.direction * self.strength * self.ease()
    }
}

/// Gust lifecycle change reported by [`WindState::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GustTransition {
    Started { strength: f32, duration: f32 },
    Ended,
}

/// Complete wind state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindState {
    /// Unit direction of the steady wind
    pub base_direction: Vec3,
    pub base_strength: f32,
    /// Monotonic noise time
    pub noise_phase: f32,
    /// Per-axis phase offsets so the axes don't move together
    pub noise_offsets: Vec3,
    /// Variation computed on the last step (already difficulty-scaled)
    pub variation: Vec3,
    /// At most one gust at a time
    pub gust: Option<Gust>,
    /// Smoothed wind the kite feels
    pub current: Vec3,
    /// Where `current` is heading
    pub target: Vec3,
}

impl WindState {
    /// Create the session wind, drawing noise offsets from `rng`
    pub fn new<R: Rng>(tuning: &WindTuning, rng: &mut R) -> Self {
        let noise_offsets = Vec3::new(
            rng.random::<f32>() * NOISE_OFFSET_RANGE,
            rng.random::<f32>() * NOISE_OFFSET_RANGE,
            rng.random::<f32>() * NOISE_OFFSET_RANGE,
        );
        let base_direction = try_direction(direction_from_angles(
            tuning.base_horizontal_deg,
            tuning.base_vertical_deg,
        ))
        .unwrap_or(Vec3::NEG_Z);
        let base = base_direction * tuning.base_strength;

        Self {
            base_direction,
            base_strength: tuning.base_strength,
            noise_phase: 0.0,
            noise_offsets,
            variation: Vec3::ZERO,
            gust: None,
            current: base,
            target: base,
        }
    }

    /// Point the steady wind (degrees; 0/0 is forward along -z)
    ///
    /// Returns false and keeps the previous direction if the angles don't
    /// produce a usable vector.
    pub fn set_base_direction(&mut self, horizontal_deg: f32, vertical_deg: f32) -> bool {
        match try_direction(direction_from_angles(horizontal_deg, vertical_deg)) {
            Some(direction) => {
                self.base_direction = direction;
                self.target = self.compose_target();
                true
            }
            None => false,
        }
    }

    /// Advance the wind by `dt` seconds at the given difficulty (0..=1)
    pub fn step<R: Rng>(
        &mut self,
        dt: f32,
        difficulty: f32,
        tuning: &WindTuning,
        rng: &mut R,
    ) -> Option<GustTransition> {
        if !(dt > 0.0 && dt.is_finite()) {
            return None;
        }
        let difficulty = clamp_difficulty(difficulty);

        self.noise_phase += dt * tuning.variation_speed;
        self.variation = noise_variation(self.noise_phase, self.noise_offsets)
            * (1.0 + difficulty * VARIATION_DIFFICULTY_GAIN);

        let transition = self.update_gust(dt, difficulty, tuning, rng);

        self.target = self.compose_target();
        let next = self.current + (self.target - self.current) * tuning.smoothing;
        if next.is_finite() {
            self.current = next;
        }

        transition
    }

    fn update_gust<R: Rng>(
        &mut self,
        dt: f32,
        difficulty: f32,
        tuning: &WindTuning,
        rng: &mut R,
    ) -> Option<GustTransition> {
        if let Some(gust) = self.gust.as_mut() {
            gust.time_remaining -= dt;
            if gust.time_remaining > 0.0 {
                return None;
            }
            self.gust = None;
            log::debug!("Gust ended");
            return Some(GustTransition::Ended);
        }

        let probability = tuning.gust_probability * (1.0 + difficulty);
        if rng.random::<f32>() >= probability {
            return None;
        }

        let gust = Gust::spawn(self.base_direction, difficulty, tuning, rng);
        log::debug!(
            "Gust started: strength {:.2}, duration {:.2}s",
            gust.strength,
            gust.duration
        );
        let transition = GustTransition::Started {
            strength: gust.strength,
            duration: gust.duration,
        };
        self.gust = Some(gust);
        Some(transition)
    }

    /// Base + variation + eased gust
    fn compose_target(&self) -> Vec3 {
        let base = self.base_direction * self.base_strength + self.variation;
        match &self.gust {
            Some(gust) => base + gust.contribution(),
            None => base,
        }
    }

    /// Wind the kite feels this tick
    #[inline]
    pub fn current_wind(&self) -> Vec3 {
        self.current
    }

    #[inline]
    pub fn gust_active(&self) -> bool {
        self.gust.is_some()
    }

    /// Gust share of the target wind (zero when idle)
    pub fn gust_contribution(&self) -> Vec3 {
        self.gust.as_ref().map(Gust::contribution).unwrap_or(Vec3::ZERO)
    }
}

/// Deterministic pseudo-noise: products of sines and cosines, bounded per axis
/// by (0.5, 0.3, 0.4)
pub fn noise_variation(phase: f32, offsets: Vec3) -> Vec3 {
    let t = phase;
    Vec3::new(
        (t * 0.3 + offsets.x).sin() * (t * 0.7 + offsets.y).cos() * 0.5,
        (t * 0.4 + offsets.y).sin() * (t * 0.6 + offsets.z).cos() * 0.3,
        (t * 0.5 + offsets.z).sin() * (t * 0.5 + offsets.x).cos() * 0.4,
    )
}

#[inline]
fn clamp_difficulty(difficulty: f32) -> f32 {
    if difficulty.is_finite() {
        difficulty.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn calm_tuning() -> WindTuning {
        WindTuning {
            gust_probability: 0.0,
            ..Default::default()
        }
    }

    fn test_gust(duration: f32) -> Gust {
        Gust {
            direction: Vec3::X,
            strength: 6.0,
            duration,
            time_remaining: duration,
            transition_in: 0.5,
            transition_out: 0.8,
        }
    }

    #[test]
    fn test_base_direction_default_is_normalized() {
        let mut rng = Pcg32::seed_from_u64(1);
        let wind = WindState::new(&WindTuning::default(), &mut rng);
        assert!((wind.base_direction.length() - 1.0).abs() < 1e-5);
        // Slightly right of forward and tilted up
        assert!(wind.base_direction.z < 0.0);
        assert!(wind.base_direction.y > 0.0);
        assert!((wind.current.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_set_base_direction_updates_target() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut wind = WindState::new(&calm_tuning(), &mut rng);
        assert!(wind.set_base_direction(90.0, 0.0));
        assert!((wind.base_direction - Vec3::X).length() < 1e-5);
        assert!((wind.target - Vec3::X * 5.0).length() < 1e-4);
    }

    #[test]
    fn test_current_moves_one_tenth_toward_target() {
        let mut rng = Pcg32::seed_from_u64(7);
        let tuning = calm_tuning();
        let mut wind = WindState::new(&tuning, &mut rng);
        wind.current = Vec3::ZERO;
        wind.step(SIM_DT, 0.0, &tuning, &mut rng);
        assert!((wind.current - wind.target * 0.1).length() < 1e-5);
    }

    #[test]
    fn test_non_positive_dt_is_ignored() {
        let mut rng = Pcg32::seed_from_u64(7);
        let tuning = WindTuning::default();
        let mut wind = WindState::new(&tuning, &mut rng);
        let before = wind.clone();
        assert!(wind.step(0.0, 0.5, &tuning, &mut rng).is_none());
        assert!(wind.step(-1.0, 0.5, &tuning, &mut rng).is_none());
        assert_eq!(wind.current, before.current);
        assert_eq!(wind.noise_phase, before.noise_phase);
    }

    #[test]
    fn test_gust_ease_is_zero_at_both_ends_and_full_in_the_middle() {
        let mut gust = test_gust(3.0);
        assert_eq!(gust.ease(), 0.0);
        assert_eq!(gust.contribution(), Vec3::ZERO);

        gust.time_remaining = 3.0 - 0.25;
        assert!((gust.ease() - 0.5).abs() < 1e-5);

        // Plateau: [transition_in, duration - transition_out] = [0.5, 2.2]
        for elapsed in [0.5, 1.0, 1.5, 2.2] {
            gust.time_remaining = 3.0 - elapsed;
            assert!((gust.ease() - 1.0).abs() < 1e-5, "elapsed {elapsed}");
        }

        gust.time_remaining = 0.4;
        assert!((gust.ease() - 0.5).abs() < 1e-5);

        gust.time_remaining = 0.0;
        assert_eq!(gust.ease(), 0.0);
    }

    #[test]
    fn test_short_gust_ramp_is_continuous() {
        // Shorter than transition_in + transition_out: no plateau, no jump
        let mut gust = test_gust(1.0);
        let mut last = gust.ease();
        let steps = 1000;
        for i in 1..=steps {
            gust.time_remaining = 1.0 - i as f32 / steps as f32;
            let e = gust.ease();
            assert!((e - last).abs() < 0.01, "jump at step {i}: {last} -> {e}");
            last = e;
        }
    }

    #[test]
    fn test_gust_counts_down_and_ends_exactly_once() {
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = calm_tuning();
        let mut wind = WindState::new(&tuning, &mut rng);
        wind.gust = Some(test_gust(1.0));

        let mut last_remaining = 1.0;
        let mut ended = 0;
        for _ in 0..120 {
            match wind.step(SIM_DT, 0.0, &tuning, &mut rng) {
                Some(GustTransition::Ended) => ended += 1,
                Some(GustTransition::Started { .. }) => panic!("gusts are disabled"),
                None => {}
            }
            if let Some(gust) = &wind.gust {
                assert!(gust.time_remaining < last_remaining);
                last_remaining = gust.time_remaining;
            }
        }
        assert_eq!(ended, 1);
        assert!(!wind.gust_active());
        assert_eq!(wind.gust_contribution(), Vec3::ZERO);
    }

    #[test]
    fn test_spawned_gust_respects_ranges() {
        let tuning = WindTuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        for difficulty in [0.0, 1.0] {
            for _ in 0..500 {
                let gust = Gust::spawn(Vec3::NEG_Z, difficulty, &tuning, &mut rng);
                let scale = 1.0 + difficulty * 0.5;
                assert!(gust.duration >= 1.0 && gust.duration <= 3.0);
                assert!(gust.strength >= 2.0 * scale - 1e-4);
                assert!(gust.strength <= 8.0 * scale + 1e-4);
                assert!((gust.direction.length() - 1.0).abs() < 1e-4);
                assert_eq!(gust.time_remaining, gust.duration);
            }
        }
    }

    #[test]
    fn test_gust_direction_spreads_wider_at_high_difficulty() {
        let tuning = WindTuning::default();
        let base = Vec3::NEG_Z;
        let mean_deviation = |difficulty: f32| {
            let mut rng = Pcg32::seed_from_u64(21);
            let trials = 5_000;
            let total: f32 = (0..trials)
                .map(|_| {
                    let gust = Gust::spawn(base, difficulty, &tuning, &mut rng);
                    gust.direction.dot(base).clamp(-1.0, 1.0).acos()
                })
                .sum();
            total / trials as f32
        };

        let calm = mean_deviation(0.0);
        let stormy = mean_deviation(1.0);
        // Spread 0.3 vs 0.5 around the base direction
        assert!(calm > 0.05, "calm deviation {calm}");
        assert!(stormy > calm * 1.3, "calm {calm}, stormy {stormy}");
    }

    #[test]
    fn test_gusts_start_more_often_at_high_difficulty() {
        let tuning = WindTuning::default();
        let trials = 200_000;

        let count_starts = |difficulty: f32| {
            let mut rng = Pcg32::seed_from_u64(42);
            let mut wind = WindState::new(&tuning, &mut rng);
            let mut starts = 0;
            for _ in 0..trials {
                wind.gust = None;
                if let Some(GustTransition::Started { .. }) =
                    wind.step(SIM_DT, difficulty, &tuning, &mut rng)
                {
                    starts += 1;
                }
            }
            starts
        };

        let easy = count_starts(0.0);
        let hard = count_starts(1.0);
        // Expected ~1000 vs ~2000
        assert!(easy > 700 && easy < 1300, "easy starts: {easy}");
        assert!(hard > easy + 500, "easy {easy}, hard {hard}");
    }

    #[test]
    fn test_variation_grows_with_difficulty() {
        let tuning = calm_tuning();
        let total_variation = |difficulty: f32| {
            let mut rng = Pcg32::seed_from_u64(5);
            let mut wind = WindState::new(&tuning, &mut rng);
            let mut total = 0.0;
            for _ in 0..10_000 {
                wind.step(SIM_DT, difficulty, &tuning, &mut rng);
                total += wind.variation.length();
            }
            total
        };
        assert!(total_variation(1.0) > total_variation(0.0));
    }

    #[test]
    fn test_noise_variation_is_bounded_and_continuous() {
        let offsets = Vec3::new(12.0, 345.0, 678.0);
        let mut last = noise_variation(0.0, offsets);
        for i in 1..10_000 {
            let v = noise_variation(i as f32 * 0.01, offsets);
            assert!(v.x.abs() <= 0.5 && v.y.abs() <= 0.3 && v.z.abs() <= 0.4);
            assert!((v - last).length() < 0.02);
            last = v;
        }
    }

    proptest! {
        #[test]
        fn prop_smoothing_never_overshoots(
            cx in -50.0f32..50.0, cy in -50.0f32..50.0, cz in -50.0f32..50.0,
            dt in 0.0001f32..0.5,
            difficulty in 0.0f32..=1.0,
            seed in any::<u64>(),
        ) {
            let tuning = WindTuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut wind = WindState::new(&tuning, &mut rng);
            wind.current = Vec3::new(cx, cy, cz);
            let previous = wind.current;

            wind.step(dt, difficulty, &tuning, &mut rng);

            let moved = (wind.current - previous).length();
            let gap = (wind.target - previous).length();
            prop_assert!(moved <= gap + 1e-4);
            prop_assert!(wind.current.is_finite());
        }
    }
}

//! String health
//!
//! Damage and repair are clamped into [0, 100]. Reaching zero is terminal for
//! the session: the first crossing reports it, later damage is absorbed
//! silently and repair no longer applies.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_HEALTH;

/// Health at or below this shows the low-health warning
pub const WARNING_HEALTH: f32 = 30.0;

/// Health bar colour band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthBand {
    Low,
    Caution,
    Nominal,
}

impl HealthBand {
    pub fn classify(value: f32) -> Self {
        if value <= 20.0 {
            HealthBand::Low
        } else if value <= 50.0 {
            HealthBand::Caution
        } else {
            HealthBand::Nominal
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthState {
    value: f32,
    depleted: bool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            value: MAX_HEALTH,
            depleted: false,
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Health in [0, 1] for the bar width
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.value / MAX_HEALTH
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    /// Subtract damage; returns true only on the tick health first hits zero
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.depleted || !(amount > 0.0) {
            return false;
        }
        self.value = (self.value - amount).max(0.0);
        if self.value <= 0.0 {
            self.depleted = true;
            return true;
        }
        false
    }

    /// Add health, capped at the maximum; returns the new value
    pub fn apply_repair(&mut self, amount: f32) -> f32 {
        if !self.depleted && amount > 0.0 {
            self.value = (self.value + amount).min(MAX_HEALTH);
        }
        self.value
    }

    pub fn band(&self) -> HealthBand {
        HealthBand::classify(self.value)
    }

    pub fn is_warning(&self) -> bool {
        self.value <= WARNING_HEALTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_damage_and_repair_clamp() {
        let mut health = HealthState::new();
        assert_eq!(health.value(), 100.0);
        assert_eq!(health.apply_repair(50.0), 100.0);

        assert!(!health.apply_damage(30.0));
        assert_eq!(health.value(), 70.0);
        assert_eq!(health.apply_repair(10.0), 80.0);
        assert!((health.fraction() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_game_over_fires_once() {
        let mut health = HealthState::new();
        assert!(health.apply_damage(150.0));
        assert_eq!(health.value(), 0.0);
        assert!(health.is_depleted());

        for _ in 0..10 {
            assert!(!health.apply_damage(5.0));
            assert_eq!(health.value(), 0.0);
        }
        // Terminal: repair does not revive
        assert_eq!(health.apply_repair(20.0), 0.0);
        assert!(!health.apply_damage(1.0));
    }

    #[test]
    fn test_negative_and_nan_amounts_are_ignored() {
        let mut health = HealthState::new();
        health.apply_damage(40.0);
        assert!(!health.apply_damage(-10.0));
        assert!(!health.apply_damage(f32::NAN));
        assert_eq!(health.apply_repair(-10.0), 60.0);
        assert_eq!(health.apply_repair(f32::NAN), 60.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(HealthBand::classify(20.0), HealthBand::Low);
        assert_eq!(HealthBand::classify(20.5), HealthBand::Caution);
        assert_eq!(HealthBand::classify(50.0), HealthBand::Caution);
        assert_eq!(HealthBand::classify(51.0), HealthBand::Nominal);

        let mut health = HealthState::new();
        assert!(!health.is_warning());
        health.apply_damage(70.0);
        assert!(health.is_warning());
        assert_eq!(health.band(), HealthBand::Caution);
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(ops in prop::collection::vec((any::<bool>(), -1.0e6f32..1.0e6), 0..64)) {
            let mut health = HealthState::new();
            let mut fired = 0;
            for (damage, amount) in ops {
                if damage {
                    if health.apply_damage(amount) {
                        fired += 1;
                    }
                } else {
                    health.apply_repair(amount);
                }
                prop_assert!((0.0..=100.0).contains(&health.value()));
            }
            prop_assert!(fired <= 1);
            if fired == 1 {
                prop_assert_eq!(health.value(), 0.0);
            }
        }
    }
}

//! Deterministic flight simulation
//!
//! All flight logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Input sampled once per tick
//! - No rendering or platform dependencies

pub mod collision;
pub mod health;
pub mod kite;
pub mod state;
pub mod string;
pub mod tick;
pub mod tug;
pub mod wind;

pub use collision::{Sphere, kite_hits_sphere, segment_intersects_sphere, string_intersects_any};
pub use health::{HealthBand, HealthState, WARNING_HEALTH};
pub use kite::{AeroForce, KiteBody, aerodynamic_force};
pub use state::{FlightEvent, FlightPhase, FlightSession, Theme, spark_value};
pub use string::{
    DistanceConstraint, PointMass, RopeConstraint, StringState, TensionBand, tension_damage,
};
pub use tick::{TickInput, tick};
pub use tug::{DirectionKeys, TugCommand, TugInput};
pub use wind::{Gust, GustTransition, WindState};

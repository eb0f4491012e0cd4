//! Kite rigid body and aerodynamic force
//!
//! The kite is a flat plate. Its local +z is the surface normal and local +x
//! the horizontal cross spar. Wind only pushes when it strikes the front
//! face; lift and drag act at the center, so aerodynamics never torque the
//! body.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::string::PointMass;
use crate::try_direction;
use crate::tuning::KiteTuning;

/// Below this fraction of wind speed the spar is treated as parallel to the wind
const LIFT_AXIS_TOLERANCE: f32 = 1e-4;

/// Kite physics body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KiteBody {
    pub position: Vec3,
    /// Unit quaternion, renormalized every integration step
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    /// Fraction of linear velocity lost per second, in [0, 1]
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second, in [0, 1]
    pub angular_damping: f32,
    /// Forces accumulated since the last integration
    #[serde(skip)]
    force: Vec3,
}

impl KiteBody {
    pub fn new(position: Vec3, tuning: &KiteTuning) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: tuning.mass.max(f32::EPSILON),
            linear_damping: tuning.linear_damping.clamp(0.0, 1.0),
            angular_damping: tuning.angular_damping.clamp(0.0, 1.0),
            force: Vec3::ZERO,
        }
    }

    /// World-space surface normal (front face points along it)
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    /// World-space horizontal spar
    #[inline]
    pub fn edge(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    /// Accumulate a force at the center of mass; non-finite forces are dropped
    pub fn apply_force(&mut self, force: Vec3) {
        if force.is_finite() {
            self.force += force;
        }
    }

    /// Forces waiting for the next integration
    #[inline]
    pub fn pending_force(&self) -> Vec3 {
        self.force
    }

    /// Semi-implicit Euler step: velocity first, then position from the new velocity
    pub fn integrate(&mut self, gravity: Vec3, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        let acceleration = self.force * self.inverse_mass() + gravity;
        self.linear_velocity += acceleration * dt;
        self.linear_velocity *= (1.0 - self.linear_damping).powf(dt);
        self.angular_velocity *= (1.0 - self.angular_damping).powf(dt);

        self.position += self.linear_velocity * dt;

        let spin = Quat::from_scaled_axis(self.angular_velocity * dt);
        self.orientation = (spin * self.orientation).normalize();

        self.force = Vec3::ZERO;
    }

    /// Position/velocity view for the distance constraint
    pub fn point_mass(&self) -> PointMass {
        PointMass {
            position: self.position,
            velocity: self.linear_velocity,
            inv_mass: self.inverse_mass(),
        }
    }

    /// Write back a solved point mass
    pub fn set_point_mass(&mut self, point: &PointMass) {
        if point.position.is_finite() && point.velocity.is_finite() {
            self.position = point.position;
            self.linear_velocity = point.velocity;
        }
    }

    /// Tail points hanging from the bottom corner, swaying with `time`
    pub fn tail_points(&self, time: f32, segments: usize, length: f32, size: f32) -> Vec<Vec3> {
        let down = self.orientation * Vec3::NEG_Y;
        let start = self.position + down * size;
        let last = segments.saturating_sub(1).max(1) as f32;

        (0..segments)
            .map(|i| {
                let t = i as f32 / last;
                let sway = Vec3::new(
                    (time * 3.0 + t * 10.0).sin() * 0.5 * t,
                    0.0,
                    (time * 2.0 + t * 8.0).cos() * 0.5 * t,
                );
                start + down * (t * length) + sway
            })
            .collect()
    }
}

/// Lift and drag from one wind sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroForce {
    pub lift: Vec3,
    pub drag: Vec3,
    /// `normal · wind`, negative when the wind hits the front face
    pub alignment: f32,
}

impl AeroForce {
    #[inline]
    pub fn total(&self) -> Vec3 {
        self.lift + self.drag
    }
}

/// Aerodynamic force on a kite with the given attitude
///
/// Returns `None` when the wind has no length or strikes the back face. Lift
/// is left at zero when the wind runs along the spar and the lift direction
/// is undefined.
pub fn aerodynamic_force(
    orientation: Quat,
    wind: Vec3,
    lift_coefficient: f32,
    drag_coefficient: f32,
) -> Option<AeroForce> {
    let wind_dir = try_direction(wind)?;
    let speed = wind.length();

    let normal = orientation * Vec3::Z;
    let alignment = normal.dot(wind);
    if alignment >= 0.0 {
        return None;
    }
    let push = speed * alignment.abs();

    let edge = orientation * Vec3::X;
    let lift_axis = edge.cross(wind);
    let lift = if lift_axis.length() > LIFT_AXIS_TOLERANCE * speed {
        lift_axis.normalize() * push * lift_coefficient
    } else {
        Vec3::ZERO
    };
    let drag = wind_dir * push * drag_coefficient;

    Some(AeroForce {
        lift,
        drag,
        alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRAVITY, SIM_DT};
    use std::f32::consts::PI;

    fn kite() -> KiteBody {
        KiteBody::new(Vec3::new(0.0, 10.0, 0.0), &KiteTuning::default())
    }

    #[test]
    fn test_head_on_wind_lifts_and_drags() {
        let aero = aerodynamic_force(Quat::IDENTITY, Vec3::new(0.0, 0.0, -10.0), 2.0, 0.3)
            .expect("front-face wind must produce force");
        assert!((aero.alignment + 10.0).abs() < 1e-5);
        // |wind| * |alignment| * coefficient
        assert!((aero.lift - Vec3::new(0.0, 200.0, 0.0)).length() < 1e-3);
        assert!((aero.drag - Vec3::new(0.0, 0.0, -30.0)).length() < 1e-3);
        // Lift is perpendicular to both the wind and the spar
        assert!(aero.lift.dot(Vec3::Z).abs() < 1e-3);
        assert!(aero.lift.dot(Vec3::X).abs() < 1e-3);
    }

    #[test]
    fn test_wind_on_back_face_does_nothing() {
        let turned = Quat::from_rotation_y(PI);
        let normal = turned * Vec3::Z;
        assert!((normal - Vec3::NEG_Z).length() < 1e-5);
        assert!(aerodynamic_force(turned, Vec3::new(0.0, 0.0, -10.0), 2.0, 0.3).is_none());
    }

    #[test]
    fn test_zero_wind_does_nothing() {
        assert!(aerodynamic_force(Quat::IDENTITY, Vec3::ZERO, 2.0, 0.3).is_none());
    }

    #[test]
    fn test_wind_along_spar_skips_lift() {
        // Grazes the front face while running almost exactly along the spar
        let wind = Vec3::new(10.0, 0.0, -1e-5);
        let aero = aerodynamic_force(Quat::IDENTITY, wind, 2.0, 0.3)
            .expect("wind still touches the front face");
        assert_eq!(aero.lift, Vec3::ZERO);
        assert!(aero.drag.x > 0.0);
    }

    #[test]
    fn test_free_fall_under_gravity() {
        let mut body = kite();
        body.linear_damping = 0.0;
        body.integrate(GRAVITY, SIM_DT);
        // Symplectic Euler: position uses the updated velocity
        assert!((body.linear_velocity.y - GRAVITY.y * SIM_DT).abs() < 1e-5);
        assert!((body.position.y - (10.0 + GRAVITY.y * SIM_DT * SIM_DT)).abs() < 1e-5);
    }

    #[test]
    fn test_force_is_consumed_by_integration() {
        let mut body = kite();
        body.apply_force(Vec3::new(1.0, 0.0, 0.0));
        body.apply_force(Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(body.pending_force(), Vec3::new(1.0, 0.0, 0.0));
        body.integrate(Vec3::ZERO, SIM_DT);
        assert_eq!(body.pending_force(), Vec3::ZERO);
        assert!(body.linear_velocity.x > 0.0);
    }

    #[test]
    fn test_damping_bleeds_velocity() {
        let mut body = kite();
        body.linear_velocity = Vec3::new(5.0, 0.0, 0.0);
        body.angular_velocity = Vec3::new(0.0, 3.0, 0.0);
        for _ in 0..60 {
            body.integrate(Vec3::ZERO, SIM_DT);
        }
        // One second: (1 - 0.3) and (1 - 0.8) of the speed remains
        assert!((body.linear_velocity.x - 3.5).abs() < 1e-3);
        assert!((body.angular_velocity.y - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_orientation_stays_unit_length() {
        let mut body = kite();
        body.angular_damping = 0.0;
        body.angular_velocity = Vec3::new(1.3, -2.1, 0.7);
        for _ in 0..10_000 {
            body.integrate(Vec3::ZERO, SIM_DT);
        }
        assert!((body.orientation.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_tail_hangs_below_kite() {
        let body = kite();
        let tail = body.tail_points(0.0, 15, 10.0, 2.0);
        assert_eq!(tail.len(), 15);
        assert!((tail[0] - Vec3::new(0.0, 8.0, 0.0)).length() < 1e-5);
        assert!(tail[14].y < tail[0].y - 9.0);
    }
}

//! Bounding-sphere collision queries
//!
//! Obstacles are reported by the scenery as spheres. The kite is tested as a
//! sphere too; the string is tested segment by segment along its sampled
//! curve.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Obstacle or pickup bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) < self.radius
    }
}

/// Closest point on segment `start..end` to `point`
pub fn closest_point_on_segment(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let line = end - start;
    let length_sq = line.length_squared();
    if length_sq <= f32::EPSILON {
        return start;
    }
    let t = ((point - start).dot(line) / length_sq).clamp(0.0, 1.0);
    start + line * t
}

/// Kite overlap: centers closer than the mean of kite size and obstacle diameter
pub fn kite_hits_sphere(kite_position: Vec3, kite_size: f32, sphere: &Sphere) -> bool {
    kite_position.distance(sphere.center) < (kite_size + sphere.radius * 2.0) * 0.5
}

/// Whether segment `start..end` passes through the sphere
pub fn segment_intersects_sphere(start: Vec3, end: Vec3, sphere: &Sphere) -> bool {
    sphere.contains(closest_point_on_segment(start, end, sphere.center))
}

/// Index of the first string segment touching any sphere
pub fn string_hit(samples: &[Vec3], spheres: &[Sphere]) -> Option<usize> {
    samples.windows(2).position(|pair| {
        spheres
            .iter()
            .any(|sphere| segment_intersects_sphere(pair[0], pair[1], sphere))
    })
}

/// Whether any string segment touches any sphere
pub fn string_intersects_any(samples: &[Vec3], spheres: &[Sphere]) -> bool {
    string_hit(samples, spheres).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kite_hit_uses_combined_size() {
        let obstacle = Sphere::new(Vec3::new(0.0, 0.0, 3.0), 2.0);
        // Threshold: (2 + 4) / 2 = 3
        assert!(kite_hits_sphere(Vec3::new(0.0, 0.0, 0.1), 2.0, &obstacle));
        assert!(!kite_hits_sphere(Vec3::ZERO, 2.0, &obstacle));
    }

    #[test]
    fn test_segment_through_sphere() {
        let sphere = Sphere::new(Vec3::new(5.0, 0.5, 0.0), 1.0);
        assert!(segment_intersects_sphere(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), &sphere));
        // Sphere beside the segment's far end
        assert!(!segment_intersects_sphere(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), &sphere));
    }

    #[test]
    fn test_segment_end_inside_sphere() {
        let sphere = Sphere::new(Vec3::new(10.5, 0.0, 0.0), 1.0);
        assert!(segment_intersects_sphere(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), &sphere));
    }

    #[test]
    fn test_degenerate_segment_is_a_point() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        assert!(segment_intersects_sphere(Vec3::X * 0.5, Vec3::X * 0.5, &sphere));
        assert!(!segment_intersects_sphere(Vec3::X * 2.0, Vec3::X * 2.0, &sphere));
    }

    #[test]
    fn test_string_hit_reports_first_segment() {
        let samples = [
            Vec3::ZERO,
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 15.0, 0.0),
        ];
        let spheres = [Sphere::new(Vec3::new(0.5, 12.0, 0.0), 1.0)];
        assert_eq!(string_hit(&samples, &spheres), Some(2));
        assert!(string_intersects_any(&samples, &spheres));
        assert!(!string_intersects_any(&samples, &[]));
        assert!(!string_intersects_any(&samples[..1], &spheres));
    }
}

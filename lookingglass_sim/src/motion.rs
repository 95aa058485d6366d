//! Seeded motion and camera driver.
//!
//! Stands in for the host's character and camera controllers: a random
//! walk on the ground plane, kept on a leash around the current anchor,
//! with the camera riding at eye height and looking along the heading.

use lookingglass_env::{BodyExtents, Pose};
use nalgebra::{UnitQuaternion, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Walk parameters.
#[derive(Debug, Clone, Copy)]
pub struct MotionParams {
    /// Walking speed in m/s
    pub speed: f64,

    /// Heading noise in rad/sqrt(s)
    pub turn_noise: f64,

    /// Max distance from the anchor before turning back (meters)
    pub leash: f64,

    /// Eye height as a fraction of body height
    pub eye_ratio: f64,

    /// Downward camera pitch in radians
    pub pitch: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            speed: 1.4,
            turn_noise: 0.8,
            leash: 6.0,
            eye_ratio: 0.9,
            pitch: 0.1,
        }
    }
}

/// Deterministic random-walk controller.
pub struct MotionDriver {
    rng: ChaCha8Rng,
    /// None when the configured noise is not a valid deviation
    turn: Option<Normal<f64>>,
    params: MotionParams,
    heading: f64,
}

impl MotionDriver {
    /// Creates a driver. Same seed, same walk.
    pub fn new(seed: u64, params: MotionParams) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            turn: Normal::new(0.0, params.turn_noise).ok(),
            params,
            heading: 0.0,
        }
    }

    /// Advances the walk by `dt` seconds from `current` and returns the new body pose.
    ///
    /// `center` is the anchor of the world the body is in; the walk bends
    /// back towards it once outside the leash.
    pub fn step(&mut self, dt: f64, current: &Pose, center: &Vector3<f64>) -> Pose {
        let jitter = self.turn.map_or(0.0, |n| n.sample(&mut self.rng));
        self.heading += jitter * dt.sqrt();

        let offset = current.position - center;
        let planar = Vector3::new(offset.x, 0.0, offset.z);
        if planar.norm() > self.params.leash {
            // Face back to the anchor
            self.heading = (-planar.z).atan2(-planar.x);
        }

        let forward = Vector3::new(self.heading.cos(), 0.0, self.heading.sin());
        let position = current.position + forward * (self.params.speed * dt);

        Pose::new(position, self.yaw())
    }

    /// Camera pose for a body standing at `body`.
    pub fn eye_pose(&self, body: &Pose, extents: &BodyExtents) -> Pose {
        let eye = body.position + extents.up_axis().as_ref() * (extents.height * self.params.eye_ratio);
        let pitch = UnitQuaternion::from_euler_angles(0.0, 0.0, -self.params.pitch);
        Pose::new(eye, body.orientation * pitch)
    }

    fn yaw(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -self.heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_seed_same_walk() {
        let mut d1 = MotionDriver::new(7, MotionParams::default());
        let mut d2 = MotionDriver::new(7, MotionParams::default());
        let (mut p1, mut p2) = (Pose::identity(), Pose::identity());

        for _ in 0..500 {
            p1 = d1.step(1.0 / 60.0, &p1, &Vector3::zeros());
            p2 = d2.step(1.0 / 60.0, &p2, &Vector3::zeros());
        }
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_walk_stays_on_ground() {
        let mut driver = MotionDriver::new(3, MotionParams::default());
        let mut pose = Pose::identity();
        for _ in 0..1000 {
            pose = driver.step(1.0 / 30.0, &pose, &Vector3::zeros());
            assert_eq!(pose.position.y, 0.0);
        }
    }

    #[test]
    fn test_leash_pulls_back() {
        let params = MotionParams {
            turn_noise: 0.0,
            leash: 5.0,
            ..Default::default()
        };
        let mut driver = MotionDriver::new(1, params);
        let center = Vector3::new(10.0, 0.0, 0.0);
        let start = Pose::at(Vector3::new(20.0, 0.0, 0.0));

        let next = driver.step(1.0, &start, &center);

        assert!((next.position - center).norm() < (start.position - center).norm());
    }

    #[test]
    fn test_eye_pose_above_body() {
        let driver = MotionDriver::new(1, MotionParams::default());
        let body = Pose::at(Vector3::new(1.0, 0.0, 2.0));
        let eye = driver.eye_pose(&body, &BodyExtents::new(2.0, 0.5));

        assert_relative_eq!(eye.position, Vector3::new(1.0, 1.8, 2.0), epsilon = 1.0e-12);
    }
}

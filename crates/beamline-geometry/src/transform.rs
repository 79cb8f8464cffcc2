//! Rigid transformations between an element's local frame and the global
//! beamline frame.
//!
//! The local frame has its origin at the element centre with `z` along the
//! nominal beam axis. A transform maps local coordinates to global ones as
//! $\mathbf{r}_g = R\,\mathbf{r}_l + \mathbf{t}$; directions only see the
//! rotation. Because $R$ is orthonormal, both conversions preserve vector
//! magnitudes.

use nalgebra::{Rotation3, Vector3};

/// A rigid transformation: orthonormal rotation + translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    /// Rotation taking local axes onto global axes.
    pub rotation: Rotation3<f64>,
    /// Global position of the local origin (m).
    pub translation: Vector3<f64>,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }
}

impl CoordinateTransform {
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create a pure translation.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::new(dx, dy, dz),
        }
    }

    /// Create a pure rotation from roll, pitch and yaw angles (rad).
    pub fn from_euler_angles(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            rotation: Rotation3::from_euler_angles(roll, pitch, yaw),
            translation: Vector3::zeros(),
        }
    }

    /// Map a point from the local frame into the global frame.
    pub fn local_to_global_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let v = self.rotation * Vector3::from(*point) + self.translation;
        [v.x, v.y, v.z]
    }

    /// Map a point from the global frame into the local frame.
    pub fn global_to_local_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let v = self.rotation.inverse() * (Vector3::from(*point) - self.translation);
        [v.x, v.y, v.z]
    }

    /// Rotate a direction (or any free vector) from local to global axes.
    pub fn local_to_global_direction(&self, direction: &[f64; 3]) -> [f64; 3] {
        let v = self.rotation * Vector3::from(*direction);
        [v.x, v.y, v.z]
    }

    /// Rotate a direction (or any free vector) from global to local axes.
    pub fn global_to_local_direction(&self, direction: &[f64; 3]) -> [f64; 3] {
        let v = self.rotation.inverse() * Vector3::from(*direction);
        [v.x, v.y, v.z]
    }

    /// Convert a position/direction pair into the local frame.
    pub fn global_to_local(&self, position: &[f64; 3], direction: &[f64; 3]) -> ([f64; 3], [f64; 3]) {
        (
            self.global_to_local_point(position),
            self.global_to_local_direction(direction),
        )
    }

    /// Convert a position/direction pair into the global frame.
    pub fn local_to_global(&self, position: &[f64; 3], direction: &[f64; 3]) -> ([f64; 3], [f64; 3]) {
        (
            self.local_to_global_point(position),
            self.local_to_global_direction(direction),
        )
    }

    /// Compose two transforms: self followed by other.
    ///
    /// If `self` maps frame A into frame B and `other` maps B into C, the
    /// result maps A into C.
    pub fn then(&self, other: &CoordinateTransform) -> CoordinateTransform {
        CoordinateTransform {
            rotation: other.rotation * self.rotation,
            translation: other.rotation * self.translation + other.translation,
        }
    }

    /// The transform mapping global coordinates back into this local frame.
    pub fn inverse(&self) -> CoordinateTransform {
        let rotation = self.rotation.inverse();
        CoordinateTransform {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Unit vector of the local `z` axis expressed in global coordinates.
    pub fn beam_axis(&self) -> [f64; 3] {
        self.local_to_global_direction(&[0.0, 0.0, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn norm(v: &[f64; 3]) -> f64 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_identity_transform() {
        let t = CoordinateTransform::default();
        let p = [1.0, 2.0, 3.0];
        let result = t.local_to_global_point(&p);
        assert!((result[0] - 1.0).abs() < 1e-12);
        assert!((result[1] - 2.0).abs() < 1e-12);
        assert!((result[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_and_translate() {
        // Quarter turn about y: local z points along global x.
        let t = CoordinateTransform::from_euler_angles(0.0, FRAC_PI_2, 0.0)
            .then(&CoordinateTransform::translation(1.0, 0.0, 0.0));
        let result = t.local_to_global_point(&[0.0, 0.0, 2.0]);
        assert!((result[0] - 3.0).abs() < 1e-12);
        assert!(result[1].abs() < 1e-12);
        assert!(result[2].abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_preserves_coordinates() {
        let t = CoordinateTransform::new(
            Rotation3::from_euler_angles(0.3, -1.1, 2.4),
            Vector3::new(4.0, -2.5, 17.0),
        );
        let position = [0.013, -0.002, 0.45];
        let direction = [0.01, -0.03, (1.0f64 - 0.01 * 0.01 - 0.03 * 0.03).sqrt()];

        let (gp, gd) = t.local_to_global(&position, &direction);
        let (lp, ld) = t.global_to_local(&gp, &gd);
        for i in 0..3 {
            assert!((lp[i] - position[i]).abs() < 1e-12);
            assert!((ld[i] - direction[i]).abs() < 1e-12);
        }
        assert!((norm(&gd) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let t = CoordinateTransform::new(
            Rotation3::from_euler_angles(0.0, 0.2, 0.7),
            Vector3::new(1.0, 2.0, 3.0),
        );
        let p = [0.5, -0.25, 8.0];
        let back = t.inverse().local_to_global_point(&t.local_to_global_point(&p));
        for i in 0..3 {
            assert!((back[i] - p[i]).abs() < 1e-12);
        }
    }
}

//! Homogeneous rigid transforms with a roll-pitch-yaw minimal representation.
//!
//! The builder composes and inverts these transforms many times while
//! flattening the assembly, so equality is defined with an absolute tolerance
//! rather than bitwise, and the inverse exploits the rigid structure
//! (`R⁻¹ = Rᵗ`, `t⁻¹ = -Rᵗ·t`) instead of a general matrix inversion.

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};
use std::ops::Mul;

/// Absolute tolerance used for transform comparisons and for the
/// gimbal-lock branch of the RPY extraction.
pub const TOLERANCE: f64 = 1e-6;

/// A 4×4 homogeneous rigid transform: orthonormal 3×3 rotation block plus
/// translation. The rotation block is assumed orthonormal with determinant +1;
/// constructors only accept representations that guarantee it.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Transform {
            matrix: Matrix4::identity(),
        }
    }

    /// Builds the transform from a translation and fixed-axis roll-pitch-yaw
    /// angles. The rotation composes as `Rz(yaw)·Ry(pitch)·Rx(roll)`, the SDF
    /// convention; `rotation_rpy` round-trips through the same ordering.
    pub fn from_translation_rpy(translation: Vector3<f64>, rpy: [f64; 3]) -> Self {
        let [roll, pitch, yaw] = rpy;
        // nalgebra's Euler constructor is exactly Rz(yaw)·Ry(pitch)·Rx(roll)
        let rotation = Rotation3::from_euler_angles(roll, pitch, yaw);
        Self::from_parts(translation, *rotation.matrix())
    }

    /// Assembles the transform from an explicit rotation block and translation.
    /// The caller is responsible for the rotation block being orthonormal.
    pub fn from_parts(translation: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Transform { matrix }
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into()
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into()
    }

    /// Rigid inverse: transposed rotation block, `-Rᵗ·t` translation.
    /// Agrees with the general 4×4 inverse to within [`TOLERANCE`].
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation().transpose();
        let translation = -rotation * self.translation();
        Self::from_parts(translation, rotation)
    }

    /// Extracts `(roll, pitch, yaw)` such that
    /// `from_translation_rpy(t, rpy)` rebuilds the same rotation.
    ///
    /// Near pitch = ±90° the representation degenerates: infinitely many
    /// `(roll, yaw)` pairs produce the same rotation. For determinism this
    /// implementation then fixes `yaw = 0` and folds the remaining rotation
    /// into roll, with the roll sign convention depending on the pitch sign.
    pub fn rotation_rpy(&self) -> [f64; 3] {
        let r = self.rotation();
        let cos_pitch = (r[(0, 0)].powi(2) + r[(1, 0)].powi(2)).sqrt();
        if cos_pitch < TOLERANCE {
            let pitch = (-r[(2, 0)]).asin();
            let roll = if pitch > 0.0 {
                r[(0, 1)].atan2(r[(1, 1)])
            } else {
                (-r[(0, 1)]).atan2(r[(1, 1)])
            };
            [roll, pitch, 0.0]
        } else {
            let roll = r[(2, 1)].atan2(r[(2, 2)]);
            let pitch = (-r[(2, 0)]).atan2(cos_pitch);
            let yaw = r[(1, 0)].atan2(r[(0, 0)]);
            [roll, pitch, yaw]
        }
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

impl PartialEq for Transform {
    /// Componentwise comparison with absolute tolerance [`TOLERANCE`]. Exact
    /// float equality would fail after the compose/invert round trips the
    /// tree builder performs.
    fn eq(&self, other: &Self) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() < TOLERANCE)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_rpy_close(actual: [f64; 3], expected: [f64; 3]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!(
                (a - e).abs() < TOLERANCE,
                "rpy mismatch: {actual:?} vs {expected:?}"
            );
        }
    }

    #[test]
    fn test_translation_round_trip() {
        for t in [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, -1.0],
            [1.0, 1.0, 1.0],
            [1.0, 2.0, 3.0],
        ] {
            let transform =
                Transform::from_translation_rpy(Vector3::from(t), [0.3, -0.2, 0.1]);
            let back = transform.translation();
            assert_rpy_close([back.x, back.y, back.z], t);
        }
    }

    #[test]
    fn test_rotation_round_trip() {
        let rotations = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, -1.0, 0.0],
            [0.0, 1.0, -1.0],
            [-1.0, -1.0, -1.0],
            [0.1, 0.2, 0.3],
            [-0.1, -0.2, -0.3],
            [PI / 2.0, 0.0, 0.0],
            [PI / 2.0, 0.0, PI / 2.0],
        ];
        for rpy in rotations {
            let transform = Transform::from_translation_rpy(Vector3::zeros(), rpy);
            assert_rpy_close(transform.rotation_rpy(), rpy);
        }
    }

    #[test]
    fn test_gimbal_lock_preserves_rotation() {
        // At pitch = ±90° the individual angles are not unique, but the
        // extracted triple must rebuild the same rotation matrix.
        for rpy in [
            [1.0, PI / 2.0, 0.0],
            [-1.0, PI / 2.0, 0.0],
            [1.0, -PI / 2.0, 0.0],
            [-1.0, -PI / 2.0, 0.0],
            [0.4, PI / 2.0, -0.7],
        ] {
            let transform = Transform::from_translation_rpy(Vector3::zeros(), rpy);
            let extracted = transform.rotation_rpy();
            assert_eq!(extracted[2], 0.0, "gimbal branch must fix yaw at zero");
            let rebuilt = Transform::from_translation_rpy(Vector3::zeros(), extracted);
            assert_eq!(transform, rebuilt);
        }
    }

    #[test]
    fn test_multiplication_with_inverse() {
        let cases = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
            ([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]),
            ([-1.0, -1.0, -1.0], [0.0, 0.0, 0.0]),
            ([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            ([1.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            ([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]),
            ([-1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]),
            ([1.0, 2.0, 3.0], [1.0, 2.0, 3.0]),
            ([1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]),
            ([1.0, 2.0, 3.0], [0.1, 0.2, 0.3]),
        ];
        for (t, rpy) in cases {
            let transform = Transform::from_translation_rpy(Vector3::from(t), rpy);
            let inverse = transform.inverse();
            assert_eq!(transform * inverse, Transform::identity());
            assert_eq!(inverse * transform, Transform::identity());
        }
    }

    #[test]
    fn test_chain_translations() {
        let a = Transform::from_translation_rpy(Vector3::new(1.0, 2.0, 3.0), [0.0; 3]);
        let b = Transform::from_translation_rpy(Vector3::new(3.0, 4.0, 5.0), [0.0; 3]);
        let expected = Transform::from_translation_rpy(Vector3::new(4.0, 6.0, 8.0), [0.0; 3]);
        assert_eq!(a * b, expected);
    }

    #[test]
    fn test_chain_rotations() {
        let a = Transform::from_translation_rpy(Vector3::zeros(), [0.1, 0.2, 0.3]);
        let b = Transform::from_translation_rpy(Vector3::zeros(), [0.4, 0.5, 0.6]);
        let expected = Transform::from_translation_rpy(
            Vector3::zeros(),
            [0.635604289, 0.59793189, 1.013460700],
        );
        assert_eq!(a * b, expected);
    }

    #[test]
    fn test_composition_associativity() {
        let a = Transform::from_translation_rpy(Vector3::new(1.0, 0.0, -2.0), [0.1, 0.2, 0.3]);
        let b = Transform::from_translation_rpy(Vector3::new(0.0, 3.0, 0.5), [-0.4, 0.0, 1.1]);
        let c = Transform::from_translation_rpy(Vector3::new(-1.0, -1.0, 4.0), [0.0, 0.9, -0.2]);
        assert_eq!((a * b) * c, a * (b * c));
    }

    #[test]
    fn test_from_parts_keeps_rotation_block() {
        let rpy = [0.2, -0.3, 0.4];
        let reference = Transform::from_translation_rpy(Vector3::new(1.0, 2.0, 3.0), rpy);
        let rebuilt = Transform::from_parts(reference.translation(), reference.rotation());
        assert_eq!(reference, rebuilt);
    }
}

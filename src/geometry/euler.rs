//! Angle normalization and yaw-pitch-roll extraction.
//!
//! Rotations are decomposed with the Z-Y-X (yaw, pitch, roll) convention:
//!
//! ```text
//! R = Rz(yaw) · Ry(pitch) · Rx(roll)
//! ```
//!
//! The decomposition is singular when pitch approaches ±π/2 (gimbal lock).
//! Near that point yaw and roll are no longer independent and the returned
//! values are numerically unstable; callers only use them for display.

use std::f64::consts::PI;

use nalgebra::Matrix3;

const TWO_PI: f64 = 2.0 * PI;

/// Yaw, pitch and roll in radians, each in [-π, π].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawPitchRoll {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Maps `t` into [-π, π] by periodic reduction.
///
/// Negative inputs are reduced with the negative period so the result does
/// not jump when `t` crosses zero. Values already in range are returned as
/// is, which keeps the endpoints ±π fixed.
#[inline]
pub fn normalize_angle(t: f64) -> f64 {
    if (-PI..=PI).contains(&t) {
        t
    } else if t >= 0.0 {
        (t + PI) % TWO_PI - PI
    } else {
        (t - PI) % -TWO_PI + PI
    }
}

/// Decomposes an orthonormal rotation matrix into yaw, pitch and roll.
pub fn rotation_to_euler(r: &Matrix3<f64>) -> YawPitchRoll {
    let yaw = normalize_angle(r[(1, 0)].atan2(r[(0, 0)]));
    let (s, c) = yaw.sin_cos();
    let pitch = normalize_angle((-r[(2, 0)]).atan2(r[(0, 0)] * c + r[(1, 0)] * s));
    let roll = normalize_angle(
        (r[(0, 2)] * s - r[(1, 2)] * c).atan2(-r[(0, 1)] * s + r[(1, 1)] * c),
    );
    YawPitchRoll { yaw, pitch, roll }
}

/// Camera-axis correction applied before Euler extraction.
///
/// Negates the camera Y axis (image rows grow downwards) so that the
/// decomposed angles follow a right-handed, Y-up convention.
///
/// ```text
/// F = | 1  0  0 |
///     | 0 -1  0 |
///     | 0  0  1 |
/// ```
#[inline]
pub fn flip_camera_y(rotation: &Matrix3<f64>) -> Matrix3<f64> {
    let f = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, -1.0, 0.0,
        0.0, 0.0, 1.0,
    );
    f * rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;
    use rand::Rng;

    #[test]
    fn test_normalize_angle_in_range_values_unchanged() {
        for &t in &[0.0, 0.5, -0.5, 3.0, -3.0, PI, -PI] {
            assert_relative_eq!(normalize_angle(t), t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_angle_wraps_positive_and_negative() {
        assert_relative_eq!(normalize_angle(TWO_PI + 0.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-TWO_PI - 0.25), -0.25, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_angle_continuous_across_zero() {
        let eps = 1e-9;
        let left = normalize_angle(-eps);
        let right = normalize_angle(eps);
        assert!((right - left).abs() < 1e-8);
    }

    #[test]
    fn test_normalize_angle_idempotent_and_bounded() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let x: f64 = rng.gen_range(-1.0e4..1.0e4);
            let once = normalize_angle(x);
            let twice = normalize_angle(once);
            assert!((-PI..=PI).contains(&once), "{} -> {}", x, once);
            assert_relative_eq!(once, twice, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotation_to_euler_identity_is_zero() {
        let ypr = rotation_to_euler(&Matrix3::identity());
        assert_relative_eq!(ypr.yaw, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ypr.pitch, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ypr.roll, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_to_euler_recovers_zyx_angles() {
        let (yaw, pitch, roll) = (0.3, -0.4, 1.1);
        // nalgebra's from_euler_angles(roll, pitch, yaw) builds Rz(yaw)·Ry(pitch)·Rx(roll).
        let r = Rotation3::from_euler_angles(roll, pitch, yaw).into_inner();
        let ypr = rotation_to_euler(&r);

        assert_relative_eq!(ypr.yaw, yaw, epsilon = 1e-10);
        assert_relative_eq!(ypr.pitch, pitch, epsilon = 1e-10);
        assert_relative_eq!(ypr.roll, roll, epsilon = 1e-10);
    }

    #[test]
    fn test_flip_camera_y_negates_second_row() {
        let r = Rotation3::from_euler_angles(0.1, 0.2, 0.3).into_inner();
        let flipped = flip_camera_y(&r);

        assert_relative_eq!(flipped.row(0).into_owned(), r.row(0).into_owned(), epsilon = 1e-12);
        assert_relative_eq!(flipped.row(1).into_owned(), -r.row(1), epsilon = 1e-12);
        assert_relative_eq!(flipped.row(2).into_owned(), r.row(2).into_owned(), epsilon = 1e-12);
    }
}

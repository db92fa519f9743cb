//! Human-readable description of a single tag detection.

use nalgebra::{Matrix3, Vector3};

use crate::detection::{RawDetection, TagId};

use super::euler::{YawPitchRoll, flip_camera_y, rotation_to_euler};

/// A detection's pose plus its orientation and display text.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribedDetection {
    pub id: TagId,
    pub translation: Vector3<f64>,
    pub rotation: Matrix3<f64>,
    /// Orientation after the camera Y-axis flip.
    pub euler: YawPitchRoll,
    pub text: String,
}

/// Format one detection as
/// `Id: <id>, distance=<m>m, x=<x>, y=<y>, z=<z>, yaw=<rad>, pitch=<rad>, roll=<rad>`.
pub fn describe_detection(detection: &RawDetection) -> DescribedDetection {
    let translation = detection.translation;
    let euler = rotation_to_euler(&flip_camera_y(&detection.rotation));

    let text = format!(
        "Id: {}, distance={:.4}m, x={:.4}, y={:.4}, z={:.4}, yaw={:.4}, pitch={:.4}, roll={:.4}",
        detection.id,
        translation.norm(),
        translation.x,
        translation.y,
        translation.z,
        euler.yaw,
        euler.pitch,
        euler.roll
    );

    DescribedDetection {
        id: detection.id,
        translation,
        rotation: detection.rotation,
        euler,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_describe_identity_rotation_text() {
        let det = RawDetection::from_pose(
            TagId(4),
            Vector3::new(0.0, 0.3, 0.4),
            Matrix3::identity(),
        );
        let described = describe_detection(&det);

        assert!(described.text.starts_with(
            "Id: 4, distance=0.5000m, x=0.0000, y=0.3000, z=0.4000, yaw="
        ));
        assert!(described.text.contains(", pitch="));
        assert!(described.text.ends_with(", roll=3.1416"));
    }

    #[test]
    fn test_describe_applies_y_flip_before_euler() {
        // Identity in camera convention becomes a half turn about X once Y is flipped.
        let det = RawDetection::from_pose(TagId(1), Vector3::new(0.0, 0.0, 1.0), Matrix3::identity());
        let described = describe_detection(&det);

        assert_relative_eq!(described.euler.yaw, 0.0, epsilon = 1e-12);
        assert_relative_eq!(described.euler.pitch, 0.0, epsilon = 1e-12);
        assert_relative_eq!(described.euler.roll.abs(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_describe_keeps_pose_untouched() {
        let t = Vector3::new(0.1, -0.2, 0.9);
        let det = RawDetection::from_pose(TagId(9), t, Matrix3::identity());
        let described = describe_detection(&det);

        assert_eq!(described.id, TagId(9));
        assert_relative_eq!(described.translation, t, epsilon = 1e-12);
        assert_relative_eq!(described.rotation, Matrix3::identity(), epsilon = 1e-12);
    }
}

//! Marker detection boundary.
//!
//! The tracking engine only sees [`RawDetection`]s: an identifier plus the
//! tag pose in camera coordinates. Image decoding and pose solving live
//! behind the [`MarkerDetector`] trait so the engine can be driven by a
//! live camera, a replayed log, or test fixtures alike.

pub mod apriltag;
pub mod camera_model;

use anyhow::Result;
use nalgebra::{Matrix3, Point2, Vector2, Vector3};
use opencv::core::Mat;
use serde::{Deserialize, Serialize};

pub use apriltag::AprilTagDetector;
pub use camera_model::CameraModel;

/// Identifier decoded from a fiducial tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i32);

impl TagId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single tag observation from one frame.
///
/// `translation` and `rotation` describe the tag in the camera frame
/// (OpenCV convention: X right, Y down, Z forward, metres).
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub id: TagId,
    pub translation: Vector3<f64>,
    pub rotation: Matrix3<f64>,
    /// Image corners in pixels, clockwise from top-left. Only used for overlays.
    pub corners: [Point2<f64>; 4],
}

impl RawDetection {
    /// Detection with a known pose and no image footprint.
    pub fn from_pose(id: TagId, translation: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        Self {
            id,
            translation,
            rotation,
            corners: [Point2::origin(); 4],
        }
    }

    /// Mean of the four image corners.
    pub fn center(&self) -> Point2<f64> {
        let sum = self
            .corners
            .iter()
            .fold(Vector2::zeros(), |acc: Vector2<f64>, c| acc + c.coords);
        Point2::from(sum / 4.0)
    }
}

/// Extracts tag detections from a single grayscale image.
pub trait MarkerDetector {
    fn extract_markers(&mut self, gray: &Mat) -> Result<Vec<RawDetection>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tag_id_display_is_bare_integer() {
        assert_eq!(format!("{}", TagId::new(7)), "7");
        assert_eq!(format!("{}", TagId::new(-3)), "-3");
    }

    #[test]
    fn test_tag_id_ordering() {
        let mut ids = vec![TagId(5), TagId(2), TagId(11)];
        ids.sort();
        assert_eq!(ids, vec![TagId(2), TagId(5), TagId(11)]);
    }

    #[test]
    fn test_center_is_corner_mean() {
        let mut det = RawDetection::from_pose(TagId(1), Vector3::zeros(), Matrix3::identity());
        det.corners = [
            Point2::new(10.0, 10.0),
            Point2::new(30.0, 10.0),
            Point2::new(30.0, 20.0),
            Point2::new(10.0, 20.0),
        ];
        let c = det.center();
        assert_relative_eq!(c.x, 20.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 15.0, epsilon = 1e-12);
    }
}

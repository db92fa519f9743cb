//! AprilTag 36h11 detection and per-tag pose solving using OpenCV.
//!
//! Tags are found with OpenCV's ArUco detector configured for the AprilTag
//! 36h11 dictionary. Each tag's pose is then solved from its four corners
//! with the square-planar IPPE solver, given the physical tag side length
//! and the camera intrinsics.

use anyhow::{Context, Result};
use nalgebra::{Matrix3, Point2, Vector3};
use opencv::calib3d;
use opencv::core::{Mat, Point2f, Point3f, Vector};
use opencv::objdetect::{
    self, ArucoDetector, DetectorParameters, PredefinedDictionaryType, RefineParameters,
};
use opencv::prelude::*;
use tracing::debug;

use super::{CameraModel, MarkerDetector, RawDetection, TagId};

/// Detects AprilTag 36h11 markers and solves their pose in camera coordinates.
pub struct AprilTagDetector {
    detector: ArucoDetector,
    /// Tag corners in the tag frame, ordered to match the detector output.
    object_points: Vector<Point3f>,
    camera_matrix: Mat,
    dist_coeffs: Mat,
}

impl AprilTagDetector {
    /// `tag_size` is the side length of the black tag border in metres.
    pub fn new(camera: CameraModel, tag_size: f64) -> Result<Self> {
        let dictionary =
            objdetect::get_predefined_dictionary(PredefinedDictionaryType::DICT_APRILTAG_36h11)
                .context("Failed to load AprilTag 36h11 dictionary")?;
        let params = DetectorParameters::default()?;
        let refine = RefineParameters::new(10.0, 3.0, true)?;
        let detector = ArucoDetector::new(&dictionary, &params, refine)?;

        // IPPE_SQUARE expects this exact corner layout (top-left, top-right,
        // bottom-right, bottom-left) in the tag plane z = 0.
        let half = (tag_size / 2.0) as f32;
        let object_points = Vector::from_slice(&[
            Point3f::new(-half, half, 0.0),
            Point3f::new(half, half, 0.0),
            Point3f::new(half, -half, 0.0),
            Point3f::new(-half, -half, 0.0),
        ]);

        Ok(Self {
            detector,
            object_points,
            camera_matrix: camera.camera_matrix()?,
            dist_coeffs: camera.dist_coeffs()?,
        })
    }

    /// Solve the tag pose (camera <- tag) from its four image corners.
    fn relative_pose(&self, corners: &Vector<Point2f>) -> Result<(Vector3<f64>, Matrix3<f64>)> {
        let mut rvec = Mat::default();
        let mut tvec = Mat::default();
        calib3d::solve_pnp(
            &self.object_points,
            corners,
            &self.camera_matrix,
            &self.dist_coeffs,
            &mut rvec,
            &mut tvec,
            false,
            calib3d::SOLVEPNP_IPPE_SQUARE,
        )?;

        let mut rot_mat = Mat::default();
        calib3d::rodrigues(&rvec, &mut rot_mat, &mut opencv::core::no_array())?;
        let rotation = mat3_to_matrix3(&rot_mat)?;
        let translation = Vector3::new(
            *tvec.at::<f64>(0i32)?,
            *tvec.at::<f64>(1i32)?,
            *tvec.at::<f64>(2i32)?,
        );
        Ok((translation, rotation))
    }
}

impl MarkerDetector for AprilTagDetector {
    fn extract_markers(&mut self, gray: &Mat) -> Result<Vec<RawDetection>> {
        let mut corners = Vector::<Vector<Point2f>>::new();
        let mut ids = Vector::<i32>::new();
        let mut rejected = Vector::<Vector<Point2f>>::new();
        self.detector
            .detect_markers(gray, &mut corners, &mut ids, &mut rejected)?;

        let mut detections = Vec::with_capacity(ids.len());
        for (id, quad) in ids.iter().zip(corners.iter()) {
            if quad.len() != 4 {
                continue;
            }
            let (translation, rotation) = match self.relative_pose(&quad) {
                Ok(pose) => pose,
                Err(e) => {
                    debug!("Pose solve failed for tag {}: {}", id, e);
                    continue;
                }
            };

            let mut image_corners = [Point2::origin(); 4];
            for (dst, src) in image_corners.iter_mut().zip(quad.iter()) {
                *dst = Point2::new(src.x as f64, src.y as f64);
            }

            detections.push(RawDetection {
                id: TagId::new(id),
                translation,
                rotation,
                corners: image_corners,
            });
        }

        Ok(detections)
    }
}

/// Convert OpenCV 3x3 Mat to nalgebra Matrix3.
fn mat3_to_matrix3(mat: &Mat) -> Result<Matrix3<f64>> {
    let mut arr = [0.0f64; 9];
    for (i, v) in arr.iter_mut().enumerate() {
        *v = *mat.at::<f64>(i as i32)?;
    }
    Ok(Matrix3::from_row_slice(&arr))
}

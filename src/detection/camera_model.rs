//! Pinhole camera intrinsics used for tag pose solving.

use anyhow::{Result, bail};
use opencv::core::Mat;
use opencv::prelude::*;

/// Pinhole intrinsics in pixels. Lens distortion is assumed to be zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    pub fx: f64,
    pub fy: f64,
    /// Principal point x.
    pub px: f64,
    /// Principal point y.
    pub py: f64,
}

impl CameraModel {
    pub fn new(fx: f64, fy: f64, px: f64, py: f64) -> Result<Self> {
        let cam = Self { fx, fy, px, py };
        if !cam.is_valid() {
            bail!(
                "Invalid camera intrinsics fx={}, fy={}, px={}, py={}",
                fx,
                fy,
                px,
                py
            );
        }
        Ok(cam)
    }

    /// Focal lengths finite and strictly positive, principal point finite.
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.px.is_finite()
            && self.py.is_finite()
            && self.fx > 0.0
            && self.fy > 0.0
    }

    /// 3x3 camera matrix K as an OpenCV `Mat` (CV_64F).
    pub fn camera_matrix(&self) -> Result<Mat> {
        let k = Mat::from_slice_2d(&[
            [self.fx, 0.0, self.px],
            [0.0, self.fy, self.py],
            [0.0, 0.0, 1.0],
        ])?
        .try_clone()?;
        Ok(k)
    }

    /// Zero distortion coefficients (k1, k2, p1, p2, k3).
    pub fn dist_coeffs(&self) -> Result<Mat> {
        Ok(Mat::zeros(1, 5, opencv::core::CV_64F)?.to_mat()?)
    }
}

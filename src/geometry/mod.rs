//! Geometry utilities: angle normalization, Euler decomposition, detection text.

pub mod describe;
pub mod euler;

pub use describe::{DescribedDetection, describe_detection};
pub use euler::{YawPitchRoll, flip_camera_y, normalize_angle, rotation_to_euler};

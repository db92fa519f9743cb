//! Runtime configuration loaded from YAML.
//!
//! Every key is optional; anything missing falls back to the defaults below,
//! which match an Intel RealSense D435 colour stream at 848x480 / 30 fps
//! watching 7 cm AprilTags.
//!
//! ```yaml
//! camera:
//!   width: 848
//!   height: 480
//!   tag_size_m: 0.07
//! tracker:
//!   smoothing_frames: 20
//!   display_interval: 10
//!   reference_tag_id: 2
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::detection::{CameraModel, TagId};
use crate::io::camera::StreamConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub tracker: TrackerConfig,
    pub viz: VizConfig,
    /// CSV detection log to replay instead of opening the camera.
    pub replay: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device_index: i32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Frames dropped after start so auto-exposure can settle.
    pub warmup_frames: u32,
    /// Bounded wait per frame. `None` blocks indefinitely.
    pub frame_timeout_ms: Option<u64>,
    /// Side length of the tag border in metres.
    pub tag_size_m: f64,
    pub fx: f64,
    pub fy: f64,
    /// Principal point; defaults to the image centre.
    pub px: Option<f64>,
    pub py: Option<f64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 848,
            height: 480,
            fps: 30,
            warmup_frames: 30,
            frame_timeout_ms: None,
            tag_size_m: 0.07,
            fx: 600.0,
            fy: 600.0,
            px: None,
            py: None,
        }
    }
}

impl CameraConfig {
    pub fn camera_model(&self) -> Result<CameraModel> {
        let px = self.px.unwrap_or(f64::from(self.width / 2));
        let py = self.py.unwrap_or(f64::from(self.height / 2));
        CameraModel::new(self.fx, self.fy, px, py)
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            device_index: self.device_index,
            width: self.width,
            height: self.height,
            fps: self.fps,
            warmup_frames: self.warmup_frames,
        }
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a tag may go undetected before it is dropped.
    pub smoothing_frames: u32,
    /// Emit the relative-position report once every this many frames.
    pub display_interval: u32,
    /// Tag whose position is the origin of the report.
    pub reference_tag_id: TagId,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            smoothing_frames: 20,
            display_interval: 10,
            reference_tag_id: TagId(2),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Show the annotated camera image in an OpenCV window.
    pub window: bool,
    /// Stream images and relative positions to a Rerun viewer.
    pub rerun: bool,
    /// Clear the terminal before each printed report.
    pub clear_terminal: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            window: true,
            rerun: false,
            clear_terminal: true,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracker.display_interval == 0 {
            bail!("tracker.display_interval must be at least 1");
        }
        if i32::try_from(self.tracker.smoothing_frames).is_err() {
            bail!(
                "tracker.smoothing_frames too large: {}",
                self.tracker.smoothing_frames
            );
        }
        if !(self.camera.tag_size_m.is_finite() && self.camera.tag_size_m > 0.0) {
            bail!("camera.tag_size_m must be positive, got {}", self.camera.tag_size_m);
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            bail!(
                "camera resolution must be non-zero, got {}x{}",
                self.camera.width,
                self.camera.height
            );
        }
        if self.camera.frame_timeout_ms == Some(0) {
            bail!("camera.frame_timeout_ms must be positive when set");
        }
        self.camera
            .camera_model()
            .context("Invalid camera intrinsics")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_realsense_setup() {
        let config = AppConfig::default();
        assert_eq!(config.camera.width, 848);
        assert_eq!(config.camera.height, 480);
        assert_eq!(config.camera.fps, 30);
        assert_eq!(config.camera.tag_size_m, 0.07);
        assert_eq!(config.tracker.smoothing_frames, 20);
        assert_eq!(config.tracker.display_interval, 10);
        assert_eq!(config.tracker.reference_tag_id, TagId(2));
        assert!(config.replay.is_none());

        let cam = config.camera.camera_model().unwrap();
        assert_eq!(cam.px, 424.0);
        assert_eq!(cam.py, 240.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_merges_over_defaults() {
        let config = AppConfig::from_yaml_str(
            "tracker:\n  reference_tag_id: 7\n  smoothing_frames: 5\ncamera:\n  px: 400.5\n",
        )
        .unwrap();
        assert_eq!(config.tracker.reference_tag_id, TagId(7));
        assert_eq!(config.tracker.smoothing_frames, 5);
        assert_eq!(config.tracker.display_interval, 10);
        assert_eq!(config.camera.camera_model().unwrap().px, 400.5);
        assert_eq!(config.camera.camera_model().unwrap().py, 240.0);
    }

    #[test]
    fn test_rejects_zero_display_interval() {
        let err = AppConfig::from_yaml_str("tracker:\n  display_interval: 0\n").unwrap_err();
        assert!(err.to_string().contains("display_interval"));
    }

    #[test]
    fn test_rejects_bad_tag_size_and_intrinsics() {
        assert!(AppConfig::from_yaml_str("camera:\n  tag_size_m: 0.0\n").is_err());
        assert!(AppConfig::from_yaml_str("camera:\n  fx: -600.0\n").is_err());
        assert!(AppConfig::from_yaml_str("camera:\n  frame_timeout_ms: 0\n").is_err());
    }

    #[test]
    fn test_replay_path_and_timeout() {
        let config = AppConfig::from_yaml_str(
            "replay: logs/run1.csv\ncamera:\n  frame_timeout_ms: 500\nviz:\n  window: false\n",
        )
        .unwrap();
        assert_eq!(config.replay, Some(PathBuf::from("logs/run1.csv")));
        assert_eq!(config.camera.frame_timeout(), Some(Duration::from_millis(500)));
        assert!(!config.viz.window);
        assert!(config.viz.clear_terminal);
    }
}

//! Frame acquisition.
//!
//! [`FrameSource`] is the boundary to the capture device. [`OpenCvCamera`]
//! implements it on top of OpenCV `videoio`, including the warm-up period
//! during which the first frames are discarded while auto-exposure settles.

use std::time::Instant;

use anyhow::{Context, Result};
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use tracing::{debug, info};

use crate::error::AcquisitionError;

/// Requested colour stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub device_index: i32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub warmup_frames: u32,
}

/// One colour (BGR8) image from the capture device.
#[derive(Debug)]
pub struct Frame {
    pub image: Mat,
    /// Nanoseconds since the stream was started.
    pub timestamp_ns: u64,
}

/// Source of frames. `wait_for_frame` may block.
pub trait FrameSource {
    fn start(&mut self, config: &StreamConfig) -> Result<()>;
    fn wait_for_frame(&mut self) -> Result<Frame>;
}

/// Colour camera opened through OpenCV `videoio`.
pub struct OpenCvCamera {
    capture: Option<VideoCapture>,
    started_at: Instant,
}

impl OpenCvCamera {
    pub fn new() -> Self {
        Self {
            capture: None,
            started_at: Instant::now(),
        }
    }

    fn read_frame(capture: &mut VideoCapture, started_at: Instant) -> Result<Frame> {
        let mut image = Mat::default();
        let ok = capture.read(&mut image)?;
        if !ok || image.empty() {
            return Err(AcquisitionError::EmptyFrame.into());
        }
        Ok(Frame {
            image,
            timestamp_ns: started_at.elapsed().as_nanos() as u64,
        })
    }
}

impl Default for OpenCvCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for OpenCvCamera {
    fn start(&mut self, config: &StreamConfig) -> Result<()> {
        let mut capture = VideoCapture::new(config.device_index, videoio::CAP_ANY)
            .with_context(|| format!("Failed to create capture for device {}", config.device_index))?;
        if !capture.is_opened()? {
            return Err(AcquisitionError::OpenFailed {
                device: config.device_index,
            }
            .into());
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.width))?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.height))?;
        capture.set(videoio::CAP_PROP_FPS, f64::from(config.fps))?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        if actual_width != config.width || actual_height != config.height {
            return Err(AcquisitionError::StreamRejected {
                width: config.width,
                height: config.height,
                fps: config.fps,
            }
            .into());
        }

        self.started_at = Instant::now();
        for _ in 0..config.warmup_frames {
            Self::read_frame(&mut capture, self.started_at).context("Camera warm-up failed")?;
        }
        debug!("Dropped {} warm-up frames", config.warmup_frames);
        info!(
            "Camera {} streaming {}x{}@{}",
            config.device_index, config.width, config.height, config.fps
        );

        self.capture = Some(capture);
        Ok(())
    }

    fn wait_for_frame(&mut self) -> Result<Frame> {
        let started_at = self.started_at;
        let capture = self.capture.as_mut().ok_or(AcquisitionError::NotStarted)?;
        Self::read_frame(capture, started_at)
    }
}

/// Convert a BGR frame to the single-channel image the detector expects.
pub fn to_grayscale(image: &Mat) -> Result<Mat> {
    if image.channels() == 1 {
        return Ok(image.try_clone()?);
    }
    let mut gray = Mat::default();
    imgproc::cvt_color_def(image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}

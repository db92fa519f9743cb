//! Rerun-based visualization of the tag report.
//!
//! Entity hierarchy:
//!     status               - Reference state, tag counts, FPS
//!     camera/
//!         image            - Colour camera image
//!     reference/
//!         origin           - Reference tag (always at the origin)
//!         tags             - Tags positioned relative to the reference (labelled by id)
//!     plots/
//!         tracked_tags     - Temporal plot of table size
//!         detections       - Temporal plot of per-frame detections

use anyhow::Result;
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use rerun::RecordingStream;
use tracing::warn;

use crate::tracking::{FrameResult, ReferenceState};

pub struct RerunVisualizer {
    rec: RecordingStream,
    last_fps: f64,
    frame_times: Vec<f64>,
    start_timestamp_ns: Option<u64>,
}

impl RerunVisualizer {
    pub fn new(app_name: &str) -> Result<Self> {
        // Runs rerun viewer in a separate process
        let rec = rerun::RecordingStreamBuilder::new(app_name).spawn()?;

        // Camera convention: X right, Y down, Z forward
        rec.log_static("reference", &rerun::ViewCoordinates::RDF())?;

        Ok(Self {
            rec,
            last_fps: 0.0,
            frame_times: Vec::new(),
            start_timestamp_ns: None,
        })
    }

    /// Set the current timestamp for all subsequent logs (relative to the first frame)
    pub fn set_time(&mut self, timestamp_ns: u64) {
        let start_ns = *self.start_timestamp_ns.get_or_insert(timestamp_ns);
        let relative_sec = timestamp_ns.saturating_sub(start_ns) as f64 / 1e9;
        self.rec.set_duration_secs("time", relative_sec);
    }

    /// Log the BGR camera image.
    pub fn log_image_feed(&self, image: &Mat) {
        match bgr_to_rgb_data(image) {
            Ok((data, width, height)) => {
                self.rec
                    .log("camera/image", &rerun::Image::from_rgb24(data, [width, height]))
                    .ok();
            }
            Err(e) => warn!("Failed to convert image for rerun: {}", e),
        }
    }

    /// Log the relative-position report and the status line for one frame.
    pub fn log_report(&mut self, result: &FrameResult, tracked: usize) {
        self.update_fps();

        let origin_color = match result.reference {
            ReferenceState::Live => [0u8, 200, 0],
            ReferenceState::Lost { .. } => [230, 160, 0],
            ReferenceState::Unseen => [120, 120, 120],
        };
        self.rec
            .log(
                "reference/origin",
                &rerun::Points3D::new([[0.0f32, 0.0, 0.0]])
                    .with_colors([origin_color])
                    .with_radii([0.03f32]),
            )
            .ok();

        let pts: Vec<[f32; 3]> = result
            .report
            .iter()
            .map(|p| [p.offset.x as f32, p.offset.y as f32, p.offset.z as f32])
            .collect();
        let labels: Vec<String> = result.report.iter().map(|p| p.id.to_string()).collect();
        self.rec
            .log(
                "reference/tags",
                &rerun::Points3D::new(pts)
                    .with_labels(labels)
                    .with_colors([[80u8, 160, 255]])
                    .with_radii([0.02f32]),
            )
            .ok();

        let state = match result.reference {
            ReferenceState::Live => "**LIVE**".to_string(),
            ReferenceState::Lost { stale_frames } => {
                format!("**STALE** ({} frames, holding last origin)", stale_frames)
            }
            ReferenceState::Unseen => "**NO REFERENCE**".to_string(),
        };
        let status_text = format!(
            "{} | Detections: {} | Tracked: {} | Reported: {} | FPS: {:.1}",
            state,
            result.detections.len(),
            tracked,
            result.report.len(),
            self.last_fps
        );
        self.rec
            .log(
                "status",
                &rerun::TextDocument::new(status_text)
                    .with_media_type(rerun::MediaType::markdown()),
            )
            .ok();

        self.rec
            .log("plots/tracked_tags", &rerun::Scalars::new([tracked as f64]))
            .ok();
        self.rec
            .log(
                "plots/detections",
                &rerun::Scalars::new([result.detections.len() as f64]),
            )
            .ok();
    }

    fn update_fps(&mut self) {
        let current_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.frame_times.push(current_time);
        if self.frame_times.len() > 100 {
            self.frame_times.remove(0);
        }

        self.last_fps = match (self.frame_times.first(), self.frame_times.last()) {
            (Some(first), Some(last)) if last > first => {
                (self.frame_times.len() - 1) as f64 / (last - first)
            }
            _ => 0.0,
        };
    }
}

/// Convert a BGR Mat to packed RGB bytes (bytes, width, height)
fn bgr_to_rgb_data(mat: &Mat) -> Result<(Vec<u8>, u32, u32), opencv::Error> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb, imgproc::COLOR_BGR2RGB)?;
    let rgb = if rgb.is_continuous() { rgb } else { rgb.try_clone()? };
    let data = rgb.data_bytes()?.to_vec();
    Ok((data, rgb.cols() as u32, rgb.rows() as u32))
}

//! On-screen presentation of the camera feed.

use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::highgui;
use opencv::imgproc;
use opencv::prelude::*;

use crate::detection::RawDetection;

const WINDOW_NAME: &str = "Display Image";
const ESC_KEY: i32 = 27;

/// Draws detections, shows frames and reports when the user asked to quit.
pub trait Presenter {
    fn draw_overlay(&mut self, image: &mut Mat, detection: &RawDetection) -> Result<()>;
    fn show(&mut self, image: &Mat) -> Result<()>;
    /// Polled once per frame, after `show`.
    fn poll_exit_key(&mut self) -> Result<bool>;
}

/// OpenCV highgui window; Esc exits.
pub struct HighGuiPresenter {
    wait_ms: i32,
}

impl HighGuiPresenter {
    pub fn new() -> Result<Self> {
        highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self { wait_ms: 10 })
    }
}

impl Presenter for HighGuiPresenter {
    fn draw_overlay(&mut self, image: &mut Mat, detection: &RawDetection) -> Result<()> {
        let outline = Scalar::new(0.0, 255.0, 0.0, 0.0);
        let accent = Scalar::new(0.0, 0.0, 255.0, 0.0);

        let pts: Vec<Point> = detection
            .corners
            .iter()
            .map(|c| Point::new(c.x.round() as i32, c.y.round() as i32))
            .collect();
        for i in 0..pts.len() {
            let color = if i == 0 { accent } else { outline };
            imgproc::line(image, pts[i], pts[(i + 1) % pts.len()], color, 2, imgproc::LINE_8, 0)?;
        }

        let center = detection.center();
        let center = Point::new(center.x.round() as i32, center.y.round() as i32);
        imgproc::circle(image, center, 4, accent, -1, imgproc::LINE_8, 0)?;
        imgproc::put_text(
            image,
            &detection.id.to_string(),
            Point::new(center.x + 6, center.y - 6),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            Scalar::new(255.0, 0.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )?;
        Ok(())
    }

    fn show(&mut self, image: &Mat) -> Result<()> {
        highgui::imshow(WINDOW_NAME, image)?;
        Ok(())
    }

    fn poll_exit_key(&mut self) -> Result<bool> {
        Ok(highgui::wait_key(self.wait_ms)? == ESC_KEY)
    }
}

impl Drop for HighGuiPresenter {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(WINDOW_NAME);
    }
}

/// Headless presenter: draws nothing and never asks to exit.
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn draw_overlay(&mut self, _image: &mut Mat, _detection: &RawDetection) -> Result<()> {
        Ok(())
    }

    fn show(&mut self, _image: &Mat) -> Result<()> {
        Ok(())
    }

    fn poll_exit_key(&mut self) -> Result<bool> {
        Ok(false)
    }
}

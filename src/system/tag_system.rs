//! Tag tracking system - processing loop and output.
//!
//! The `TagTrackingSystem` owns the frame source, detector and presenter and
//! drives the shared tracker one frame at a time. The stop flag and the
//! presenter's exit key are checked between frames only.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::detection::{MarkerDetector, RawDetection};
use crate::io::camera::{FrameSource, StreamConfig, to_grayscale};
use crate::io::replay::DetectionLog;
use crate::tracking::{FrameResult, REFERENCE_LOST_MESSAGE, ReferenceEvent};
use crate::viz::{Presenter, RerunVisualizer};

use super::shared_state::{SharedState, SharedTracker};

/// ANSI clear screen and cursor home.
const CLEAR_TERMINAL: &str = "\x1B[2J\x1B[H";

/// Live processing loop over a frame source.
pub struct TagTrackingSystem<S, D, P> {
    source: S,
    detector: D,
    presenter: P,
    tracker: SharedTracker,
    shared: Arc<SharedState>,
    visualizer: Option<RerunVisualizer>,
    printer: ReportPrinter,
}

impl<S, D, P> TagTrackingSystem<S, D, P>
where
    S: FrameSource,
    D: MarkerDetector,
    P: Presenter,
{
    pub fn new(
        config: &AppConfig,
        source: S,
        detector: D,
        presenter: P,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            source,
            detector,
            presenter,
            tracker: SharedTracker::new(&config.tracker),
            shared,
            visualizer: None,
            printer: ReportPrinter::new(config.viz.clear_terminal),
        }
    }

    pub fn with_visualizer(mut self, visualizer: RerunVisualizer) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    pub fn start(&mut self, stream: &StreamConfig) -> Result<()> {
        self.source.start(stream).context("Failed to start frame source")
    }

    /// Acquire, detect and track one frame.
    pub fn process_frame(&mut self) -> Result<FrameResult> {
        let t_start = Instant::now();

        let mut frame = self.source.wait_for_frame()?;
        let acquire_ms = t_start.elapsed().as_secs_f64() * 1000.0;

        let t_detect = Instant::now();
        let gray = to_grayscale(&frame.image)?;
        let detections = self.detector.extract_markers(&gray)?;
        for detection in &detections {
            self.presenter.draw_overlay(&mut frame.image, detection)?;
        }
        let detect_ms = t_detect.elapsed().as_secs_f64() * 1000.0;

        let mut result = self.tracker.process_detections(&detections);
        result.timing.acquire_ms = acquire_ms;
        result.timing.detect_ms = detect_ms;
        result.timing.total_ms = t_start.elapsed().as_secs_f64() * 1000.0;

        if let Some(viz) = self.visualizer.as_mut() {
            viz.set_time(frame.timestamp_ns);
            viz.log_image_feed(&frame.image);
            viz.log_report(&result, self.tracker.tracked_count());
        }
        self.presenter.show(&frame.image)?;

        debug!(
            "Frame {}: {} detections, {:.1} ms (acquire {:.1}, detect {:.1}, track {:.2})",
            result.frame_index,
            detections.len(),
            result.timing.total_ms,
            result.timing.acquire_ms,
            result.timing.detect_ms,
            result.timing.track_ms
        );
        Ok(result)
    }

    /// Run until the exit key or a stop request. Acquisition failures end the
    /// loop with an error. Returns the number of frames processed.
    pub fn run(&mut self) -> Result<u64> {
        let mut frames = 0u64;
        while !self.shared.is_stop_requested() {
            let result = self.process_frame()?;
            frames += 1;
            self.printer.observe(&mut io::stdout().lock(), &result)?;
            if self.presenter.poll_exit_key()? {
                info!("Exit key pressed");
                self.shared.request_stop();
            }
        }
        info!("Processed {} frames", frames);
        Ok(frames)
    }
}

/// Feed a recorded detection log through the tracker, printing reports at
/// the configured cadence. Returns the per-frame results.
pub fn run_replay<W: Write>(
    config: &AppConfig,
    log: &DetectionLog,
    out: &mut W,
    shared: &SharedState,
) -> Result<Vec<FrameResult>> {
    let tracker = SharedTracker::new(&config.tracker);
    let mut printer = ReportPrinter::new(config.viz.clear_terminal);
    let mut results = Vec::with_capacity(log.len());
    for detections in log.frames() {
        if shared.is_stop_requested() {
            break;
        }
        let result = replay_frame(&tracker, detections);
        printer.observe(out, &result)?;
        results.push(result);
    }
    info!("Replayed {} of {} frames", results.len(), log.len());
    Ok(results)
}

fn replay_frame(tracker: &SharedTracker, detections: &[RawDetection]) -> FrameResult {
    let t_start = Instant::now();
    let mut result = tracker.process_detections(detections);
    result.timing.total_ms = t_start.elapsed().as_secs_f64() * 1000.0;
    result
}

/// Terminal output of the relative-position report.
///
/// The loss notice is latched on the `Lost` edge and printed with the next
/// emitted report only, so one loss interval produces one notice even when
/// the edge falls on a frame the cadence skips.
#[derive(Debug, Clone, Default)]
pub struct ReportPrinter {
    clear_terminal: bool,
    loss_notice_pending: bool,
}

impl ReportPrinter {
    pub fn new(clear_terminal: bool) -> Self {
        Self {
            clear_terminal,
            loss_notice_pending: false,
        }
    }

    /// Feed every frame's result; writes only when the cadence emits.
    pub fn observe<W: Write>(&mut self, out: &mut W, result: &FrameResult) -> io::Result<()> {
        match result.reference_event {
            Some(ReferenceEvent::Lost) => self.loss_notice_pending = true,
            Some(ReferenceEvent::Reacquired) => self.loss_notice_pending = false,
            None => {}
        }
        if !result.emit {
            return Ok(());
        }

        if self.clear_terminal {
            write!(out, "{}", CLEAR_TERMINAL)?;
        }
        if std::mem::take(&mut self.loss_notice_pending) {
            writeln!(out, "{}", REFERENCE_LOST_MESSAGE)?;
        }
        for line in result.report_lines() {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }
}

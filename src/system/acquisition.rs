//! Bounded-wait frame acquisition.
//!
//! `BoundedFrameSource` moves a blocking [`FrameSource`] onto its own thread
//! and hands frames to the processing loop over a small bounded channel. The
//! loop waits at most `timeout` per frame; a missed deadline is an
//! [`AcquisitionError::Timeout`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use tracing::{debug, info};

use crate::error::AcquisitionError;
use crate::io::camera::{Frame, FrameSource, StreamConfig};

use super::shared_state::SharedState;

/// Frames buffered between the acquisition thread and the processing loop.
/// Kept small so the loop always works on a recent image.
const FRAME_CHANNEL_CAPACITY: usize = 2;

type Launcher = Box<dyn FnOnce(StreamConfig, Sender<Result<()>>, Sender<Result<Frame>>) + Send>;

/// [`FrameSource`] adapter that waits for each frame with a deadline.
pub struct BoundedFrameSource {
    timeout: Duration,
    shared: Arc<SharedState>,
    launcher: Option<Launcher>,
    receiver: Option<Receiver<Result<Frame>>>,
    handle: Option<JoinHandle<()>>,
}

impl BoundedFrameSource {
    /// `factory` builds the wrapped source on the acquisition thread, so the
    /// source itself does not need to be `Send`.
    pub fn new<S, F>(factory: F, timeout: Duration, shared: Arc<SharedState>) -> Self
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let thread_shared = shared.clone();
        let launcher: Launcher = Box::new(move |config, ready_tx, frame_tx| {
            acquisition_loop(factory, config, ready_tx, frame_tx, thread_shared)
        });
        Self {
            timeout,
            shared,
            launcher: Some(launcher),
            receiver: None,
            handle: None,
        }
    }
}

impl FrameSource for BoundedFrameSource {
    fn start(&mut self, config: &StreamConfig) -> Result<()> {
        let launcher = self
            .launcher
            .take()
            .context("Bounded frame source already started")?;

        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let (frame_tx, frame_rx) = bounded::<Result<Frame>>(FRAME_CHANNEL_CAPACITY);
        let config = *config;
        let handle = thread::Builder::new()
            .name("acquisition".to_string())
            .spawn(move || launcher(config, ready_tx, frame_tx))
            .context("Failed to spawn acquisition thread")?;
        self.handle = Some(handle);

        // Start-up includes the camera warm-up, so it is not bounded by the frame timeout.
        ready_rx
            .recv()
            .map_err(|_| AcquisitionError::Disconnected)??;
        self.receiver = Some(frame_rx);
        info!("Acquisition thread running, frame timeout {:?}", self.timeout);
        Ok(())
    }

    fn wait_for_frame(&mut self) -> Result<Frame> {
        let receiver = self.receiver.as_ref().ok_or(AcquisitionError::NotStarted)?;
        match receiver.recv_timeout(self.timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => Err(AcquisitionError::Timeout(self.timeout).into()),
            Err(RecvTimeoutError::Disconnected) => Err(AcquisitionError::Disconnected.into()),
        }
    }
}

impl Drop for BoundedFrameSource {
    fn drop(&mut self) {
        self.shared.request_stop();
        // Dropping the receiver unblocks a thread waiting on a full channel.
        self.receiver.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn acquisition_loop<S, F>(
    factory: F,
    config: StreamConfig,
    ready_tx: Sender<Result<()>>,
    frame_tx: Sender<Result<Frame>>,
    shared: Arc<SharedState>,
) where
    S: FrameSource,
    F: FnOnce() -> Result<S>,
{
    let started = factory().and_then(|mut source| {
        source.start(&config)?;
        Ok(source)
    });
    let mut source = match started {
        Ok(source) => {
            let _ = ready_tx.send(Ok(()));
            source
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    while !shared.is_stop_requested() {
        let frame = source.wait_for_frame();
        let failed = frame.is_err();
        if frame_tx.send(frame).is_err() || failed {
            break;
        }
    }
    debug!("Acquisition thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Mat;

    /// Emits `frames` frames, then sleeps `stall` before every further frame.
    struct ScriptedSource {
        frames: u64,
        stall: Duration,
        emitted: u64,
        fail_start: bool,
    }

    impl ScriptedSource {
        fn new(frames: u64, stall: Duration) -> Self {
            Self {
                frames,
                stall,
                emitted: 0,
                fail_start: false,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn start(&mut self, _config: &StreamConfig) -> Result<()> {
            if self.fail_start {
                return Err(AcquisitionError::OpenFailed { device: 7 }.into());
            }
            Ok(())
        }

        fn wait_for_frame(&mut self) -> Result<Frame> {
            if self.emitted >= self.frames {
                thread::sleep(self.stall);
            }
            self.emitted += 1;
            Ok(Frame {
                image: Mat::default(),
                timestamp_ns: self.emitted,
            })
        }
    }

    fn stream() -> StreamConfig {
        StreamConfig {
            device_index: 0,
            width: 848,
            height: 480,
            fps: 30,
            warmup_frames: 0,
        }
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let mut source = BoundedFrameSource::new(
            || Ok(ScriptedSource::new(u64::MAX, Duration::ZERO)),
            Duration::from_secs(1),
            SharedState::new(),
        );
        source.start(&stream()).unwrap();
        for expected in 1..=5 {
            assert_eq!(source.wait_for_frame().unwrap().timestamp_ns, expected);
        }
    }

    #[test]
    fn test_missed_deadline_is_timeout() {
        let mut source = BoundedFrameSource::new(
            || Ok(ScriptedSource::new(1, Duration::from_millis(300))),
            Duration::from_millis(20),
            SharedState::new(),
        );
        source.start(&stream()).unwrap();
        assert!(source.wait_for_frame().is_ok());

        let err = source.wait_for_frame().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AcquisitionError>(),
            Some(AcquisitionError::Timeout(_))
        ));
    }

    #[test]
    fn test_start_failure_is_reported() {
        let mut source = BoundedFrameSource::new(
            || {
                let mut s = ScriptedSource::new(0, Duration::ZERO);
                s.fail_start = true;
                Ok(s)
            },
            Duration::from_millis(20),
            SharedState::new(),
        );
        let err = source.start(&stream()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AcquisitionError>(),
            Some(AcquisitionError::OpenFailed { device: 7 })
        ));
    }

    #[test]
    fn test_wait_before_start() {
        let mut source = BoundedFrameSource::new(
            || Ok(ScriptedSource::new(0, Duration::ZERO)),
            Duration::from_millis(20),
            SharedState::new(),
        );
        let err = source.wait_for_frame().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AcquisitionError>(),
            Some(AcquisitionError::NotStarted)
        ));
    }
}

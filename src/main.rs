use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rust_tagtrack::config::AppConfig;
use rust_tagtrack::detection::AprilTagDetector;
use rust_tagtrack::io::camera::{FrameSource, OpenCvCamera};
use rust_tagtrack::io::replay::DetectionLog;
use rust_tagtrack::system::{BoundedFrameSource, SharedState, TagTrackingSystem, run_replay};
use rust_tagtrack::viz::{HighGuiPresenter, NullPresenter, Presenter, RerunVisualizer};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            AppConfig::load(&path)?
        }
        None => AppConfig::default(),
    };
    info!(
        "Reference tag {}, smoothing {} frames, report every {} frames",
        config.tracker.reference_tag_id,
        config.tracker.smoothing_frames,
        config.tracker.display_interval
    );

    let shared = SharedState::new();

    if let Some(path) = &config.replay {
        let log = DetectionLog::load(path)?;
        info!("Replaying {} frames from {}", log.len(), path.display());
        run_replay(&config, &log, &mut io::stdout().lock(), &shared)?;
        return Ok(());
    }

    match config.camera.frame_timeout() {
        Some(timeout) => {
            let source = BoundedFrameSource::new(|| Ok(OpenCvCamera::new()), timeout, shared.clone());
            run_with_presenter(&config, source, shared)
        }
        None => run_with_presenter(&config, OpenCvCamera::new(), shared),
    }
}

fn run_with_presenter<S: FrameSource>(
    config: &AppConfig,
    source: S,
    shared: Arc<SharedState>,
) -> Result<()> {
    if config.viz.window {
        run_live(config, source, HighGuiPresenter::new()?, shared)
    } else {
        run_live(config, source, NullPresenter, shared)
    }
}

fn run_live<S: FrameSource, P: Presenter>(
    config: &AppConfig,
    source: S,
    presenter: P,
    shared: Arc<SharedState>,
) -> Result<()> {
    let camera = config.camera.camera_model()?;
    let detector = AprilTagDetector::new(camera, config.camera.tag_size_m)
        .context("Failed to create AprilTag detector")?;

    let mut system = TagTrackingSystem::new(config, source, detector, presenter, shared);
    if config.viz.rerun {
        system = system.with_visualizer(RerunVisualizer::new("Tag Tracking")?);
    }

    system.start(&config.camera.stream_config())?;
    let frames = system.run()?;
    info!("Done after {} frames", frames);
    Ok(())
}

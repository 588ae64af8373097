use anyhow::Result;
use api::{FaceTracker, TrackerLogger};
use common::{FilterConfig, LandmarkSmoother, VisageFilter};
use log::{debug, error, info, trace, warn};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use visage_d::control::{self, ControlServer};
use visage_d::dump::FrameDumper;
use visage_d::load_config;
use visage_d::pipeline::FramePipeline;
use visage_d::source::TestPatternSource;
use visage_d::trackers::{tracker_log_callback, SyntheticTracker};

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    info!("Starting...");
    debug!("Debug logging is active");
    trace!("Trace logging is active");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("Received Ctrl-C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    let config_path = Path::new("config.json");
    let config = load_config(config_path).unwrap_or_else(|e| {
        error!("Failed to load config: {:#}. Using defaults.", e);
        FilterConfig::default()
    });
    info!("Loaded Config: {:?}", config);

    let filter = Arc::new(VisageFilter::new(&config));

    let mut tracker: Box<dyn FaceTracker> = Box::new(SyntheticTracker::new());
    tracker.initialize(TrackerLogger::new(
        tracker_log_callback,
        "visage_d::trackers::synthetic".to_string(),
    ))?;

    match filter.model_store().load() {
        Ok(Some(state)) => {
            info!(
                "Restoring face model from {:?} ({:?})",
                filter.model_store().path(),
                state
            );
            if let Err(e) = tracker.restore_model(&state) {
                warn!("Ignoring saved face model: {:#}", e);
            }
        }
        Ok(None) => info!("No saved face model, starting fresh."),
        Err(e) => warn!("Could not read saved face model: {}", e),
    }

    match tracker.model_source() {
        Some(source) => filter.attach_model_source(source),
        None => warn!("Tracker does not expose a model; saving is unavailable."),
    }

    if config.control.enabled {
        let control_filter = filter.clone();
        let control_config = config.control.clone();
        thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create control runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                let router = control::get_router(control_filter);
                if let Err(e) = ControlServer::start(&control_config, router).await {
                    error!("Control surface stopped: {:#}", e);
                }
            });
        });
    } else {
        info!("Control surface disabled in config.");
    }

    let dumper = FrameDumper::from_config(&config.dump);
    if let Some(dumper) = &dumper {
        info!("Dumping every {} frames to {:?}", config.dump.every_n_frames, dumper.dir());
    }

    let mut pipeline = FramePipeline::new(
        TestPatternSource::new(config.frame.width, config.frame.height),
        tracker,
        LandmarkSmoother::new(&config.smoothing),
        filter.clone(),
        dumper,
    );

    info!("Entering Main Loop...");

    let mut log_interval: u64 = 1000;
    let mut last_log = Instant::now();
    let mut last_frame_time = Instant::now();
    let target_frame_duration = config
        .frame
        .max_fps
        .filter(|fps| *fps > 0.0)
        .map(|fps| Duration::from_secs_f32(1.0 / fps));

    while running.load(Ordering::SeqCst) {
        pipeline.step();

        let frame_count = pipeline.frame_count();
        if frame_count.is_multiple_of(log_interval) {
            let elapsed = last_log.elapsed().as_secs_f32();
            let fps = log_interval as f32 / elapsed;
            let stats = filter.stats();
            info!(
                "Overlay Active: Processed {} frames (approx {:.1} FPS, {} passthrough) in {} mode",
                frame_count,
                fps,
                stats.passthrough_frames,
                filter.mode()
            );
            last_log = Instant::now();

            if frame_count >= 1_000_000 {
                log_interval = 1_000_000;
            } else if frame_count >= 100_000 {
                log_interval = 100_000;
            } else if frame_count >= 10_000 {
                log_interval = 10_000;
            }
        }

        if let Some(target_duration) = target_frame_duration {
            let elapsed = last_frame_time.elapsed();
            if elapsed < target_duration {
                thread::sleep(target_duration - elapsed);
            }
        }
        last_frame_time = Instant::now();
    }

    info!("Shutting down...");
    if config.storage.save_on_exit {
        match filter.save_model() {
            Ok(path) => info!("Saved face model to {:?}", path),
            Err(e) => error!("Final model save failed: {}", e),
        }
    }
    pipeline.unload();
    Ok(())
}

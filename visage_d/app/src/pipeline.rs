use api::{FaceTracker, Frame};
use common::{LandmarkSmoother, RenderReport, VisageFilter};
use log::{error, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::dump::FrameDumper;
use crate::source::TestPatternSource;

/// One pass of the daemon's frame thread: capture, track, smooth, publish,
/// composite, and optionally dump.
pub struct FramePipeline {
    source: TestPatternSource,
    tracker: Box<dyn FaceTracker>,
    smoother: LandmarkSmoother,
    filter: Arc<VisageFilter>,
    dumper: Option<FrameDumper>,
    input: Frame,
    output: Frame,
    last_tick: Option<Instant>,
    frame_count: u64,
}

impl FramePipeline {
    pub fn new(
        source: TestPatternSource,
        tracker: Box<dyn FaceTracker>,
        smoother: LandmarkSmoother,
        filter: Arc<VisageFilter>,
        dumper: Option<FrameDumper>,
    ) -> Self {
        Self {
            source,
            tracker,
            smoother,
            filter,
            dumper,
            input: Frame::new(0, 0),
            output: Frame::new(0, 0),
            last_tick: None,
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Composited result of the latest `step`.
    pub fn output(&self) -> &Frame {
        &self.output
    }

    pub fn tracker_mut(&mut self) -> &mut dyn FaceTracker {
        self.tracker.as_mut()
    }

    pub fn step(&mut self) -> RenderReport {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_tick = Some(now);

        self.source.next_into(&mut self.input);

        let geometry = match self.tracker.track(&self.input) {
            Ok(Some(snapshot)) => Some(self.smoother.apply(&snapshot, dt)),
            Ok(None) => {
                self.smoother.reset();
                None
            }
            Err(e) => {
                warn!("Tracker failed on frame {}: {:#}", self.frame_count, e);
                self.smoother.reset();
                None
            }
        };
        self.filter.update_geometry(geometry);

        let report = self.filter.render_frame(&self.input, &mut self.output);

        if let Some(dumper) = &self.dumper {
            if let Err(e) = dumper.maybe_dump(self.frame_count, &self.output) {
                error!("Failed to dump frame: {:#}", e);
            }
        }

        self.frame_count += 1;
        report
    }

    /// Shuts the tracker down. The pipeline should not be stepped afterwards.
    pub fn unload(&mut self) {
        self.tracker.unload();
    }
}

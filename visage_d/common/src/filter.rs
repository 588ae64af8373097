use api::{Frame, GeometrySnapshot, ModelSource};
use log::{debug, error, trace};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::config::FilterConfig;
use crate::error::VisageError;
use crate::mode::{ModeController, ViewMode};
use crate::model_store::ModelStore;
use crate::overlay::{self, OverlayStyle, RenderReport};
use crate::snapshot::SnapshotSlot;

/// Per-frame processing contract of the frame pipeline: one input frame in,
/// one output frame out, every tick.
pub trait FrameFilter: Send + Sync {
    fn name(&self) -> &str;

    /// Must not fail or block; `output` is resized to match `input`.
    fn process_frame(&self, input: &Frame, output: &mut Frame);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub frames: u64,
    pub passthrough_frames: u64,
    pub skipped_primitives: u64,
}

/// Face overlay filter: draws the latest tracked geometry in the current view
/// mode and saves the tracker's model on request.
pub struct VisageFilter {
    mode: ModeController,
    geometry: SnapshotSlot,
    style: OverlayStyle,
    store: ModelStore,
    model_source: RwLock<Option<Arc<dyn ModelSource>>>,
    frames: AtomicU64,
    passthrough_frames: AtomicU64,
    skipped_primitives: AtomicU64,
}

impl VisageFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self::with_parts(config.mode, config.style, config.storage.model_store())
    }

    pub fn with_parts(mode: ViewMode, style: OverlayStyle, store: ModelStore) -> Self {
        Self {
            mode: ModeController::new(mode),
            geometry: SnapshotSlot::new(),
            style,
            store,
            model_source: RwLock::new(None),
            frames: AtomicU64::new(0),
            passthrough_frames: AtomicU64::new(0),
            skipped_primitives: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode.mode()
    }

    /// Takes effect from the next processed frame. Returns the previous mode.
    pub fn set_mode(&self, mode: ViewMode) -> ViewMode {
        self.mode.set_mode(mode)
    }

    /// Parses a mode name from an untyped caller. Unknown names leave the mode
    /// unchanged.
    pub fn set_mode_by_name(&self, name: &str) -> Result<ViewMode, VisageError> {
        let mode = name.parse::<ViewMode>()?;
        Ok(self.set_mode(mode))
    }

    /// Same as [`Self::set_mode_by_name`] for raw mode codes (0 points,
    /// 1 wireframe, 2 mesh).
    pub fn set_mode_code(&self, code: u8) -> Result<ViewMode, VisageError> {
        self.mode.set_mode_code(code)
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Latest geometry from the tracker; `None` when no face is tracked.
    pub fn update_geometry(&self, snapshot: Option<GeometrySnapshot>) {
        self.geometry.update(snapshot);
    }

    pub fn geometry(&self) -> &SnapshotSlot {
        &self.geometry
    }

    pub fn attach_model_source(&self, source: Arc<dyn ModelSource>) {
        match self.model_source.write() {
            Ok(mut guard) => *guard = Some(source),
            Err(poisoned) => *poisoned.into_inner() = Some(source),
        }
    }

    pub fn model_store(&self) -> &ModelStore {
        &self.store
    }

    /// Captures the tracker's current model and publishes it atomically.
    ///
    /// Blocking file I/O; call it off the frame thread.
    pub fn save_model(&self) -> Result<PathBuf, VisageError> {
        let source = match self.model_source.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let Some(source) = source else {
            return Err(VisageError::NoModelSource);
        };

        self.store.save_from(source.as_ref()).map_err(|e| {
            error!("Failed to save face model: {}", e);
            e
        })
    }

    /// Renders one frame with the mode and geometry current at call time.
    pub fn render_frame(&self, input: &Frame, output: &mut Frame) -> RenderReport {
        let mode = self.mode.mode();
        let geometry = self.geometry.latest();

        let report = overlay::render(input, geometry.as_deref(), mode, &self.style, output);

        self.frames.fetch_add(1, Ordering::Relaxed);
        if report.passthrough {
            self.passthrough_frames.fetch_add(1, Ordering::Relaxed);
        }
        if report.skipped > 0 {
            self.skipped_primitives
                .fetch_add(report.skipped as u64, Ordering::Relaxed);
            debug!(
                "Skipped {} malformed primitives in {} mode",
                report.skipped, mode
            );
        }
        trace!("Rendered frame: {:?}", report);

        report
    }

    pub fn stats(&self) -> FilterStats {
        FilterStats {
            frames: self.frames.load(Ordering::Relaxed),
            passthrough_frames: self.passthrough_frames.load(Ordering::Relaxed),
            skipped_primitives: self.skipped_primitives.load(Ordering::Relaxed),
        }
    }
}

impl FrameFilter for VisageFilter {
    fn name(&self) -> &str {
        "VisageFilter"
    }

    fn process_frame(&self, input: &Frame, output: &mut Frame) {
        self.render_frame(input, output);
    }
}

pub use api::{
    FaceTracker, Frame, GeometrySnapshot, ModelSource, ModelState, Topology, TrackerLogger,
};

mod config;
pub mod error;
mod filter;
mod mode;
pub mod model_store;
pub mod overlay;
mod smoothing;
mod snapshot;

pub use config::{
    ControlConfig, DumpConfig, FilterConfig, FrameConfig, SmoothingConfig, StorageConfig,
};
pub use error::VisageError;
pub use filter::{FilterStats, FrameFilter, VisageFilter};
pub use mode::{ModeController, ViewMode};
pub use model_store::ModelStore;
pub use overlay::{DrawList, OverlayStyle, Primitive, RenderReport};
pub use smoothing::{EuroFilter, LandmarkSmoother};
pub use snapshot::SnapshotSlot;

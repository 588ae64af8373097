mod frame;
pub use frame::Frame;

use anyhow::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Index pair into a snapshot's landmarks.
pub type Edge = [u32; 2];
/// Index triple into a snapshot's landmarks.
pub type Face = [u32; 3];

/// Connectivity of a tracker's landmark set.
///
/// Indices are not validated here; the renderer skips anything that points
/// past the landmarks of the snapshot it is drawn with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub faces: Vec<Face>,
}

impl Topology {
    pub fn new(edges: Vec<Edge>, faces: Vec<Face>) -> Self {
        Self { edges, faces }
    }

    /// Builds a topology whose wireframe is the unique set of triangle sides,
    /// in order of first appearance.
    pub fn from_faces(faces: Vec<Face>) -> Self {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for face in &faces {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.push([a, b]);
                }
            }
        }
        Self { edges, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.faces.is_empty()
    }
}

/// One frame's worth of tracked landmarks plus the topology connecting them.
///
/// Landmark `x`/`y` are pixel coordinates in the frame the snapshot was
/// produced for; `z` is carried along but not used for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySnapshot {
    frame_index: u64,
    landmarks: Vec<Vec3>,
    topology: Arc<Topology>,
}

impl GeometrySnapshot {
    pub fn new(frame_index: u64, landmarks: Vec<Vec3>, topology: Arc<Topology>) -> Self {
        Self {
            frame_index,
            landmarks,
            topology,
        }
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn landmarks(&self) -> &[Vec3] {
        &self.landmarks
    }

    pub fn landmark(&self, index: u32) -> Option<Vec3> {
        self.landmarks.get(index as usize).copied()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn shared_topology(&self) -> Arc<Topology> {
        self.topology.clone()
    }

    /// No face tracked: nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Same frame and topology, different landmark positions.
    pub fn with_landmarks(&self, landmarks: Vec<Vec3>) -> Self {
        Self {
            frame_index: self.frame_index,
            landmarks,
            topology: self.topology.clone(),
        }
    }
}

/// Opaque learned/calibration state of a tracker. The layout belongs to the
/// tracker that produced it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ModelState(Vec<u8>);

impl ModelState {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ModelState {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelState({} bytes)", self.0.len())
    }
}

/// log level for tracker logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

/// logger callback for trackers
pub type LogCallback = fn(level: LogLevel, target: &str, message: &str);

/// Logger interface handed to trackers on initialization
pub struct TrackerLogger {
    callback: LogCallback,
    tracker_name: String,
}

impl TrackerLogger {
    pub fn new(callback: LogCallback, tracker_name: String) -> Self {
        Self {
            callback,
            tracker_name,
        }
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        (self.callback)(level, &self.tracker_name, message);
    }
}

/// Source of a tracker's current model state. Capturing must not wait on the
/// tracker's per-frame work.
pub trait ModelSource: Send + Sync {
    fn capture(&self) -> Result<ModelState>;
}

pub trait FaceTracker: Send {
    fn initialize(&mut self, logger: TrackerLogger) -> Result<()>;

    /// `Ok(None)` means no face in this frame.
    fn track(&mut self, frame: &Frame) -> Result<Option<GeometrySnapshot>>;

    /// Handle used to persist the tracker's learned state, if it has any.
    fn model_source(&self) -> Option<Arc<dyn ModelSource>> {
        None
    }

    fn restore_model(&mut self, _state: &ModelState) -> Result<()> {
        Ok(())
    }

    fn unload(&mut self);
}

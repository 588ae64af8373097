//! Deterministic stand-in for a real face tracker.
//!
//! Moves a ring-shaped face mesh across the frame and drops the face for a
//! short stretch every few seconds. While tracking it learns a face template
//! (mean normalized landmark offsets), which is the model it exposes for
//! saving and accepts on restore.

use anyhow::{bail, Context, Result};
use api::{FaceTracker, Frame, GeometrySnapshot, ModelSource, ModelState, Topology, TrackerLogger};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

const RINGS: usize = 3;
const RING_POINTS: usize = 12;
pub const LANDMARK_COUNT: usize = 1 + RINGS * RING_POINTS;

const FACE_LOST_EVERY: u64 = 300;
const FACE_LOST_FOR: u64 = 20;
const ASPECT: f32 = 1.25;
const JITTER_PX: f32 = 0.5;

/// Fan around the centre landmark, then quad strips between rings.
pub fn face_topology() -> Topology {
    let mut faces = Vec::with_capacity(RING_POINTS * (2 * RINGS - 1));
    let ring = |r: usize, i: usize| (1 + r * RING_POINTS + i % RING_POINTS) as u32;

    for i in 0..RING_POINTS {
        faces.push([0, ring(0, i), ring(0, i + 1)]);
    }
    for r in 0..RINGS - 1 {
        for i in 0..RING_POINTS {
            let (a, b) = (ring(r, i), ring(r, i + 1));
            let (c, d) = (ring(r + 1, i), ring(r + 1, i + 1));
            faces.push([a, c, d]);
            faces.push([a, d, b]);
        }
    }
    Topology::from_faces(faces)
}

fn canonical_offsets() -> Vec<Vec2> {
    let mut offsets = Vec::with_capacity(LANDMARK_COUNT);
    offsets.push(Vec2::ZERO);
    for r in 0..RINGS {
        let radius = (r + 1) as f32 / RINGS as f32;
        for i in 0..RING_POINTS {
            let angle = i as f32 / RING_POINTS as f32 * std::f32::consts::TAU;
            offsets.push(Vec2::new(angle.cos() * radius, angle.sin() * radius * ASPECT));
        }
    }
    offsets
}

/// Small repeatable noise in [-1, 1).
fn jitter(frame_index: u64, landmark: usize, axis: u64) -> f32 {
    let mut h = frame_index
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(((landmark as u64) << 1) | axis);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    (h % 2000) as f32 / 1000.0 - 1.0
}

/// Learned mean landmark layout, normalized to face scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceTemplate {
    pub samples: u64,
    pub offsets: Vec<[f32; 2]>,
}

impl Default for FaceTemplate {
    fn default() -> Self {
        Self {
            samples: 0,
            offsets: canonical_offsets().iter().map(|o| o.to_array()).collect(),
        }
    }
}

impl FaceTemplate {
    fn observe(&mut self, offsets: &[Vec2]) {
        if offsets.len() != self.offsets.len() {
            return;
        }
        self.samples += 1;
        let weight = 1.0 / self.samples as f32;
        for (mean, sample) in self.offsets.iter_mut().zip(offsets) {
            let current = Vec2::from_array(*mean);
            *mean = current.lerp(*sample, weight).to_array();
        }
    }
}

/// Shared handle to the tracker's template; captures without touching the
/// tracking loop beyond a brief read lock.
#[derive(Clone)]
pub struct TemplateHandle {
    template: Arc<RwLock<FaceTemplate>>,
}

impl TemplateHandle {
    pub fn snapshot(&self) -> FaceTemplate {
        match self.template.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ModelSource for TemplateHandle {
    fn capture(&self) -> Result<ModelState> {
        let template = self.snapshot();
        let bytes = serde_json::to_vec(&template).context("serializing face template")?;
        Ok(ModelState::new(bytes))
    }
}

pub struct SyntheticTracker {
    logger: Option<TrackerLogger>,
    template: TemplateHandle,
    topology: Arc<Topology>,
    frame_index: u64,
    face_visible: bool,
}

impl SyntheticTracker {
    pub fn new() -> Self {
        Self {
            logger: None,
            template: TemplateHandle {
                template: Arc::new(RwLock::new(FaceTemplate::default())),
            },
            topology: Arc::new(face_topology()),
            frame_index: 0,
            face_visible: false,
        }
    }

    pub fn template(&self) -> FaceTemplate {
        self.template.snapshot()
    }

    fn set_visible(&mut self, visible: bool) {
        if self.face_visible != visible {
            self.face_visible = visible;
            if let Some(logger) = &self.logger {
                if visible {
                    logger.info("Face found.");
                } else {
                    logger.info("Face lost.");
                }
            }
        }
    }

    fn face_pose(&self, index: u64, frame: &Frame) -> (Vec2, f32, f32) {
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let t = index as f32 / 30.0;
        let center = Vec2::new(
            w * 0.5 + w * 0.2 * (t * 0.9).sin(),
            h * 0.5 + h * 0.15 * (t * 1.3).sin(),
        );
        let scale = w.min(h) * 0.25 * (1.0 + 0.05 * (t * 2.0).sin());
        let yaw = 0.9 + 0.1 * (t * 0.7).cos();
        (center, scale, yaw)
    }
}

impl Default for SyntheticTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceTracker for SyntheticTracker {
    fn initialize(&mut self, logger: TrackerLogger) -> Result<()> {
        logger.info(&format!(
            "Synthetic tracker ready: {} landmarks, {} faces",
            LANDMARK_COUNT,
            self.topology.faces.len()
        ));
        self.logger = Some(logger);
        Ok(())
    }

    fn track(&mut self, frame: &Frame) -> Result<Option<GeometrySnapshot>> {
        let index = self.frame_index;
        self.frame_index += 1;

        if frame.width() == 0 || frame.height() == 0 {
            self.set_visible(false);
            return Ok(None);
        }
        if index % FACE_LOST_EVERY >= FACE_LOST_EVERY - FACE_LOST_FOR {
            self.set_visible(false);
            return Ok(None);
        }
        self.set_visible(true);

        let (center, scale, yaw) = self.face_pose(index, frame);
        let canonical = canonical_offsets();

        let mut landmarks = Vec::with_capacity(LANDMARK_COUNT);
        let mut normalized = Vec::with_capacity(LANDMARK_COUNT);
        for (i, offset) in canonical.iter().enumerate() {
            let noise = Vec2::new(jitter(index, i, 0), jitter(index, i, 1)) * JITTER_PX;
            let point = center + Vec2::new(offset.x * yaw, offset.y) * scale + noise;
            let depth = (1.0 - offset.length().min(1.0)) * scale * 0.2;
            landmarks.push(Vec3::new(point.x, point.y, depth));
            normalized.push((point - center) / scale);
        }

        match self.template.template.write() {
            Ok(mut guard) => guard.observe(&normalized),
            Err(poisoned) => poisoned.into_inner().observe(&normalized),
        }

        Ok(Some(GeometrySnapshot::new(
            index,
            landmarks,
            self.topology.clone(),
        )))
    }

    fn model_source(&self) -> Option<Arc<dyn ModelSource>> {
        Some(Arc::new(self.template.clone()))
    }

    fn restore_model(&mut self, state: &ModelState) -> Result<()> {
        let template: FaceTemplate =
            serde_json::from_slice(state.as_bytes()).context("parsing face template")?;
        if template.offsets.len() != LANDMARK_COUNT {
            bail!(
                "face template has {} landmarks, expected {}",
                template.offsets.len(),
                LANDMARK_COUNT
            );
        }

        if let Some(logger) = &self.logger {
            logger.info(&format!(
                "Restored face template learned from {} samples",
                template.samples
            ));
        }
        match self.template.template.write() {
            Ok(mut guard) => *guard = template,
            Err(poisoned) => *poisoned.into_inner() = template,
        }
        Ok(())
    }

    fn unload(&mut self) {
        if let Some(logger) = &self.logger {
            logger.info("Synthetic tracker unloaded.");
        }
        self.logger = None;
    }
}

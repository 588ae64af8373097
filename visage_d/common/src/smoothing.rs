//! Tracker-side landmark smoothing.
//!
//! Runs before a snapshot is published. The renderer only ever sees the
//! smoothed positions, so it stays a pure function of what it is given.

use api::GeometrySnapshot;
use glam::Vec3;

use crate::config::SmoothingConfig;

/// One-euro low-pass filter for a single scalar signal.
#[derive(Debug, Clone, Copy)]
pub struct EuroFilter {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,
    x_prev: f32,
    dx_prev: f32,
    raw_x_prev: f32,
    initialized: bool,
}

impl Default for EuroFilter {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.5,
            d_cutoff: 1.0,
            x_prev: 0.0,
            dx_prev: 0.0,
            raw_x_prev: 0.0,
            initialized: false,
        }
    }
}

impl EuroFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_config(min_cutoff: f32, beta: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            ..Default::default()
        }
    }

    fn alpha(dt: f32, cutoff: f32) -> f32 {
        let tau = 1.0 / (2.0 * std::f32::consts::PI * cutoff);
        1.0 / (1.0 + tau / dt)
    }

    fn low_pass(hat_x_prev: &mut f32, x: f32, alpha: f32) -> f32 {
        let hat_x = alpha * x + (1.0 - alpha) * *hat_x_prev;
        *hat_x_prev = hat_x;
        hat_x
    }

    /// Filters `x` sampled `dt` seconds after the previous value. Non-finite
    /// samples are passed through without touching the filter state.
    pub fn filter(&mut self, x: f32, dt: f32) -> f32 {
        if !x.is_finite() {
            return x;
        }

        if !self.initialized || !dt.is_finite() || dt <= 0.0 {
            self.initialized = true;
            self.raw_x_prev = x;
            self.x_prev = x;
            self.dx_prev = 0.0;
            return x;
        }

        let dx = (x - self.raw_x_prev) / dt;
        self.raw_x_prev = x;

        let edx = Self::low_pass(&mut self.dx_prev, dx, Self::alpha(dt, self.d_cutoff));
        let cutoff = self.min_cutoff + self.beta * edx.abs();

        Self::low_pass(&mut self.x_prev, x, Self::alpha(dt, cutoff))
    }
}

/// Smooths every landmark coordinate of consecutive snapshots.
pub struct LandmarkSmoother {
    enabled: bool,
    min_cutoff: f32,
    beta: f32,
    filters: Vec<[EuroFilter; 3]>,
}

impl LandmarkSmoother {
    pub fn new(config: &SmoothingConfig) -> Self {
        let (min_cutoff, beta) = Self::calculate_params(config.smoothness);
        Self {
            enabled: config.enabled,
            min_cutoff,
            beta,
            filters: Vec::new(),
        }
    }

    fn calculate_params(smoothness: f32) -> (f32, f32) {
        let smoothness = smoothness.clamp(0.0, 0.99);
        let min_cutoff = if smoothness <= 0.0 {
            10.0
        } else {
            1.0 / (smoothness * 10.0)
        };
        let beta = if smoothness <= 0.0 {
            1.0
        } else {
            0.5 * (1.0 - smoothness)
        };
        (min_cutoff, beta)
    }

    /// Forget history, e.g. when the face is lost.
    pub fn reset(&mut self) {
        self.filters.clear();
    }

    pub fn apply(&mut self, snapshot: &GeometrySnapshot, dt: f32) -> GeometrySnapshot {
        if !self.enabled || snapshot.is_empty() {
            return snapshot.clone();
        }

        if self.filters.len() != snapshot.landmarks().len() {
            self.filters = vec![
                [EuroFilter::new_with_config(self.min_cutoff, self.beta); 3];
                snapshot.landmarks().len()
            ];
        }

        let landmarks = snapshot
            .landmarks()
            .iter()
            .zip(self.filters.iter_mut())
            .map(|(p, [fx, fy, fz])| {
                Vec3::new(fx.filter(p.x, dt), fy.filter(p.y, dt), fz.filter(p.z, dt))
            })
            .collect();

        snapshot.with_landmarks(landmarks)
    }
}

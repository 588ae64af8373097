use crate::error::VisageError;
use log::info;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// What the overlay draws for a tracked face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ViewMode {
    #[default]
    #[serde(rename = "points", alias = "feature_points", alias = "FeaturePoints")]
    FeaturePoints = 0,
    #[serde(rename = "wireframe", alias = "Wireframe")]
    Wireframe = 1,
    #[serde(rename = "mesh", alias = "Mesh")]
    Mesh = 2,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::FeaturePoints, ViewMode::Wireframe, ViewMode::Mesh];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FeaturePoints => "points",
            Self::Wireframe => "wireframe",
            Self::Mesh => "mesh",
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for ViewMode {
    type Error = VisageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FeaturePoints),
            1 => Ok(Self::Wireframe),
            2 => Ok(Self::Mesh),
            other => Err(VisageError::InvalidMode(other.to_string())),
        }
    }
}

impl FromStr for ViewMode {
    type Err = VisageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "points" | "feature_points" | "featurepoints" => Ok(Self::FeaturePoints),
            "wireframe" => Ok(Self::Wireframe),
            "mesh" => Ok(Self::Mesh),
            _ => Err(VisageError::InvalidMode(s.to_string())),
        }
    }
}

/// Current view mode, shared between the frame path and control callers.
///
/// Stored as its `u8` discriminant so a frame reads either the old or the new
/// mode, never anything in between.
#[derive(Debug)]
pub struct ModeController {
    mode: AtomicU8,
}

impl ModeController {
    pub fn new(initial: ViewMode) -> Self {
        Self {
            mode: AtomicU8::new(initial as u8),
        }
    }

    pub fn mode(&self) -> ViewMode {
        // Only valid discriminants are ever stored.
        ViewMode::try_from(self.mode.load(Ordering::SeqCst)).unwrap_or_default()
    }

    /// Applies `mode` from the next frame on and returns the previous one.
    pub fn set_mode(&self, mode: ViewMode) -> ViewMode {
        let previous = ViewMode::try_from(self.mode.swap(mode as u8, Ordering::SeqCst))
            .unwrap_or_default();
        if previous != mode {
            info!("View mode changed: {} -> {}", previous, mode);
        }
        previous
    }

    /// Boundary entry for untyped callers. Invalid codes leave the mode as is.
    pub fn set_mode_code(&self, code: u8) -> Result<ViewMode, VisageError> {
        let mode = ViewMode::try_from(code)?;
        Ok(self.set_mode(mode))
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(ViewMode::default())
    }
}

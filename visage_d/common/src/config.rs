use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model_store::{ModelStore, DEFAULT_MODEL_FILENAME};
use crate::overlay::OverlayStyle;
use crate::ViewMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
    pub model_file: String,
    /// Save the tracker's model once more on shutdown.
    pub save_on_exit: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            model_file: DEFAULT_MODEL_FILENAME.to_string(),
            save_on_exit: false,
        }
    }
}

impl StorageConfig {
    pub fn model_store(&self) -> ModelStore {
        ModelStore::new(&self.dir, &self.model_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    pub enabled: bool,
    #[serde(alias = "address")]
    pub bind_address: String,
    pub port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1".to_string(),
            port: 9360,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_max_fps")]
    pub max_fps: Option<f32>,
}

fn default_max_fps() -> Option<f32> {
    Some(30.0)
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            max_fps: default_max_fps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,
    /// 0.0 follows the tracker closely, values towards 1.0 smooth harder.
    pub smoothness: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smoothness: 0.3,
        }
    }
}

/// Periodic PNG snapshots of composited frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DumpConfig {
    pub dir: Option<PathBuf>,
    pub every_n_frames: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            dir: None,
            every_n_frames: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    #[serde(alias = "view_mode")]
    pub mode: ViewMode,
    pub style: OverlayStyle,
    pub storage: StorageConfig,
    pub control: ControlConfig,
    pub frame: FrameConfig,
    pub smoothing: SmoothingConfig,
    pub dump: DumpConfig,
}

use anyhow::{Context, Result};
use api::Frame;
use common::DumpConfig;
use image::RgbaImage;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes every n-th composited frame to disk as PNG.
pub struct FrameDumper {
    dir: PathBuf,
    every_n_frames: u64,
}

impl FrameDumper {
    /// `None` when dumping is not configured.
    pub fn from_config(config: &DumpConfig) -> Option<Self> {
        let dir = config.dir.clone()?;
        Some(Self::new(dir, config.every_n_frames))
    }

    pub fn new(dir: impl Into<PathBuf>, every_n_frames: u64) -> Self {
        Self {
            dir: dir.into(),
            every_n_frames: every_n_frames.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn maybe_dump(&self, frame_index: u64, frame: &Frame) -> Result<Option<PathBuf>> {
        if frame_index % self.every_n_frames != 0 {
            return Ok(None);
        }
        self.dump(frame_index, frame).map(Some)
    }

    pub fn dump(&self, frame_index: u64, frame: &Frame) -> Result<PathBuf> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("creating dump dir {:?}", self.dir))?;
            info!("Created frame dump dir {:?}", self.dir);
        }

        let image = RgbaImage::from_raw(frame.width(), frame.height(), frame.as_bytes().to_vec())
            .context("frame buffer does not match its size")?;
        let path = self.dir.join(format!("frame_{:08}.png", frame_index));
        image
            .save(&path)
            .with_context(|| format!("writing {:?}", path))?;

        debug!("Dumped frame {} to {:?}", frame_index, path);
        Ok(path)
    }
}

use crate::error::VisageError;
use api::{ModelSource, ModelState};
use log::{info, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_MODEL_FILENAME: &str = "face_model.bin";

/// Durable home of the tracker's learned model.
///
/// Saves go to a temporary file next to the target and are renamed over it
/// only once fully written, so a failed save never leaves a partial model
/// behind and an earlier model stays readable.
#[derive(Debug, Clone)]
pub struct ModelStore {
    storage_path: PathBuf,
}

impl ModelStore {
    pub fn new(storage_dir: impl AsRef<Path>, filename: &str) -> Self {
        Self {
            storage_path: storage_dir.as_ref().join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Captures the source's current state and publishes it.
    pub fn save_from(&self, source: &dyn ModelSource) -> Result<PathBuf, VisageError> {
        let state = source
            .capture()
            .map_err(|e| VisageError::Capture(format!("{:#}", e)))?;
        self.save(&state)
    }

    pub fn save(&self, state: &ModelState) -> Result<PathBuf, VisageError> {
        let path = &self.storage_path;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| VisageError::persistence(&dir, e))?;
        }

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| VisageError::persistence(&dir, e))?;
        tmp.write_all(state.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| VisageError::persistence(tmp.path(), e))?;

        // On failure the temporary file is dropped, which deletes it.
        tmp.persist(path)
            .map_err(|e| VisageError::persistence(path, e.error))?;

        if let Err(e) = sync_dir(&dir) {
            warn!("Saved face model but could not sync {:?}: {}", dir, e);
        }

        info!("Saved face model ({} bytes) to {:?}", state.len(), path);
        Ok(path.clone())
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<ModelState>, VisageError> {
        match fs::read(&self.storage_path) {
            Ok(bytes) => {
                info!(
                    "Loaded face model ({} bytes) from {:?}",
                    bytes.len(),
                    self.storage_path
                );
                Ok(Some(ModelState::new(bytes)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No face model found at {:?}, tracker starts fresh",
                    self.storage_path
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Failed to read face model {:?}: {}", self.storage_path, e);
                Err(VisageError::persistence(&self.storage_path, e))
            }
        }
    }
}

/// The rename is only durable once the directory entry reaches the disk.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn storage_dir_sync_after_publish() {
        let dir = TempDir::new().unwrap();
        assert!(sync_dir(dir.path()).is_ok());

        let store = ModelStore::new(dir.path(), DEFAULT_MODEL_FILENAME);
        store.save(&ModelState::new(vec![7; 16])).unwrap();
        assert!(sync_dir(dir.path()).is_ok());
        assert_eq!(fs::read(store.path()).unwrap(), vec![7; 16]);
    }

    #[cfg(unix)]
    #[test]
    fn syncing_a_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(sync_dir(&dir.path().join("gone")).is_err());
    }
}

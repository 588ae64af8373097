use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{bail, Result};
use common::{ModelSource, ModelState, ModelStore, VisageError};
use tempfile::TempDir;

struct CountingSource {
    saves: AtomicU32,
}

impl ModelSource for CountingSource {
    fn capture(&self) -> Result<ModelState> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(ModelState::new(format!("model-v{}", n).into_bytes()))
    }
}

struct BrokenSource;

impl ModelSource for BrokenSource {
    fn capture(&self) -> Result<ModelState> {
        bail!("tracker not initialized")
    }
}

fn leftover_temp_files(dir: &TempDir, keep: &str) -> Vec<String> {
    fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != keep)
        .collect()
}

#[test]
fn save_produces_readable_blob() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path(), "face_model.bin");
    let state = ModelState::new(vec![0, 1, 2, 254, 255]);

    let path = store.save(&state).expect("save should succeed");
    assert_eq!(path, dir.path().join("face_model.bin"));
    assert_eq!(fs::read(&path).unwrap(), vec![0, 1, 2, 254, 255]);
    assert_eq!(store.load().unwrap(), Some(state));
    assert!(leftover_temp_files(&dir, "face_model.bin").is_empty());
}

#[test]
fn every_save_is_a_fresh_capture() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path(), "face_model.bin");
    let source = CountingSource {
        saves: AtomicU32::new(0),
    };

    store.save_from(&source).unwrap();
    assert_eq!(fs::read(store.path()).unwrap(), b"model-v0");
    store.save_from(&source).unwrap();
    assert_eq!(fs::read(store.path()).unwrap(), b"model-v1");
    assert_eq!(source.saves.load(Ordering::SeqCst), 2);
}

#[test]
fn creates_missing_storage_dir() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path().join("nested/models"), "face_model.bin");
    store.save(&ModelState::new(b"abc".to_vec())).unwrap();
    assert_eq!(fs::read(store.path()).unwrap(), b"abc");
}

#[test]
fn load_without_saved_model_is_none() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path(), "face_model.bin");
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn failed_capture_keeps_previous_model() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path(), "face_model.bin");
    store.save(&ModelState::new(b"good".to_vec())).unwrap();

    let err = store.save_from(&BrokenSource).unwrap_err();
    assert!(matches!(err, VisageError::Capture(ref msg) if msg.contains("not initialized")));
    assert!(err.is_persistence());
    assert_eq!(fs::read(store.path()).unwrap(), b"good");
}

#[test]
fn unwritable_target_fails_without_leaving_partial_files() {
    let dir = TempDir::new().unwrap();
    // A non-empty directory sits where the model file should go.
    let target = dir.path().join("face_model.bin");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep"), b"x").unwrap();

    let store = ModelStore::new(dir.path(), "face_model.bin");
    let err = store.save(&ModelState::new(b"new".to_vec())).unwrap_err();
    assert!(matches!(err, VisageError::Persistence { .. }));
    assert!(leftover_temp_files(&dir, "face_model.bin").is_empty());
    assert_eq!(fs::read(target.join("keep")).unwrap(), b"x");
}

#[test]
fn storage_dir_that_is_a_file_fails() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("models");
    fs::write(&blocker, b"not a directory").unwrap();

    let store = ModelStore::new(&blocker, "face_model.bin");
    let err = store.save(&ModelState::new(b"new".to_vec())).unwrap_err();
    assert!(matches!(err, VisageError::Persistence { .. }));
    assert_eq!(fs::read(&blocker).unwrap(), b"not a directory");
}

#[cfg(unix)]
#[test]
fn failed_write_keeps_previous_model() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let models = dir.path().join("models");
    let store = ModelStore::new(&models, "face_model.bin");
    store.save(&ModelState::new(b"good".to_vec())).unwrap();

    fs::set_permissions(&models, fs::Permissions::from_mode(0o555)).unwrap();
    let result = store.save(&ModelState::new(b"replacement".to_vec()));
    fs::set_permissions(&models, fs::Permissions::from_mode(0o755)).unwrap();

    let err = match result {
        Err(err) => err,
        // Privileged users can write into read-only directories.
        Ok(_) => return,
    };
    assert!(matches!(err, VisageError::Persistence { ref path, .. } if path == &models));
    assert_eq!(fs::read(store.path()).unwrap(), b"good");
    assert_eq!(store.load().unwrap(), Some(ModelState::new(b"good".to_vec())));
    assert_eq!(
        fs::read_dir(&models).unwrap().count(),
        1,
        "no temporary files left behind"
    );
}

#[test]
fn failed_publish_keeps_previous_model() {
    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path(), "face_model.bin");
    store.save(&ModelState::new(b"good".to_vec())).unwrap();

    // A sibling store whose target is a non-empty directory fails at the
    // rename step, after its temporary file is fully written.
    let blocked = dir.path().join("blocked.bin");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("keep"), b"x").unwrap();
    let sibling = ModelStore::new(dir.path(), "blocked.bin");
    let err = sibling.save(&ModelState::new(b"new".to_vec())).unwrap_err();
    assert!(matches!(err, VisageError::Persistence { ref path, .. } if path == &blocked));

    assert_eq!(fs::read(store.path()).unwrap(), b"good");
    let mut names = leftover_temp_files(&dir, "face_model.bin");
    names.sort();
    assert_eq!(names, vec!["blocked.bin".to_string()]);
}

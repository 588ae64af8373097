use api::GeometrySnapshot;
use std::sync::{Arc, RwLock};

/// Latest geometry handed from the tracker to the frame path.
///
/// Snapshots are published whole and never mutated afterwards; readers get
/// their own `Arc` and hold no lock while drawing.
#[derive(Debug, Default, Clone)]
pub struct SnapshotSlot {
    latest: Arc<RwLock<Option<Arc<GeometrySnapshot>>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: GeometrySnapshot) {
        self.store(Some(Arc::new(snapshot)));
    }

    /// Face lost: the next frames pass through untouched.
    pub fn clear(&self) {
        self.store(None);
    }

    /// `Some` publishes, `None` clears.
    pub fn update(&self, snapshot: Option<GeometrySnapshot>) {
        self.store(snapshot.map(Arc::new));
    }

    pub fn latest(&self) -> Option<Arc<GeometrySnapshot>> {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, value: Option<Arc<GeometrySnapshot>>) {
        match self.latest.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

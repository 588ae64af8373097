use std::path::PathBuf;

/// Errors surfaced by the overlay filter's control operations.
///
/// Rendering never fails; malformed geometry is skipped where it is found.
#[derive(Debug, thiserror::Error)]
pub enum VisageError {
    #[error("Invalid view mode: {0}")]
    InvalidMode(String),
    #[error("Failed to persist model to {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to capture model state: {0}")]
    Capture(String),
    #[error("No model source attached to the filter")]
    NoModelSource,
}

impl VisageError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure happened while saving or capturing the model.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. } | Self::Capture(_) | Self::NoModelSource
        )
    }
}

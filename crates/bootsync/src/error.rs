use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the [crate::synchronizer::Synchronizer].
///
/// [SyncError::MissingResource] and [SyncError::MalformedInput] only occur while loading and
/// are fatal for the process. Setter rejections and [SyncError::PersistenceFailure] are
/// returned to the caller of the failed operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A source file could not be read.
    #[error("unable to read {}", path.display())]
    MissingResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is structurally invalid.
    #[error("malformed content in {}", path.display())]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Writing through the regeneration executor failed.
    #[error("unable to persist {target}")]
    PersistenceFailure {
        target: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The regeneration worker could not be started.
    #[error("unable to start the regeneration worker")]
    Worker(#[source] std::io::Error),

    /// The requested default entry is not a top-level menu entry.
    #[error("'{0}' is not a top-level menu entry")]
    UnknownEntry(String),

    /// The requested timeout is out of range.
    #[error("invalid timeout {0}, expected -2 (disabled), -1 (wait) or a number of seconds")]
    InvalidTimeout(i32),

    /// The boot menu contains no selectable entries.
    #[error("there is no menu entry in the boot menu")]
    NoEntries,
}

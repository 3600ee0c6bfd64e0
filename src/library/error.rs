use std::path::PathBuf;

use thiserror::Error;

use super::fcl::FclError;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Errors raised by library edits and restores.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("cannot restore library directory contents from {snapshot:?}: {source}")]
    SnapshotRestoreFailed {
        snapshot: PathBuf,
        source: std::io::Error,
    },
    #[error("the library directory is not configured")]
    LibraryDirUnset,
    #[error("the handle refers to a library tree that has since been rebuilt")]
    StaleHandle,
    #[error("{0}")]
    IllegalLibraryAccess(String),
    #[error("invalid name: {0}")]
    IllegalName(String),
    #[error("invalid key: {0}")]
    IllegalKey(String),
    #[error("no macro with key {0:?}")]
    MacroNotFound(String),
    #[error("no library file {0:?}")]
    LibraryNotFound(String),
    #[error("no category {0:?}")]
    CategoryNotFound(String),
    #[error("could not generate a unique macro key")]
    KeyGenerationFailed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fcl(#[from] FclError),
}

//! Putting a library snapshot back in place.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::{LibraryError, Result};
use super::model::LibraryModel;
use super::snapshot::{FsSnapshotStore, SnapshotStore};
use crate::config::AppConfig;
use crate::history::LibraryUndoListener;

/// Tells where the live library directory is.
pub trait LibraryDirResolver {
    fn library_dir(&self) -> Result<PathBuf>;
}

impl LibraryDirResolver for Path {
    fn library_dir(&self) -> Result<PathBuf> {
        if self.as_os_str().is_empty() {
            return Err(LibraryError::LibraryDirUnset);
        }
        Ok(self.to_path_buf())
    }
}

impl LibraryDirResolver for PathBuf {
    fn library_dir(&self) -> Result<PathBuf> {
        self.as_path().library_dir()
    }
}

impl LibraryDirResolver for AppConfig {
    /// The configured directory, or the default one when none is set.
    fn library_dir(&self) -> Result<PathBuf> {
        match &self.data.library_dir {
            Some(dir) => dir.library_dir(),
            None => Ok(crate::paths::default_library_dir()),
        }
    }
}

/// Whatever else has to re-read the library files once they change on disk.
pub trait LibraryReload {
    fn load_libraries(&mut self, library_dir: &Path);
}

/// Restores library snapshots over the live library directory.
///
/// The copy only overwrites: files that exist in the live directory but
/// not in the snapshot are left where they are. A failed copy is not rolled
/// back, so the directory may end up holding a mix of both states.
pub struct LibraryUndoExecutor<S: SnapshotStore = FsSnapshotStore> {
    store: S,
    reload: Option<Box<dyn LibraryReload + Send + Sync>>,
}

impl Default for LibraryUndoExecutor {
    fn default() -> Self {
        Self::new(FsSnapshotStore)
    }
}

impl<S: SnapshotStore> LibraryUndoExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            reload: None,
        }
    }

    /// Also run `reload` after each successful restore.
    pub fn with_reload(mut self, reload: Box<dyn LibraryReload + Send + Sync>) -> Self {
        self.reload = Some(reload);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Copy `snapshot` over the live library directory, then reload the
    /// libraries and rebuild `model`.
    pub fn try_undo_library(
        &mut self,
        snapshot: &Path,
        resolver: &dyn LibraryDirResolver,
        model: &mut LibraryModel,
    ) -> Result<()> {
        let library_dir = resolver.library_dir()?;

        self.store
            .copy_directory(snapshot, &library_dir)
            .map_err(|source| LibraryError::SnapshotRestoreFailed {
                snapshot: snapshot.to_path_buf(),
                source,
            })?;

        if let Some(reload) = self.reload.as_mut() {
            reload.load_libraries(&library_dir);
        }

        if model.library_dir() == library_dir.as_path() {
            model.force_update();
        } else {
            model.set_library_dir(library_dir);
        }

        info!("Restored libraries from {:?}", snapshot);
        Ok(())
    }

    /// Same as [`try_undo_library`](Self::try_undo_library), logging the
    /// failure instead of returning it. Returns whether the restore happened.
    pub fn undo_library(
        &mut self,
        snapshot: &Path,
        resolver: &dyn LibraryDirResolver,
        model: &mut LibraryModel,
    ) -> bool {
        match self.try_undo_library(snapshot, resolver, model) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cannot restore library directory contents: {}", e);
                false
            }
        }
    }

    /// Bind the executor to a model so it can serve as the library undo
    /// listener of an undo session.
    pub fn restorer<'a>(
        &'a mut self,
        resolver: &'a dyn LibraryDirResolver,
        model: &'a mut LibraryModel,
    ) -> LibraryRestorer<'a, S> {
        LibraryRestorer {
            executor: self,
            resolver,
            model,
            restored: 0,
        }
    }
}

/// [`LibraryUndoListener`] backed by a [`LibraryUndoExecutor`].
pub struct LibraryRestorer<'a, S: SnapshotStore = FsSnapshotStore> {
    executor: &'a mut LibraryUndoExecutor<S>,
    resolver: &'a dyn LibraryDirResolver,
    model: &'a mut LibraryModel,
    restored: usize,
}

impl<S: SnapshotStore> LibraryRestorer<'_, S> {
    /// Number of snapshots successfully restored through this restorer
    pub fn restored(&self) -> usize {
        self.restored
    }
}

impl<S: SnapshotStore> LibraryUndoListener for LibraryRestorer<'_, S> {
    fn undo_library(&mut self, snapshot: &Path) {
        if self
            .executor
            .undo_library(snapshot, self.resolver, self.model)
        {
            self.restored += 1;
        }
    }
}

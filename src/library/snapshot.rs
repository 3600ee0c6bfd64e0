//! Capturing library directory snapshots.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use super::fs_utils;
use crate::constants::{LIBRARY_EXTENSION, SNAPSHOT_DIR_PREFIX};

/// File operations needed to take and restore library snapshots.
pub trait SnapshotStore {
    /// Recursive copy, overwriting files that already exist.
    fn copy_directory(&self, source: &Path, destination: &Path) -> io::Result<()>;

    /// Flat copy of the files whose name contains `criteria`.
    fn copy_matching(&self, source: &Path, destination: &Path, criteria: &str) -> io::Result<()>;

    fn list_directory(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn delete_directory(&self, dir: &Path) -> io::Result<()>;
}

/// [`SnapshotStore`] working on the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSnapshotStore;

impl SnapshotStore for FsSnapshotStore {
    fn copy_directory(&self, source: &Path, destination: &Path) -> io::Result<()> {
        fs_utils::copy_directory(source, destination)
    }

    fn copy_matching(&self, source: &Path, destination: &Path, criteria: &str) -> io::Result<()> {
        fs_utils::copy_matching(source, destination, criteria)
    }

    fn list_directory(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        fs_utils::list_directory(dir)
    }

    fn delete_directory(&self, dir: &Path) -> io::Result<()> {
        fs_utils::delete_directory(dir)
    }
}

static SNAPSHOT_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create a fresh, empty directory below `root` to hold a snapshot.
pub fn create_snapshot_dir(root: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

    loop {
        let n = SNAPSHOT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = root.join(format!(
            "{}{}_{}_{}",
            SNAPSHOT_DIR_PREFIX,
            stamp,
            std::process::id(),
            n
        ));
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Copy the library files of `library_dir` into a new snapshot below `root`.
pub fn capture_library_snapshot(
    store: &dyn SnapshotStore,
    library_dir: &Path,
    root: &Path,
) -> io::Result<PathBuf> {
    let dir = create_snapshot_dir(root)?;
    if let Err(e) = store.copy_matching(library_dir, &dir, LIBRARY_EXTENSION) {
        // Don't leave half a snapshot behind.
        let _ = store.delete_directory(&dir);
        return Err(e);
    }
    debug!("Captured library snapshot {:?} from {:?}", dir, library_dir);
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_dirs_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = create_snapshot_dir(root.path()).unwrap();
        let b = create_snapshot_dir(root.path()).unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir());
        assert!(b.is_dir());
    }

    #[test]
    fn test_capture_copies_library_files_only() {
        let libs = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        std::fs::write(libs.path().join("mysym.fcl"), "[FIDOLIB My]\n").unwrap();
        std::fs::write(libs.path().join("notes.txt"), "x").unwrap();

        let snapshot = capture_library_snapshot(&FsSnapshotStore, libs.path(), root.path()).unwrap();

        let files = FsSnapshotStore.list_directory(&snapshot).unwrap();
        assert_eq!(files, vec![snapshot.join("mysym.fcl")]);
    }
}

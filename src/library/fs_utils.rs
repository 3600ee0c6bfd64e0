//! File and directory copy helpers used by library snapshots.

use std::io;
use std::path::{Path, PathBuf};

/// Copy `source` onto `destination` recursively.
///
/// Existing files are overwritten, files only present in `destination` are
/// left alone. The copy stops at the first error without undoing what was
/// already copied.
pub fn copy_directory(source: &Path, destination: &Path) -> io::Result<()> {
    if !source.is_dir() {
        return copy_file(source, destination);
    }

    if !destination.exists() {
        std::fs::create_dir_all(destination)?;
    }

    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        copy_directory(&entry.path(), &destination.join(entry.file_name()))?;
    }
    Ok(())
}

/// Copy a single file. Directories are skipped.
pub fn copy_file(source: &Path, destination: &Path) -> io::Result<()> {
    if source.is_dir() {
        return Ok(());
    }
    std::fs::copy(source, destination)?;
    Ok(())
}

/// Copy the files directly inside `source` whose name contains `criteria`
/// (case-insensitive). Sub-directories are not visited.
pub fn copy_matching(source: &Path, destination: &Path, criteria: &str) -> io::Result<()> {
    if !source.is_dir() {
        return Ok(());
    }

    if !destination.exists() {
        std::fs::create_dir_all(destination)?;
    }

    let criteria = criteria.to_lowercase();
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().to_lowercase().contains(&criteria) {
            copy_file(&entry.path(), &destination.join(&name))?;
        }
    }
    Ok(())
}

/// Entries of a directory, sorted by path.
pub fn list_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// Delete a directory and everything below it. A missing directory is fine.
pub fn delete_directory(dir: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_directory_recursive_overwrites() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::create_dir(src.path().join("sub")).unwrap();
        std::fs::write(src.path().join("a.fcl"), "new").unwrap();
        std::fs::write(src.path().join("sub").join("b.fcl"), "nested").unwrap();
        std::fs::write(dst.path().join("a.fcl"), "old").unwrap();
        std::fs::write(dst.path().join("keep.fcl"), "kept").unwrap();

        copy_directory(src.path(), dst.path()).unwrap();

        assert_eq!(std::fs::read_to_string(dst.path().join("a.fcl")).unwrap(), "new");
        assert_eq!(
            std::fs::read_to_string(dst.path().join("sub").join("b.fcl")).unwrap(),
            "nested"
        );
        assert_eq!(std::fs::read_to_string(dst.path().join("keep.fcl")).unwrap(), "kept");
    }

    #[test]
    fn test_copy_directory_missing_source_fails() {
        let dst = tempfile::tempdir().unwrap();
        let missing = dst.path().join("does-not-exist");
        assert!(copy_directory(&missing, &dst.path().join("out")).is_err());
    }

    #[test]
    fn test_copy_matching_is_flat_and_filtered() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::write(src.path().join("one.fcl"), "1").unwrap();
        std::fs::write(src.path().join("TWO.FCL"), "2").unwrap();
        std::fs::write(src.path().join("readme.txt"), "x").unwrap();
        std::fs::create_dir(src.path().join("nested.fcl.d")).unwrap();

        copy_matching(src.path(), dst.path(), "fcl").unwrap();

        let names: Vec<String> = list_directory(dst.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["TWO.FCL".to_string(), "one.fcl".to_string()]);
    }

    #[test]
    fn test_delete_missing_directory_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(delete_directory(&dir.path().join("gone")).is_ok());
    }
}

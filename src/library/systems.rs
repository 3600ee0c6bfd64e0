//! Bevy systems for loading, editing and restoring the libraries.

use std::path::{Path, PathBuf};

use bevy::prelude::*;

use super::error::{LibraryError, Result};
use super::model::{CategoryHandle, LibraryHandle, LibraryModel};
use super::snapshot::{SnapshotStore, capture_library_snapshot};
use super::undo_executor::LibraryDirResolver;
use super::{Libraries, LibraryEdit, LibraryReloaded, LibraryUndo, LibraryUndoRequest};
use crate::config::{AppConfig, SetLibraryDirRequest};
use crate::history::{DrawingRestored, UndoSession};

fn find_library(model: &LibraryModel, filename: &str) -> Result<LibraryHandle> {
    model
        .library_handle(filename)
        .ok_or_else(|| LibraryError::LibraryNotFound(filename.to_string()))
}

fn find_category(model: &LibraryModel, filename: &str, category: &str) -> Result<CategoryHandle> {
    let library = find_library(model, filename)?;
    model
        .category_handle(library, category)
        .ok_or_else(|| LibraryError::CategoryNotFound(category.to_string()))
}

/// Run one edit against the model.
pub fn apply_edit(model: &mut LibraryModel, edit: &LibraryEdit) -> Result<()> {
    match edit {
        LibraryEdit::RemoveLibrary { filename } => {
            let handle = find_library(model, filename)?;
            model.remove_library(handle)
        }
        LibraryEdit::RemoveCategory { filename, category } => {
            let handle = find_category(model, filename, category)?;
            model.remove_category(handle)
        }
        LibraryEdit::RemoveMacro { key } => model.remove_macro(key),
        LibraryEdit::RenameLibrary { filename, name } => {
            let handle = find_library(model, filename)?;
            model.rename_library(handle, name)
        }
        LibraryEdit::RenameCategory {
            filename,
            category,
            name,
        } => {
            let handle = find_category(model, filename, category)?;
            model.rename_category(handle, name)
        }
        LibraryEdit::RenameMacro { key, name } => model.rename_macro(key, name),
        LibraryEdit::CopyMacro {
            key,
            filename,
            category,
        } => {
            let handle = find_category(model, filename, category)?;
            model.copy_macro(key, handle).map(|_| ())
        }
        LibraryEdit::CopyCategory {
            from_filename,
            category,
            to_filename,
        } => {
            let source = find_category(model, from_filename, category)?;
            let destination = find_library(model, to_filename)?;
            model.copy_category(source, destination).map(|_| ())
        }
        LibraryEdit::ChangeKey { key, new_key } => model.change_key(key, new_key),
    }
}

/// Snapshot the untouched libraries once per session, so the first library
/// edit can be undone too.
fn record_baseline(
    model: &LibraryModel,
    store: &dyn SnapshotStore,
    snapshot_root: &Path,
    session: &mut UndoSession,
) {
    if session.library_snapshot().is_some() {
        return;
    }
    match capture_library_snapshot(store, model.library_dir(), snapshot_root) {
        Ok(dir) => {
            if !session.set_library_baseline(dir.clone()) {
                warn!("Library baseline {:?} was not recorded", dir);
            }
        }
        Err(e) => warn!("Cannot save the library state: {}", e),
    }
}

fn resolve_library_dir(config: Option<&AppConfig>, fallback: &LibraryModel) -> PathBuf {
    let Some(config) = config else {
        return fallback.library_dir().to_path_buf();
    };
    match config.library_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!("{}, using {:?}", e, fallback.library_dir());
            fallback.library_dir().to_path_buf()
        }
    }
}

/// Startup system to load the libraries from the configured directory
pub fn load_libraries(
    config: Option<Res<AppConfig>>,
    mut libraries: ResMut<Libraries>,
    mut reloaded: MessageWriter<LibraryReloaded>,
) {
    let dir = resolve_library_dir(config.as_deref(), &libraries.0);
    libraries.0.set_library_dir(dir);
    reloaded.write(LibraryReloaded {
        generation: libraries.0.generation(),
    });
}

/// System to reload the libraries when the library directory changes
pub fn follow_library_dir(
    mut events: MessageReader<SetLibraryDirRequest>,
    mut libraries: ResMut<Libraries>,
    mut reloaded: MessageWriter<LibraryReloaded>,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    libraries.0.set_library_dir(event.path.clone());
    reloaded.write(LibraryReloaded {
        generation: libraries.0.generation(),
    });
}

/// Apply `edit` and record it in `session`.
///
/// The first edit of a session snapshots the untouched libraries before
/// touching them; every applied edit records a post-edit snapshot.
pub fn record_library_edit(
    model: &mut LibraryModel,
    library_undo: &LibraryUndo,
    session: &mut UndoSession,
    edit: &LibraryEdit,
) -> Result<()> {
    let store = library_undo.executor.store();
    let root = library_undo.snapshot_root.as_path();

    record_baseline(model, store, root, session);
    apply_edit(model, edit)?;
    info!("Applied library edit {:?}", edit);
    model.save_library_state(store, root, session);
    Ok(())
}

/// System to restore a library snapshot on request
pub fn handle_library_undo(
    mut events: MessageReader<LibraryUndoRequest>,
    mut libraries: ResMut<Libraries>,
    mut library_undo: ResMut<LibraryUndo>,
    config: Option<Res<AppConfig>>,
    mut reloaded: MessageWriter<LibraryReloaded>,
) {
    let fallback = libraries.0.library_dir().to_path_buf();
    let resolver: &dyn LibraryDirResolver = match config.as_deref() {
        Some(config) => config,
        None => &fallback,
    };

    for event in events.read() {
        if library_undo
            .executor
            .undo_library(&event.snapshot, resolver, &mut libraries.0)
        {
            reloaded.write(LibraryReloaded {
                generation: libraries.0.generation(),
            });
        }
    }
}

/// System to announce rebuilds caused by undo and redo
pub fn announce_restored_libraries(
    mut events: MessageReader<DrawingRestored>,
    libraries: Res<Libraries>,
    mut reloaded: MessageWriter<LibraryReloaded>,
) {
    if events.read().filter(|e| e.libraries_restored).count() > 0 {
        reloaded.write(LibraryReloaded {
            generation: libraries.0.generation(),
        });
    }
}

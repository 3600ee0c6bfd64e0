//! Symbol libraries and their undo support.
//!
//! Libraries live in `.fcl` files inside one library directory. The
//! [`LibraryModel`] indexes them as libraries, categories and macros and is
//! rebuilt from disk whenever the files change underneath it.
//!
//! Before an edit touches the library files, a copy of them is taken into a
//! snapshot directory. Undoing the edit copies that snapshot back over the
//! library directory ([`LibraryUndoExecutor`]) and rebuilds the model.

pub mod category;
pub mod error;
pub mod events;
pub mod fcl;
pub mod fs_utils;
pub mod macro_desc;
pub mod model;
pub mod snapshot;
pub mod symbol_library;
pub mod systems;
pub mod undo_executor;


use std::path::PathBuf;

use bevy::prelude::*;

use crate::config::{ConfigLoaded, SetLibraryDirRequest};
use crate::history::DrawingRestored;

// Re-exports
pub use category::Category;
pub use error::{LibraryError, Result};
pub use events::{LibraryEvent, LibraryListener, LibraryNode};
pub use macro_desc::MacroDesc;
pub use model::{CategoryHandle, LibraryHandle, LibraryModel, ListenerId};
pub use snapshot::{FsSnapshotStore, SnapshotStore};
pub use symbol_library::Library;
pub use undo_executor::{LibraryDirResolver, LibraryReload, LibraryRestorer, LibraryUndoExecutor};

/// Resource holding the library model
#[derive(Resource, Debug)]
pub struct Libraries(pub LibraryModel);

impl Default for Libraries {
    fn default() -> Self {
        Self(LibraryModel::from_macros(
            crate::paths::default_library_dir(),
            Vec::new(),
        ))
    }
}

/// Resource for restoring and taking library snapshots
#[derive(Resource)]
pub struct LibraryUndo {
    pub executor: LibraryUndoExecutor,
    /// Directory below which snapshots are created
    pub snapshot_root: PathBuf,
}

impl Default for LibraryUndo {
    fn default() -> Self {
        Self {
            executor: LibraryUndoExecutor::default(),
            snapshot_root: crate::paths::snapshot_root(),
        }
    }
}

/// An edit on the libraries, sent through
/// [`HistoryRequest::EditLibrary`](crate::history::HistoryRequest). Libraries
/// are named by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEdit {
    RemoveLibrary {
        filename: String,
    },
    RemoveCategory {
        filename: String,
        category: String,
    },
    RemoveMacro {
        key: String,
    },
    RenameLibrary {
        filename: String,
        name: String,
    },
    RenameCategory {
        filename: String,
        category: String,
        name: String,
    },
    RenameMacro {
        key: String,
        name: String,
    },
    CopyMacro {
        key: String,
        filename: String,
        category: String,
    },
    CopyCategory {
        from_filename: String,
        category: String,
        to_filename: String,
    },
    ChangeKey {
        key: String,
        new_key: String,
    },
}

/// Message to put a library snapshot back in place right away
#[derive(Message, Debug, Clone)]
pub struct LibraryUndoRequest {
    pub snapshot: PathBuf,
}

/// Sent whenever the library model was rebuilt from disk
#[derive(Message, Debug, Clone, Copy)]
pub struct LibraryReloaded {
    pub generation: u64,
}

pub struct LibraryPlugin;

impl Plugin for LibraryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Libraries>()
            .init_resource::<LibraryUndo>()
            .add_message::<LibraryUndoRequest>()
            .add_message::<LibraryReloaded>()
            .add_message::<DrawingRestored>()
            .add_message::<SetLibraryDirRequest>()
            .add_systems(Startup, systems::load_libraries.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    systems::follow_library_dir.run_if(on_message::<SetLibraryDirRequest>),
                    systems::handle_library_undo.run_if(on_message::<LibraryUndoRequest>),
                    systems::announce_restored_libraries.run_if(on_message::<DrawingRestored>),
                ),
            );
    }
}

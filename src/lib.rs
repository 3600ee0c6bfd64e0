//! Undo/redo core of a schematic editor.
//!
//! Two tiers work together:
//!
//! - [`history`] keeps a bounded history of drawing states with a cursor.
//! - [`library`] snapshots the symbol library directory before edits and
//!   copies a snapshot back when such an edit is undone, rebuilding the
//!   library model afterwards.
//!
//! Both are plain Rust types. The Bevy plugins in each module wire them to
//! messages for use inside an app.

pub mod config;
pub mod constants;
pub mod history;
pub mod library;
pub mod logging;
pub mod paths;

use bevy::prelude::*;

pub use history::{HistoryBuffer, HistoryError, UndoSession, UndoState};
pub use library::{Category, Library, LibraryError, LibraryModel, LibraryUndoExecutor};

/// Config, history and library plugins in one.
pub struct SchematicUndoPlugin;

impl Plugin for SchematicUndoPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(config::ConfigPlugin)
            .add_plugins(history::HistoryPlugin)
            .add_plugins(library::LibraryPlugin);
    }
}

//! Undo/Redo history of the drawing.
//!
//! Every edit of the drawing records a full [`UndoState`] in a bounded
//! [`HistoryBuffer`]. Edits on the symbol libraries record a state as well,
//! pointing at a snapshot of the library directory; stepping over such a
//! state restores the libraries through a [`LibraryUndoListener`].
//!
//! ## Module Structure
//!
//! - [`buffer`] - HistoryBuffer, the bounded cursor-based history
//! - [`undo_state`] - UndoState records kept in the history
//! - [`session`] - UndoSession tying the history to library snapshots
//! - [`messages`] - HistoryRequest and DrawingRestored messages
//! - [`systems`] - Bevy systems answering those messages

pub mod buffer;
pub mod messages;
pub mod session;
pub mod systems;
pub mod undo_state;

#[cfg(test)]
mod tests;

use bevy::prelude::*;

use crate::config::ConfigLoaded;

// Re-exports
pub use buffer::{HistoryBuffer, HistoryError, Result};
pub use messages::{DrawingRestored, HistoryRequest};
pub use session::{LibraryUndoListener, UndoActor, UndoSession};
pub use undo_state::UndoState;

/// Resource holding the undo session of the open drawing
#[derive(Resource, Debug, Default)]
pub struct DrawingHistory(pub UndoSession);

pub struct HistoryPlugin;

impl Plugin for HistoryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DrawingHistory>()
            .add_message::<HistoryRequest>()
            .add_message::<DrawingRestored>()
            .add_message::<AppExit>()
            .add_systems(Startup, systems::configure_history.after(ConfigLoaded))
            .add_systems(
                Update,
                systems::handle_history_requests.run_if(on_message::<HistoryRequest>),
            )
            .add_systems(Last, systems::cleanup_on_exit.run_if(on_message::<AppExit>));
    }
}

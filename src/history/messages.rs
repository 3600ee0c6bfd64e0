//! Messages exchanged with the drawing history.

use bevy::prelude::*;

use super::undo_state::UndoState;
use crate::library::LibraryEdit;

/// A request on the drawing history.
///
/// All history operations travel in this one message so they are applied
/// in the order they were written, within a frame as well as across frames.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum HistoryRequest {
    /// Record the drawing after an edit, given as its textual description
    Save { text: String },
    /// Forget the history, e.g. after a new drawing was opened
    Reset { text: String },
    Undo,
    Redo,
    /// Edit the libraries and record the edit
    EditLibrary(LibraryEdit),
    /// Delete the library snapshots recorded so far
    Cleanup,
}

impl HistoryRequest {
    pub fn save(text: impl Into<String>) -> Self {
        Self::Save { text: text.into() }
    }

    pub fn reset(text: impl Into<String>) -> Self {
        Self::Reset { text: text.into() }
    }
}

/// Sent after an undo or redo; the editor redraws from `state`.
#[derive(Message, Debug, Clone)]
pub struct DrawingRestored {
    pub state: UndoState,
    /// Whether library snapshots were put back along the way
    pub libraries_restored: bool,
}

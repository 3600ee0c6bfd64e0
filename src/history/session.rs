//! Editor-level undo controller tying the drawing history to library snapshots.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::buffer::{HistoryBuffer, Result};
use super::undo_state::UndoState;
use crate::constants::DEFAULT_UNDO_LEVELS;

/// Receives the request to put a library snapshot back in place.
pub trait LibraryUndoListener {
    /// Restore the library directory from `snapshot`.
    fn undo_library(&mut self, snapshot: &Path);
}

/// Receives the snapshot taken after an edit on the libraries.
pub trait UndoActor {
    fn save_undo_library(&mut self, snapshot: PathBuf);
}

/// Undo state of one editing session.
///
/// Owns the drawing history, the modified flag and file name that travel
/// with it, and every library snapshot directory recorded so far.
#[derive(Debug, Clone)]
pub struct UndoSession {
    history: HistoryBuffer<UndoState>,
    temp_dirs: Vec<PathBuf>,
    modified: bool,
    file_name: String,
    library_snapshot: Option<PathBuf>,
}

impl Default for UndoSession {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LEVELS, String::new())
    }
}

impl UndoSession {
    /// Start a session whose history keeps `capacity` states, the first one
    /// being the drawing described by `text`.
    pub fn new(capacity: usize, text: impl Into<String>) -> Self {
        Self {
            history: HistoryBuffer::new(capacity, UndoState::drawing(text)),
            temp_dirs: Vec::new(),
            modified: false,
            file_name: String::new(),
            library_snapshot: None,
        }
    }

    /// Forget the whole history, keeping `text` as the only state.
    pub fn reset(&mut self, text: impl Into<String>) {
        let mut baseline = UndoState::drawing(text);
        baseline.file_name = self.file_name.clone();
        baseline.library_dir = self.library_snapshot.clone();
        let dropped = self.history.reset(baseline);
        self.release_snapshots(dropped);
        self.modified = false;
    }

    /// Record the drawing after an edit.
    pub fn save_undo_state(&mut self, text: impl Into<String>) {
        let state = UndoState {
            text: text.into(),
            is_modified: self.modified,
            file_name: self.file_name.clone(),
            library_operation: false,
            library_dir: self.library_snapshot.clone(),
        };
        let dropped = self.history.push(state);
        self.release_snapshots(dropped);
        self.modified = true;
        debug!("Saved undo state ({} in history)", self.history.len());
    }

    /// Attach a snapshot of the untouched libraries to the active state.
    ///
    /// Only the first snapshot of a session is taken as baseline; returns
    /// false when one is already known.
    pub fn set_library_baseline(&mut self, snapshot: PathBuf) -> bool {
        if self.library_snapshot.is_some() {
            return false;
        }
        let Some(current) = self.history.current() else {
            return false;
        };
        let updated = current.with_library_dir(snapshot.clone());
        if self.history.replace_current(updated).is_err() {
            return false;
        }
        self.temp_dirs.push(snapshot.clone());
        self.library_snapshot = Some(snapshot);
        true
    }

    /// Whether the state right after the cursor was produced by a library edit.
    pub fn is_next_operation_on_library(&self) -> bool {
        self.history
            .peek_next()
            .is_some_and(|state| state.library_operation)
    }

    /// Step back one state.
    ///
    /// When the state being left was a library edit, the libraries are
    /// restored to the snapshot of the returned state through `listener`.
    /// The caller redraws from the returned state.
    pub fn undo(&mut self, listener: Option<&mut dyn LibraryUndoListener>) -> Result<UndoState> {
        let state = self.history.undo()?.clone();

        if self.is_next_operation_on_library() {
            restore_libraries(&state, listener);
        }

        self.apply(&state);
        Ok(state)
    }

    /// Step forward one state, replaying its library snapshot if it has one.
    pub fn redo(&mut self, listener: Option<&mut dyn LibraryUndoListener>) -> Result<UndoState> {
        let state = self.history.redo()?.clone();

        if state.library_operation {
            restore_libraries(&state, listener);
        }

        self.apply(&state);
        Ok(state)
    }

    fn apply(&mut self, state: &UndoState) {
        self.modified = state.is_modified;
        self.file_name = state.file_name.clone();
        if state.library_dir.is_some() {
            self.library_snapshot = state.library_dir.clone();
        }
    }

    /// Delete the snapshot directories of records that left the history,
    /// unless a retained record or the live libraries still refer to them.
    fn release_snapshots(&mut self, dropped: Vec<UndoState>) {
        for dir in dropped.into_iter().filter_map(|state| state.library_dir) {
            if self.is_snapshot_referenced(&dir) {
                continue;
            }
            let Some(index) = self.temp_dirs.iter().position(|d| *d == dir) else {
                continue;
            };
            self.temp_dirs.swap_remove(index);
            delete_snapshot_dir(&dir);
            debug!("Released library snapshot {:?}", dir);
        }
    }

    fn is_snapshot_referenced(&self, dir: &Path) -> bool {
        self.library_snapshot.as_deref() == Some(dir)
            || self
                .history
                .iter()
                .any(|state| state.library_dir.as_deref() == Some(dir))
    }

    /// Delete every library snapshot directory created during the session.
    pub fn clean_temporary_dirs(&mut self) {
        let count = self.temp_dirs.len();
        for dir in self.temp_dirs.drain(..) {
            delete_snapshot_dir(&dir);
        }
        if count > 0 {
            info!("Cleaned {} library snapshot(s)", count);
        }
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
    }

    /// The library snapshot matching the current library contents, if any
    pub fn library_snapshot(&self) -> Option<&Path> {
        self.library_snapshot.as_deref()
    }

    /// Snapshot directories owned by this session
    pub fn temp_dirs(&self) -> &[PathBuf] {
        &self.temp_dirs
    }

    pub fn history(&self) -> &HistoryBuffer<UndoState> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl UndoActor for UndoSession {
    /// Record an edit on the libraries. The drawing is untouched by such an
    /// edit, so the active drawing text is carried over.
    fn save_undo_library(&mut self, snapshot: PathBuf) {
        let text = self
            .history
            .current()
            .map(|state| state.text.clone())
            .unwrap_or_default();

        self.temp_dirs.push(snapshot.clone());
        self.library_snapshot = Some(snapshot.clone());

        let dropped = self.history.push(UndoState {
            text,
            is_modified: self.modified,
            file_name: self.file_name.clone(),
            library_operation: true,
            library_dir: Some(snapshot),
        });
        self.release_snapshots(dropped);
        debug!("Saved library undo state ({} in history)", self.history.len());
    }
}

fn delete_snapshot_dir(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dir) {
        warn!("Failed to delete snapshot directory {:?}: {}", dir, e);
    }
}

fn restore_libraries(state: &UndoState, listener: Option<&mut dyn LibraryUndoListener>) {
    match (listener, state.library_dir.as_deref()) {
        (Some(listener), Some(dir)) => listener.undo_library(dir),
        (Some(_), None) => warn!("No library snapshot recorded for this state"),
        (None, _) => {}
    }
}

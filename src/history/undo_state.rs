//! Snapshot record pushed into the drawing history.

use std::fmt;
use std::path::PathBuf;

/// State of the editor at one point of the history.
///
/// The drawing is kept as its textual description; the history never looks
/// inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoState {
    /// Textual description of the drawing
    pub text: String,
    /// Whether the drawing had unsaved changes
    pub is_modified: bool,
    /// File name of the drawing
    pub file_name: String,
    /// True if this record was produced by an edit on the libraries
    pub library_operation: bool,
    /// Snapshot of the library directory that was current for this record
    pub library_dir: Option<PathBuf>,
}

impl UndoState {
    /// Record of a plain drawing edit
    pub fn drawing(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Copy of this record pointing at another library snapshot
    pub fn with_library_dir(&self, dir: PathBuf) -> Self {
        Self {
            library_dir: Some(dir),
            ..self.clone()
        }
    }
}

impl fmt::Display for UndoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file={:?} modified={} library_operation={} library_dir={:?} ({} bytes)",
            self.file_name,
            self.is_modified,
            self.library_operation,
            self.library_dir,
            self.text.len()
        )
    }
}

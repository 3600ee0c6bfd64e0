//! Bevy systems driving the drawing history.

use std::path::PathBuf;

use bevy::prelude::*;

use super::buffer::Result;
use super::messages::{DrawingRestored, HistoryRequest};
use super::session::UndoSession;
use super::undo_state::UndoState;
use super::DrawingHistory;
use crate::config::AppConfig;
use crate::library::systems::record_library_edit;
use crate::library::{
    Libraries, LibraryDirResolver, LibraryEdit, LibraryModel, LibraryUndo, LibraryUndoExecutor,
};

#[derive(Debug, Clone, Copy)]
enum Step {
    Undo,
    Redo,
}

/// Move through the history, restoring library snapshots when both the
/// model and the executor are available. Returns the new state and whether
/// any library snapshot was restored.
fn step(
    session: &mut UndoSession,
    direction: Step,
    libraries: Option<&mut LibraryModel>,
    executor: Option<&mut LibraryUndoExecutor>,
    resolver: &dyn LibraryDirResolver,
) -> Result<(UndoState, bool)> {
    match (libraries, executor) {
        (Some(model), Some(executor)) => {
            let mut restorer = executor.restorer(resolver, model);
            let state = match direction {
                Step::Undo => session.undo(Some(&mut restorer))?,
                Step::Redo => session.redo(Some(&mut restorer))?,
            };
            Ok((state, restorer.restored() > 0))
        }
        _ => {
            let state = match direction {
                Step::Undo => session.undo(None)?,
                Step::Redo => session.redo(None)?,
            };
            Ok((state, false))
        }
    }
}

fn run_step(
    direction: Step,
    history: &mut DrawingHistory,
    libraries: Option<&mut Libraries>,
    library_undo: Option<&mut LibraryUndo>,
    config: Option<&AppConfig>,
    restored: &mut MessageWriter<DrawingRestored>,
) {
    let fallback: PathBuf = libraries
        .as_deref()
        .map(|l| l.0.library_dir().to_path_buf())
        .unwrap_or_default();
    let resolver: &dyn LibraryDirResolver = match config {
        Some(config) => config,
        None => &fallback,
    };

    let result = step(
        &mut history.0,
        direction,
        libraries.map(|l| &mut l.0),
        library_undo.map(|u| &mut u.executor),
        resolver,
    );

    match result {
        Ok((state, libraries_restored)) => {
            debug!("{:?} -> {}", direction, state);
            restored.write(DrawingRestored {
                state,
                libraries_restored,
            });
        }
        Err(e) => debug!("{:?} ignored: {}", direction, e),
    }
}

fn edit_libraries(
    session: &mut UndoSession,
    libraries: Option<&mut Libraries>,
    library_undo: Option<&LibraryUndo>,
    edit: &LibraryEdit,
) {
    let (Some(libraries), Some(library_undo)) = (libraries, library_undo) else {
        warn!("Library edit {:?} ignored: libraries are not loaded", edit);
        return;
    };
    if let Err(e) = record_library_edit(&mut libraries.0, library_undo, session, edit) {
        warn!("Library edit {:?} failed: {}", edit, e);
    }
}

/// System applying history requests in the order they were written
pub fn handle_history_requests(
    mut events: MessageReader<HistoryRequest>,
    mut history: ResMut<DrawingHistory>,
    mut libraries: Option<ResMut<Libraries>>,
    mut library_undo: Option<ResMut<LibraryUndo>>,
    config: Option<Res<AppConfig>>,
    mut restored: MessageWriter<DrawingRestored>,
) {
    for request in events.read() {
        match request {
            HistoryRequest::Save { text } => history.0.save_undo_state(text.clone()),
            HistoryRequest::Reset { text } => {
                history.0.reset(text.clone());
                info!("Undo history reset");
            }
            HistoryRequest::Undo => run_step(
                Step::Undo,
                &mut history,
                libraries.as_deref_mut(),
                library_undo.as_deref_mut(),
                config.as_deref(),
                &mut restored,
            ),
            HistoryRequest::Redo => run_step(
                Step::Redo,
                &mut history,
                libraries.as_deref_mut(),
                library_undo.as_deref_mut(),
                config.as_deref(),
                &mut restored,
            ),
            HistoryRequest::EditLibrary(edit) => edit_libraries(
                &mut history.0,
                libraries.as_deref_mut(),
                library_undo.as_deref(),
                edit,
            ),
            HistoryRequest::Cleanup => history.0.clean_temporary_dirs(),
        }
    }
}

/// System to delete the library snapshots when the app closes
pub fn cleanup_on_exit(mut exits: MessageReader<AppExit>, mut history: ResMut<DrawingHistory>) {
    if exits.read().count() > 0 {
        history.0.clean_temporary_dirs();
    }
}

/// Startup system to size the history from the configuration
pub fn configure_history(config: Option<Res<AppConfig>>, mut history: ResMut<DrawingHistory>) {
    let Some(config) = config else {
        return;
    };
    let levels = config.data.undo_levels;
    if levels != history.0.history().capacity() {
        history.0 = UndoSession::new(levels, String::new());
        info!("Undo history keeps {} states", levels);
    }
}

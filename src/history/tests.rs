//! Unit tests for the history module.

use std::path::{Path, PathBuf};

use bevy::prelude::*;

use super::buffer::{HistoryBuffer, HistoryError};
use super::messages::{DrawingRestored, HistoryRequest};
use super::session::{LibraryUndoListener, UndoActor, UndoSession};
use super::{DrawingHistory, HistoryPlugin};

fn entries(buffer: &HistoryBuffer<&'static str>) -> Vec<&'static str> {
    buffer.iter().copied().collect()
}

#[test]
fn test_new_buffer_holds_baseline() {
    let buffer = HistoryBuffer::new(5, "base");
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.pointer(), 1);
    assert_eq!(buffer.current(), Some(&"base"));
    assert!(!buffer.can_undo());
    assert!(!buffer.can_redo());
}

#[test]
fn test_zero_capacity_keeps_one_entry() {
    let mut buffer = HistoryBuffer::new(0, "a");
    assert_eq!(buffer.capacity(), 1);
    buffer.push("b");
    assert_eq!(entries(&buffer), vec!["b"]);
    assert_eq!(buffer.pointer(), 1);
}

#[test]
fn test_push_evicts_oldest_when_full() {
    let mut buffer = HistoryBuffer::new(3, "A");
    buffer.push("B");
    buffer.push("C");
    assert_eq!(buffer.pointer(), 3);

    buffer.push("D");
    assert_eq!(entries(&buffer), vec!["B", "C", "D"]);
    assert_eq!(buffer.pointer(), 3);

    assert_eq!(buffer.undo(), Ok(&"C"));
    assert_eq!(buffer.undo(), Ok(&"B"));
    // The evicted entry is gone: the cursor stays on the oldest one.
    assert_eq!(buffer.undo(), Ok(&"B"));
    assert_eq!(buffer.pointer(), 1);

    assert_eq!(buffer.redo(), Ok(&"C"));
    assert_eq!(buffer.pointer(), 2);
    assert_eq!(buffer.redo(), Ok(&"D"));
    assert_eq!(buffer.pointer(), 3);
}

#[test]
fn test_push_discards_redo_branch() {
    let mut buffer = HistoryBuffer::new(10, "A");
    buffer.push("B");
    buffer.push("C");

    assert_eq!(buffer.undo(), Ok(&"B"));
    assert!(buffer.can_redo());

    buffer.push("X");
    assert_eq!(entries(&buffer), vec!["A", "B", "X"]);
    assert!(!buffer.can_redo());
    assert_eq!(buffer.redo(), Err(HistoryError::NothingToRedo));
}

#[test]
fn test_undo_then_redo_walks_back_and_forth() {
    let states = ["s0", "s1", "s2", "s3", "s4"];
    let mut buffer = HistoryBuffer::new(10, states[0]);
    for state in &states[1..] {
        buffer.push(*state);
    }

    for k in 1..states.len() {
        let mut walk = buffer.clone();
        for _ in 0..k {
            walk.undo().unwrap();
        }
        assert_eq!(walk.current(), Some(&states[states.len() - 1 - k]));

        for _ in 0..k {
            walk.redo().unwrap();
        }
        assert_eq!(walk.current(), Some(&states[states.len() - 1]));
        assert_eq!(walk.pointer(), states.len());
    }
}

#[test]
fn test_redo_stops_at_newest_entry() {
    let mut buffer = HistoryBuffer::new(10, "A");
    buffer.push("B");
    buffer.undo().unwrap();

    assert_eq!(buffer.redo(), Ok(&"B"));
    assert_eq!(buffer.redo(), Ok(&"B"));
    assert_eq!(buffer.pointer(), 2);
}

#[test]
fn test_reset_then_undo_stays_on_baseline() {
    let mut buffer = HistoryBuffer::new(10, "A");
    buffer.push("B");
    buffer.push("C");

    buffer.reset("fresh");
    assert_eq!(entries(&buffer), vec!["fresh"]);
    assert_eq!(buffer.undo(), Ok(&"fresh"));
    assert_eq!(buffer.pointer(), 1);
}

#[test]
fn test_reset_clears_redo() {
    let mut buffer = HistoryBuffer::new(10, "A");
    buffer.push("B");
    buffer.undo().unwrap();
    assert!(buffer.can_redo());

    buffer.reset("fresh");
    assert_eq!(buffer.redo(), Err(HistoryError::NothingToRedo));
}

#[test]
fn test_replace_current() {
    let mut buffer = HistoryBuffer::new(10, "A");
    buffer.push("B");
    assert_eq!(buffer.replace_current("B2"), Ok("B"));
    assert_eq!(entries(&buffer), vec!["A", "B2"]);
}

#[test]
fn test_peek_next_sees_undone_entry() {
    let mut buffer = HistoryBuffer::new(10, "A");
    buffer.push("B");
    assert_eq!(buffer.peek_next(), None);
    buffer.undo().unwrap();
    assert_eq!(buffer.peek_next(), Some(&"B"));
}

/// Listener recording the snapshots it was asked to restore
#[derive(Default)]
struct RecordingListener {
    restored: Vec<PathBuf>,
}

impl LibraryUndoListener for RecordingListener {
    fn undo_library(&mut self, snapshot: &Path) {
        self.restored.push(snapshot.to_path_buf());
    }
}

#[test]
fn test_session_tracks_modified_flag() {
    let mut session = UndoSession::new(10, "empty");
    assert!(!session.modified());

    session.save_undo_state("one line");
    assert!(session.modified());

    let state = session.undo(None).unwrap();
    assert_eq!(state.text, "empty");
    assert!(!session.modified());

    let state = session.redo(None).unwrap();
    assert_eq!(state.text, "one line");
    assert!(!state.is_modified);
}

#[test]
fn test_session_carries_file_name() {
    let mut session = UndoSession::new(10, "");
    session.set_file_name("amp.fcd");
    session.reset("");
    session.save_undo_state("LI 0 0 10 10");
    session.set_file_name("other.fcd");

    session.undo(None).unwrap();
    assert_eq!(session.file_name(), "amp.fcd");
    assert!(!session.modified());
}

#[test]
fn test_session_restores_libraries_on_undo_and_redo() {
    let mut session = UndoSession::new(10, "drawing");
    assert!(session.set_library_baseline(PathBuf::from("/snap/before")));
    assert!(!session.set_library_baseline(PathBuf::from("/snap/ignored")));

    session.save_undo_library(PathBuf::from("/snap/after"));
    assert!(!session.is_next_operation_on_library());

    let mut listener = RecordingListener::default();
    let state = session.undo(Some(&mut listener)).unwrap();
    assert!(!state.library_operation);
    assert_eq!(state.text, "drawing");
    assert_eq!(listener.restored, vec![PathBuf::from("/snap/before")]);
    assert_eq!(session.library_snapshot(), Some(Path::new("/snap/before")));

    let state = session.redo(Some(&mut listener)).unwrap();
    assert!(state.library_operation);
    assert_eq!(
        listener.restored,
        vec![PathBuf::from("/snap/before"), PathBuf::from("/snap/after")]
    );
    assert_eq!(session.library_snapshot(), Some(Path::new("/snap/after")));
    assert_eq!(session.temp_dirs().len(), 2);
}

#[test]
fn test_session_drawing_undo_leaves_libraries_alone() {
    let mut session = UndoSession::new(10, "a");
    session.save_undo_state("b");

    let mut listener = RecordingListener::default();
    session.undo(Some(&mut listener)).unwrap();
    session.redo(Some(&mut listener)).unwrap();
    assert!(listener.restored.is_empty());
}

#[test]
fn test_clean_temporary_dirs_deletes_snapshots() {
    let root = tempfile::tempdir().unwrap();
    let snapshot = root.path().join("snap");
    std::fs::create_dir(&snapshot).unwrap();
    std::fs::write(snapshot.join("lib.fcl"), "[FIDOLIB x]").unwrap();

    let mut session = UndoSession::new(10, "");
    session.save_undo_library(snapshot.clone());
    session.save_undo_library(root.path().join("never-created"));

    session.clean_temporary_dirs();
    assert!(!snapshot.exists());
    assert!(session.temp_dirs().is_empty());
}

fn snapshot_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("lib.fcl"), "[FIDOLIB x]").unwrap();
    dir
}

#[test]
fn test_snapshot_of_discarded_redo_branch_is_deleted() {
    let root = tempfile::tempdir().unwrap();
    let first = snapshot_dir(root.path(), "first");
    let second = snapshot_dir(root.path(), "second");

    let mut session = UndoSession::new(10, "");
    session.save_undo_library(first.clone());
    session.save_undo_library(second.clone());
    session.undo(None).unwrap();

    session.save_undo_state("edit after undo");
    assert!(first.exists());
    assert!(!second.exists());
    assert_eq!(session.temp_dirs(), &[first]);
}

#[test]
fn test_snapshot_of_evicted_record_is_deleted() {
    let root = tempfile::tempdir().unwrap();
    let a = snapshot_dir(root.path(), "a");
    let b = snapshot_dir(root.path(), "b");
    let c = snapshot_dir(root.path(), "c");

    let mut session = UndoSession::new(2, "");
    session.save_undo_library(a.clone());
    session.save_undo_library(b.clone());
    assert!(a.exists());

    session.save_undo_library(c.clone());
    assert!(!a.exists());
    assert!(b.exists() && c.exists());
    assert_eq!(session.temp_dirs().len(), 2);
}

#[test]
fn test_snapshot_still_referenced_is_kept() {
    let root = tempfile::tempdir().unwrap();
    let a = snapshot_dir(root.path(), "a");

    let mut session = UndoSession::new(3, "");
    session.save_undo_library(a.clone());
    session.save_undo_state("x");
    session.save_undo_state("y");
    // Evicts the library record; the drawing records still point at `a`.
    session.save_undo_state("z");

    assert!(a.exists());
    assert_eq!(session.temp_dirs(), &[a]);
}

fn restored_texts(app: &App) -> Vec<String> {
    let messages = app.world().resource::<Messages<DrawingRestored>>();
    let mut cursor = messages.get_cursor();
    cursor.read(messages).map(|m| m.state.text.clone()).collect()
}

#[test]
fn test_history_plugin_answers_requests() {
    let mut app = App::new();
    app.add_plugins(HistoryPlugin);
    app.update();

    app.world_mut().write_message(HistoryRequest::save("first"));
    app.update();
    assert_eq!(app.world().resource::<DrawingHistory>().0.history().len(), 2);

    app.world_mut().write_message(HistoryRequest::Undo);
    app.update();
    assert_eq!(app.world().resource::<DrawingHistory>().0.history().pointer(), 1);

    app.world_mut().write_message(HistoryRequest::Redo);
    app.update();

    assert_eq!(restored_texts(&app), vec![String::new(), "first".to_string()]);
}

#[test]
fn test_requests_in_one_frame_apply_in_write_order() {
    let mut app = App::new();
    app.add_plugins(HistoryPlugin);
    app.update();

    app.world_mut().write_message(HistoryRequest::save("A"));
    app.world_mut().write_message(HistoryRequest::save("B"));
    app.update();

    // Undo then save: the save drops the undone "B".
    app.world_mut().write_message(HistoryRequest::Undo);
    app.world_mut().write_message(HistoryRequest::save("X"));
    app.update();

    let session = &app.world().resource::<DrawingHistory>().0;
    let texts: Vec<&str> = session.history().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["", "A", "X"]);
    assert_eq!(session.history().pointer(), 3);
    assert_eq!(session.history().current().unwrap().text, "X");
    assert!(!session.can_redo());
    assert_eq!(restored_texts(&app), vec!["A".to_string()]);
}

#[test]
fn test_reset_between_saves_in_one_frame() {
    let mut app = App::new();
    app.add_plugins(HistoryPlugin);
    app.update();

    app.world_mut().write_message(HistoryRequest::save("old"));
    app.world_mut().write_message(HistoryRequest::reset("opened"));
    app.world_mut().write_message(HistoryRequest::save("new"));
    app.update();

    let session = &app.world().resource::<DrawingHistory>().0;
    let texts: Vec<&str> = session.history().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["opened", "new"]);
}

//! Mutators (spec §4.H) as a closed, tagged-variant `Action` enum dispatched
//! through a single `match` — the variant approach the design notes prefer
//! when the mutator set is closed (spec §9).

use std::path::PathBuf;
use std::time::Duration;

use core_syntax::Language;
use core_text::{Direction, Position};

use crate::cursor::{Selector, SelectorMode};
use crate::io_ops::{self, OpenFileResult};
use crate::locator::{self, Locator};
use crate::menu::MenuItem;
use crate::{EditorState, InputMode, StatusMsg, StatusStyle};

#[derive(Debug, Clone)]
pub enum Action {
    LoadDocument { path: PathBuf, show_status: bool },
    ReloadDocument,
    SaveDocument { force: bool },
    InsertRune(char),
    Delete { locator: Locator },
    DeleteLines { locator: Locator, abort_if_current_line: bool },
    MoveCursor { locator: Locator },
    ScrollLines(i64),
    ScrollToCursor,
    SetSyntax(Language),
    ShowMenu { prompt: String, items: Vec<MenuItem>, empty_query_shows_all: bool },
    HideMenu,
    AppendMenuQuery(char),
    DeleteMenuQuery,
    MoveMenuSelection(i64),
    ExecuteSelectedMenuItem,
    SetInputMode(InputMode),
    ToggleVisualMode(SelectorMode),
    Quit,
    Undo,
    Redo,
    CheckpointUndoLog,
    AbortIfUnsavedChanges { inner: Box<Action>, force: bool },
    Composite(Vec<Action>),
}

/// Apply `action` to `state`. Mutators never return errors (spec §7
/// propagation policy); anything that can fail is surfaced through
/// `state.status_msg`.
pub fn dispatch(action: &Action, state: &mut EditorState) {
    match action {
        Action::LoadDocument { path, show_status } => load_document(state, path, *show_status),
        Action::ReloadDocument => reload_document(state),
        Action::SaveDocument { force } => save_document(state, *force),
        Action::InsertRune(rune) => insert_rune(state, *rune),
        Action::Delete { locator } => delete_by_locator(state, locator),
        Action::DeleteLines { locator, abort_if_current_line } => {
            delete_lines(state, locator, *abort_if_current_line)
        }
        Action::MoveCursor { locator } => move_cursor(state, locator),
        Action::ScrollLines(delta) => scroll_lines(state, *delta),
        Action::ScrollToCursor => scroll_to_cursor(state),
        Action::SetSyntax(language) => state.document_buffer.set_syntax_language(*language),
        Action::ShowMenu { prompt, items, empty_query_shows_all } => {
            state.menu_state.show(prompt.clone(), items.clone(), *empty_query_shows_all);
            set_input_mode(state, InputMode::Menu);
        }
        Action::HideMenu => {
            state.menu_state.hide();
            set_input_mode(state, InputMode::Normal);
        }
        Action::AppendMenuQuery(r) => state.menu_state.append_rune(*r),
        Action::DeleteMenuQuery => state.menu_state.delete_rune(),
        Action::MoveMenuSelection(delta) => state.menu_state.move_selection(*delta),
        Action::ExecuteSelectedMenuItem => execute_selected_menu_item(state),
        Action::SetInputMode(mode) => set_input_mode(state, *mode),
        Action::ToggleVisualMode(mode) => toggle_visual_mode(state, *mode),
        Action::Quit => state.quit_flag = true,
        Action::Undo => undo(state),
        Action::Redo => redo(state),
        Action::CheckpointUndoLog => state.undo_log.checkpoint(),
        Action::AbortIfUnsavedChanges { inner, force } => {
            if state.has_unsaved_changes && !force {
                state.set_status(StatusStyle::Error, "unsaved changes (use force to override)");
            } else {
                dispatch(inner, state);
            }
        }
        Action::Composite(actions) => {
            for a in actions {
                dispatch(a, state);
                if state.quit_flag {
                    break;
                }
            }
        }
    }
}

const WATCH_POLL_INTERVAL: Duration = core_events::DEFAULT_POLL_INTERVAL;

fn load_document(state: &mut EditorState, path: &PathBuf, show_status: bool) {
    match io_ops::open_file(path) {
        OpenFileResult::Success(buffer) => {
            let same_path = state.loaded_path.as_deref() == Some(path.as_path());
            let (width, height) = (state.document_buffer.view.width, state.document_buffer.view.height);
            let prior_language = state.document_buffer.syntax_language;
            let prior_cursor = state.document_buffer.cursor.position;
            let prior_view_origin = state.document_buffer.view.origin_position;
            state.document_buffer = crate::buffer::DocumentBuffer::new(buffer, width, height);
            if same_path {
                // Same file reloaded: keep the syntax language and re-clamp the
                // old cursor/view position to the new length instead of
                // resetting to the origin (spec §4.H).
                state.document_buffer.set_syntax_language(prior_language);
                state.document_buffer.cursor.move_to(prior_cursor);
                state.document_buffer.view.origin_position = prior_view_origin;
                // Normal mode disallows the one-past-end position that
                // `clamp_cursor_and_view` otherwise permits for insert mode
                // (spec §3), so clamp the cursor to the last valid rune here
                // rather than reusing that generic post-edit clamp.
                let len = state.document_buffer.text.num_runes();
                let max_cursor = if state.input_mode == InputMode::Insert { len } else { len.saturating_sub(1) };
                state.document_buffer.cursor.clamp(max_cursor);
                state.document_buffer.view.origin_position =
                    state.document_buffer.view.origin_position.clamp_to(len);
            }
            state.loaded_path = Some(path.clone());
            state.has_unsaved_changes = false;
            state.undo_log = crate::undo::UndoLog::new();
            restart_watcher(state, path);
            if show_status {
                state.set_status(StatusStyle::Success, format!("loaded {}", path.display()));
            }
        }
        OpenFileResult::Error(err) => {
            if show_status {
                state.set_status(StatusStyle::Error, format!("failed to load {}: {err}", path.display()));
            }
        }
    }
}

fn reload_document(state: &mut EditorState) {
    let Some(path) = state.loaded_path.clone() else {
        state.set_status(StatusStyle::Error, "no file to reload");
        return;
    };
    load_document(state, &path, true);
    state.undo_log.checkpoint();
}

fn save_document(state: &mut EditorState, force: bool) {
    let Some(path) = state.loaded_path.clone() else {
        state.set_status(StatusStyle::Error, "no file name to save to");
        return;
    };
    if !force {
        let changed_externally = state.file_watcher.as_mut().is_some_and(|w| w.has_changed());
        if changed_externally {
            state.set_status(StatusStyle::Error, "file changed since last save; use force to overwrite");
            return;
        }
    }
    let content: String = state
        .document_buffer
        .text
        .iter_from(Position::origin(), Direction::Forward)
        .collect();
    match io_ops::write_file_atomic(&path, &content) {
        Ok(()) => {
            state.has_unsaved_changes = false;
            restart_watcher(state, &path);
            state.undo_log.checkpoint();
            state.set_status(StatusStyle::Success, format!("saved {}", path.display()));
        }
        Err(err) => {
            state.set_status(StatusStyle::Error, format!("save failed: {err}"));
        }
    }
}

fn restart_watcher(state: &mut EditorState, path: &PathBuf) {
    if let Some(mut old) = state.file_watcher.take() {
        old.stop();
    }
    match core_events::FileIdentity::capture(path) {
        Ok(identity) => {
            state.file_watcher = Some(core_events::FileWatcher::spawn(path.clone(), identity, WATCH_POLL_INTERVAL));
        }
        Err(err) => {
            tracing::warn!(target: "io", path = %path.display(), %err, "could not start file watcher");
        }
    }
}

fn insert_rune(state: &mut EditorState, rune: char) {
    let pos = state.document_buffer.cursor.position;
    if state.document_buffer.insert_rune(pos, rune).is_ok() {
        state.undo_log.track_insert(pos, rune.to_string());
        state.document_buffer.cursor.move_to(Position(pos.rune_offset() + 1));
        state.has_unsaved_changes = true;
    }
}

fn delete_by_locator(state: &mut EditorState, loc: &Locator) {
    let cursor = state.document_buffer.cursor.position;
    let target = locator::resolve(loc, &state.document_buffer.text, cursor);
    let (start, end) = if cursor <= target { (cursor, target) } else { (target, cursor) };
    if start == end {
        return;
    }
    if let Ok(removed) = state.document_buffer.delete_range(start, end) {
        state.undo_log.track_delete(start, removed);
        state.document_buffer.cursor.move_to(start);
        state.has_unsaved_changes = true;
    }
}

fn delete_lines(state: &mut EditorState, loc: &Locator, abort_if_current_line: bool) {
    let text = &state.document_buffer.text;
    let cursor = state.document_buffer.cursor.position;
    let target = locator::resolve(loc, text, cursor);
    let from_line = text.line_at(cursor).min(text.line_at(target));
    let to_line = text.line_at(cursor).max(text.line_at(target));
    if abort_if_current_line && from_line == to_line {
        return;
    }
    let start = text.line_start(from_line);
    let end_line_start = text.line_start(to_line);
    let end = Position(end_line_start.rune_offset() + text.line_len_runes(to_line));
    let end = Position((end.rune_offset() + 1).min(text.num_runes())); // include the trailing newline
    if let Ok(removed) = state.document_buffer.delete_range(start, end) {
        state.undo_log.track_delete(start, removed);
        state.document_buffer.cursor.move_to(start);
        state.has_unsaved_changes = true;
    }
}

fn undo(state: &mut EditorState) {
    match state.undo_log.undo(&mut state.document_buffer.text) {
        Some(pos) => {
            state.document_buffer.retokenize_full();
            state.document_buffer.cursor.move_to(pos);
            state.document_buffer.clamp_cursor_and_view();
            state.has_unsaved_changes = true;
        }
        None => state.set_status(StatusStyle::Info, "nothing to undo"),
    }
}

fn redo(state: &mut EditorState) {
    match state.undo_log.redo(&mut state.document_buffer.text) {
        Some(pos) => {
            state.document_buffer.retokenize_full();
            state.document_buffer.cursor.move_to(pos);
            state.document_buffer.clamp_cursor_and_view();
            state.has_unsaved_changes = true;
        }
        None => state.set_status(StatusStyle::Info, "nothing to redo"),
    }
}

fn move_cursor(state: &mut EditorState, loc: &Locator) {
    let new_pos = locator::resolve(loc, &state.document_buffer.text, state.document_buffer.cursor.position);
    state.document_buffer.cursor.move_to(new_pos);
}

fn scroll_lines(state: &mut EditorState, delta: i64) {
    let direction = if delta >= 0 { Direction::Forward } else { Direction::Backward };
    let n = delta.unsigned_abs() as usize;
    let loc = Locator::RelativeLineStart { direction, n };
    let new_origin = locator::resolve(&loc, &state.document_buffer.text, state.document_buffer.view.origin_position);
    state.document_buffer.view.origin_position = new_origin;
}

fn scroll_to_cursor(state: &mut EditorState) {
    let text = &state.document_buffer.text;
    let cursor_line = text.line_at(state.document_buffer.cursor.position);
    let origin_line = text.line_at(state.document_buffer.view.origin_position);
    let height = state.document_buffer.view.height.max(1) as usize;

    if cursor_line < origin_line {
        let new_origin_line = cursor_line.saturating_sub(1);
        state.document_buffer.view.origin_position = text.line_start(new_origin_line);
    } else if cursor_line >= origin_line + height {
        let new_origin_line = (cursor_line + 2).saturating_sub(height);
        state.document_buffer.view.origin_position = text.line_start(new_origin_line);
    }
}

fn execute_selected_menu_item(state: &mut EditorState) {
    match state.menu_state.selected_item() {
        Some(item) => {
            let action = item.action.clone();
            state.menu_state.hide();
            set_input_mode(state, InputMode::Normal);
            dispatch(&action, state);
        }
        None => state.set_status(StatusStyle::Error, "no matching menu item"),
    }
}

/// Central handler for the §4.I transition table. Every other mutator that
/// changes `input_mode` routes through here so the side effects stay in one
/// place.
pub fn set_input_mode(state: &mut EditorState, new_mode: InputMode) {
    let old_mode = state.input_mode;
    state.status_msg = None;

    if matches!(old_mode, InputMode::Visual) && !matches!(new_mode, InputMode::Visual) {
        state.document_buffer.selector = None;
    }
    if matches!(new_mode, InputMode::Normal) && !state.macro_state.is_replaying {
        state.undo_log.checkpoint();
    }
    if matches!(new_mode, InputMode::Visual) && !matches!(old_mode, InputMode::Visual) {
        state.document_buffer.selector =
            Some(Selector::new(SelectorMode::Charwise, state.document_buffer.cursor.position));
    }

    state.prev_input_mode = old_mode;
    state.input_mode = new_mode;
}

fn toggle_visual_mode(state: &mut EditorState, mode: SelectorMode) {
    if state.input_mode == InputMode::Visual {
        let exit = state.document_buffer.selector.as_ref().is_some_and(|s| s.mode == mode);
        if exit {
            set_input_mode(state, InputMode::Normal);
            return;
        }
        if let Some(sel) = state.document_buffer.selector.as_mut() {
            sel.mode = mode;
        }
        return;
    }
    set_input_mode(state, InputMode::Visual);
    if let Some(sel) = state.document_buffer.selector.as_mut() {
        sel.mode = mode;
    }
}

impl EditorState {
    pub fn set_status(&mut self, style: StatusStyle, text: impl Into<String>) {
        self.status_msg = Some(StatusMsg { style, text: text.into() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorState;
    use core_text::Buffer;

    fn state_with(content: &str) -> EditorState {
        EditorState::new(Buffer::from_string("t", content), 80, 24)
    }

    #[test]
    fn insert_rune_advances_cursor_and_marks_dirty() {
        let mut state = state_with("abc");
        dispatch(&Action::InsertRune('X'), &mut state);
        assert_eq!(state.document_buffer.text.slice(Position(0), Position(4)).unwrap(), "Xabc");
        assert_eq!(state.document_buffer.cursor.position, Position(1));
        assert!(state.has_unsaved_changes);
    }

    #[test]
    fn delete_by_locator_removes_forward_span() {
        let mut state = state_with("abcdef");
        dispatch(
            &Action::Delete {
                locator: Locator::CharInLine { direction: Direction::Forward, n: 3, allow_past_end: true },
            },
            &mut state,
        );
        assert_eq!(state.document_buffer.text.slice(Position(0), Position(3)).unwrap(), "def");
    }

    #[test]
    fn set_input_mode_to_normal_checkpoints_undo_log() {
        let mut state = state_with("abc");
        dispatch(&Action::InsertRune('X'), &mut state);
        assert_eq!(state.undo_log.undo_depth(), 1); // uncommitted batch counts
        dispatch(&Action::SetInputMode(InputMode::Insert), &mut state);
        dispatch(&Action::SetInputMode(InputMode::Normal), &mut state);
        assert_eq!(state.undo_log.undo_depth(), 1);
        assert_eq!(state.undo_log.redo_depth(), 0);
    }

    #[test]
    fn entering_visual_mode_starts_selector_at_cursor() {
        let mut state = state_with("abcdef");
        dispatch(&Action::MoveCursor { locator: Locator::CharInLine { direction: Direction::Forward, n: 2, allow_past_end: true } }, &mut state);
        dispatch(&Action::SetInputMode(InputMode::Visual), &mut state);
        let sel = state.document_buffer.selector.expect("selector should be set");
        assert_eq!(sel.anchor_position, Position(2));
    }

    #[test]
    fn leaving_visual_mode_clears_selector() {
        let mut state = state_with("abcdef");
        dispatch(&Action::SetInputMode(InputMode::Visual), &mut state);
        dispatch(&Action::SetInputMode(InputMode::Normal), &mut state);
        assert!(state.document_buffer.selector.is_none());
    }

    #[test]
    fn toggle_visual_mode_twice_with_same_kind_exits_visual() {
        let mut state = state_with("abcdef");
        dispatch(&Action::ToggleVisualMode(SelectorMode::Charwise), &mut state);
        assert_eq!(state.input_mode, InputMode::Visual);
        dispatch(&Action::ToggleVisualMode(SelectorMode::Charwise), &mut state);
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn abort_if_unsaved_changes_blocks_without_force() {
        let mut state = state_with("abc");
        state.has_unsaved_changes = true;
        dispatch(
            &Action::AbortIfUnsavedChanges { inner: Box::new(Action::Quit), force: false },
            &mut state,
        );
        assert!(!state.quit_flag);
        assert_eq!(state.status_msg.as_ref().unwrap().style, StatusStyle::Error);
    }

    #[test]
    fn abort_if_unsaved_changes_delegates_when_forced() {
        let mut state = state_with("abc");
        state.has_unsaved_changes = true;
        dispatch(
            &Action::AbortIfUnsavedChanges { inner: Box::new(Action::Quit), force: true },
            &mut state,
        );
        assert!(state.quit_flag);
    }

    #[test]
    fn undo_reverses_last_batch_and_moves_cursor() {
        let mut state = state_with("abc");
        dispatch(&Action::InsertRune('X'), &mut state);
        dispatch(&Action::CheckpointUndoLog, &mut state);
        dispatch(&Action::Undo, &mut state);
        assert_eq!(state.document_buffer.text.slice(Position(0), Position(3)).unwrap(), "abc");
        assert_eq!(state.document_buffer.cursor.position, Position(0));
    }

    #[test]
    fn redo_replays_after_undo() {
        let mut state = state_with("abc");
        dispatch(&Action::InsertRune('X'), &mut state);
        dispatch(&Action::CheckpointUndoLog, &mut state);
        dispatch(&Action::Undo, &mut state);
        dispatch(&Action::Redo, &mut state);
        assert_eq!(state.document_buffer.text.slice(Position(0), Position(4)).unwrap(), "Xabc");
    }

    #[test]
    fn undo_with_nothing_to_undo_sets_info_status() {
        let mut state = state_with("abc");
        dispatch(&Action::Undo, &mut state);
        assert_eq!(state.status_msg.as_ref().unwrap().style, StatusStyle::Info);
    }

    #[test]
    fn composite_short_circuits_after_quit() {
        let mut state = state_with("abc");
        dispatch(
            &Action::Composite(vec![Action::Quit, Action::InsertRune('z')]),
            &mut state,
        );
        assert!(state.quit_flag);
        assert_eq!(state.document_buffer.text.slice(Position(0), Position(3)).unwrap(), "abc");
    }
}

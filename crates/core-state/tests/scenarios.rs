//! Cross-crate end-to-end scenarios exercising `dispatch` the way the
//! dispatcher loop in `editor-bin` actually drives it: load, edit, save,
//! reload, and the menu, each against a real file on disk.

use std::time::Duration;

use core_state::{dispatch, Action, EditorState, Locator, MenuItem, StatusStyle};
use core_syntax::Language;
use core_text::{Buffer, Direction, Position};

fn empty_state() -> EditorState {
    EditorState::new(Buffer::from_string("untitled", ""), 80, 24)
}

#[tokio::test]
async fn insert_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "").unwrap();

    let mut state = empty_state();
    dispatch(
        &Action::LoadDocument { path: path.clone(), show_status: false },
        &mut state,
    );
    dispatch(&Action::InsertRune('x'), &mut state);
    dispatch(&Action::InsertRune('\n'), &mut state);
    dispatch(&Action::SaveDocument { force: false }, &mut state);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    assert_eq!(state.status_msg.as_ref().unwrap().style, StatusStyle::Success);
    assert!(!state.has_unsaved_changes);
}

#[tokio::test]
async fn reload_preserves_syntax_and_clamps_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "abcd\nefghi\njklmnop\nqrst").unwrap();

    let mut state = EditorState::new(Buffer::from_string("untitled", ""), 5, 3);
    dispatch(
        &Action::LoadDocument { path: path.clone(), show_status: false },
        &mut state,
    );
    state.document_buffer.cursor.move_to(Position(22));
    dispatch(&Action::SetSyntax(Language::GitCommit), &mut state);

    std::fs::write(&path, "ab").unwrap();
    dispatch(&Action::ReloadDocument, &mut state);

    assert_eq!(
        state.document_buffer.text.slice(Position(0), Position(2)).unwrap(),
        "ab"
    );
    // Same-path reload carries the old cursor/view forward and re-clamps them
    // to the new (shorter) length, rather than resetting to the origin.
    assert_eq!(state.document_buffer.cursor.position, Position(1));
    assert_eq!(state.document_buffer.view.origin_position, Position::origin());
    assert_eq!(state.document_buffer.syntax_language, Language::GitCommit);
}

#[tokio::test]
async fn loading_a_different_file_resets_syntax() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.txt");
    let path_b = dir.path().join("b.txt");
    std::fs::write(&path_a, "abcd\nefghi\njklmnop\nqrst").unwrap();
    std::fs::write(&path_b, "different file").unwrap();

    let mut state = EditorState::new(Buffer::from_string("untitled", ""), 5, 3);
    dispatch(
        &Action::LoadDocument { path: path_a.clone(), show_status: false },
        &mut state,
    );
    state.document_buffer.cursor.move_to(Position(22));
    dispatch(&Action::SetSyntax(Language::GitCommit), &mut state);

    dispatch(
        &Action::LoadDocument { path: path_b.clone(), show_status: false },
        &mut state,
    );

    assert_eq!(state.document_buffer.cursor.position, Position::origin());
    assert_eq!(state.document_buffer.view.origin_position, Position::origin());
    assert_eq!(state.document_buffer.syntax_language, Language::Plaintext);
}

#[tokio::test]
async fn save_refuses_on_external_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "").unwrap();

    let mut state = empty_state();
    dispatch(
        &Action::LoadDocument { path: path.clone(), show_status: false },
        &mut state,
    );

    std::fs::write(&path, "test").unwrap();
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            if state.file_watcher.as_mut().unwrap().has_changed() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("watcher should have noticed the external write");

    dispatch(&Action::SaveDocument { force: false }, &mut state);

    assert_eq!(state.status_msg.as_ref().unwrap().style, StatusStyle::Error);
    assert!(state.status_msg.as_ref().unwrap().text.contains("changed since last save"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "test");
}

#[test]
fn delete_lines_interior() {
    let mut state = EditorState::new(Buffer::from_string("t", "abcd\nefgh\nijk"), 80, 24);
    state.document_buffer.cursor.move_to(Position(6));
    dispatch(
        &Action::DeleteLines { locator: Locator::CurrentCursor, abort_if_current_line: false },
        &mut state,
    );

    let len = state.document_buffer.text.num_runes();
    assert_eq!(
        state.document_buffer.text.slice(Position(0), Position(len)).unwrap(),
        "abcd\nijk"
    );
    assert_eq!(state.document_buffer.cursor.position, Position(5));
    assert!(state.has_unsaved_changes);
}

#[test]
fn menu_fuzzy_select_executes_quit() {
    let mut state = empty_state();
    let items = vec![
        MenuItem::new("set syntax json", Action::SetSyntax(Language::GitCommit)),
        MenuItem::new("quit", Action::Quit),
    ];
    dispatch(
        &Action::ShowMenu { prompt: "command".into(), items, empty_query_shows_all: true },
        &mut state,
    );
    dispatch(&Action::AppendMenuQuery('q'), &mut state);
    dispatch(&Action::ExecuteSelectedMenuItem, &mut state);

    assert!(!state.menu_state.visible);
    assert!(state.quit_flag);
}

#[test]
fn menu_selection_wraps_backward_from_the_first_result() {
    let mut state = empty_state();
    let items = vec![
        MenuItem::new("alpha", Action::Quit),
        MenuItem::new("beta", Action::Quit),
        MenuItem::new("gamma", Action::Quit),
        MenuItem::new("delta", Action::Quit),
    ];
    dispatch(
        &Action::ShowMenu { prompt: "command".into(), items, empty_query_shows_all: true },
        &mut state,
    );
    assert_eq!(state.menu_state.selected_result_idx, 0);

    dispatch(&Action::MoveMenuSelection(-1), &mut state);
    assert_eq!(state.menu_state.selected_result_idx, 3);
}

#[test]
fn move_cursor_by_word_boundary_locator() {
    let mut state = EditorState::new(Buffer::from_string("t", "foo  bar"), 80, 24);
    dispatch(
        &Action::MoveCursor {
            locator: Locator::WordBoundary { direction: Direction::Forward, n: 1 },
        },
        &mut state,
    );
    assert_eq!(state.document_buffer.cursor.position, Position(5));
}

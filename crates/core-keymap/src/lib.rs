//! A minimal `InputInterpreter` (spec §6): given a terminal event, the
//! current input mode, and `{scroll_lines}`, returns a mutator or nothing.
//!
//! This maps a representative handful of keys — enough to drive the
//! dispatcher end to end — not a full keymap (explicitly out of scope per
//! spec §6).

use core_config::Config;
use core_events::{InputEvent, KeyCode, KeyEvent, KeyModifiers};
use core_state::{Action, InputMode, Locator, SelectorMode};
use core_text::Direction;

/// Translate one terminal event into an `Action`, or `None` if this
/// interpreter has no mapping for it in the current mode.
pub fn interpret(event: InputEvent, mode: InputMode, config: &Config) -> Option<Action> {
    match event {
        InputEvent::CtrlC => Some(Action::Quit),
        InputEvent::Resize(_, _) => None, // handled by the dispatcher directly, not a mutator
        InputEvent::Key(key) => match mode {
            InputMode::Normal => normal_mode(key, config),
            InputMode::Insert => insert_mode(key),
            InputMode::Menu => menu_mode(key),
            InputMode::Search => search_mode(key),
            InputMode::Visual => visual_mode(key),
            InputMode::Task => None,
        },
    }
}

fn normal_mode(key: KeyEvent, config: &Config) -> Option<Action> {
    match key.code {
        KeyCode::Left => Some(Action::MoveCursor {
            locator: Locator::CharInLine { direction: Direction::Backward, n: 1, allow_past_end: false },
        }),
        KeyCode::Right => Some(Action::MoveCursor {
            locator: Locator::CharInLine { direction: Direction::Forward, n: 1, allow_past_end: false },
        }),
        KeyCode::Up => Some(Action::MoveCursor {
            locator: Locator::RelativeLineStart { direction: Direction::Backward, n: 1 },
        }),
        KeyCode::Down => Some(Action::MoveCursor {
            locator: Locator::RelativeLineStart { direction: Direction::Forward, n: 1 },
        }),
        KeyCode::Char('i') => Some(Action::SetInputMode(InputMode::Insert)),
        KeyCode::Char('v') => Some(Action::ToggleVisualMode(SelectorMode::Charwise)),
        KeyCode::Char('/') => Some(Action::SetInputMode(InputMode::Search)),
        KeyCode::Char('q') if key.mods.is_empty() => {
            Some(Action::AbortIfUnsavedChanges { inner: Box::new(Action::Quit), force: false })
        }
        KeyCode::Char('u') if key.mods.is_empty() => Some(Action::Undo),
        KeyCode::Char('r') if key.mods.contains(KeyModifiers::CTRL) => Some(Action::Redo),
        KeyCode::Char('s') if key.mods.contains(KeyModifiers::CTRL) => Some(Action::SaveDocument { force: false }),
        KeyCode::Char('d') if key.mods.contains(KeyModifiers::CTRL) => {
            Some(Action::Composite(vec![Action::ScrollLines(config.scroll_lines as i64), Action::ScrollToCursor]))
        }
        KeyCode::Char('e') if key.mods.contains(KeyModifiers::CTRL) => {
            Some(Action::Composite(vec![Action::ScrollLines(-(config.scroll_lines as i64)), Action::ScrollToCursor]))
        }
        _ => None,
    }
}

fn insert_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::SetInputMode(InputMode::Normal)),
        KeyCode::Char(c) => Some(Action::InsertRune(c)),
        KeyCode::Enter => Some(Action::InsertRune('\n')),
        KeyCode::Tab => Some(Action::InsertRune('\t')),
        KeyCode::Backspace => Some(Action::Delete {
            locator: Locator::CharInLine { direction: Direction::Backward, n: 1, allow_past_end: true },
        }),
        _ => None,
    }
}

fn menu_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::HideMenu),
        KeyCode::Enter => Some(Action::ExecuteSelectedMenuItem),
        KeyCode::Char(c) => Some(Action::AppendMenuQuery(c)),
        KeyCode::Backspace => Some(Action::DeleteMenuQuery),
        KeyCode::Up => Some(Action::MoveMenuSelection(-1)),
        KeyCode::Down => Some(Action::MoveMenuSelection(1)),
        _ => None,
    }
}

fn search_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::SetInputMode(InputMode::Normal)),
        KeyCode::Enter => Some(Action::SetInputMode(InputMode::Normal)),
        _ => None,
    }
}

fn visual_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::SetInputMode(InputMode::Normal)),
        KeyCode::Left => Some(Action::MoveCursor {
            locator: Locator::CharInLine { direction: Direction::Backward, n: 1, allow_past_end: false },
        }),
        KeyCode::Right => Some(Action::MoveCursor {
            locator: Locator::CharInLine { direction: Direction::Forward, n: 1, allow_past_end: false },
        }),
        _ => None,
    }
}

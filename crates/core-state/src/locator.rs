//! Cursor locators (spec §4.D): pure `(text, cursor) -> Position` functions.
//! Every locator is total — it clamps rather than fails — so mutators never
//! have to handle a locator error.

use core_text::{Buffer, Direction, Position};

/// Closed set of locators. Represented as a variant rather than a trait
/// object so `Action::MoveCursor` stays `Clone`/`Debug` and dispatch stays a
/// single `match` (spec §9 design note on mutator dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    CharInLine { direction: Direction, n: usize, allow_past_end: bool },
    RelativeLineStart { direction: Direction, n: usize },
    CurrentCursor,
    LineBoundary { direction: Direction, include_newline: bool },
    DocumentBoundary { direction: Direction },
    WordBoundary { direction: Direction, n: usize },
    MatchingBracket,
    SearchResult { query: String, direction: Direction },
}

pub fn resolve(locator: &Locator, text: &Buffer, cursor: Position) -> Position {
    match locator {
        Locator::CharInLine { direction, n, allow_past_end } => {
            char_in_line(text, cursor, *direction, *n, *allow_past_end)
        }
        Locator::RelativeLineStart { direction, n } => relative_line_start(text, cursor, *direction, *n),
        Locator::CurrentCursor => cursor.clamp_to(text.num_runes()),
        Locator::LineBoundary { direction, include_newline } => {
            line_boundary(text, cursor, *direction, *include_newline)
        }
        Locator::DocumentBoundary { direction } => document_boundary(text, *direction),
        Locator::WordBoundary { direction, n } => word_boundary(text, cursor, *direction, *n),
        Locator::MatchingBracket => matching_bracket(text, cursor),
        Locator::SearchResult { query, direction } => search_result(text, cursor, query, *direction),
    }
}

fn char_in_line(text: &Buffer, cursor: Position, direction: Direction, n: usize, allow_past_end: bool) -> Position {
    let line = text.line_at(cursor);
    let line_start = text.line_start(line);
    let line_len = text.line_len_runes(line);
    let max_col = if allow_past_end { line_len } else { line_len.saturating_sub(1) };
    let col = cursor.rune_offset().saturating_sub(line_start.rune_offset()).min(max_col);
    let new_col = match direction {
        Direction::Forward => (col + n).min(max_col),
        Direction::Backward => col.saturating_sub(n),
    };
    Position(line_start.rune_offset() + new_col).clamp_to(text.num_runes())
}

fn relative_line_start(text: &Buffer, cursor: Position, direction: Direction, n: usize) -> Position {
    let line = text.line_at(cursor);
    let last_line = text.num_lines().saturating_sub(1);
    let new_line = match direction {
        Direction::Forward => (line + n).min(last_line),
        Direction::Backward => line.saturating_sub(n),
    };
    text.line_start(new_line)
}

fn line_boundary(text: &Buffer, cursor: Position, direction: Direction, include_newline: bool) -> Position {
    let line = text.line_at(cursor);
    match direction {
        Direction::Backward => text.line_start(line),
        Direction::Forward => {
            let start = text.line_start(line);
            let end = Position(start.rune_offset() + text.line_len_runes(line));
            if include_newline && text.rune_at(end) == Some('\n') {
                Position(end.rune_offset() + 1).clamp_to(text.num_runes())
            } else {
                end
            }
        }
    }
}

fn document_boundary(text: &Buffer, direction: Direction) -> Position {
    match direction {
        Direction::Forward => Position(text.num_runes()),
        Direction::Backward => Position::origin(),
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum CharClass {
    Space,
    Word,
    Punct,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if c == '_' || c.is_alphanumeric() {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// `n` word-start boundaries in `direction`, à la vim's `w`/`b`: skip the
/// run of characters sharing the cursor's class, then skip whitespace.
fn word_boundary(text: &Buffer, cursor: Position, direction: Direction, n: usize) -> Position {
    let len = text.num_runes();
    let mut pos = cursor.rune_offset();
    for _ in 0..n.max(1) {
        pos = match direction {
            Direction::Forward => word_boundary_forward_once(text, pos, len),
            Direction::Backward => word_boundary_backward_once(text, pos, len),
        };
    }
    Position(pos).clamp_to(len)
}

fn word_boundary_forward_once(text: &Buffer, mut pos: usize, len: usize) -> usize {
    if pos >= len {
        return len;
    }
    let start_class = text.rune_at(Position(pos)).map(classify);
    while pos < len {
        let cls = text.rune_at(Position(pos)).map(classify);
        if cls != start_class {
            break;
        }
        pos += 1;
    }
    while pos < len && text.rune_at(Position(pos)).map(classify) == Some(CharClass::Space) {
        pos += 1;
    }
    pos
}

fn word_boundary_backward_once(text: &Buffer, mut pos: usize, len: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    pos -= 1;
    while pos > 0 && text.rune_at(Position(pos)).map(classify) == Some(CharClass::Space) {
        pos -= 1;
    }
    if pos == 0 {
        return 0;
    }
    let class = text.rune_at(Position(pos)).map(classify);
    while pos > 0 && text.rune_at(Position(pos - 1)).map(classify) == class {
        pos -= 1;
    }
    let _ = len;
    pos
}

const OPEN_BRACKETS: [char; 3] = ['(', '[', '{'];
const CLOSE_BRACKETS: [char; 3] = [')', ']', '}'];

/// If the cursor sits on a bracket, the position of its match; otherwise a
/// no-op (locators are total, so "no match" just means "stay put").
fn matching_bracket(text: &Buffer, cursor: Position) -> Position {
    let Some(c) = text.rune_at(cursor) else {
        return cursor;
    };
    if let Some(idx) = OPEN_BRACKETS.iter().position(|&b| b == c) {
        let close = CLOSE_BRACKETS[idx];
        let mut depth = 0i32;
        let mut pos = cursor.rune_offset();
        while pos < text.num_runes() {
            if let Some(ch) = text.rune_at(Position(pos)) {
                if ch == c {
                    depth += 1;
                } else if ch == close {
                    depth -= 1;
                    if depth == 0 {
                        return Position(pos);
                    }
                }
            }
            pos += 1;
        }
        cursor
    } else if let Some(idx) = CLOSE_BRACKETS.iter().position(|&b| b == c) {
        let open = OPEN_BRACKETS[idx];
        let mut depth = 0i32;
        let mut pos = cursor.rune_offset();
        loop {
            if let Some(ch) = text.rune_at(Position(pos)) {
                if ch == c {
                    depth += 1;
                } else if ch == open {
                    depth -= 1;
                    if depth == 0 {
                        return Position(pos);
                    }
                }
            }
            if pos == 0 {
                break;
            }
            pos -= 1;
        }
        cursor
    } else {
        cursor
    }
}

/// First occurrence of `query` in `direction` from the cursor, wrapping
/// around the document. A no-op (stays at the cursor) if `query` is empty
/// or not found anywhere.
fn search_result(text: &Buffer, cursor: Position, query: &str, direction: Direction) -> Position {
    if query.is_empty() {
        return cursor;
    }
    let runes: Vec<char> = text.iter_from(Position::origin(), Direction::Forward).collect();
    let needle: Vec<char> = query.chars().collect();
    let len = runes.len();
    if needle.len() > len {
        return cursor;
    }
    let starts: Vec<usize> = (0..=len - needle.len())
        .filter(|&i| runes[i..i + needle.len()] == needle[..])
        .collect();
    if starts.is_empty() {
        return cursor;
    }
    let cur = cursor.rune_offset();
    match direction {
        Direction::Forward => starts
            .iter()
            .find(|&&s| s > cur)
            .copied()
            .unwrap_or(starts[0])
            .into(),
        Direction::Backward => starts
            .iter()
            .rev()
            .find(|&&s| s < cur)
            .copied()
            .unwrap_or(*starts.last().unwrap())
            .into(),
    }
}

//! Rope-based text buffer with a flat rune-offset position space.
//!
//! Positions are absolute char (rune) offsets into the buffer rather than
//! (line, byte) pairs. `ropey::Rope` indexes natively by char, so line/offset
//! conversions stay O(log N) without any bookkeeping of our own.

use std::io::Read;

use ropey::Rope;
use thiserror::Error;

pub mod grapheme;
pub mod segment;
pub mod width;

pub use width::egc_width;

/// Errors surfaced at the text-tree boundary.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("failed to read buffer contents")]
    Io(#[from] std::io::Error),
    #[error("buffer content is not valid UTF-8")]
    InvalidUtf8,
    #[error("position {pos} is out of range for a buffer of {len} runes")]
    OutOfRange { pos: usize, len: usize },
}

/// An absolute rune (char) offset into a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub usize);

impl Position {
    pub fn origin() -> Self {
        Position(0)
    }

    pub fn rune_offset(self) -> usize {
        self.0
    }

    /// Clamp this position so it never exceeds `len_runes`.
    pub fn clamp_to(self, len_runes: usize) -> Self {
        Position(self.0.min(len_runes))
    }
}

impl From<usize> for Position {
    fn from(offset: usize) -> Self {
        Position(offset)
    }
}

/// Direction of traversal for [`Buffer::iter_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_string(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            name: name.into(),
        }
    }

    /// Construct a buffer by reading from any `io::Read`, validating UTF-8 up front.
    pub fn from_reader<R: Read>(name: impl Into<String>, mut reader: R) -> Result<Self, TextError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let content = std::str::from_utf8(&bytes).map_err(|_| TextError::InvalidUtf8)?;
        Ok(Self::from_string(name, content))
    }

    /// Total number of runes (chars) in the buffer.
    pub fn num_runes(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total number of lines in the buffer.
    pub fn num_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn check_pos(&self, pos: Position) -> Result<(), TextError> {
        if pos.0 > self.rope.len_chars() {
            Err(TextError::OutOfRange {
                pos: pos.0,
                len: self.rope.len_chars(),
            })
        } else {
            Ok(())
        }
    }

    /// The rune at `pos`, or `None` if `pos` is at or past the end of the buffer.
    pub fn rune_at(&self, pos: Position) -> Option<char> {
        if pos.0 >= self.rope.len_chars() {
            return None;
        }
        self.rope.chars_at(pos.0).next()
    }

    /// The line index (0-based) containing `pos`.
    pub fn line_at(&self, pos: Position) -> usize {
        let clamped = pos.0.min(self.rope.len_chars());
        self.rope.char_to_line(clamped)
    }

    /// The position of the first rune of `line`.
    pub fn line_start(&self, line: usize) -> Position {
        Position(self.rope.line_to_char(line.min(self.rope.len_lines())))
    }

    /// Number of runes in `line`, excluding any trailing newline.
    pub fn line_len_runes(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let mut n = slice.len_chars();
        if n > 0 && slice.char(n - 1) == '\n' {
            n -= 1;
            if n > 0 && slice.char(n - 1) == '\r' {
                n -= 1;
            }
        }
        n
    }

    /// The contents of `line` as an owned `String`, without a trailing newline.
    pub fn line_str(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let mut s = self.rope.line(line).to_string();
        if s.ends_with('\n') {
            s.pop();
            if s.ends_with('\r') {
                s.pop();
            }
        }
        Some(s)
    }

    /// Insert a single rune at `pos`.
    pub fn insert(&mut self, pos: Position, rune: char) -> Result<(), TextError> {
        self.check_pos(pos)?;
        let mut buf = [0u8; 4];
        self.rope.insert(pos.0, rune.encode_utf8(&mut buf));
        Ok(())
    }

    /// Insert a run of text at `pos`.
    pub fn insert_str(&mut self, pos: Position, text: &str) -> Result<(), TextError> {
        self.check_pos(pos)?;
        self.rope.insert(pos.0, text);
        Ok(())
    }

    /// Return the text in `[start, end)`, clamped to the buffer's extent.
    pub fn slice(&self, start: Position, end: Position) -> Result<String, TextError> {
        self.check_pos(end)?;
        if start.0 > end.0 {
            return Err(TextError::OutOfRange {
                pos: start.0,
                len: self.rope.len_chars(),
            });
        }
        Ok(self.rope.slice(start.0..end.0).to_string())
    }

    /// Remove the runes in `[start, end)`, returning the removed text.
    /// `end` is clamped to `num_runes()`; a no-op if `start >= end` after
    /// clamping (spec: "clamps end to rune_count; no-op if start >= end").
    pub fn delete_range(&mut self, start: Position, end: Position) -> Result<String, TextError> {
        self.check_pos(start)?;
        let end = end.clamp_to(self.rope.len_chars());
        if start.0 >= end.0 {
            return Ok(String::new());
        }
        let removed = self.rope.slice(start.0..end.0).to_string();
        self.rope.remove(start.0..end.0);
        Ok(removed)
    }

    /// A resumable, forkable rune iterator starting at `pos` and walking in `direction`.
    pub fn iter_from(&self, pos: Position, direction: Direction) -> RuneIter<'_> {
        let at = pos.0.min(self.rope.len_chars());
        RuneIter {
            chars: self.rope.chars_at(at),
            direction,
        }
    }
}

/// A cursor over a buffer's runes. Cheap to clone (forks the cursor) and can be
/// stored and resumed across calls.
pub struct RuneIter<'a> {
    chars: ropey::iter::Chars<'a>,
    direction: Direction,
}

impl<'a> Clone for RuneIter<'a> {
    fn clone(&self) -> Self {
        RuneIter {
            chars: self.chars.clone(),
            direction: self.direction,
        }
    }
}

impl<'a> Iterator for RuneIter<'a> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        match self.direction {
            Direction::Forward => self.chars.next(),
            Direction::Backward => self.chars.prev(),
        }
    }
}

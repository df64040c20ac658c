//! Document buffer: the per-editor aggregate of text, cursor, viewport,
//! selection, and syntax state (spec §3: Document Buffer).

use core_syntax::tokenizer::{parse_all, reparse_incremental};
use core_syntax::{LangState, Language, TokenIndex};
use core_text::{Buffer, Direction, Position, TextError};

use crate::cursor::{Cursor, Selector};
use crate::view::View;

/// One loaded document plus everything needed to display and edit it.
/// Additional buffers (the menu's search input) reuse this same shape, per
/// spec §3, though they typically run with `syntax_language = Plaintext`.
pub struct DocumentBuffer {
    pub text: Buffer,
    pub cursor: Cursor,
    pub view: View,
    pub selector: Option<Selector>,
    pub syntax_language: Language,
    pub token_index: TokenIndex<LangState>,
}

impl DocumentBuffer {
    pub fn new(text: Buffer, width: u16, height: u16) -> Self {
        let syntax_language = Language::default();
        let token_index = tokenize_full(&text, syntax_language);
        Self {
            text,
            cursor: Cursor::origin(),
            view: View::new(width, height),
            selector: None,
            syntax_language,
            token_index,
        }
    }

    /// Rebuild the token index from scratch. Used on language change and as
    /// the fallback when an edit can't be reparsed incrementally.
    pub fn retokenize_full(&mut self) {
        self.token_index = tokenize_full(&self.text, self.syntax_language);
    }

    pub fn set_syntax_language(&mut self, language: Language) {
        self.syntax_language = language;
        self.retokenize_full();
    }

    /// Insert a single rune at `pos`, keeping cursor, view, and token index
    /// consistent with the new document length.
    pub fn insert_rune(&mut self, pos: Position, rune: char) -> Result<(), TextError> {
        self.text.insert(pos, rune)?;
        self.reparse_after_edit(pos, 1, 0);
        self.clamp_cursor_and_view();
        Ok(())
    }

    pub fn insert_str(&mut self, pos: Position, text: &str) -> Result<(), TextError> {
        let inserted = text.chars().count();
        self.text.insert_str(pos, text)?;
        self.reparse_after_edit(pos, inserted, 0);
        self.clamp_cursor_and_view();
        Ok(())
    }

    /// Delete `[start, end)`, returning the removed text.
    pub fn delete_range(&mut self, start: Position, end: Position) -> Result<String, TextError> {
        let removed = self.text.delete_range(start, end)?;
        let deleted = removed.chars().count();
        self.reparse_after_edit(start, 0, deleted);
        self.clamp_cursor_and_view();
        Ok(removed)
    }

    fn reparse_after_edit(&mut self, edit_start: Position, runes_inserted: usize, runes_deleted: usize) {
        let runes: Vec<char> = self.text.iter_from(Position::origin(), Direction::Forward).collect();
        let parse_fn = core_syntax::languages::parse_fn_for(self.syntax_language);
        let initial = core_syntax::languages::initial_state_for(self.syntax_language);
        self.token_index = reparse_incremental(
            &self.token_index,
            initial,
            &runes,
            edit_start.rune_offset(),
            runes_inserted,
            runes_deleted,
            &parse_fn,
        );
    }

    pub fn clamp_cursor_and_view(&mut self) {
        self.cursor.clamp(self.text.num_runes());
        self.view.origin_position = self.view.origin_position.clamp_to(self.text.num_runes());
    }
}

fn tokenize_full(text: &Buffer, language: Language) -> TokenIndex<LangState> {
    let runes: Vec<char> = text.iter_from(Position::origin(), Direction::Forward).collect();
    let parse_fn = core_syntax::languages::parse_fn_for(language);
    let initial = core_syntax::languages::initial_state_for(language);
    parse_all(&runes, &parse_fn, initial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_tokenizes_immediately() {
        let buf = DocumentBuffer::new(Buffer::from_string("t", "Subject\n\n# note\nbody"), 80, 24);
        assert!(buf.token_index.is_empty()); // default language is plaintext
    }

    #[test]
    fn setting_language_retokenizes() {
        let mut buf = DocumentBuffer::new(Buffer::from_string("t", "Subject\n\n# note\nbody"), 80, 24);
        buf.set_syntax_language(Language::GitCommit);
        assert!(!buf.token_index.is_empty());
    }

    #[test]
    fn insert_updates_token_index_incrementally() {
        let mut buf = DocumentBuffer::new(Buffer::from_string("t", "Subject\n\n# note\nbody"), 80, 24);
        buf.set_syntax_language(Language::GitCommit);
        let before = buf.token_index.len();
        buf.insert_rune(Position(0), 'X').unwrap();
        assert_eq!(buf.token_index.len(), before);
        assert_eq!(buf.cursor.position, Position(0)); // insert doesn't itself move the cursor
    }

    #[test]
    fn clamp_keeps_cursor_in_range_after_delete() {
        let mut buf = DocumentBuffer::new(Buffer::from_string("t", "abcdef"), 80, 24);
        buf.cursor.move_to(Position(6));
        buf.delete_range(Position(2), Position(6)).unwrap();
        assert_eq!(buf.cursor.position, Position(2));
    }
}

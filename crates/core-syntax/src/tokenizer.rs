//! Incremental tokenizer: drives a parse function over a document and keeps
//! the resulting token index up to date as localized edits arrive.

use crate::combinators::ParseFn;
use crate::token::Token;

/// Number of consecutive re-synced tokens (plus a matching parser state)
/// required before an incremental reparse gives up and splices in the rest
/// of the previous token index unchanged.
const CONVERGENCE: usize = 3;

#[derive(Debug, Clone)]
struct IndexedToken<S> {
    token: Token,
    state_after: S,
}

/// An ordered, non-overlapping sequence of tokens, each annotated with the
/// parser state produced at its end. The state annotation is what lets
/// [`reparse_incremental`] resume parsing mid-document instead of from
/// scratch.
#[derive(Debug, Clone)]
pub struct TokenIndex<S> {
    entries: Vec<IndexedToken<S>>,
}

impl<S> TokenIndex<S> {
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.entries.iter().map(|e| &e.token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens whose span overlaps `[start, end)`.
    pub fn tokens_intersecting_range(
        &self,
        start: usize,
        end: usize,
    ) -> impl Iterator<Item = &Token> {
        self.entries
            .iter()
            .map(|e| &e.token)
            .filter(move |t| t.intersects(start, end))
    }
}

/// Parse `input` from scratch, starting at rune 0 with `initial_state`.
pub fn parse_all<S: Clone + PartialEq>(
    input: &[char],
    parse_fn: &ParseFn<S>,
    initial_state: S,
) -> TokenIndex<S> {
    let mut entries = Vec::new();
    let mut pos = 0usize;
    let mut state = initial_state;

    while pos < input.len() {
        let out = parse_fn(&input[pos..], state.clone());
        if out.consumed == 0 {
            // A non-advancing parse function is a programmer error; stop
            // rather than loop forever.
            tracing::warn!(target: "syntax.tokenizer", pos, "parse function made no progress");
            break;
        }
        state = out.next_state;
        for t in out.tokens {
            entries.push(IndexedToken {
                token: Token {
                    start: t.start + pos,
                    end: t.end + pos,
                    role: t.role,
                },
                state_after: state.clone(),
            });
        }
        pos += out.consumed;
    }

    TokenIndex { entries }
}

fn shift_pos(pos: usize, shift: isize) -> usize {
    (pos as isize + shift).max(0) as usize
}

fn shift_token(t: &Token, shift: isize) -> Token {
    Token {
        start: shift_pos(t.start, shift),
        end: shift_pos(t.end, shift),
        role: t.role,
    }
}

/// Re-tokenize after an edit at `edit_start` that inserted `runes_inserted`
/// runes and removed `runes_deleted` runes, reusing as much of `old` as
/// possible.
///
/// `new_input` is the full, post-edit document. `initial_state` is the
/// grammar's entry state, used only if the edit falls before the first
/// known checkpoint.
pub fn reparse_incremental<S: Clone + PartialEq>(
    old: &TokenIndex<S>,
    initial_state: S,
    new_input: &[char],
    edit_start: usize,
    runes_inserted: usize,
    runes_deleted: usize,
    parse_fn: &ParseFn<S>,
) -> TokenIndex<S> {
    let shift = runes_inserted as isize - runes_deleted as isize;

    // 1. Find the last token whose end is <= edit_start; its post-state is
    // where we resume parsing from.
    let resume = old.entries.iter().rposition(|e| e.token.end <= edit_start);
    let (start_pos, start_state) = match resume {
        Some(i) => (
            old.entries[i].token.end,
            old.entries[i].state_after.clone(),
        ),
        None => (0, initial_state),
    };

    let mut entries: Vec<IndexedToken<S>> = old
        .entries
        .iter()
        .filter(|e| e.token.end <= start_pos)
        .cloned()
        .collect();
    let old_tail: Vec<&IndexedToken<S>> = old
        .entries
        .iter()
        .filter(|e| e.token.end > start_pos)
        .collect();

    // 2. Restart parsing; 3. walk forward comparing each newly produced
    // token (and the state after it) against the old tail shifted by
    // `shift`. Once CONVERGENCE consecutive tokens and the trailing state
    // agree, splice the untouched remainder of the old tail back in.
    let mut pos = start_pos;
    let mut state = start_state;
    let mut old_idx = 0usize;
    let mut consecutive_matches = 0usize;

    'reparse: while pos < new_input.len() {
        let out = parse_fn(&new_input[pos..], state.clone());
        if out.consumed == 0 {
            tracing::warn!(
                target: "syntax.tokenizer",
                pos,
                "parse function made no progress during reparse"
            );
            break;
        }
        state = out.next_state;

        for t in out.tokens {
            let token = Token {
                start: t.start + pos,
                end: t.end + pos,
                role: t.role,
            };
            entries.push(IndexedToken {
                token,
                state_after: state.clone(),
            });

            let matches_old = old_tail.get(old_idx).is_some_and(|old| {
                shift_token(&old.token, shift) == token && old.state_after == state
            });
            old_idx += 1;
            if matches_old {
                consecutive_matches += 1;
            } else {
                consecutive_matches = 0;
            }

            if consecutive_matches >= CONVERGENCE {
                for old in old_tail.iter().skip(old_idx) {
                    entries.push(IndexedToken {
                        token: shift_token(&old.token, shift),
                        state_after: old.state_after.clone(),
                    });
                }
                break 'reparse;
            }
        }

        pos += out.consumed;
    }

    TokenIndex { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{consume_runes_like, map, or, recognize_token};
    use crate::token::Role;

    /// Each call consumes exactly one run: a number, an identifier, or
    /// whitespace (whitespace produces no token). Unlike pairing a token
    /// with its trailing separator, this lets reparse resume mid-whitespace.
    fn word_number_tokenizer() -> ParseFn<()> {
        let number = map(consume_runes_like(|c| c.is_ascii_digit()), |out| {
            recognize_token(Role::Number)(out)
        });
        let ident = map(consume_runes_like(|c| c.is_alphabetic()), |out| {
            recognize_token(Role::Identifier)(out)
        });
        let ws = consume_runes_like::<()>(|c| c == ' ');
        or(or(number, ident), ws)
    }

    #[test]
    fn parse_all_produces_sorted_non_overlapping_tokens() {
        let input: Vec<char> = "12 ab 34".chars().collect();
        let parse_fn = word_number_tokenizer();
        let index = parse_all(&input, &parse_fn, ());
        let tokens: Vec<&Token> = index.tokens().collect();
        assert_eq!(tokens.len(), 3);
        let mut prev_end = 0;
        for t in &tokens {
            assert!(t.start >= prev_end);
            prev_end = t.end;
        }
    }

    #[test]
    fn reparse_incremental_converges_and_splices_untouched_tail() {
        let before: Vec<char> = "12 ab 34 cd 56".chars().collect();
        let parse_fn = word_number_tokenizer();
        let old_index = parse_all(&before, &parse_fn, ());
        assert_eq!(old_index.len(), 5);

        // Rename "ab" to "xy" in place: same length, same token boundaries,
        // so the tail should resync after exactly CONVERGENCE tokens and the
        // final "56" token should be spliced in from the old index untouched.
        let after: Vec<char> = "12 xy 34 cd 56".chars().collect();
        let new_index = reparse_incremental(&old_index, (), &after, 3, 2, 2, &parse_fn);

        let tokens: Vec<&Token> = new_index.tokens().collect();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token { start: 0, end: 2, role: Role::Number });
        assert_eq!(tokens[1], Token { start: 3, end: 5, role: Role::Identifier });
        assert_eq!(tokens[2], Token { start: 6, end: 8, role: Role::Number });
        assert_eq!(tokens[3], Token { start: 9, end: 11, role: Role::Identifier });
        assert_eq!(tokens[4], Token { start: 12, end: 14, role: Role::Number });
    }

    #[test]
    fn reparse_incremental_shifts_tail_after_length_changing_edit() {
        let before: Vec<char> = "12 ab 34 cd 56".chars().collect();
        let parse_fn = word_number_tokenizer();
        let old_index = parse_all(&before, &parse_fn, ());

        // Pad the gap between "34" and "cd" with two extra spaces: no token
        // boundary changes, everything from "cd" onward just shifts by +2.
        let after: Vec<char> = "12 ab 34   cd 56".chars().collect();
        let new_index = reparse_incremental(&old_index, (), &after, 8, 2, 0, &parse_fn);

        let tokens: Vec<&Token> = new_index.tokens().collect();
        assert_eq!(tokens.len(), 5);
        let old_tokens: Vec<&Token> = old_index.tokens().collect();
        for (new_t, old_t) in tokens.iter().take(3).zip(old_tokens.iter().take(3)) {
            assert_eq!(new_t.start, old_t.start);
            assert_eq!(new_t.end, old_t.end);
        }
        for (new_t, old_t) in tokens.iter().skip(3).zip(old_tokens.iter().skip(3)) {
            assert_eq!(new_t.start, old_t.start + 2);
            assert_eq!(new_t.end, old_t.end + 2);
        }
    }

    #[test]
    fn tokens_intersecting_range_filters_correctly() {
        let input: Vec<char> = "12 ab 34".chars().collect();
        let parse_fn = word_number_tokenizer();
        let index = parse_all(&input, &parse_fn, ());
        let hits: Vec<&Token> = index.tokens_intersecting_range(3, 5).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].role, Role::Identifier);
    }
}

//! Parser combinators: pure functions of (remaining runes, parser state) ->
//! (runes consumed, recognized tokens, next state), composed at construction
//! time into a single parse function per language.

use crate::token::{Role, Token};

/// Result of driving a parse function over a slice of the input.
///
/// Token offsets are relative to the slice that was handed to the parse
/// function, not to the document; combinators that sequence two parsers are
/// responsible for re-basing the second parser's token offsets.
#[derive(Debug, Clone)]
pub struct ParseOutput<S> {
    pub consumed: usize,
    pub tokens: Vec<Token>,
    pub next_state: S,
}

impl<S> ParseOutput<S> {
    fn empty(state: S) -> Self {
        ParseOutput {
            consumed: 0,
            tokens: Vec::new(),
            next_state: state,
        }
    }
}

/// A parse function: `(remaining runes, state) -> ParseOutput`.
pub type ParseFn<S> = Box<dyn Fn(&[char], S) -> ParseOutput<S>>;

/// Run `a`; on success (it consumed at least one rune) run `b` from the
/// post-`a` position, offsetting `b`'s tokens by `a`'s consumed count.
pub fn then<S: Clone + 'static>(a: ParseFn<S>, b: ParseFn<S>) -> ParseFn<S> {
    Box::new(move |input, state| {
        let ra = a(input, state.clone());
        if ra.consumed == 0 {
            return ra;
        }
        let mut rb = b(&input[ra.consumed..], ra.next_state);
        rebase(&mut rb.tokens, ra.consumed);
        let mut tokens = ra.tokens;
        tokens.append(&mut rb.tokens);
        ParseOutput {
            consumed: ra.consumed + rb.consumed,
            tokens,
            next_state: rb.next_state,
        }
    })
}

/// Try `a`, then require `b`. If `a` consumed nothing, run `b` at the
/// original position instead (so an optional leading piece doesn't block the
/// mandatory one).
pub fn maybe_before<S: Clone + 'static>(a: ParseFn<S>, b: ParseFn<S>) -> ParseFn<S> {
    Box::new(move |input, state| {
        let ra = a(input, state.clone());
        if ra.consumed == 0 {
            return b(input, state);
        }
        let mut rb = b(&input[ra.consumed..], ra.next_state);
        rebase(&mut rb.tokens, ra.consumed);
        let mut tokens = ra.tokens;
        tokens.append(&mut rb.tokens);
        ParseOutput {
            consumed: ra.consumed + rb.consumed,
            tokens,
            next_state: rb.next_state,
        }
    })
}

/// Run `a`; if it consumed zero runes, run `b` at the same position.
pub fn or<S: Clone + 'static>(a: ParseFn<S>, b: ParseFn<S>) -> ParseFn<S> {
    Box::new(move |input, state| {
        let ra = a(input, state.clone());
        if ra.consumed > 0 { ra } else { b(input, state) }
    })
}

/// Post-process the result of `p` (e.g. collapse its consumed span into a
/// single token, or override the next state).
pub fn map<S: 'static>(
    p: ParseFn<S>,
    f: impl Fn(ParseOutput<S>) -> ParseOutput<S> + 'static,
) -> ParseFn<S> {
    Box::new(move |input, state| f(p(input, state)))
}

fn rebase(tokens: &mut [Token], offset: usize) {
    for t in tokens {
        t.start += offset;
        t.end += offset;
    }
}

/// Match a literal string exactly.
pub fn consume_string<S: Clone + 'static>(literal: &'static str) -> ParseFn<S> {
    let wanted: Vec<char> = literal.chars().collect();
    Box::new(move |input, state| {
        if input.len() >= wanted.len() && input[..wanted.len()] == wanted[..] {
            ParseOutput {
                consumed: wanted.len(),
                tokens: Vec::new(),
                next_state: state,
            }
        } else {
            ParseOutput::empty(state)
        }
    })
}

/// Consume the maximal run of runes satisfying `pred` (possibly zero).
pub fn consume_runes_like<S: Clone + 'static>(pred: fn(char) -> bool) -> ParseFn<S> {
    Box::new(move |input, state| {
        let n = input.iter().take_while(|c| pred(**c)).count();
        ParseOutput {
            consumed: n,
            tokens: Vec::new(),
            next_state: state,
        }
    })
}

/// Consume runes up to (but not including) the next occurrence of `needle`,
/// or to end of input if `needle` never occurs.
pub fn consume_to_string<S: Clone + 'static>(needle: &'static str) -> ParseFn<S> {
    let needle: Vec<char> = needle.chars().collect();
    Box::new(move |input, state| {
        let consumed = if needle.is_empty() {
            0
        } else if needle.len() > input.len() {
            input.len()
        } else {
            (0..=input.len() - needle.len())
                .find(|&i| input[i..i + needle.len()] == needle[..])
                .unwrap_or(input.len())
        };
        ParseOutput {
            consumed,
            tokens: Vec::new(),
            next_state: state,
        }
    })
}

/// Consume runes up to (but not including) the next line feed, or to EOF.
pub fn consume_to_next_line_feed<S: Clone + 'static>() -> ParseFn<S> {
    Box::new(move |input, state| {
        let n = input.iter().take_while(|c| **c != '\n').count();
        ParseOutput {
            consumed: n,
            tokens: Vec::new(),
            next_state: state,
        }
    })
}

/// Consume runes until EOF or until a rune matching `pred` is encountered
/// (that rune is not consumed).
pub fn consume_until_eof_or_rune_like<S: Clone + 'static>(pred: fn(char) -> bool) -> ParseFn<S> {
    Box::new(move |input, state| {
        let n = input.iter().take_while(|c| !pred(**c)).count();
        ParseOutput {
            consumed: n,
            tokens: Vec::new(),
            next_state: state,
        }
    })
}

/// Run `p` only if the current state equals `expected`; otherwise fail
/// (consume nothing, state unchanged).
pub fn match_state<S: Clone + PartialEq + 'static>(expected: S, p: ParseFn<S>) -> ParseFn<S> {
    Box::new(move |input, state| {
        if state == expected {
            p(input, state)
        } else {
            ParseOutput::empty(state)
        }
    })
}

/// Consume nothing; transition unconditionally to `new_state`.
pub fn set_state<S: Clone + 'static>(new_state: S) -> ParseFn<S> {
    Box::new(move |_input, _state| ParseOutput::empty(new_state.clone()))
}

/// Run `p` seeded with `state`, ignoring whatever state was passed in. Used
/// to anchor the entry point of a grammar, or to resume parsing at a known
/// checkpoint.
pub fn initial_state<S: Clone + 'static>(state: S, p: ParseFn<S>) -> ParseFn<S> {
    Box::new(move |input, _ignored| p(input, state.clone()))
}

/// Collapse the entire consumed span of the wrapped parser into a single
/// token with `role`. Meant to be used with [`map`].
pub fn recognize_token<S>(role: Role) -> impl Fn(ParseOutput<S>) -> ParseOutput<S> {
    move |mut out| {
        if out.consumed > 0 {
            out.tokens = vec![Token {
                start: 0,
                end: out.consumed,
                role,
            }];
        }
        out
    }
}

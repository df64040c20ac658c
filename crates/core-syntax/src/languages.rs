//! Bundled language grammars.
//!
//! Two languages ship with the core: a no-op `Plaintext` tokenizer (the
//! default for every newly loaded buffer) and a small worked example,
//! `GitCommit`, demonstrating `then`/`maybe_before`/`or`/`consume_to_next_line_feed`
//! composition end to end. Additional grammars plug in the same way: define
//! a parser state, build a `ParseFn<LangState>` out of the combinators in
//! [`crate::combinators`], and add a match arm below.

use crate::combinators::{
    ParseFn, consume_runes_like, consume_string, consume_to_next_line_feed, initial_state, map,
    match_state, or, recognize_token, then,
};
use crate::token::Role;

/// Closed set of languages with a bundled tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Plaintext,
    GitCommit,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::Plaintext => "plaintext",
            Language::GitCommit => "gitcommit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "plaintext" => Some(Language::Plaintext),
            "gitcommit" => Some(Language::GitCommit),
            _ => None,
        }
    }
}

/// Parser state shared across every bundled grammar. Keeping a single
/// concrete type (rather than one per language) lets [`crate::tokenizer::TokenIndex`]
/// stay non-generic over the language actually in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangState {
    Plaintext,
    GitCommit(GitCommitState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitCommitState {
    Subject,
    Body,
}

pub fn initial_state_for(language: Language) -> LangState {
    match language {
        Language::Plaintext => LangState::Plaintext,
        Language::GitCommit => LangState::GitCommit(GitCommitState::Subject),
    }
}

/// Build the parse function for `language`. `Plaintext` consumes the whole
/// document without producing any tokens.
pub fn parse_fn_for(language: Language) -> ParseFn<LangState> {
    match language {
        Language::Plaintext => plaintext_parse_fn(),
        Language::GitCommit => gitcommit_parse_fn(),
    }
}

fn plaintext_parse_fn() -> ParseFn<LangState> {
    consume_runes_like(|_| true)
}

/// A git-commit-message-style grammar: the first line is the subject, a
/// blank line conventionally separates it from the body, and body lines
/// starting with `#` are comments (stripped by git before the commit is
/// recorded, so editors highlight them as such).
fn gitcommit_parse_fn() -> ParseFn<LangState> {
    let subject_state = LangState::GitCommit(GitCommitState::Subject);
    let body_state = LangState::GitCommit(GitCommitState::Body);

    let parse_subject = match_state(
        subject_state,
        map(consume_to_next_line_feed(), move |out| {
            let mut out = recognize_token(Role::Keyword)(out);
            if out.consumed > 0 {
                out.next_state = body_state;
            }
            out
        }),
    );

    let parse_comment = match_state(
        body_state,
        map(
            then(consume_string("#"), consume_to_next_line_feed()),
            recognize_token(Role::Comment),
        ),
    );

    // A newline never changes state: once the subject line has been
    // consumed, every later line (blank or not) is parsed in `Body` state.
    let parse_newline: ParseFn<LangState> = consume_string("\n");

    let parse_body_line: ParseFn<LangState> = consume_to_next_line_feed();

    initial_state(
        subject_state,
        or(
            or(parse_subject, parse_comment),
            or(parse_newline, parse_body_line),
        ),
    )
}

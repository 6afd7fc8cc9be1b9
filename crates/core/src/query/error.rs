//! Errors raised while tokenizing and compiling a search query.

use thiserror::Error;

/// A character the lexer could not classify.
///
/// Lex errors never abort a query: the character is skipped and
/// tokenization continues. They are collected so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal character {ch:?} at offset {offset}")]
pub struct LexError {
    pub ch: char,
    pub offset: usize,
}

/// Unrecoverable query compilation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("syntax error at {token:?} (offset {offset})")]
    UnexpectedToken { token: String, offset: usize },

    #[error("parse error: reached EOF while expecting data")]
    UnexpectedEof,

    #[error("invalid search keyword '{0}'")]
    UnknownKeyword(String),

    #[error("keyword '{keyword}' does not accept '{op}'")]
    UnsupportedOperator { keyword: String, op: String },

    #[error("invalid value {value:?} for keyword '{keyword}'")]
    InvalidValue { keyword: String, value: String },

    #[error("query nested deeper than {limit} levels (offset {offset})")]
    TooDeep { limit: usize, offset: usize },
}

//! Tokenizer for the search grammar.
//!
//! The lexer is lenient: characters outside the grammar are reported as
//! [`LexError`] diagnostics and skipped instead of aborting the query.

use std::fmt;

use tracing::warn;

use super::error::LexError;

/// Token classes produced by the [`Lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of alphanumerics and `. , { } /`.
    Word,
    /// Single or double quoted phrase, quotes stripped.
    Quoted,
    /// The reserved word `or`.
    Or,
    /// `-`
    Not,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `!`
    Exact,
    /// `:`
    KwEq,
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `!=`
    Ne,
}

impl TokenKind {
    /// Whether the token is a keyword comparison operator (not `:` or `=`).
    pub fn is_compare(self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Ge | Self::Le | Self::Ne)
    }

    /// Whether the token is `:` or `=`.
    pub fn is_eq(self) -> bool {
        matches!(self, Self::KwEq | Self::Eq)
    }
}

/// A classified lexical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the token in the source string.
    pub offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Words that are re-tagged after lexing, matched case-insensitively.
const RESERVED: &[(&str, TokenKind)] = &[("or", TokenKind::Or)];

/// Two-character operators are matched before their one-character prefixes.
const OPERATORS: &[(&str, TokenKind)] = &[
    (">=", TokenKind::Ge),
    ("<=", TokenKind::Le),
    ("!=", TokenKind::Ne),
    ("-", TokenKind::Not),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("!", TokenKind::Exact),
    (":", TokenKind::KwEq),
    ("=", TokenKind::Eq),
    (">", TokenKind::Gt),
    ("<", TokenKind::Lt),
];

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '{' | '}' | '/')
}

fn reserved_kind(word: &str) -> Option<TokenKind> {
    RESERVED
        .iter()
        .find(|(reserved, _)| reserved.eq_ignore_ascii_case(word))
        .map(|(_, kind)| *kind)
}

/// Lazy token stream over a search string.
///
/// A lexer is cheap to build; a new one over the same input yields the same
/// tokens.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Diagnostics collected so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Consume the lexer, returning all tokens and the diagnostics.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexError>) {
        let tokens = self.by_ref().collect();
        (tokens, self.errors)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_illegal(&mut self, ch: char) {
        let err = LexError {
            ch,
            offset: self.pos,
        };
        warn!("Illegal character {:?} at offset {}", ch, self.pos);
        self.errors.push(err);
        self.pos += ch.len_utf8();
    }

    fn lex_quoted(&mut self, quote: char) -> Option<Token> {
        let start = self.pos;
        let body = &self.rest()[1..];
        let end = body.find(quote)?;
        let text = body[..end].to_string();
        self.pos += end + 2;
        Some(Token {
            kind: TokenKind::Quoted,
            text,
            offset: start,
        })
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !is_word_char(c))
            .unwrap_or(self.rest().len());
        let text = &self.input[start..start + len];
        self.pos += len;
        Token {
            kind: reserved_kind(text).unwrap_or(TokenKind::Word),
            text: text.to_string(),
            offset: start,
        }
    }

    fn lex_operator(&mut self) -> Option<Token> {
        let rest = self.rest();
        let (op, kind) = OPERATORS.iter().find(|(op, _)| rest.starts_with(op))?;
        let token = Token {
            kind: *kind,
            text: (*op).to_string(),
            offset: self.pos,
        };
        self.pos += op.len();
        Some(token)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let ch = self.rest().chars().next()?;
            match ch {
                ' ' | '\t' => self.pos += 1,
                '"' | '\'' => match self.lex_quoted(ch) {
                    Some(token) => return Some(token),
                    None => self.skip_illegal(ch),
                },
                c if is_word_char(c) => return Some(self.lex_word()),
                _ => match self.lex_operator() {
                    Some(token) => return Some(token),
                    None => self.skip_illegal(ch),
                },
            }
        }
    }
}

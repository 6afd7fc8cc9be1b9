//! Recursive descent parser for the search grammar.
//!
//! ```text
//! option      := combination (OR combination)*
//! combination := term+
//! term        := '-' term
//!              | '(' option ')'
//!              | STRING | WORD
//!              | '!' (STRING | WORD)
//!              | WORD (':' | '=') '!'? (STRING | WORD)
//!              | WORD ('>' | '<' | '>=' | '<=' | '!=') WORD
//! ```
//!
//! Every rule returns the composed [`Predicate`] directly; there is no
//! intermediate tree. Negations and groups nest at most [`MAX_NESTING`]
//! levels deep.

use super::error::QueryError;
use super::keywords::{keyword_term, name_term, CompileOptions, Operator};
use super::lexer::{Token, TokenKind};
use super::predicate::Predicate;

/// Deepest allowed nesting of `-` and `(`.
pub const MAX_NESTING: usize = 128;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    options: &'a CompileOptions,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, options: &'a CompileOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            options,
        }
    }

    /// Parse the whole token stream. No tokens yields the empty predicate.
    pub fn parse(mut self) -> Result<Predicate, QueryError> {
        if self.tokens.is_empty() {
            return Ok(Predicate::default());
        }
        let predicate = self.option()?;
        match self.peek() {
            None => Ok(predicate),
            Some(token) => Err(unexpected(token)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn advance(&mut self) -> Result<Token, QueryError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(QueryError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    fn option(&mut self) -> Result<Predicate, QueryError> {
        let mut predicate = self.combination()?;
        while self.peek_kind() == Some(TokenKind::Or) {
            self.pos += 1;
            let rhs = self.combination()?;
            predicate = predicate.or(rhs);
        }
        Ok(predicate)
    }

    fn combination(&mut self) -> Result<Predicate, QueryError> {
        let mut predicate = self.term()?;
        while self.peek_kind().is_some_and(starts_term) {
            let rhs = self.term()?;
            predicate = predicate.and(rhs);
        }
        Ok(predicate)
    }

    fn term(&mut self) -> Result<Predicate, QueryError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Not => self.nested(&token, |p| Ok(p.term()?.negate())),
            TokenKind::LParen => self.nested(&token, |p| {
                let inner = p.option()?;
                let close = p.advance()?;
                if close.kind != TokenKind::RParen {
                    return Err(unexpected(&close));
                }
                Ok(inner.group())
            }),
            TokenKind::Quoted => Ok(name_term(&token.text, false)),
            TokenKind::Exact => {
                let value = self.value()?;
                Ok(name_term(&value.text, true))
            }
            TokenKind::Word => match self.peek_kind() {
                Some(kind) if kind.is_eq() || kind.is_compare() => self.keyword(token),
                _ => Ok(name_term(&token.text, false)),
            },
            _ => Err(unexpected(&token)),
        }
    }

    /// Run `rule` one nesting level below `opener`.
    fn nested<F>(&mut self, opener: &Token, rule: F) -> Result<Predicate, QueryError>
    where
        F: FnOnce(&mut Self) -> Result<Predicate, QueryError>,
    {
        if self.depth >= MAX_NESTING {
            return Err(QueryError::TooDeep {
                limit: MAX_NESTING,
                offset: opener.offset,
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// `keyword op [!] value`, with the keyword word already consumed.
    fn keyword(&mut self, keyword: Token) -> Result<Predicate, QueryError> {
        let op_token = self.advance()?;
        let op = Operator::from_token(op_token.kind).ok_or_else(|| unexpected(&op_token))?;

        let exact = op_token.kind.is_eq() && self.peek_kind() == Some(TokenKind::Exact);
        if exact {
            self.pos += 1;
        }

        let value = if op_token.kind.is_compare() {
            let value = self.advance()?;
            if value.kind != TokenKind::Word {
                return Err(unexpected(&value));
            }
            value
        } else {
            self.value()?
        };

        keyword_term(&keyword.text, op, exact, &value.text, self.options)
    }

    fn value(&mut self) -> Result<Token, QueryError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Word | TokenKind::Quoted => Ok(token),
            _ => Err(unexpected(&token)),
        }
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }
}

fn starts_term(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Not | TokenKind::LParen | TokenKind::Quoted | TokenKind::Word | TokenKind::Exact
    )
}

fn unexpected(token: &Token) -> QueryError {
    QueryError::UnexpectedToken {
        token: token.text.clone(),
        offset: token.offset,
    }
}

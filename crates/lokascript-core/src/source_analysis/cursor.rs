// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A read pointer over a token vector.
//!
//! The default lookahead (`peek`, `advance`) skips whitespace and newlines.
//! The raw variants see every token, which parsers use for adjacency checks
//! (`10ms`, `$name`) and for rebuilding source text such as naked URLs.

use ecow::EcoString;

use super::{Span, Token, TokenKind};

/// A saved cursor position, restored with [`TokenCursor::rewind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    position: usize,
    last: Option<usize>,
}

/// A read pointer over tokens ending in [`TokenKind::Eof`].
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    position: usize,
    last: Option<usize>,
}

impl TokenCursor {
    /// Wraps `tokens`, appending an end-of-input token if it is missing.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let (offset, line, column) = tokens
                .last()
                .map_or((0, 1, 1), |t| (t.byte_end, t.line, t.column + 1));
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: EcoString::new(),
                byte_start: offset,
                byte_end: offset,
                line,
                column,
                is_operator: false,
                is_template_fragment: false,
            });
        }
        Self {
            tokens,
            position: 0,
            last: None,
        }
    }

    fn eof_index(&self) -> usize {
        self.tokens.len() - 1
    }

    /// Index of the `n`th significant token at or after the current position.
    fn significant_index(&self, n: usize) -> usize {
        let mut remaining = n;
        let mut index = self.position;
        loop {
            if index >= self.eof_index() {
                return self.eof_index();
            }
            if !self.tokens[index].kind.is_insignificant() {
                if remaining == 0 {
                    return index;
                }
                remaining -= 1;
            }
            index += 1;
        }
    }

    /// The next significant token.
    #[must_use]
    pub fn peek(&self) -> &Token {
        &self.tokens[self.significant_index(0)]
    }

    /// The significant token `n` places after [`Self::peek`].
    #[must_use]
    pub fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[self.significant_index(n)]
    }

    /// The next token, whitespace included.
    #[must_use]
    pub fn peek_raw(&self) -> &Token {
        &self.tokens[self.position.min(self.eof_index())]
    }

    /// Consumes and returns the next significant token. At end of input the
    /// end token is returned repeatedly.
    pub fn advance(&mut self) -> Token {
        let index = self.significant_index(0);
        self.consume(index)
    }

    /// Consumes and returns the next token, whitespace included.
    pub fn advance_raw(&mut self) -> Token {
        let index = self.position.min(self.eof_index());
        self.consume(index)
    }

    fn consume(&mut self, index: usize) -> Token {
        if index < self.eof_index() {
            self.position = index + 1;
            self.last = Some(index);
        } else {
            self.position = index;
        }
        self.tokens[index].clone()
    }

    /// The most recently consumed token.
    #[must_use]
    pub fn last(&self) -> Option<&Token> {
        self.last.map(|index| &self.tokens[index])
    }

    /// Span of the most recently consumed token, or of the end token.
    #[must_use]
    pub fn last_span(&self) -> Span {
        self.last().map_or_else(|| self.peek().span(), Token::span)
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    /// Returns true if the next raw token is significant, i.e. nothing
    /// separates it from the last consumed token.
    #[must_use]
    pub fn is_adjacent(&self) -> bool {
        !self.peek_raw().kind.is_insignificant() && !self.peek_raw().is_eof()
    }

    /// Returns true if a newline separates the current position from the
    /// next significant token.
    #[must_use]
    pub fn newline_before_next(&self) -> bool {
        let next = self.significant_index(0);
        self.tokens[self.position.min(next)..next]
            .iter()
            .any(|t| t.kind == TokenKind::Newline)
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            last: self.last,
        }
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position;
        self.last = checkpoint.last;
    }

    /// All tokens, including the end token.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

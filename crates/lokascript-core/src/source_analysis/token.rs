// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types produced by the lexer.
//!
//! Keywords are not a separate kind: `on`, `if`, `then` and friends are
//! ordinary identifiers, and each parser compares their text. This keeps the
//! lexer language-neutral so the semantic matcher can reuse it for every
//! supported natural language.

use std::fmt;

use ecow::EcoString;
use serde::Serialize;

use super::Span;

/// The lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// A bare word: `toggle`, `me`, `クリック`.
    Identifier,
    /// A numeric literal: `42`, `3.14`, `1e-3`.
    Number,
    /// A quoted string: `"hi"` or `'hi'`. Text includes the quotes.
    String,
    /// A backtick string: `` `count: ${n}` ``. Text includes the backticks.
    TemplateString,
    /// `.active`
    ClassRef,
    /// `#output`
    IdRef,
    /// `@disabled` or `[@disabled]`
    AttributeRef,
    /// `*opacity`
    StyleRef,
    /// `<button.primary/>`
    QueryRef,
    /// Punctuation and operators from the fixed operator table.
    Operator,
    /// A run of spaces, tabs or carriage returns.
    Whitespace,
    /// A single `\n`.
    Newline,
    /// A character no other rule accepts.
    Unknown,
    /// End of input sentinel.
    Eof,
}

impl TokenKind {
    /// Returns true for tokens parsers skip by default.
    #[must_use]
    pub const fn is_insignificant(self) -> bool {
        matches!(self, Self::Whitespace | Self::Newline)
    }

    /// Returns true for `.class`, `#id` and `<query/>` references.
    #[must_use]
    pub const fn is_selector(self) -> bool {
        matches!(self, Self::ClassRef | Self::IdRef | Self::QueryRef)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::TemplateString => "template string",
            Self::ClassRef => "class reference",
            Self::IdRef => "id reference",
            Self::AttributeRef => "attribute reference",
            Self::StyleRef => "style reference",
            Self::QueryRef => "query literal",
            Self::Operator => "operator",
            Self::Whitespace => "whitespace",
            Self::Newline => "newline",
            Self::Unknown => "unknown character",
            Self::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token with its exact source position.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: EcoString,
    pub byte_start: u32,
    pub byte_end: u32,
    pub line: u32,
    pub column: u32,
    pub is_operator: bool,
    pub is_template_fragment: bool,
}

impl Token {
    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.byte_start, self.byte_end)
    }

    /// Returns true if this is the operator `op`.
    #[must_use]
    pub fn is_op(&self, op: &str) -> bool {
        self.is_operator && self.text == op
    }

    /// Returns true if this is the identifier `word`, ignoring ASCII case.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(word)
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::Newline => f.write_str("newline"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexing and grammar parsing for LokaScript source.
//!
//! # Lexical Analysis
//!
//! [`tokenize`] converts source text into a vector of [`Token`]s ending in a
//! [`TokenKind::Eof`] sentinel. Whitespace and newlines are kept as tokens so
//! parsers can check adjacency (`10ms`, `$name`); [`TokenCursor`] skips them
//! by default.
//!
//! ```
//! use lokascript_core::source_analysis::{tokenize, TokenCursor};
//!
//! let mut cursor = TokenCursor::new(tokenize("add .active"));
//! assert_eq!(cursor.advance().text, "add");
//! assert_eq!(cursor.advance().text, ".active");
//! assert!(cursor.is_at_end());
//! ```
//!
//! # Parsing
//!
//! [`parse`] turns tokens into a [`GrammarNode`]. Binary operator precedence
//! uses Pratt parsing. The parser stops at the first error, returned as a
//! [`ParseError`] with line, column and span.

mod cursor;
mod error;
mod lexer;
mod parser;
mod span;
mod token;


pub use cursor::{Checkpoint, TokenCursor};
pub use error::ParseError;
pub use lexer::{Lexer, tokenize};
pub(crate) use parser::unquote;
pub use parser::{
    ElseIfBlock, GrammarNode, RepeatForm, parse, parse_expression_source, parse_source,
};
pub use span::Span;
pub use token::{Token, TokenKind};

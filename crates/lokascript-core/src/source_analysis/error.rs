// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Syntax errors from the grammar parser.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::{Span, Token};

/// A syntax error. The grammar parser stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message} (line {line}, column {column})")]
#[diagnostic(code(lokascript::syntax))]
pub struct ParseError {
    pub message: EcoString,
    pub line: u32,
    pub column: u32,
    #[label("here")]
    pub span: Span,
}

impl ParseError {
    /// An error positioned at `token`.
    #[must_use]
    pub fn at(token: &Token, message: impl Into<EcoString>) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
            span: token.span(),
        }
    }

    /// "expected X, found Y" positioned at the offending token.
    #[must_use]
    pub fn expected(what: &str, found: &Token) -> Self {
        Self::at(found, format!("expected {what}, found {found}"))
    }
}

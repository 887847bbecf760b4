// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! LokaScript compiler core.
//!
//! This crate contains every compiler stage:
//! - Lexical analysis and the English grammar parser
//! - Multilingual pattern matching against per-language tables
//! - Conversion of both front ends' output to one shared AST
//! - Static analysis (variables, selectors, control flow, helpers)
//! - Code generation (JavaScript ES modules)
//!
//! [`Compiler`] ties the stages together.

#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod codegen;
pub mod interchange;
pub mod metadata;
pub mod runtime;
pub mod semantic;
pub mod semantic_analysis;
pub mod source_analysis;
pub mod template;
pub mod validate;

mod compiler;

pub use compiler::{
    BatchOutput, CompileError, CompileErrorKind, CompileOutput, Compiler, CompilerOptions,
    Frontend, FrontendKind, Location,
};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Node, VariableScope};
    pub use crate::semantic::{SemanticParser, SemanticResult};
    pub use crate::semantic_analysis::{AnalysisResult, analyze};
    pub use crate::source_analysis::{Span, Token, TokenKind, parse_source, tokenize};
    pub use crate::{CompileError, CompileOutput, Compiler, CompilerOptions};
}

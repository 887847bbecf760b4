// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! JavaScript code generation.
//!
//! This module lowers the shared AST into an ES module that imports its
//! helpers from the `lokascript/runtime` module. Generation is driven by the
//! [`AnalysisResult`] of the same program: the generator may only name
//! runtime helpers the analyzer registered (plus the always-available
//! `createContext`, `HALT` and `EXIT`), and it hoists lookups of selectors the
//! analyzer marked cacheable.
//!
//! # Output shape
//!
//! A plain program becomes a default-exported function:
//!
//! ```javascript
//! import { createContext, toggle } from "lokascript/runtime";
//!
//! export default function (me, event) {
//!   const ctx = createContext(event, me);
//!   toggle(ctx.me, "active");
//!   return ctx.result;
//! }
//! ```
//!
//! Event handlers become descriptors the runtime installs:
//!
//! ```javascript
//! export const handlers = [
//!   {
//!     event: "click",
//!     options: {},
//!     handler: function (me, event) { ... },
//!   },
//! ];
//! ```
//!
//! # Control flow
//!
//! `halt` and `exit` return the runtime's `HALT`/`EXIT` signal values and
//! `return` stores its value in `ctx.result`. Nothing is thrown for control
//! flow. The generator tracks a [`Flow`] per statement and stops emitting a
//! block after a statement that always leaves it.
//!
//! # Module Organization
//!
//! - [`document`] - Document tree and renderer
//! - `statements` - Programs, handlers, blocks and loops
//! - `commands` - One lowering per command
//! - `expressions` - Expressions, selectors and JavaScript literals

mod commands;
pub mod document;
mod expressions;
mod statements;

use std::collections::BTreeSet;

use ecow::EcoString;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::ast::Node;
use crate::runtime::{self, ALWAYS_AVAILABLE};
use crate::semantic_analysis::AnalysisResult;
use crate::docvec;
use document::{Document, line};

/// Errors that can occur during code generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeGenError {
    /// The generator needed a helper the analysis did not register.
    #[error("runtime helper '{helper}' was not registered by analysis")]
    HelperNotRegistered { helper: EcoString },

    #[error("command '{name}' cannot be compiled")]
    UnsupportedCommand { name: EcoString },

    #[error("{kind} cannot be compiled here")]
    UnsupportedNode { kind: EcoString },

    /// `break` or `continue` with no enclosing loop.
    #[error("'{name}' used outside a loop")]
    OutsideLoop { name: EcoString },
}

pub type Result<T> = std::result::Result<T, CodeGenError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Render without newlines or indentation.
    pub minify: bool,
}

/// A generated ES module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledOutput {
    pub code: String,
    /// Helpers the module imports, sorted.
    pub helpers: Vec<EcoString>,
    /// Selectors whose lookups were hoisted, in binding order.
    pub hoisted: Vec<EcoString>,
}

/// How control leaves a lowered statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Execution continues with the next statement.
    Normal,
    /// The statement always leaves the enclosing block.
    Signal(Signal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Halt,
    Exit,
    Break,
    Continue,
    Return,
}

/// Generates readable JavaScript for `program`.
pub fn generate(program: &Node, analysis: &AnalysisResult) -> Result<CompiledOutput> {
    generate_with(program, analysis, GenerateOptions::default())
}

#[instrument(skip_all, fields(kind = program.kind(), minify = options.minify))]
pub fn generate_with(
    program: &Node,
    analysis: &AnalysisResult,
    options: GenerateOptions,
) -> Result<CompiledOutput> {
    let mut generator = JsGenerator::new(analysis);
    let exports = generator.module(program)?;
    let document = generator.finish(exports);
    let code = if options.minify {
        document.to_flat_string()
    } else {
        document.to_pretty_string()
    };
    let output = CompiledOutput {
        code,
        helpers: generator.imports.iter().map(|&h| h.into()).collect(),
        hoisted: generator.hoisted,
    };
    debug!(
        helpers = output.helpers.len(),
        hoisted = output.hoisted.len(),
        bytes = output.code.len(),
        "generated module"
    );
    Ok(output)
}

/// Lowering state for one module.
struct JsGenerator<'a> {
    analysis: &'a AnalysisResult,
    imports: BTreeSet<&'static str>,
    /// Cacheable selectors, bound as `$sel<index>`.
    hoisted: Vec<EcoString>,
    loop_depth: usize,
    temps: usize,
    /// Lowering an event filter: bare names read the event.
    in_filter: bool,
}

impl<'a> JsGenerator<'a> {
    fn new(analysis: &'a AnalysisResult) -> Self {
        Self {
            analysis,
            imports: BTreeSet::new(),
            hoisted: Vec::new(),
            loop_depth: 0,
            temps: 0,
            in_filter: false,
        }
    }

    /// Names a runtime helper, adding it to the import list.
    fn require(&mut self, helper: &'static str) -> Result<&'static str> {
        if ALWAYS_AVAILABLE.contains(&helper) || self.analysis.requires(helper) {
            self.imports.insert(helper);
            Ok(helper)
        } else {
            Err(CodeGenError::HelperNotRegistered {
                helper: helper.into(),
            })
        }
    }

    /// A fresh suffix for temporaries.
    fn fresh(&mut self) -> usize {
        let n = self.temps;
        self.temps += 1;
        n
    }

    /// Imports, hoisted lookups, then the exports.
    fn finish(&self, exports: Vec<Document<'static>>) -> Document<'static> {
        let names: Vec<&str> = self.imports.iter().copied().collect();
        let mut parts = vec![docvec![
            "import { ",
            names.join(", "),
            " } from ",
            expressions::js_string(runtime::RUNTIME_MODULE),
            ";",
        ]];

        if !self.hoisted.is_empty() {
            let mut lookups = Vec::new();
            for (index, selector) in self.hoisted.iter().enumerate() {
                let helper = runtime::query_helper(selector);
                let css = expressions::js_string(&runtime::css_text(selector));
                if index > 0 {
                    lookups.push(line());
                }
                lookups.push(docvec![
                    format!("let $c{index};"),
                    line(),
                    format!("const $sel{index} = () => ($c{index} ??= {helper}({css}));"),
                ]);
            }
            parts.push(Document::Vec(lookups));
        }

        parts.extend(exports);
        let mut document = Vec::new();
        for part in parts {
            if !document.is_empty() {
                document.push(docvec![line(), line()]);
            }
            document.push(part);
        }
        document.push(line());
        Document::Vec(document)
    }
}

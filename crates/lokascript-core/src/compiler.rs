// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The compilation pipeline.
//!
//! [`Compiler::compile`] runs one script through template substitution, a
//! front end, conversion to the shared AST, analysis and code generation.
//! The front end is chosen by [`CompilerOptions::frontend`]:
//!
//! - `grammar`: the English grammar parser only;
//! - `semantic`: the pattern matcher for [`CompilerOptions::language`] only;
//! - `auto`: the pattern matcher first, falling back to the grammar parser
//!   when it finds no match at or above the confidence threshold.
//!
//! ```
//! use lokascript_core::{Compiler, CompilerOptions};
//!
//! let compiler = Compiler::new(CompilerOptions::default());
//! let output = compiler.compile("on click toggle .active").unwrap();
//! assert!(output.code.contains("toggle(ctx.me, \"active\");"));
//! ```

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::thread;

use ecow::EcoString;
use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::ast::Node;
use crate::codegen::{self, CodeGenError, GenerateOptions};
use crate::interchange::{DefaultConverter, NodeConverter};
use crate::metadata::ScriptMetadata;
use crate::semantic::SemanticParser;
use crate::semantic_analysis::{AnalysisResult, analyze};
use crate::source_analysis::{ParseError, Span, parse_source};
use crate::template;

/// Which front end reads the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontendKind {
    Grammar,
    Semantic,
    #[default]
    Auto,
}

/// A front end together with its settings.
#[derive(Debug, Clone, PartialEq)]
pub enum Frontend {
    Grammar,
    Semantic { language: EcoString },
    Auto { language: EcoString, threshold: f64 },
}

/// Settings for a [`Compiler`], readable from the `[compiler]` table of a
/// configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    pub frontend: FrontendKind,
    /// Language code for the pattern matcher.
    pub language: EcoString,
    /// Minimum confidence for an `auto` match to be used.
    pub confidence_threshold: f64,
    pub minify: bool,
    /// Values for `{{name}}` placeholders.
    pub template_vars: BTreeMap<EcoString, EcoString>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            frontend: FrontendKind::Auto,
            language: "en".into(),
            confidence_threshold: 0.7,
            minify: false,
            template_vars: BTreeMap::new(),
        }
    }
}

impl CompilerOptions {
    #[must_use]
    pub fn frontend(&self) -> Frontend {
        match self.frontend {
            FrontendKind::Grammar => Frontend::Grammar,
            FrontendKind::Semantic => Frontend::Semantic {
                language: self.language.clone(),
            },
            FrontendKind::Auto => Frontend::Auto {
                language: self.language.clone(),
                threshold: self.confidence_threshold,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompileErrorKind {
    Syntax,
    Codegen,
    /// The semantic front end was forced and nothing matched.
    NoMatch,
}

/// Where in the source an error was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub span: Span,
}

/// Why a script did not compile.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(lokascript::compile))]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
    pub location: Option<Location>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl CompileError {
    fn new(kind: CompileErrorKind, message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: location.map(|l| l.span.into()),
            location,
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        let location = Location {
            line: error.line,
            column: error.column,
            span: error.span,
        };
        Self::new(CompileErrorKind::Syntax, error.message.as_str(), Some(location))
    }
}

impl From<CodeGenError> for CompileError {
    fn from(error: CodeGenError) -> Self {
        Self::new(CompileErrorKind::Codegen, error.to_string(), None)
    }
}

/// A compiled script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub code: String,
    /// Runtime helpers imported by `code`.
    pub helpers: Vec<EcoString>,
    /// The front end that produced the AST.
    pub frontend: FrontendKind,
    /// Match confidence when the semantic front end was used.
    pub confidence: Option<f64>,
    pub analysis: AnalysisResult,
    pub metadata: ScriptMetadata,
    pub warnings: Vec<String>,
}

/// Results of [`Compiler::compile_batch`], keyed by script name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    pub compiled: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, ScriptMetadata>,
    /// Only scripts with at least one warning appear.
    pub warnings: BTreeMap<String, Vec<String>>,
    pub errors: BTreeMap<String, CompileError>,
}

/// Compiles scripts with fixed options and a fixed AST converter.
pub struct Compiler {
    options: CompilerOptions,
    converter: Box<dyn NodeConverter>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Compiler {
    #[must_use]
    pub fn new(options: CompilerOptions) -> Self {
        Self::with_converter(options, DefaultConverter)
    }

    #[must_use]
    pub fn with_converter(
        options: CompilerOptions,
        converter: impl NodeConverter + 'static,
    ) -> Self {
        Self {
            options,
            converter: Box::new(converter),
        }
    }

    #[must_use]
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles one script.
    #[instrument(skip_all, fields(len = source.len(), frontend = ?self.options.frontend))]
    pub fn compile(&self, source: &str) -> Result<CompileOutput, CompileError> {
        let placeholders = template::placeholders(source);
        let substituted = template::substitute(source, &self.options.template_vars);
        let mut warnings = substituted.warnings;
        let source = substituted.source.as_str();

        let (node, frontend, confidence) = self.front_end(source)?;
        let analysis = analyze(&node);
        warnings.extend(analysis.warnings.iter().cloned());

        let options = GenerateOptions {
            minify: self.options.minify,
        };
        let output = codegen::generate_with(&node, &analysis, options)?;
        let metadata = ScriptMetadata::from_analysis(&analysis, placeholders);
        Ok(CompileOutput {
            code: output.code,
            helpers: output.helpers,
            frontend,
            confidence,
            analysis,
            metadata,
            warnings,
        })
    }

    /// Compiles named scripts independently. A failing script is reported in
    /// [`BatchOutput::errors`] and does not stop the others.
    #[instrument(skip_all)]
    pub fn compile_batch<N, S>(&self, scripts: impl IntoIterator<Item = (N, S)>) -> BatchOutput
    where
        N: Into<String>,
        S: AsRef<str> + Send + Sync,
    {
        let scripts: Vec<(String, S)> = scripts
            .into_iter()
            .map(|(name, source)| (name.into(), source))
            .collect();
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let chunk = scripts.len().div_ceil(workers).max(1);
        debug!(scripts = scripts.len(), workers, "compiling batch");

        let results: Vec<(&str, Result<CompileOutput, CompileError>)> = thread::scope(|scope| {
            let handles: Vec<_> = scripts
                .chunks(chunk)
                .map(|group| {
                    scope.spawn(move || {
                        group
                            .iter()
                            .map(|(name, source)| (name.as_str(), self.compile(source.as_ref())))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(_) => {
                        warn!("a batch worker panicked");
                        Vec::new()
                    }
                })
                .collect()
        });

        let mut batch = BatchOutput::default();
        for (name, result) in results {
            match result {
                Ok(output) => {
                    batch.compiled.insert(name.to_owned(), output.code);
                    batch.metadata.insert(name.to_owned(), output.metadata);
                    if !output.warnings.is_empty() {
                        batch.warnings.insert(name.to_owned(), output.warnings);
                    }
                }
                Err(error) => {
                    batch.errors.insert(name.to_owned(), error);
                }
            }
        }
        for (name, _) in &scripts {
            if !batch.compiled.contains_key(name) && !batch.errors.contains_key(name) {
                let error = CompileError::new(
                    CompileErrorKind::Codegen,
                    "compilation did not complete",
                    None,
                );
                batch.errors.insert(name.clone(), error);
            }
        }
        batch
    }

    fn front_end(&self, source: &str) -> Result<(Node, FrontendKind, Option<f64>), CompileError> {
        match self.options.frontend() {
            Frontend::Grammar => self.grammar(source),
            Frontend::Semantic { language } => {
                let parser = SemanticParser::new().map_err(|error| {
                    CompileError::new(CompileErrorKind::NoMatch, error.to_string(), None)
                })?;
                let result = parser.analyze(source, &language);
                match result.node {
                    Some(node) => Ok((
                        self.converter.from_semantic(&node),
                        FrontendKind::Semantic,
                        Some(result.confidence),
                    )),
                    None => Err(CompileError::new(
                        CompileErrorKind::NoMatch,
                        result
                            .error
                            .map_or_else(|| "no pattern matched".to_owned(), |e| e.to_string()),
                        None,
                    )),
                }
            }
            Frontend::Auto {
                language,
                threshold,
            } => {
                let result = match SemanticParser::new() {
                    Ok(parser) => parser.analyze(source, &language),
                    Err(error) => {
                        warn!(%error, "language tables unavailable, using the grammar parser");
                        return self.grammar(source);
                    }
                };
                match result.node {
                    Some(node) if result.confidence >= threshold => Ok((
                        self.converter.from_semantic(&node),
                        FrontendKind::Semantic,
                        Some(result.confidence),
                    )),
                    _ => {
                        debug!(
                            confidence = result.confidence,
                            threshold, "falling back to the grammar parser"
                        );
                        self.grammar(source)
                    }
                }
            }
        }
    }

    fn grammar(&self, source: &str) -> Result<(Node, FrontendKind, Option<f64>), CompileError> {
        let grammar = parse_source(source)?;
        if let Some((kind, span)) = grammar.find_unsupported() {
            let (line, column) = line_column(source, span.start());
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                format!("{kind} is not supported"),
                Some(Location { line, column, span }),
            ));
        }
        Ok((self.converter.from_grammar(&grammar), FrontendKind::Grammar, None))
    }
}

/// 1-based line and character column of a byte offset.
fn line_column(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().unwrap_or(before).chars().count() + 1;
    (
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

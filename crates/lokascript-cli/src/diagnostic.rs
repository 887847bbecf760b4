// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Compile errors rendered against their script.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use camino::Utf8Path;
use lokascript_core::{CompileError, CompileErrorKind};
use miette::{Diagnostic, NamedSource, SourceSpan};

/// A compile error with the script it came from.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(lokascript::compile))]
pub struct ScriptDiagnostic {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("{label}")]
    pub span: Option<SourceSpan>,
    pub label: String,
    #[help]
    pub help: Option<String>,
}

impl ScriptDiagnostic {
    pub fn from_compile_error(error: &CompileError, path: &Utf8Path, source: &str) -> Self {
        let help = match error.kind {
            CompileErrorKind::NoMatch => {
                Some("try `--frontend auto` to fall back to the English grammar".to_string())
            }
            CompileErrorKind::Syntax | CompileErrorKind::Codegen => None,
        };
        Self {
            message: error.message.clone(),
            src: NamedSource::new(path.as_str(), source.to_string()),
            span: error.span,
            label: "here".to_string(),
            help,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lokascript_core::{Compiler, CompilerOptions, FrontendKind};

    fn options(frontend: FrontendKind) -> CompilerOptions {
        CompilerOptions {
            frontend,
            ..CompilerOptions::default()
        }
    }

    #[test]
    fn syntax_errors_keep_their_span() {
        let source = "put 1 onto #x";
        let error = Compiler::new(options(FrontendKind::Grammar))
            .compile(source)
            .unwrap_err();
        let diagnostic =
            ScriptDiagnostic::from_compile_error(&error, Utf8Path::new("a.lks"), source);
        assert!(diagnostic.message.starts_with("expected"), "{}", diagnostic.message);
        let span = diagnostic.span.unwrap();
        assert_eq!((span.offset(), span.len()), (6, 4));
        assert!(diagnostic.help.is_none());
    }

    #[test]
    fn unmatched_scripts_suggest_auto() {
        let source = "take .selected";
        let error = Compiler::new(options(FrontendKind::Semantic))
            .compile(source)
            .unwrap_err();
        let diagnostic =
            ScriptDiagnostic::from_compile_error(&error, Utf8Path::new("b.lks"), source);
        assert!(diagnostic.help.unwrap().contains("--frontend auto"));
    }
}

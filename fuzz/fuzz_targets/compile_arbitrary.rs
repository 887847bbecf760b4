// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Feeds arbitrary text through the whole grammar pipeline: lexer, parser,
//! conversion, analysis and code generation. Errors are fine; panics are not.
//!
//! Seed the corpus in `fuzz/corpus/compile_arbitrary/` with `.lks` scripts.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lokascript_core::source_analysis::tokenize;
use lokascript_core::{Compiler, CompilerOptions, FrontendKind};

fuzz_target!(|data: &[u8]| {
    // Invalid UTF-8 never reaches the lexer
    if let Ok(source) = std::str::from_utf8(data) {
        let tokens = tokenize(source);
        assert!(tokens.last().is_some_and(|t| t.is_eof()));

        let compiler = Compiler::new(CompilerOptions {
            frontend: FrontendKind::Grammar,
            ..CompilerOptions::default()
        });
        let _ = compiler.compile(source);
    }
});

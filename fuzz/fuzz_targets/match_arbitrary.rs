// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Runs the pattern matcher on arbitrary text. The first byte picks the
//! language table.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lokascript_core::semantic::{SemanticParser, supported_languages};

fuzz_target!(|data: &[u8]| {
    let Some((&pick, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let (Ok(parser), Ok(languages)) = (SemanticParser::new(), supported_languages()) else {
        return;
    };
    let language = &languages[usize::from(pick) % languages.len()];
    let result = parser.analyze(text, &language.code);
    assert!((0.0..=1.0).contains(&result.confidence));
    assert_eq!(result.node.is_some(), result.error.is_none());
});

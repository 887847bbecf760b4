// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `lokascript tokens`: dump the lexer's output.

use camino::Utf8Path;
use lokascript_core::source_analysis::{Token, tokenize};
use miette::Result;

use crate::sources::read_scripts;

pub fn run(path: &Utf8Path) -> Result<()> {
    for script in read_scripts(path)? {
        println!("{}:", script.path);
        for token in tokenize(&script.source) {
            println!("{}", format_token(&token));
        }
    }
    Ok(())
}

/// `line:column  Kind  text`, with flags for operators and template fragments.
fn format_token(token: &Token) -> String {
    let kind = format!("{:?}", token.kind);
    let mut line = format!(
        "{:>4}:{:<4} {kind:<12} {}",
        token.line, token.column, token.text
    );
    if token.is_operator {
        line.push_str("  [op]");
    }
    if token.is_template_fragment {
        line.push_str("  [template]");
    }
    line.trim_end().to_string()
}

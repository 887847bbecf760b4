// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `lokascript match`: run the pattern matcher on one line of text.

use lokascript_core::semantic::{SemanticParser, SemanticResult};
use miette::{IntoDiagnostic, Result};

pub fn run(text: &str, language: &str) -> Result<()> {
    let result = match_text(text, language)?;
    println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    if let Some(error) = &result.error {
        miette::bail!("no match in '{language}': {error}");
    }
    Ok(())
}

fn match_text(text: &str, language: &str) -> Result<SemanticResult> {
    let parser = SemanticParser::new().into_diagnostic()?;
    Ok(parser.analyze(text, language))
}

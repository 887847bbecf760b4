// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Script validation.
//!
//! [`validate_basic`] catches the common mistakes (a script that does not
//! start with a command, unbalanced quotes and brackets) with text checks
//! alone. [`validate`] adds a full grammar parse when those pass.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::source_analysis::parse_source;

/// Words a script may begin with.
pub const STARTING_KEYWORDS: &[&str] = &[
    "on", "def", "init", "behavior", "set", "get", "call", "fetch", "put", "add", "remove",
    "toggle", "trigger", "send", "take", "log", "wait", "settle", "if", "repeat", "for", "while",
    "async", "tell", "transition", "measure", "go", "js", "return", "exit", "halt", "break",
    "continue", "throw", "install", "show", "hide", "increment", "decrement", "focus", "unless",
];

static POSSESSIVE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w's\b").ok());

/// Outcome of validating one script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Text-only checks.
#[must_use]
pub fn validate_basic(script: &str) -> ValidationResult {
    let script = script.trim();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if script.is_empty() {
        errors.push("script is empty".to_owned());
        return ValidationResult::from_findings(errors, warnings);
    }

    let first = script
        .split(|c: char| c.is_whitespace() || c == '.')
        .next()
        .unwrap_or_default();
    if !STARTING_KEYWORDS.contains(&first) {
        let preview: String = script.chars().take(30).collect();
        let ellipsis = if preview.len() < script.len() { "..." } else { "" };
        errors.push(format!(
            "script must start with a command or 'on', found '{preview}{ellipsis}'"
        ));
    }

    let has_possessive = POSSESSIVE.as_ref().is_some_and(|re| re.is_match(script));
    if !has_possessive && count_unescaped(script, '\'') % 2 != 0 {
        errors.push("unbalanced single quotes".to_owned());
    }
    if count_unescaped(script, '"') % 2 != 0 {
        errors.push("unbalanced double quotes".to_owned());
    }
    for (open, close, what) in [
        ('(', ')', "parentheses"),
        ('[', ']', "brackets"),
        ('{', '}', "braces"),
    ] {
        if script.matches(open).count() != script.matches(close).count() {
            errors.push(format!("unbalanced {what}"));
        }
    }

    if script.contains(" on click") && !script.starts_with("on ") {
        warnings.push("'on click' belongs at the start of the script".to_owned());
    }
    if script.to_lowercase().contains("onclick") && !script.contains("on click") {
        warnings.push("use 'on click' with a space, not 'onclick'".to_owned());
    }
    if script.contains("behavior ") && !script.contains("end") {
        warnings.push("a behavior definition should finish with 'end'".to_owned());
    }

    ValidationResult::from_findings(errors, warnings)
}

/// Text checks, then a grammar parse when they pass.
#[must_use]
pub fn validate(script: &str) -> ValidationResult {
    let mut result = validate_basic(script);
    if result.valid
        && let Err(error) = parse_source(script)
    {
        result.errors.push(error.to_string());
        result.valid = false;
    }
    result
}

fn count_unescaped(text: &str, quote: char) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            count += 1;
        }
    }
    count
}

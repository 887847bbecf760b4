// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `{{name}}` placeholders in script source.
//!
//! Placeholders are replaced before lexing. A placeholder with no value is
//! left in place so the front ends report it where it stands.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ecow::EcoString;
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").ok());

/// Source after substitution, with one warning per unknown placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub source: String,
    pub warnings: Vec<String>,
}

/// Placeholder names in order of first appearance.
#[must_use]
pub fn placeholders(source: &str) -> Vec<EcoString> {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return Vec::new();
    };
    let mut names: Vec<EcoString> = Vec::new();
    for captures in re.captures_iter(source) {
        let name = &captures[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.into());
        }
    }
    names
}

/// Replaces every placeholder that has a value in `vars`.
#[must_use]
pub fn substitute(source: &str, vars: &BTreeMap<EcoString, EcoString>) -> Substituted {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return Substituted {
            source: source.to_owned(),
            warnings: Vec::new(),
        };
    };
    let mut missing: Vec<EcoString> = Vec::new();
    let replaced = re.replace_all(source, |captures: &Captures<'_>| {
        let name = &captures[1];
        if let Some(value) = vars.get(name) {
            value.to_string()
        } else {
            if !missing.iter().any(|n| n == name) {
                missing.push(name.into());
            }
            captures[0].to_owned()
        }
    });
    Substituted {
        source: replaced.into_owned(),
        warnings: missing
            .into_iter()
            .map(|name| format!("template variable '{name}' has no value"))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<EcoString, EcoString> {
        pairs.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect()
    }

    #[test]
    fn names_in_order_without_duplicates() {
        let names = placeholders("put {{ greeting }} into #{{target}} then log {{greeting}}");
        assert_eq!(names, vec!["greeting", "target"]);
        assert!(placeholders("put 'x' into #out").is_empty());
    }

    #[test]
    fn known_names_are_replaced() {
        let result = substitute(
            "add .{{cls}} to #{{id}}",
            &vars(&[("cls", "active"), ("id", "menu")]),
        );
        assert_eq!(result.source, "add .active to #menu");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unknown_names_stay_and_warn_once() {
        let result = substitute("log {{a}} then log {{a}}", &vars(&[]));
        assert_eq!(result.source, "log {{a}} then log {{a}}");
        assert_eq!(result.warnings, vec!["template variable 'a' has no value"]);
    }
}

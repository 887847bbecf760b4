// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Selector classification.

use std::sync::LazyLock;

use ecow::EcoString;
use regex::Regex;
use serde::Serialize;

use crate::ast::{SelectorKind, selector_css};

/// Pseudo-classes whose matches change without the selector text changing.
static DYNAMIC_PSEUDO_CLASS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r":(?:not|has|is|where|nth-[a-z-]+|first-[a-z-]+|last-[a-z-]+|only-[a-z-]+|empty|focus(?:-within|-visible)?|hover|active|visited)\b",
    )
    .ok()
});

/// A plain `.class` or `#id` and nothing else.
static PLAIN_SELECTOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[.#][A-Za-z_][\w-]*$").ok());

/// A selector literal with every place it is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorInfo {
    pub selector: EcoString,
    pub usages: Vec<EcoString>,
    pub is_id: bool,
    /// Whether a lookup can be hoisted and reused.
    pub can_cache: bool,
}

impl SelectorInfo {
    #[must_use]
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.into(),
            usages: Vec::new(),
            is_id: SelectorKind::of(selector) == SelectorKind::Id,
            can_cache: can_cache(selector),
        }
    }
}

/// Returns false when the selector matches a dynamic pseudo-class.
#[must_use]
pub fn can_cache(selector: &str) -> bool {
    let css = selector_css(selector);
    DYNAMIC_PSEUDO_CLASS
        .as_ref()
        .is_some_and(|re| !re.is_match(css))
}

/// Returns true for a single class or id with no combinators or
/// pseudo-classes.
#[must_use]
pub fn is_pure(selector: &str) -> bool {
    PLAIN_SELECTOR.as_ref().is_some_and(|re| re.is_match(selector))
}

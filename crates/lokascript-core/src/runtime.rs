// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The runtime surface generated modules import from.
//!
//! The analyzer decides which of these helpers a program needs and the code
//! generator may only name helpers the analyzer registered, plus
//! [`ALWAYS_AVAILABLE`]. Both sides pick helpers through the functions in this
//! module so the two stay in agreement.

use crate::ast::{SelectorKind, selector_css};

/// Import specifier of the runtime module.
pub const RUNTIME_MODULE: &str = "lokascript/runtime";

/// Names the generator may use without the analyzer registering them.
pub const ALWAYS_AVAILABLE: &[&str] = &["createContext", "HALT", "EXIT"];

/// Every name the runtime exports.
pub const RUNTIME_EXPORTS: &[&str] = &[
    "HALT",
    "EXIT",
    "createContext",
    "resolveAttribute",
    "toggle",
    "toggleAttribute",
    "toggleBooleanAttribute",
    "getProperty",
    "setProperty",
    "insertContent",
    "show",
    "hide",
    "contains",
    "matches",
    "toArray",
    "first",
    "last",
    "random",
    "debounce",
    "throttle",
    "wait",
    "nextFrame",
    "delegate",
    "dispatch",
    "fetchJSON",
    "fetchText",
    "fetchHTML",
    "convert",
    "query",
    "queryAll",
    "bindAll",
    "ready",
];

/// Commands the code generator can lower. Anything else is analysed
/// generically and rejected by the generator.
pub const LOWERED_COMMANDS: &[&str] = &[
    "add",
    "remove",
    "take",
    "toggle",
    "put",
    "set",
    "append",
    "get",
    "call",
    "log",
    "show",
    "hide",
    "increment",
    "decrement",
    "wait",
    "settle",
    "send",
    "trigger",
    "fetch",
    "go",
    "focus",
    "blur",
    "halt",
    "exit",
    "break",
    "continue",
    "return",
    "throw",
];

/// Commands that act on each element of their target in turn.
pub const ELEMENT_COMMANDS: &[&str] = &["add", "remove", "take", "focus", "blur"];

#[must_use]
pub fn is_runtime_export(name: &str) -> bool {
    RUNTIME_EXPORTS.contains(&name)
}

/// `query` for `#id` selectors, `queryAll` for everything else.
#[must_use]
pub fn query_helper(selector: &str) -> &'static str {
    match SelectorKind::of(selector) {
        SelectorKind::Id => "query",
        _ => "queryAll",
    }
}

/// The fetch helper for an `as` format. JSON unless `text` or `html`.
#[must_use]
pub fn fetch_helper(format: Option<&str>) -> &'static str {
    match format.map(str::to_ascii_lowercase).as_deref() {
        Some("text") => "fetchText",
        Some("html") => "fetchHTML",
        _ => "fetchJSON",
    }
}

/// The helper behind a positional operator (`first`, `last`, `random`).
#[must_use]
pub fn positional_helper(operator: &str) -> Option<&'static str> {
    match operator {
        "first" => Some("first"),
        "last" => Some("last"),
        "random" => Some("random"),
        _ => None,
    }
}

/// The helper behind a word operator (`contains`, `in`, `matches`, `as`).
#[must_use]
pub fn operator_helper(operator: &str) -> Option<&'static str> {
    match operator {
        "contains" | "in" => Some("contains"),
        "matches" => Some("matches"),
        "as" => Some("convert"),
        _ => None,
    }
}

/// The CSS a selector literal queries: `<p/>` becomes `p` and `[@x=1]`
/// becomes `[x=1]`.
#[must_use]
pub fn css_text(selector: &str) -> String {
    let css = selector_css(selector);
    match css.strip_prefix("[@") {
        Some(rest) => format!("[{rest}"),
        None => css.to_string(),
    }
}

/// An attribute selector split into name and optional value:
/// `[@disabled]` or `[@aria-expanded="true"]`.
#[must_use]
pub fn attribute_parts(selector: &str) -> Option<(&str, Option<&str>)> {
    let inner = selector.strip_prefix("[@")?.strip_suffix(']')?;
    Some(match inner.split_once('=') {
        Some((name, value)) => (name.trim(), Some(unquote_value(value.trim()))),
        None => (inner.trim(), None),
    })
}

fn unquote_value(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

/// The helper that toggles one `toggle` argument, or `None` when the argument
/// is not a class or attribute selector.
#[must_use]
pub fn toggle_helper(selector: &str) -> Option<&'static str> {
    match SelectorKind::of(selector) {
        SelectorKind::Class => Some("toggle"),
        SelectorKind::Attribute => Some(match attribute_parts(selector) {
            Some((_, Some(_))) => "toggleAttribute",
            _ => "toggleBooleanAttribute",
        }),
        _ => None,
    }
}

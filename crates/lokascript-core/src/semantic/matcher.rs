// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Template matching and role classification.

use std::ops::Range;

use ecow::EcoString;

use crate::ast::LiteralValue;
use crate::source_analysis::TokenKind;

use super::node::SemanticValue;
use super::pattern::{Element, LanguagePattern, Variant};
use super::tables::LanguageTable;
use super::tokenizer::{Tokenized, Word, tokenize_input};

/// Duration units understood in every language, in milliseconds.
const DURATION_UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("millisecond", 1.0),
    ("milliseconds", 1.0),
    ("s", 1000.0),
    ("sec", 1000.0),
    ("second", 1000.0),
    ("seconds", 1000.0),
];

/// English possessives, accepted in every language.
const POSSESSIVES: &[(&str, &str)] = &[("my", "me"), ("its", "it"), ("your", "you")];

/// Weight of the share of input consumed.
const CONSUMED_WEIGHT: f64 = 0.6;
/// Weight of the share of template literals matched.
const LITERAL_WEIGHT: f64 = 0.3;
/// Weight of the share of optional groups present.
const OPTIONAL_WEIGHT: f64 = 0.1;
/// Scale for the best partial match, keeping it well under any full match.
const PARTIAL_WEIGHT: f64 = 0.1;

/// A successful match of one pattern.
#[derive(Debug, Clone)]
pub(crate) struct PatternMatch<'p> {
    pub(crate) pattern: &'p LanguagePattern,
    /// Word ranges captured per role, relative to the matched slice.
    pub(crate) roles: Vec<(&'p str, Range<usize>)>,
    /// Number of words the match consumed.
    pub(crate) consumed: usize,
    pub(crate) confidence: f64,
}

/// The outcome of matching one statement.
#[derive(Debug, Clone)]
pub(crate) enum Outcome<'p> {
    Matched(PatternMatch<'p>),
    /// No pattern matched, but `pattern` shares some of the input's words.
    Partial {
        pattern: &'p LanguagePattern,
        confidence: f64,
    },
    NoMatch,
}

/// Matches `words` in full against `patterns`, tried in order. The first
/// full match wins.
pub(crate) fn match_statement<'p>(patterns: &[&'p LanguagePattern], words: &[Word]) -> Outcome<'p> {
    for pattern in patterns {
        if let Some(found) = match_pattern(pattern, words, Mode::Full) {
            return Outcome::Matched(found);
        }
    }

    patterns
        .iter()
        .filter_map(|pattern| {
            let share = literal_share(pattern, words);
            (share > 0.0).then_some((*pattern, share))
        })
        .fold(None, |best: Option<(&LanguagePattern, f64)>, (pattern, share)| match best {
            Some((_, best_share)) if best_share >= share => best,
            _ => Some((pattern, share)),
        })
        .map_or(Outcome::NoMatch, |(pattern, share)| Outcome::Partial {
            pattern,
            confidence: PARTIAL_WEIGHT * share,
        })
}

/// Matches a prefix of `words`, with each role taking exactly one word.
/// Used for event clauses.
pub(crate) fn match_prefix<'p>(
    patterns: &[&'p LanguagePattern],
    words: &[Word],
) -> Option<PatternMatch<'p>> {
    patterns
        .iter()
        .find_map(|pattern| match_pattern(pattern, words, Mode::Prefix))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Consume all input; roles take one or more words.
    Full,
    /// Consume a prefix; roles take one word.
    Prefix,
}

fn match_pattern<'p>(
    pattern: &'p LanguagePattern,
    words: &[Word],
    mode: Mode,
) -> Option<PatternMatch<'p>> {
    let markers: Vec<String> = pattern
        .template
        .literal_words()
        .map(str::to_lowercase)
        .collect();
    let group_count = pattern.template.group_count();

    for variant in pattern.template.variants() {
        let mut captures = Vec::new();
        let matcher = VariantMatcher {
            elements: &variant.elements,
            words,
            markers: &markers,
            mode,
        };
        if let Some(consumed) = matcher.step(0, 0, &mut captures) {
            return Some(PatternMatch {
                pattern,
                roles: captures,
                consumed,
                confidence: confidence(&variant, group_count),
            });
        }
    }
    None
}

/// Confidence of a successful match. A match consumes all the input it
/// covers and matches every literal on its path, so only the share of
/// optional groups present varies.
#[allow(clippy::cast_precision_loss)]
fn confidence(variant: &Variant<'_>, group_count: usize) -> f64 {
    let optional_share = if group_count == 0 {
        1.0
    } else {
        variant.groups_present as f64 / group_count as f64
    };
    CONSUMED_WEIGHT + LITERAL_WEIGHT + OPTIONAL_WEIGHT * optional_share
}

/// Share of a pattern's literal elements found anywhere in `words`.
#[allow(clippy::cast_precision_loss)]
fn literal_share(pattern: &LanguagePattern, words: &[Word]) -> f64 {
    let Some(variant) = pattern.template.variants().into_iter().next() else {
        return 0.0;
    };
    let literals: Vec<&Element<'_>> = variant
        .elements
        .iter()
        .filter(|e| matches!(e, Element::Literal { .. }))
        .collect();
    if literals.is_empty() {
        return 0.0;
    }
    let found = literals
        .iter()
        .filter(|literal| words.iter().any(|w| w.is_word() && literal.accepts(&w.text)))
        .count();
    found as f64 / literals.len() as f64
}

struct VariantMatcher<'a, 'p> {
    elements: &'a [Element<'p>],
    words: &'a [Word],
    markers: &'a [String],
    mode: Mode,
}

impl<'p> VariantMatcher<'_, 'p> {
    fn is_marker(&self, word: &Word) -> bool {
        word.is_word() && self.markers.contains(&word.text.to_lowercase().to_string())
    }

    /// Matches elements from `ei` against words from `wi`, returning the
    /// number of words consumed.
    fn step(
        &self,
        ei: usize,
        wi: usize,
        captures: &mut Vec<(&'p str, Range<usize>)>,
    ) -> Option<usize> {
        let Some(element) = self.elements.get(ei) else {
            return match self.mode {
                Mode::Full => (wi == self.words.len()).then_some(wi),
                Mode::Prefix => Some(wi),
            };
        };

        match *element {
            Element::Literal { .. } => {
                let word = self.words.get(wi)?;
                if word.is_word() && element.accepts(&word.text) {
                    self.step(ei + 1, wi + 1, captures)
                } else {
                    None
                }
            }
            Element::Role(name) => {
                let max_end = match self.mode {
                    Mode::Full => self.words.len(),
                    Mode::Prefix => (wi + 1).min(self.words.len()),
                };
                let last = ei + 1 == self.elements.len();
                for end in wi + 1..=max_end {
                    if self.is_marker(&self.words[end - 1]) {
                        break;
                    }
                    if last && self.mode == Mode::Full && end != self.words.len() {
                        continue;
                    }
                    captures.push((name, wi..end));
                    if let Some(consumed) = self.step(ei + 1, end, captures) {
                        return Some(consumed);
                    }
                    captures.pop();
                }
                None
            }
        }
    }
}

/// Classifies captured words into a role value.
pub(crate) fn classify(words: &[Word], input: &Tokenized, table: &LanguageTable) -> SemanticValue {
    match words {
        [word] => classify_word(word, table)
            .unwrap_or_else(|| SemanticValue::Expression(word.text.clone())),
        [number, unit] if number.kind == TokenKind::Number => {
            match (number.text.parse::<f64>(), unit_ms(&unit.text, table)) {
                (Ok(n), Some(scale)) => SemanticValue::Literal(LiteralValue::Number(n * scale)),
                _ => expression(words, input),
            }
        }
        [owner, property] if owner.kind == TokenKind::Identifier && property_word(property) => {
            match possessive(&owner.text, table) {
                Some(reference) => SemanticValue::PropertyPath {
                    object: Box::new(SemanticValue::Reference(reference)),
                    property: property.text.clone(),
                },
                None => expression(words, input),
            }
        }
        [owner, apostrophe, s, property]
            if apostrophe.text == "'" && s.text == "s" && property_word(property) =>
        {
            SemanticValue::PropertyPath {
                object: Box::new(
                    classify_word(owner, table)
                        .unwrap_or_else(|| SemanticValue::Expression(owner.text.clone())),
                ),
                property: property.text.clone(),
            }
        }
        _ => expression(words, input),
    }
}

/// Classifies a default value written in a table. A bare word that is not
/// a reference is a string.
pub(crate) fn classify_default(text: &str, table: &LanguageTable) -> SemanticValue {
    let tokenized = tokenize_input(text, table);
    match classify(&tokenized.words, &tokenized, table) {
        SemanticValue::Expression(word) if tokenized.words.len() <= 1 => {
            let text = if word.is_empty() { text.into() } else { word };
            SemanticValue::Literal(LiteralValue::String(text))
        }
        value => value,
    }
}

fn classify_word(word: &Word, table: &LanguageTable) -> Option<SemanticValue> {
    match word.kind {
        TokenKind::ClassRef | TokenKind::IdRef | TokenKind::QueryRef => {
            Some(SemanticValue::Selector(word.text.clone()))
        }
        TokenKind::AttributeRef if word.text.starts_with('[') => {
            Some(SemanticValue::Selector(word.text.clone()))
        }
        TokenKind::String => Some(SemanticValue::Literal(LiteralValue::String(
            crate::source_analysis::unquote(&word.text),
        ))),
        TokenKind::Number => word
            .text
            .parse::<f64>()
            .ok()
            .map(|n| SemanticValue::Literal(LiteralValue::Number(n))),
        TokenKind::Identifier => match word.text.as_str() {
            "true" => Some(SemanticValue::Literal(LiteralValue::Boolean(true))),
            "false" => Some(SemanticValue::Literal(LiteralValue::Boolean(false))),
            "null" => Some(SemanticValue::Literal(LiteralValue::Null)),
            text => reference(text, table).map(SemanticValue::Reference),
        },
        _ => None,
    }
}

fn expression(words: &[Word], input: &Tokenized) -> SemanticValue {
    SemanticValue::Expression(input.text_of(words).into())
}

fn property_word(word: &Word) -> bool {
    matches!(
        word.kind,
        TokenKind::Identifier | TokenKind::AttributeRef | TokenKind::StyleRef
    )
}

/// The canonical context word for a localized reference.
pub(crate) fn reference(word: &str, table: &LanguageTable) -> Option<EcoString> {
    if let Some(canonical) = table.references.get(word) {
        return Some(canonical.clone());
    }
    let lower = word.to_lowercase();
    crate::ast::CONTEXT_WORDS
        .iter()
        .find(|w| **w == lower)
        .map(|w| EcoString::from(*w))
}

fn possessive(word: &str, table: &LanguageTable) -> Option<EcoString> {
    if let Some(canonical) = table.possessives.get(word) {
        return Some(canonical.clone());
    }
    let lower = word.to_lowercase();
    POSSESSIVES
        .iter()
        .find(|(w, _)| *w == lower)
        .map(|(_, canonical)| EcoString::from(*canonical))
}

fn unit_ms(word: &str, table: &LanguageTable) -> Option<f64> {
    table.units.get(word).copied().or_else(|| {
        let lower = word.to_lowercase();
        DURATION_UNITS
            .iter()
            .find(|(unit, _)| *unit == lower)
            .map(|(_, ms)| *ms)
    })
}

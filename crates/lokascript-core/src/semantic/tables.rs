// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Per-language pattern tables.
//!
//! Tables are TOML files under `languages/`, embedded with `include_str!`
//! and compiled once into process-wide read-only state on first use.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pattern::{LanguagePattern, TemplateError};

/// Embedded table sources, keyed by language code.
const SOURCES: &[(&str, &str)] = &[
    ("en", include_str!("languages/en.toml")),
    ("ja", include_str!("languages/ja.toml")),
    ("ar", include_str!("languages/ar.toml")),
    ("es", include_str!("languages/es.toml")),
    ("zh", include_str!("languages/zh.toml")),
    ("ko", include_str!("languages/ko.toml")),
    ("tr", include_str!("languages/tr.toml")),
    ("id", include_str!("languages/id.toml")),
    ("it", include_str!("languages/it.toml")),
    ("vi", include_str!("languages/vi.toml")),
    ("pl", include_str!("languages/pl.toml")),
    ("ru", include_str!("languages/ru.toml")),
    ("uk", include_str!("languages/uk.toml")),
    ("hi", include_str!("languages/hi.toml")),
    ("bn", include_str!("languages/bn.toml")),
    ("th", include_str!("languages/th.toml")),
    ("ms", include_str!("languages/ms.toml")),
    ("de", include_str!("languages/de.toml")),
    ("fr", include_str!("languages/fr.toml")),
    ("pt", include_str!("languages/pt.toml")),
];

const DEFAULT_PRIORITY: u32 = 100;

static BUILTIN: LazyLock<Result<Tables, TableError>> =
    LazyLock::new(|| Tables::from_sources(SOURCES));

/// Errors loading a language table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("language table '{language}' is not valid TOML: {message}")]
    Toml { language: EcoString, message: String },

    #[error("language table '{language}' declares code '{declared}'")]
    CodeMismatch {
        language: EcoString,
        declared: EcoString,
    },

    #[error("language table '{language}', pattern '{pattern}': {source}")]
    Template {
        language: EcoString,
        pattern: EcoString,
        source: TemplateError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordOrder {
    Svo,
    Sov,
    Vso,
}

/// Descriptive data for one supported language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub code: EcoString,
    pub name: EcoString,
    pub native_name: EcoString,
    pub direction: Direction,
    pub word_order: WordOrder,
    /// Whether words are separated by spaces.
    pub spacing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LanguageFile {
    language: LanguageHeader,
    #[serde(default, rename = "pattern")]
    patterns: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LanguageHeader {
    code: EcoString,
    name: EcoString,
    native_name: EcoString,
    direction: Direction,
    word_order: WordOrder,
    spacing: bool,
    #[serde(default)]
    then: Vec<EcoString>,
    #[serde(default, rename = "else")]
    otherwise: Vec<EcoString>,
    #[serde(default)]
    end: Vec<EcoString>,
    #[serde(default)]
    vocabulary: Vec<EcoString>,
    #[serde(default)]
    events: BTreeMap<EcoString, EcoString>,
    #[serde(default)]
    references: BTreeMap<EcoString, EcoString>,
    #[serde(default)]
    possessives: BTreeMap<EcoString, EcoString>,
    #[serde(default)]
    units: BTreeMap<EcoString, f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternEntry {
    id: Option<EcoString>,
    command: EcoString,
    #[serde(default = "default_priority")]
    priority: u32,
    template: String,
    #[serde(default)]
    defaults: BTreeMap<EcoString, EcoString>,
}

const fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

/// A compiled language table.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    pub info: LanguageInfo,
    /// Statement separators, each a sequence of words.
    pub then_words: Vec<Vec<EcoString>>,
    pub else_words: Vec<Vec<EcoString>>,
    pub end_words: Vec<Vec<EcoString>>,
    /// Localized event names to DOM event names.
    pub events: BTreeMap<EcoString, EcoString>,
    /// Localized context words to `me`, `it`, `you`, `result` or `event`.
    pub references: BTreeMap<EcoString, EcoString>,
    /// Possessive pronouns to the context word they read from.
    pub possessives: BTreeMap<EcoString, EcoString>,
    /// Duration unit words to their length in milliseconds.
    pub units: BTreeMap<EcoString, f64>,
    /// Every known word, longest first, for segmenting unspaced text.
    pub vocabulary: Vec<EcoString>,
    /// Patterns in declaration order.
    pub patterns: Vec<LanguagePattern>,
}

impl LanguageTable {
    /// Compiles one TOML table. `code` is the key the table is registered
    /// under and must match the declared code.
    pub fn from_toml(code: &str, source: &str) -> Result<Self, TableError> {
        let file: LanguageFile = toml::from_str(source).map_err(|e| TableError::Toml {
            language: code.into(),
            message: e.message().to_string(),
        })?;
        let header = file.language;
        if header.code != code {
            return Err(TableError::CodeMismatch {
                language: code.into(),
                declared: header.code,
            });
        }

        let mut per_command: BTreeMap<EcoString, usize> = BTreeMap::new();
        let mut patterns = Vec::with_capacity(file.patterns.len());
        for entry in file.patterns {
            let ordinal = per_command.entry(entry.command.clone()).or_default();
            *ordinal += 1;
            let id = entry
                .id
                .unwrap_or_else(|| EcoString::from(format!("{code}-{}-{ordinal}", entry.command)));
            let pattern = LanguagePattern::new(
                id.clone(),
                code,
                entry.command,
                entry.priority,
                &entry.template,
                &entry.defaults,
            )
            .map_err(|source| TableError::Template {
                language: code.into(),
                pattern: id,
                source,
            })?;
            patterns.push(pattern);
        }

        let split = |words: &[EcoString]| -> Vec<Vec<EcoString>> {
            words
                .iter()
                .map(|w| w.split_whitespace().map(EcoString::from).collect())
                .filter(|w: &Vec<EcoString>| !w.is_empty())
                .collect()
        };

        let mut vocabulary: BTreeSet<EcoString> = header.vocabulary.iter().cloned().collect();
        for pattern in &patterns {
            vocabulary.extend(pattern.template.literal_words().map(EcoString::from));
        }
        for words in [&header.then, &header.otherwise, &header.end] {
            vocabulary.extend(words.iter().flat_map(|w| w.split_whitespace()).map(EcoString::from));
        }
        vocabulary.extend(header.events.keys().cloned());
        vocabulary.extend(header.references.keys().cloned());
        vocabulary.extend(header.possessives.keys().cloned());
        vocabulary.extend(header.units.keys().cloned());
        let mut vocabulary: Vec<EcoString> = vocabulary.into_iter().collect();
        vocabulary.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        Ok(Self {
            info: LanguageInfo {
                code: header.code,
                name: header.name,
                native_name: header.native_name,
                direction: header.direction,
                word_order: header.word_order,
                spacing: header.spacing,
            },
            then_words: split(&header.then),
            else_words: split(&header.otherwise),
            end_words: split(&header.end),
            events: header.events,
            references: header.references,
            possessives: header.possessives,
            units: header.units,
            vocabulary,
            patterns,
        })
    }

    /// Statement patterns sorted by priority, highest first. Ties keep
    /// declaration order.
    pub fn statement_patterns(&self) -> Vec<&LanguagePattern> {
        let mut patterns: Vec<&LanguagePattern> =
            self.patterns.iter().filter(|p| p.command != "on").collect();
        patterns.sort_by(|a, b| b.priority.cmp(&a.priority));
        patterns
    }

    /// Event-clause patterns sorted like [`Self::statement_patterns`].
    pub fn event_patterns(&self) -> Vec<&LanguagePattern> {
        let mut patterns: Vec<&LanguagePattern> =
            self.patterns.iter().filter(|p| p.command == "on").collect();
        patterns.sort_by(|a, b| b.priority.cmp(&a.priority));
        patterns
    }
}

/// A set of compiled language tables.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    languages: BTreeMap<EcoString, LanguageTable>,
}

impl Tables {
    /// Compiles `(code, toml)` pairs.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, TableError> {
        let mut languages = BTreeMap::new();
        for (code, source) in sources {
            languages.insert(EcoString::from(*code), LanguageTable::from_toml(code, source)?);
        }
        Ok(Self { languages })
    }

    /// The tables embedded in the binary.
    pub fn builtin() -> Result<&'static Self, TableError> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&LanguageTable> {
        self.languages.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageTable> {
        self.languages.values()
    }
}

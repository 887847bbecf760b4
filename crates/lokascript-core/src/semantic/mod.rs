// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Multilingual pattern matching.
//!
//! The semantic front end recognizes scripts written in any supported
//! natural language by matching statements against per-language templates
//! (see [`pattern`] for the template syntax and [`tables`] for the table
//! format). A recognized script becomes a [`SemanticNode`] tree whose
//! actions and role names are language-neutral.
//!
//! ```
//! use lokascript_core::semantic::SemanticParser;
//!
//! let parser = SemanticParser::new().unwrap();
//! let result = parser.analyze("クリック で .active を 切り替え", "ja");
//! let node = result.node.unwrap();
//! assert_eq!(node.action, "on");
//! assert!(result.confidence >= 0.9);
//! ```
//!
//! # Matching
//!
//! Input is split into statements on newlines and the language's `then`
//! words. A statement may open with an event clause (`on click`,
//! `クリック で`), matched as a prefix. Each statement must then be consumed
//! in full by one template; patterns are tried by descending priority, and
//! equal priorities keep table order. A full match scores at least 0.9.
//! When nothing matches, the result carries no node, an error, and a
//! confidence of at most 0.1 derived from the closest pattern.

pub mod node;
pub mod pattern;
pub mod tables;

mod matcher;
mod tokenizer;

use std::collections::{BTreeMap, VecDeque};

use ecow::EcoString;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::ast::{EventModifiers, LiteralValue};
use crate::source_analysis::TokenKind;

pub use node::{SemanticBranch, SemanticMetadata, SemanticNode, SemanticValue, kind};
pub use pattern::{ExtractionRule, LanguagePattern, PatternTemplate, PatternToken, TemplateError};
pub use tables::{Direction, LanguageInfo, LanguageTable, TableError, Tables, WordOrder};

use matcher::{Outcome, PatternMatch, classify, classify_default, match_prefix, match_statement};
use tokenizer::{Tokenized, Word, is_keyword, split_statements, starts_with_words, tokenize_input};

/// Result of semantic analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticResult {
    pub node: Option<SemanticNode>,
    /// In `[0, 1]`. At least 0.9 when `node` is set.
    pub confidence: f64,
    pub error: Option<EcoString>,
}

impl SemanticResult {
    fn failure(confidence: f64, message: impl Into<EcoString>) -> Self {
        Self {
            node: None,
            confidence,
            error: Some(message.into()),
        }
    }
}

/// Matches scripts against a set of language tables.
#[derive(Debug, Clone, Copy)]
pub struct SemanticParser<'t> {
    tables: &'t Tables,
}

impl SemanticParser<'static> {
    /// A parser over the built-in tables.
    pub fn new() -> Result<Self, TableError> {
        Ok(Self {
            tables: Tables::builtin()?,
        })
    }
}

impl<'t> SemanticParser<'t> {
    #[must_use]
    pub const fn with_tables(tables: &'t Tables) -> Self {
        Self { tables }
    }

    /// Languages this parser can analyze, ordered by code.
    pub fn languages(&self) -> impl Iterator<Item = &'t LanguageInfo> + use<'t> {
        let tables = self.tables;
        tables.iter().map(|table| &table.info)
    }

    /// Analyzes `text` written in `language`.
    #[instrument(skip_all, fields(language = language, len = text.len()))]
    pub fn analyze(&self, text: &str, language: &str) -> SemanticResult {
        let Some(table) = self.tables.get(language) else {
            return SemanticResult::failure(0.0, format!("unsupported language '{language}'"));
        };
        let input = tokenize_input(text, table);
        let statements = split_statements(&input.words, table);
        if statements.is_empty() {
            return SemanticResult::failure(0.0, "input is empty");
        }

        let mut builder = Builder::new(table, &input, statements);
        match builder.script() {
            Ok(node) => {
                debug!(
                    action = %node.action,
                    confidence = node.metadata.confidence,
                    "semantic match"
                );
                SemanticResult {
                    confidence: node.metadata.confidence,
                    node: Some(node),
                    error: None,
                }
            }
            Err(failure) => {
                debug!(
                    confidence = failure.confidence,
                    error = %failure.message,
                    "no semantic match"
                );
                SemanticResult::failure(failure.confidence, failure.message)
            }
        }
    }
}

/// Information about every built-in language.
pub fn supported_languages() -> Result<Vec<LanguageInfo>, TableError> {
    Ok(SemanticParser::new()?.languages().cloned().collect())
}

#[derive(Debug)]
struct Failure {
    confidence: f64,
    message: EcoString,
}

impl Failure {
    fn new(confidence: f64, message: impl Into<EcoString>) -> Self {
        Self {
            confidence,
            message: message.into(),
        }
    }
}

/// How a block ended.
enum Terminator<'w> {
    End,
    /// An `else` statement, with the words following the else word.
    Else(&'w [Word]),
    Eof,
}

struct Builder<'a> {
    table: &'a LanguageTable,
    input: &'a Tokenized,
    pending: VecDeque<&'a [Word]>,
    statement_patterns: Vec<&'a LanguagePattern>,
    event_patterns: Vec<&'a LanguagePattern>,
}

impl<'a> Builder<'a> {
    fn new(table: &'a LanguageTable, input: &'a Tokenized, statements: Vec<&'a [Word]>) -> Self {
        Self {
            table,
            input,
            pending: statements.into(),
            statement_patterns: table.statement_patterns(),
            event_patterns: table.event_patterns(),
        }
    }

    fn metadata(&self, confidence: f64, pattern_id: impl Into<EcoString>) -> SemanticMetadata {
        SemanticMetadata {
            confidence,
            pattern_id: pattern_id.into(),
            language: self.table.info.code.clone(),
        }
    }

    /// Top level: handlers and statements until input runs out.
    fn script(&mut self) -> Result<SemanticNode, Failure> {
        let mut nodes = Vec::new();
        while let Some(words) = self.pending.pop_front() {
            if let Some(clause) = self.event_clause(words) {
                nodes.push(self.event_handler(words, &clause)?);
            } else if is_keyword(words, &self.table.end_words) {
                return Err(self.unexpected(words));
            } else {
                nodes.push(self.statement(words)?);
            }
        }

        if nodes.len() == 1 {
            return nodes.pop().ok_or_else(|| Failure::new(0.0, "input is empty"));
        }
        let confidence = min_confidence(&nodes);
        let mut sequence = SemanticNode::new(
            kind::SEQUENCE,
            "sequence",
            self.metadata(confidence, "sequence"),
        );
        sequence.body = Some(nodes);
        Ok(sequence)
    }

    /// Matches an event clause at the start of `words`. The event role must
    /// be a plain word.
    fn event_clause(&self, words: &'a [Word]) -> Option<PatternMatch<'a>> {
        let clause = match_prefix(&self.event_patterns, words)?;
        let event_is_word = clause
            .roles
            .iter()
            .find(|(name, _)| *name == "event")
            .is_some_and(|(_, range)| {
                words[range.clone()]
                    .iter()
                    .all(|w| w.kind == TokenKind::Identifier)
            });
        event_is_word.then_some(clause)
    }

    fn event_handler(
        &mut self,
        words: &'a [Word],
        clause: &PatternMatch<'a>,
    ) -> Result<SemanticNode, Failure> {
        let rest = &words[clause.consumed..];
        if !rest.is_empty() {
            self.pending.push_front(rest);
        }
        let (body, _) = self.block(false)?;

        let mut modifiers = EventModifiers::default();
        let mut event = EcoString::new();
        for (role, range) in &clause.roles {
            let captured = &words[range.clone()];
            match *role {
                "event" => event = self.event_name(self.input.text_of(captured)),
                "source" => {
                    modifiers.from = Some(Box::new(classify(captured, self.input, self.table)));
                }
                _ => {}
            }
        }

        let confidence = clause.confidence.min(min_confidence(&body));
        let mut node = SemanticNode::new(
            kind::EVENT_HANDLER,
            "on",
            self.metadata(confidence, clause.pattern.id.clone()),
        );
        node.roles.insert(
            "event".into(),
            SemanticValue::Literal(LiteralValue::String(event)),
        );
        node.body = Some(body);
        node.event_modifiers = Some(modifiers);
        Ok(node)
    }

    /// Maps a localized event word to its DOM event name.
    fn event_name(&self, word: &str) -> EcoString {
        self.table
            .events
            .get(word)
            .or_else(|| self.table.events.get(word.to_lowercase().as_str()))
            .cloned()
            .unwrap_or_else(|| word.into())
    }

    /// Statements until an end word, an else word (when `allow_else`) or
    /// end of input.
    fn block(&mut self, allow_else: bool) -> Result<(Vec<SemanticNode>, Terminator<'a>), Failure> {
        let mut nodes = Vec::new();
        while let Some(words) = self.pending.pop_front() {
            if is_keyword(words, &self.table.end_words) {
                return Ok((nodes, Terminator::End));
            }
            if self.event_clause(words).is_some() {
                // A new handler closes every open block.
                self.pending.push_front(words);
                return Ok((nodes, Terminator::Eof));
            }
            if let Some(len) = self.else_prefix(words) {
                if !allow_else {
                    return Err(self.unexpected(words));
                }
                return Ok((nodes, Terminator::Else(&words[len..])));
            }
            nodes.push(self.statement(words)?);
        }
        Ok((nodes, Terminator::Eof))
    }

    /// Length of the else word sequence `words` starts with.
    fn else_prefix(&self, words: &[Word]) -> Option<usize> {
        self.table
            .else_words
            .iter()
            .find(|seq| starts_with_words(words, seq))
            .map(Vec::len)
    }

    fn statement(&mut self, words: &'a [Word]) -> Result<SemanticNode, Failure> {
        match match_statement(&self.statement_patterns, words) {
            Outcome::Matched(found) => {
                debug!(
                    pattern = %found.pattern.id,
                    confidence = found.confidence,
                    "matched statement"
                );
                match found.pattern.command.as_str() {
                    "if" | "unless" => self.conditional(words, &found),
                    "while" | "repeat" | "for" => self.looping(words, &found),
                    _ => Ok(self.command(words, &found)),
                }
            }
            Outcome::Partial { pattern, confidence } => Err(Failure::new(
                confidence,
                format!(
                    "'{}' did not match any {} pattern; closest was '{}'",
                    self.input.text_of(words),
                    self.table.info.name,
                    pattern.id
                ),
            )),
            Outcome::NoMatch => Err(Failure::new(
                0.0,
                format!(
                    "'{}' did not match any {} pattern",
                    self.input.text_of(words),
                    self.table.info.name
                ),
            )),
        }
    }

    fn command(&self, words: &[Word], found: &PatternMatch<'_>) -> SemanticNode {
        let mut node = SemanticNode::new(
            kind::COMMAND,
            found.pattern.command.clone(),
            self.metadata(found.confidence, found.pattern.id.clone()),
        );
        node.roles = self.roles(words, found);
        node
    }

    fn roles(
        &self,
        words: &[Word],
        found: &PatternMatch<'_>,
    ) -> BTreeMap<EcoString, SemanticValue> {
        let mut roles: BTreeMap<EcoString, SemanticValue> = found
            .roles
            .iter()
            .map(|(name, range)| {
                let value = classify(&words[range.clone()], self.input, self.table);
                (EcoString::from(*name), value)
            })
            .collect();
        for (role, rule) in &found.pattern.extraction {
            if let Some(default) = &rule.default
                && !roles.contains_key(role)
            {
                roles.insert(role.clone(), classify_default(default, self.table));
            }
        }
        roles
    }

    fn conditional(
        &mut self,
        words: &'a [Word],
        found: &PatternMatch<'a>,
    ) -> Result<SemanticNode, Failure> {
        let roles = self.roles(words, found);
        let (body, mut terminator) = self.block(true)?;
        let mut branches = Vec::new();
        while let Terminator::Else(rest) = terminator {
            let condition = self.else_if_condition(rest);
            if condition.is_none() && !rest.is_empty() {
                self.pending.push_front(rest);
            }
            let last = condition.is_none();
            let (branch_body, next) = self.block(!last)?;
            branches.push(SemanticBranch {
                condition,
                body: branch_body,
            });
            terminator = next;
        }

        let mut confidence = found.confidence.min(min_confidence(&body));
        for branch in &branches {
            confidence = confidence.min(min_confidence(&branch.body));
        }
        let mut node = SemanticNode::new(
            kind::CONDITIONAL,
            found.pattern.command.clone(),
            self.metadata(confidence, found.pattern.id.clone()),
        );
        node.roles = roles;
        node.body = Some(body);
        if !branches.is_empty() {
            node.branches = Some(branches);
        }
        Ok(node)
    }

    /// The condition of `else if ...`, when the words after the else word
    /// form a conditional.
    fn else_if_condition(&self, rest: &[Word]) -> Option<SemanticValue> {
        if rest.is_empty() {
            return None;
        }
        let Outcome::Matched(found) = match_statement(&self.statement_patterns, rest) else {
            return None;
        };
        if found.pattern.command != "if" {
            return None;
        }
        found
            .roles
            .iter()
            .find(|(name, _)| *name == "condition")
            .map(|(_, range)| classify(&rest[range.clone()], self.input, self.table))
    }

    fn looping(
        &mut self,
        words: &'a [Word],
        found: &PatternMatch<'a>,
    ) -> Result<SemanticNode, Failure> {
        let roles = self.roles(words, found);
        let (body, _) = self.block(false)?;
        let confidence = found.confidence.min(min_confidence(&body));
        let mut node = SemanticNode::new(
            kind::LOOP,
            found.pattern.command.clone(),
            self.metadata(confidence, found.pattern.id.clone()),
        );
        node.roles = roles;
        node.body = Some(body);
        Ok(node)
    }

    fn unexpected(&self, words: &[Word]) -> Failure {
        Failure::new(0.0, format!("unexpected '{}'", self.input.text_of(words)))
    }
}

/// The lowest confidence among `nodes`, or 1.0 for none.
fn min_confidence(nodes: &[SemanticNode]) -> f64 {
    nodes
        .iter()
        .map(|n| n.metadata.confidence)
        .fold(1.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str, language: &str) -> SemanticResult {
        SemanticParser::new()
            .unwrap_or_else(|e| panic!("{e}"))
            .analyze(text, language)
    }

    fn matched(text: &str, language: &str) -> SemanticNode {
        let result = analyze(text, language);
        result
            .node
            .unwrap_or_else(|| panic!("{text:?} ({language}) failed: {:?}", result.error))
    }

    fn selector(value: &str) -> SemanticValue {
        SemanticValue::Selector(value.into())
    }

    #[test]
    fn english_put_matches_fully() {
        let result = analyze("put \"Hello World\" into #output", "en");
        let node = result.node.expect("matched");
        assert_eq!(node.kind, kind::COMMAND);
        assert_eq!(node.action, "put");
        assert_eq!(
            node.role("patient"),
            Some(&SemanticValue::Literal(LiteralValue::String("Hello World".into())))
        );
        assert_eq!(node.role("destination"), Some(&selector("#output")));
        assert!(result.confidence >= 0.9);
        assert!(result.error.is_none());
    }

    #[test]
    fn japanese_event_handler() {
        let node = matched("クリック で .active を 切り替え", "ja");
        assert_eq!(node.kind, kind::EVENT_HANDLER);
        assert_eq!(
            node.role("event"),
            Some(&SemanticValue::Literal(LiteralValue::String("click".into())))
        );
        let body = node.body.expect("body");
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].action, "toggle");
        assert_eq!(body[0].role("patient"), Some(&selector(".active")));
        assert_eq!(body[0].metadata.language, "ja");
    }

    #[test]
    fn unspaced_japanese_matches() {
        let node = matched("クリックで.activeを切り替え", "ja");
        assert_eq!(node.body.expect("body")[0].action, "toggle");
    }

    #[test]
    fn arabic_add_with_destination() {
        let node = matched("أضف .active إلى #menu", "ar");
        assert_eq!(node.action, "add");
        assert_eq!(node.role("patient"), Some(&selector(".active")));
        assert_eq!(node.role("destination"), Some(&selector("#menu")));
    }

    #[test]
    fn korean_toggle_with_attached_particle() {
        let node = matched("클릭 시 .active를 토글", "ko");
        assert_eq!(node.body.expect("body")[0].action, "toggle");
    }

    #[test]
    fn spanish_handler_with_two_statements() {
        let node = matched("al clic añadir .activo entonces esperar 1 s", "es");
        let body = node.body.expect("body");
        let actions: Vec<_> = body.iter().map(|n| n.action.as_str()).collect();
        assert_eq!(actions, ["add", "wait"]);
        assert_eq!(
            body[1].role("duration"),
            Some(&SemanticValue::Literal(LiteralValue::Number(1000.0)))
        );
    }

    #[test]
    fn event_source_becomes_modifier() {
        let node = matched("on click from #button toggle .open", "en");
        let modifiers = node.event_modifiers.expect("modifiers");
        assert_eq!(modifiers.from.as_deref(), Some(&selector("#button")));
    }

    #[test]
    fn localized_event_names_map_to_dom_events() {
        let node = matched("当 点击 时 切换 .active", "zh");
        assert_eq!(
            node.role("event"),
            Some(&SemanticValue::Literal(LiteralValue::String("click".into())))
        );
    }

    #[test]
    fn conditional_with_else() {
        let node = matched("if x > 5\nadd .big\nelse\nremove .big\nend", "en");
        assert_eq!(node.kind, kind::CONDITIONAL);
        assert_eq!(node.role("condition"), Some(&SemanticValue::Expression("x > 5".into())));
        assert_eq!(node.body.as_ref().map(Vec::len), Some(1));
        let branches = node.branches.expect("branches");
        assert_eq!(branches.len(), 1);
        assert!(branches[0].condition.is_none());
        assert_eq!(branches[0].body[0].action, "remove");
    }

    #[test]
    fn else_if_chains() {
        let node = matched("if x\nshow me\nelse if y\nhide me\nelse\nlog 1\nend", "en");
        let branches = node.branches.expect("branches");
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].condition, Some(SemanticValue::Expression("y".into())));
        assert!(branches[1].condition.is_none());
    }

    #[test]
    fn loops_capture_their_body() {
        let node = matched("repeat 3 times\nincrement #count\nend", "en");
        assert_eq!(node.kind, kind::LOOP);
        assert_eq!(node.action, "repeat");
        assert_eq!(
            node.role("quantity"),
            Some(&SemanticValue::Literal(LiteralValue::Number(3.0)))
        );
        assert_eq!(node.body.map(|b| b.len()), Some(1));
    }

    #[test]
    fn statements_form_a_sequence() {
        let node = matched("add .a to #x\nremove .b from #y", "en");
        assert_eq!(node.kind, kind::SEQUENCE);
        assert_eq!(node.body.map(|b| b.len()), Some(2));
    }

    #[test]
    fn defaults_fill_missing_roles() {
        let node = matched("put 'x' into #out", "en");
        assert_eq!(
            node.role("position"),
            Some(&SemanticValue::Literal(LiteralValue::String("into".into())))
        );
    }

    #[test]
    fn partial_match_reports_closest_pattern() {
        let result = analyze("put #x somewhere", "en");
        assert!(result.node.is_none());
        assert!(result.confidence > 0.0 && result.confidence <= 0.1);
        let error = result.error.expect("error");
        assert!(error.contains("closest was 'en-put-"), "{error}");
    }

    #[test]
    fn unrelated_input_scores_zero() {
        let result = analyze("lorem ipsum dolor", "en");
        assert!(result.node.is_none());
        assert!(result.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_language_is_an_error() {
        let result = analyze("toggle .a", "xx");
        assert_eq!(result.error.as_deref(), Some("unsupported language 'xx'"));
    }

    #[test]
    fn stray_end_is_an_error() {
        let result = analyze("end", "en");
        assert!(result.error.is_some());
    }

    #[test]
    fn every_language_matches_its_event_handler() {
        let samples = [
            ("ar", "عند النقر بدّل .active"),
            ("bn", "ক্লিক হলে .active টগল"),
            ("de", "bei klick umschalten .active"),
            ("en", "on click toggle .active"),
            ("es", "al clic alternar .active"),
            ("fr", "au clic basculer .active"),
            ("hi", "क्लिक पर .active को टॉगल"),
            ("id", "saat klik alihkan .active"),
            ("it", "al clic alterna .active"),
            ("ja", "クリック で .active を 切り替え"),
            ("ko", "클릭 시 .active 를 토글"),
            ("ms", "apabila klik togol .active"),
            ("pl", "przy kliknięciu przełącz .active"),
            ("pt", "ao clicar alternar .active"),
            ("ru", "при клике переключить .active"),
            ("th", "เมื่อ คลิก สลับ .active"),
            ("tr", "tıklama olduğunda .active değiştir"),
            ("uk", "при кліку перемкнути .active"),
            ("vi", "khi nhấp chuyển đổi .active"),
            ("zh", "当 点击 时 切换 .active"),
        ];
        let parser = SemanticParser::new().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(parser.languages().count(), samples.len());
        for (language, text) in samples {
            let result = parser.analyze(text, language);
            let node = result
                .node
                .unwrap_or_else(|| panic!("{language}: {text:?} failed: {:?}", result.error));
            assert_eq!(node.kind, kind::EVENT_HANDLER, "{language}");
            assert_eq!(
                node.role("event"),
                Some(&SemanticValue::Literal(LiteralValue::String("click".into()))),
                "{language}"
            );
            let body = node.body.unwrap_or_default();
            assert_eq!(body.len(), 1, "{language}");
            assert_eq!(body[0].action, "toggle", "{language}");
            assert_eq!(body[0].role("patient"), Some(&selector(".active")), "{language}");
            assert!(result.confidence >= 0.9, "{language}: {}", result.confidence);
        }
    }

    #[test]
    fn supported_languages_lists_builtin_tables() {
        let languages = supported_languages().unwrap_or_else(|e| panic!("{e}"));
        let japanese = languages.iter().find(|l| l.code == "ja").expect("ja");
        assert_eq!(japanese.word_order, WordOrder::Sov);
        assert!(!japanese.spacing);
        let arabic = languages.iter().find(|l| l.code == "ar").expect("ar");
        assert_eq!(arabic.direction, Direction::Rtl);
    }
}

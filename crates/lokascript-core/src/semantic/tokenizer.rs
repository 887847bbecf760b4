// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Word splitting for the pattern matcher.
//!
//! Input goes through the main lexer so selectors, strings and numbers keep
//! the same shape as in grammar-parsed source. On top of that:
//!
//! - a space is inserted wherever Latin text meets another script, so
//!   `.active를` lexes as two words;
//! - `「...」` quotes become string tokens and `。` separates statements;
//! - adjacent `a-b` identifiers join into one word;
//! - in languages written without spaces, identifier runs are segmented by
//!   longest match against the table vocabulary.

use ecow::EcoString;

use crate::source_analysis::{TokenKind, tokenize};

use super::tables::LanguageTable;

/// A significant token with byte offsets into [`Tokenized::source`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Word {
    pub(crate) kind: TokenKind,
    pub(crate) text: EcoString,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Word {
    /// Returns true for tokens that can match a template literal.
    pub(crate) fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Operator)
    }

    pub(crate) fn is_separator(&self) -> bool {
        self.kind == TokenKind::Newline
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Tokenized {
    /// The input after script separation. Word offsets index this string.
    pub(crate) source: String,
    pub(crate) words: Vec<Word>,
}

impl Tokenized {
    /// The source text covered by `words`.
    pub(crate) fn text_of(&self, words: &[Word]) -> &str {
        match (words.first(), words.last()) {
            (Some(first), Some(last)) => self.source.get(first.start..last.end).unwrap_or(""),
            _ => "",
        }
    }
}

pub(crate) fn tokenize_input(input: &str, table: &LanguageTable) -> Tokenized {
    let source = separate_scripts(input);
    let tokens = tokenize(&source);
    let mut words: Vec<Word> = Vec::with_capacity(tokens.len());

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let start = token.byte_start as usize;
        let end = token.byte_end as usize;
        match (token.kind, token.text.as_str()) {
            (TokenKind::Eof | TokenKind::Whitespace, _) | (TokenKind::Unknown, "、" | "，") => {}
            (TokenKind::Unknown, open @ ("「" | "『")) => {
                let close = if open == "「" { "」" } else { "』" };
                let mut j = i + 1;
                while j < tokens.len() && !tokens[j].is_eof() && tokens[j].text != close {
                    j += 1;
                }
                let (inner_end, word_end) = match tokens.get(j) {
                    Some(t) if !t.is_eof() => (t.byte_start as usize, t.byte_end as usize),
                    _ => (source.len(), source.len()),
                };
                let inner = source.get(end..inner_end).unwrap_or("").trim();
                words.push(Word {
                    kind: TokenKind::String,
                    text: format!("\"{}\"", inner.replace('"', "\\\"")).into(),
                    start,
                    end: word_end,
                });
                i = j;
            }
            (TokenKind::Unknown, "。") | (TokenKind::Newline, _) => words.push(Word {
                kind: TokenKind::Newline,
                text: token.text.clone(),
                start,
                end,
            }),
            (TokenKind::Identifier, _) if joins_hyphen(&words, &tokens, i) => {
                words.pop();
                if let Some(previous) = words.last_mut() {
                    previous.text = format!("{}-{}", previous.text, token.text).into();
                    previous.end = end;
                }
            }
            _ => words.push(Word {
                kind: token.kind,
                text: token.text.clone(),
                start,
                end,
            }),
        }
        i += 1;
    }

    if !table.info.spacing {
        words = words
            .into_iter()
            .flat_map(|word| segment(word, &table.vocabulary))
            .collect();
    }

    Tokenized { source, words }
}

/// Returns true when `tokens[i]` continues a hyphenated word already in
/// `words` as `ident-`.
fn joins_hyphen(words: &[Word], tokens: &[crate::source_analysis::Token], i: usize) -> bool {
    let [.., before, hyphen] = words else {
        return false;
    };
    before.kind == TokenKind::Identifier
        && hyphen.kind == TokenKind::Operator
        && hyphen.text == "-"
        && before.end == hyphen.start
        && hyphen.end == tokens[i].byte_start as usize
}

/// Splits a statement list on separators and `then` words.
pub(crate) fn split_statements<'w>(words: &'w [Word], table: &LanguageTable) -> Vec<&'w [Word]> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < words.len() {
        let skip = if words[i].is_separator() {
            1
        } else {
            table
                .then_words
                .iter()
                .find(|seq| starts_with_words(&words[i..], seq))
                .map_or(0, Vec::len)
        };
        if skip == 0 {
            i += 1;
            continue;
        }
        if i > start {
            statements.push(&words[start..i]);
        }
        i += skip;
        start = i;
    }
    if start < words.len() {
        statements.push(&words[start..]);
    }
    statements
}

/// Returns true if `words` begins with the keyword sequence `sequence`.
pub(crate) fn starts_with_words(words: &[Word], sequence: &[EcoString]) -> bool {
    !sequence.is_empty()
        && words.len() >= sequence.len()
        && words.iter().zip(sequence).all(|(word, expected)| {
            word.kind == TokenKind::Identifier
                && word.text.to_lowercase() == expected.to_lowercase()
        })
}

/// Returns true if `words` is exactly one of `keywords`.
pub(crate) fn is_keyword(words: &[Word], keywords: &[Vec<EcoString>]) -> bool {
    keywords
        .iter()
        .any(|seq| seq.len() == words.len() && starts_with_words(words, seq))
}

fn is_latin(c: char) -> bool {
    c <= '\u{024F}'
        || ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{1E00}'..='\u{1EFF}').contains(&c)
}

fn is_other_script(c: char) -> bool {
    !c.is_whitespace() && !is_latin(c)
}

/// Inserts a space between ASCII text and text in a non-Latin script,
/// outside of `"` and backtick strings.
fn separate_scripts(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut previous: Option<char> = None;
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match quote {
            Some(q) => {
                if c == q && previous != Some('\\') {
                    quote = None;
                }
            }
            None => {
                if let Some(p) = previous
                    && ((p.is_ascii_graphic() && is_other_script(c))
                        || (is_other_script(p) && c.is_ascii_graphic()))
                {
                    out.push(' ');
                }
                if matches!(c, '"' | '`') {
                    quote = Some(c);
                }
            }
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

/// Splits a non-ASCII identifier by longest vocabulary match. Unknown runs
/// between matches stay together.
fn segment(word: Word, vocabulary: &[EcoString]) -> Vec<Word> {
    if word.kind != TokenKind::Identifier || word.text.is_ascii() {
        return vec![word];
    }
    let text = word.text.as_str();
    let piece = |from: usize, to: usize| Word {
        kind: TokenKind::Identifier,
        text: text[from..to].into(),
        start: word.start + from,
        end: word.start + to,
    };

    let mut pieces = Vec::new();
    let mut pending: Option<usize> = None;
    let mut position = 0;
    while position < text.len() {
        let rest = &text[position..];
        match vocabulary
            .iter()
            .find(|v| !v.is_empty() && rest.starts_with(v.as_str()))
        {
            Some(hit) => {
                if let Some(from) = pending.take() {
                    pieces.push(piece(from, position));
                }
                pieces.push(piece(position, position + hit.len()));
                position += hit.len();
            }
            None => {
                pending.get_or_insert(position);
                position += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    if let Some(from) = pending {
        pieces.push(piece(from, text.len()));
    }
    pieces
}

// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for LokaScript source.
//!
//! The lexer is hand-written because several rules depend on the token that
//! came immediately before:
//!
//! - `'` opens a string only when it cannot be a possessive (`value's`).
//! - `.` after a value is member access, elsewhere it starts a class reference.
//! - `//` starts a comment only at the start of input or after whitespace, so
//!   naked URLs such as `https://example.com` survive for the parser.
//!
//! Lexing never fails. Characters no rule accepts become
//! [`TokenKind::Unknown`] tokens and the parser decides what to report.
//!
//! ```
//! use lokascript_core::source_analysis::{tokenize, TokenKind};
//!
//! let kinds: Vec<_> = tokenize("toggle .active")
//!     .into_iter()
//!     .map(|t| t.kind)
//!     .collect();
//! assert_eq!(
//!     kinds,
//!     [TokenKind::Identifier, TokenKind::Whitespace, TokenKind::ClassRef, TokenKind::Eof]
//! );
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{Token, TokenKind};

/// Three-character operators, tried first.
const OPERATORS_3: &[&str] = &["===", "!==", "..."];

/// Two-character operators, tried after the three-character table.
const OPERATORS_2: &[&str] = &["==", "!=", "<=", ">=", "&&", "||", "->", "**", "+=", "-="];

/// Single-character operators.
const OPERATORS_1: &str = "+-*/%=<>!&|^~?:;,.()[]{}'#@$";

/// Hand-written lexer producing [`Token`]s in source order.
///
/// Iterating a `Lexer` yields every token except the final [`TokenKind::Eof`];
/// use [`tokenize`] to get the terminated vector.
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    position: usize,
    line: u32,
    column: u32,
    /// Kind and text of the last emitted token, whitespace included.
    previous: Option<(TokenKind, EcoString)>,
    finished: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("line", &self.line)
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 1,
            previous: None,
            finished: false,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n` characters past the next one (`n = 0` is [`Self::peek_char`]).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    fn remaining(&self) -> &'src str {
        &self.source[self.position..]
    }

    fn previous_kind(&self) -> Option<TokenKind> {
        self.previous.as_ref().map(|(kind, _)| *kind)
    }

    fn previous_is_operator(&self, ops: &[&str]) -> bool {
        matches!(&self.previous, Some((TokenKind::Operator, text)) if ops.contains(&text.as_str()))
    }

    /// True at the start of input or directly after whitespace.
    fn at_word_boundary(&self) -> bool {
        matches!(
            self.previous_kind(),
            None | Some(TokenKind::Whitespace | TokenKind::Newline)
        )
    }

    /// True when the previous token ends a value, making `.` member access.
    fn previous_ends_value(&self) -> bool {
        matches!(
            self.previous_kind(),
            Some(
                TokenKind::Identifier
                    | TokenKind::Number
                    | TokenKind::String
                    | TokenKind::TemplateString
                    | TokenKind::IdRef
                    | TokenKind::QueryRef
            )
        ) || self.previous_is_operator(&[")", "]"])
    }

    /// True when a `'` at the current position opens a string.
    fn quote_opens_string(&self) -> bool {
        let after_reference = matches!(
            self.previous_kind(),
            Some(
                TokenKind::Identifier
                    | TokenKind::ClassRef
                    | TokenKind::IdRef
                    | TokenKind::QueryRef
            )
        );
        !(after_reference || self.previous_is_operator(&[")", ">", "]"]))
    }

    /// Skips comments. Returns true if anything was skipped.
    fn skip_comment(&mut self) -> bool {
        match (self.peek_char(), self.peek_char_n(1)) {
            (Some('/'), Some('/')) if self.at_word_boundary() => {
                self.advance_while(|c| c != '\n');
                true
            }
            (Some('/'), Some('*')) => {
                self.advance();
                self.advance();
                loop {
                    match self.peek_char() {
                        None => break,
                        Some('*') if self.peek_char_n(1) == Some('/') => {
                            self.advance();
                            self.advance();
                            break;
                        }
                        Some(_) => {
                            self.advance();
                        }
                    }
                }
                true
            }
            (Some('-'), Some('-'))
                if self.at_word_boundary()
                    && self.peek_char_n(2).is_none_or(char::is_whitespace) =>
            {
                self.advance_while(|c| c != '\n');
                true
            }
            _ => false,
        }
    }

    /// Produces the next token, returning [`TokenKind::Eof`] at end of input.
    pub fn next_token(&mut self) -> Token {
        while self.skip_comment() {}

        let start = self.position;
        let (line, column) = (self.line, self.column);
        let mut is_template_fragment = false;

        let Some(c) = self.peek_char() else {
            return self.finish_token(TokenKind::Eof, start, line, column, false);
        };

        let kind = match c {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            c if c.is_whitespace() => {
                self.advance_while(|c| c.is_whitespace() && c != '\n');
                TokenKind::Whitespace
            }
            '0'..='9' => self.lex_number(),
            '"' => self.lex_string('"'),
            '\'' if self.quote_opens_string() => self.lex_string('\''),
            '`' => {
                is_template_fragment = self.lex_template();
                TokenKind::TemplateString
            }
            '.' if !self.previous_ends_value() && self.sigil_followed_by_name(true) => {
                self.lex_reference(TokenKind::ClassRef)
            }
            '#' if self.sigil_followed_by_name(false) => self.lex_reference(TokenKind::IdRef),
            '@' if self.sigil_followed_by_name(false) => {
                self.lex_reference(TokenKind::AttributeRef)
            }
            '*' if !self.previous_ends_value() && self.sigil_followed_by_name(false) => {
                self.lex_reference(TokenKind::StyleRef)
            }
            '[' if self.peek_char_n(1) == Some('@')
                && self.peek_char_n(2).is_some_and(is_name_start) =>
            {
                self.lex_bracket_attribute()
            }
            '<' if self.query_literal_len().is_some() => self.lex_query_literal(),
            c if is_ident_start(c) => {
                self.advance_while(is_ident_continue);
                TokenKind::Identifier
            }
            _ => self.lex_operator_or_unknown(),
        };

        self.finish_token(kind, start, line, column, is_template_fragment)
    }

    fn finish_token(
        &mut self,
        kind: TokenKind,
        start: usize,
        line: u32,
        column: u32,
        is_template_fragment: bool,
    ) -> Token {
        let text = EcoString::from(&self.source[start..self.position]);
        if kind == TokenKind::Eof {
            self.finished = true;
        } else {
            self.previous = Some((kind, text.clone()));
        }
        let span = super::Span::from(start..self.position);
        Token {
            kind,
            text,
            byte_start: span.start(),
            byte_end: span.end(),
            line,
            column,
            is_operator: kind == TokenKind::Operator,
            is_template_fragment,
        }
    }

    /// `digits[.digits][(e|E)[+|-]digits]`
    fn lex_number(&mut self) -> TokenKind {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exponent_digit_at = match self.peek_char_n(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self
                .peek_char_n(exponent_digit_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                for _ in 0..exponent_digit_at {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
        }
        TokenKind::Number
    }

    /// Lexes a quoted string. Unterminated strings run to end of input.
    fn lex_string(&mut self, quote: char) -> TokenKind {
        self.advance();
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                c if c == quote => break,
                _ => {}
            }
        }
        TokenKind::String
    }

    /// Lexes a backtick string, tracking `${...}` nesting.
    ///
    /// Returns true if the string contained at least one interpolation.
    fn lex_template(&mut self) -> bool {
        self.advance();
        let mut depth = 0u32;
        let mut interpolated = false;
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '$' if self.peek_char() == Some('{') => {
                    self.advance();
                    depth += 1;
                    interpolated = true;
                }
                '{' if depth > 0 => depth += 1,
                '}' if depth > 0 => depth -= 1,
                '`' if depth == 0 => break,
                _ => {}
            }
        }
        interpolated
    }

    fn sigil_followed_by_name(&self, allow_dash: bool) -> bool {
        match self.peek_char_n(1) {
            Some('-') if allow_dash => self.peek_char_n(2).is_some_and(is_name_start),
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    /// Lexes `.name`, `#name`, `@name` or `*name`, including pseudo-class
    /// suffixes such as `:hover` or `:not(.x)` on class and id references.
    fn lex_reference(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        self.advance_while(is_name_continue);
        if matches!(kind, TokenKind::ClassRef | TokenKind::IdRef) {
            while self.peek_char() == Some(':') && self.peek_char_n(1).is_some_and(is_name_start) {
                self.advance();
                self.advance_while(is_name_continue);
                if self.peek_char() == Some('(') {
                    self.skip_balanced_parens();
                }
            }
        }
        kind
    }

    fn skip_balanced_parens(&mut self) {
        let mut depth = 0u32;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    /// `[@name]` or `[@name="value"]`
    fn lex_bracket_attribute(&mut self) -> TokenKind {
        self.advance();
        self.advance();
        self.advance_while(is_name_continue);
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
            if c == ']' {
                break;
            }
        }
        TokenKind::AttributeRef
    }

    /// Byte length of a `<selector/>` literal starting here, if there is one.
    fn query_literal_len(&self) -> Option<usize> {
        let rest = self.remaining();
        let first = rest[1..].chars().next()?;
        if !(first.is_ascii_alphabetic() || matches!(first, '.' | '#' | '[' | '*')) {
            return None;
        }
        let line = rest.split('\n').next().unwrap_or(rest);
        let end = line.find("/>")?;
        if line[1..end].contains('<') {
            return None;
        }
        Some(end + 2)
    }

    fn lex_query_literal(&mut self) -> TokenKind {
        let len = self.query_literal_len().unwrap_or(1);
        let end = self.position + len;
        while self.position < end && self.advance().is_some() {}
        TokenKind::QueryRef
    }

    fn lex_operator_or_unknown(&mut self) -> TokenKind {
        let rest = self.remaining();
        let matched = OPERATORS_3
            .iter()
            .chain(OPERATORS_2)
            .find(|op| rest.starts_with(**op))
            .map(|op| op.chars().count());

        match matched {
            Some(len) => {
                for _ in 0..len {
                    self.advance();
                }
                TokenKind::Operator
            }
            None => match self.advance() {
                Some(c) if OPERATORS_1.contains(c) => TokenKind::Operator,
                _ => TokenKind::Unknown,
            },
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        (!token.is_eof()).then_some(token)
    }
}

/// Tokenizes `source`, ending with a single [`TokenKind::Eof`] token.
///
/// Whitespace tokens are kept; use [`super::TokenCursor`] to skip them.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.is_eof();
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

/// Characters treated as punctuation in CJK and Thai text.
fn is_wide_punctuation(c: char) -> bool {
    matches!(
        c,
        '「' | '」' | '『' | '』' | '、' | '。' | '，' | '！' | '？' | '：' | '；' | '（' | '）'
            | '\u{3000}'
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic()
        || c == '_'
        || (!c.is_ascii() && !c.is_whitespace() && !is_wide_punctuation(c))
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Eof))
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        significant(source).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn ends_with_single_eof() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());

        let tokens = tokenize("toggle");
        assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
    }

    #[test]
    fn iterator_excludes_eof() {
        let tokens: Vec<_> = Lexer::new("x + 1").collect();
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|t| !t.is_eof()));
    }

    #[test]
    fn whitespace_is_tokenized() {
        let tokens = tokenize("a  b\nc");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].text, "  ");
    }

    #[test]
    fn numbers() {
        for source in ["42", "3.14", "1e10", "2.5E-3", "7e+2"] {
            assert_eq!(significant(source), [(TokenKind::Number, source.to_string())]);
        }
    }

    #[test]
    fn number_without_fraction_digits_leaves_dot() {
        assert_eq!(
            significant("1.x"),
            [
                (TokenKind::Number, "1".into()),
                (TokenKind::Operator, ".".into()),
                (TokenKind::Identifier, "x".into()),
            ]
        );
    }

    #[test]
    fn exponent_needs_digits() {
        assert_eq!(
            significant("3em"),
            [
                (TokenKind::Number, "3".into()),
                (TokenKind::Identifier, "em".into()),
            ]
        );
    }

    #[test]
    fn possessive_apostrophe_is_operator() {
        assert_eq!(
            significant("my value's length"),
            [
                (TokenKind::Identifier, "my".into()),
                (TokenKind::Identifier, "value".into()),
                (TokenKind::Operator, "'".into()),
                (TokenKind::Identifier, "s".into()),
                (TokenKind::Identifier, "length".into()),
            ]
        );
    }

    #[test]
    fn single_quote_after_space_opens_string() {
        assert_eq!(
            significant("log 'hello world'"),
            [
                (TokenKind::Identifier, "log".into()),
                (TokenKind::String, "'hello world'".into()),
            ]
        );
    }

    #[test]
    fn single_quote_after_closing_operators_is_possessive() {
        assert_eq!(kinds("(x)'s")[3], TokenKind::Operator);
        assert_eq!(kinds("#box's")[1], TokenKind::Operator);
        assert_eq!(kinds(".item's")[1], TokenKind::Operator);
        assert_eq!(kinds("<p/>'s")[1], TokenKind::Operator);
    }

    #[test]
    fn double_quoted_string_with_escape() {
        assert_eq!(
            significant(r#""say \"hi\"""#),
            [(TokenKind::String, r#""say \"hi\"""#.into())]
        );
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(significant("\"open"), [(TokenKind::String, "\"open".into())]);
    }

    #[test]
    fn template_string_with_nested_braces() {
        let tokens = tokenize("`a ${ {x: 1}.x } b` c");
        assert_eq!(tokens[0].kind, TokenKind::TemplateString);
        assert_eq!(tokens[0].text, "`a ${ {x: 1}.x } b`");
        assert!(tokens[0].is_template_fragment);
        assert_eq!(tokens[2].text, "c");
    }

    #[test]
    fn plain_template_string_is_not_fragment() {
        let tokens = tokenize("`plain`");
        assert_eq!(tokens[0].kind, TokenKind::TemplateString);
        assert!(!tokens[0].is_template_fragment);
    }

    #[test]
    fn class_reference_takes_leading_fragment() {
        let tokens = significant(".a.b-c_d");
        assert_eq!(tokens[0], (TokenKind::ClassRef, ".a".into()));
        assert_eq!(tokens[1], (TokenKind::ClassRef, ".b-c_d".into()));
    }

    #[test]
    fn dot_after_id_or_query_is_member_access() {
        assert_eq!(
            significant("#x.value"),
            [
                (TokenKind::IdRef, "#x".into()),
                (TokenKind::Operator, ".".into()),
                (TokenKind::Identifier, "value".into()),
            ]
        );
        assert_eq!(
            kinds("<input/>.length"),
            [TokenKind::QueryRef, TokenKind::Operator, TokenKind::Identifier]
        );
    }

    #[test]
    fn sigil_references() {
        assert_eq!(
            kinds("#out @disabled [@data-id] *opacity .is-open"),
            [
                TokenKind::IdRef,
                TokenKind::AttributeRef,
                TokenKind::AttributeRef,
                TokenKind::StyleRef,
                TokenKind::ClassRef,
            ]
        );
    }

    #[test]
    fn sigil_without_name_is_operator() {
        assert_eq!(kinds("# 1"), [TokenKind::Operator, TokenKind::Number]);
        assert_eq!(kinds(". x"), [TokenKind::Operator, TokenKind::Identifier]);
        assert_eq!(kinds("@"), [TokenKind::Operator]);
    }

    #[test]
    fn dot_after_value_is_member_access() {
        assert_eq!(
            significant("event.detail"),
            [
                (TokenKind::Identifier, "event".into()),
                (TokenKind::Operator, ".".into()),
                (TokenKind::Identifier, "detail".into()),
            ]
        );
        assert_eq!(kinds("f().x")[3], TokenKind::Operator);
    }

    #[test]
    fn star_after_value_is_multiplication() {
        assert_eq!(
            kinds("x*y"),
            [TokenKind::Identifier, TokenKind::Operator, TokenKind::Identifier]
        );
        assert_eq!(kinds("set *opacity to 0")[1], TokenKind::StyleRef);
    }

    #[test]
    fn pseudo_class_suffix_stays_in_reference() {
        assert_eq!(
            significant(".sidebar:hover #list:not(.empty)"),
            [
                (TokenKind::ClassRef, ".sidebar:hover".into()),
                (TokenKind::IdRef, "#list:not(.empty)".into()),
            ]
        );
    }

    #[test]
    fn query_literal() {
        assert_eq!(
            significant("<button.primary/>"),
            [(TokenKind::QueryRef, "<button.primary/>".into())]
        );
        assert_eq!(
            kinds("x < y"),
            [TokenKind::Identifier, TokenKind::Operator, TokenKind::Identifier]
        );
    }

    #[test]
    fn operators_longest_first() {
        assert_eq!(
            significant("a === b !== c ... d == e <= f -> g ** h"),
            [
                (TokenKind::Identifier, "a".into()),
                (TokenKind::Operator, "===".into()),
                (TokenKind::Identifier, "b".into()),
                (TokenKind::Operator, "!==".into()),
                (TokenKind::Identifier, "c".into()),
                (TokenKind::Operator, "...".into()),
                (TokenKind::Identifier, "d".into()),
                (TokenKind::Operator, "==".into()),
                (TokenKind::Identifier, "e".into()),
                (TokenKind::Operator, "<=".into()),
                (TokenKind::Identifier, "f".into()),
                (TokenKind::Operator, "->".into()),
                (TokenKind::Identifier, "g".into()),
                (TokenKind::Operator, "**".into()),
                (TokenKind::Identifier, "h".into()),
            ]
        );
    }

    #[test]
    fn comments_are_discarded() {
        assert_eq!(
            kinds("toggle // trailing\n/* block */ add -- dash comment\nlog"),
            [
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn url_slashes_are_not_comments() {
        let text: String = tokenize("https://example.com")
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(text, "https://example.com");
    }

    #[test]
    fn decrement_operator_is_not_comment() {
        assert_eq!(kinds("x--"), [TokenKind::Identifier, TokenKind::Operator, TokenKind::Operator]);
    }

    #[test]
    fn unknown_characters_become_tokens() {
        assert_eq!(
            significant("toggle \u{00a7}"),
            [
                (TokenKind::Identifier, "toggle".into()),
                (TokenKind::Identifier, "\u{00a7}".into()),
            ]
        );
        assert_eq!(kinds("\\"), [TokenKind::Unknown]);
        assert_eq!(kinds("「"), [TokenKind::Unknown]);
    }

    #[test]
    fn non_latin_words_are_identifiers() {
        assert_eq!(
            significant("トグル .active"),
            [
                (TokenKind::Identifier, "トグル".into()),
                (TokenKind::ClassRef, ".active".into()),
            ]
        );
        assert_eq!(kinds("बदलें"), [TokenKind::Identifier]);
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("on click\n  toggle .x");
        let toggle = tokens.iter().find(|t| t.text == "toggle").unwrap();
        assert_eq!((toggle.line, toggle.column), (2, 3));
        assert_eq!(toggle.byte_start, 11);
        assert_eq!(toggle.byte_end, 17);
    }

    #[test]
    fn columns_count_characters() {
        let tokens = tokenize("é x");
        assert_eq!(tokens[2].column, 3);
        assert_eq!(tokens[2].byte_start, 3);
    }
}

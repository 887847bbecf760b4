// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! Binary operators use the Pratt table in [`super::binary_binding_power`];
//! word operators (`and`, `is not`, `mod`) are canonicalized to their symbol
//! form before the lookup.

use ecow::EcoString;

use super::{
    GrammarNode, MAX_EXPRESSION_SIZE, ParseResult, Parser, binary_binding_power,
    parse_expression_source,
};
use crate::ast::VariableScope;
use crate::source_analysis::{ParseError, Token, TokenKind};

/// Words that name the execution context.
const CONTEXT_REFERENCES: &[&str] = &["me", "I", "you", "it", "result", "event"];

/// Possessive pronouns and the context word they read from.
const POSSESSIVES: &[(&str, &str)] = &[("my", "me"), ("its", "it"), ("your", "you")];

/// Positional operators: `first of items`.
const POSITIONAL: &[&str] = &["first", "last", "random"];

impl Parser {
    /// Parses an expression.
    ///
    /// Uses `stacker::maybe_grow` to extend the stack on the heap for
    /// deeply nested input, on top of the nesting-depth limit.
    pub(super) fn parse_expression(&mut self) -> ParseResult<GrammarNode> {
        self.enter_nesting()?;
        let result = stacker::maybe_grow(32 * 1024, 256 * 1024, || self.parse_binary(0));
        self.leave_nesting();
        result
    }

    fn parse_binary(&mut self, min_bp: u8) -> ParseResult<GrammarNode> {
        let mut left = self.parse_unary()?;

        while let Some((operator, width)) = self.peek_binary_operator() {
            let Some(bp) = binary_binding_power(operator) else {
                break;
            };
            if bp.left < min_bp {
                break;
            }
            for _ in 0..width {
                self.advance();
            }

            self.grow_expression()?;
            if operator == "as" {
                let type_name = self.expect_identifier("a type name")?;
                left = GrammarNode::binary("as", left, GrammarNode::Str(type_name));
                continue;
            }

            let right = self.parse_operand(bp.right)?;
            left = GrammarNode::binary(operator, left, right);
        }

        Ok(left)
    }

    /// The right operand of a binary operator. Right associative operators
    /// recurse here once per operator.
    fn parse_operand(&mut self, min_bp: u8) -> ParseResult<GrammarNode> {
        self.enter_nesting()?;
        let result = stacker::maybe_grow(32 * 1024, 256 * 1024, || self.parse_binary(min_bp));
        self.leave_nesting();
        result
    }

    /// The canonical binary operator at the cursor and how many tokens it
    /// spans.
    fn peek_binary_operator(&self) -> Option<(&'static str, usize)> {
        let token = self.peek();
        match token.kind {
            TokenKind::Operator => {
                const SYMBOLS: &[&str] = &[
                    "||", "&&", "==", "!=", "===", "!==", "<", "<=", ">", ">=", "+", "-", "*",
                    "/", "%", "**",
                ];
                SYMBOLS
                    .iter()
                    .find(|op| token.text == **op)
                    .map(|op| (*op, 1))
            }
            TokenKind::Identifier => match token.text.to_lowercase().as_str() {
                "or" => Some(("||", 1)),
                "and" => Some(("&&", 1)),
                "mod" => Some(("%", 1)),
                "matches" => Some(("matches", 1)),
                "contains" => Some(("contains", 1)),
                "in" => Some(("in", 1)),
                "as" => Some(("as", 1)),
                "is" if self.cursor.peek_nth(1).is_word("not") => Some(("!=", 2)),
                "is" => Some(("==", 1)),
                _ => None,
            },
            _ => None,
        }
    }

    pub(super) fn parse_unary(&mut self) -> ParseResult<GrammarNode> {
        let token = self.peek().clone();
        let positional = POSITIONAL.iter().any(|w| token.is_word(w)) && {
            let next = self.cursor.peek_nth(1);
            next.is_word("of") || next.is_word("in") || next.kind.is_selector()
        };
        let operator: Option<EcoString> =
            if token.is_word("not") || token.is_word("no") || positional {
                Some(token.text.to_lowercase().into())
            } else if token.is_op("-") || token.is_op("!") {
                Some(token.text.clone())
            } else {
                None
            };

        let Some(operator) = operator else {
            let primary = self.parse_primary()?;
            return self.parse_postfix(primary);
        };

        self.advance();
        if positional && !self.match_word("of") {
            self.match_word("in");
        }
        self.enter_nesting()?;
        let operand = self.parse_unary();
        self.leave_nesting();
        let operand = operand?;

        Ok(match (operator.as_str(), operand) {
            ("-", GrammarNode::Number(n)) => GrammarNode::Number(-n),
            (_, operand) => GrammarNode::Unary {
                operator,
                operand: Box::new(operand),
            },
        })
    }

    pub(super) fn parse_primary(&mut self) -> ParseResult<GrammarNode> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                self.parse_number(&token)
            }
            TokenKind::String => {
                self.advance();
                Ok(GrammarNode::Str(unquote(&token.text)))
            }
            TokenKind::TemplateString => {
                self.advance();
                parse_template(&token)
            }
            TokenKind::ClassRef | TokenKind::IdRef | TokenKind::QueryRef => {
                self.advance();
                Ok(GrammarNode::Selector(token.text))
            }
            TokenKind::AttributeRef if token.text.starts_with('[') => {
                self.advance();
                Ok(GrammarNode::Selector(token.text))
            }
            TokenKind::AttributeRef | TokenKind::StyleRef => {
                self.advance();
                Ok(GrammarNode::PropertyAccess {
                    object: None,
                    property: token.text,
                })
            }
            TokenKind::Operator => match token.text.as_str() {
                "(" => {
                    self.advance();
                    let inner = self.parse_expression()?;
                    self.expect_op(")")?;
                    Ok(inner)
                }
                "[" => {
                    self.advance();
                    Ok(GrammarNode::Array(self.parse_arguments("]")?))
                }
                "{" => Ok(self.skip_unsupported_literal("object literal", "{", "}")),
                sigil @ (":" | "$" | "^") => {
                    let scope = VariableScope::from_sigil(sigil).unwrap_or(VariableScope::Local);
                    self.advance();
                    if self.cursor.peek_raw().kind != TokenKind::Identifier {
                        return Err(ParseError::expected("a variable name", self.cursor.peek_raw()));
                    }
                    let name = self.cursor.advance_raw().text;
                    Ok(GrammarNode::Variable { name, scope })
                }
                _ => Err(ParseError::expected("an expression", &token)),
            },
            TokenKind::Identifier => self.parse_word(&token),
            _ => Err(ParseError::expected("an expression", &token)),
        }
    }

    /// Number literal with an optional `ms`/`s` duration suffix, folded to
    /// milliseconds.
    fn parse_number(&mut self, token: &Token) -> ParseResult<GrammarNode> {
        let value: f64 = token
            .text
            .parse()
            .map_err(|_| ParseError::at(token, format!("invalid number {}", token.text)))?;

        let raw = self.cursor.peek_raw();
        let unit = if self.cursor.is_adjacent() && (raw.is_word("ms") || raw.is_word("s")) {
            Some(self.cursor.advance_raw().text)
        } else if ["milliseconds", "millisecond", "seconds", "second"]
            .iter()
            .any(|w| self.check_word(w))
        {
            Some(self.advance().text)
        } else {
            None
        };

        Ok(GrammarNode::Number(match unit.as_deref() {
            Some("s" | "seconds" | "second") => value * 1000.0,
            _ => value,
        }))
    }

    /// Identifiers: literals, context references and possessive pronouns.
    fn parse_word(&mut self, token: &Token) -> ParseResult<GrammarNode> {
        let text = token.text.as_str();
        let lower = text.to_lowercase();
        match lower.as_str() {
            "true" | "false" => {
                self.advance();
                return Ok(GrammarNode::Boolean(lower == "true"));
            }
            "null" | "undefined" => {
                self.advance();
                return Ok(GrammarNode::Null);
            }
            "the" => {
                self.advance();
                self.enter_nesting()?;
                let inner = self.parse_unary();
                self.leave_nesting();
                return inner;
            }
            "target" | "detail" => {
                self.advance();
                return Ok(GrammarNode::PropertyAccess {
                    object: Some(Box::new(GrammarNode::ContextRef("event".into()))),
                    property: lower.into(),
                });
            }
            "body" => {
                self.advance();
                return Ok(GrammarNode::MemberAccess {
                    object: Box::new(GrammarNode::Identifier("document".into())),
                    property: Box::new(GrammarNode::Str("body".into())),
                    computed: false,
                });
            }
            _ => {}
        }

        if POSSESSIVES.iter().any(|(word, _)| *word == lower) {
            self.advance();
            let property = self.parse_property_name()?;
            return Ok(GrammarNode::PropertyAccess {
                object: Some(Box::new(GrammarNode::ContextRef(token.text.clone()))),
                property,
            });
        }

        self.advance();
        if text == "I" || CONTEXT_REFERENCES.contains(&lower.as_str()) {
            Ok(GrammarNode::ContextRef(token.text.clone()))
        } else {
            Ok(GrammarNode::Identifier(token.text.clone()))
        }
    }

    /// A property name after a possessive: `value`, `@data-id` or `*opacity`.
    fn parse_property_name(&mut self) -> ParseResult<EcoString> {
        match self.peek().kind {
            TokenKind::Identifier | TokenKind::AttributeRef | TokenKind::StyleRef => {
                Ok(self.advance().text)
            }
            _ => Err(self.error_expected("a property name")),
        }
    }

    /// Member access, indexing, calls, possessives and `of`.
    fn parse_postfix(&mut self, mut node: GrammarNode) -> ParseResult<GrammarNode> {
        loop {
            let raw = self.cursor.peek_raw();
            if [".", "[", "(", "'"].iter().any(|op| raw.is_op(op)) {
                self.grow_expression()?;
            }
            let raw = self.cursor.peek_raw();
            if raw.is_op(".") {
                self.cursor.advance_raw();
                if self.cursor.peek_raw().kind != TokenKind::Identifier {
                    return Err(ParseError::expected("a property name", self.cursor.peek_raw()));
                }
                let property = self.cursor.advance_raw().text;
                node = GrammarNode::MemberAccess {
                    object: Box::new(node),
                    property: Box::new(GrammarNode::Str(property)),
                    computed: false,
                };
            } else if raw.is_op("[") {
                self.advance();
                let index = self.parse_expression()?;
                self.expect_op("]")?;
                node = GrammarNode::MemberAccess {
                    object: Box::new(node),
                    property: Box::new(index),
                    computed: true,
                };
            } else if raw.is_op("(") {
                self.advance();
                let args = self.parse_arguments(")")?;
                node = GrammarNode::Call {
                    callee: Box::new(node),
                    args,
                };
            } else if raw.is_op("'") {
                let checkpoint = self.cursor.checkpoint();
                self.cursor.advance_raw();
                if !self.cursor.peek_raw().is_word("s") {
                    self.cursor.rewind(checkpoint);
                    break;
                }
                self.cursor.advance_raw();
                let property = self.parse_property_name()?;
                node = GrammarNode::PropertyAccess {
                    object: Some(Box::new(node)),
                    property,
                };
            } else if self.check_word("of") {
                let property = match node {
                    GrammarNode::Identifier(name) => name,
                    GrammarNode::PropertyAccess {
                        object: None,
                        property,
                    } => property,
                    other => {
                        node = other;
                        break;
                    }
                };
                self.advance();
                self.grow_expression()?;
                self.enter_nesting()?;
                let object = self.parse_primary().and_then(|o| self.parse_postfix(o));
                self.leave_nesting();
                let object = object?;
                node = GrammarNode::PropertyAccess {
                    object: Some(Box::new(object)),
                    property,
                };
            } else {
                break;
            }
        }
        Ok(node)
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    pub(super) fn parse_arguments(&mut self, close: &str) -> ParseResult<Vec<GrammarNode>> {
        let mut args = Vec::new();
        if self.match_op(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.match_op(close) {
                return Ok(args);
            }
            self.expect_op(",")?;
        }
    }

    /// Skips a bracketed literal the compiler does not model.
    fn skip_unsupported_literal(&mut self, kind: &str, open: &str, close: &str) -> GrammarNode {
        let start = self.advance().span();
        let mut end = start;
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.advance();
            if token.is_eof() {
                break;
            }
            end = token.span();
            if token.is_op(open) {
                depth += 1;
            } else if token.is_op(close) {
                depth -= 1;
            }
        }
        GrammarNode::Unsupported {
            kind: kind.into(),
            span: start.merge(end),
        }
    }
}

/// Strips quotes from a string token and resolves escapes.
pub(crate) fn unquote(text: &str) -> EcoString {
    let mut chars = text.chars();
    let Some(quote) = chars.next() else {
        return EcoString::new();
    };
    let body = chars.as_str();
    let body = body.strip_suffix(quote).unwrap_or(body);
    unescape(body)
}

fn unescape(body: &str) -> EcoString {
    let mut out = EcoString::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Desugars a backtick string into string concatenation.
///
/// `` `Hello ${name}!` `` becomes `"Hello " + name + "!"`. The leading string
/// part is always present so `+` concatenates.
fn parse_template(token: &Token) -> ParseResult<GrammarNode> {
    let text = token.text.as_str();
    let body = text.strip_prefix('`').unwrap_or(text);
    let body = body.strip_suffix('`').unwrap_or(body);

    let mut parts: Vec<GrammarNode> = Vec::new();
    let mut literal = String::new();
    let mut rest = body;
    while let Some(start) = rest.find("${") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let mut depth = 1usize;
        let mut end = after.len();
        for (i, c) in after.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = i;
                        break;
                    }
                }
                _ => {}
            }
        }
        if parts.len() >= MAX_EXPRESSION_SIZE {
            return Err(ParseError::at(token, "template string too large"));
        }
        parts.push(GrammarNode::Str(unescape(&literal)));
        literal.clear();
        let inner = parse_expression_source(&after[..end])
            .map_err(|e| ParseError::at(token, format!("in template string: {}", e.message)))?;
        parts.push(inner);
        rest = after.get(end + 1..).unwrap_or("");
    }
    literal.push_str(rest);

    if parts.is_empty() {
        return Ok(GrammarNode::Str(unescape(&literal)));
    }
    if !literal.is_empty() {
        parts.push(GrammarNode::Str(unescape(&literal)));
    }
    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or(GrammarNode::Str(EcoString::new()));
    Ok(parts.fold(first, |acc, part| GrammarNode::binary("+", acc, part)))
}

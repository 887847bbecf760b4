// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Programs, event handlers and control-flow blocks.

use ecow::EcoString;

use super::{ElseIfBlock, GrammarNode, ParseResult, Parser, RepeatForm};
use crate::ast::EventModifiers;
use crate::source_analysis::{ParseError, TokenKind};

/// Feature blocks that parse but have no lowering.
const UNSUPPORTED_FEATURES: &[&str] = &[
    "def",
    "behavior",
    "init",
    "js",
    "worker",
    "install",
    "tell",
    "transition",
    "measure",
    "socket",
    "eventsource",
];

impl Parser {
    /// Parses top-level handlers and statements until end of input.
    pub(super) fn parse_program(&mut self) -> ParseResult<GrammarNode> {
        let mut items = Vec::new();
        loop {
            while self.match_word("then") {}
            let token = self.peek();
            if token.is_eof() || token.is_word("end") {
                break;
            }
            if token.is_word("on") {
                items.push(self.parse_event_handler()?);
            } else {
                items.push(self.parse_statement()?);
            }
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            GrammarNode::Block(items)
        })
    }

    /// `on <event>[.<modifier>...] [filter] [from <expr>] <body> [end]`
    fn parse_event_handler(&mut self) -> ParseResult<GrammarNode> {
        self.reset_expression_size();
        self.expect_word("on")?;
        if !self.check_kind(TokenKind::Identifier) {
            return Err(self.error_expected("an event name"));
        }
        let event = self.parse_event_name()?;
        let mut modifiers = EventModifiers::default();

        while self.cursor.is_adjacent() && self.check_op(".") {
            self.advance();
            let name = self.expect_identifier("an event modifier")?;
            match name.as_str() {
                "once" => modifiers.once = true,
                "prevent" => modifiers.prevent = true,
                "stop" => modifiers.stop = true,
                "debounce" => modifiers.debounce_ms = Some(self.parse_modifier_delay()?),
                "throttle" => modifiers.throttle_ms = Some(self.parse_modifier_delay()?),
                other => {
                    let last = self.cursor.last().cloned();
                    let message = format!("unknown event modifier '{other}'");
                    return Err(match last {
                        Some(token) => ParseError::at(&token, message),
                        None => ParseError::at(self.peek(), message),
                    });
                }
            }
        }

        if self.cursor.is_adjacent() && self.check_op("[") {
            self.advance();
            modifiers.filter = Some(Box::new(self.parse_expression()?));
            self.expect_op("]")?;
        }

        loop {
            if self.match_word("from") {
                modifiers.from = Some(Box::new(self.parse_expression()?));
            } else if self.check_word("debounced") || self.check_word("throttled") {
                let word = self.advance();
                self.expect_word("at")?;
                let delay = self.parse_delay()?;
                if word.is_word("debounced") {
                    modifiers.debounce_ms = Some(delay);
                } else {
                    modifiers.throttle_ms = Some(delay);
                }
            } else if self.check_word("once") {
                self.advance();
                modifiers.once = true;
            } else {
                break;
            }
        }

        let body = self.parse_block(&["end", "on"])?;
        self.match_word("end");
        Ok(GrammarNode::EventHandler {
            event,
            modifiers,
            body,
        })
    }

    /// An event name, joining adjacent `-` and `:` parts: `htmx:after-swap`.
    pub(super) fn parse_event_name(&mut self) -> ParseResult<EcoString> {
        let mut name = String::from(self.expect_identifier("an event name")?.as_str());
        loop {
            let joiner = self.cursor.peek_raw();
            if !(joiner.is_op("-") || joiner.is_op(":")) {
                break;
            }
            let checkpoint = self.cursor.checkpoint();
            let joiner = self.cursor.advance_raw();
            if self.cursor.peek_raw().kind == TokenKind::Identifier {
                name.push_str(&joiner.text);
                name.push_str(&self.cursor.advance_raw().text);
            } else {
                self.cursor.rewind(checkpoint);
                break;
            }
        }
        Ok(name.into())
    }

    /// `(300)` or `(300ms)` after `.debounce` / `.throttle`.
    fn parse_modifier_delay(&mut self) -> ParseResult<u64> {
        self.expect_op("(")?;
        let delay = self.parse_delay()?;
        self.expect_op(")")?;
        Ok(delay)
    }

    /// A non-negative whole number of milliseconds, with optional unit.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "delays are checked to be finite and non-negative"
    )]
    fn parse_delay(&mut self) -> ParseResult<u64> {
        let token = self.peek().clone();
        match self.parse_primary()? {
            GrammarNode::Number(ms) if ms >= 0.0 && ms.is_finite() => Ok(ms.round() as u64),
            _ => Err(ParseError::expected("a delay in milliseconds", &token)),
        }
    }

    /// Parses statements until one of `terminators` or end of input.
    ///
    /// `then` separators between statements are skipped. The terminator
    /// itself is not consumed.
    pub(super) fn parse_block(&mut self, terminators: &[&str]) -> ParseResult<Vec<GrammarNode>> {
        let mut body = Vec::new();
        loop {
            while self.match_word("then") {}
            let token = self.peek();
            if token.is_eof() || terminators.iter().any(|w| token.is_word(w)) {
                return Ok(body);
            }
            body.push(self.parse_statement()?);
        }
    }

    /// Parses a block one nesting level deeper.
    ///
    /// A nested block also stops at `on`, so a missing `end` before the next
    /// handler is reported as such.
    fn parse_nested_block(&mut self, terminators: &[&str]) -> ParseResult<Vec<GrammarNode>> {
        self.enter_nesting()?;
        let mut stops = terminators.to_vec();
        stops.push("on");
        let body = self.parse_block(&stops);
        self.leave_nesting();
        body
    }

    /// Consumes the `end` closing a block. It may be omitted when the block
    /// runs to end of input, so `if x then add .a` parses.
    fn expect_block_end(&mut self) -> ParseResult<()> {
        if self.match_word("end") || self.peek().is_eof() {
            Ok(())
        } else {
            Err(self.error_expected("'end'"))
        }
    }

    pub(super) fn parse_statement(&mut self) -> ParseResult<GrammarNode> {
        self.reset_expression_size();
        let token = self.peek().clone();
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::expected("a command", &token));
        }
        let word = token.text.to_lowercase();
        match word.as_str() {
            "if" | "unless" => self.parse_conditional(),
            "repeat" => self.parse_repeat(),
            "for" => {
                self.advance();
                let form = self.parse_for_clause()?;
                self.parse_loop_body(form)
            }
            "while" | "until" => {
                self.advance();
                let condition = Box::new(self.parse_expression()?);
                let form = if word == "while" {
                    RepeatForm::While(condition)
                } else {
                    RepeatForm::Until(condition)
                };
                self.parse_loop_body(form)
            }
            w if UNSUPPORTED_FEATURES.contains(&w) => self.parse_unsupported_feature(),
            _ => self.parse_command(),
        }
    }

    /// `if`/`unless` with optional `else if` arms and `else` block.
    fn parse_conditional(&mut self) -> ParseResult<GrammarNode> {
        let negated = self.advance().is_word("unless");
        let condition = Box::new(self.parse_expression()?);
        self.match_word("then");
        let terminators = ["else", "otherwise", "end"];
        let then_block = self.parse_nested_block(&terminators)?;

        let mut else_ifs = Vec::new();
        let mut else_block = None;
        while self.check_word("else") || self.check_word("otherwise") {
            self.advance();
            if self.match_word("if") {
                let condition = self.parse_expression()?;
                self.match_word("then");
                let body = self.parse_nested_block(&terminators)?;
                else_ifs.push(ElseIfBlock { condition, body });
            } else {
                else_block = Some(self.parse_nested_block(&["end"])?);
                break;
            }
        }
        self.expect_block_end()?;

        Ok(GrammarNode::Conditional {
            negated,
            condition,
            then_block,
            else_ifs,
            else_block,
        })
    }

    /// `repeat` with its `times`/`for`/`while`/`until`/`forever`/bare forms.
    fn parse_repeat(&mut self) -> ParseResult<GrammarNode> {
        self.expect_word("repeat")?;
        let form = if self.match_word("for") {
            self.parse_for_clause()?
        } else if self.match_word("while") {
            RepeatForm::While(Box::new(self.parse_expression()?))
        } else if self.match_word("until") {
            RepeatForm::Until(Box::new(self.parse_expression()?))
        } else if self.match_word("forever") {
            RepeatForm::Forever
        } else if self.at_argument_start() && self.starts_count() {
            let count = self.parse_expression()?;
            self.expect_word("times")?;
            RepeatForm::Times(Box::new(count))
        } else {
            RepeatForm::Forever
        };
        self.parse_loop_body(form)
    }

    /// Returns true if the next token starts a `repeat N times` count rather
    /// than the first command of a bare `repeat` body.
    fn starts_count(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Number => true,
            TokenKind::Identifier => {
                self.cursor.peek_nth(1).is_word("times")
                    || matches!(token.text.as_str(), "my" | "its" | "the")
            }
            TokenKind::Operator => matches!(token.text.as_str(), "(" | ":" | "$" | "^"),
            _ => false,
        }
    }

    /// `<item> [index <i>] in <collection>`
    fn parse_for_clause(&mut self) -> ParseResult<RepeatForm> {
        let item = self.expect_identifier("a loop variable name")?;
        let index = if self.match_word("index") {
            Some(self.expect_identifier("an index variable name")?)
        } else {
            None
        };
        self.expect_word("in")?;
        let collection = Box::new(self.parse_expression()?);
        Ok(RepeatForm::For {
            item,
            index,
            collection,
        })
    }

    fn parse_loop_body(&mut self, form: RepeatForm) -> ParseResult<GrammarNode> {
        let body = self.parse_nested_block(&["end"])?;
        self.expect_block_end()?;
        Ok(GrammarNode::Repeat { form, body })
    }

    /// Skips a recognized but unsupported feature up to its matching `end`.
    fn parse_unsupported_feature(&mut self) -> ParseResult<GrammarNode> {
        let start = self.advance();
        let kind = start.text.to_lowercase();
        let mut depth = 1usize;
        let mut end_span = start.span();
        while depth > 0 {
            let token = self.advance();
            if token.is_eof() {
                break;
            }
            end_span = token.span();
            if token.kind == TokenKind::Identifier {
                let word = token.text.to_lowercase();
                if word == "end" {
                    depth -= 1;
                } else if UNSUPPORTED_FEATURES.contains(&word.as_str())
                    || matches!(
                        word.as_str(),
                        "on" | "if" | "unless" | "repeat" | "for" | "while"
                    )
                {
                    depth += 1;
                }
            }
        }
        Ok(GrammarNode::Unsupported {
            kind: format!("'{kind}' feature").into(),
            span: start.span().merge(end_span),
        })
    }
}

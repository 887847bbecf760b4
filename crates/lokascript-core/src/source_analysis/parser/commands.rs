// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Command forms.
//!
//! Each command becomes a [`GrammarNode::Command`] with positional `args`, an
//! optional `target`, and keyword `modifiers`. Commands without a dedicated
//! form fall back to a generic node whose arguments run to the end of the
//! statement.

use ecow::EcoString;

use super::{GrammarNode, ParseResult, Parser};
use crate::ast::VariableScope;
use crate::source_analysis::{ParseError, TokenKind};

/// Single-word `put` positions.
const PUT_POSITIONS: &[&str] = &["into", "before", "after"];

impl Parser {
    #[allow(clippy::too_many_lines)] // one arm per command
    pub(super) fn parse_command(&mut self) -> ParseResult<GrammarNode> {
        let token = self.advance();
        let name: EcoString = token.text.to_lowercase().into();
        match name.as_str() {
            "add" => self.parse_class_command(name, "to"),
            "remove" | "take" => self.parse_class_command(name, "from"),
            "toggle" => self.parse_toggle(),
            "put" => self.parse_put(),
            "set" => self.parse_set(),
            "append" => {
                let value = self.parse_expression()?;
                let target = self.parse_optional_target(&["to"])?;
                Ok(command(name, vec![value], target, vec![]))
            }
            "get" | "call" | "throw" => {
                let value = self.parse_expression()?;
                Ok(command(name, vec![value], None, vec![]))
            }
            "show" | "hide" | "focus" | "blur" | "settle" => {
                let target = if self.at_argument_start() {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(command(name, vec![], target, vec![]))
            }
            "increment" | "decrement" => {
                let target = self.parse_expression()?;
                let mut modifiers = Vec::new();
                if self.match_word("by") {
                    modifiers.push(("by".into(), self.parse_expression()?));
                }
                Ok(command(name, vec![], Some(target), modifiers))
            }
            "wait" => self.parse_wait(),
            "send" | "trigger" => self.parse_send(name),
            "log" => {
                let mut args = Vec::new();
                if self.at_argument_start() {
                    args.push(self.parse_expression()?);
                    while self.match_op(",") {
                        args.push(self.parse_expression()?);
                    }
                }
                Ok(command(name, args, None, vec![]))
            }
            "fetch" => self.parse_fetch(),
            "go" => self.parse_go(),
            "halt" => {
                let mut modifiers = Vec::new();
                if self.check_word("the") && self.cursor.peek_nth(1).is_word("event") {
                    self.advance();
                    self.advance();
                    modifiers.push(("event".into(), GrammarNode::Boolean(true)));
                }
                Ok(command(name, vec![], None, modifiers))
            }
            "exit" | "break" | "continue" => Ok(GrammarNode::command(name)),
            "return" => {
                let args = if self.at_argument_start() {
                    vec![self.parse_expression()?]
                } else {
                    vec![]
                };
                Ok(command(name, args, None, vec![]))
            }
            _ => {
                let mut args = Vec::new();
                while self.at_argument_start() {
                    args.push(self.parse_expression()?);
                    self.match_op(",");
                }
                Ok(command(name, args, None, vec![]))
            }
        }
    }

    /// `add .a .b [to <target>]`, `remove .a [from <target>]`,
    /// `take .a [from <target>]`
    fn parse_class_command(
        &mut self,
        name: EcoString,
        preposition: &str,
    ) -> ParseResult<GrammarNode> {
        let args = self.parse_selector_list()?;
        let target = self.parse_optional_target(&[preposition])?;
        Ok(command(name, args, target, vec![]))
    }

    /// One expression followed by any further adjacent class references:
    /// `.a .b .c`.
    fn parse_selector_list(&mut self) -> ParseResult<Vec<GrammarNode>> {
        let mut args = vec![self.parse_expression()?];
        while self.at_argument_start() && self.check_kind(TokenKind::ClassRef) {
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    fn parse_optional_target(&mut self, prepositions: &[&str]) -> ParseResult<Option<GrammarNode>> {
        if prepositions.iter().any(|p| self.check_word(p)) {
            self.advance();
            Ok(Some(self.parse_expression()?))
        } else {
            Ok(None)
        }
    }

    /// `toggle .a [on <target>] [for <duration>]`
    fn parse_toggle(&mut self) -> ParseResult<GrammarNode> {
        let args = self.parse_selector_list()?;
        let target = self.parse_optional_target(&["on", "from"])?;
        let mut modifiers = Vec::new();
        if self.match_word("for") {
            modifiers.push(("for".into(), self.parse_expression()?));
        }
        Ok(command("toggle", args, target, modifiers))
    }

    /// `put <value> (into|before|after|at start of|at end of) <target>`
    ///
    /// The insertion point is recorded as a `position` modifier holding one
    /// of `into`, `before`, `after`, `start` or `end`.
    fn parse_put(&mut self) -> ParseResult<GrammarNode> {
        let value = self.parse_expression()?;

        let position = if let Some(position) = PUT_POSITIONS.iter().find(|w| self.check_word(w)) {
            self.advance();
            *position
        } else if self.check_word("at") {
            self.advance();
            let position = if self.match_word("start") {
                "start"
            } else if self.match_word("end") {
                "end"
            } else {
                return Err(self.error_expected("'start' or 'end'"));
            };
            self.expect_word("of")?;
            position
        } else {
            return Err(self.error_expected("'into', 'before', 'after' or 'at'"));
        };

        let target = self.parse_expression()?;
        Ok(command(
            "put",
            vec![value],
            Some(target),
            vec![("position".into(), GrammarNode::Str(position.into()))],
        ))
    }

    /// `set [global|local|element] <target> to <value>`
    ///
    /// A bare identifier target is a local variable.
    fn parse_set(&mut self) -> ParseResult<GrammarNode> {
        let scope = if self.match_word("global") {
            Some(VariableScope::Global)
        } else if self.match_word("local") {
            Some(VariableScope::Local)
        } else if self.match_word("element") {
            Some(VariableScope::Element)
        } else {
            None
        };

        let target = match (scope, self.parse_expression()?) {
            (Some(scope), GrammarNode::Identifier(name)) => GrammarNode::Variable { name, scope },
            (None, GrammarNode::Identifier(name)) => GrammarNode::Variable {
                name,
                scope: VariableScope::Local,
            },
            (Some(_), _) => {
                return Err(ParseError::at(
                    self.peek(),
                    "expected a variable name after scope",
                ));
            }
            (None, other) => other,
        };

        self.expect_word("to")?;
        let value = self.parse_expression()?;
        Ok(command("set", vec![value], Some(target), vec![]))
    }

    /// `wait <duration>` or `wait for <event> [from <target>]`
    fn parse_wait(&mut self) -> ParseResult<GrammarNode> {
        if self.match_word("for") {
            if !self.check_kind(TokenKind::Identifier) {
                return Err(self.error_expected("an event name"));
            }
            let event = self.parse_event_name()?;
            let target = self.parse_optional_target(&["from"])?;
            return Ok(command(
                "wait",
                vec![],
                target,
                vec![("event".into(), GrammarNode::Str(event))],
            ));
        }
        let duration = self.parse_expression()?;
        Ok(command("wait", vec![duration], None, vec![]))
    }

    /// `send <event> [to <target>]`, `trigger <event> [on <target>]`
    fn parse_send(&mut self, name: EcoString) -> ParseResult<GrammarNode> {
        if !self.check_kind(TokenKind::Identifier) {
            return Err(self.error_expected("an event name"));
        }
        let event = self.parse_event_name()?;
        if self.cursor.peek_raw().is_op("(") {
            return Err(ParseError::at(
                self.cursor.peek_raw(),
                "event arguments are not supported",
            ));
        }
        let target = self.parse_optional_target(&["to", "on"])?;
        Ok(command(name, vec![GrammarNode::Str(event)], target, vec![]))
    }

    /// `fetch <url> [as json|text|html]`
    fn parse_fetch(&mut self) -> ParseResult<GrammarNode> {
        // `as` belongs to the command here, not to a conversion.
        let url = match self.parse_naked_url() {
            Some(url) => GrammarNode::Str(url),
            None => self.parse_unary()?,
        };
        let mut modifiers = Vec::new();
        if self.match_word("as") {
            let format = self.expect_identifier("'json', 'text' or 'html'")?;
            let format = format.to_lowercase();
            if !matches!(format.as_str(), "json" | "text" | "html") {
                let token = self.cursor.last().cloned();
                let message = format!("unknown response format '{format}'");
                return Err(match token {
                    Some(token) => ParseError::at(&token, message),
                    None => ParseError::at(self.peek(), message),
                });
            }
            modifiers.push(("as".into(), GrammarNode::Str(format.into())));
        }
        Ok(command("fetch", vec![url], None, modifiers))
    }

    /// `go to <url>` or `go back`
    fn parse_go(&mut self) -> ParseResult<GrammarNode> {
        if self.match_word("back") {
            return Ok(command(
                "go",
                vec![],
                None,
                vec![("direction".into(), GrammarNode::Str("back".into()))],
            ));
        }
        self.expect_word("to")?;
        self.match_word("url");
        let url = match self.parse_naked_url() {
            Some(url) => GrammarNode::Str(url),
            None => self.parse_expression()?,
        };
        Ok(command("go", vec![url], None, vec![]))
    }

    /// Reads an unquoted URL such as `/api/items?id=1` or
    /// `https://example.com/x` up to the next whitespace.
    fn parse_naked_url(&mut self) -> Option<EcoString> {
        let token = self.peek();
        let starts_url = token.is_op("/")
            || ((token.is_word("http") || token.is_word("https"))
                && self.cursor.peek_nth(1).is_op(":"));
        if !starts_url {
            return None;
        }

        let mut url = String::from(self.advance().text.as_str());
        loop {
            let next = self.cursor.peek_raw();
            if next.kind.is_insignificant() || next.is_eof() {
                break;
            }
            url.push_str(&self.cursor.advance_raw().text);
        }
        Some(url.into())
    }
}

fn command(
    name: impl Into<EcoString>,
    args: Vec<GrammarNode>,
    target: Option<GrammarNode>,
    modifiers: Vec<(EcoString, GrammarNode)>,
) -> GrammarNode {
    GrammarNode::Command {
        name: name.into(),
        args,
        target: target.map(Box::new),
        modifiers,
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_source;
    use super::*;

    struct Parts {
        name: EcoString,
        args: Vec<GrammarNode>,
        target: Option<GrammarNode>,
        modifiers: Vec<(EcoString, GrammarNode)>,
    }

    fn parse_command(source: &str) -> Parts {
        match parse_source(source) {
            Ok(GrammarNode::Command {
                name,
                args,
                target,
                modifiers,
            }) => Parts {
                name,
                args,
                target: target.map(|t| *t),
                modifiers,
            },
            other => panic!("expected a command for {source:?}, got {other:?}"),
        }
    }

    fn modifier<'a>(parts: &'a Parts, key: &str) -> Option<&'a GrammarNode> {
        parts.modifiers.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn selector(text: &str) -> GrammarNode {
        GrammarNode::Selector(text.into())
    }

    #[test]
    fn add_with_target() {
        let add = parse_command("add .active to #menu");
        assert_eq!(add.name, "add");
        assert_eq!(add.args, vec![selector(".active")]);
        assert_eq!(add.target, Some(selector("#menu")));
    }

    #[test]
    fn add_several_classes() {
        let add = parse_command("add .a .b");
        assert_eq!(add.args, vec![selector(".a"), selector(".b")]);
        assert!(add.target.is_none());
    }

    #[test]
    fn remove_from_target() {
        let remove = parse_command("remove .hidden from <p/>");
        assert_eq!(remove.args, vec![selector(".hidden")]);
        assert_eq!(remove.target, Some(selector("<p/>")));
    }

    #[test]
    fn toggle_with_target_and_duration() {
        let toggle = parse_command("toggle .open on #panel for 2s");
        assert_eq!(toggle.target, Some(selector("#panel")));
        assert_eq!(modifier(&toggle, "for"), Some(&GrammarNode::Number(2000.0)));
    }

    #[test]
    fn toggle_attribute() {
        let toggle = parse_command("toggle [@disabled]");
        assert_eq!(toggle.args, vec![selector("[@disabled]")]);
    }

    #[test]
    fn put_positions() {
        for (source, position) in [
            ("put 'x' into #out", "into"),
            ("put 'x' before #out", "before"),
            ("put 'x' after #out", "after"),
            ("put 'x' at start of #out", "start"),
            ("put 'x' at end of #out", "end"),
        ] {
            let put = parse_command(source);
            assert_eq!(put.args, vec![GrammarNode::Str("x".into())], "{source}");
            assert_eq!(put.target, Some(selector("#out")), "{source}");
            assert_eq!(
                modifier(&put, "position"),
                Some(&GrammarNode::Str(position.into())),
                "{source}"
            );
        }
    }

    #[test]
    fn put_requires_position() {
        let error = parse_source("put 1 onto #x").unwrap_err();
        assert_eq!(
            error.message,
            "expected 'into', 'before', 'after' or 'at', found 'onto'"
        );
    }

    #[test]
    fn set_bare_identifier_is_local_variable() {
        let set = parse_command("set count to 0");
        assert_eq!(
            set.target,
            Some(GrammarNode::Variable {
                name: "count".into(),
                scope: VariableScope::Local
            })
        );
        assert_eq!(set.args, vec![GrammarNode::Number(0.0)]);
    }

    #[test]
    fn set_with_scope_keyword() {
        let set = parse_command("set global total to 1");
        assert_eq!(
            set.target,
            Some(GrammarNode::Variable {
                name: "total".into(),
                scope: VariableScope::Global
            })
        );
    }

    #[test]
    fn set_property() {
        let set = parse_command("set my innerHTML to 'done'");
        assert!(matches!(
            set.target,
            Some(GrammarNode::PropertyAccess { ref property, .. }) if property == "innerHTML"
        ));
    }

    #[test]
    fn increment_by_amount() {
        let increment = parse_command("increment :count by 2");
        assert!(matches!(increment.target, Some(GrammarNode::Variable { .. })));
        assert_eq!(modifier(&increment, "by"), Some(&GrammarNode::Number(2.0)));
    }

    #[test]
    fn wait_forms() {
        let wait = parse_command("wait 500ms");
        assert_eq!(wait.args, vec![GrammarNode::Number(500.0)]);

        let wait = parse_command("wait for transitionend from #box");
        assert!(wait.args.is_empty());
        assert_eq!(
            modifier(&wait, "event"),
            Some(&GrammarNode::Str("transitionend".into()))
        );
        assert_eq!(wait.target, Some(selector("#box")));
    }

    #[test]
    fn send_with_hyphenated_event() {
        let send = parse_command("send item-added to #list");
        assert_eq!(send.args, vec![GrammarNode::Str("item-added".into())]);
        assert_eq!(send.target, Some(selector("#list")));
    }

    #[test]
    fn send_arguments_are_rejected() {
        let error = parse_source("send refresh(id: 1)").unwrap_err();
        assert_eq!(error.message, "event arguments are not supported");
    }

    #[test]
    fn log_several_values() {
        let log = parse_command("log 'a', x, 1");
        assert_eq!(log.args.len(), 3);
    }

    #[test]
    fn fetch_naked_url() {
        let fetch = parse_command("fetch /api/items?page=2 as json");
        assert_eq!(fetch.args, vec![GrammarNode::Str("/api/items?page=2".into())]);
        assert_eq!(modifier(&fetch, "as"), Some(&GrammarNode::Str("json".into())));

        let fetch = parse_command("fetch https://example.com/data as text");
        assert_eq!(
            fetch.args,
            vec![GrammarNode::Str("https://example.com/data".into())]
        );
    }

    #[test]
    fn fetch_rejects_unknown_format() {
        let error = parse_source("fetch '/x' as xml").unwrap_err();
        assert_eq!(error.message, "unknown response format 'xml'");
    }

    #[test]
    fn go_forms() {
        let go = parse_command("go to url /home");
        assert_eq!(go.args, vec![GrammarNode::Str("/home".into())]);
        let back = parse_command("go back");
        assert_eq!(
            modifier(&back, "direction"),
            Some(&GrammarNode::Str("back".into()))
        );
    }

    #[test]
    fn halt_the_event() {
        let halt = parse_command("halt the event");
        assert_eq!(modifier(&halt, "event"), Some(&GrammarNode::Boolean(true)));
        assert!(parse_command("halt").modifiers.is_empty());
    }

    #[test]
    fn return_value_is_optional() {
        assert_eq!(parse_command("return 42").args, vec![GrammarNode::Number(42.0)]);
        assert!(parse_command("return").args.is_empty());
    }

    #[test]
    fn show_without_target() {
        let show = parse_command("show");
        assert!(show.target.is_none());
        let hide = parse_command("hide #modal");
        assert_eq!(hide.target, Some(selector("#modal")));
    }

    #[test]
    fn generic_command_collects_arguments() {
        let other = parse_command("beep 1, 2");
        assert_eq!(other.name, "beep");
        assert_eq!(other.args, vec![GrammarNode::Number(1.0), GrammarNode::Number(2.0)]);
    }

    #[test]
    fn arguments_stop_at_newline() {
        let GrammarNode::Block(body) = parse_source("show\nhide").unwrap() else {
            panic!("expected block");
        };
        assert_eq!(body.len(), 2);
    }
}

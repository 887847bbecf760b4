// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Command lowering.
//!
//! Each command lowers to one or more JavaScript statements. Commands that
//! act on elements (`add`, `remove`, `take`, `focus`, `blur`) pick a loop
//! shape from the target: a single element is used directly, a selector
//! collection is iterated, and anything else is coerced with `toArray`.

use std::collections::BTreeMap;

use ecow::EcoString;

use super::document::{Document, join, line};
use super::expressions::{js_member, js_string, variable, variable_place};
use super::{CodeGenError, Flow, JsGenerator, Result, Signal};
use crate::ast::{Node, Place, SelectorKind, TargetShape, VariableScope};
use crate::docvec;
use crate::runtime;

impl JsGenerator<'_> {
    #[allow(clippy::too_many_lines)] // one arm per command
    pub(super) fn command(
        &mut self,
        name: &str,
        args: &[Node],
        target: Option<&Node>,
        modifiers: &BTreeMap<EcoString, Node>,
    ) -> Result<(Document<'static>, Flow)> {
        let document = match name {
            "add" | "remove" => {
                self.class_command(name, args, target.or_else(|| modifiers.get("from")))?
            }
            "take" => self.take(args, target.or_else(|| modifiers.get("from")))?,
            "toggle" => self.toggle(args, target, modifiers.get("for"))?,
            "put" => {
                let value = self.value(args.first())?;
                let position = modifiers
                    .get("position")
                    .and_then(Node::string_literal)
                    .unwrap_or("into");
                match (position, target) {
                    ("into", Some(target)) => self.assign(target, &value)?,
                    (position, target) => {
                        let insert = self.require("insertContent")?;
                        let target = self.target_or_me(target)?;
                        let mode = match position {
                            "before" => "before",
                            "after" => "after",
                            "start" => "prepend",
                            "end" => "append",
                            _ => "replace",
                        };
                        docvec![format!("{insert}({target}, {value}, \"{mode}\");")]
                    }
                }
            }
            "set" => {
                let value = self.value(args.first())?;
                match target {
                    Some(target) => self.assign(target, &value)?,
                    None => {
                        let insert = self.require("insertContent")?;
                        docvec![format!("{insert}(ctx.me, {value}, \"replace\");")]
                    }
                }
            }
            "increment" | "decrement" => {
                let operator = if name == "increment" { "+" } else { "-" };
                let amount = match modifiers.get("by") {
                    Some(by) => self.expression(by)?,
                    None => "1".into(),
                };
                let me = Node::me();
                self.update(target.unwrap_or(&me), |current| {
                    format!("(Number({current}) || 0) {operator} {amount}")
                })?
            }
            "append" => {
                let value = self.value(args.first())?;
                match target {
                    None => docvec![format!("ctx.result = (ctx.result ?? \"\") + {value};")],
                    Some(target) if matches!(Place::of(target), Place::Content(_)) => {
                        let insert = self.require("insertContent")?;
                        let target = self.expression(target)?;
                        docvec![format!("{insert}({target}, {value}, \"append\");")]
                    }
                    Some(target) => {
                        self.update(target, |current| format!("({current} ?? \"\") + {value}"))?
                    }
                }
            }
            "get" => {
                let value = self.value(args.first())?;
                docvec![format!("ctx.it = ctx.result = {value};")]
            }
            "call" => {
                let value = match args.first() {
                    Some(callee @ Node::Identifier { .. }) if !callee.is_context_reference() => {
                        format!("{}()", self.expression(callee)?)
                    }
                    other => self.value(other)?,
                };
                docvec![format!("ctx.it = ctx.result = {value};")]
            }
            "log" => docvec!["console.log(", self.arguments(args)?, ");"],
            "show" | "hide" => {
                let helper = self.require(if name == "show" { "show" } else { "hide" })?;
                let target = self.target_or_me(target)?;
                docvec![format!("{helper}({target});")]
            }
            "wait" => match modifiers.get("event").and_then(Node::string_literal) {
                Some(event) => {
                    let target = self.target_or_me(target)?;
                    let listen = format!(
                        "{target}.addEventListener({}, resolve, {{ once: true }})",
                        js_string(event)
                    );
                    docvec![format!("await new Promise((resolve) => {listen});")]
                }
                None => {
                    let wait = self.require("wait")?;
                    let duration = match args.first() {
                        Some(duration) => self.expression(duration)?,
                        None => "0".into(),
                    };
                    docvec![format!("await {wait}({duration});")]
                }
            },
            "settle" => {
                let next_frame = self.require("nextFrame")?;
                docvec![format!("await {next_frame}();")]
            }
            "send" | "trigger" => {
                let dispatch = self.require("dispatch")?;
                let event = match args.first() {
                    Some(event) => match event.string_literal() {
                        Some(name) => js_string(name),
                        None => self.expression(event)?,
                    },
                    None => return Err(CodeGenError::UnsupportedCommand { name: name.into() }),
                };
                let target = self.target_or_me(target)?;
                docvec![format!("{dispatch}({target}, {event});")]
            }
            "fetch" => {
                let format = modifiers.get("as").and_then(Node::string_literal);
                let fetch = self.require(runtime::fetch_helper(format))?;
                let url = self.value(args.first())?;
                docvec![format!("ctx.it = ctx.result = await {fetch}({url});")]
            }
            "go" => {
                let back = modifiers
                    .get("direction")
                    .and_then(Node::string_literal)
                    .is_some_and(|d| d == "back");
                if back {
                    docvec!["globalThis.history.back();"]
                } else {
                    let url = self.value(args.first())?;
                    docvec![format!("globalThis.location.href = {url};")]
                }
            }
            "focus" | "blur" => self.each_element(target, &format!(".{name}()"))?,
            "halt" => {
                let mut lines = vec![
                    docvec!["ctx.event?.preventDefault();"],
                    docvec!["ctx.event?.stopPropagation();"],
                ];
                if modifiers.contains_key("event") {
                    return Ok((join(lines, &line()), Flow::Normal));
                }
                let halt = self.require("HALT")?;
                lines.push(docvec![format!("return {halt};")]);
                return Ok((join(lines, &line()), Flow::Signal(Signal::Halt)));
            }
            "exit" => {
                let exit = self.require("EXIT")?;
                return Ok((
                    docvec![format!("return {exit};")],
                    Flow::Signal(Signal::Exit),
                ));
            }
            "break" | "continue" => {
                if self.loop_depth == 0 {
                    return Err(CodeGenError::OutsideLoop { name: name.into() });
                }
                let signal = if name == "break" {
                    Signal::Break
                } else {
                    Signal::Continue
                };
                return Ok((docvec![format!("{name};")], Flow::Signal(signal)));
            }
            "return" => {
                let mut lines = Vec::new();
                if let Some(value) = args.first() {
                    lines.push(docvec![format!("ctx.result = {};", self.expression(value)?)]);
                }
                lines.push(docvec!["ctx.returned = true;"]);
                lines.push(docvec!["return ctx.result;"]);
                return Ok((join(lines, &line()), Flow::Signal(Signal::Return)));
            }
            "throw" => {
                let value = self.value(args.first())?;
                docvec![format!("throw {value};")]
            }
            _ => return Err(CodeGenError::UnsupportedCommand { name: name.into() }),
        };
        Ok((document, Flow::Normal))
    }

    /// An optional operand, `undefined` when absent.
    fn value(&mut self, node: Option<&Node>) -> Result<String> {
        match node {
            Some(node) => self.expression(node),
            None => Ok("undefined".into()),
        }
    }

    /// Applies `.method(...)` to every element of `target`.
    fn each_element(&mut self, target: Option<&Node>, call: &str) -> Result<Document<'static>> {
        let Some(target) = target else {
            return Ok(docvec![format!("ctx.me?{call};")]);
        };
        let elements = self.expression(target)?;
        Ok(match TargetShape::of(target) {
            TargetShape::Single => docvec![format!("{elements}?{call};")],
            TargetShape::Collection => docvec![format!("for (const el of {elements}) el{call};")],
            TargetShape::Dynamic => {
                let to_array = self.require("toArray")?;
                docvec![format!("for (const el of {to_array}({elements})) el{call};")]
            }
        })
    }

    /// `add .a [@b=c] to x` and `remove .a [@b] #el from x`.
    fn class_command(
        &mut self,
        name: &str,
        args: &[Node],
        target: Option<&Node>,
    ) -> Result<Document<'static>> {
        let mut classes = Vec::new();
        let mut statements = Vec::new();
        for arg in args {
            let selector = match arg {
                Node::Selector { value } => Some(value.as_str()),
                _ => None,
            };
            match selector.map(|s| (s, SelectorKind::of(s))) {
                Some((selector, SelectorKind::Class)) => {
                    classes.push(js_string(class_name(selector)));
                }
                Some((selector, SelectorKind::Attribute)) => {
                    let Some((attribute, value)) = runtime::attribute_parts(selector) else {
                        return Err(unsupported(arg));
                    };
                    let call = if name == "add" {
                        format!(
                            ".setAttribute({}, {})",
                            js_string(attribute),
                            js_string(value.unwrap_or_default())
                        )
                    } else {
                        format!(".removeAttribute({})", js_string(attribute))
                    };
                    statements.push(self.each_element(target, &call)?);
                }
                _ if name == "remove" => {
                    statements.push(self.each_element(Some(arg), ".remove()")?);
                }
                _ => return Err(unsupported(arg)),
            }
        }
        if !classes.is_empty() {
            let call = format!(".classList.{name}({})", classes.join(", "));
            statements.insert(0, self.each_element(target, &call)?);
        }
        Ok(join(statements, &line()))
    }

    /// `take .a from x`: remove from the source, then add to `me`.
    fn take(&mut self, args: &[Node], source: Option<&Node>) -> Result<Document<'static>> {
        let mut statements = Vec::new();
        for arg in args {
            let Node::Selector { value } = arg else {
                return Err(unsupported(arg));
            };
            let (removal, addition) = match SelectorKind::of(value) {
                SelectorKind::Class => {
                    let class = js_string(class_name(value));
                    (
                        format!(".classList.remove({class})"),
                        format!(".classList.add({class})"),
                    )
                }
                SelectorKind::Attribute => {
                    let Some((attribute, new_value)) = runtime::attribute_parts(value) else {
                        return Err(unsupported(arg));
                    };
                    let attribute = js_string(attribute);
                    (
                        format!(".removeAttribute({attribute})"),
                        format!(
                            ".setAttribute({attribute}, {})",
                            js_string(new_value.unwrap_or_default())
                        ),
                    )
                }
                SelectorKind::Id | SelectorKind::Query => return Err(unsupported(arg)),
            };
            match source {
                Some(source) => statements.push(self.each_element(Some(source), &removal)?),
                None => {
                    let query_all = self.require("queryAll")?;
                    let css = js_string(&runtime::css_text(value));
                    statements.push(docvec![format!(
                        "for (const el of {query_all}({css})) el{removal};"
                    )]);
                }
            }
            statements.push(docvec![format!("ctx.me?{addition};")]);
        }
        Ok(join(statements, &line()))
    }

    /// `toggle .a [@b] on x [for 2s]`
    fn toggle(
        &mut self,
        args: &[Node],
        target: Option<&Node>,
        duration: Option<&Node>,
    ) -> Result<Document<'static>> {
        let target = self.target_or_me(target)?;
        let mut toggles = Vec::new();
        for arg in args {
            let Node::Selector { value } = arg else {
                return Err(unsupported(arg));
            };
            let Some(helper) = runtime::toggle_helper(value) else {
                return Err(unsupported(arg));
            };
            let helper = self.require(helper)?;
            let operands = match runtime::attribute_parts(value) {
                Some((attribute, Some(value))) => {
                    format!("{}, {}", js_string(attribute), js_string(value))
                }
                Some((attribute, None)) => js_string(attribute),
                None => js_string(class_name(value)),
            };
            toggles.push(docvec![format!("{helper}({target}, {operands});")]);
        }

        let Some(duration) = duration else {
            return Ok(join(toggles, &line()));
        };
        let wait = self.require("wait")?;
        let duration = self.expression(duration)?;
        let mut lines = toggles.clone();
        lines.push(docvec![format!("await {wait}({duration});")]);
        lines.extend(toggles);
        Ok(join(lines, &line()))
    }

    /// Assigns `value` to the place `target` names.
    fn assign(&mut self, target: &Node, value: &str) -> Result<Document<'static>> {
        let statement = match Place::of(target) {
            Place::Local(name) => {
                format!("{} = {value};", variable_place(VariableScope::Local, name))
            }
            Place::Global(name) => {
                format!("{} = {value};", variable_place(VariableScope::Global, name))
            }
            Place::Element(name) => {
                format!("{} = {value};", variable_place(VariableScope::Element, name))
            }
            Place::Context(name) => format!("ctx.{name} = {value};"),
            Place::Property { object, name } => {
                let set = self.require("setProperty")?;
                let object = self.expression(object)?;
                format!("{set}({object}, {}, {value});", js_string(name))
            }
            Place::Attribute { object, name } => {
                let object = self.expression(object)?;
                format!("{object}?.setAttribute({}, {value});", js_string(name))
            }
            Place::Style { object, name } => {
                let object = self.expression(object)?;
                format!("{object}.style{} = {value};", js_member(name))
            }
            Place::Member {
                object,
                property,
                computed,
            } => {
                let object = self.expression(object)?;
                match (property.string_literal(), computed) {
                    (Some(name), false) => format!("{object}{} = {value};", js_member(name)),
                    _ => format!("{object}[{}] = {value};", self.expression(property)?),
                }
            }
            Place::Content(node) => {
                let insert = self.require("insertContent")?;
                let target = self.expression(node)?;
                format!("{insert}({target}, {value}, \"replace\");")
            }
        };
        Ok(docvec![statement])
    }

    /// Replaces the value at `target` with `compute(current)`.
    fn update(
        &mut self,
        target: &Node,
        compute: impl Fn(&str) -> String,
    ) -> Result<Document<'static>> {
        let scoped = |scope: VariableScope, name: &str| {
            let current = variable(scope, name);
            format!("{} = {};", variable_place(scope, name), compute(&current))
        };
        let statement = match Place::of(target) {
            Place::Local(name) => scoped(VariableScope::Local, name),
            Place::Global(name) => scoped(VariableScope::Global, name),
            Place::Element(name) => scoped(VariableScope::Element, name),
            Place::Context(name) => format!("ctx.{name} = {};", compute(&format!("ctx.{name}"))),
            Place::Property { object, name } => {
                let get = self.require("getProperty")?;
                let set = self.require("setProperty")?;
                let object = self.expression(object)?;
                let t = format!("$t{}", self.fresh());
                let name = js_string(name);
                let next = compute(&format!("{get}({t}, {name})"));
                format!("{{ const {t} = {object}; {set}({t}, {name}, {next}); }}")
            }
            Place::Attribute { object, name } => {
                let resolve = self.require("resolveAttribute")?;
                let object = self.expression(object)?;
                let t = format!("$t{}", self.fresh());
                let name = js_string(name);
                let next = compute(&format!("{resolve}({t}, {name})"));
                format!("{{ const {t} = {object}; {t}?.setAttribute({name}, {next}); }}")
            }
            Place::Style { object, name } => {
                let object = self.expression(object)?;
                let t = format!("$t{}", self.fresh());
                let style = format!("{t}.style{}", js_member(name));
                let next = compute(&style);
                format!("{{ const {t} = {object}; {style} = {next}; }}")
            }
            Place::Member {
                object,
                property,
                computed,
            } => {
                let object = self.expression(object)?;
                let n = self.fresh();
                let t = format!("$t{n}");
                match (property.string_literal(), computed) {
                    (Some(name), false) => {
                        let member = format!("{t}{}", js_member(name));
                        let next = compute(&member);
                        format!("{{ const {t} = {object}; {member} = {next}; }}")
                    }
                    _ => {
                        let key = self.expression(property)?;
                        let member = format!("{t}[$k{n}]");
                        let next = compute(&member);
                        format!("{{ const {t} = {object}, $k{n} = {key}; {member} = {next}; }}")
                    }
                }
            }
            Place::Content(node) => {
                let get = self.require("getProperty")?;
                let set = self.require("setProperty")?;
                let element = self.expression(node)?;
                let t = format!("$t{}", self.fresh());
                let next = compute(&format!("{get}({t}, \"textContent\")"));
                format!("{{ const {t} = {element}; {set}({t}, \"textContent\", {next}); }}")
            }
        };
        Ok(docvec![statement])
    }
}

fn class_name(selector: &str) -> &str {
    selector.strip_prefix('.').unwrap_or(selector)
}

fn unsupported(node: &Node) -> CodeGenError {
    CodeGenError::UnsupportedNode {
        kind: node.kind().into(),
    }
}

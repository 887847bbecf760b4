// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression lowering.
//!
//! Expressions lower to single-line JavaScript strings. Context words read
//! from the `ctx` object created at the top of every generated function,
//! locals live in `ctx.locals`, and any other name is a global.

use tracing::trace;

use super::{CodeGenError, JsGenerator, Result};
use crate::ast::{CONTEXT_WORDS, LiteralValue, Node, VariableScope};
use crate::runtime;

const STACK_RED_ZONE: usize = 32 * 1024;
const STACK_GROWTH: usize = 256 * 1024;

impl JsGenerator<'_> {
    pub(super) fn expression(&mut self, node: &Node) -> Result<String> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.expression_inner(node))
    }

    fn expression_inner(&mut self, node: &Node) -> Result<String> {
        match node {
            Node::Literal { value } => Ok(js_literal(value)),
            Node::Identifier { value, .. } => Ok(self.identifier(node, value)),
            Node::Selector { value } => self.query(value),
            Node::Variable { name, scope } => Ok(variable(*scope, name)),
            Node::Possessive { object, property } => {
                let object = self.expression(object)?;
                if let Some(attribute) = property.strip_prefix('@') {
                    let helper = self.require("resolveAttribute")?;
                    Ok(format!("{helper}({object}, {})", js_string(attribute)))
                } else if let Some(style) = property.strip_prefix('*') {
                    Ok(format!("{object}?.style{}", js_member(style)))
                } else {
                    let helper = self.require("getProperty")?;
                    Ok(format!("{helper}({object}, {})", js_string(property)))
                }
            }
            Node::Member {
                object,
                property,
                computed,
            } => {
                let object = self.expression(object)?;
                match (property.string_literal(), computed) {
                    (Some(name), false) => Ok(format!("{object}{}", js_member(name))),
                    _ => {
                        let property = self.expression(property)?;
                        Ok(format!("{object}[{property}]"))
                    }
                }
            }
            Node::Binary {
                operator,
                left,
                right,
            } => match node.unary_operand() {
                Some((operator, operand)) => self.unary(operator, operand),
                None => self.binary(operator, left, right),
            },
            Node::Call { callee, args } => {
                let callee = self.expression(callee)?;
                let args = self.arguments(args)?;
                Ok(format!("{callee}({args})"))
            }
            Node::Array { items } => Ok(format!("[{}]", self.arguments(items)?)),
            Node::EventHandler { .. }
            | Node::Command { .. }
            | Node::If { .. }
            | Node::Repeat { .. }
            | Node::ForEach { .. }
            | Node::While { .. }
            | Node::Sequence { .. } => Err(CodeGenError::UnsupportedNode {
                kind: node.kind().into(),
            }),
        }
    }

    /// Comma-separated expressions.
    pub(super) fn arguments(&mut self, args: &[Node]) -> Result<String> {
        let args = args
            .iter()
            .map(|arg| self.expression(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(args.join(", "))
    }

    fn identifier(&self, node: &Node, value: &str) -> String {
        if let Some(name) = node.binding_name()
            && CONTEXT_WORDS.contains(&name)
        {
            format!("ctx.{name}")
        } else if self.in_filter {
            format!("ctx.event{}", js_optional_member(value))
        } else if self.analysis.variables.is_local(value) {
            format!("ctx.locals{}", js_member(value))
        } else {
            format!("globalThis{}", js_member(value))
        }
    }

    fn unary(&mut self, operator: &str, operand: &Node) -> Result<String> {
        let operand = self.expression(operand)?;
        match operator {
            "-" => Ok(format!("-({operand})")),
            "not" | "!" | "no" => Ok(format!("!({operand})")),
            other => match runtime::positional_helper(other) {
                Some(helper) => {
                    let helper = self.require(helper)?;
                    Ok(format!("{helper}({operand})"))
                }
                None => Err(CodeGenError::UnsupportedNode {
                    kind: format!("unary '{other}'").into(),
                }),
            },
        }
    }

    fn binary(&mut self, operator: &str, left: &Node, right: &Node) -> Result<String> {
        let lhs = self.expression(left)?;
        match operator {
            "matches" => {
                let helper = self.require("matches")?;
                let rhs = match right {
                    Node::Selector { value } => js_string(&runtime::css_text(value)),
                    _ => self.expression(right)?,
                };
                Ok(format!("{helper}({lhs}, {rhs})"))
            }
            "contains" => {
                let helper = self.require("contains")?;
                let rhs = self.expression(right)?;
                Ok(format!("{helper}({lhs}, {rhs})"))
            }
            // `x in xs` asks whether `xs` contains `x`.
            "in" => {
                let helper = self.require("contains")?;
                let rhs = self.expression(right)?;
                Ok(format!("{helper}({rhs}, {lhs})"))
            }
            "as" => {
                let helper = self.require("convert")?;
                let kind = match right {
                    Node::Identifier { value, .. } => js_string(value),
                    _ => match right.string_literal() {
                        Some(kind) => js_string(kind),
                        None => self.expression(right)?,
                    },
                };
                Ok(format!("{helper}({lhs}, {kind})"))
            }
            _ => {
                let rhs = self.expression(right)?;
                Ok(format!("({lhs} {operator} {rhs})"))
            }
        }
    }

    /// A selector looked up for its elements. Cacheable selectors go through a
    /// hoisted lazy binding; the rest are queried in place.
    pub(super) fn query(&mut self, selector: &str) -> Result<String> {
        let helper = self.require(runtime::query_helper(selector))?;
        let cacheable = self
            .analysis
            .selector(selector)
            .is_some_and(|info| info.can_cache);
        if !cacheable {
            return Ok(format!("{helper}({})", js_string(&runtime::css_text(selector))));
        }
        let index = match self.hoisted.iter().position(|s| s == selector) {
            Some(index) => index,
            None => {
                trace!(selector, "hoisting selector");
                self.hoisted.push(selector.into());
                self.hoisted.len() - 1
            }
        };
        Ok(format!("$sel{index}()"))
    }

    /// The element a command acts on, `ctx.me` when none is given.
    pub(super) fn target_or_me(&mut self, target: Option<&Node>) -> Result<String> {
        match target {
            Some(target) => self.expression(target),
            None => Ok("ctx.me".into()),
        }
    }
}

/// A read of a scoped variable.
pub(super) fn variable(scope: VariableScope, name: &str) -> String {
    let name = VariableScope::strip_sigil(name);
    match scope {
        VariableScope::Local => format!("ctx.locals{}", js_member(name)),
        VariableScope::Global => format!("globalThis{}", js_member(name)),
        VariableScope::Element => format!("ctx.me?.$vars{}", js_optional_member(name)),
    }
}

/// The assignable form of a scoped variable.
pub(super) fn variable_place(scope: VariableScope, name: &str) -> String {
    let name = VariableScope::strip_sigil(name);
    match scope {
        VariableScope::Element => format!("(ctx.me.$vars ??= {{}}){}", js_member(name)),
        VariableScope::Local | VariableScope::Global => variable(scope, name),
    }
}

pub(super) fn js_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Null => "null".into(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Number(n) => js_number(*n),
        LiteralValue::String(s) => js_string(s),
    }
}

pub(super) fn js_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        String::from(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        n.to_string()
    }
}

/// A double-quoted JavaScript string literal.
pub(super) fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `.name`, or `["name"]` when `name` is not an identifier.
pub(super) fn js_member(name: &str) -> String {
    if is_js_identifier(name) {
        format!(".{name}")
    } else {
        format!("[{}]", js_string(name))
    }
}

/// `?.name`, or `?.["name"]`.
pub(super) fn js_optional_member(name: &str) -> String {
    if is_js_identifier(name) {
        format!("?.{name}")
    } else {
        format!("?.[{}]", js_string(name))
    }
}

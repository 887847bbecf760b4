// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Whole-program analysis of the shared AST.
//!
//! [`analyze`] walks a program once and produces an [`AnalysisResult`]:
//!
//! - which commands are used and which runtime helpers their lowering needs;
//! - local and global variable reads and writes;
//! - pure and dynamic expressions, and every selector with its usage sites;
//! - a control-flow summary (async, loops, conditionals, throws, nesting);
//! - DOM queries, event types and behavior references.
//!
//! Analysis never fails. Commands the code generator cannot lower are still
//! walked, with a warning, so their operands show up in the result.
//!
//! ```
//! use lokascript_core::ast::Node;
//! use lokascript_core::semantic_analysis::analyze;
//!
//! let program = Node::Command {
//!     name: "toggle".into(),
//!     args: vec![Node::selector(".active")],
//!     target: Some(Box::new(Node::selector("#menu"))),
//!     modifiers: Default::default(),
//! };
//! let result = analyze(&program);
//! assert!(result.requires("toggle"));
//! assert!(result.requires("query"));
//! assert!(result.selector("#menu").is_some_and(|s| s.can_cache));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ecow::{EcoString, eco_format};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::ast::{
    CONTEXT_WORDS, EventModifiers, LiteralValue, Node, Place, SelectorKind, TargetShape,
    VariableScope,
};
use crate::runtime;

pub mod selectors;
pub mod variables;

pub use selectors::SelectorInfo;
pub use variables::{VariableUsage, Variables};

/// Red zone and growth size for [`stacker::maybe_grow`] on recursive walks.
const STACK_RED_ZONE: usize = 32 * 1024;
const STACK_GROWTH: usize = 256 * 1024;

/// Pure and dynamic expressions, plus every selector literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Expressions {
    pub pure: Vec<EcoString>,
    pub dynamic: Vec<EcoString>,
    /// One entry per distinct selector, in order of first use.
    pub selectors: Vec<SelectorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFlow {
    pub has_async: bool,
    pub has_loops: bool,
    pub has_conditionals: bool,
    pub can_throw: bool,
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    /// CSS text of every selector that is queried.
    pub dom_queries: BTreeSet<EcoString>,
    pub event_types: BTreeSet<EcoString>,
    /// Capitalized names assumed to be behaviors or host objects.
    pub behaviors: BTreeSet<EcoString>,
    pub runtime_helpers: BTreeSet<EcoString>,
}

/// The result of analysing one program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub commands_used: BTreeSet<EcoString>,
    pub variables: Variables,
    pub expressions: Expressions,
    pub control_flow: ControlFlow,
    pub dependencies: Dependencies,
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    /// Returns true if generated code may import `helper`.
    #[must_use]
    pub fn requires(&self, helper: &str) -> bool {
        self.dependencies.runtime_helpers.contains(helper)
    }

    #[must_use]
    pub fn selector(&self, selector: &str) -> Option<&SelectorInfo> {
        self.expressions
            .selectors
            .iter()
            .find(|info| info.selector == selector)
    }
}

/// Analyses a program. A fresh analyser is used for every call.
#[instrument(skip_all, fields(kind = program.kind()))]
pub fn analyze(program: &Node) -> AnalysisResult {
    let mut analyser = Analyser::default();
    analyser.statement(program);
    let result = analyser.result;
    debug!(
        commands = result.commands_used.len(),
        helpers = result.dependencies.runtime_helpers.len(),
        selectors = result.expressions.selectors.len(),
        "analysis complete"
    );
    result
}

/// Whether a selector is looked up or only named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Query,
    Name,
}

/// How an assignment touches its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Write {
    Assign,
    Update,
    Append,
}

#[derive(Debug, Default)]
struct Analyser {
    result: AnalysisResult,
    depth: usize,
    statements: usize,
    /// Inside an event filter, bare names are event properties.
    in_filter: bool,
}

impl Analyser {
    fn helper(&mut self, name: &'static str) {
        self.result.dependencies.runtime_helpers.insert(name.into());
    }

    fn warn(&mut self, message: String) {
        self.result.warnings.push(message);
    }

    fn site(&self, command: &str, role: &str) -> EcoString {
        eco_format!("{}:{command}.{role}", self.statements)
    }

    fn statement(&mut self, node: &Node) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.statement_inner(node));
    }

    fn statement_inner(&mut self, node: &Node) {
        match node {
            Node::Sequence { body } => {
                for statement in body {
                    self.statement(statement);
                }
            }
            Node::EventHandler {
                event,
                modifiers,
                body,
            } => self.event_handler(event, modifiers, body),
            Node::Command {
                name,
                args,
                target,
                modifiers,
            } => {
                self.result.commands_used.insert(name.clone());
                if runtime::LOWERED_COMMANDS.contains(&name.as_str()) {
                    self.command(name, args, target.as_deref(), modifiers);
                } else {
                    self.warn(format!(
                        "'{name}' has no lowering; its operands were analysed generically"
                    ));
                    self.generic_command(name, args, target.as_deref(), modifiers);
                }
                self.statements += 1;
            }
            Node::If {
                condition,
                then_branch,
                else_if_branches,
                else_branch,
            } => {
                self.result.control_flow.has_conditionals = true;
                self.root(condition, "if", "condition", Position::Query);
                self.statements += 1;
                self.nested(|a| {
                    a.statement(then_branch);
                    for arm in else_if_branches {
                        a.root(&arm.condition, "if", "condition", Position::Query);
                        a.statement(&arm.body);
                    }
                    if let Some(otherwise) = else_branch {
                        a.statement(otherwise);
                    }
                });
            }
            Node::Repeat { count, body } => {
                self.result.control_flow.has_loops = true;
                if let Some(count) = count {
                    self.root(count, "repeat", "count", Position::Query);
                }
                self.statements += 1;
                self.nested(|a| a.statement(body));
            }
            Node::ForEach {
                item_name,
                index_name,
                collection,
                body,
            } => {
                self.result.control_flow.has_loops = true;
                self.helper("toArray");
                self.root(collection, "forEach", "collection", Position::Query);
                let site = self.site("forEach", "item");
                self.result
                    .variables
                    .write(VariableScope::Local, item_name, site);
                if let Some(index) = index_name {
                    let site = self.site("forEach", "index");
                    self.result.variables.write(VariableScope::Local, index, site);
                }
                self.statements += 1;
                self.nested(|a| a.statement(body));
            }
            Node::While { condition, body } => {
                self.result.control_flow.has_loops = true;
                self.root(condition, "while", "condition", Position::Query);
                self.statements += 1;
                self.nested(|a| a.statement(body));
            }
            Node::Literal { .. }
            | Node::Identifier { .. }
            | Node::Selector { .. }
            | Node::Variable { .. }
            | Node::Possessive { .. }
            | Node::Member { .. }
            | Node::Binary { .. }
            | Node::Call { .. }
            | Node::Array { .. } => {
                self.warn(format!("{} in statement position", node.kind()));
                self.root(node, "statement", "expression", Position::Query);
                self.statements += 1;
            }
        }
    }

    fn nested(&mut self, visit: impl FnOnce(&mut Self)) {
        self.depth += 1;
        let flow = &mut self.result.control_flow;
        flow.max_nesting_depth = flow.max_nesting_depth.max(self.depth);
        visit(self);
        self.depth -= 1;
    }

    fn event_handler(&mut self, event: &EcoString, modifiers: &EventModifiers<Node>, body: &Node) {
        self.result.dependencies.event_types.insert(event.clone());
        if modifiers.debounce_ms.is_some() {
            self.helper("debounce");
        }
        if modifiers.throttle_ms.is_some() {
            self.helper("throttle");
        }
        if let Some(source) = &modifiers.from {
            self.helper("delegate");
            self.root(source, "on", "from", Position::Query);
        }
        if let Some(filter) = &modifiers.filter {
            self.in_filter = true;
            self.root(filter, "on", "filter", Position::Query);
            self.in_filter = false;
        }
        self.statement(body);
    }

    #[allow(clippy::too_many_lines)] // one arm per command
    fn command(
        &mut self,
        name: &str,
        args: &[Node],
        target: Option<&Node>,
        modifiers: &BTreeMap<EcoString, Node>,
    ) {
        let mut consumed: &[&str] = &[];
        match name {
            "add" | "remove" | "take" => {
                let mut element_args = Vec::new();
                for arg in args {
                    if is_class_or_attribute(arg) {
                        self.root(arg, name, "args", Position::Name);
                    } else if name == "remove" {
                        element_args.push(arg);
                    } else {
                        self.root(arg, name, "args", Position::Query);
                    }
                }
                for arg in element_args {
                    self.element_target(name, Some(arg));
                }
                let source = target.or_else(|| modifiers.get("from"));
                consumed = &["from"];
                if name == "take" {
                    if source.is_none() {
                        for arg in args {
                            if let Node::Selector { value } = arg
                                && is_class_or_attribute(arg)
                            {
                                self.helper("queryAll");
                                self.result
                                    .dependencies
                                    .dom_queries
                                    .insert(runtime::css_text(value).into());
                            }
                        }
                    }
                    self.element_target(name, source);
                    self.result.variables.context_vars.insert("me".into());
                } else {
                    self.element_target(name, source);
                }
            }
            "toggle" => {
                for arg in args {
                    if let Node::Selector { value } = arg
                        && let Some(helper) = runtime::toggle_helper(value)
                    {
                        self.helper(helper);
                        self.root(arg, name, "args", Position::Name);
                    } else {
                        self.root(arg, name, "args", Position::Query);
                    }
                }
                if let Some(target) = target {
                    self.root(target, name, "target", Position::Query);
                }
                if modifiers.contains_key("for") {
                    self.helper("wait");
                    self.result.control_flow.has_async = true;
                }
            }
            "put" => {
                self.helper("insertContent");
                for arg in args {
                    self.root(arg, name, "args", Position::Query);
                }
                let into = modifiers
                    .get("position")
                    .is_none_or(|p| p.string_literal() == Some("into"));
                match target {
                    Some(target) if into => self.place(name, target, Write::Assign),
                    Some(target) => self.root(target, name, "target", Position::Query),
                    None => {}
                }
            }
            "set" => {
                for arg in args {
                    self.root(arg, name, "args", Position::Query);
                }
                match target {
                    Some(target) => self.place(name, target, Write::Assign),
                    None => self.helper("insertContent"),
                }
            }
            "increment" | "decrement" => {
                match target {
                    Some(target) => self.place(name, target, Write::Update),
                    None => {
                        self.helper("getProperty");
                        self.helper("setProperty");
                    }
                }
                for arg in args {
                    self.root(arg, name, "args", Position::Query);
                }
            }
            "append" => {
                for arg in args {
                    self.root(arg, name, "args", Position::Query);
                }
                match target {
                    Some(target) => self.place(name, target, Write::Append),
                    None => {
                        self.result.variables.context_vars.insert("result".into());
                    }
                }
            }
            "show" | "hide" => {
                self.helper(if name == "show" { "show" } else { "hide" });
                self.targets(name, args, target);
            }
            "wait" => {
                self.helper("wait");
                self.result.control_flow.has_async = true;
                if let Some(event) = modifiers.get("event").and_then(Node::string_literal) {
                    self.result.dependencies.event_types.insert(event.into());
                }
                self.targets(name, args, target);
            }
            "settle" => {
                self.helper("wait");
                self.helper("nextFrame");
                self.result.control_flow.has_async = true;
                self.targets(name, args, target);
            }
            "send" | "trigger" => {
                self.helper("dispatch");
                if let Some(event) = args.first().and_then(Node::string_literal) {
                    self.result.dependencies.event_types.insert(event.into());
                }
                self.targets(name, args, target);
            }
            "fetch" => {
                let format = modifiers.get("as").and_then(Node::string_literal);
                self.helper(runtime::fetch_helper(format));
                self.result.control_flow.has_async = true;
                consumed = &["as"];
                self.targets(name, args, target);
            }
            "call" => {
                if let Some(Node::Identifier { value, .. }) = args.first()
                    && value.starts_with(char::is_uppercase)
                {
                    self.result.dependencies.behaviors.insert(value.clone());
                }
                self.targets(name, args, target);
            }
            "focus" | "blur" => {
                for arg in args {
                    self.root(arg, name, "args", Position::Query);
                }
                self.element_target(name, target);
            }
            "halt" | "exit" | "throw" => {
                self.result.control_flow.can_throw = true;
                self.targets(name, args, target);
            }
            _ => self.targets(name, args, target),
        }

        for (key, value) in modifiers {
            if !consumed.contains(&key.as_str()) {
                self.root(value, name, key, Position::Query);
            }
        }
    }

    /// Arguments and target, as plain expressions.
    fn targets(&mut self, command: &str, args: &[Node], target: Option<&Node>) {
        for arg in args {
            self.root(arg, command, "args", Position::Query);
        }
        if let Some(target) = target {
            self.root(target, command, "target", Position::Query);
        }
    }

    /// A target whose elements are visited one at a time.
    fn element_target(&mut self, command: &str, target: Option<&Node>) {
        let Some(target) = target else {
            return;
        };
        if TargetShape::of(target) == TargetShape::Dynamic {
            self.helper("toArray");
        }
        self.root(target, command, "target", Position::Query);
    }

    fn generic_command(
        &mut self,
        name: &str,
        args: &[Node],
        target: Option<&Node>,
        modifiers: &BTreeMap<EcoString, Node>,
    ) {
        self.targets(name, args, target);
        for (key, value) in modifiers {
            self.root(value, name, key, Position::Query);
        }
    }

    fn place(&mut self, command: &str, target: &Node, write: Write) {
        let site = self.site(command, "target");
        match Place::of(target) {
            Place::Local(name) | Place::Element(name) => {
                if write != Write::Assign {
                    self.result
                        .variables
                        .read(VariableScope::Local, name, site.clone());
                }
                self.result.variables.write(VariableScope::Local, name, site);
            }
            Place::Global(name) => {
                if write != Write::Assign {
                    self.result
                        .variables
                        .read(VariableScope::Global, name, site.clone());
                }
                self.result
                    .variables
                    .write(VariableScope::Global, name, site);
            }
            Place::Context(name) => {
                self.result.variables.context_vars.insert(name.into());
            }
            Place::Property { object, .. } => {
                self.root(object, command, "target", Position::Query);
                self.helper("setProperty");
                if write != Write::Assign {
                    self.helper("getProperty");
                }
            }
            Place::Attribute { object, .. } => {
                self.root(object, command, "target", Position::Query);
                if write != Write::Assign {
                    self.helper("resolveAttribute");
                }
            }
            Place::Style { object, .. } => self.root(object, command, "target", Position::Query),
            Place::Member {
                object,
                property,
                computed,
            } => {
                self.root(object, command, "target", Position::Query);
                if computed {
                    self.root(property, command, "target", Position::Query);
                }
            }
            Place::Content(node) => {
                self.root(node, command, "target", Position::Query);
                match write {
                    Write::Assign | Write::Append => self.helper("insertContent"),
                    Write::Update => {
                        self.helper("getProperty");
                        self.helper("setProperty");
                    }
                }
            }
        }
    }

    /// A top-level expression: classified, then walked.
    fn root(&mut self, node: &Node, command: &str, role: &str, position: Position) {
        let text: EcoString = describe(node).into();
        if is_pure(node) {
            self.result.expressions.pure.push(text);
        } else {
            self.result.expressions.dynamic.push(text);
        }
        let site = self.site(command, role);
        self.expression(node, &site, position);
    }

    fn expression(&mut self, node: &Node, site: &EcoString, position: Position) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.expression_inner(node, site, position);
        });
    }

    fn expression_inner(&mut self, node: &Node, site: &EcoString, position: Position) {
        match node {
            Node::Literal { .. } => {}
            Node::Identifier { value, .. } => {
                if let Some(name) = node.binding_name()
                    && CONTEXT_WORDS.contains(&name)
                {
                    self.result.variables.context_vars.insert(name.into());
                } else if value.starts_with(char::is_uppercase) {
                    self.result.dependencies.behaviors.insert(value.clone());
                } else if !self.in_filter {
                    let scope = self.result.variables.resolve(value);
                    self.result.variables.read(scope, value, site.clone());
                }
            }
            Node::Selector { value } => self.selector(value, site, position),
            Node::Variable { name, scope } => {
                self.result.variables.read(*scope, name, site.clone());
            }
            Node::Possessive { object, property } => {
                if property.starts_with('@') {
                    self.helper("resolveAttribute");
                } else if !property.starts_with('*') {
                    self.helper("getProperty");
                }
                self.expression(object, site, Position::Query);
            }
            Node::Member {
                object,
                property,
                computed,
            } => {
                self.expression(object, site, Position::Query);
                if *computed {
                    self.expression(property, site, Position::Query);
                }
            }
            Node::Binary {
                operator,
                left,
                right,
            } => {
                if let Some((operator, operand)) = node.unary_operand() {
                    if let Some(helper) = runtime::positional_helper(operator) {
                        self.helper(helper);
                    }
                    self.expression(operand, site, Position::Query);
                    return;
                }
                if let Some(helper) = runtime::operator_helper(operator) {
                    self.helper(helper);
                }
                self.expression(left, site, Position::Query);
                match (operator.as_str(), &**right) {
                    ("matches", Node::Selector { value }) => {
                        self.selector(value, site, Position::Name);
                    }
                    ("as", Node::Identifier { .. } | Node::Literal { .. }) => {}
                    _ => self.expression(right, site, Position::Query),
                }
            }
            Node::Call { callee, args } => {
                self.expression(callee, site, Position::Query);
                for arg in args {
                    self.expression(arg, site, Position::Query);
                }
            }
            Node::Array { items } => {
                for item in items {
                    self.expression(item, site, Position::Query);
                }
            }
            Node::EventHandler { .. }
            | Node::Command { .. }
            | Node::If { .. }
            | Node::Repeat { .. }
            | Node::ForEach { .. }
            | Node::While { .. }
            | Node::Sequence { .. } => {
                self.warn(format!("{} in expression position", node.kind()));
                self.statement(node);
            }
        }
    }

    fn selector(&mut self, selector: &EcoString, site: &EcoString, position: Position) {
        let selectors = &mut self.result.expressions.selectors;
        let index = match selectors.iter().position(|s| s.selector == *selector) {
            Some(index) => index,
            None => {
                selectors.push(SelectorInfo::new(selector));
                selectors.len() - 1
            }
        };
        selectors[index].usages.push(site.clone());

        if position == Position::Query {
            self.helper(runtime::query_helper(selector));
            self.result
                .dependencies
                .dom_queries
                .insert(runtime::css_text(selector).into());
        }
    }
}

/// A `.class` or `[@attr]` selector used as a name rather than a query.
fn is_class_or_attribute(node: &Node) -> bool {
    matches!(
        node,
        Node::Selector { value }
            if matches!(SelectorKind::of(value), SelectorKind::Class | SelectorKind::Attribute)
    )
}

/// Literals, plain names, plain selectors and operators over those.
fn is_pure(node: &Node) -> bool {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || match node {
        Node::Literal { .. } => true,
        Node::Identifier { .. } => !node.is_context_reference(),
        Node::Selector { value } => selectors::is_pure(value),
        Node::Binary { left, right, .. } => is_pure(left) && is_pure(right),
        _ => false,
    })
}

/// Source-like text for an expression.
fn describe(node: &Node) -> String {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || match node {
        Node::Literal { value } => value.to_string(),
        Node::Identifier { value, .. } => value.to_string(),
        Node::Selector { value } => value.to_string(),
        Node::Variable { name, scope } => match scope {
            VariableScope::Local => name.to_string(),
            VariableScope::Global => format!("${name}"),
            VariableScope::Element => format!("^{name}"),
        },
        Node::Possessive { object, property } => match object.as_ref() {
            Node::Identifier { value, name: Some(_) } => format!("{value} {property}"),
            _ => format!("{}'s {property}", describe_operand(object)),
        },
        Node::Member {
            object,
            property,
            computed,
        } => match (property.as_ref(), computed) {
            (
                Node::Literal {
                    value: LiteralValue::String(name),
                },
                false,
            ) => format!("{}.{name}", describe_operand(object)),
            _ => format!("{}[{}]", describe_operand(object), describe(property)),
        },
        Node::Binary {
            operator,
            left,
            right,
        } => match node.unary_operand() {
            Some((op @ ("-" | "!"), operand)) => format!("{op}{}", describe_operand(operand)),
            Some((op, operand)) => format!("{op} {}", describe_operand(operand)),
            None => format!(
                "{} {operator} {}",
                describe_operand(left),
                describe_operand(right)
            ),
        },
        Node::Call { callee, args } => format!(
            "{}({})",
            describe_operand(callee),
            args.iter().map(describe).collect::<Vec<_>>().join(", ")
        ),
        Node::Array { items } => format!(
            "[{}]",
            items.iter().map(describe).collect::<Vec<_>>().join(", ")
        ),
        other => format!("<{}>", other.kind()),
    })
}

fn describe_operand(node: &Node) -> String {
    match node {
        Node::Binary { .. } if node.unary_operand().is_none() => format!("({})", describe(node)),
        _ => describe(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::from_grammar_node;
    use crate::source_analysis::parse_source;

    fn analyse(source: &str) -> AnalysisResult {
        let grammar = parse_source(source).unwrap_or_else(|e| panic!("{source:?}: {e}"));
        analyze(&from_grammar_node(&grammar))
    }

    fn helpers(result: &AnalysisResult) -> Vec<&str> {
        result
            .dependencies
            .runtime_helpers
            .iter()
            .map(EcoString::as_str)
            .collect()
    }

    #[test]
    fn toggle_registers_only_toggle() {
        let result = analyse("on click toggle .active");
        assert_eq!(helpers(&result), ["toggle"]);
        assert!(result.commands_used.contains("toggle"));
        assert!(result.dependencies.event_types.contains("click"));
    }

    #[test]
    fn toggle_attributes() {
        assert_eq!(helpers(&analyse("toggle [@disabled]")), ["toggleBooleanAttribute"]);
        assert_eq!(
            helpers(&analyse("toggle [@aria-expanded=\"true\"]")),
            ["toggleAttribute"]
        );
    }

    #[test]
    fn toggle_for_a_duration_waits() {
        let result = analyse("toggle .open for 2s");
        assert_eq!(helpers(&result), ["toggle", "wait"]);
        assert!(result.control_flow.has_async);
    }

    #[test]
    fn fetch_helpers_by_format() {
        assert!(analyse("fetch /api/items").requires("fetchJSON"));
        assert!(analyse("fetch /page as html").requires("fetchHTML"));
        let text = analyse("fetch /notes as text");
        assert!(text.requires("fetchText"));
        assert!(!text.requires("fetchJSON"));
        assert!(text.control_flow.has_async);
    }

    #[test]
    fn wait_and_settle() {
        let wait = analyse("wait 100ms");
        assert_eq!(helpers(&wait), ["wait"]);
        assert!(wait.control_flow.has_async);
        assert_eq!(helpers(&analyse("settle")), ["nextFrame", "wait"]);
    }

    #[test]
    fn send_registers_dispatch_and_event() {
        let result = analyse("send refresh to #list");
        assert!(result.requires("dispatch"));
        assert!(result.requires("query"));
        assert!(result.dependencies.event_types.contains("refresh"));
        assert!(result.dependencies.dom_queries.contains("#list"));
    }

    #[test]
    fn call_records_behavior() {
        let result = analyse("call Removable");
        assert!(result.dependencies.behaviors.contains("Removable"));
    }

    #[test]
    fn selector_cacheability() {
        let result = analyse("show .sidebar:hover then hide #main");
        let hover = result.selector(".sidebar:hover").expect("recorded");
        assert!(!hover.can_cache);
        let main = result.selector("#main").expect("recorded");
        assert!(main.can_cache);
        assert!(main.is_id);
    }

    #[test]
    fn array_items_are_walked() {
        let result = analyse("log [#a, my value]");
        assert!(result.selector("#a").is_some());
        assert!(result.dependencies.runtime_helpers.contains("getProperty"));
    }

    #[test]
    fn selectors_are_recorded_once_with_all_usages() {
        let result = analyse("add .a to #x then remove .a from #x");
        assert_eq!(result.expressions.selectors.len(), 2);
        assert_eq!(result.selector(".a").map(|s| s.usages.len()), Some(2));
        assert_eq!(result.selector("#x").map(|s| s.usages.len()), Some(2));
        assert_eq!(
            result.dependencies.dom_queries.iter().collect::<Vec<_>>(),
            ["#x"]
        );
    }

    #[test]
    fn for_each_registers_item_and_one_nesting_level() {
        let result = analyse("repeat for item in items log item end");
        assert!(result.control_flow.has_loops);
        assert_eq!(result.control_flow.max_nesting_depth, 1);
        let item = &result.variables.locals["item"];
        assert_eq!(item.writes.len(), 1);
        assert_eq!(item.reads.len(), 1);
        assert!(result.requires("toArray"));
    }

    #[test]
    fn nesting_depth_tracks_the_deepest_block() {
        let result = analyse("if a repeat 3 times if b log 1 end end end then if c log 2 end");
        assert_eq!(result.control_flow.max_nesting_depth, 3);
        assert!(result.control_flow.has_conditionals);
        assert!(result.control_flow.has_loops);
    }

    #[test]
    fn halt_exit_and_throw_can_throw() {
        for source in ["halt", "exit", "throw 'x'"] {
            assert!(analyse(source).control_flow.can_throw, "{source}");
        }
        assert!(!analyse("log 1").control_flow.can_throw);
    }

    #[test]
    fn variables_by_scope() {
        let result = analyse("set $total to 1 then set count to $total then increment :count");
        assert!(result.variables.globals.contains_key("total"));
        let count = &result.variables.locals["count"];
        assert_eq!(count.writes.len(), 2);
        assert_eq!(count.reads.len(), 1);
    }

    #[test]
    fn context_words_are_collected() {
        let result = analyse("put my value into it then log event");
        let context: Vec<_> = result.variables.context_vars.iter().map(EcoString::as_str).collect();
        assert_eq!(context, ["event", "it", "me"]);
    }

    #[test]
    fn put_into_property_sets_it() {
        let result = analyse("put 'x' into #out's value");
        assert!(result.requires("setProperty"));
        assert!(!result.requires("getProperty"));
        assert!(result.requires("query"));
    }

    #[test]
    fn increment_element_content_reads_and_writes() {
        let result = analyse("increment #count");
        assert!(result.requires("getProperty"));
        assert!(result.requires("setProperty"));
    }

    #[test]
    fn expression_purity() {
        let result = analyse("log 1 + 2 then log me then log #a");
        assert!(result.expressions.pure.contains(&EcoString::from("1 + 2")));
        assert!(result.expressions.pure.contains(&EcoString::from("#a")));
        assert!(result.expressions.dynamic.contains(&EcoString::from("me")));
    }

    #[test]
    fn operator_helpers() {
        let result = analyse("if x matches .open and first of .item contains y log x as Int end");
        for helper in ["matches", "first", "contains", "convert", "queryAll"] {
            assert!(result.requires(helper), "{helper}");
        }
        let open = result.selector(".open").expect("recorded");
        assert_eq!(open.usages.len(), 1);
        assert!(!result.dependencies.dom_queries.contains(".open"));
        assert!(!result.dependencies.behaviors.contains("Int"));
    }

    #[test]
    fn handler_modifiers() {
        let result = analyse("on keyup[key == \"Enter\"] from #search debounced at 300ms log 1");
        assert!(result.requires("debounce"));
        assert!(result.requires("delegate"));
        assert!(result.requires("query"));
        assert!(!result.variables.globals.contains_key("key"));
    }

    #[test]
    fn unknown_commands_are_walked_with_a_warning() {
        let result = analyse("beep #box");
        assert!(result.commands_used.contains("beep"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.selector("#box").is_some());
    }

    #[test]
    fn analysis_is_repeatable() {
        let source = "on click set x to 1 then put x into #out then fetch /a then log x";
        let grammar = parse_source(source).unwrap_or_else(|e| panic!("{e}"));
        let node = from_grammar_node(&grammar);
        let first = analyze(&node);
        let second = analyze(&node);
        assert_eq!(first.commands_used, second.commands_used);
        assert_eq!(first.variables, second.variables);
        assert_eq!(first.dependencies, second.dependencies);
    }

    #[test]
    fn deep_expressions_do_not_overflow() {
        let mut node = Node::number(0.0);
        for _ in 0..2_000 {
            node = Node::binary("+", node, Node::number(1.0));
        }
        let program = Node::command("log", vec![node]);
        let result = analyze(&program);
        assert_eq!(result.expressions.pure.len(), 1);
    }
}

// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The shared abstract syntax tree.
//!
//! Both front ends converge on [`Node`]: the grammar parser through
//! [`crate::interchange::from_grammar_node`] and the semantic matcher through
//! [`crate::interchange::from_semantic_node`]. Nodes are plain values with no
//! reference back to source tokens; the analyzer and code generator consume
//! them without knowing which front end produced them.
//!
//! Unary operators do not have their own variant. `not x` is represented as
//! `Binary { operator: "not", left: Literal 0, right: x }`, and the same
//! holds for `-`, `!`, `no` and the positional operators `first`, `last` and
//! `random`. Use [`Node::unary_operand`] to recognize that shape.

use std::collections::BTreeMap;
use std::fmt;

use ecow::EcoString;
use serde::Serialize;

/// Context words that name the execution context rather than a variable.
pub const CONTEXT_WORDS: &[&str] = &["me", "you", "it", "result", "event"];

/// Binary operators that are the desugared form of a unary operator.
pub const UNARY_OPERATORS: &[&str] = &["not", "!", "-", "no", "first", "last", "random"];

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(EcoString),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Where a variable lives: `:x` is local, `$x` global, `^x` element-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Local,
    Global,
    Element,
}

impl VariableScope {
    /// The scope selected by a sigil character, if it is one.
    #[must_use]
    pub fn from_sigil(sigil: &str) -> Option<Self> {
        match sigil {
            ":" => Some(Self::Local),
            "$" => Some(Self::Global),
            "^" => Some(Self::Element),
            _ => None,
        }
    }

    /// Strips a leading scope sigil from `name`.
    #[must_use]
    pub fn strip_sigil(name: &str) -> &str {
        name.strip_prefix([':', '$', '^']).unwrap_or(name)
    }
}

/// Event-handler options, shared by the grammar and semantic shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventModifiers<N> {
    pub once: bool,
    pub prevent: bool,
    pub stop: bool,
    pub debounce_ms: Option<u64>,
    pub throttle_ms: Option<u64>,
    /// `on click from #button`
    pub from: Option<Box<N>>,
    /// `on keyup[key is "Enter"]`
    pub filter: Option<Box<N>>,
}

impl<N> Default for EventModifiers<N> {
    fn default() -> Self {
        Self {
            once: false,
            prevent: false,
            stop: false,
            debounce_ms: None,
            throttle_ms: None,
            from: None,
            filter: None,
        }
    }
}

impl<N> EventModifiers<N> {
    /// Converts the node type carried by `from` and `filter`.
    pub fn map<M>(&self, mut convert: impl FnMut(&N) -> M) -> EventModifiers<M> {
        EventModifiers {
            once: self.once,
            prevent: self.prevent,
            stop: self.stop,
            debounce_ms: self.debounce_ms,
            throttle_ms: self.throttle_ms,
            from: self.from.as_deref().map(|n| Box::new(convert(n))),
            filter: self.filter.as_deref().map(|n| Box::new(convert(n))),
        }
    }
}

/// One `else if` arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElseIf {
    pub condition: Node,
    pub body: Node,
}

/// A node of the shared AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    EventHandler {
        event: EcoString,
        modifiers: EventModifiers<Node>,
        body: Box<Node>,
    },
    Command {
        name: EcoString,
        args: Vec<Node>,
        target: Option<Box<Node>>,
        modifiers: BTreeMap<EcoString, Node>,
    },
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_if_branches: Vec<ElseIf>,
        else_branch: Option<Box<Node>>,
    },
    /// `repeat N times` when `count` is set, `repeat forever` otherwise.
    Repeat {
        count: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForEach {
        item_name: EcoString,
        index_name: Option<EcoString>,
        collection: Box<Node>,
        body: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    Literal {
        value: LiteralValue,
    },
    /// A bare word. `name` holds the canonical binding when it differs from
    /// the source text (`my` and `I` name `me`, `its` names `it`).
    Identifier {
        value: EcoString,
        name: Option<EcoString>,
    },
    Selector {
        value: EcoString,
    },
    Variable {
        name: EcoString,
        scope: VariableScope,
    },
    /// `x's y`, `my y`, `the y of x`. A property starting with `@` is an
    /// attribute and one starting with `*` a style property.
    Possessive {
        object: Box<Node>,
        property: EcoString,
    },
    Member {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    Binary {
        operator: EcoString,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Array {
        items: Vec<Node>,
    },
    /// Statements executed in order.
    Sequence {
        body: Vec<Node>,
    },
}

impl Node {
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal {
            value: LiteralValue::Null,
        }
    }

    #[must_use]
    pub fn string(value: impl Into<EcoString>) -> Self {
        Self::Literal {
            value: LiteralValue::String(value.into()),
        }
    }

    #[must_use]
    pub const fn number(value: f64) -> Self {
        Self::Literal {
            value: LiteralValue::Number(value),
        }
    }

    #[must_use]
    pub fn identifier(value: impl Into<EcoString>) -> Self {
        Self::Identifier {
            value: value.into(),
            name: None,
        }
    }

    /// The implicit current element.
    #[must_use]
    pub fn me() -> Self {
        Self::identifier("me")
    }

    #[must_use]
    pub fn selector(value: impl Into<EcoString>) -> Self {
        Self::Selector {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn binary(operator: impl Into<EcoString>, left: Node, right: Node) -> Self {
        Self::Binary {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Desugars a unary operator to a binary node with a zero left operand.
    #[must_use]
    pub fn unary(operator: impl Into<EcoString>, operand: Node) -> Self {
        Self::binary(operator, Self::number(0.0), operand)
    }

    /// Wraps statements in a sequence, collapsing a single statement.
    #[must_use]
    pub fn sequence(mut body: Vec<Node>) -> Self {
        if body.len() == 1 {
            body.remove(0)
        } else {
            Self::Sequence { body }
        }
    }

    /// A command with no target or modifiers.
    #[must_use]
    pub fn command(name: impl Into<EcoString>, args: Vec<Node>) -> Self {
        Self::Command {
            name: name.into(),
            args,
            target: None,
            modifiers: BTreeMap::new(),
        }
    }

    /// The variant name, as used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EventHandler { .. } => "eventHandler",
            Self::Command { .. } => "command",
            Self::If { .. } => "if",
            Self::Repeat { .. } => "repeat",
            Self::ForEach { .. } => "forEach",
            Self::While { .. } => "while",
            Self::Literal { .. } => "literal",
            Self::Identifier { .. } => "identifier",
            Self::Selector { .. } => "selector",
            Self::Variable { .. } => "variable",
            Self::Possessive { .. } => "possessive",
            Self::Member { .. } => "member",
            Self::Binary { .. } => "binary",
            Self::Call { .. } => "call",
            Self::Array { .. } => "array",
            Self::Sequence { .. } => "sequence",
        }
    }

    /// For a desugared unary node, returns `(operator, operand)`.
    #[must_use]
    pub fn unary_operand(&self) -> Option<(&str, &Node)> {
        match self {
            Self::Binary {
                operator,
                left,
                right,
            } if UNARY_OPERATORS.contains(&operator.as_str())
                && matches!(**left, Self::Literal { value: LiteralValue::Number(n) } if n == 0.0) =>
            {
                Some((operator.as_str(), right))
            }
            _ => None,
        }
    }

    /// The text of a string literal.
    #[must_use]
    pub fn string_literal(&self) -> Option<&str> {
        match self {
            Self::Literal {
                value: LiteralValue::String(s),
            } => Some(s),
            _ => None,
        }
    }

    /// The name an identifier binds to (`my` binds `me`).
    #[must_use]
    pub fn binding_name(&self) -> Option<&str> {
        match self {
            Self::Identifier { value, name } => Some(name.as_deref().unwrap_or(value)),
            _ => None,
        }
    }

    /// Returns true for identifiers naming a context word.
    #[must_use]
    pub fn is_context_reference(&self) -> bool {
        self.binding_name().is_some_and(|n| CONTEXT_WORDS.contains(&n))
    }
}

/// How a command target resolves to elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    /// Exactly one element: `me`, `#id`, `it`.
    Single,
    /// A selector matching any number of elements: `.item`, `<li/>`.
    Collection,
    /// Anything else, coerced to an array at runtime.
    Dynamic,
}

impl TargetShape {
    #[must_use]
    pub fn of(node: &Node) -> Self {
        match node {
            Node::Identifier { .. } if node.is_context_reference() => Self::Single,
            Node::Selector { value } if value.starts_with('#') => Self::Single,
            Node::Selector { .. } => Self::Collection,
            _ => Self::Dynamic,
        }
    }
}

/// Selector kinds, by leading sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Class,
    Id,
    Query,
    Attribute,
}

impl SelectorKind {
    #[must_use]
    pub fn of(selector: &str) -> Self {
        match selector.as_bytes().first() {
            Some(b'.') => Self::Class,
            Some(b'#') => Self::Id,
            Some(b'[') => Self::Attribute,
            _ => Self::Query,
        }
    }
}

/// The CSS text of a selector, with `<query/>` delimiters removed.
#[must_use]
pub fn selector_css(selector: &str) -> &str {
    selector
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix("/>"))
        .map_or(selector, str::trim)
}

/// What an assignment (`set`, `put ... into`, `increment`, `append`) writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Place<'n> {
    /// A `:local` variable or a bare identifier.
    Local(&'n str),
    /// A `$global` variable.
    Global(&'n str),
    /// A `^element` variable, stored on the current element.
    Element(&'n str),
    /// `it` or `result`.
    Context(&'n str),
    Property { object: &'n Node, name: &'n str },
    /// `@name`, without the sigil.
    Attribute { object: &'n Node, name: &'n str },
    /// `*name`, without the sigil.
    Style { object: &'n Node, name: &'n str },
    Member {
        object: &'n Node,
        property: &'n Node,
        computed: bool,
    },
    /// The content of an element: selectors, `me` and anything dynamic.
    Content(&'n Node),
}

impl<'n> Place<'n> {
    #[must_use]
    pub fn of(node: &'n Node) -> Self {
        match node {
            Node::Variable { name, scope } => {
                let name = VariableScope::strip_sigil(name);
                match scope {
                    VariableScope::Local => Self::Local(name),
                    VariableScope::Global => Self::Global(name),
                    VariableScope::Element => Self::Element(name),
                }
            }
            Node::Identifier { .. } => match node.binding_name() {
                Some(name @ ("it" | "result")) => Self::Context(name),
                Some(name) if !node.is_context_reference() => Self::Local(name),
                _ => Self::Content(node),
            },
            Node::Possessive { object, property } => {
                if let Some(name) = property.strip_prefix('@') {
                    Self::Attribute { object, name }
                } else if let Some(name) = property.strip_prefix('*') {
                    Self::Style { object, name }
                } else {
                    Self::Property {
                        object,
                        name: property,
                    }
                }
            }
            Node::Member {
                object,
                property,
                computed,
            } => Self::Member {
                object,
                property,
                computed: *computed,
            },
            other => Self::Content(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_statement_sequence_collapses() {
        let node = Node::sequence(vec![Node::command("halt", vec![])]);
        assert_eq!(node.kind(), "command");
        assert_eq!(Node::sequence(vec![]).kind(), "sequence");
    }

    #[test]
    fn unary_desugars_to_binary_with_zero() {
        let node = Node::unary("not", Node::identifier("x"));
        let Node::Binary { operator, left, .. } = &node else {
            panic!("expected binary, got {node:?}");
        };
        assert_eq!(operator, "not");
        assert_eq!(**left, Node::number(0.0));
        assert_eq!(node.unary_operand().map(|(op, _)| op), Some("not"));
    }

    #[test]
    fn plain_subtraction_is_not_unary() {
        let node = Node::binary("-", Node::number(5.0), Node::number(0.0));
        assert!(node.unary_operand().is_none());
    }

    #[test]
    fn binding_name_prefers_canonical() {
        let my = Node::Identifier {
            value: "my".into(),
            name: Some("me".into()),
        };
        assert_eq!(my.binding_name(), Some("me"));
        assert!(my.is_context_reference());
        assert!(!Node::identifier("count").is_context_reference());
    }

    #[test]
    fn target_shapes() {
        assert_eq!(TargetShape::of(&Node::me()), TargetShape::Single);
        assert_eq!(TargetShape::of(&Node::selector("#out")), TargetShape::Single);
        assert_eq!(TargetShape::of(&Node::selector(".item")), TargetShape::Collection);
        assert_eq!(TargetShape::of(&Node::identifier("items")), TargetShape::Dynamic);
    }

    #[test]
    fn scope_sigils() {
        assert_eq!(VariableScope::from_sigil("$"), Some(VariableScope::Global));
        assert_eq!(VariableScope::strip_sigil("^count"), "count");
        assert_eq!(VariableScope::strip_sigil("count"), "count");
    }

    #[test]
    fn query_literal_css() {
        assert_eq!(selector_css("<button.primary/>"), "button.primary");
        assert_eq!(selector_css(".item"), ".item");
        assert_eq!(SelectorKind::of("[@data-open]"), SelectorKind::Attribute);
    }

    #[test]
    fn places() {
        let set_target = Node::Variable {
            name: "count".into(),
            scope: VariableScope::Local,
        };
        assert_eq!(Place::of(&set_target), Place::Local("count"));
        assert_eq!(Place::of(&Node::identifier("result")), Place::Context("result"));
        assert_eq!(Place::of(&Node::identifier("total")), Place::Local("total"));
        assert!(matches!(Place::of(&Node::me()), Place::Content(_)));
        assert!(matches!(Place::of(&Node::selector("#out")), Place::Content(_)));

        let attribute = Node::Possessive {
            object: Box::new(Node::me()),
            property: "@title".into(),
        };
        assert!(matches!(Place::of(&attribute), Place::Attribute { name: "title", .. }));
        let style = Node::Possessive {
            object: Box::new(Node::me()),
            property: "*opacity".into(),
        };
        assert!(matches!(Place::of(&style), Place::Style { name: "opacity", .. }));
    }
}

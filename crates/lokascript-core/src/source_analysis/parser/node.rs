// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Node shape produced by the grammar parser.
//!
//! This stays close to the surface syntax (`unless` keeps its own flag,
//! repeat keeps its sub-form, unary operators are not yet desugared) and is
//! normalized into [`crate::ast::Node`] by the interchange layer.

use ecow::EcoString;

use crate::ast::{EventModifiers, VariableScope};
use crate::source_analysis::Span;

/// The sub-form of a `repeat` loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RepeatForm {
    /// `repeat 3 times`
    Times(Box<GrammarNode>),
    /// `repeat for item [index i] in items`, or the bare `for` loop.
    For {
        item: EcoString,
        index: Option<EcoString>,
        collection: Box<GrammarNode>,
    },
    /// `repeat while cond`
    While(Box<GrammarNode>),
    /// `repeat until cond`
    Until(Box<GrammarNode>),
    /// `repeat forever` or a bare `repeat`.
    Forever,
}

/// An `else if` arm before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfBlock {
    pub condition: GrammarNode,
    pub body: Vec<GrammarNode>,
}

/// A grammar-parser node.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarNode {
    /// A statement list: a program, handler body or branch.
    Block(Vec<GrammarNode>),
    EventHandler {
        event: EcoString,
        modifiers: EventModifiers<GrammarNode>,
        body: Vec<GrammarNode>,
    },
    Command {
        name: EcoString,
        args: Vec<GrammarNode>,
        target: Option<Box<GrammarNode>>,
        modifiers: Vec<(EcoString, GrammarNode)>,
    },
    /// `if` or, with `negated`, `unless`.
    Conditional {
        negated: bool,
        condition: Box<GrammarNode>,
        then_block: Vec<GrammarNode>,
        else_ifs: Vec<ElseIfBlock>,
        else_block: Option<Vec<GrammarNode>>,
    },
    Repeat {
        form: RepeatForm,
        body: Vec<GrammarNode>,
    },
    Number(f64),
    Str(EcoString),
    Boolean(bool),
    Null,
    Selector(EcoString),
    /// `me`, `you`, `it`, `result`, `event`, ... as written.
    ContextRef(EcoString),
    Identifier(EcoString),
    Variable {
        name: EcoString,
        scope: VariableScope,
    },
    /// `x's y`, `my y`, `the y of x`, or a bare `@attr` when `object` is
    /// `None`.
    PropertyAccess {
        object: Option<Box<GrammarNode>>,
        property: EcoString,
    },
    MemberAccess {
        object: Box<GrammarNode>,
        property: Box<GrammarNode>,
        computed: bool,
    },
    Binary {
        operator: EcoString,
        left: Box<GrammarNode>,
        right: Box<GrammarNode>,
    },
    Unary {
        operator: EcoString,
        operand: Box<GrammarNode>,
    },
    Call {
        callee: Box<GrammarNode>,
        args: Vec<GrammarNode>,
    },
    /// `[a, b, c]`
    Array(Vec<GrammarNode>),
    /// A construct the parser recognizes but nothing downstream lowers
    /// (`behavior`, `def`, `js`, object literals, ...).
    Unsupported { kind: EcoString, span: Span },
}

impl GrammarNode {
    pub(crate) fn binary(operator: impl Into<EcoString>, left: Self, right: Self) -> Self {
        Self::Binary {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn command(name: impl Into<EcoString>) -> Self {
        Self::Command {
            name: name.into(),
            args: Vec::new(),
            target: None,
            modifiers: Vec::new(),
        }
    }

    /// The first unsupported construct in this subtree, in source order.
    #[must_use]
    pub fn find_unsupported(&self) -> Option<(&str, Span)> {
        let mut found = None;
        self.visit(&mut |node| {
            if found.is_none()
                && let Self::Unsupported { kind, span } = node
            {
                found = Some((kind.as_str(), *span));
            }
        });
        found
    }

    /// Pre-order walk over this node and its descendants.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || self.visit_node(f));
    }

    fn visit_node<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        match self {
            Self::Block(body) => body.iter().for_each(|n| n.visit(f)),
            Self::EventHandler {
                modifiers, body, ..
            } => {
                if let Some(from) = &modifiers.from {
                    from.visit(f);
                }
                if let Some(filter) = &modifiers.filter {
                    filter.visit(f);
                }
                body.iter().for_each(|n| n.visit(f));
            }
            Self::Command {
                args,
                target,
                modifiers,
                ..
            } => {
                args.iter().for_each(|n| n.visit(f));
                if let Some(target) = target {
                    target.visit(f);
                }
                modifiers.iter().for_each(|(_, n)| n.visit(f));
            }
            Self::Conditional {
                condition,
                then_block,
                else_ifs,
                else_block,
                ..
            } => {
                condition.visit(f);
                then_block.iter().for_each(|n| n.visit(f));
                for arm in else_ifs {
                    arm.condition.visit(f);
                    arm.body.iter().for_each(|n| n.visit(f));
                }
                if let Some(block) = else_block {
                    block.iter().for_each(|n| n.visit(f));
                }
            }
            Self::Repeat { form, body } => {
                match form {
                    RepeatForm::Times(n) | RepeatForm::While(n) | RepeatForm::Until(n) => {
                        n.visit(f);
                    }
                    RepeatForm::For { collection, .. } => collection.visit(f),
                    RepeatForm::Forever => {}
                }
                body.iter().for_each(|n| n.visit(f));
            }
            Self::PropertyAccess { object, .. } => {
                if let Some(object) = object {
                    object.visit(f);
                }
            }
            Self::MemberAccess {
                object, property, ..
            } => {
                object.visit(f);
                property.visit(f);
            }
            Self::Binary { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Self::Unary { operand, .. } => operand.visit(f),
            Self::Call { callee, args } => {
                callee.visit(f);
                args.iter().for_each(|n| n.visit(f));
            }
            Self::Array(items) => items.iter().for_each(|n| n.visit(f)),
            Self::Number(_)
            | Self::Str(_)
            | Self::Boolean(_)
            | Self::Null
            | Self::Selector(_)
            | Self::ContextRef(_)
            | Self::Identifier(_)
            | Self::Variable { .. }
            | Self::Unsupported { .. } => {}
        }
    }
}

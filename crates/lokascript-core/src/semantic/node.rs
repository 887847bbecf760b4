// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Language-neutral output of the pattern matcher.

use std::collections::BTreeMap;
use std::fmt;

use ecow::EcoString;
use serde::Serialize;

use crate::ast::{EventModifiers, LiteralValue};

/// Node kinds produced by the matcher. The interchange layer treats any other
/// kind as unknown.
pub mod kind {
    pub const COMMAND: &str = "command";
    pub const EVENT_HANDLER: &str = "event-handler";
    pub const CONDITIONAL: &str = "conditional";
    pub const LOOP: &str = "loop";
    pub const SEQUENCE: &str = "sequence";
}

/// A captured role value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum SemanticValue {
    /// `.class`, `#id`, `<query/>` or `[@attr]`
    Selector(EcoString),
    Literal(LiteralValue),
    /// A context word, canonicalized to its English name (`me`, `it`, ...).
    Reference(EcoString),
    /// `x's y` or `my y`
    PropertyPath {
        object: Box<SemanticValue>,
        property: EcoString,
    },
    /// Anything else, as source text for the expression parser.
    Expression(EcoString),
}

impl fmt::Display for SemanticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) | Self::Reference(s) | Self::Expression(s) => f.write_str(s),
            Self::Literal(value) => write!(f, "{value}"),
            Self::PropertyPath { object, property } => write!(f, "{object}'s {property}"),
        }
    }
}

/// How a node was matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticMetadata {
    pub confidence: f64,
    pub pattern_id: EcoString,
    pub language: EcoString,
}

/// An `else if` or `else` arm of a conditional. The final `else` arm has no
/// condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticBranch {
    pub condition: Option<SemanticValue>,
    pub body: Vec<SemanticNode>,
}

/// A recognized statement, handler or block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticNode {
    pub kind: EcoString,
    /// The English command name (`toggle`, `put`, `on`, `if`, ...).
    pub action: EcoString,
    pub roles: BTreeMap<EcoString, SemanticValue>,
    pub metadata: SemanticMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<SemanticNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_modifiers: Option<EventModifiers<SemanticValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<SemanticBranch>>,
}

impl SemanticNode {
    /// A node with no roles or children.
    pub fn new(kind: &str, action: impl Into<EcoString>, metadata: SemanticMetadata) -> Self {
        Self {
            kind: kind.into(),
            action: action.into(),
            roles: BTreeMap::new(),
            metadata,
            body: None,
            event_modifiers: None,
            branches: None,
        }
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<&SemanticValue> {
        self.roles.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_display_as_source() {
        let path = SemanticValue::PropertyPath {
            object: Box::new(SemanticValue::Reference("me".into())),
            property: "value".into(),
        };
        assert_eq!(path.to_string(), "me's value");
        assert_eq!(
            SemanticValue::Literal(LiteralValue::String("hi".into())).to_string(),
            "\"hi\""
        );
    }

    #[test]
    fn serializes_with_type_tags() {
        let value = SemanticValue::Selector("#out".into());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r##"{"type":"selector","value":"#out"}"##);
    }
}

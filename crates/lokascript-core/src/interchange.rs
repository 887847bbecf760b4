// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Conversion from front-end node shapes into the shared AST.
//!
//! Both conversions are total. Input the shared AST cannot express
//! ([`GrammarNode::Unsupported`], unknown semantic kinds) becomes
//! `Literal null`; the code generator reports unsupported commands by name,
//! so nothing is lost silently for the commands users write.
//!
//! Semantic roles map onto command parts as follows:
//!
//! | Role | Command part |
//! |------|--------------|
//! | `patient` | first argument |
//! | `event` | first argument of `send` / `trigger` |
//! | `duration` | first argument of `wait`, `for` modifier otherwise |
//! | `destination` | target |
//! | `source` | `from` modifier |
//! | `quantity` | `by` modifier |
//! | `method` | `as` modifier |
//! | `position` | `position` modifier |
//!
//! Any other role becomes a modifier of the same name.

use std::collections::BTreeMap;

use ecow::EcoString;

use crate::ast::{ElseIf, LiteralValue, Node, VariableScope};
use crate::semantic::{SemanticNode, SemanticValue, kind};
use crate::source_analysis::{GrammarNode, RepeatForm, parse_expression_source};

/// Converts front-end nodes into the shared AST.
///
/// [`crate::Compiler`] owns one converter; [`DefaultConverter`] is used unless
/// another is supplied.
pub trait NodeConverter: Send + Sync {
    fn from_grammar(&self, node: &GrammarNode) -> Node;
    fn from_semantic(&self, node: &SemanticNode) -> Node;
}

/// The standard conversion rules of this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl NodeConverter for DefaultConverter {
    fn from_grammar(&self, node: &GrammarNode) -> Node {
        from_grammar_node(node)
    }

    fn from_semantic(&self, node: &SemanticNode) -> Node {
        from_semantic_node(node)
    }
}

/// Converts a grammar-parser node.
#[must_use]
pub fn from_grammar_node(node: &GrammarNode) -> Node {
    stacker::maybe_grow(32 * 1024, 256 * 1024, || grammar(node))
}

fn grammar_block(body: &[GrammarNode]) -> Node {
    Node::sequence(body.iter().map(from_grammar_node).collect())
}

fn grammar(node: &GrammarNode) -> Node {
    match node {
        GrammarNode::Block(body) => grammar_block(body),
        GrammarNode::EventHandler {
            event,
            modifiers,
            body,
        } => Node::EventHandler {
            event: event.clone(),
            modifiers: modifiers.map(from_grammar_node),
            body: Box::new(grammar_block(body)),
        },
        GrammarNode::Command {
            name,
            args,
            target,
            modifiers,
        } => Node::Command {
            name: name.clone(),
            args: args.iter().map(from_grammar_node).collect(),
            target: target.as_deref().map(|t| Box::new(from_grammar_node(t))),
            modifiers: modifiers
                .iter()
                .map(|(key, value)| (key.clone(), from_grammar_node(value)))
                .collect(),
        },
        GrammarNode::Conditional {
            negated,
            condition,
            then_block,
            else_ifs,
            else_block,
        } => {
            let condition = from_grammar_node(condition);
            Node::If {
                condition: Box::new(if *negated {
                    Node::unary("not", condition)
                } else {
                    condition
                }),
                then_branch: Box::new(grammar_block(then_block)),
                else_if_branches: else_ifs
                    .iter()
                    .map(|arm| ElseIf {
                        condition: from_grammar_node(&arm.condition),
                        body: grammar_block(&arm.body),
                    })
                    .collect(),
                else_branch: else_block.as_deref().map(|b| Box::new(grammar_block(b))),
            }
        }
        GrammarNode::Repeat { form, body } => {
            let body = Box::new(grammar_block(body));
            match form {
                RepeatForm::Times(count) => Node::Repeat {
                    count: Some(Box::new(from_grammar_node(count))),
                    body,
                },
                RepeatForm::For {
                    item,
                    index,
                    collection,
                } => Node::ForEach {
                    item_name: item.clone(),
                    index_name: index.clone(),
                    collection: Box::new(from_grammar_node(collection)),
                    body,
                },
                RepeatForm::While(condition) => Node::While {
                    condition: Box::new(from_grammar_node(condition)),
                    body,
                },
                RepeatForm::Until(condition) => Node::While {
                    condition: Box::new(Node::unary("not", from_grammar_node(condition))),
                    body,
                },
                RepeatForm::Forever => Node::Repeat { count: None, body },
            }
        }
        GrammarNode::Number(n) => Node::number(*n),
        GrammarNode::Str(s) => Node::string(s.clone()),
        GrammarNode::Boolean(b) => Node::Literal {
            value: LiteralValue::Boolean(*b),
        },
        GrammarNode::Null | GrammarNode::Unsupported { .. } => Node::null(),
        GrammarNode::Selector(s) => Node::selector(s.clone()),
        GrammarNode::ContextRef(word) => context_reference(word),
        GrammarNode::Identifier(name) => Node::identifier(name.clone()),
        GrammarNode::Variable { name, scope } => Node::Variable {
            name: name.clone(),
            scope: *scope,
        },
        GrammarNode::PropertyAccess { object, property } => Node::Possessive {
            object: Box::new(object.as_deref().map_or_else(Node::me, from_grammar_node)),
            property: property.clone(),
        },
        GrammarNode::MemberAccess {
            object,
            property,
            computed,
        } => Node::Member {
            object: Box::new(from_grammar_node(object)),
            property: Box::new(from_grammar_node(property)),
            computed: *computed,
        },
        GrammarNode::Binary {
            operator,
            left,
            right,
        } => Node::binary(operator.clone(), from_grammar_node(left), from_grammar_node(right)),
        GrammarNode::Unary { operator, operand } => {
            Node::unary(operator.clone(), from_grammar_node(operand))
        }
        GrammarNode::Call { callee, args } => Node::Call {
            callee: Box::new(from_grammar_node(callee)),
            args: args.iter().map(from_grammar_node).collect(),
        },
        GrammarNode::Array(items) => Node::Array {
            items: items.iter().map(from_grammar_node).collect(),
        },
    }
}

/// A context word as written, with its canonical binding when it differs.
fn context_reference(word: &str) -> Node {
    let canonical = match word.to_lowercase().as_str() {
        "i" | "my" | "myself" => "me",
        "its" => "it",
        "your" => "you",
        _ => word,
    };
    Node::Identifier {
        value: word.into(),
        name: (canonical != word).then(|| canonical.into()),
    }
}

/// Converts a semantic-matcher node.
#[must_use]
pub fn from_semantic_node(node: &SemanticNode) -> Node {
    stacker::maybe_grow(32 * 1024, 256 * 1024, || semantic(node))
}

fn semantic_block(body: Option<&Vec<SemanticNode>>) -> Node {
    Node::sequence(body.map_or_else(Vec::new, |b| b.iter().map(from_semantic_node).collect()))
}

fn semantic(node: &SemanticNode) -> Node {
    match node.kind.as_str() {
        kind::EVENT_HANDLER => Node::EventHandler {
            event: node.role("event").map_or_else(|| "click".into(), text_of),
            modifiers: node
                .event_modifiers
                .as_ref()
                .map(|m| m.map(from_semantic_value))
                .unwrap_or_default(),
            body: Box::new(semantic_block(node.body.as_ref())),
        },
        kind::COMMAND => semantic_command(node),
        kind::CONDITIONAL => {
            let condition = node.role("condition").map_or_else(Node::null, from_semantic_value);
            let condition = if node.action == "unless" {
                Node::unary("not", condition)
            } else {
                condition
            };
            let mut else_if_branches = Vec::new();
            let mut else_branch = None;
            for branch in node.branches.iter().flatten() {
                let body = Node::sequence(branch.body.iter().map(from_semantic_node).collect());
                match &branch.condition {
                    Some(condition) => else_if_branches.push(ElseIf {
                        condition: from_semantic_value(condition),
                        body,
                    }),
                    None => else_branch = Some(Box::new(body)),
                }
            }
            Node::If {
                condition: Box::new(condition),
                then_branch: Box::new(semantic_block(node.body.as_ref())),
                else_if_branches,
                else_branch,
            }
        }
        kind::LOOP => {
            let body = Box::new(semantic_block(node.body.as_ref()));
            match node.action.as_str() {
                "while" => Node::While {
                    condition: Box::new(
                        node.role("condition").map_or_else(Node::null, from_semantic_value),
                    ),
                    body,
                },
                "for" => Node::ForEach {
                    item_name: node.role("patient").map_or_else(
                        || "it".into(),
                        |v| VariableScope::strip_sigil(&text_of(v)).into(),
                    ),
                    index_name: None,
                    collection: Box::new(
                        node.role("source").map_or_else(Node::null, from_semantic_value),
                    ),
                    body,
                },
                _ => Node::Repeat {
                    count: node
                        .role("quantity")
                        .map(|q| Box::new(from_semantic_value(q))),
                    body,
                },
            }
        }
        kind::SEQUENCE => semantic_block(node.body.as_ref()),
        _ => Node::null(),
    }
}

fn semantic_command(node: &SemanticNode) -> Node {
    let name = node.action.clone();
    let mut args = Vec::new();
    let mut target = None;
    let mut modifiers = BTreeMap::new();

    if let Some(patient) = node.role("patient") {
        args.push(from_semantic_value(patient));
    }
    for (role, value) in &node.roles {
        match role.as_str() {
            "patient" => {}
            "event" if matches!(name.as_str(), "send" | "trigger") => {
                args.insert(0, Node::string(text_of(value)));
            }
            "duration" if name == "wait" => args.push(from_semantic_value(value)),
            "duration" => {
                modifiers.insert("for".into(), from_semantic_value(value));
            }
            "destination" => {
                let destination = from_semantic_value(value);
                target = Some(Box::new(if name == "set" {
                    assignable(destination)
                } else {
                    destination
                }));
            }
            "source" => {
                modifiers.insert("from".into(), from_semantic_value(value));
            }
            "quantity" => {
                modifiers.insert("by".into(), from_semantic_value(value));
            }
            "method" => {
                modifiers.insert("as".into(), Node::string(text_of(value).to_lowercase()));
            }
            "position" => {
                modifiers.insert("position".into(), Node::string(text_of(value)));
            }
            other => {
                modifiers.insert(other.into(), from_semantic_value(value));
            }
        }
    }

    Node::Command {
        name,
        args,
        target,
        modifiers,
    }
}

/// `set x to ...` assigns a local variable, as the grammar parser reads it.
fn assignable(node: Node) -> Node {
    match node {
        Node::Identifier {
            ref value,
            name: None,
        } if !node.is_context_reference() => Node::Variable {
            name: value.clone(),
            scope: VariableScope::Local,
        },
        other => other,
    }
}

/// The plain text of a role value, for roles that name something.
fn text_of(value: &SemanticValue) -> EcoString {
    match value {
        SemanticValue::Literal(LiteralValue::String(s)) => s.clone(),
        SemanticValue::Selector(s) | SemanticValue::Reference(s) | SemanticValue::Expression(s) => {
            s.clone()
        }
        other => other.to_string().into(),
    }
}

/// Converts a role value. Expressions go through the grammar expression
/// parser and fall back to a string literal.
#[must_use]
pub fn from_semantic_value(value: &SemanticValue) -> Node {
    match value {
        SemanticValue::Selector(s) => Node::selector(s.clone()),
        SemanticValue::Literal(literal) => Node::Literal {
            value: literal.clone(),
        },
        SemanticValue::Reference(word) => Node::identifier(word.clone()),
        SemanticValue::PropertyPath { object, property } => Node::Possessive {
            object: Box::new(from_semantic_value(object)),
            property: property.clone(),
        },
        SemanticValue::Expression(text) => match parse_expression_source(text) {
            Ok(node) => from_grammar_node(&node),
            Err(_) => Node::string(text.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::SemanticParser;
    use crate::source_analysis::parse_source;

    fn grammar_ast(source: &str) -> Node {
        from_grammar_node(&parse_source(source).unwrap_or_else(|e| panic!("{e}")))
    }

    fn semantic_ast(source: &str, language: &str) -> Node {
        let parser = SemanticParser::new().unwrap_or_else(|e| panic!("{e}"));
        let result = parser.analyze(source, language);
        let node = result
            .node
            .unwrap_or_else(|| panic!("{source:?} failed: {:?}", result.error));
        from_semantic_node(&node)
    }

    #[test]
    fn unsupported_grammar_becomes_null() {
        let node = GrammarNode::Unsupported {
            kind: "behavior".into(),
            span: crate::source_analysis::Span::new(0, 8),
        };
        assert_eq!(from_grammar_node(&node), Node::null());
    }

    #[test]
    fn unknown_semantic_kind_becomes_null() {
        let node = SemanticNode::new(
            "mystery",
            "x",
            crate::semantic::SemanticMetadata {
                confidence: 1.0,
                pattern_id: "p".into(),
                language: "en".into(),
            },
        );
        assert_eq!(from_semantic_node(&node), Node::null());
    }

    #[test]
    fn single_statement_programs_collapse() {
        assert_eq!(grammar_ast("add .a").kind(), "command");
        assert_eq!(grammar_ast("add .a then add .b").kind(), "sequence");
    }

    #[test]
    fn unary_operators_desugar() {
        let Node::If { condition, .. } = grammar_ast("if not x then log 1 end") else {
            panic!("expected if");
        };
        assert_eq!(condition.unary_operand().map(|(op, _)| op), Some("not"));
    }

    #[test]
    fn unless_negates_condition() {
        let Node::If { condition, .. } = grammar_ast("unless x then log 1 end") else {
            panic!("expected if");
        };
        assert_eq!(*condition, Node::unary("not", Node::identifier("x")));
    }

    #[test]
    fn possessive_without_object_defaults_to_me() {
        let node = grammar_ast("log @title");
        let Node::Command { args, .. } = node else {
            panic!("expected command");
        };
        assert_eq!(
            args[0],
            Node::Possessive {
                object: Box::new(Node::me()),
                property: "@title".into(),
            }
        );
    }

    #[test]
    fn context_words_keep_source_text() {
        assert_eq!(
            context_reference("I"),
            Node::Identifier {
                value: "I".into(),
                name: Some("me".into()),
            }
        );
        assert_eq!(context_reference("it"), Node::identifier("it"));
    }

    #[test]
    fn repeat_forms_normalize() {
        assert_eq!(grammar_ast("repeat 3 times log 1 end").kind(), "repeat");
        assert_eq!(grammar_ast("repeat for x in items log x end").kind(), "forEach");
        assert_eq!(grammar_ast("repeat while x log 1 end").kind(), "while");
        assert_eq!(grammar_ast("repeat until x log 1 end").kind(), "while");
        let Node::Repeat { count, .. } = grammar_ast("repeat forever log 1 end") else {
            panic!("expected repeat");
        };
        assert!(count.is_none());
    }

    #[test]
    fn front_ends_agree_on_put() {
        let grammar = grammar_ast("put \"Hello\" into #output");
        let semantic = semantic_ast("put \"Hello\" into #output", "en");
        assert_eq!(grammar, semantic);
    }

    #[test]
    fn front_ends_agree_on_toggle_handler() {
        let grammar = grammar_ast("on click toggle .active");
        let semantic = semantic_ast("クリック で .active を 切り替え", "ja");
        assert_eq!(grammar, semantic);
    }

    #[test]
    fn front_ends_agree_on_set() {
        let grammar = grammar_ast("set count to 5");
        let semantic = semantic_ast("set count to 5", "en");
        assert_eq!(grammar, semantic);
    }

    #[test]
    fn semantic_roles_map_to_command_parts() {
        let Node::Command {
            name,
            args,
            target,
            modifiers,
        } = semantic_ast("increment #count by 2", "en")
        else {
            panic!("expected command");
        };
        assert_eq!(name, "increment");
        assert!(args.is_empty());
        assert_eq!(target.as_deref(), Some(&Node::selector("#count")));
        assert_eq!(modifiers.get("by"), Some(&Node::number(2.0)));
    }

    #[test]
    fn send_event_becomes_first_argument() {
        let Node::Command { args, target, .. } = semantic_ast("send refresh to #list", "en") else {
            panic!("expected command");
        };
        assert_eq!(args, vec![Node::string("refresh")]);
        assert_eq!(target.as_deref(), Some(&Node::selector("#list")));
    }

    #[test]
    fn wait_duration_becomes_argument() {
        let Node::Command { args, .. } = semantic_ast("wait 2s", "en") else {
            panic!("expected command");
        };
        assert_eq!(args, vec![Node::number(2000.0)]);
    }

    #[test]
    fn expressions_parse_or_fall_back_to_strings() {
        assert_eq!(
            from_semantic_value(&SemanticValue::Expression("x + 1".into())),
            Node::binary("+", Node::identifier("x"), Node::number(1.0))
        );
        assert_eq!(
            from_semantic_value(&SemanticValue::Expression("a b".into())),
            Node::string("a b")
        );
    }

    #[test]
    fn array_literals_convert_item_by_item() {
        assert_eq!(
            from_semantic_value(&SemanticValue::Expression("[x, 'a']".into())),
            Node::Array {
                items: vec![Node::identifier("x"), Node::string("a")],
            }
        );
    }

    #[test]
    fn semantic_conditional_branches() {
        let Node::If {
            else_if_branches,
            else_branch,
            ..
        } = semantic_ast("if x\nshow me\nelse if y\nhide me\nelse\nlog 1\nend", "en")
        else {
            panic!("expected if");
        };
        assert_eq!(else_if_branches.len(), 1);
        assert!(else_branch.is_some());
    }

    #[test]
    fn semantic_for_loop() {
        let Node::ForEach {
            item_name,
            collection,
            ..
        } = semantic_ast("for item in items\nlog item\nend", "en")
        else {
            panic!("expected forEach");
        };
        assert_eq!(item_name, "item");
        assert_eq!(*collection, Node::identifier("items"));
    }
}

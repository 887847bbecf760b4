// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Programs, event handlers, blocks and loops.

use tracing::debug;

use super::document::{Document, INDENT, block, break_, join, line, nest};
use super::expressions::{js_member, js_string};
use super::{CodeGenError, Flow, JsGenerator, Result};
use crate::ast::{EventModifiers, Node};
use crate::docvec;

const STACK_RED_ZONE: usize = 32 * 1024;
const STACK_GROWTH: usize = 256 * 1024;

impl JsGenerator<'_> {
    /// The exports of a module: a default function for top-level statements
    /// and a `handlers` array for top-level event handlers.
    pub(super) fn module(&mut self, program: &Node) -> Result<Vec<Document<'static>>> {
        let items: Vec<&Node> = match program {
            Node::Sequence { body } => body.iter().collect(),
            other => vec![other],
        };
        let (handlers, statements): (Vec<&Node>, Vec<&Node>) = items
            .into_iter()
            .partition(|item| matches!(item, Node::EventHandler { .. }));

        let mut exports = Vec::new();
        if !statements.is_empty() || handlers.is_empty() {
            let body = self.function_body(None, statements)?;
            exports.push(docvec![
                "export default ",
                self.function_keyword(),
                "(me, event)",
                break_(" ", ""),
                body,
            ]);
        }
        if !handlers.is_empty() {
            let mut descriptors = Vec::new();
            for handler in handlers {
                if let Node::EventHandler {
                    event,
                    modifiers,
                    body,
                } = handler
                {
                    descriptors.push(self.handler(event, modifiers, body)?);
                }
            }
            let entries = descriptors.into_iter().map(|d| docvec![line(), d, ","]);
            exports.push(docvec![
                "export const handlers = [",
                nest(INDENT, Document::Vec(entries.collect())),
                line(),
                "];",
            ]);
        }
        Ok(exports)
    }

    fn function_keyword(&self) -> &'static str {
        if self.analysis.control_flow.has_async {
            "async function "
        } else {
            "function "
        }
    }

    /// `{ const ctx = createContext(...); <prelude> <statements> return ctx.result; }`
    fn function_body<'n>(
        &mut self,
        prelude: Option<Vec<Document<'static>>>,
        statements: impl IntoIterator<Item = &'n Node>,
    ) -> Result<Document<'static>> {
        let create = self.require("createContext")?;
        let mut lines = vec![docvec!["const ctx = ", create, "(event, me);"]];
        lines.extend(prelude.unwrap_or_default());
        let (body, flow) = self.statements(statements)?;
        lines.extend(body);
        if flow == Flow::Normal {
            lines.push(docvec!["return ctx.result;"]);
        }
        Ok(block(lines))
    }

    /// One `{ event, options, listen?, handler }` descriptor.
    fn handler(
        &mut self,
        event: &str,
        modifiers: &EventModifiers<Node>,
        body: &Node,
    ) -> Result<Document<'static>> {
        let mut fields = vec![docvec!["event: ", js_string(event), ","]];
        fields.push(if modifiers.once {
            docvec!["options: { once: true },"]
        } else {
            docvec!["options: {},"]
        });

        if let Some(source) = &modifiers.from {
            let create = self.require("createContext")?;
            let delegate = self.require("delegate")?;
            let source = self.expression(source)?;
            let listen = block(vec![
                docvec!["const ctx = ", create, "(null, me);"],
                docvec![
                    "return ",
                    delegate,
                    "(",
                    source,
                    ", ",
                    js_string(event),
                    ", listener);"
                ],
            ]);
            fields.push(docvec!["listen(me, listener)", break_(" ", ""), listen, ","]);
        }

        let mut prelude = Vec::new();
        if modifiers.prevent {
            prelude.push(docvec!["event.preventDefault();"]);
        }
        if modifiers.stop {
            prelude.push(docvec!["event.stopPropagation();"]);
        }
        if let Some(filter) = &modifiers.filter {
            self.in_filter = true;
            let condition = self.expression(filter);
            self.in_filter = false;
            prelude.push(docvec!["if (!(", condition?, ")) return;"]);
        }

        let function = docvec![
            self.function_keyword(),
            "(me, event)",
            break_(" ", ""),
            self.function_body(Some(prelude), std::slice::from_ref(body))?,
        ];
        let handler = match (modifiers.debounce_ms, modifiers.throttle_ms) {
            (Some(ms), _) => {
                let debounce = self.require("debounce")?;
                docvec![debounce, "(", function, ", ", ms.to_string(), ")"]
            }
            (None, Some(ms)) => {
                let throttle = self.require("throttle")?;
                docvec![throttle, "(", function, ", ", ms.to_string(), ")"]
            }
            (None, None) => function,
        };
        fields.push(docvec!["handler: ", handler, ","]);

        let fields = fields.into_iter().map(|field| docvec![line(), field]);
        Ok(docvec!["{", nest(INDENT, Document::Vec(fields.collect())), line(), "}"])
    }

    /// Lowers statements in order, stopping after one that always leaves the
    /// block.
    pub(super) fn statements<'n>(
        &mut self,
        statements: impl IntoIterator<Item = &'n Node>,
    ) -> Result<(Vec<Document<'static>>, Flow)> {
        let mut lowered = Vec::new();
        let mut statements = statements.into_iter().flat_map(|s| match s {
            Node::Sequence { body } => body.iter().collect::<Vec<_>>(),
            other => vec![other],
        });
        while let Some(statement) = statements.next() {
            let (document, flow) = self.statement(statement)?;
            lowered.push(document);
            if let Flow::Signal(signal) = flow {
                let dropped = statements.by_ref().count();
                if dropped > 0 {
                    debug!(?signal, dropped, "dropping unreachable statements");
                }
                return Ok((lowered, flow));
            }
        }
        Ok((lowered, Flow::Normal))
    }

    /// A nested block body.
    fn body(&mut self, node: &Node) -> Result<Document<'static>> {
        let (statements, _) = self.statements(std::slice::from_ref(node))?;
        Ok(block(statements))
    }

    fn statement(&mut self, node: &Node) -> Result<(Document<'static>, Flow)> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.statement_inner(node))
    }

    fn statement_inner(&mut self, node: &Node) -> Result<(Document<'static>, Flow)> {
        let document = match node {
            Node::Command {
                name,
                args,
                target,
                modifiers,
            } => return self.command(name, args, target.as_deref(), modifiers),
            Node::Sequence { body } => {
                let (statements, flow) = self.statements(body)?;
                return Ok((join(statements, &line()), flow));
            }
            Node::If {
                condition,
                then_branch,
                else_if_branches,
                else_branch,
            } => {
                let condition = self.expression(condition)?;
                let mut document =
                    docvec!["if (", condition, ")", break_(" ", ""), self.body(then_branch)?];
                for arm in else_if_branches {
                    let condition = self.expression(&arm.condition)?;
                    document = docvec![
                        document,
                        break_(" ", ""),
                        "else if (",
                        condition,
                        ")",
                        break_(" ", ""),
                        self.body(&arm.body)?,
                    ];
                }
                if let Some(otherwise) = else_branch {
                    document = docvec![
                        document,
                        break_(" ", ""),
                        "else",
                        break_(" ", ""),
                        self.body(otherwise)?,
                    ];
                }
                document
            }
            Node::Repeat { count, body } => {
                let header = match count {
                    Some(count) => {
                        let count = self.expression(count)?;
                        let n = self.fresh();
                        let (index, limit) = (format!("$i{n}"), format!("$n{n}"));
                        format!(
                            "for (let {index} = 0, {limit} = {count}; {index} < {limit}; {index}++)"
                        )
                    }
                    None => "while (true)".into(),
                };
                let body = self.loop_body(body, Vec::new())?;
                docvec![header, break_(" ", ""), body]
            }
            Node::ForEach {
                item_name,
                index_name,
                collection,
                body,
            } => {
                let to_array = self.require("toArray")?;
                let collection = self.expression(collection)?;
                let n = self.fresh();
                let (index, value) = (format!("$i{n}"), format!("$v{n}"));
                let mut bindings = vec![docvec![
                    format!("ctx.locals{}", js_member(item_name)),
                    " = ",
                    value.clone(),
                    ";"
                ]];
                if let Some(index_name) = index_name {
                    bindings.push(docvec![
                        format!("ctx.locals{}", js_member(index_name)),
                        " = ",
                        index.clone(),
                        ";"
                    ]);
                }
                let body = self.loop_body(body, bindings)?;
                docvec![
                    format!("for (const [{index}, {value}] of {to_array}({collection}).entries())"),
                    break_(" ", ""),
                    body,
                ]
            }
            Node::While { condition, body } => {
                let condition = self.expression(condition)?;
                let body = self.loop_body(body, Vec::new())?;
                docvec!["while (", condition, ")", break_(" ", ""), body]
            }
            Node::Call { .. } => docvec![self.expression(node)?, ";"],
            Node::EventHandler { .. }
            | Node::Literal { .. }
            | Node::Identifier { .. }
            | Node::Selector { .. }
            | Node::Variable { .. }
            | Node::Possessive { .. }
            | Node::Member { .. }
            | Node::Binary { .. }
            | Node::Array { .. } => {
                return Err(CodeGenError::UnsupportedNode {
                    kind: node.kind().into(),
                });
            }
        };
        Ok((document, Flow::Normal))
    }

    fn loop_body(
        &mut self,
        body: &Node,
        mut prefix: Vec<Document<'static>>,
    ) -> Result<Document<'static>> {
        self.loop_depth += 1;
        let lowered = self.statements(std::slice::from_ref(body));
        self.loop_depth -= 1;
        let (statements, _) = lowered?;
        prefix.extend(statements);
        Ok(block(prefix))
    }
}

// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for the canonical English syntax.
//!
//! The parser consumes the lexer's token stream through a [`TokenCursor`]
//! and produces a [`GrammarNode`]. Unlike an IDE parser it does not recover:
//! the first syntax error aborts the parse and is returned as a
//! [`ParseError`] carrying the failing token's line and column.
//!
//! # Binary Operator Precedence (Pratt Parsing)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 10 | `or` `\|\|` | Left |
//! | 20 | `and` `&&` | Left |
//! | 30 | `is` `is not` `==` `!=` `===` `!==` `matches` `contains` `in` | Left |
//! | 40 | `<` `>` `<=` `>=` | Left |
//! | 50 | `+` `-` | Left |
//! | 60 | `*` `/` `%` `mod` | Left |
//! | 70 | `**` | Right |
//! | 80 | `as` (postfix conversion) | Left |
//!
//! # Usage
//!
//! ```
//! use lokascript_core::source_analysis::{parse_source, GrammarNode};
//!
//! let node = parse_source("on click toggle .active").unwrap();
//! assert!(matches!(node, GrammarNode::EventHandler { .. }));
//! ```

use ecow::EcoString;

use crate::source_analysis::{ParseError, Token, TokenCursor, TokenKind, tokenize};

mod commands;
mod expressions;
mod node;
mod statements;


pub(crate) use expressions::unquote;
pub use node::{ElseIfBlock, GrammarNode, RepeatForm};

pub(super) type ParseResult<T> = Result<T, ParseError>;

/// Binding power for binary operators.
///
/// Left-associative operators have `right == left + 1`; right-associative
/// ones have `left == right + 1`.
#[derive(Debug, Clone, Copy)]
pub(super) struct BindingPower {
    pub(super) left: u8,
    pub(super) right: u8,
}

impl BindingPower {
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }

    const fn right_assoc(precedence: u8) -> Self {
        Self {
            left: precedence + 1,
            right: precedence,
        }
    }
}

/// Binding power for a canonical binary operator name.
pub(super) fn binary_binding_power(op: &str) -> Option<BindingPower> {
    match op {
        "||" => Some(BindingPower::left_assoc(10)),
        "&&" => Some(BindingPower::left_assoc(20)),
        "==" | "!=" | "===" | "!==" | "matches" | "contains" | "in" => {
            Some(BindingPower::left_assoc(30))
        }
        "<" | ">" | "<=" | ">=" => Some(BindingPower::left_assoc(40)),
        "+" | "-" => Some(BindingPower::left_assoc(50)),
        "*" | "/" | "%" => Some(BindingPower::left_assoc(60)),
        "**" => Some(BindingPower::right_assoc(70)),
        "as" => Some(BindingPower::left_assoc(80)),
        _ => None,
    }
}

/// Maximum nesting depth of blocks and parenthesized expressions.
///
/// `stacker::maybe_grow` guards the recursive expression entry point as well,
/// so this mainly bounds pathological input such as `((((((...`.
const MAX_NESTING_DEPTH: usize = 64;

/// Maximum number of operators, calls and member accesses in one statement.
///
/// Operator chains are built by loops, but trees are dropped, cloned and
/// compared recursively, so this bounds their depth.
pub(super) const MAX_EXPRESSION_SIZE: usize = 1024;

/// Words that end the current statement and never start an argument.
pub(super) const STATEMENT_TERMINATORS: &[&str] =
    &["then", "end", "else", "otherwise", "catch", "finally"];

/// The parser state.
pub(super) struct Parser {
    pub(super) cursor: TokenCursor,
    nesting_depth: usize,
    expression_size: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            nesting_depth: 0,
            expression_size: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token management
    // ------------------------------------------------------------------

    pub(super) fn peek(&self) -> &Token {
        self.cursor.peek()
    }

    pub(super) fn advance(&mut self) -> Token {
        self.cursor.advance()
    }

    pub(super) fn check_word(&self, word: &str) -> bool {
        self.peek().is_word(word)
    }

    pub(super) fn check_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    pub(super) fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn match_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn match_op(&mut self, op: &str) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect_word(&mut self, word: &str) -> ParseResult<Token> {
        if self.check_word(word) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&format!("'{word}'")))
        }
    }

    pub(super) fn expect_op(&mut self, op: &str) -> ParseResult<Token> {
        if self.check_op(op) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&format!("'{op}'")))
        }
    }

    pub(super) fn expect_identifier(&mut self, what: &str) -> ParseResult<EcoString> {
        if self.check_kind(TokenKind::Identifier) {
            Ok(self.advance().text)
        } else {
            Err(self.error_expected(what))
        }
    }

    /// An "expected X, found Y" error at the next significant token.
    pub(super) fn error_expected(&self, what: &str) -> ParseError {
        ParseError::expected(what, self.peek())
    }

    /// Returns true if the next token can start an argument of the current
    /// statement: it is on the same line and is not a statement terminator.
    pub(super) fn at_argument_start(&self) -> bool {
        let token = self.peek();
        !(token.is_eof()
            || self.cursor.newline_before_next()
            || STATEMENT_TERMINATORS.iter().any(|w| token.is_word(w))
            || token.is_word("on"))
    }

    pub(super) fn enter_nesting(&mut self) -> ParseResult<()> {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::at(self.peek(), "nesting too deep"));
        }
        self.nesting_depth += 1;
        Ok(())
    }

    pub(super) fn leave_nesting(&mut self) {
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    /// Starts counting operator nodes for a new statement.
    pub(super) fn reset_expression_size(&mut self) {
        self.expression_size = 0;
    }

    /// Counts one operator, call or member access node.
    pub(super) fn grow_expression(&mut self) -> ParseResult<()> {
        self.expression_size += 1;
        if self.expression_size > MAX_EXPRESSION_SIZE {
            return Err(ParseError::at(self.peek(), "expression too large"));
        }
        Ok(())
    }

    /// Ensures nothing but end of input remains.
    fn expect_end_of_input(&self) -> ParseResult<()> {
        if self.peek().is_eof() {
            Ok(())
        } else {
            Err(self.error_expected("end of input"))
        }
    }
}

/// Parses a token stream into a grammar node.
///
/// A program with a single statement or handler yields that node; several
/// yield a [`GrammarNode::Block`].
pub fn parse(tokens: Vec<Token>) -> Result<GrammarNode, ParseError> {
    let mut parser = Parser::new(tokens);
    let node = parser.parse_program()?;
    parser.expect_end_of_input()?;
    Ok(node)
}

/// Tokenizes and parses `source`.
pub fn parse_source(source: &str) -> Result<GrammarNode, ParseError> {
    parse(tokenize(source))
}

/// Parses `source` as a single expression.
///
/// The semantic front end uses this for role values it captures as raw
/// expression text.
pub fn parse_expression_source(source: &str) -> Result<GrammarNode, ParseError> {
    let mut parser = Parser::new(tokenize(source));
    let node = parser.parse_expression()?;
    parser.expect_end_of_input()?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> GrammarNode {
        parse_source(source).unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"))
    }

    fn parse_err(source: &str) -> ParseError {
        match parse_source(source) {
            Ok(node) => panic!("expected error for {source:?}, got {node:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn binding_powers_follow_table() {
        let or = binary_binding_power("||").unwrap();
        let add = binary_binding_power("+").unwrap();
        let pow = binary_binding_power("**").unwrap();
        assert!(or.left < add.left);
        assert!(pow.left > pow.right);
        assert!(binary_binding_power("then").is_none());
    }

    #[test]
    fn empty_program_is_empty_block() {
        assert_eq!(parse_ok(""), GrammarNode::Block(vec![]));
        assert_eq!(parse_ok("  // only a comment\n"), GrammarNode::Block(vec![]));
    }

    #[test]
    fn multiple_statements_form_block() {
        let GrammarNode::Block(body) = parse_ok("add .a\nremove .b then toggle .c") else {
            panic!("expected block");
        };
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn if_then_command() {
        let GrammarNode::Conditional {
            negated,
            condition,
            then_block,
            ..
        } = parse_ok("if x > 5 then add .active")
        else {
            panic!("expected conditional");
        };
        assert!(!negated);
        assert!(matches!(*condition, GrammarNode::Binary { ref operator, .. } if operator == ">"));
        assert_eq!(then_block.len(), 1);
        assert!(matches!(&then_block[0], GrammarNode::Command { name, .. } if name == "add"));
    }

    #[test]
    fn stray_end_is_an_error() {
        let error = parse_err("add .a end");
        assert_eq!(error.message, "expected end of input, found 'end'");
        assert_eq!((error.line, error.column), (1, 8));
    }

    #[test]
    fn unknown_character_is_reported() {
        let error = parse_err("toggle \\");
        assert!(error.message.contains("found '\\'"), "{}", error.message);
    }

    #[test]
    fn error_position_on_later_line() {
        let error = parse_err("on click\n  put 1 onto #x");
        assert_eq!(error.line, 2);
        assert_eq!(error.column, 9);
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("log {}1{}", "(".repeat(200), ")".repeat(200));
        let error = parse_err(&source);
        assert_eq!(error.message, "nesting too deep");
    }

    #[test]
    fn expression_source() {
        let node = parse_expression_source("count + 1").unwrap();
        assert!(matches!(node, GrammarNode::Binary { ref operator, .. } if operator == "+"));
        assert!(parse_expression_source("count +").is_err());
        assert!(parse_expression_source("a b").is_err());
    }
}

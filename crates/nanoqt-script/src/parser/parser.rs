// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The main parser implementation: infrastructure and statements.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Scanner, Span, Token, TokenKind, line_column};
use std::rc::Rc;

/// A recursive descent parser.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    pub(super) current: Token,
    pub(super) previous: Token,
    loop_depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0), false),
            loop_depth: 0,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(declaration)
            }
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    /// Parses `var`/`let`/`const` without the trailing semicolon.
    fn parse_variable_declaration(&mut self) -> Result<Statement> {
        let kind = match self.advance().kind {
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => VariableKind::Var,
        };

        let mut declarations = Vec::new();
        loop {
            let name = self.expect_identifier("variable name")?;
            let init = if self.matches(&TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else {
                if kind == VariableKind::Const {
                    return Err(self.error_at_previous("Missing initializer in const declaration"));
                }
                None
            };
            declarations.push((name, init));

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        Ok(Statement::VariableDeclaration(VariableDeclaration {
            kind,
            declarations,
        }))
    }

    fn parse_function_declaration(&mut self) -> Result<Statement> {
        self.advance(); // consume 'function'
        let name = self.expect_identifier("function name")?;
        let function = self.parse_function_rest(Some(name))?;
        Ok(Statement::FunctionDeclaration(function))
    }

    /// Parses `(params) { body }` after the `function` keyword and name.
    pub(super) fn parse_function_rest(&mut self, name: Option<String>) -> Result<Rc<FunctionBody>> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("parameter name")?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;

        // Loops do not extend into nested function bodies.
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_block();
        self.loop_depth = saved_loop_depth;

        Ok(Rc::new(FunctionBody {
            name,
            params,
            body: body?,
        }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen, "'('")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.matches(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen, "'('")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        let body = Box::new(self.parse_loop_body()?);
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen, "'('")?;

        let init = match &self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                Some(Box::new(self.parse_variable_declaration()?))
            }
            _ => Some(Box::new(Statement::Expression(self.parse_expression()?))),
        };
        self.expect(&TokenKind::Semicolon, "';'")?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen, "')'")?;

        let body = Box::new(self.parse_loop_body()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_loop_body(&mut self) -> Result<Statement> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'return'
        // Top-level return is allowed: module bodies run as function bodies.
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(argument))
    }

    fn parse_jump_statement(&mut self) -> Result<Statement> {
        let token = self.advance();
        let is_break = token.kind == TokenKind::Break;
        if self.loop_depth == 0 {
            let keyword = if is_break { "break" } else { "continue" };
            return Err(self.error_at_previous(&format!("Illegal {} statement", keyword)));
        }
        self.consume_semicolon()?;
        Ok(if is_break {
            Statement::Break
        } else {
            Statement::Continue
        })
    }

    fn parse_throw_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(self.error_at_current("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(argument))
    }

    fn parse_try_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'try'
        let block = self.parse_block()?;

        let handler = if self.matches(&TokenKind::Catch) {
            let param = if self.matches(&TokenKind::LeftParen) {
                let name = self.expect_identifier("catch parameter")?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Some(name)
            } else {
                None
            };
            Some((param, self.parse_block()?))
        } else {
            None
        };

        let finalizer = if self.matches(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at_current("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    /// Parses `{ statements }`.
    pub(super) fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.expect(&TokenKind::LeftBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(self.error_at_current("Unexpected end of input"));
            }
            body.push(self.parse_statement()?);
        }
        self.advance(); // consume '}'
        Ok(body)
    }

    // ---- token helpers ----

    pub(super) fn advance(&mut self) -> Token {
        let next = self.scanner.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
        self.previous.clone()
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    pub(super) fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    pub(super) fn expect_identifier(&mut self, what: &str) -> Result<String> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected(what))
        }
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) || self.current.newline_before
    }

    /// Accepts an explicit `;` or an automatically inserted one.
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.matches(&TokenKind::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    // ---- errors ----

    pub(super) fn unexpected(&self, expected: &str) -> Error {
        let message = match &self.current.kind {
            TokenKind::Invalid(text) => format!("Invalid or unexpected token '{}'", text),
            TokenKind::Eof => format!("Unexpected end of input, expected {}", expected),
            other => format!("Unexpected {}, expected {}", other.describe(), expected),
        };
        self.error_at(self.current.span, message)
    }

    pub(super) fn error_at_current(&self, message: &str) -> Error {
        self.error_at(self.current.span, message.to_string())
    }

    pub(super) fn error_at_previous(&self, message: &str) -> Error {
        self.error_at(self.previous.span, message.to_string())
    }

    fn error_at(&self, span: Span, message: String) -> Error {
        let (line, column) = line_column(self.scanner.source(), span.start);
        Error::Syntax {
            message,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(source).parse_program()
    }

    #[test]
    fn test_declarations_and_asi() {
        let program = parse("var a = 1, b\nlet c = 2\nconst d = 3;").unwrap();
        assert_eq!(program.body.len(), 3);
        let Statement::VariableDeclaration(decl) = &program.body[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.kind, VariableKind::Var);
        assert_eq!(decl.declarations.len(), 2);
        assert!(decl.declarations[1].1.is_none());
    }

    #[test]
    fn test_missing_semicolon_on_same_line_is_error() {
        assert!(matches!(parse("a b"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_const_requires_initializer() {
        assert!(matches!(parse("const x;"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_break_outside_loop() {
        assert!(matches!(parse("break;"), Err(Error::Syntax { .. })));
        assert!(parse("while (1) { break; }").is_ok());
        assert!(matches!(
            parse("while (1) { function f() { break; } }"),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn test_top_level_return_allowed() {
        let program = parse("return\n42").unwrap();
        assert_eq!(program.body[0], Statement::Return(None));
    }

    #[test]
    fn test_try_forms() {
        assert!(parse("try { a() } catch (e) { b() }").is_ok());
        assert!(parse("try { a() } catch { b() } finally { c() }").is_ok());
        assert!(parse("try { a() } finally { c() }").is_ok());
        assert!(matches!(parse("try { a() }"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_for_statement() {
        let program = parse("for (var i = 0; i < 3; i += 1) { x = i }").unwrap();
        assert!(matches!(program.body[0], Statement::For(_)));
        assert!(parse("for (;;) { break }").is_ok());
    }

    #[test]
    fn test_syntax_error_position() {
        let Err(Error::Syntax { line, column, .. }) = parse("var a = 1;\nvar = 2;") else {
            panic!("expected syntax error");
        };
        assert_eq!((line, column), (2, 5));
    }
}

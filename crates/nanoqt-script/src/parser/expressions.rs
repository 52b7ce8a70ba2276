// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Expression parsing, lowest precedence first.

use super::Parser;
use crate::ast::*;
use crate::error::Result;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parses a full expression.
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment()
    }

    pub(super) fn parse_assignment(&mut self) -> Result<Expression> {
        let left = self.parse_conditional()?;

        let operator = match self.current.kind {
            TokenKind::Equal => AssignmentOperator::Assign,
            TokenKind::PlusEqual => AssignmentOperator::AddAssign,
            TokenKind::MinusEqual => AssignmentOperator::SubtractAssign,
            _ => return Ok(left),
        };

        let target = match left {
            Expression::Identifier(name) => AssignmentTarget::Identifier(name),
            Expression::Member { object, property } => AssignmentTarget::Member {
                object: *object,
                property: *property,
            },
            _ => return Err(self.error_at_current("Invalid left-hand side in assignment")),
        };
        self.advance(); // consume operator

        let value = self.parse_assignment()?;
        Ok(Expression::Assignment {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let test = self.parse_logical_or()?;
        if !self.matches(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "':'")?;
        let alternate = self.parse_assignment()?;
        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;
        while self.matches(&TokenKind::PipePipe) {
            let right = self.parse_logical_and()?;
            left = Expression::Logical {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        while self.matches(&TokenKind::AmpersandAmpersand) {
            let right = self.parse_equality()?;
            left = Expression::Logical {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::StrictEqual => BinaryOperator::StrictEqual,
                TokenKind::StrictNotEqual => BinaryOperator::StrictNotEqual,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::LessThanEqual => BinaryOperator::LessThanEqual,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::GreaterThanEqual => BinaryOperator::GreaterThanEqual,
                TokenKind::In => BinaryOperator::In,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(operator, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match self.current.kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Typeof => UnaryOperator::Typeof,
            _ => return self.parse_call_member(),
        };
        self.advance();
        let argument = self.parse_unary()?;
        Ok(Expression::Unary {
            operator,
            argument: Box::new(argument),
        })
    }

    fn parse_call_member(&mut self) -> Result<Expression> {
        let mut expression = self.parse_primary()?;

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let Some(name) = property_name(&self.current.kind) else {
                        return Err(self.unexpected("property name"));
                    };
                    self.advance();
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property: Box::new(MemberProperty::Named(name)),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket, "']'")?;
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property: Box::new(MemberProperty::Computed(key)),
                    };
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    expression = Expression::Call {
                        callee: Box::new(expression),
                        arguments,
                    };
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_assignment()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let expression = match &self.current.kind {
            TokenKind::Number(n) => Expression::Number(*n),
            TokenKind::String(s) => Expression::String(s.clone()),
            TokenKind::True => Expression::Boolean(true),
            TokenKind::False => Expression::Boolean(false),
            TokenKind::Null => Expression::Null,
            TokenKind::Identifier(name) => Expression::Identifier(name.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                self.advance();
                let name = match &self.current.kind {
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                return Ok(Expression::Function(self.parse_function_rest(name)?));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(expression)
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.advance(); // consume '{'
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            let key = match &self.current.kind {
                TokenKind::String(s) => s.clone(),
                TokenKind::Number(n) => crate::runtime::value::format_number(*n),
                other => match property_name(other) {
                    Some(name) => name,
                    None => return Err(self.unexpected("property name")),
                },
            };
            self.advance();
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.parse_assignment()?;
            properties.push((key, value));

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(Expression::Object(properties))
    }
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Identifiers and reserved words are both valid after `.` and as object keys.
fn property_name(kind: &TokenKind) -> Option<String> {
    let name = match kind {
        TokenKind::Identifier(name) => return Some(name.clone()),
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Null => "null",
        TokenKind::Break => "break",
        TokenKind::Catch => "catch",
        TokenKind::Const => "const",
        TokenKind::Continue => "continue",
        TokenKind::Else => "else",
        TokenKind::Finally => "finally",
        TokenKind::For => "for",
        TokenKind::Function => "function",
        TokenKind::If => "if",
        TokenKind::In => "in",
        TokenKind::Let => "let",
        TokenKind::Return => "return",
        TokenKind::Throw => "throw",
        TokenKind::Try => "try",
        TokenKind::Typeof => "typeof",
        TokenKind::Var => "var",
        TokenKind::While => "while",
        _ => return None,
    };
    Some(name.to_string())
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract Syntax Tree (AST) definitions for module source text.
//!
//! Node shapes follow ESTree naming where the subset allows.

use std::rc::Rc;

/// A complete program (one module body or one top-level script).
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(Rc<FunctionBody>),
    /// Expression statement
    Expression(Expression),
    /// Block statement { ... }
    Block(Vec<Statement>),
    /// If statement
    If(IfStatement),
    /// While statement
    While(WhileStatement),
    /// For statement
    For(ForStatement),
    /// Return statement
    Return(Option<Expression>),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// Throw statement
    Throw(Expression),
    /// Try statement
    Try(TryStatement),
    /// Empty statement (;)
    Empty,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// Declared names with optional initializers
    pub declarations: Vec<(String, Option<Expression>)>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The test condition
    pub test: Expression,
    /// Branch taken when the condition holds
    pub consequent: Box<Statement>,
    /// Optional else branch
    pub alternate: Option<Box<Statement>>,
}

/// A while loop.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// Loop condition
    pub test: Expression,
    /// Loop body
    pub body: Box<Statement>,
}

/// A C-style for loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// Initializer (declaration or expression statement)
    pub init: Option<Box<Statement>>,
    /// Loop condition
    pub test: Option<Expression>,
    /// Update expression
    pub update: Option<Expression>,
    /// Loop body
    pub body: Box<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    /// The protected block
    pub block: Vec<Statement>,
    /// Catch parameter and body
    pub handler: Option<(Option<String>, Vec<Statement>)>,
    /// Finally block
    pub finalizer: Option<Vec<Statement>>,
}

/// A function's parameters and body, shared by declarations and expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    /// Function name, if any
    pub name: Option<String>,
    /// Parameter names
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Statement>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
    /// Identifier reference
    Identifier(String),
    /// Object literal
    Object(Vec<(String, Expression)>),
    /// Function expression
    Function(Rc<FunctionBody>),
    /// Member access (`a.b` or `a[b]`)
    Member {
        /// The object being accessed
        object: Box<Expression>,
        /// The property key
        property: Box<MemberProperty>,
    },
    /// Function call
    Call {
        /// The callee
        callee: Box<Expression>,
        /// Call arguments
        arguments: Vec<Expression>,
    },
    /// Unary operation
    Unary {
        /// The operator
        operator: UnaryOperator,
        /// The operand
        argument: Box<Expression>,
    },
    /// Binary operation
    Binary {
        /// The operator
        operator: BinaryOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Short-circuit logical operation
    Logical {
        /// The operator
        operator: LogicalOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Conditional (ternary) expression
    Conditional {
        /// The test
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
    },
    /// Assignment
    Assignment {
        /// The operator
        operator: AssignmentOperator,
        /// Assignment target
        target: Box<AssignmentTarget>,
        /// Assigned value
        value: Box<Expression>,
    },
}

/// The key part of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `a.name`
    Named(String),
    /// `a[expr]`
    Computed(Expression),
}

/// A valid assignment target.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentTarget {
    /// A plain binding
    Identifier(String),
    /// An object property
    Member {
        /// The object being assigned into
        object: Expression,
        /// The property key
        property: MemberProperty,
    },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// !
    Not,
    /// -
    Minus,
    /// +
    Plus,
    /// typeof
    Typeof,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    /// <
    LessThan,
    /// <=
    LessThanEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanEqual,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// ===
    StrictEqual,
    /// !==
    StrictNotEqual,
    /// in
    In,
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// &&
    And,
    /// ||
    Or,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// =
    Assign,
    /// +=
    AddAssign,
    /// -=
    SubtractAssign,
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tree-walking interpreter.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::runtime::{Callable, ObjectRef, Scope, Value};
use std::cmp::Ordering;
use std::rc::Rc;

/// Maximum nesting of script function calls.
pub const MAX_CALL_DEPTH: usize = 128;

/// How a statement finished.
#[derive(Debug)]
enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Executes programs against a scope chain.
#[derive(Debug, Default)]
pub struct Interpreter {
    /// Value of the most recent top-level expression statement
    completion: Value,
    depth: usize,
}

impl Interpreter {
    /// Creates a new interpreter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a program in `scope` and returns its completion value.
    ///
    /// The completion value is the value of the last expression statement
    /// evaluated outside any function, or the argument of a top-level
    /// `return`.
    pub fn run(&mut self, program: &Program, scope: &Scope) -> Result<Value> {
        self.completion = Value::Undefined;
        match self.execute_statements(&program.body, scope)? {
            Completion::Return(value) => Ok(value),
            _ => Ok(std::mem::take(&mut self.completion)),
        }
    }

    /// Calls a function value with the given arguments.
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Value> {
        let Some(callable) = callee.as_object().and_then(ObjectRef::callable) else {
            return Err(Error::type_error(format!("{} is not a function", callee)));
        };
        self.invoke(callable, args)
    }

    fn invoke(&mut self, callable: Callable, args: &[Value]) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::Range("Maximum call stack size exceeded".to_string()));
        }

        self.depth += 1;
        let result = match callable {
            Callable::Native { func, .. } => func(args),
            Callable::Script { function, closure } => {
                let scope = closure.function();
                for (index, param) in function.params.iter().enumerate() {
                    scope.declare(param, args.get(index).cloned().unwrap_or_default(), true);
                }
                let saved = std::mem::take(&mut self.completion);
                let outcome = self.execute_statements(&function.body, &scope);
                self.completion = saved;
                outcome.map(|completion| match completion {
                    Completion::Return(value) => value,
                    _ => Value::Undefined,
                })
            }
        };
        self.depth -= 1;
        result
    }

    fn execute_statements(&mut self, statements: &[Statement], scope: &Scope) -> Result<Completion> {
        // Function declarations are visible throughout their enclosing block.
        for statement in statements {
            if let Statement::FunctionDeclaration(function) = statement {
                if let Some(name) = &function.name {
                    scope.declare(name, make_function(function, scope), true);
                }
            }
        }

        for statement in statements {
            match self.execute(statement, scope)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    fn execute(&mut self, statement: &Statement, scope: &Scope) -> Result<Completion> {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                for (name, init) in &declaration.declarations {
                    let value = match init {
                        Some(expression) => Some(self.evaluate(expression, scope)?),
                        None => None,
                    };
                    match declaration.kind {
                        VariableKind::Var => scope.declare_var(name, value),
                        VariableKind::Let => scope.declare(name, value.unwrap_or_default(), true),
                        VariableKind::Const => {
                            scope.declare(name, value.unwrap_or_default(), false)
                        }
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::FunctionDeclaration(_) | Statement::Empty => Ok(Completion::Normal),
            Statement::Expression(expression) => {
                let value = self.evaluate(expression, scope)?;
                self.completion = value;
                Ok(Completion::Normal)
            }
            Statement::Block(body) => self.execute_statements(body, &scope.block()),
            Statement::If(statement) => {
                if self.evaluate(&statement.test, scope)?.to_boolean() {
                    self.execute(&statement.consequent, scope)
                } else if let Some(alternate) = &statement.alternate {
                    self.execute(alternate, scope)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Statement::While(statement) => {
                while self.evaluate(&statement.test, scope)?.to_boolean() {
                    match self.execute(&statement.body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::For(statement) => self.execute_for(statement, scope),
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expression) => self.evaluate(expression, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break => Ok(Completion::Break),
            Statement::Continue => Ok(Completion::Continue),
            Statement::Throw(argument) => Err(Error::Thrown(self.evaluate(argument, scope)?)),
            Statement::Try(statement) => self.execute_try(statement, scope),
        }
    }

    fn execute_for(&mut self, statement: &ForStatement, scope: &Scope) -> Result<Completion> {
        let loop_scope = scope.block();
        if let Some(init) = &statement.init {
            self.execute(init, &loop_scope)?;
        }

        loop {
            if let Some(test) = &statement.test {
                if !self.evaluate(test, &loop_scope)?.to_boolean() {
                    break;
                }
            }
            match self.execute(&statement.body, &loop_scope)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
            if let Some(update) = &statement.update {
                self.evaluate(update, &loop_scope)?;
            }
        }
        Ok(Completion::Normal)
    }

    fn execute_try(&mut self, statement: &TryStatement, scope: &Scope) -> Result<Completion> {
        let result = match self.execute_statements(&statement.block, &scope.block()) {
            Err(error) => match &statement.handler {
                Some((param, body)) => {
                    let catch_scope = scope.block();
                    if let Some(name) = param {
                        catch_scope.declare(name, error.to_value(), true);
                    }
                    self.execute_statements(body, &catch_scope)
                }
                None => Err(error),
            },
            completed => completed,
        };

        if let Some(finalizer) = &statement.finalizer {
            match self.execute_statements(finalizer, &scope.block())? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        result
    }

    fn evaluate(&mut self, expression: &Expression, scope: &Scope) -> Result<Value> {
        match expression {
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::Null => Ok(Value::Null),
            Expression::Identifier(name) => lookup(scope, name),
            Expression::Object(properties) => {
                let object = ObjectRef::new();
                for (key, value) in properties {
                    let value = self.evaluate(value, scope)?;
                    object.set(key, value)?;
                }
                Ok(Value::Object(object))
            }
            Expression::Function(function) => Ok(make_function(function, scope)),
            Expression::Member { object, property } => {
                let object = self.evaluate(object, scope)?;
                let key = self.property_key(property, scope)?;
                get_member(&object, &key)
            }
            Expression::Call { callee, arguments } => {
                let function = self.evaluate(callee, scope)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument, scope)?);
                }
                match function.as_object().and_then(ObjectRef::callable) {
                    Some(callable) => self.invoke(callable, &args),
                    None => Err(Error::type_error(format!(
                        "{} is not a function",
                        describe_callee(callee)
                    ))),
                }
            }
            Expression::Unary { operator, argument } => {
                if let (UnaryOperator::Typeof, Expression::Identifier(name)) =
                    (operator, argument.as_ref())
                {
                    return Ok(Value::from(match lookup(scope, name) {
                        Ok(value) => value.type_of(),
                        Err(_) => "undefined",
                    }));
                }
                let value = self.evaluate(argument, scope)?;
                Ok(match operator {
                    UnaryOperator::Not => Value::Boolean(!value.to_boolean()),
                    UnaryOperator::Minus => Value::Number(-value.to_number()),
                    UnaryOperator::Plus => Value::Number(value.to_number()),
                    UnaryOperator::Typeof => Value::from(value.type_of()),
                })
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate(left, scope)?;
                let right = self.evaluate(right, scope)?;
                binary_operation(*operator, &left, &right)
            }
            Expression::Logical {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate(left, scope)?;
                let short_circuit = match operator {
                    LogicalOperator::And => !left.to_boolean(),
                    LogicalOperator::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right, scope)
                }
            }
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.evaluate(test, scope)?.to_boolean() {
                    self.evaluate(consequent, scope)
                } else {
                    self.evaluate(alternate, scope)
                }
            }
            Expression::Assignment {
                operator,
                target,
                value,
            } => self.evaluate_assignment(*operator, target, value, scope),
        }
    }

    fn evaluate_assignment(
        &mut self,
        operator: AssignmentOperator,
        target: &AssignmentTarget,
        value: &Expression,
        scope: &Scope,
    ) -> Result<Value> {
        match target {
            AssignmentTarget::Identifier(name) => {
                let current = match operator {
                    AssignmentOperator::Assign => None,
                    _ => Some(lookup(scope, name)?),
                };
                let value = self.evaluate(value, scope)?;
                let value = compound(operator, current, value)?;
                scope.assign(name, value.clone())?;
                Ok(value)
            }
            AssignmentTarget::Member { object, property } => {
                let object = self.evaluate(object, scope)?;
                let key = self.property_key(property, scope)?;
                let current = match operator {
                    AssignmentOperator::Assign => None,
                    _ => Some(get_member(&object, &key)?),
                };
                let value = self.evaluate(value, scope)?;
                let value = compound(operator, current, value)?;
                set_member(&object, &key, value.clone())?;
                Ok(value)
            }
        }
    }

    fn property_key(&mut self, property: &MemberProperty, scope: &Scope) -> Result<String> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(expression) => {
                Ok(self.evaluate(expression, scope)?.to_string())
            }
        }
    }
}

fn make_function(function: &Rc<FunctionBody>, scope: &Scope) -> Value {
    Value::Object(ObjectRef::function(Callable::Script {
        function: Rc::clone(function),
        closure: scope.clone(),
    }))
}

fn lookup(scope: &Scope, name: &str) -> Result<Value> {
    if let Some(value) = scope.get(name) {
        return Ok(value);
    }
    match name {
        "undefined" => Ok(Value::Undefined),
        "NaN" => Ok(Value::Number(f64::NAN)),
        "Infinity" => Ok(Value::Number(f64::INFINITY)),
        _ => Err(Error::reference_error(format!("{} is not defined", name))),
    }
}

/// Reads `object[key]`.
pub fn get_member(object: &Value, key: &str) -> Result<Value> {
    match object {
        Value::Object(o) => Ok(o.get(key)),
        Value::String(s) if key == "length" => Ok(Value::Number(s.encode_utf16().count() as f64)),
        Value::Undefined | Value::Null => Err(Error::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            object, key
        ))),
        _ => Ok(Value::Undefined),
    }
}

/// Writes `object[key] = value`.
pub fn set_member(object: &Value, key: &str, value: Value) -> Result<()> {
    match object {
        Value::Object(o) => o.set(key, value),
        Value::Undefined | Value::Null => Err(Error::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            object, key
        ))),
        primitive => Err(Error::type_error(format!(
            "Cannot create property '{}' on {} '{}'",
            key,
            primitive.type_of(),
            primitive
        ))),
    }
}

fn compound(operator: AssignmentOperator, current: Option<Value>, value: Value) -> Result<Value> {
    match (operator, current) {
        (AssignmentOperator::AddAssign, Some(current)) => {
            binary_operation(BinaryOperator::Add, &current, &value)
        }
        (AssignmentOperator::SubtractAssign, Some(current)) => {
            binary_operation(BinaryOperator::Subtract, &current, &value)
        }
        _ => Ok(value),
    }
}

fn binary_operation(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    use BinaryOperator::*;

    let value = match operator {
        Add => match (left, right) {
            (Value::String(_) | Value::Object(_), _) | (_, Value::String(_) | Value::Object(_)) => {
                Value::String(format!("{}{}", left, right))
            }
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        Subtract => Value::Number(left.to_number() - right.to_number()),
        Multiply => Value::Number(left.to_number() * right.to_number()),
        Divide => Value::Number(left.to_number() / right.to_number()),
        Modulo => Value::Number(left.to_number() % right.to_number()),
        LessThan => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        LessThanEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        GreaterThan => Value::Boolean(compare(left, right) == Some(Ordering::Greater)),
        GreaterThanEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        Equal => Value::Boolean(left.loose_equals(right)),
        NotEqual => Value::Boolean(!left.loose_equals(right)),
        StrictEqual => Value::Boolean(left == right),
        StrictNotEqual => Value::Boolean(left != right),
        In => match right {
            Value::Object(object) => Value::Boolean(object.has(&left.to_string())),
            other => {
                return Err(Error::type_error(format!(
                    "Cannot use 'in' operator to search for '{}' in {}",
                    left, other
                )));
            }
        },
    };
    Ok(value)
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

fn describe_callee(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(name) => name.clone(),
        Expression::Member { object, property } => match property.as_ref() {
            MemberProperty::Named(name) => format!("{}.{}", describe_callee(object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe_callee(object)),
        },
        Expression::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # nanoqt-script
//!
//! The small script language that nanoqt module bodies are written in.
//!
//! ## Overview
//!
//! This crate provides everything needed to run a module body:
//! - Lexer and recursive-descent parser with automatic semicolon insertion
//! - Tree-walking interpreter with closures and `try`/`catch`/`finally`
//! - Reference-counted objects shared between host and script
//! - Host functions via [`Value::native_function`]
//!
//! ## Quick Start
//!
//! ```rust
//! use nanoqt_script::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! let result = engine.eval("1 + 2").unwrap();
//! assert_eq!(result, Value::Number(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod vm;

pub use error::{Error, Result};
pub use parser::parse;
pub use runtime::{ObjectRef, Scope, Value};
pub use vm::Interpreter;

use ast::Program;

/// A script execution context with its own global scope.
///
/// Bindings created by one [`eval`](Engine::eval) stay visible to the next,
/// which is what an interactive session expects.
#[derive(Debug)]
pub struct Engine {
    global: Scope,
    interpreter: Interpreter,
}

impl Engine {
    /// Creates an engine with an empty global scope.
    pub fn new() -> Self {
        Self {
            global: Scope::global(),
            interpreter: Interpreter::new(),
        }
    }

    /// Returns the global scope.
    pub fn global(&self) -> &Scope {
        &self.global
    }

    /// Binds `name` in the global scope, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.global.declare(name, value, true);
    }

    /// Looks up a global binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.global.get(name)
    }

    /// Parses and runs `source`, returning its completion value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use nanoqt_script::Engine;
    /// let mut engine = Engine::new();
    /// engine.eval("var greeting = 'hi'").unwrap();
    /// assert_eq!(engine.eval("greeting + '!'").unwrap().to_string(), "hi!");
    /// ```
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let program = parse(source)?;
        self.run(&program)
    }

    /// Runs an already parsed program in the global scope.
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        self.interpreter.run(program, &self.global)
    }

    /// Calls a function value.
    pub fn call(&mut self, function: &Value, args: &[Value]) -> Result<Value> {
        self.interpreter.call(function, args)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn eval(source: &str) -> Value {
        Engine::new().eval(source).unwrap()
    }

    fn eval_err(source: &str) -> Error {
        Engine::new().eval(source).unwrap_err()
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("7 % 4"), Value::Number(3.0));
        assert_eq!(eval("'a' + 1"), Value::from("a1"));
        assert_eq!(eval("'abc'.length"), Value::Number(3.0));
        assert!(eval("0 / 0").to_number().is_nan());
    }

    #[test]
    fn test_comparison_and_logic() {
        assert_eq!(eval("1 < 2 && 'b' > 'a'"), Value::Boolean(true));
        assert_eq!(eval("null == undefined"), Value::Boolean(true));
        assert_eq!(eval("null === undefined"), Value::Boolean(false));
        assert_eq!(eval("'1' == 1"), Value::Boolean(true));
        assert_eq!(eval("0 || 'fallback'"), Value::from("fallback"));
        assert_eq!(eval("'' && unknown"), Value::from(""));
        assert_eq!(eval("1 ? 'yes' : 'no'"), Value::from("yes"));
    }

    #[test]
    fn test_completion_value_is_last_expression() {
        assert_eq!(eval("var a = 1; a + 1; var b = 5"), Value::Number(2.0));
        assert_eq!(eval("var a = 1"), Value::Undefined);
        assert_eq!(eval("function f() { 99 } f(); 'done'"), Value::from("done"));
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(eval("1; return 'early'; 2"), Value::from("early"));
    }

    #[test]
    fn test_closures_and_hoisting() {
        let source = r#"
            var next = counter();
            next(); next();
            function counter() {
                var n = 0;
                return function () { n += 1; return n };
            }
            next()
        "#;
        assert_eq!(eval(source), Value::Number(3.0));
    }

    #[test]
    fn test_block_scoping() {
        assert_eq!(eval("let x = 1; { let x = 2 } x"), Value::Number(1.0));
        assert_eq!(eval("var y = 1; { var y = 2 } y"), Value::Number(2.0));
    }

    #[test]
    fn test_loops() {
        let source = r#"
            var total = 0;
            for (var i = 0; i < 10; i += 1) {
                if (i == 3) continue;
                if (i == 6) break;
                total += i;
            }
            var j = 0;
            while (j < 4) j += 1;
            total + j
        "#;
        // (0 + 1 + 2 + 4 + 5) + 4
        assert_eq!(eval(source), Value::Number(16.0));
    }

    #[test]
    fn test_objects_share_identity() {
        let source = r#"
            var a = { inner: { count: 1 } };
            var b = a;
            b.inner.count += 1;
            b['key with space'] = true;
            a.inner.count + ('key with space' in a ? 10 : 0)
        "#;
        assert_eq!(eval(source), Value::Number(12.0));
    }

    #[test]
    fn test_try_catch_finally() {
        let source = r#"
            var log = '';
            try {
                log += 'a';
                throw { message: 'bad' };
            } catch (e) {
                log += e.message;
            } finally {
                log += '!';
            }
            log
        "#;
        assert_eq!(eval(source), Value::from("abad!"));
    }

    #[test]
    fn test_finally_runs_on_return() {
        let source = r#"
            var cleaned = false;
            function f() {
                try { return 1 } finally { cleaned = true }
            }
            f() + (cleaned ? 1 : 0)
        "#;
        assert_eq!(eval(source), Value::Number(2.0));
    }

    #[test]
    fn test_runtime_errors_are_catchable() {
        assert_eq!(
            eval("var name = null; try { missing } catch (e) { name = e.name } name"),
            Value::from("ReferenceError")
        );
        let message = eval("try { null.x } catch (e) { e.name + ': ' + e.message }");
        assert_eq!(
            message.to_string(),
            "TypeError: Cannot read properties of null (reading 'x')"
        );
    }

    #[test]
    fn test_errors_escape_uncaught() {
        assert!(matches!(eval_err("missing"), Error::Reference(_)));
        assert!(matches!(eval_err("var o = {}; o.f()"), Error::Type(msg) if msg == "o.f is not a function"));
        assert!(matches!(eval_err("undefined.x"), Error::Type(_)));
        assert!(matches!(eval_err("const c = 1; c = 2"), Error::Type(_)));
        assert!(matches!(eval_err("throw 'raw'"), Error::Thrown(Value::String(s)) if s == "raw"));
        assert!(matches!(eval_err("var = 1"), Error::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_typeof() {
        assert_eq!(eval("typeof undeclared"), Value::from("undefined"));
        assert_eq!(eval("typeof function () {}"), Value::from("function"));
        assert_eq!(eval("typeof {}"), Value::from("object"));
        assert_eq!(eval("typeof null"), Value::from("object"));
        assert_eq!(eval("typeof 'x'"), Value::from("string"));
    }

    #[test]
    fn test_runaway_recursion_is_range_error() {
        assert!(matches!(
            eval_err("function f() { return f() } f()"),
            Error::Range(_)
        ));
    }

    #[test]
    fn test_native_function() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut engine = Engine::new();
        engine.define(
            "record",
            Value::native_function("record", move |args| {
                sink.borrow_mut().extend(args.iter().cloned());
                Ok(Value::Number(args.len() as f64))
            }),
        );

        assert_eq!(engine.eval("record(1, 'two')").unwrap(), Value::Number(2.0));
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(engine.eval("typeof record").unwrap(), Value::from("function"));
    }

    #[test]
    fn test_host_calls_script_function() {
        let mut engine = Engine::new();
        engine.eval("function add(a, b) { return a + b }").unwrap();
        let add = engine.get("add").unwrap();
        let result = engine
            .call(&add, &[Value::Number(2.0), Value::Number(3.0)])
            .unwrap();
        assert_eq!(result, Value::Number(5.0));
        assert!(engine.call(&Value::Null, &[]).is_err());
    }
}

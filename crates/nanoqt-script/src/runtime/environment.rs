// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical environments for variable binding.

use super::value::Value;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug, Default)]
struct Frame {
    bindings: FxHashMap<String, Binding>,
    outer: Option<Scope>,
    /// `var` declarations land in the nearest function frame.
    function_frame: bool,
}

/// A shared, chained lexical environment.
///
/// Closures hold a `Scope` handle, so frames outlive the call that created
/// them.
#[derive(Debug, Clone)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    /// Creates a new top-level environment.
    pub fn global() -> Self {
        Self(Rc::new(RefCell::new(Frame {
            function_frame: true,
            ..Frame::default()
        })))
    }

    /// Creates a block scope nested in this one.
    pub fn block(&self) -> Self {
        self.child(false)
    }

    /// Creates a function scope nested in this one.
    pub fn function(&self) -> Self {
        self.child(true)
    }

    fn child(&self, function_frame: bool) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            bindings: FxHashMap::default(),
            outer: Some(self.clone()),
            function_frame,
        })))
    }

    /// Declares a binding in this frame, replacing any previous one.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// Declares a `var` binding in the nearest function frame.
    ///
    /// Redeclaring an existing `var` keeps its value unless an initializer is
    /// supplied.
    pub fn declare_var(&self, name: &str, value: Option<Value>) {
        let target = self.var_scope();
        let mut frame = target.0.borrow_mut();
        if let Some(binding) = frame.bindings.get_mut(name) {
            if let Some(value) = value {
                binding.value = value;
            }
            return;
        }
        frame.bindings.insert(
            name.to_string(),
            Binding {
                value: value.unwrap_or_default(),
                mutable: true,
            },
        );
    }

    fn var_scope(&self) -> Scope {
        let mut current = self.clone();
        loop {
            let outer = {
                let frame = current.0.borrow();
                if frame.function_frame {
                    None
                } else {
                    frame.outer.clone()
                }
            };
            match outer {
                Some(outer) => current = outer,
                None => return current,
            }
        }
    }

    /// Looks up a binding through the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        if let Some(binding) = frame.bindings.get(name) {
            return Some(binding.value.clone());
        }
        frame.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Returns true if `name` is bound anywhere in the chain.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Assigns to an existing binding.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut frame = self.0.borrow_mut();
        if let Some(binding) = frame.bindings.get_mut(name) {
            if !binding.mutable {
                return Err(Error::type_error(format!(
                    "Assignment to constant variable '{}'",
                    name
                )));
            }
            binding.value = value;
            return Ok(());
        }
        match frame.outer.clone() {
            Some(outer) => {
                drop(frame);
                outer.assign(name, value)
            }
            None => Err(Error::reference_error(format!("{} is not defined", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_through_chain() {
        let global = Scope::global();
        global.declare("x", Value::Number(1.0), true);
        let inner = global.block();
        assert!(matches!(inner.get("x"), Some(Value::Number(n)) if n == 1.0));
        assert!(inner.get("y").is_none());
    }

    #[test]
    fn test_assign_updates_defining_frame() {
        let global = Scope::global();
        global.declare("x", Value::Number(1.0), true);
        let inner = global.function().block();
        inner.assign("x", Value::Number(2.0)).unwrap();
        assert!(matches!(global.get("x"), Some(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn test_const_and_undeclared_assignment() {
        let global = Scope::global();
        global.declare("c", Value::Null, false);
        assert!(matches!(global.assign("c", Value::Null), Err(Error::Type(_))));
        assert!(matches!(global.assign("nope", Value::Null), Err(Error::Reference(_))));
    }

    #[test]
    fn test_var_hoists_to_function_frame() {
        let global = Scope::global();
        let function = global.function();
        let block = function.block();
        block.declare_var("v", Some(Value::Boolean(true)));
        assert!(function.has("v"));
        assert!(!global.has("v"));
    }
}

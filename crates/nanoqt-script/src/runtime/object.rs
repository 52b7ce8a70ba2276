// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Heap objects and callables.
//!
//! Objects are shared by reference: cloning an [`ObjectRef`] yields a second
//! handle to the same object, and equality between handles is identity.

use super::environment::Scope;
use super::value::Value;
use crate::ast::FunctionBody;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Signature of host functions exposed to scripts.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// Something that can be invoked from script code.
#[derive(Clone)]
pub enum Callable {
    /// A function defined in script source, with its captured scope
    Script {
        /// Parameters and body
        function: Rc<FunctionBody>,
        /// Scope the function closes over
        closure: Scope,
    },
    /// A host function
    Native {
        /// Name shown in diagnostics
        name: String,
        /// The host closure
        func: Rc<NativeFn>,
    },
}

impl Callable {
    /// Returns the function's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Callable::Script { function, .. } => function.name.as_deref(),
            Callable::Native { name, .. } => Some(name),
        }
    }
}

/// A single named property.
#[derive(Clone)]
struct Property {
    value: Value,
    writable: bool,
}

/// An object: ordered properties plus an optional call behaviour.
#[derive(Default)]
pub struct Object {
    properties: FxHashMap<String, Property>,
    order: Vec<String>,
    callable: Option<Callable>,
}

/// Shared handle to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Creates a new empty object.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Object::default())))
    }

    /// Creates a function object.
    pub fn function(callable: Callable) -> Self {
        let object = Object {
            callable: Some(callable),
            ..Object::default()
        };
        Self(Rc::new(RefCell::new(object)))
    }

    /// Returns true if both handles point at the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Reads a property, yielding `undefined` when absent.
    pub fn get(&self, key: &str) -> Value {
        self.0
            .borrow()
            .properties
            .get(key)
            .map(|p| p.value.clone())
            .unwrap_or(Value::Undefined)
    }

    /// Returns true if the object has an own property named `key`.
    pub fn has(&self, key: &str) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    /// Writes a property, failing on read-only properties.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut object = self.0.borrow_mut();
        match object.properties.get_mut(key) {
            Some(property) if !property.writable => Err(Error::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                key
            ))),
            Some(property) => {
                property.value = value;
                Ok(())
            }
            None => {
                object.order.push(key.to_string());
                object.properties.insert(
                    key.to_string(),
                    Property {
                        value,
                        writable: true,
                    },
                );
                Ok(())
            }
        }
    }

    /// Defines (or redefines) a read-only property.
    pub fn define_readonly(&self, key: &str, value: Value) {
        let mut object = self.0.borrow_mut();
        if !object.properties.contains_key(key) {
            object.order.push(key.to_string());
        }
        object.properties.insert(
            key.to_string(),
            Property {
                value,
                writable: false,
            },
        );
    }

    /// Returns property names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().order.clone()
    }

    /// Returns the number of own properties.
    pub fn len(&self) -> usize {
        self.0.borrow().order.len()
    }

    /// Returns true if the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the call behaviour, if this object is a function.
    pub fn callable(&self) -> Option<Callable> {
        self.0.borrow().callable.clone()
    }

    /// Returns true if this object can be called.
    pub fn is_function(&self) -> bool {
        self.0.borrow().callable.is_some()
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Objects may be cyclic (modules referencing each other), so Debug only
// identifies the allocation.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_order() {
        let object = ObjectRef::new();
        object.set("b", Value::Number(1.0)).unwrap();
        object.set("a", Value::Number(2.0)).unwrap();
        object.set("b", Value::Number(3.0)).unwrap();
        assert_eq!(object.keys(), vec!["b".to_string(), "a".to_string()]);
        assert!(matches!(object.get("b"), Value::Number(n) if n == 3.0));
        assert!(object.get("missing").is_undefined());
    }

    #[test]
    fn test_readonly_property_rejects_writes() {
        let object = ObjectRef::new();
        object.define_readonly("main", Value::Null);
        assert!(matches!(object.set("main", Value::Number(1.0)), Err(Error::Type(_))));
        assert!(object.get("main").is_null());
    }

    #[test]
    fn test_identity() {
        let a = ObjectRef::new();
        let b = a.clone();
        let c = ObjectRef::new();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

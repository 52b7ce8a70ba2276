// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script value representation.

use super::object::{Callable, NativeFn, ObjectRef};
use crate::error::Result;
use std::fmt;
use std::rc::Rc;

/// A script value.
///
/// Primitives are copied; objects and functions are shared handles.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object or function
    Object(ObjectRef),
}

impl PartialEq for Value {
    /// Strict equality (`===`).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of IEEE comparison
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Creates a new empty object value.
    pub fn object() -> Self {
        Value::Object(ObjectRef::new())
    }

    /// Wraps a host closure as a callable function value.
    pub fn native_function<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        let func: Rc<NativeFn> = Rc::new(func);
        Value::Object(ObjectRef::function(Callable::Native {
            name: name.to_string(),
            func,
        }))
    }

    /// Creates an error object with `name` and `message` properties.
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        let object = ObjectRef::new();
        // Fresh objects have no read-only properties, so these cannot fail.
        let _ = object.set("name", Value::String(name.to_string()));
        let _ = object.set("message", Value::String(message.into()));
        Value::Object(object)
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Object(o) if o.is_function())
    }

    /// Returns the object handle, if this value is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the string contents, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Converts the value to a number (ToNumber).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined | Value::Object(_) => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(o) if o.is_function() => "function",
            Value::Object(_) => "object",
        }
    }

    /// Abstract equality (`==`), restricted to the coercions the language has.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Boolean(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Boolean(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Object(_), Value::String(s)) | (Value::String(s), Value::Object(_)) => {
                let object = if self.as_object().is_some() { self } else { other };
                object.to_string() == *s
            }
            _ => self == other,
        }
    }

    /// Describes a thrown value the way an uncaught error is reported.
    pub fn describe_thrown(&self) -> String {
        if let Value::Object(object) = self {
            let message = object.get("message");
            if !message.is_undefined() {
                let name = object.get("name");
                let name = if name.is_undefined() {
                    "Error".to_string()
                } else {
                    name.to_string()
                };
                return format!("{}: {}", name, message);
            }
        }
        self.to_string()
    }

    /// Renders the value for interactive display (REPL output).
    pub fn inspect(&self) -> String {
        let mut seen = Vec::new();
        self.inspect_inner(&mut seen, 0)
    }

    fn inspect_inner(&self, seen: &mut Vec<ObjectRef>, depth: usize) -> String {
        match self {
            Value::String(s) => format!("'{}'", s),
            Value::Object(object) => {
                if let Some(callable) = object.callable() {
                    return function_label(&callable);
                }
                if seen.iter().any(|o| o.ptr_eq(object)) {
                    return "[Circular]".to_string();
                }
                let keys = object.keys();
                if keys.is_empty() {
                    return "{}".to_string();
                }
                if depth >= 2 {
                    return "[Object]".to_string();
                }
                seen.push(object.clone());
                let entries: Vec<String> = keys
                    .iter()
                    .map(|key| {
                        let value = object.get(key).inspect_inner(seen, depth + 1);
                        if is_plain_key(key) {
                            format!("{}: {}", key, value)
                        } else {
                            format!("'{}': {}", key, value)
                        }
                    })
                    .collect();
                seen.pop();
                format!("{{ {} }}", entries.join(", "))
            }
            other => other.to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl fmt::Display for Value {
    /// ToString conversion.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(object) => match object.callable() {
                Some(callable) => write!(f, "{}", function_label(&callable)),
                None => write!(f, "[object Object]"),
            },
        }
    }
}

fn function_label(callable: &Callable) -> String {
    match callable.name() {
        Some(name) => format!("[Function: {}]", name),
        None => "[Function (anonymous)]".to_string(),
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c == '_' || c == '$' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

/// Formats a number the way scripts print it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

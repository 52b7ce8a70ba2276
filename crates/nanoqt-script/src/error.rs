// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Errors raised while parsing or executing script code.

use crate::runtime::value::Value;
use thiserror::Error;

/// Result type for script operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during parsing or execution.
///
/// Every variant is catchable from script code; `catch` binds the value
/// produced by [`Error::to_value`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Source text could not be parsed
    #[error("SyntaxError: {message} ({line}:{column})")]
    Syntax {
        /// Description of the problem
        message: String,
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
    },

    /// Operation applied to a value of the wrong type
    #[error("TypeError: {0}")]
    Type(String),

    /// Reference to an undeclared binding
    #[error("ReferenceError: {0}")]
    Reference(String),

    /// Value out of range (call depth exhausted)
    #[error("RangeError: {0}")]
    Range(String),

    /// A value raised by a `throw` statement or a host function
    #[error("Uncaught {}", .0.describe_thrown())]
    Thrown(Value),
}

impl Error {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    /// Create a new ReferenceError
    pub fn reference_error(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    /// Throw an `Error` object with the given message.
    pub fn throw(message: impl Into<String>) -> Self {
        Self::Thrown(Value::error("Error", message))
    }

    /// Converts the error into the value a `catch` clause binds.
    pub fn to_value(&self) -> Value {
        match self {
            Error::Thrown(value) => value.clone(),
            Error::Syntax {
                message,
                line,
                column,
            } => Value::error("SyntaxError", format!("{} ({}:{})", message, line, column)),
            Error::Type(msg) => Value::error("TypeError", msg.clone()),
            Error::Reference(msg) => Value::error("ReferenceError", msg.clone()),
            Error::Range(msg) => Value::error("RangeError", msg.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::type_error("x is not a function").to_string(),
            "TypeError: x is not a function"
        );
        assert_eq!(
            Error::Thrown(Value::from("boom")).to_string(),
            "Uncaught boom"
        );
        assert_eq!(
            Error::throw("bad things").to_string(),
            "Uncaught Error: bad things"
        );
    }

    #[test]
    fn test_to_value_builds_error_object() {
        let value = Error::reference_error("y is not defined").to_value();
        let object = value.as_object().expect("error object");
        assert_eq!(object.get("name").to_string(), "ReferenceError");
        assert_eq!(object.get("message").to_string(), "y is not defined");
    }
}

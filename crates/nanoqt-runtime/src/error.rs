// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module runtime

use nanoqt_script::{ObjectRef, Value};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised by script code.
pub use nanoqt_script::Error as ScriptError;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Result type for module loading
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// Errors that can occur while resolving or loading a module
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No search-path candidate names a regular file
    #[error("Cannot find module '{0}'")]
    NotFound(String),

    /// The module body raised an error
    #[error("Error while executing module '{specifier}' ({}): {source}", .path.display())]
    Execution {
        /// Specifier passed to `require`
        specifier: String,
        /// Canonical path of the module
        path: PathBuf,
        /// The error raised by the body
        source: ScriptError,
    },

    /// The resolved file could not be canonicalized or read
    #[error("Cannot read module '{specifier}' ({}): {source}", .path.display())]
    Read {
        /// Specifier passed to `require`
        specifier: String,
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

impl ModuleError {
    /// Create a module not found error
    pub fn not_found(specifier: impl Into<String>) -> Self {
        Self::NotFound(specifier.into())
    }

    /// The specifier whose load failed.
    pub fn specifier(&self) -> &str {
        match self {
            ModuleError::NotFound(specifier)
            | ModuleError::Execution { specifier, .. }
            | ModuleError::Read { specifier, .. } => specifier,
        }
    }

    /// True when the module was found but could not be brought up.
    ///
    /// Such modules stay in the cache; requiring them again returns
    /// whatever their exports held when the failure happened.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, ModuleError::Execution { .. } | ModuleError::Read { .. })
    }

    /// Converts the error into what a failing `require` call throws.
    ///
    /// Body failures re-raise the body's own error so the same thrown
    /// value travels up a chain of nested loads.
    pub fn into_script_error(self) -> ScriptError {
        match self {
            ModuleError::Execution { source, .. } => source,
            ModuleError::NotFound(specifier) => {
                let error = error_object(&format!("Cannot find module '{}'", specifier));
                decorate(&error, "code", Value::from("MODULE_NOT_FOUND"));
                decorate(&error, "specifier", Value::from(specifier));
                ScriptError::Thrown(Value::Object(error))
            }
            ModuleError::Read {
                ref specifier,
                ref path,
                ref source,
            } => {
                let error = error_object(&format!(
                    "Cannot read module '{}' ({}): {}",
                    specifier,
                    path.display(),
                    source
                ));
                decorate(&error, "code", Value::from("EIO"));
                decorate(&error, "specifier", Value::from(specifier.as_str()));
                decorate(&error, "path", Value::from(path.to_string_lossy().into_owned()));
                ScriptError::Thrown(Value::Object(error))
            }
        }
    }
}

fn error_object(message: &str) -> ObjectRef {
    let object = ObjectRef::new();
    decorate(&object, "name", Value::from("Error"));
    decorate(&object, "message", Value::from(message));
    object
}

fn decorate(object: &ObjectRef, key: &str, value: Value) {
    // Fresh error objects have no read-only properties.
    let _ = object.set(key, value);
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A configuration file is not valid TOML for [`Config`](crate::Config)
    #[error("Invalid config file '{}': {source}", .path.display())]
    Parse {
        /// Path of the file
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },
}

/// Errors surfaced by the [`Runtime`](crate::Runtime) facade
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Loading a module failed
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Top-level code failed to parse or raised
    #[error("{0}")]
    Script(#[from] ScriptError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An entry file could not be read
    #[error("Cannot read '{}': {source}", .path.display())]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

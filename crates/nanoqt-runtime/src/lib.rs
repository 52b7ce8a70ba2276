// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # nanoqt-runtime
//!
//! A CommonJS-style module system for nanoqt scripts.
//!
//! This crate provides:
//!
//! - `require()` with `nanoqt_modules` search and a global default module path
//! - A module cache keyed by canonical path that makes circular requires safe
//! - Isolated module bodies that see only `module`, `exports` and `require`
//! - A pluggable [`Filesystem`] probe, with an in-memory implementation
//! - Layered configuration from TOML files and the environment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nanoqt_runtime::{Config, Runtime};
//! use std::path::Path;
//!
//! let mut runtime = Runtime::new(Config::load().unwrap());
//! let value = runtime.run_file(Path::new("app.js")).unwrap();
//! println!("{}", value.inspect());
//! ```
//!
//! ## Embedding with an in-memory tree
//!
//! ```rust
//! use nanoqt_runtime::{Config, MemoryFilesystem, Runtime};
//! use std::rc::Rc;
//!
//! let fs = MemoryFilesystem::new()
//!     .file("/proj/nanoqt_modules/lib.js", "exports.value = 42");
//! let config = Config { entry_dir: Some("/proj".into()), ..Config::default() };
//! let mut runtime = Runtime::with_filesystem(config, Rc::new(fs));
//! assert_eq!(runtime.eval("require('lib').value").unwrap().to_string(), "42");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod module_system;
pub mod runtime;

// Re-exports
pub use config::Config;
pub use error::{ConfigError, ModuleError, Result, RuntimeError, ScriptError};
pub use module_system::{
    Filesystem, MemoryFilesystem, ModuleCache, ModuleLoader, ModuleRecord, ModuleResolver,
    OsFilesystem,
};
pub use nanoqt_script::Value;
pub use runtime::Runtime;

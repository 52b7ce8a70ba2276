// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS-style module system
//!
//! - `require()` function with `main`, `cache` and `resolve`
//! - `module.exports` / `exports`
//! - Synchronous loading with cycle-safe caching
//! - `nanoqt_modules` search for bare specifiers

mod cache;
mod loader;
pub mod probe;
mod record;
mod require;
mod resolver;
pub mod sandbox;

pub use cache::ModuleCache;
pub use loader::{ModuleLoader, MAX_LOAD_DEPTH};
pub use probe::{Filesystem, MemoryFilesystem, OsFilesystem};
pub use record::ModuleRecord;
pub use require::make_require;
pub use resolver::{collapse_slashes, ModuleResolver, SpecifierKind, EXTENSIONS, MODULES_DIR};

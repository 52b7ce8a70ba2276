// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - resolves, caches and executes modules

use crate::error::{ModuleError, ModuleResult, ScriptError};
use crate::module_system::cache::ModuleCache;
use crate::module_system::probe::Filesystem;
use crate::module_system::record::ModuleRecord;
use crate::module_system::require::make_require;
use crate::module_system::resolver::ModuleResolver;
use crate::module_system::sandbox;
use nanoqt_script::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Deepest chain of module bodies allowed to be executing at once.
pub const MAX_LOAD_DEPTH: usize = 40;

struct LoaderState {
    fs: Rc<dyn Filesystem>,
    resolver: ModuleResolver,
    cache: ModuleCache,
    root: ModuleRecord,
    entry_dir: RefCell<Option<PathBuf>>,
    /// Module bodies currently executing
    depth: Cell<usize>,
}

/// Module loader
///
/// Cloning is cheap; clones share the cache, resolver and root context.
#[derive(Clone)]
pub struct ModuleLoader {
    state: Rc<LoaderState>,
}

/// Non-owning handle held by `require` functions.
#[derive(Clone)]
pub(crate) struct WeakLoader(Weak<LoaderState>);

impl WeakLoader {
    pub(crate) fn upgrade(&self) -> Option<ModuleLoader> {
        self.0.upgrade().map(|state| ModuleLoader { state })
    }
}

impl ModuleLoader {
    /// Create a loader over `fs` with the initial default module path
    pub fn new(fs: Rc<dyn Filesystem>, default_paths: Vec<PathBuf>) -> Self {
        Self {
            state: Rc::new(LoaderState {
                resolver: ModuleResolver::new(Rc::clone(&fs), default_paths),
                fs,
                cache: ModuleCache::new(),
                root: ModuleRecord::root(),
                entry_dir: RefCell::new(None),
                depth: Cell::new(0),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakLoader {
        WeakLoader(Rc::downgrade(&self.state))
    }

    /// Get the module resolver
    pub fn resolver(&self) -> &ModuleResolver {
        &self.state.resolver
    }

    /// Get the module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.state.cache
    }

    /// The root context record (`require.main`)
    pub fn root(&self) -> &ModuleRecord {
        &self.state.root
    }

    /// The filesystem probe
    pub fn filesystem(&self) -> &Rc<dyn Filesystem> {
        &self.state.fs
    }

    /// Declare the directory top-level code resolves relative specifiers against
    pub fn set_entry_dir(&self, dir: Option<PathBuf>) {
        *self.state.entry_dir.borrow_mut() = dir;
    }

    /// The declared entry directory, if any
    pub fn entry_dir(&self) -> Option<PathBuf> {
        self.state.entry_dir.borrow().clone()
    }

    /// Base directory for requires issued by `record`.
    ///
    /// Records without a usable filename (the root context) fall back to
    /// the entry directory, then to the probe's working directory.
    pub fn base_dir(&self, record: &ModuleRecord) -> PathBuf {
        record
            .base_dir()
            .or_else(|| self.entry_dir())
            .or_else(|| self.state.fs.current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    /// Resolve a specifier on behalf of `requester` without loading it
    pub fn resolve(&self, specifier: &str, requester: &ModuleRecord) -> ModuleResult<PathBuf> {
        self.state
            .resolver
            .resolve(specifier, &self.base_dir(requester))
    }

    /// Load a module on behalf of `requester` and return its exports.
    ///
    /// The new record is cached before its body runs, so a cycle back to
    /// a module still executing sees that module's exports as they stand.
    /// Failed modules stay cached and are never executed again.
    pub fn load(&self, specifier: &str, requester: &ModuleRecord) -> ModuleResult<Value> {
        let path = self.resolve(specifier, requester)?;
        let canonical = self
            .state
            .fs
            .canonicalize(&path)
            .map_err(|source| ModuleError::Read {
                specifier: specifier.to_string(),
                path: path.clone(),
                source,
            })?;

        // Cache keys and `module.filename` are strings
        if canonical.to_str().is_none() {
            return Err(ModuleError::Read {
                specifier: specifier.to_string(),
                path: canonical,
                source: io::Error::new(io::ErrorKind::InvalidData, "module path is not valid UTF-8"),
            });
        }

        if let Some(record) = self.state.cache.get(&canonical) {
            debug!(specifier, path = %canonical.display(), "module cache hit");
            return Ok(record.exports());
        }

        let depth = self.state.depth.get();
        if depth >= MAX_LOAD_DEPTH {
            warn!(specifier, depth, "require chain too deep");
            return Err(ModuleError::Execution {
                specifier: specifier.to_string(),
                path: canonical,
                source: ScriptError::Range("Maximum call stack size exceeded".to_string()),
            });
        }

        let record = ModuleRecord::new(&canonical);
        self.state.cache.insert(&canonical, &record);
        debug!(specifier, path = %canonical.display(), "loading module");

        let body = self
            .state
            .fs
            .read_to_string(&canonical)
            .map_err(|source| {
                warn!(path = %canonical.display(), error = %source, "failed to read module");
                ModuleError::Read {
                    specifier: specifier.to_string(),
                    path: canonical.clone(),
                    source,
                }
            })?;

        let require = make_require(self, &record);
        self.state.depth.set(depth + 1);
        let result = sandbox::execute(&body, &record, require);
        self.state.depth.set(depth);

        if let Err(source) = result {
            warn!(path = %canonical.display(), error = %source, "module body failed; entry kept");
            return Err(ModuleError::Execution {
                specifier: specifier.to_string(),
                path: canonical,
                source,
            });
        }

        debug!(path = %canonical.display(), "module loaded");
        Ok(record.exports())
    }

    /// Load a module on behalf of the root context
    pub fn require(&self, specifier: &str) -> ModuleResult<Value> {
        self.load(specifier, self.root())
    }

    /// Build a `require` function bound to `record`
    pub fn make_require(&self, record: &ModuleRecord) -> Value {
        make_require(self, record)
    }

    /// Paths of every cached module
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.state.cache.paths()
    }

    /// True if the module at `path` (canonical) has been loaded or is loading
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.state.cache.contains(path)
    }
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("resolver", &self.state.resolver)
            .field("cached", &self.state.cache.len())
            .field("entry_dir", &self.state.entry_dir.borrow())
            .finish()
    }
}

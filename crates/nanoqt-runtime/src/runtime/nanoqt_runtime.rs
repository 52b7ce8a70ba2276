// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Main runtime implementation

use crate::config::Config;
use crate::error::{Result, RuntimeError};
use crate::module_system::{
    Filesystem, ModuleCache, ModuleLoader, ModuleRecord, OsFilesystem, make_require,
};
use nanoqt_script::{Engine, Value};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Top-level execution environment.
///
/// Owns the module loader and an engine whose global scope is the root
/// context: `module` is the root record, `exports` its exports object and
/// `require` resolves relative to the entry directory. Bindings made by
/// one [`eval`](Runtime::eval) are visible to the next.
pub struct Runtime {
    /// Configuration the runtime was built from
    config: Config,
    /// Module loader and cache
    loader: ModuleLoader,
    /// Engine running top-level code
    engine: Engine,
}

impl Runtime {
    /// Create a runtime on the host filesystem
    pub fn new(config: Config) -> Self {
        Self::with_filesystem(config, Rc::new(OsFilesystem))
    }

    /// Create a runtime that probes and reads through `fs`
    pub fn with_filesystem(config: Config, fs: Rc<dyn Filesystem>) -> Self {
        let loader = ModuleLoader::new(fs, config.module_path.clone());
        loader.set_entry_dir(config.entry_dir.clone());

        let root = loader.root();
        let mut engine = Engine::new();
        engine.define("module", root.to_value());
        engine.define("exports", root.exports());
        engine.define("require", make_require(&loader, root));

        debug!(
            module_path = ?config.module_path,
            entry_dir = ?config.entry_dir,
            "runtime created"
        );

        Self {
            config,
            loader,
            engine,
        }
    }

    /// Evaluate top-level code as the root context
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        Ok(self.engine.eval(source)?)
    }

    /// Run a script file as the root context.
    ///
    /// The file's directory becomes the entry directory, so relative
    /// requires in the script resolve next to it.
    pub fn run_file(&mut self, path: &Path) -> Result<Value> {
        let fs = Rc::clone(self.loader.filesystem());
        let io_error = |source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        };

        let canonical = fs.canonicalize(path).map_err(io_error)?;
        let source = fs.read_to_string(&canonical).map_err(io_error)?;

        if let Some(dir) = canonical.parent() {
            self.set_entry_dir(dir);
        }
        debug!(path = %canonical.display(), "running script");
        self.eval(&source)
    }

    /// Load a module from the root context
    pub fn require(&self, specifier: &str) -> Result<Value> {
        Ok(self.loader.require(specifier)?)
    }

    /// Resolve a specifier from the root context without loading it
    pub fn resolve(&self, specifier: &str) -> Result<PathBuf> {
        Ok(self.loader.resolve(specifier, self.loader.root())?)
    }

    /// Directories searched for `specifier` from the root context
    pub fn search_path(&self, specifier: &str) -> Vec<PathBuf> {
        let base_dir = self.loader.base_dir(self.loader.root());
        self.loader.resolver().search_path(specifier, &base_dir)
    }

    /// Append a directory to the global default module path
    pub fn append_module_path(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        debug!(dir = %dir.display(), "module path appended");
        self.loader.resolver().push_default_path(dir);
    }

    /// Declare the entry directory for top-level requires
    pub fn set_entry_dir(&self, dir: impl Into<PathBuf>) {
        self.loader.set_entry_dir(Some(dir.into()));
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the module loader
    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// Get the module cache
    pub fn cache(&self) -> &ModuleCache {
        self.loader.cache()
    }

    /// The root context record
    pub fn root(&self) -> &ModuleRecord {
        self.loader.root()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::MemoryFilesystem;

    fn runtime(fs: MemoryFilesystem) -> Runtime {
        let config = Config {
            entry_dir: Some(PathBuf::from("/proj")),
            ..Config::default()
        };
        Runtime::with_filesystem(config, Rc::new(fs))
    }

    #[test]
    fn test_eval_keeps_bindings() {
        let mut runtime = runtime(MemoryFilesystem::new());
        runtime.eval("var x = 20").unwrap();
        assert_eq!(runtime.eval("x + 1").unwrap(), Value::Number(21.0));
    }

    #[test]
    fn test_root_context_bindings() {
        let mut runtime = runtime(MemoryFilesystem::new());
        assert_eq!(
            runtime.eval("require.main === module && module.filename === null").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(runtime.root().exports(), runtime.eval("exports").unwrap());
    }

    #[test]
    fn test_require_and_resolve_from_root() {
        let runtime = runtime(MemoryFilesystem::new().file("/proj/lib/util.js", "exports.ok = true"));
        assert_eq!(
            runtime.resolve("./lib/util").unwrap(),
            PathBuf::from("/proj/lib/util.js")
        );
        let exports = runtime.require("./lib/util").unwrap();
        assert_eq!(exports.as_object().unwrap().get("ok"), Value::Boolean(true));
        assert_eq!(runtime.cache().len(), 1);
    }

    #[test]
    fn test_append_module_path() {
        let runtime = runtime(MemoryFilesystem::new().file("/shared/dep.js", ""));
        assert!(matches!(runtime.require("dep"), Err(RuntimeError::Module(_))));
        runtime.append_module_path("/shared");
        assert!(runtime.require("dep").is_ok());
        assert_eq!(runtime.search_path("dep").last(), Some(&PathBuf::from("/shared")));
    }

    #[test]
    fn test_run_file_sets_entry_dir() {
        let mut runtime = runtime(
            MemoryFilesystem::new()
                .file("/scripts/main.js", "require('./helper').answer")
                .file("/scripts/helper.js", "exports.answer = 42"),
        );
        let result = runtime.run_file(Path::new("/scripts/main.js")).unwrap();
        assert_eq!(result, Value::Number(42.0));
        assert_eq!(runtime.loader().entry_dir(), Some(PathBuf::from("/scripts")));
    }

    #[test]
    fn test_run_missing_file() {
        let mut runtime = runtime(MemoryFilesystem::new());
        assert!(matches!(
            runtime.run_file(Path::new("/nope.js")),
            Err(RuntimeError::Io { .. })
        ));
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution

use crate::error::{ModuleError, ModuleResult};
use crate::module_system::probe::Filesystem;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, trace};

/// Directory name searched for bare specifiers.
pub const MODULES_DIR: &str = "nanoqt_modules";

/// Suffixes tried, in order, for every search directory.
pub const EXTENSIONS: [&str; 3] = ["", ".js", "/index.js"];

/// How a specifier is located, derived from where it contains `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Starts with `/`
    Absolute,
    /// Contains `/` elsewhere
    Relative,
    /// No `/` at all
    Bare,
}

impl SpecifierKind {
    /// Classify a specifier
    pub fn of(specifier: &str) -> Self {
        if specifier.starts_with('/') {
            SpecifierKind::Absolute
        } else if specifier.contains('/') {
            SpecifierKind::Relative
        } else {
            SpecifierKind::Bare
        }
    }
}

/// Resolves specifiers to files.
///
/// Holds the global default module path, which only ever grows.
pub struct ModuleResolver {
    fs: Rc<dyn Filesystem>,
    default_paths: RefCell<Vec<PathBuf>>,
}

impl ModuleResolver {
    /// Create a resolver probing `fs` with an initial default module path
    pub fn new(fs: Rc<dyn Filesystem>, default_paths: Vec<PathBuf>) -> Self {
        Self {
            fs,
            default_paths: RefCell::new(default_paths),
        }
    }

    /// Append a directory to the default module path
    pub fn push_default_path(&self, dir: impl Into<PathBuf>) {
        self.default_paths.borrow_mut().push(dir.into());
    }

    /// The default module path, in search order
    pub fn default_paths(&self) -> Vec<PathBuf> {
        self.default_paths.borrow().clone()
    }

    /// Directories searched for `specifier`, in order.
    pub fn search_path(&self, specifier: &str, base_dir: &Path) -> Vec<PathBuf> {
        match SpecifierKind::of(specifier) {
            SpecifierKind::Absolute => vec![PathBuf::from("/")],
            SpecifierKind::Relative => vec![base_dir.to_path_buf()],
            SpecifierKind::Bare => base_dir
                .ancestors()
                .filter(|dir| !dir.as_os_str().is_empty())
                .filter(|dir| dir.file_name() != Some(OsStr::new(MODULES_DIR)))
                .map(|dir| dir.join(MODULES_DIR))
                .chain(self.default_paths.borrow().iter().cloned())
                .collect(),
        }
    }

    /// Every path probed for `specifier`, in order.
    ///
    /// Search directories that are not valid UTF-8 contribute no
    /// candidates.
    pub fn candidates(&self, specifier: &str, base_dir: &Path) -> Vec<PathBuf> {
        self.search_path(specifier, base_dir)
            .into_iter()
            .filter_map(|dir| match dir.to_str() {
                Some(dir) => Some(format!("{}/{}", dir, specifier)),
                None => {
                    trace!(dir = %dir.display(), "skipping non-UTF-8 search directory");
                    None
                }
            })
            .flat_map(|base| {
                EXTENSIONS
                    .into_iter()
                    .map(move |ext| PathBuf::from(collapse_slashes(&format!("{}{}", base, ext))))
            })
            .collect()
    }

    /// Resolve a specifier to the first candidate that is a regular file.
    ///
    /// The returned path is not canonicalized.
    pub fn resolve(&self, specifier: &str, base_dir: &Path) -> ModuleResult<PathBuf> {
        for candidate in self.candidates(specifier, base_dir) {
            trace!(candidate = %candidate.display(), "probing");
            if self.fs.is_file(&candidate) {
                debug!(specifier, path = %candidate.display(), "resolved module");
                return Ok(candidate);
            }
        }

        debug!(specifier, base_dir = %base_dir.display(), "module not found");
        Err(ModuleError::not_found(specifier))
    }
}

impl fmt::Debug for ModuleResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("default_paths", &self.default_paths.borrow())
            .finish_non_exhaustive()
    }
}

/// Replaces every run of `/` with a single `/`.
pub fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

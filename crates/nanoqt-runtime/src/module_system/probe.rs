// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Filesystem access used by the resolver and loader

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// The filesystem operations the module system needs.
pub trait Filesystem {
    /// True if `path` names a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool;

    /// Absolute path with symlinks and `.`/`..` segments resolved.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Reads a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Working directory used when top-level code has no entry directory.
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

/// Symlink chains longer than this fail with an error.
const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File(String),
    Symlink(PathBuf),
}

/// An in-memory file tree.
///
/// Directories exist implicitly as the parents of files and links.
/// Every successful read is counted per canonical path, so callers can
/// check how often a module body was fetched.
#[derive(Debug)]
pub struct MemoryFilesystem {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    reads: RefCell<BTreeMap<PathBuf, usize>>,
    cwd: PathBuf,
}

impl MemoryFilesystem {
    /// Creates an empty tree whose working directory is `/`.
    pub fn new() -> Self {
        Self::with_current_dir("/")
    }

    /// Creates an empty tree with the given working directory.
    pub fn with_current_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            nodes: RefCell::new(BTreeMap::new()),
            reads: RefCell::new(BTreeMap::new()),
            cwd: cwd.into(),
        }
    }

    /// Adds (or replaces) a file.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = self.absolute(path.as_ref());
        self.nodes.borrow_mut().insert(path, Node::File(contents.into()));
    }

    /// Adds a symlink at `link` pointing to `target`.
    ///
    /// Relative targets are interpreted against the link's directory.
    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl Into<PathBuf>) {
        let link = self.absolute(link.as_ref());
        self.nodes.borrow_mut().insert(link, Node::Symlink(target.into()));
    }

    /// Builder form of [`add_file`](Self::add_file).
    pub fn file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.add_file(path, contents);
        self
    }

    /// Builder form of [`add_symlink`](Self::add_symlink).
    pub fn symlink(self, link: impl AsRef<Path>, target: impl Into<PathBuf>) -> Self {
        self.add_symlink(link, target);
        self
    }

    /// Number of successful reads of the file at `path`.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let Ok(canonical) = self.canonicalize(path.as_ref()) else {
            return 0;
        };
        self.reads.borrow().get(&canonical).copied().unwrap_or(0)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.parent().is_none()
            || self
                .nodes
                .borrow()
                .keys()
                .any(|key| key != path && key.starts_with(path))
    }

    /// Resolves every symlink along `path` without checking the result exists.
    fn resolve_links(&self, path: &Path, hops: &mut usize) -> io::Result<PathBuf> {
        let mut resolved = PathBuf::from("/");

        for component in self.absolute(path).components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => {
                    resolved.push(name);
                    let target = match self.nodes.borrow().get(&resolved) {
                        Some(Node::Symlink(target)) => target.clone(),
                        _ => continue,
                    };

                    *hops += 1;
                    if *hops > MAX_SYMLINK_HOPS {
                        return Err(io::Error::other(format!(
                            "too many levels of symbolic links: {}",
                            path.display()
                        )));
                    }
                    resolved.pop();
                    let target = resolved.join(target);
                    resolved = self.resolve_links(&target, hops)?;
                }
            }
        }

        Ok(resolved)
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFilesystem {
    fn is_file(&self, path: &Path) -> bool {
        match self.canonicalize(path) {
            Ok(canonical) => matches!(self.nodes.borrow().get(&canonical), Some(Node::File(_))),
            Err(_) => false,
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let resolved = self.resolve_links(path, &mut 0)?;
        if self.nodes.borrow().contains_key(&resolved) || self.is_dir(&resolved) {
            Ok(resolved)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {}", path.display()),
            ))
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let canonical = self.canonicalize(path)?;
        let contents = match self.nodes.borrow().get(&canonical) {
            Some(Node::File(contents)) => contents.clone(),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a regular file: {}", path.display()),
                ));
            }
        };
        *self.reads.borrow_mut().entry(canonical).or_insert(0) += 1;
        Ok(contents)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.cwd.clone())
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use crate::module_system::record::ModuleRecord;
use nanoqt_script::{ObjectRef, Value};
use std::path::{Path, PathBuf};

/// Canonical path to module record.
///
/// Entries live in a script object keyed by path string, which is the
/// same object scripts see as `require.cache`. There is no removal:
/// once a path is present, `require` never executes that file again.
///
/// Paths must be valid UTF-8; the loader rejects any other canonical
/// path before it reaches the cache.
#[derive(Debug, Clone)]
pub struct ModuleCache {
    entries: ObjectRef,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            entries: ObjectRef::new(),
        }
    }

    /// Get a cached module by canonical path
    pub fn get(&self, path: &Path) -> Option<ModuleRecord> {
        match self.entries.get(&key(path)) {
            Value::Object(object) => Some(ModuleRecord::from_object(object)),
            _ => None,
        }
    }

    /// Check if a module is cached
    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// Add a module to the cache
    pub fn insert(&self, path: &Path, record: &ModuleRecord) {
        // Scripts cannot make cache entries read-only.
        let _ = self.entries.set(&key(path), record.to_value());
    }

    /// Get all cached module paths, in insertion order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.keys().into_iter().map(PathBuf::from).collect()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The script object backing the cache (`require.cache`).
    pub fn as_object(&self) -> &ObjectRef {
        &self.entries
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache = ModuleCache::new();
        let path = Path::new("/proj/a.js");
        assert!(cache.is_empty());
        assert!(cache.get(path).is_none());

        let record = ModuleRecord::new(path);
        cache.insert(path, &record);

        assert!(cache.contains(path));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(path), Some(record));
        assert_eq!(cache.paths(), vec![PathBuf::from("/proj/a.js")]);
    }

    #[test]
    fn test_backing_object_is_shared() {
        let cache = ModuleCache::new();
        let path = Path::new("/proj/b.js");
        cache.insert(path, &ModuleRecord::new(path));

        let handle = cache.as_object().clone();
        let entry = handle.get("/proj/b.js");
        let record = cache.get(path).unwrap();
        assert_eq!(entry, record.to_value());
    }

    #[test]
    fn test_non_object_entries_are_ignored() {
        let cache = ModuleCache::new();
        cache.as_object().set("/proj/c.js", Value::from(1.0)).unwrap();
        assert!(cache.get(Path::new("/proj/c.js")).is_none());
    }
}

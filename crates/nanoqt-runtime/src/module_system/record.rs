// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records, the `module` object seen by a module body

use nanoqt_script::{ObjectRef, Value};
use std::path::{Path, PathBuf};

/// In-memory identity of a loaded module.
///
/// A record is a script object `{ exports, filename }`. Cloning a record
/// clones the handle, not the object, so every clone observes the same
/// `exports` even after the body reassigns `module.exports`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    object: ObjectRef,
}

impl ModuleRecord {
    /// Creates a record with empty exports for the file at `filename`.
    pub fn new(filename: &Path) -> Self {
        Self::build(Value::from(filename.to_string_lossy().into_owned()))
    }

    /// Creates the root context record, which has no file.
    pub fn root() -> Self {
        Self::build(Value::Null)
    }

    fn build(filename: Value) -> Self {
        let object = ObjectRef::new();
        // Fresh objects accept any write.
        let _ = object.set("exports", Value::object());
        let _ = object.set("filename", filename);
        Self { object }
    }

    /// Wraps an existing script object as a record.
    pub fn from_object(object: ObjectRef) -> Self {
        Self { object }
    }

    /// The backing script object.
    pub fn as_object(&self) -> &ObjectRef {
        &self.object
    }

    /// The record as a script value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    /// Current value of `module.exports`.
    pub fn exports(&self) -> Value {
        self.object.get("exports")
    }

    /// Current value of `module.filename`, if it is a string.
    pub fn filename(&self) -> Option<String> {
        self.object.get("filename").as_str().map(str::to_string)
    }

    /// True for the root context record.
    pub fn is_root(&self) -> bool {
        self.object.get("filename").is_null()
    }

    /// Directory that relative specifiers resolve against.
    ///
    /// This is everything before the last `/` of `filename`, or `/` for a
    /// file directly under the root. `None` when the record has no
    /// filename or the filename holds no `/`.
    pub fn base_dir(&self) -> Option<PathBuf> {
        let filename = self.filename()?;
        match filename.rfind('/')? {
            0 => Some(PathBuf::from("/")),
            slash => Some(PathBuf::from(&filename[..slash])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_shape() {
        let record = ModuleRecord::new(Path::new("/proj/a.js"));
        assert_eq!(record.filename().as_deref(), Some("/proj/a.js"));
        assert!(record.exports().as_object().is_some_and(ObjectRef::is_empty));
        assert!(!record.is_root());
    }

    #[test]
    fn test_root_record_has_null_filename() {
        let root = ModuleRecord::root();
        assert!(root.is_root());
        assert_eq!(root.filename(), None);
        assert_eq!(root.base_dir(), None);
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(
            ModuleRecord::new(Path::new("/proj/lib/a.js")).base_dir(),
            Some(PathBuf::from("/proj/lib"))
        );
        assert_eq!(
            ModuleRecord::new(Path::new("/top.js")).base_dir(),
            Some(PathBuf::from("/"))
        );
        assert_eq!(ModuleRecord::new(Path::new("untitled")).base_dir(), None);
    }

    #[test]
    fn test_clones_share_exports() {
        let record = ModuleRecord::new(Path::new("/proj/a.js"));
        let alias = record.clone();
        record.as_object().set("exports", Value::from(7.0)).unwrap();
        assert_eq!(alias.exports(), Value::Number(7.0));
        assert_eq!(record, alias);
    }
}

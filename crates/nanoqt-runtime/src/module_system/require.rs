// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `require` function handed to module bodies

use crate::error::{ModuleError, ScriptError};
use crate::module_system::loader::{ModuleLoader, WeakLoader};
use crate::module_system::record::ModuleRecord;
use nanoqt_script::runtime::{Callable, NativeFn};
use nanoqt_script::{ObjectRef, Value};
use std::path::PathBuf;
use std::rc::Rc;

/// Builds the `require` function bound to `record`.
///
/// `require(specifier)` loads on behalf of `record`. The function carries
/// read-only `main` (the root context), `cache` (the module cache object)
/// and `resolve(specifier[, base_dir])`.
pub fn make_require(loader: &ModuleLoader, record: &ModuleRecord) -> Value {
    let weak = loader.downgrade();
    let owner = record.clone();
    let require: Rc<NativeFn> = Rc::new(move |args: &[Value]| {
        let loader = upgrade(&weak)?;
        let specifier = specifier_arg(args)?;
        loader
            .load(specifier, &owner)
            .map_err(ModuleError::into_script_error)
    });

    let function = ObjectRef::function(Callable::Native {
        name: "require".to_string(),
        func: require,
    });
    function.define_readonly("main", loader.root().to_value());
    function.define_readonly("cache", Value::Object(loader.cache().as_object().clone()));
    function.define_readonly("resolve", make_resolve(loader, record));
    Value::Object(function)
}

fn make_resolve(loader: &ModuleLoader, record: &ModuleRecord) -> Value {
    let weak = loader.downgrade();
    let owner = record.clone();
    Value::native_function("resolve", move |args| {
        let loader = upgrade(&weak)?;
        let specifier = specifier_arg(args)?;
        let base_dir = match args.get(1) {
            Some(Value::String(dir)) => PathBuf::from(dir),
            _ => loader.base_dir(&owner),
        };
        Ok(match loader.resolver().resolve(specifier, &base_dir) {
            Ok(path) => Value::from(path.to_string_lossy().into_owned()),
            Err(_) => Value::Null,
        })
    })
}

fn upgrade(weak: &WeakLoader) -> Result<ModuleLoader, ScriptError> {
    weak.upgrade()
        .ok_or_else(|| ScriptError::throw("require() called after its runtime was dropped"))
}

fn specifier_arg(args: &[Value]) -> Result<&str, ScriptError> {
    match args.first() {
        Some(Value::String(specifier)) => Ok(specifier),
        Some(other) => Err(ScriptError::type_error(format!(
            "The \"id\" argument must be of type string. Received {}",
            other.type_of()
        ))),
        None => Err(ScriptError::type_error(
            "The \"id\" argument must be of type string. Received undefined",
        )),
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Isolated execution of a module body

use crate::module_system::record::ModuleRecord;
use nanoqt_script::{Interpreter, Scope, Value};

/// Runs `source` as the body of `record`.
///
/// The body gets a fresh global scope holding exactly `module` (the
/// record), `exports` (the record's current exports object) and
/// `require`. Nothing declared by one body is visible to another.
pub fn execute(
    source: &str,
    record: &ModuleRecord,
    require: Value,
) -> nanoqt_script::Result<Value> {
    let program = nanoqt_script::parse(source)?;

    let scope = Scope::global();
    scope.declare("module", record.to_value(), true);
    scope.declare("exports", record.exports(), true);
    scope.declare("require", require, true);

    Interpreter::new().run(&program, &scope)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! End-to-end module loading over an in-memory tree.

use nanoqt_runtime::module_system::MAX_LOAD_DEPTH;
use nanoqt_runtime::{
    Config, MemoryFilesystem, ModuleError, Runtime, RuntimeError, ScriptError, Value,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn runtime_at(entry_dir: &str, fs: MemoryFilesystem) -> (Runtime, Rc<MemoryFilesystem>) {
    let fs = Rc::new(fs);
    let config = Config {
        entry_dir: Some(PathBuf::from(entry_dir)),
        ..Config::default()
    };
    let runtime = Runtime::with_filesystem(config, fs.clone());
    (runtime, fs)
}

fn prop(value: &Value, key: &str) -> Value {
    value.as_object().expect("exports object").get(key)
}

#[test]
fn scenario_bare_require_from_root() {
    let (mut runtime, _) = runtime_at(
        "/",
        MemoryFilesystem::new()
            .file("/proj/app.js", "require(\"lib\").value")
            .file("/proj/nanoqt_modules/lib.js", "exports.value = 42"),
    );

    let result = runtime.run_file(Path::new("/proj/app.js")).unwrap();
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn scenario_circular_require() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/a.js", "exports.x = 1; require(\"./b\")")
            .file("/proj/b.js", "exports.y = require(\"./a\").x"),
    );

    let a = runtime.require("./a").unwrap();
    let a = a.as_object().unwrap();
    assert_eq!(a.keys(), vec!["x".to_string()]);
    assert_eq!(a.get("x"), Value::Number(1.0));

    let b = runtime.cache().get(Path::new("/proj/b.js")).unwrap();
    assert_eq!(prop(&b.exports(), "y"), Value::Number(1.0));
}

#[test]
fn scenario_missing_module() {
    let (runtime, _) = runtime_at("/proj", MemoryFilesystem::new());

    let error = runtime.require("missing_module").unwrap_err();
    let RuntimeError::Module(error) = error else {
        panic!("expected module error");
    };
    assert!(matches!(&error, ModuleError::NotFound(s) if s == "missing_module"));
    assert_eq!(error.to_string(), "Cannot find module 'missing_module'");
}

#[test]
fn cycle_sees_partial_then_final_exports() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file(
                "/proj/a.js",
                "exports.early = true; var b = require('./b'); exports.late = true",
            )
            .file(
                "/proj/b.js",
                "var a = require('./a'); exports.sawLate = 'late' in a; exports.a = a",
            ),
    );

    let a = runtime.require("./a").unwrap();
    let b = runtime.require("./b").unwrap();

    // b observed a mid-construction, but holds the very same object.
    assert_eq!(prop(&b, "sawLate"), Value::Boolean(false));
    assert_eq!(prop(&b, "a"), a);
    assert_eq!(prop(&prop(&b, "a"), "late"), Value::Boolean(true));
}

#[test]
fn same_file_through_different_specifiers_is_one_module() {
    let (runtime, fs) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/lib/shared.js", "exports.id = {}")
            .symlink("/proj/alias", "/proj/lib")
            .file("/proj/nanoqt_modules/shared.js", "module.exports = require('../lib/shared')"),
    );

    let via_relative = runtime.require("./lib/shared").unwrap();
    let via_extension = runtime.require("./lib/shared.js").unwrap();
    let via_absolute = runtime.require("/proj/lib/shared").unwrap();
    let via_symlink = runtime.require("./alias/shared").unwrap();
    let via_bare = runtime.require("shared").unwrap();

    assert_eq!(via_relative, via_extension);
    assert_eq!(via_relative, via_absolute);
    assert_eq!(via_relative, via_symlink);
    assert_eq!(via_relative, via_bare);
    assert_eq!(fs.read_count("/proj/lib/shared.js"), 1);
}

#[test]
fn exact_name_beats_js_extension() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/nanoqt_modules/foo", "exports.which = 'plain'")
            .file("/proj/nanoqt_modules/foo.js", "exports.which = 'js'"),
    );
    assert_eq!(prop(&runtime.require("foo").unwrap(), "which"), Value::from("plain"));
}

#[test]
fn js_extension_beats_index() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/pkg.js", "exports.which = 'file'")
            .file("/proj/pkg/index.js", "exports.which = 'index'"),
    );
    assert_eq!(prop(&runtime.require("./pkg").unwrap(), "which"), Value::from("file"));
}

#[test]
fn nearer_modules_dir_wins() {
    let (runtime, _) = runtime_at(
        "/",
        MemoryFilesystem::new()
            .file("/proj/src/main.js", "module.exports = require('dep')")
            .file("/proj/src/nanoqt_modules/dep.js", "exports.level = 'src'")
            .file("/proj/nanoqt_modules/dep.js", "exports.level = 'proj'"),
    );
    let exports = runtime.require("/proj/src/main").unwrap();
    assert_eq!(prop(&exports, "level"), Value::from("src"));
}

#[test]
fn packages_find_siblings_in_enclosing_modules_dir() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/nanoqt_modules/app/index.js", "module.exports = require('util')")
            .file("/proj/nanoqt_modules/util.js", "exports.name = 'util'"),
    );
    let exports = runtime.require("app").unwrap();
    assert_eq!(prop(&exports, "name"), Value::from("util"));
}

#[test]
fn relative_specifier_never_searches_modules_dirs() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new().file("/proj/nanoqt_modules/sub/x.js", ""),
    );
    assert!(runtime.resolve("sub/x").is_err());
    assert!(runtime.resolve("nanoqt_modules/sub/x").is_ok());
}

#[test]
fn absolute_specifier_ignores_base_dir() {
    let (runtime, _) = runtime_at(
        "/somewhere/else",
        MemoryFilesystem::new()
            .file("/lib/abs.js", "")
            .file("/somewhere/else/lib/abs.js", ""),
    );
    assert_eq!(runtime.resolve("/lib/abs").unwrap(), PathBuf::from("/lib/abs.js"));
}

#[test]
fn default_module_path_is_searched_last() {
    let fs = Rc::new(
        MemoryFilesystem::new()
            .file("/opt/nanoqt/shared.js", "exports.from = 'default'")
            .file("/opt/extra/late.js", "exports.from = 'appended'")
            .file("/proj/nanoqt_modules/shared.js", "exports.from = 'local'"),
    );
    let config = Config {
        module_path: vec![PathBuf::from("/opt/nanoqt")],
        entry_dir: Some(PathBuf::from("/proj")),
        ..Config::default()
    };
    let runtime = Runtime::with_filesystem(config, fs);

    assert_eq!(prop(&runtime.require("shared").unwrap(), "from"), Value::from("local"));
    assert!(runtime.require("late").is_err());
    runtime.append_module_path("/opt/extra");
    assert_eq!(prop(&runtime.require("late").unwrap(), "from"), Value::from("appended"));
}

#[test]
fn failing_module_runs_once() {
    let (mut runtime, fs) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/counter.js", "exports.runs = 0")
            .file(
                "/proj/flaky.js",
                "require('./counter').runs += 1; exports.before = true; throw new_error()",
            ),
    );

    let first = runtime.require("./flaky").unwrap_err();
    let RuntimeError::Module(first) = first else {
        panic!("expected module error");
    };
    assert!(first.is_execution_failure());
    assert!(matches!(
        &first,
        ModuleError::Execution { source: ScriptError::Reference(_), .. }
    ));

    let second = runtime.require("./flaky").unwrap();
    assert_eq!(prop(&second, "before"), Value::Boolean(true));
    assert_eq!(
        runtime.eval("require('./counter').runs").unwrap(),
        Value::Number(1.0)
    );
    assert_eq!(fs.read_count("/proj/flaky.js"), 1);
}

#[test]
fn thrown_value_propagates_through_nested_loads() {
    let (mut runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/outer.js", "require('./middle')")
            .file("/proj/middle.js", "require('./inner')")
            .file("/proj/inner.js", "throw { tag: 'inner' }"),
    );

    let caught = runtime
        .eval("try { require('./outer') } catch (e) { e.tag }")
        .unwrap();
    assert_eq!(caught, Value::from("inner"));
}

#[test]
fn not_found_inside_module_reports_specifier() {
    let (mut runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new().file("/proj/a.js", "require('./nowhere')"),
    );

    let result = runtime
        .eval("try { require('./a') } catch (e) { e.code + ':' + e.specifier }")
        .unwrap();
    assert_eq!(result, Value::from("MODULE_NOT_FOUND:./nowhere"));
}

#[test]
fn require_main_is_module_only_at_top_level() {
    let (mut runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new().file(
            "/proj/check.js",
            "exports.isMain = require.main === module; exports.main = require.main",
        ),
    );

    assert_eq!(runtime.eval("require.main === module").unwrap(), Value::Boolean(true));
    let exports = runtime.require("./check").unwrap();
    assert_eq!(prop(&exports, "isMain"), Value::Boolean(false));
    assert_eq!(prop(&exports, "main"), runtime.root().to_value());
}

#[test]
fn require_cache_is_the_live_cache() {
    let (mut runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new().file("/proj/m.js", "exports.v = 1"),
    );

    runtime.eval("require('./m')").unwrap();
    assert_eq!(
        runtime
            .eval("require.cache['/proj/m.js'].filename")
            .unwrap(),
        Value::from("/proj/m.js")
    );

    // Entries are writable from scripts, as the cache is shared.
    runtime
        .eval("require.cache['/proj/m.js'].exports = 'patched'")
        .unwrap();
    assert_eq!(runtime.require("./m").unwrap(), Value::from("patched"));
}

#[test]
fn modules_do_not_see_top_level_bindings() {
    let (mut runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new().file("/proj/peek.js", "exports.seen = typeof secret"),
    );

    runtime.eval("var secret = 1").unwrap();
    let exports = runtime.require("./peek").unwrap();
    assert_eq!(prop(&exports, "seen"), Value::from("undefined"));
}

#[test]
fn module_filename_and_nested_relative_requires() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/proj/lib/a.js", "exports.b = require('./b'); exports.me = module.filename")
            .file("/proj/lib/b.js", "exports.me = module.filename"),
    );

    let a = runtime.require("./lib/a").unwrap();
    assert_eq!(prop(&a, "me"), Value::from("/proj/lib/a.js"));
    assert_eq!(prop(&prop(&a, "b"), "me"), Value::from("/proj/lib/b.js"));
}

#[test]
fn module_directly_under_root_resolves_against_root() {
    let (runtime, _) = runtime_at(
        "/proj",
        MemoryFilesystem::new()
            .file("/top.js", "module.exports = require('./sibling')")
            .file("/sibling.js", "exports.ok = true"),
    );
    assert_eq!(prop(&runtime.require("/top").unwrap(), "ok"), Value::Boolean(true));
}

#[test]
fn overly_deep_require_chain_fails_cleanly() {
    let chain = MAX_LOAD_DEPTH * 2;
    let fs = (0..chain).fold(MemoryFilesystem::new(), |fs, i| {
        fs.file(
            format!("/proj/m{}.js", i),
            format!("exports.v = require('./m{}').v + 1", i + 1),
        )
    });
    let fs = fs.file(format!("/proj/m{}.js", chain), "exports.v = 0");
    let (mut runtime, _) = runtime_at("/proj", fs);

    let error = runtime.require("./m0").unwrap_err();
    assert!(matches!(
        error,
        RuntimeError::Module(ModuleError::Execution { source: ScriptError::Range(_), .. })
    ));

    // The failure stopped short of this link, so it was never cached and
    // its own chain is still one module too deep.
    let entry = format!("./m{}", MAX_LOAD_DEPTH);
    let message = runtime
        .eval(&format!("try {{ require('{}') }} catch (e) {{ e.message }}", entry))
        .unwrap();
    assert_eq!(message, Value::from("Maximum call stack size exceeded"));
}

//! Session configuration, options, connections and dynamic libraries seen
//! through the public API.

mod common;

use std::collections::HashMap;
use std::io::Write;

use common::*;
use pretty_assertions::assert_eq;
use subset_r_vm::config::{CACHE_LIMIT_ENV, KEEP_SOURCE_ENV};
use subset_r_vm::prelude::*;

// ==================== Configuration ====================

#[test]
fn test_config_file_sets_options() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_warnings = 5\n\n[options]\ndigits = 4\nprompt = \"R> \"").unwrap();
    let config = SessionConfig::from_file(file.path()).unwrap();
    let mut vm = Vm::with_config(&config).unwrap();
    assert_eq!(
        call(&mut vm, "getOption", vec![Value::from("digits")]),
        Value::Integer(4)
    );
    assert_eq!(
        call(&mut vm, "getOption", vec![Value::from("prompt")]),
        Value::from("R> ")
    );
}

#[test]
fn test_config_rejects_bad_option() {
    let config = SessionConfig::from_toml_str("[options]\nwidth = 3\n").unwrap();
    let err = Vm::with_config(&config).unwrap_err();
    assert_eq!(err.to_string(), "option 'width': invalid value for 'width'");
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [(CACHE_LIMIT_ENV, "1"), (KEEP_SOURCE_ENV, "yes")].into();
    let config = SessionConfig::default()
        .with_overrides_from(|var| env.get(var).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(config.dispatch.cache_limit, 1);
    let mut vm = Vm::with_config(&config).unwrap();
    assert_eq!(
        call(&mut vm, "getOption", vec![Value::from("keep.source")]),
        Value::from(true)
    );

    let err = SessionConfig::default()
        .with_overrides_from(|var| (var == CACHE_LIMIT_ENV).then(|| "many".to_string()))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("invalid value 'many' for {}", CACHE_LIMIT_ENV)
    );
}

// ==================== Options ====================

#[test]
fn test_options_round_trip() {
    let mut vm = Vm::new();
    let old = vm
        .call_builtin(
            "options",
            vec![Arg::named("width", 120), Arg::named("my.flag", true)],
        )
        .unwrap();
    assert!(!vm.session().is_visible());
    assert_eq!(
        old,
        Value::named_list(vec![
            ("width".to_string(), Value::Integer(80)),
            ("my.flag".to_string(), Value::Null),
        ])
    );
    // restoring from the returned list
    vm.call_builtin("options", vec![Arg::positional(old)])
        .unwrap();
    assert_eq!(vm.session().options.integer("width"), Some(80));
    assert_eq!(vm.session().options.get("my.flag"), None);
}

#[test]
fn test_nwarnings_bounds_session_warnings() {
    let mut vm = Vm::new();
    vm.call_builtin("options", vec![Arg::named("nwarnings", 1)])
        .unwrap();
    call(&mut vm, "sqrt", vec![Value::Double(-1.0)]);
    call(&mut vm, "as.integer", vec![Value::from("x")]);
    assert_eq!(
        warning_messages(&vm),
        vec!["NAs introduced by coercion".to_string()]
    );
}

// ==================== Connections ====================

#[test]
fn test_write_then_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lines.txt");
    let path = path.to_str().unwrap();
    let mut vm = Vm::new();

    let con = call(&mut vm, "file", vec![Value::from(path), Value::from("w")]);
    call(&mut vm, "writeLines", vec![strings(&["alpha", "beta", "gamma"]), con.clone()]);
    call(&mut vm, "close", vec![con]);

    let con = call(&mut vm, "file", vec![Value::from(path), Value::from("r")]);
    let first = vm
        .call_builtin("readLines", vec![Arg::positional(con.clone()), Arg::named("n", 1)])
        .unwrap();
    assert_eq!(string_elements(&first), vec![Some("alpha".to_string())]);
    let rest = call(&mut vm, "readLines", vec![con.clone()]);
    assert_eq!(
        string_elements(&rest),
        vec![Some("beta".to_string()), Some("gamma".to_string())]
    );
    call(&mut vm, "close", vec![con]);
    assert!(vm.session().connections.is_empty());
}

#[test]
fn test_unknown_open_mode() {
    let err = call_err(
        &mut Vm::new(),
        "file",
        vec![Value::from("x.txt"), Value::from("r+")],
    );
    assert_eq!(err.message(), "unimplemented open mode: r+");
}

// ==================== Dynamic libraries ====================

#[derive(Debug, Default)]
struct TableLoader;

impl DllLoader for TableLoader {
    fn load(&mut self, path: &str, _local: bool, _now: bool) -> RResult<DllInfo> {
        if path.ends_with("missing.so") {
            return Err(RError::io_message(format!(
                "unable to load shared object '{}'",
                path
            )));
        }
        Ok(DllInfo::new(path)
            .with_symbol("R_init_pkg", 0x10)
            .with_symbol("C_fit", 0x20))
    }

    fn unload(&mut self, _info: &DllInfo) -> RResult<()> {
        Ok(())
    }
}

#[test]
fn test_pluggable_loader() {
    let mut vm = Vm::new();
    vm.session_mut().set_dll_loader(Box::new(TableLoader));

    let info = call(&mut vm, "dyn.load", vec![Value::from("/usr/lib/pkg.so")]);
    assert!(info.inherits("DLLInfo"));
    assert_eq!(
        call(&mut vm, "is.loaded", vec![Value::from("C_fit")]),
        Value::from(true)
    );

    let err = call_err(&mut vm, "dyn.load", vec![Value::from("/usr/lib/missing.so")]);
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(vm.session().dlls.loaded().len(), 1);

    call(&mut vm, "dyn.unload", vec![Value::from("/usr/lib/pkg.so")]);
    assert_eq!(
        call(&mut vm, "is.loaded", vec![Value::from("C_fit")]),
        Value::from(false)
    );
}

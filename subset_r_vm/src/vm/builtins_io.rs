//! Connection and dynamic library builtins.

use log::debug;
use subset_r_vm_runtime::{Logical, RError, RResult, Value};

use crate::builtins::{
    ArgCast, BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::dynload::is_dll_info;
use crate::io::{
    connection_id, connection_value, Connection, FileConnection, OpenMode, TextConnection, STDOUT,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{any_shapes, flag_arg, int_arg, string_arg, strings_of};

// ==================== textConnection, file, close ====================

fn character_first(s: &[ArgShape]) -> bool {
    matches!(s.first(), Some(x) if x.is_character())
}

fn text_connection(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let text = strings_of(&args[0])?;
    let conn = TextConnection::new("textConnection", text.as_slice());
    let class = conn.class();
    let id = session.connections.add(Box::new(conn));
    Ok(connection_value(id, class))
}

fn file(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let description = string_arg(&args[0], "description")?;
    let mode = OpenMode::parse(&string_arg(&args[1], "open")?)?;
    let conn = FileConnection::open(&description, mode)?;
    let class = conn.class();
    let id = session.connections.add(Box::new(conn));
    debug!("connection {} opened on '{}'", id, description);
    Ok(connection_value(id, class))
}

fn close(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let id = connection_id(&args[0], "con")?;
    session.connections.close(id)?;
    session.invisible(Value::Null)
}

pub(crate) static TEXT_CONNECTION: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::TextConnection,
    name: "textConnection",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("object")],
    specializations: &[Specialization {
        name: "text_connection",
        guard: character_first,
        body: text_connection,
    }],
    type_error: Some("invalid 'text' argument"),
};

pub(crate) static FILE: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::File,
    name: "file",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("description"),
        Parameter::new("open").optional(ParamDefault::Str("")),
    ],
    specializations: &[Specialization {
        name: "file",
        guard: character_first,
        body: file,
    }],
    type_error: Some("invalid 'description' argument"),
};

pub(crate) static CLOSE: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Close,
    name: "close",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("con")],
    specializations: &[Specialization {
        name: "close",
        guard: any_shapes,
        body: close,
    }],
    type_error: None,
};

// ==================== readLines, writeLines ====================

/// Run `f` on the connection `con` names. A file path is opened for the
/// duration of the call only.
fn with_connection<T>(
    session: &mut Session,
    con: &Value,
    f: impl FnOnce(&mut dyn Connection) -> RResult<T>,
) -> RResult<T> {
    match con {
        Value::Missing => f(session.connections.get_mut(STDOUT)?),
        Value::Character(_) => {
            let path = string_arg(con, "con")?;
            let mut conn = FileConnection::open(&path, None)?;
            f(&mut conn)
        }
        _ => {
            let id = connection_id(con, "con")?;
            f(session.connections.get_mut(id)?)
        }
    }
}

fn read_lines(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let n = int_arg(&args[1], "n")?;
    let ok = flag_arg(&args[2], "ok")?;
    let limit = usize::try_from(n).ok();
    let lines = with_connection(session, &args[0], |c| c.read_lines(limit))?;
    if let Some(limit) = limit {
        if !ok && lines.len() < limit {
            return Err(RError::io_message("too few lines read in readLines"));
        }
    }
    Ok(Value::string_vec(&lines))
}

fn write_lines(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let lines: Vec<String> = strings_of(&args[0])?
        .iter()
        .map(|s| s.as_display_str().to_string())
        .collect();
    let sep = string_arg(&args[2], "sep")?;
    with_connection(session, &args[1], |c| c.write_lines(&lines, &sep))?;
    session.invisible(Value::Null)
}

pub(crate) static READ_LINES: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::ReadLines,
    name: "readLines",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("con"),
        Parameter::new("n")
            .optional(ParamDefault::Integer(-1))
            .cast(ArgCast::ToInteger),
        Parameter::new("ok").optional(ParamDefault::Logical(true)),
    ],
    specializations: &[Specialization {
        name: "read_lines",
        guard: any_shapes,
        body: read_lines,
    }],
    type_error: None,
};

pub(crate) static WRITE_LINES: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::WriteLines,
    name: "writeLines",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("text"),
        Parameter::new("con").optional(ParamDefault::Missing),
        Parameter::new("sep").optional(ParamDefault::Str("\n")),
    ],
    specializations: &[Specialization {
        name: "write_lines",
        guard: character_first,
        body: write_lines,
    }],
    type_error: Some("can only write character objects"),
};

// ==================== dyn.load, dyn.unload, is.loaded ====================

fn dyn_load(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let path = string_arg(&args[0], "x")?;
    let local = flag_arg(&args[1], "local")?;
    let now = flag_arg(&args[2], "now")?;
    let info = session.dlls.load(&path, local, now)?.to_value();
    session.invisible(info)
}

/// Path of a `DLLInfo` list or of a character argument.
fn library_path(x: &Value) -> RResult<String> {
    if is_dll_info(x) {
        let path = x.as_list().and_then(|items| {
            let names = x.names()?;
            let i = names.iter().position(|n| n.as_str() == Some("path"))?;
            items.get(i).and_then(|p| p.as_str()).map(str::to_string)
        });
        return path.ok_or_else(|| RError::value_error("invalid 'DLLInfo' object"));
    }
    string_arg(x, "x").map_err(|_| RError::type_error("character argument expected"))
}

fn dyn_unload(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let path = library_path(&args[0])?;
    session.dlls.unload(&path)?;
    session.invisible(Value::Null)
}

fn is_loaded(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let symbol = string_arg(&args[0], "symbol")?;
    let package = string_arg(&args[1], "PACKAGE")?;
    let loaded = session.dlls.is_loaded(&symbol, &package);
    Ok(Value::Logical(Logical::from_bool(loaded)))
}

fn path_first(s: &[ArgShape]) -> bool {
    matches!(s.first(), Some(ArgShape::Character))
}

fn symbol_and_package(s: &[ArgShape]) -> bool {
    matches!(s, [ArgShape::Character, ArgShape::Character])
}

pub(crate) static DYN_LOAD: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::DynLoad,
    name: "dyn.load",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("local").optional(ParamDefault::Logical(true)),
        Parameter::new("now").optional(ParamDefault::Logical(true)),
    ],
    specializations: &[Specialization {
        name: "dyn_load",
        guard: path_first,
        body: dyn_load,
    }],
    type_error: Some("character argument expected"),
};

pub(crate) static DYN_UNLOAD: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::DynUnload,
    name: "dyn.unload",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "dyn_unload",
        guard: any_shapes,
        body: dyn_unload,
    }],
    type_error: None,
};

pub(crate) static IS_LOADED: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::IsLoaded,
    name: "is.loaded",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("symbol"),
        Parameter::new("PACKAGE").optional(ParamDefault::Str("")),
    ],
    specializations: &[Specialization {
        name: "is_loaded",
        guard: symbol_and_package,
        body: is_loaded,
    }],
    type_error: Some("invalid 'symbol' argument"),
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Arg;
    use crate::dynload::{DllInfo, DllLoader};
    use crate::vm::Vm;
    use pretty_assertions::assert_eq;
    use subset_r_vm_runtime::ErrorKind;

    fn lines_of(v: &Value) -> Vec<String> {
        v.as_strings()
            .unwrap_or_default()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    // ==================== Connections ====================

    #[test]
    fn test_text_connection_read() {
        let mut vm = Vm::new();
        let con = vm
            .call_builtin(
                "textConnection",
                vec![Arg::positional(Value::string_vec(&["a", "b", "c"]))],
            )
            .unwrap();
        assert!(con.inherits("textConnection"));
        let first = vm
            .call_builtin("readLines", vec![Arg::positional(con.clone()), Arg::named("n", 2)])
            .unwrap();
        assert_eq!(lines_of(&first), vec!["a", "b"]);
        let rest = vm
            .call_builtin("readLines", vec![Arg::positional(con.clone())])
            .unwrap();
        assert_eq!(lines_of(&rest), vec!["c"]);

        let err = vm
            .call_builtin(
                "readLines",
                vec![
                    Arg::positional(con.clone()),
                    Arg::named("n", 1),
                    Arg::named("ok", false),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.message(), "too few lines read in readLines");

        vm.call_builtin("close", vec![Arg::positional(con.clone())])
            .unwrap();
        assert!(vm.session().connections.is_empty());
        assert!(vm
            .call_builtin("close", vec![Arg::positional(con)])
            .is_err());
    }

    #[test]
    fn test_write_lines_to_console() {
        let mut vm = Vm::new();
        vm.call_builtin(
            "writeLines",
            vec![Arg::positional(Value::string_vec(&["x", "y"]))],
        )
        .unwrap();
        assert!(!vm.session().is_visible());
        assert_eq!(
            vm.session().connections.console().lines(),
            &["x".to_string(), "y".to_string()]
        );
        let err = vm
            .call_builtin("writeLines", vec![Arg::positional(1)])
            .unwrap_err();
        assert_eq!(err.message(), "can only write character objects");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path = path.to_str().unwrap();
        let mut vm = Vm::new();

        let con = vm
            .call_builtin("file", vec![Arg::positional(path), Arg::positional("w")])
            .unwrap();
        vm.call_builtin(
            "writeLines",
            vec![
                Arg::positional(Value::string_vec(&["one", "two"])),
                Arg::positional(con.clone()),
            ],
        )
        .unwrap();
        vm.call_builtin("close", vec![Arg::positional(con)]).unwrap();

        let back = vm
            .call_builtin("readLines", vec![Arg::positional(path)])
            .unwrap();
        assert_eq!(lines_of(&back), vec!["one", "two"]);
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let mut vm = Vm::new();
        let err = vm
            .call_builtin("readLines", vec![Arg::positional(path.to_str().unwrap())])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.message().starts_with("cannot open file"));
    }

    // ==================== Dynamic libraries ====================

    #[derive(Debug)]
    struct StubLoader;

    impl DllLoader for StubLoader {
        fn load(&mut self, path: &str, _local: bool, _now: bool) -> RResult<DllInfo> {
            Ok(DllInfo::new(path).with_symbol("C_mean", 0x2000))
        }

        fn unload(&mut self, _info: &DllInfo) -> RResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_loader_refuses() {
        let mut vm = Vm::new();
        let err = vm
            .call_builtin("dyn.load", vec![Arg::positional("/lib/libfoo.so")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.message(), "unable to load shared object '/lib/libfoo.so'");
    }

    #[test]
    fn test_load_query_unload() {
        let mut vm = Vm::new();
        vm.session_mut().set_dll_loader(Box::new(StubLoader));
        let info = vm
            .call_builtin("dyn.load", vec![Arg::positional("/opt/stats.so")])
            .unwrap();
        assert!(is_dll_info(&info));
        assert!(!vm.session().is_visible());

        let loaded = |vm: &mut Vm, package: &str| {
            vm.call_builtin(
                "is.loaded",
                vec![Arg::positional("C_mean"), Arg::named("PACKAGE", package)],
            )
            .unwrap()
        };
        assert_eq!(loaded(&mut vm, ""), Value::from(true));
        assert_eq!(loaded(&mut vm, "stats"), Value::from(true));
        assert_eq!(loaded(&mut vm, "base"), Value::from(false));

        vm.call_builtin("dyn.unload", vec![Arg::positional(info)])
            .unwrap();
        assert_eq!(loaded(&mut vm, ""), Value::from(false));
        let err = vm
            .call_builtin("dyn.unload", vec![Arg::positional("/opt/stats.so")])
            .unwrap_err();
        assert_eq!(err.message(), "shared object '/opt/stats.so' was not loaded");
    }
}

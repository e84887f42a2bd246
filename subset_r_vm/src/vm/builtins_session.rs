//! Session options, promises and environment access.

use log::debug;
use subset_r_vm_runtime::{Logical, RError, RResult, Thunk, Value};

use crate::builtins::{
    BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{any_shapes, dots_names, dots_values, env_arg, flag_arg, string_arg, strings_of};

const INVALID_FIRST_ARGUMENT: &str = "invalid first argument";

fn name_first(s: &[ArgShape]) -> bool {
    matches!(s.first(), Some(ArgShape::Character))
}

// ==================== options, getOption ====================

fn set_option(session: &mut Session, name: String, value: Value) -> RResult<(String, Value)> {
    let old = session.options.set(&name, value)?;
    debug!("option {} set", name);
    Ok((name, old.unwrap_or(Value::Null)))
}

/// `options()` lists every option. Named arguments set options and the
/// previous values come back invisibly; unnamed strings query.
fn options(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let dots = &args[0];
    if dots.is_null() {
        return Ok(session.options.to_list());
    }
    let mut out = Vec::new();
    let mut queried = false;
    for (name, value) in dots_names(dots).into_iter().zip(dots_values(dots)) {
        if let Some(name) = name {
            out.push(set_option(session, name, value)?);
            continue;
        }
        match &value {
            Value::List(_) => {
                for (name, v) in dots_names(&value).into_iter().zip(dots_values(&value)) {
                    let name =
                        name.ok_or_else(|| RError::value_error("list argument has no valid names"))?;
                    out.push(set_option(session, name, v)?);
                }
            }
            Value::Character(_) | Value::StringVector(_) => {
                queried = true;
                for s in strings_of(&value)?.iter() {
                    let name = s
                        .as_str()
                        .ok_or_else(|| RError::value_error("invalid argument"))?;
                    let current = session.options.get(name).cloned().unwrap_or(Value::Null);
                    out.push((name.to_string(), current));
                }
            }
            Value::Null => {}
            _ => return Err(RError::value_error("invalid argument")),
        }
    }
    let result = Value::named_list(out);
    if queried {
        Ok(result)
    } else {
        session.invisible(result)
    }
}

fn get_option(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let name = string_arg(&args[0], "x")?;
    Ok(session
        .options
        .get(&name)
        .cloned()
        .unwrap_or_else(|| args[1].clone()))
}

pub(crate) static OPTIONS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Options,
    name: "options",
    kind: BuiltinKind::Internal,
    parameters: &[Parameter::dots()],
    specializations: &[Specialization {
        name: "options",
        guard: any_shapes,
        body: options,
    }],
    type_error: None,
};

pub(crate) static GET_OPTION: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::GetOption,
    name: "getOption",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("default").optional(ParamDefault::Null),
    ],
    specializations: &[Specialization {
        name: "get_option",
        guard: name_first,
        body: get_option,
    }],
    type_error: Some("'x' must be a character string"),
};

// ==================== force, delayedAssign ====================

fn force(_: &mut Session, args: &[Value]) -> RResult<Value> {
    match &args[0] {
        Value::Promise(p) => p.force(),
        v => Ok(v.clone()),
    }
}

/// Binds `x` in `assign.env` to a promise of `value`. A value that is not
/// already a promise is wrapped in one evaluated against `eval.env`.
fn delayed_assign(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let name = string_arg(&args[0], "x")?;
    let eval_env = env_arg(session, &args[2])?;
    let assign_env = env_arg(session, &args[3])?;
    let promise = match &args[1] {
        Value::Promise(p) => p.clone(),
        v => {
            let v = v.clone();
            Thunk::new(&eval_env, move |_| Ok(v.clone()))
        }
    };
    assign_env.assign(name, Value::Promise(promise))?;
    session.invisible(Value::Null)
}

pub(crate) static FORCE: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Force,
    name: "force",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x").lazy()],
    specializations: &[Specialization {
        name: "force",
        guard: any_shapes,
        body: force,
    }],
    type_error: None,
};

pub(crate) static DELAYED_ASSIGN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::DelayedAssign,
    name: "delayedAssign",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("value").lazy(),
        Parameter::new("eval.env").optional(ParamDefault::Missing),
        Parameter::new("assign.env").optional(ParamDefault::Missing),
    ],
    specializations: &[Specialization {
        name: "delayed_assign",
        guard: name_first,
        body: delayed_assign,
    }],
    type_error: Some(INVALID_FIRST_ARGUMENT),
};

// ==================== get, assign, exists ====================

fn not_found(name: &str) -> RError {
    RError::value_error(format!("object '{}' not found", name))
}

fn get(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let name = string_arg(&args[0], "x")?;
    let env = env_arg(session, &args[1])?;
    let found = if flag_arg(&args[2], "inherits")? {
        env.lookup(&name)
    } else {
        env.get_local(&name)
    };
    match found {
        Some(Value::Promise(p)) => p.force(),
        Some(v) => Ok(v),
        None => Err(not_found(&name)),
    }
}

fn assign(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let name = string_arg(&args[0], "x")?;
    let env = env_arg(session, &args[2])?;
    env.assign(name, args[1].clone())?;
    session.invisible(args[1].clone())
}

fn exists(session: &mut Session, args: &[Value]) -> RResult<Value> {
    let name = string_arg(&args[0], "x")?;
    let env = env_arg(session, &args[1])?;
    let found = if flag_arg(&args[2], "inherits")? {
        env.lookup(&name).is_some()
    } else {
        env.contains_local(&name)
    };
    Ok(Value::Logical(Logical::from_bool(found)))
}

pub(crate) static GET: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Get,
    name: "get",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("envir").optional(ParamDefault::Missing),
        Parameter::new("inherits").optional(ParamDefault::Logical(true)),
    ],
    specializations: &[Specialization {
        name: "get",
        guard: name_first,
        body: get,
    }],
    type_error: Some(INVALID_FIRST_ARGUMENT),
};

pub(crate) static ASSIGN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Assign,
    name: "assign",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("value"),
        Parameter::new("envir").optional(ParamDefault::Missing),
    ],
    specializations: &[Specialization {
        name: "assign",
        guard: name_first,
        body: assign,
    }],
    type_error: Some(INVALID_FIRST_ARGUMENT),
};

pub(crate) static EXISTS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Exists,
    name: "exists",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("envir").optional(ParamDefault::Missing),
        Parameter::new("inherits").optional(ParamDefault::Logical(true)),
    ],
    specializations: &[Specialization {
        name: "exists",
        guard: name_first,
        body: exists,
    }],
    type_error: Some(INVALID_FIRST_ARGUMENT),
};

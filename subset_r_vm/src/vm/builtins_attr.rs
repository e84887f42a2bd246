//! Attribute accessors and replacement functions.
//!
//! Replacement builtins (`attr<-`, `dim<-`, `names<-`, `class<-`) return the
//! modified copy of `x`; the caller rebinds it. Removing every attribute
//! of a length-1 vector turns it back into a scalar.

use subset_r_vm_runtime::attributes::{self as keys, is_reserved, validate_dim, Attributes};
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::{Logical, RError, RResult, RString, Value, Vector};

use crate::builtins::{
    ArgCast, BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{any_shapes, flag_arg, ints_of, string_arg, strings_of};

// ==================== Helpers ====================

fn attributes_of(x: &mut Value) -> RResult<&mut Attributes> {
    if x.is_null() {
        return Err(RError::value_error("attempt to set an attribute on NULL"));
    }
    let type_name = x.type_name();
    x.attributes_mut().ok_or_else(|| {
        RError::type_error(format!("cannot set attributes on a '{}'", type_name))
    })
}

fn set_names(x: &mut Value, value: &Value) -> RResult<()> {
    let len = x.len();
    let names = match value {
        Value::Null => None,
        v => {
            let mut names = Coercer::lenient().character(v)?.as_slice().to_vec();
            if names.len() > len {
                return Err(RError::value_error(format!(
                    "'names' attribute [{}] must be the same length as the vector [{}]",
                    names.len(),
                    len
                )));
            }
            names.resize(len, RString::na());
            Some(names)
        }
    };
    attributes_of(x)?.set_names(names);
    Ok(())
}

fn set_dim(x: &mut Value, value: &Value) -> RResult<()> {
    let len = x.len();
    let attrs = attributes_of(x)?;
    if value.is_null() {
        attrs.set_dim_unchecked(None);
        attrs.set_dimnames(None);
        return Ok(());
    }
    let dim = ints_of(value)?.as_slice().to_vec();
    validate_dim(&dim, len)?;
    attrs.set_names(None);
    attrs.set_dimnames(None);
    attrs.set_dim_unchecked(Some(dim));
    Ok(())
}

fn set_class(x: &mut Value, value: &Value) -> RResult<()> {
    let class = match value {
        Value::Null => None,
        v => Some(strings_of(v)?.as_slice().to_vec()),
    };
    let wants_factor = class
        .as_ref()
        .map_or(false, |c| c.iter().any(|s| s.as_str() == Some("factor")));
    if wants_factor && !matches!(x, Value::Integer(_) | Value::IntVector(_)) {
        return Err(RError::value_error(
            "adding class \"factor\" to an invalid object",
        ));
    }
    attributes_of(x)?.set_class(class);
    Ok(())
}

fn set_attribute(x: &mut Value, name: &str, value: &Value) -> RResult<()> {
    match name {
        keys::NAMES => set_names(x, value),
        keys::DIM => set_dim(x, value),
        keys::CLASS => set_class(x, value),
        keys::DIMNAMES => {
            if !matches!(value, Value::Null | Value::List(_)) {
                return Err(RError::value_error("'dimnames' must be a list"));
            }
            let dimnames = (!value.is_null()).then(|| value.clone());
            attributes_of(x)?.set_dimnames(dimnames);
            Ok(())
        }
        _ => {
            debug_assert!(!is_reserved(name));
            let v = (!value.is_null()).then(|| value.clone());
            attributes_of(x)?.set_regular(name, v);
            Ok(())
        }
    }
}

fn string_or_null(strings: Option<&[RString]>) -> Value {
    match strings {
        Some(s) => Value::string_vec_from(s.to_vec()),
        None => Value::Null,
    }
}

// ==================== attr, attr<-, attributes ====================

fn which_string(s: &[ArgShape]) -> bool {
    matches!(s, [_, which, exact] if which.is_character() && exact.is_logical())
}

/// Exact key, else the unique key `which` is a prefix of.
fn resolve_key(keys: &[String], which: &str, exact: bool) -> Option<String> {
    if keys.iter().any(|k| k == which) {
        return Some(which.to_string());
    }
    if exact {
        return None;
    }
    let mut candidates = keys.iter().filter(|k| k.starts_with(which));
    match (candidates.next(), candidates.next()) {
        (Some(k), None) => Some(k.clone()),
        _ => None,
    }
}

fn attr(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let which = string_arg(&args[1], "which")?;
    let exact = flag_arg(&args[2], "exact")?;
    let Some(attrs) = args[0].attributes() else {
        return Ok(Value::Null);
    };
    Ok(resolve_key(&attrs.keys(), &which, exact)
        .and_then(|k| attrs.get(&k))
        .unwrap_or(Value::Null))
}

fn attr_assign_args(s: &[ArgShape]) -> bool {
    matches!(s, [_, which, _] if which.is_character())
}

fn attr_assign(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let which = string_arg(&args[1], "which")?;
    let mut x = args[0].clone();
    set_attribute(&mut x, &which, &args[2])?;
    Ok(x.into_scalar_form())
}

fn attributes(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let Some(attrs) = args[0].attributes().filter(|a| !a.is_empty()) else {
        return Ok(Value::Null);
    };
    let entries = attrs
        .keys()
        .into_iter()
        .filter_map(|k| attrs.get(&k).map(|v| (k, v)))
        .collect();
    Ok(Value::named_list(entries))
}

pub(crate) static ATTR: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Attr,
    name: "attr",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("which").cast(ArgCast::ToCharacter),
        Parameter::new("exact").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[Specialization {
        name: "attr",
        guard: which_string,
        body: attr,
    }],
    type_error: Some("exactly one attribute 'which' must be given"),
};

pub(crate) static ATTR_ASSIGN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::AttrAssign,
    name: "attr<-",
    kind: BuiltinKind::Primitive,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("which"),
        Parameter::new("value"),
    ],
    specializations: &[Specialization {
        name: "attr_assign",
        guard: attr_assign_args,
        body: attr_assign,
    }],
    type_error: Some("'name' must be non-null character string"),
};

pub(crate) static ATTRIBUTES: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Attributes,
    name: "attributes",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "attributes",
        guard: any_shapes,
        body: attributes,
    }],
    type_error: None,
};

// ==================== dim, names ====================

fn dim(_: &mut Session, args: &[Value]) -> RResult<Value> {
    Ok(args[0].get_attr(keys::DIM).unwrap_or(Value::Null))
}

fn dim_assign(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let mut x = args[0].clone();
    set_dim(&mut x, &args[1])?;
    Ok(x.into_scalar_form())
}

fn names(_: &mut Session, args: &[Value]) -> RResult<Value> {
    if let Value::Environment(env) = &args[0] {
        let mut names = env.names();
        names.sort();
        return Ok(Value::string_vec(&names));
    }
    Ok(string_or_null(args[0].names()))
}

fn names_assign(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let mut x = args[0].clone();
    set_names(&mut x, &args[1])?;
    Ok(x.into_scalar_form())
}

pub(crate) static DIM: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Dim,
    name: "dim",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "dim",
        guard: any_shapes,
        body: dim,
    }],
    type_error: None,
};

pub(crate) static DIM_ASSIGN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::DimAssign,
    name: "dim<-",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x"), Parameter::new("value")],
    specializations: &[Specialization {
        name: "dim_assign",
        guard: any_shapes,
        body: dim_assign,
    }],
    type_error: None,
};

pub(crate) static NAMES: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Names,
    name: "names",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "names",
        guard: any_shapes,
        body: names,
    }],
    type_error: None,
};

pub(crate) static NAMES_ASSIGN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::NamesAssign,
    name: "names<-",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x"), Parameter::new("value")],
    specializations: &[Specialization {
        name: "names_assign",
        guard: any_shapes,
        body: names_assign,
    }],
    type_error: None,
};

// ==================== class, oldClass, unclass, inherits ====================

fn class(_: &mut Session, args: &[Value]) -> RResult<Value> {
    Ok(Value::string_vec(&args[0].effective_class()).into_scalar_form())
}

fn old_class(_: &mut Session, args: &[Value]) -> RResult<Value> {
    Ok(string_or_null(args[0].class()))
}

fn class_assign(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let mut x = args[0].clone();
    set_class(&mut x, &args[1])?;
    Ok(x.into_scalar_form())
}

fn unclass(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let mut x = args[0].clone();
    if x.class().is_some() {
        if let Some(attrs) = x.attributes_mut() {
            attrs.set_class(None);
        }
    }
    Ok(x.into_scalar_form())
}

fn what_string(s: &[ArgShape]) -> bool {
    matches!(s, [_, what, which] if what.is_character() && which.is_logical())
}

fn inherits(_: &mut Session, args: &[Value]) -> RResult<Value> {
    let classes = args[0].effective_class();
    let positions: Vec<i32> = strings_of(&args[1])?
        .iter()
        .map(|w| {
            classes
                .iter()
                .position(|c| Some(c.as_str()) == w.as_str())
                .map_or(0, |i| i as i32 + 1)
        })
        .collect();
    if flag_arg(&args[2], "which")? {
        return Ok(Value::from(Vector::new(positions, true)).into_scalar_form());
    }
    Ok(Value::Logical(Logical::from_bool(positions.iter().any(|p| *p > 0))))
}

pub(crate) static CLASS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Class,
    name: "class",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "class",
        guard: any_shapes,
        body: class,
    }],
    type_error: None,
};

pub(crate) static OLD_CLASS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::OldClass,
    name: "oldClass",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "old_class",
        guard: any_shapes,
        body: old_class,
    }],
    type_error: None,
};

pub(crate) static CLASS_ASSIGN: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::ClassAssign,
    name: "class<-",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x"), Parameter::new("value")],
    specializations: &[Specialization {
        name: "class_assign",
        guard: any_shapes,
        body: class_assign,
    }],
    type_error: None,
};

pub(crate) static UNCLASS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::UnClass,
    name: "unclass",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "unclass",
        guard: any_shapes,
        body: unclass,
    }],
    type_error: None,
};

pub(crate) static INHERITS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Inherits,
    name: "inherits",
    kind: BuiltinKind::Internal,
    parameters: &[
        Parameter::new("x"),
        Parameter::new("what"),
        Parameter::new("which").optional(ParamDefault::Logical(false)),
    ],
    specializations: &[Specialization {
        name: "inherits",
        guard: what_string,
        body: inherits,
    }],
    type_error: Some("'what' must be a character vector"),
};

// ==================== levels ====================

fn levels(_: &mut Session, args: &[Value]) -> RResult<Value> {
    Ok(args[0].get_attr(keys::LEVELS).unwrap_or(Value::Null))
}

pub(crate) static LEVELS: BuiltinDescriptor = BuiltinDescriptor {
    id: BuiltinId::Levels,
    name: "levels",
    kind: BuiltinKind::Primitive,
    parameters: &[Parameter::new("x")],
    specializations: &[Specialization {
        name: "levels",
        guard: any_shapes,
        body: levels,
    }],
    type_error: None,
};

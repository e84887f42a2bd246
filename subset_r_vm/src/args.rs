//! Matching supplied arguments to formal parameters.
//!
//! Order of matching: exact names, then unique partial names (formals
//! before `...` only), then positions. Whatever is left goes to `...`
//! when the builtin has it and is an error otherwise.

use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::{RError, RResult, RString, Value, Vector};
use thiserror::Error;

use crate::builtins::{ArgCast, BuiltinDescriptor, Parameter};

/// One supplied argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Value,
}

impl Arg {
    pub fn positional<V: Into<Value>>(value: V) -> Self {
        Arg {
            name: None,
            value: value.into(),
        }
    }

    pub fn named<S: Into<String>, V: Into<Value>>(name: S, value: V) -> Self {
        Arg {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgMatchError {
    #[error("unused argument ({0})")]
    Unused(String),
    #[error("argument \"{0}\" is missing, with no default")]
    Missing(&'static str),
    #[error("formal argument \"{0}\" matched by multiple actual arguments")]
    MultipleActual(&'static str),
    #[error("argument {0} matches multiple formal arguments")]
    MultipleFormal(usize),
}

/// Bind `args` to the formals of `desc`. The result has one value per
/// formal, in formal order; `...` is bound to a (possibly named) list.
pub fn match_arguments(
    desc: &BuiltinDescriptor,
    args: Vec<Arg>,
) -> Result<Vec<Value>, ArgMatchError> {
    let formals = desc.parameters;
    let dots_at = formals.iter().position(|p| p.is_dots());
    let mut bound: Vec<Option<Value>> = vec![None; formals.len()];
    let mut used = vec![false; args.len()];

    // exact names
    for (i, arg) in args.iter().enumerate() {
        let Some(name) = arg.name.as_deref() else {
            continue;
        };
        if let Some(f) = formals.iter().position(|p| !p.is_dots() && p.name == name) {
            if bound[f].is_some() {
                return Err(ArgMatchError::MultipleActual(formals[f].name));
            }
            bound[f] = Some(arg.value.clone());
            used[i] = true;
        }
    }

    // partial names, only for formals before the dots
    let partial_limit = dots_at.unwrap_or(formals.len());
    for (i, arg) in args.iter().enumerate() {
        if used[i] {
            continue;
        }
        let Some(name) = arg.name.as_deref() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let candidates: Vec<usize> = (0..partial_limit)
            .filter(|f| bound[*f].is_none() && formals[*f].name.starts_with(name))
            .collect();
        match candidates.as_slice() {
            [] => {}
            [f] => {
                bound[*f] = Some(arg.value.clone());
                used[i] = true;
            }
            _ => return Err(ArgMatchError::MultipleFormal(i + 1)),
        }
    }

    // positions
    let mut next_formal = 0;
    for (i, arg) in args.iter().enumerate() {
        if used[i] || arg.name.is_some() {
            continue;
        }
        while next_formal < partial_limit && bound[next_formal].is_some() {
            next_formal += 1;
        }
        if next_formal >= partial_limit {
            break;
        }
        bound[next_formal] = Some(arg.value.clone());
        used[i] = true;
        next_formal += 1;
    }

    // leftovers
    let leftovers: Vec<&Arg> = args
        .iter()
        .zip(used.iter())
        .filter(|(_, u)| !**u)
        .map(|(a, _)| a)
        .collect();
    match dots_at {
        Some(d) => bound[d] = Some(collect_dots(&leftovers)),
        None => {
            if let Some(first) = leftovers.first() {
                let text = match &first.name {
                    Some(n) => format!("{} = {}", n, first.value),
                    None => first.value.to_string(),
                };
                return Err(ArgMatchError::Unused(text));
            }
        }
    }

    formals
        .iter()
        .zip(bound)
        .map(|(p, v)| match v {
            Some(v) => Ok(v),
            None => p.default.to_value().ok_or(ArgMatchError::Missing(p.name)),
        })
        .collect()
}

/// `...` as a list, named when any leftover argument was named. Empty
/// dots are `NULL`.
fn collect_dots(args: &[&Arg]) -> Value {
    if args.is_empty() {
        return Value::Null;
    }
    let values: Vec<Value> = args.iter().map(|a| a.value.clone()).collect();
    let mut list = Vector::new(values, true);
    if args.iter().any(|a| a.name.is_some()) {
        let names = args
            .iter()
            .map(|a| RString::from(a.name.clone().unwrap_or_default()))
            .collect();
        list.attributes_mut().set_names(Some(names));
    }
    Value::List(list)
}

/// Apply the declared argument casts in place.
pub fn apply_casts(desc: &BuiltinDescriptor, values: &mut [Value]) -> RResult<()> {
    for (param, value) in desc.parameters.iter().zip(values.iter_mut()) {
        if param.cast == ArgCast::None || matches!(value, Value::Missing | Value::Promise(_)) {
            continue;
        }
        *value = cast_argument(param, value)?;
    }
    Ok(())
}

fn cast_argument(param: &Parameter, value: &Value) -> RResult<Value> {
    let mut coercer = Coercer::strict().keep_attributes(false);
    let cast = match param.cast {
        ArgCast::None => return Ok(value.clone()),
        ArgCast::ToInteger => coercer.integer(value).map(Value::IntVector),
        ArgCast::ToDouble => coercer.double(value).map(Value::DoubleVector),
        ArgCast::ToLogical => coercer.logical(value).map(Value::LogicalVector),
        ArgCast::ToCharacter => coercer.character(value).map(Value::StringVector),
    };
    cast.map(Value::into_scalar_form)
        .map_err(|_| RError::value_error(format!("invalid '{}' argument", param.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{BuiltinId, ParamDefault};
    use pretty_assertions::assert_eq;

    fn desc(name: &str) -> &'static BuiltinDescriptor {
        BuiltinId::from_name(name).unwrap().descriptor()
    }

    #[test]
    fn test_positional() {
        let v = match_arguments(
            desc("substr"),
            vec![
                Arg::positional("hello"),
                Arg::positional(1.0),
                Arg::positional(3.0),
            ],
        )
        .unwrap();
        assert_eq!(v, vec![Value::from("hello"), Value::Double(1.0), Value::Double(3.0)]);
    }

    #[test]
    fn test_named_out_of_order() {
        let v = match_arguments(
            desc("substr"),
            vec![
                Arg::named("stop", 3.0),
                Arg::positional("hello"),
                Arg::named("start", 1.0),
            ],
        )
        .unwrap();
        assert_eq!(v, vec![Value::from("hello"), Value::Double(1.0), Value::Double(3.0)]);
    }

    #[test]
    fn test_partial_name() {
        let v = match_arguments(
            desc("round"),
            vec![Arg::positional(1.5), Arg::named("dig", 2)],
        )
        .unwrap();
        assert_eq!(v[1], Value::Integer(2));
    }

    #[test]
    fn test_default_used() {
        let round = desc("round");
        assert_eq!(round.parameters[1].default, ParamDefault::Integer(0));
        let v = match_arguments(round, vec![Arg::positional(1.5)]).unwrap();
        assert_eq!(v[1], Value::Integer(0));
    }

    #[test]
    fn test_missing_required() {
        let err = match_arguments(desc("abs"), vec![]).unwrap_err();
        assert_eq!(err.to_string(), "argument \"x\" is missing, with no default");
    }

    #[test]
    fn test_unused_argument() {
        let err = match_arguments(
            desc("abs"),
            vec![Arg::positional(1.0), Arg::named("foo", 2.0)],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "unused argument (foo = 2)");
    }

    #[test]
    fn test_dots_collect_leftovers() {
        let v = match_arguments(
            desc("sum"),
            vec![
                Arg::positional(1.0),
                Arg::named("na.rm", true),
                Arg::named("b", 2.0),
            ],
        )
        .unwrap();
        let list = v[0].as_list().unwrap();
        assert_eq!(list.len(), 2);
        let names: Vec<String> = list.names().unwrap().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["", "b"]);
        assert_eq!(v[1], Value::from(true));
    }

    #[test]
    fn test_no_partial_match_after_dots() {
        // "na" must not partially match "na.rm", which follows the dots
        let v = match_arguments(
            desc("sum"),
            vec![Arg::positional(1.0), Arg::named("na", true)],
        )
        .unwrap();
        assert_eq!(v[0].len(), 2);
        assert_eq!(v[1], Value::from(false));
    }

    #[test]
    fn test_casts() {
        let d = desc("round");
        let mut v = match_arguments(d, vec![Arg::positional(1.5), Arg::positional(2.9)]).unwrap();
        apply_casts(d, &mut v).unwrap();
        assert_eq!(v[1], Value::Integer(2));

        let mut v = match_arguments(d, vec![Arg::positional(1.5), Arg::positional("x")]).unwrap();
        let err = apply_casts(d, &mut v).unwrap_err();
        assert_eq!(err.to_string(), "invalid 'digits' argument");
    }
}

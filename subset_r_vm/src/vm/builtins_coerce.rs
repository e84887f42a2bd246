//! `as.logical`, `as.integer`, `as.double`, `as.complex`, `as.character`.
//!
//! These coerce leniently: text that does not parse becomes NA with a
//! warning, and every attribute is dropped. A value already of the target
//! type and without attributes is returned as is.

use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::{RResult, RString, RType, Value, Vector};

use crate::builtins::{
    BuiltinDescriptor, BuiltinId, BuiltinKind, ParamDefault, Parameter, Specialization,
};
use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::util::{any_shapes, ints_of};

fn coerce_value(session: &mut Session, x: &Value, target: RType) -> RResult<Value> {
    if target == RType::Character && x.is_factor() {
        return factor_labels(x);
    }
    let mut coercer = Coercer::lenient();
    let out = coercer.coerce(x, target);
    session.warnings_from(coercer.take_warnings());
    Ok(out?.into_scalar_form())
}

/// Level label of every code of a factor.
fn factor_labels(x: &Value) -> RResult<Value> {
    let codes = ints_of(x)?;
    let levels = x
        .get_attr("levels")
        .and_then(|l| l.as_strings())
        .unwrap_or_default();
    let labels: Vec<RString> = codes
        .iter()
        .map(|c| match usize::try_from(*c) {
            Ok(i) if i >= 1 && i <= levels.len() => levels[i - 1].clone(),
            _ => RString::na(),
        })
        .collect();
    Ok(Value::from(Vector::from_vec(labels)).into_scalar_form())
}

fn unchanged(_: &mut Session, args: &[Value]) -> RResult<Value> {
    Ok(args[0].clone())
}

macro_rules! as_builtin {
    ($static:ident, $id:ident, $name:literal, $body:ident, $guard:ident, $scalar:ident, $target:expr) => {
        fn $guard(s: &[ArgShape]) -> bool {
            matches!(s, [ArgShape::$scalar, _])
        }

        fn $body(session: &mut Session, args: &[Value]) -> RResult<Value> {
            coerce_value(session, &args[0], $target)
        }

        pub(crate) static $static: BuiltinDescriptor = BuiltinDescriptor {
            id: BuiltinId::$id,
            name: $name,
            kind: BuiltinKind::Primitive,
            parameters: &[
                Parameter::new("x").optional(ParamDefault::Null),
                Parameter::dots(),
            ],
            specializations: &[
                Specialization {
                    name: concat!(stringify!($body), "_unchanged"),
                    guard: $guard,
                    body: unchanged,
                },
                Specialization {
                    name: stringify!($body),
                    guard: any_shapes,
                    body: $body,
                },
            ],
            type_error: None,
        };
    };
}

as_builtin!(
    AS_LOGICAL,
    AsLogical,
    "as.logical",
    as_logical,
    logical_scalar,
    Logical,
    RType::Logical
);
as_builtin!(
    AS_INTEGER,
    AsInteger,
    "as.integer",
    as_integer,
    int_scalar,
    Integer,
    RType::Integer
);
as_builtin!(
    AS_DOUBLE,
    AsDouble,
    "as.double",
    as_double,
    double_scalar,
    Double,
    RType::Double
);
as_builtin!(
    AS_COMPLEX,
    AsComplex,
    "as.complex",
    as_complex,
    complex_scalar,
    Complex,
    RType::Complex
);
as_builtin!(
    AS_CHARACTER,
    AsCharacter,
    "as.character",
    as_character,
    character_scalar,
    Character,
    RType::Character
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Arg;
    use crate::vm::{CacheState, Vm};
    use pretty_assertions::assert_eq;
    use subset_r_vm_runtime::convert::{INT_RANGE_WARNING, NA_INTRODUCED_WARNING};
    use subset_r_vm_runtime::{ErrorKind, Logical, RComplex, INT_NA};

    fn call(vm: &mut Vm, name: &str, x: Value) -> Value {
        vm.call_builtin(name, vec![Arg::positional(x)]).unwrap()
    }

    #[test]
    fn test_unparsable_text_warns() {
        let mut vm = Vm::new();
        let v = call(&mut vm, "as.integer", Value::string_vec(&["12", "x"]));
        assert_eq!(v, Value::int_vec(vec![12, INT_NA]));
        assert_eq!(vm.session().warnings().len(), 1);
        assert_eq!(vm.session().warnings()[0].message, NA_INTRODUCED_WARNING);
        assert_eq!(vm.session().warnings()[0].call, Some("as.integer"));
    }

    #[test]
    fn test_out_of_int_range() {
        let mut vm = Vm::new();
        assert_eq!(call(&mut vm, "as.integer", Value::Double(3e10)), Value::na_integer());
        assert_eq!(vm.session().warnings()[0].message, INT_RANGE_WARNING);
        assert_eq!(call(&mut vm, "as.integer", Value::Double(-2.7)), Value::Integer(-2));
    }

    #[test]
    fn test_attributes_dropped() {
        let mut vm = Vm::new();
        let mut x = Value::int_vec(vec![1, 2]);
        x.attributes_mut()
            .unwrap()
            .set_names(Some(vec![RString::from("a"), RString::from("b")]));
        let v = call(&mut vm, "as.double", x);
        assert_eq!(v, Value::double_vec(vec![1.0, 2.0]));
        assert!(!v.has_attributes());
    }

    #[test]
    fn test_numeric_alias_and_defaults() {
        let mut vm = Vm::new();
        assert_eq!(call(&mut vm, "as.numeric", Value::from(true)), Value::Double(1.0));
        let empty = vm.call_builtin("as.numeric", vec![]).unwrap();
        assert_eq!(empty, Value::double_vec(vec![]));
    }

    #[test]
    fn test_logical_and_complex() {
        let mut vm = Vm::new();
        assert_eq!(
            call(&mut vm, "as.logical", Value::string_vec(&["T", "false", "maybe"])),
            Value::logical_vec(vec![Logical::True, Logical::False, Logical::NA])
        );
        assert_eq!(
            call(&mut vm, "as.complex", Value::Integer(2)),
            Value::Complex(RComplex::new(2.0, 0.0))
        );
    }

    #[test]
    fn test_character_of_factor_uses_levels() {
        let mut vm = Vm::new();
        let f = Value::factor(vec![2, 1, INT_NA], &["lo", "hi"]);
        let v = call(&mut vm, "as.character", f.clone());
        assert_eq!(
            v.as_strings().unwrap(),
            vec![RString::from("hi"), RString::from("lo"), RString::na()]
        );
        assert_eq!(call(&mut vm, "as.integer", f), Value::int_vec(vec![2, 1, INT_NA]));
    }

    #[test]
    fn test_unchanged_scalar() {
        let mut vm = Vm::new();
        let site = vm.call_site("as.double").unwrap();
        let v = vm.call(site, vec![Arg::positional(2.5)]).unwrap();
        assert_eq!(v, Value::Double(2.5));
        match vm.dispatcher().site(site).unwrap().state() {
            CacheState::Monomorphic(entry) => assert_eq!(entry.bound.name(), "as_double_unchanged"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_environment_cannot_coerce() {
        let mut vm = Vm::new();
        let env = Value::Environment(vm.session().global_env().clone());
        let err = vm
            .call_builtin("as.double", vec![Arg::positional(env)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(
            err.message(),
            "cannot coerce type 'environment' to vector of type 'double'"
        );
    }
}

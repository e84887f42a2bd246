//! Helpers shared by the builtin modules.
//!
//! - argument readers (`flag_arg`, `int_arg`, `string_arg`, `env_arg`,
//!   `dots_values`)
//! - typed numeric views of values (`ints_of`, `doubles_of`)
//! - elementwise mapping with NA propagation (`map_elements`)
//! - result finishing (`finish`)

use subset_r_vm_runtime::attributes::propagate_unary;
use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::{
    Element, Environment, Logical, NaCheck, RError, RResult, RString, Value, Vector, INT_NA,
};

use crate::session::Session;
use crate::vm::shape::ArgShape;

pub(crate) const NON_NUMERIC_MATH: &str = "non-numeric argument to mathematical function";
pub(crate) const NON_NUMERIC_BINARY: &str = "non-numeric argument to binary operator";
pub(crate) const NANS_PRODUCED: &str = "NaNs produced";

pub(crate) fn invalid_arg(name: &str) -> RError {
    RError::value_error(format!("invalid '{}' argument", name))
}

// ==================== Guards ====================

/// Accepts any argument shapes.
pub(crate) fn any_shapes(_: &[ArgShape]) -> bool {
    true
}

/// First argument is atomic or `NULL`.
pub(crate) fn first_atomic_or_null(s: &[ArgShape]) -> bool {
    matches!(s.first(), Some(x) if x.is_atomic() || *x == ArgShape::Null)
}

// ==================== Argument readers ====================

/// Items collected into `...`.
pub(crate) fn dots_values(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.iter().cloned().collect(),
        Value::Null | Value::Missing => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Names of the items collected into `...`, empty string when unnamed.
pub(crate) fn dots_names(value: &Value) -> Vec<Option<String>> {
    let n = value.len();
    match value.names() {
        Some(names) => names
            .iter()
            .map(|s| s.as_str().filter(|s| !s.is_empty()).map(str::to_string))
            .collect(),
        None => vec![None; n],
    }
}

/// Non-NA logical scalar.
pub(crate) fn flag_arg(value: &Value, name: &str) -> RResult<bool> {
    let l = match value {
        Value::Logical(l) => *l,
        Value::LogicalVector(v) => v.get(0).copied().unwrap_or(Logical::NA),
        Value::Integer(i) if *i != INT_NA => Logical::from_bool(*i != 0),
        Value::Double(d) if !d.is_nan() => Logical::from_bool(*d != 0.0),
        _ => Logical::NA,
    };
    l.to_bool().ok_or_else(|| invalid_arg(name))
}

/// First element as an integer; may be NA.
pub(crate) fn int_arg(value: &Value, name: &str) -> RResult<i32> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Logical(_) | Value::Double(_) | Value::IntVector(_) | Value::DoubleVector(_) => {
            Coercer::lenient()
                .integer(value)
                .ok()
                .and_then(|v| v.get(0).copied())
                .ok_or_else(|| invalid_arg(name))
        }
        _ => Err(invalid_arg(name)),
    }
}

/// First element as a non-NA string.
pub(crate) fn string_arg(value: &Value, name: &str) -> RResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_arg(name))
}

/// `envir` argument; missing means the global environment.
pub(crate) fn env_arg(session: &Session, value: &Value) -> RResult<Environment> {
    match value {
        Value::Missing | Value::Null => Ok(session.global_env().clone()),
        Value::Environment(e) => Ok(e.clone()),
        _ => Err(RError::value_error("invalid 'envir' argument")),
    }
}

// ==================== Typed views ====================

/// Integer data of a logical or integer value, attributes kept.
pub(crate) fn ints_of(value: &Value) -> RResult<Vector<i32>> {
    Coercer::strict().integer(value)
}

/// Double data of a logical, integer or double value, attributes kept.
pub(crate) fn doubles_of(value: &Value) -> RResult<Vector<f64>> {
    Coercer::strict().double(value)
}

pub(crate) fn strings_of(value: &Value) -> RResult<Vector<RString>> {
    Coercer::strict().character(value)
}

/// Apply `f` to every non-NA element; NA maps to NA of the result type.
pub(crate) fn map_elements<T, U, F>(v: &Vector<T>, mut f: F) -> Vector<U>
where
    T: Element,
    U: Element,
    F: FnMut(&T) -> U,
{
    let mut na = NaCheck::new();
    na.enable_vector(v);
    let data = v
        .iter()
        .map(|x| {
            if na.check(x) {
                return U::na();
            }
            let y = f(x);
            na.record(&y);
            y
        })
        .collect();
    Vector::new(data, na.never_seen_na()).with_attributes(propagate_unary(v.attributes()))
}

/// Apply a body generic over the element type to every vector variant of
/// a value, wrapping the resulting `Vector<T>` back into a `Value`.
///
/// Evaluates to `None` for values that are not vectors; scalars must be
/// widened with `as_vector_form` first.
///
/// ```ignore
/// let doubled = with_vector!(&value, v => v.map(|x| x.clone()));
/// ```
macro_rules! with_vector {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            ::subset_r_vm_runtime::Value::LogicalVector($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            ::subset_r_vm_runtime::Value::IntVector($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            ::subset_r_vm_runtime::Value::DoubleVector($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            ::subset_r_vm_runtime::Value::ComplexVector($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            ::subset_r_vm_runtime::Value::StringVector($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            ::subset_r_vm_runtime::Value::RawVector($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            ::subset_r_vm_runtime::Value::List($v) => {
                Some(::subset_r_vm_runtime::Value::from($body))
            }
            _ => None,
        }
    };
}
pub(crate) use with_vector;

/// Wrap a result vector, narrowing an attribute-free length-1 result to a
/// scalar.
pub(crate) fn finish<T: Element>(v: Vector<T>) -> Value
where
    Value: From<Vector<T>>,
{
    Value::from(v).into_scalar_form()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_arg() {
        assert!(flag_arg(&Value::from(true), "na.rm").unwrap());
        assert!(!flag_arg(&Value::Integer(0), "na.rm").unwrap());
        let err = flag_arg(&Value::na_logical(), "na.rm").unwrap_err();
        assert_eq!(err.to_string(), "invalid 'na.rm' argument");
    }

    #[test]
    fn test_dots_helpers() {
        let dots = Value::named_list(vec![
            ("".to_string(), Value::Integer(1)),
            ("b".to_string(), Value::Integer(2)),
        ]);
        assert_eq!(dots_values(&dots).len(), 2);
        assert_eq!(dots_names(&dots), vec![None, Some("b".to_string())]);
        assert!(dots_values(&Value::Null).is_empty());
    }

    #[test]
    fn test_int_arg() {
        assert_eq!(int_arg(&Value::Double(2.9), "n").unwrap(), 2);
        assert_eq!(int_arg(&Value::na_integer(), "n").unwrap(), INT_NA);
        assert!(int_arg(&Value::from("a"), "n").is_err());
    }
}

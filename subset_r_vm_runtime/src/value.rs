//! Dynamic value type
//!
//! The `Value` enum is the tagged union every builtin receives and returns.
//! Scalars without attributes have their own variants so that dispatch can
//! tell them apart from vectors cheaply; any scalar can be widened to the
//! matching length-1 vector with [`Value::into_vector_form`].

use std::borrow::Cow;
use std::fmt;

use crate::attributes::{Attributes, LEVELS};
use crate::env::Environment;
use crate::na::{Element, Logical, RComplex, RString, DOUBLE_NA, INT_NA};
use crate::thunk::Thunk;
use crate::types::RType;
use crate::vector::Vector;

/// Opaque function object. Closures are not modelled; builtins are
/// referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionValue {
    pub name: String,
    pub builtin: bool,
}

/// Handle to memory owned outside the runtime (e.g. a loaded library).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPointer {
    pub tag: String,
    pub address: usize,
}

/// Dynamic value
#[derive(Debug, Clone)]
pub enum Value {
    /// `NULL`
    Null,
    /// Marker for an argument that was not supplied
    Missing,
    /// Logical scalar
    Logical(Logical),
    /// Integer scalar
    Integer(i32),
    /// Double scalar
    Double(f64),
    /// Complex scalar
    Complex(RComplex),
    /// Character scalar
    Character(RString),
    /// Raw byte scalar
    Raw(u8),
    LogicalVector(Vector<Logical>),
    IntVector(Vector<i32>),
    DoubleVector(Vector<f64>),
    ComplexVector(Vector<RComplex>),
    StringVector(Vector<RString>),
    RawVector(Vector<u8>),
    /// Generic vector
    List(Vector<Value>),
    Environment(Environment),
    Function(FunctionValue),
    Symbol(String),
    ExternalPointer(ExternalPointer),
    /// Tagged linked list, flattened
    PairList(Vec<(Option<String>, Value)>),
    /// Deferred computation
    Promise(Thunk),
}

impl Element for Value {
    const TYPE: RType = RType::List;

    fn na() -> Self {
        Value::Logical(Logical::NA)
    }

    /// List cells are never NA themselves.
    fn is_na(&self) -> bool {
        false
    }

    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

impl Value {
    pub fn rtype(&self) -> RType {
        match self {
            Value::Null | Value::Missing => RType::Null,
            Value::Logical(_) | Value::LogicalVector(_) => RType::Logical,
            Value::Integer(_) | Value::IntVector(_) => RType::Integer,
            Value::Double(_) | Value::DoubleVector(_) => RType::Double,
            Value::Complex(_) | Value::ComplexVector(_) => RType::Complex,
            Value::Character(_) | Value::StringVector(_) => RType::Character,
            Value::Raw(_) | Value::RawVector(_) => RType::Raw,
            Value::List(_) => RType::List,
            Value::Environment(_) => RType::Environment,
            Value::Function(_) => RType::Function,
            Value::Symbol(_) => RType::Symbol,
            Value::ExternalPointer(_) => RType::ExternalPointer,
            Value::PairList(_) => RType::PairList,
            Value::Promise(_) => RType::Promise,
        }
    }

    /// `typeof()` name.
    pub fn type_name(&self) -> &'static str {
        self.rtype().type_name()
    }

    pub fn len(&self) -> usize {
        match self {
            Value::Null | Value::Missing => 0,
            Value::Logical(_)
            | Value::Integer(_)
            | Value::Double(_)
            | Value::Complex(_)
            | Value::Character(_)
            | Value::Raw(_) => 1,
            Value::LogicalVector(v) => v.len(),
            Value::IntVector(v) => v.len(),
            Value::DoubleVector(v) => v.len(),
            Value::ComplexVector(v) => v.len(),
            Value::StringVector(v) => v.len(),
            Value::RawVector(v) => v.len(),
            Value::List(v) => v.len(),
            Value::PairList(p) => p.len(),
            Value::Environment(e) => e.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Logical(_)
                | Value::Integer(_)
                | Value::Double(_)
                | Value::Complex(_)
                | Value::Character(_)
                | Value::Raw(_)
        )
    }

    pub fn is_atomic(&self) -> bool {
        self.rtype().is_atomic()
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Value::LogicalVector(v) => Some(v.attributes()),
            Value::IntVector(v) => Some(v.attributes()),
            Value::DoubleVector(v) => Some(v.attributes()),
            Value::ComplexVector(v) => Some(v.attributes()),
            Value::StringVector(v) => Some(v.attributes()),
            Value::RawVector(v) => Some(v.attributes()),
            Value::List(v) => Some(v.attributes()),
            _ => None,
        }
    }

    /// Mutable attributes, widening a scalar to a vector first.
    /// `None` for values that cannot carry attributes.
    pub fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        if self.is_scalar() {
            let widened = std::mem::replace(self, Value::Null).into_vector_form();
            *self = widened;
        }
        match self {
            Value::LogicalVector(v) => Some(v.attributes_mut()),
            Value::IntVector(v) => Some(v.attributes_mut()),
            Value::DoubleVector(v) => Some(v.attributes_mut()),
            Value::ComplexVector(v) => Some(v.attributes_mut()),
            Value::StringVector(v) => Some(v.attributes_mut()),
            Value::RawVector(v) => Some(v.attributes_mut()),
            Value::List(v) => Some(v.attributes_mut()),
            _ => None,
        }
    }

    pub fn has_attributes(&self) -> bool {
        self.attributes().map(|a| !a.is_empty()).unwrap_or(false)
    }

    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.attributes().and_then(|a| a.get(name))
    }

    pub fn names(&self) -> Option<&[RString]> {
        self.attributes().and_then(|a| a.names())
    }

    pub fn dim(&self) -> Option<&[i32]> {
        self.attributes().and_then(|a| a.dim())
    }

    pub fn class(&self) -> Option<&[RString]> {
        self.attributes().and_then(|a| a.class())
    }

    pub fn inherits(&self, class: &str) -> bool {
        self.attributes().map(|a| a.inherits(class)).unwrap_or(false)
    }

    /// Integer vector with class `factor` and a `levels` attribute.
    pub fn is_factor(&self) -> bool {
        matches!(self, Value::IntVector(v) if v.attributes().inherits("factor"))
    }

    /// Known to contain no NA (scalars are checked directly).
    pub fn is_complete(&self) -> bool {
        match self {
            Value::Logical(x) => !x.is_na(),
            Value::Integer(x) => !x.is_na(),
            Value::Double(x) => !x.is_na(),
            Value::Complex(x) => !x.is_na(),
            Value::Character(x) => !x.is_na(),
            Value::LogicalVector(v) => v.is_complete(),
            Value::IntVector(v) => v.is_complete(),
            Value::DoubleVector(v) => v.is_complete(),
            Value::ComplexVector(v) => v.is_complete(),
            Value::StringVector(v) => v.is_complete(),
            _ => true,
        }
    }

    /// Widen an attribute-free scalar into the equivalent length-1 vector.
    /// Other values are returned unchanged.
    pub fn into_vector_form(self) -> Value {
        match self {
            Value::Logical(x) => Value::LogicalVector(Vector::from_vec(vec![x])),
            Value::Integer(x) => Value::IntVector(Vector::from_vec(vec![x])),
            Value::Double(x) => Value::DoubleVector(Vector::from_vec(vec![x])),
            Value::Complex(x) => Value::ComplexVector(Vector::from_vec(vec![x])),
            Value::Character(x) => Value::StringVector(Vector::from_vec(vec![x])),
            Value::Raw(x) => Value::RawVector(Vector::from_vec(vec![x])),
            other => other,
        }
    }

    /// Borrowing version of [`into_vector_form`](Self::into_vector_form).
    pub fn as_vector_form(&self) -> Cow<'_, Value> {
        if self.is_scalar() {
            Cow::Owned(self.clone().into_vector_form())
        } else {
            Cow::Borrowed(self)
        }
    }

    /// Narrow a length-1 attribute-free vector back to a scalar.
    pub fn into_scalar_form(self) -> Value {
        fn single<T: Element>(v: &Vector<T>) -> Option<T> {
            if v.len() == 1 && v.attributes().is_empty() {
                v.get(0).cloned()
            } else {
                None
            }
        }
        let scalar = match &self {
            Value::LogicalVector(v) => single(v).map(Value::Logical),
            Value::IntVector(v) => single(v).map(Value::Integer),
            Value::DoubleVector(v) => single(v).map(Value::Double),
            Value::ComplexVector(v) => single(v).map(Value::Complex),
            Value::StringVector(v) => single(v).map(Value::Character),
            Value::RawVector(v) => single(v).map(Value::Raw),
            _ => None,
        };
        scalar.unwrap_or(self)
    }

    /// Element `i` as a scalar value (list cells are returned as is).
    pub fn element(&self, i: usize) -> Option<Value> {
        match self {
            Value::LogicalVector(v) => v.get(i).copied().map(Value::Logical),
            Value::IntVector(v) => v.get(i).copied().map(Value::Integer),
            Value::DoubleVector(v) => v.get(i).copied().map(Value::Double),
            Value::ComplexVector(v) => v.get(i).copied().map(Value::Complex),
            Value::StringVector(v) => v.get(i).cloned().map(Value::Character),
            Value::RawVector(v) => v.get(i).copied().map(Value::Raw),
            Value::List(v) => v.get(i).cloned(),
            Value::PairList(p) => p.get(i).map(|(_, v)| v.clone()),
            scalar if scalar.is_scalar() && i == 0 => Some(scalar.clone()),
            _ => None,
        }
    }

    // ==================== Constructors ====================

    pub fn logical_vec(data: Vec<Logical>) -> Value {
        Value::LogicalVector(Vector::from_vec(data))
    }

    pub fn int_vec(data: Vec<i32>) -> Value {
        Value::IntVector(Vector::from_vec(data))
    }

    pub fn double_vec(data: Vec<f64>) -> Value {
        Value::DoubleVector(Vector::from_vec(data))
    }

    pub fn complex_vec(data: Vec<RComplex>) -> Value {
        Value::ComplexVector(Vector::from_vec(data))
    }

    pub fn string_vec<S: AsRef<str>>(data: &[S]) -> Value {
        Value::StringVector(Vector::from_vec(data.iter().map(RString::new).collect()))
    }

    pub fn string_vec_from(data: Vec<RString>) -> Value {
        Value::StringVector(Vector::from_vec(data))
    }

    pub fn raw_vec(data: Vec<u8>) -> Value {
        Value::RawVector(Vector::from_vec(data))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Vector::from_vec(items))
    }

    /// List with names.
    pub fn named_list(items: Vec<(String, Value)>) -> Value {
        let (names, values): (Vec<_>, Vec<_>) = items
            .into_iter()
            .map(|(n, v)| (RString::from(n), v))
            .unzip();
        let mut v = Vector::from_vec(values);
        v.attributes_mut().set_names(Some(names));
        Value::List(v)
    }

    /// Factor from codes and levels.
    pub fn factor(codes: Vec<i32>, levels: &[&str]) -> Value {
        let mut v = Vector::from_vec(codes);
        v.attributes_mut()
            .set_regular(LEVELS, Some(Value::string_vec(levels)));
        v.attributes_mut()
            .set_class(Some(vec![RString::from("factor")]));
        Value::IntVector(v)
    }

    pub fn na_logical() -> Value {
        Value::Logical(Logical::NA)
    }

    pub fn na_integer() -> Value {
        Value::Integer(INT_NA)
    }

    pub fn na_double() -> Value {
        Value::Double(DOUBLE_NA)
    }

    pub fn na_character() -> Value {
        Value::Character(RString::na())
    }

    // ==================== Accessors ====================

    /// Doubles of a double scalar or vector.
    pub fn as_doubles(&self) -> Option<Vec<f64>> {
        match self {
            Value::Double(x) => Some(vec![*x]),
            Value::DoubleVector(v) => Some(v.as_slice().to_vec()),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<Vec<i32>> {
        match self {
            Value::Integer(x) => Some(vec![*x]),
            Value::IntVector(v) => Some(v.as_slice().to_vec()),
            _ => None,
        }
    }

    pub fn as_logicals(&self) -> Option<Vec<Logical>> {
        match self {
            Value::Logical(x) => Some(vec![*x]),
            Value::LogicalVector(v) => Some(v.as_slice().to_vec()),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<Vec<RString>> {
        match self {
            Value::Character(x) => Some(vec![x.clone()]),
            Value::StringVector(v) => Some(v.as_slice().to_vec()),
            _ => None,
        }
    }

    pub fn as_complexes(&self) -> Option<Vec<RComplex>> {
        match self {
            Value::Complex(x) => Some(vec![*x]),
            Value::ComplexVector(v) => Some(v.as_slice().to_vec()),
            _ => None,
        }
    }

    /// First element as a plain string, when this is character data.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(s) => s.as_str(),
            Value::StringVector(v) => v.get(0).and_then(|s| s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&Environment> {
        match self {
            Value::Environment(e) => Some(e),
            _ => None,
        }
    }

    /// Value of the `class` attribute as strings.
    pub fn class_names(&self) -> Vec<String> {
        self.class()
            .map(|c| c.iter().map(|s| s.as_display_str().to_string()).collect())
            .unwrap_or_default()
    }

    /// Implicit class used by `class()` and `inherits()` when no `class`
    /// attribute is set.
    pub fn implicit_class(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(dim) = self.dim() {
            if dim.len() == 2 {
                out.push("matrix".to_string());
            }
            out.push("array".to_string());
        }
        let base = match self.rtype() {
            RType::Double => "numeric",
            RType::Function => "function",
            RType::Symbol => "name",
            t => t.type_name(),
        };
        out.push(base.to_string());
        out
    }

    /// `class()` result: the class attribute or the implicit class.
    pub fn effective_class(&self) -> Vec<String> {
        let explicit = self.class_names();
        if explicit.is_empty() {
            self.implicit_class()
        } else {
            explicit
        }
    }
}

// ==================== Equality ====================

fn atomic_eq<T: Element>(a: &Vector<T>, b: &Vector<T>) -> bool {
    a.identical(b)
}

impl PartialEq for Value {
    /// `identical()`: scalars equal attribute-free length-1 vectors and NA
    /// equals NA.
    fn eq(&self, other: &Self) -> bool {
        if self.is_scalar() || other.is_scalar() {
            if self.is_scalar() && other.is_scalar() {
                return match (self, other) {
                    (Value::Logical(a), Value::Logical(b)) => a == b,
                    (Value::Integer(a), Value::Integer(b)) => a == b,
                    (Value::Double(a), Value::Double(b)) => a.identical(b),
                    (Value::Complex(a), Value::Complex(b)) => a.identical(b),
                    (Value::Character(a), Value::Character(b)) => a == b,
                    (Value::Raw(a), Value::Raw(b)) => a == b,
                    _ => false,
                };
            }
            return self.as_vector_form().as_ref() == other.as_vector_form().as_ref();
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Missing, Value::Missing) => true,
            (Value::LogicalVector(a), Value::LogicalVector(b)) => atomic_eq(a, b),
            (Value::IntVector(a), Value::IntVector(b)) => atomic_eq(a, b),
            (Value::DoubleVector(a), Value::DoubleVector(b)) => atomic_eq(a, b),
            (Value::ComplexVector(a), Value::ComplexVector(b)) => atomic_eq(a, b),
            (Value::StringVector(a), Value::StringVector(b)) => atomic_eq(a, b),
            (Value::RawVector(a), Value::RawVector(b)) => atomic_eq(a, b),
            (Value::List(a), Value::List(b)) => atomic_eq(a, b),
            (Value::Environment(a), Value::Environment(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::ExternalPointer(a), Value::ExternalPointer(b)) => a == b,
            (Value::PairList(a), Value::PairList(b)) => a == b,
            (Value::Promise(a), Value::Promise(b)) => a == b,
            _ => false,
        }
    }
}

// ==================== Conversions ====================

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Integer(x)
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Logical(Logical::from_bool(x))
    }
}

impl From<Logical> for Value {
    fn from(x: Logical) -> Self {
        Value::Logical(x)
    }
}

impl From<RComplex> for Value {
    fn from(x: RComplex) -> Self {
        Value::Complex(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::Character(RString::from(x))
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::Character(RString::from(x))
    }
}

impl From<RString> for Value {
    fn from(x: RString) -> Self {
        Value::Character(x)
    }
}

impl From<Vec<f64>> for Value {
    fn from(x: Vec<f64>) -> Self {
        Value::double_vec(x)
    }
}

impl From<Vec<i32>> for Value {
    fn from(x: Vec<i32>) -> Self {
        Value::int_vec(x)
    }
}

impl From<Vector<f64>> for Value {
    fn from(x: Vector<f64>) -> Self {
        Value::DoubleVector(x)
    }
}

impl From<Vector<i32>> for Value {
    fn from(x: Vector<i32>) -> Self {
        Value::IntVector(x)
    }
}

impl From<Vector<Logical>> for Value {
    fn from(x: Vector<Logical>) -> Self {
        Value::LogicalVector(x)
    }
}

impl From<Vector<RComplex>> for Value {
    fn from(x: Vector<RComplex>) -> Self {
        Value::ComplexVector(x)
    }
}

impl From<Vector<RString>> for Value {
    fn from(x: Vector<RString>) -> Self {
        Value::StringVector(x)
    }
}

impl From<Vector<u8>> for Value {
    fn from(x: Vector<u8>) -> Self {
        Value::RawVector(x)
    }
}

impl From<Vector<Value>> for Value {
    fn from(x: Vector<Value>) -> Self {
        Value::List(x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: Element, F: Fn(&T) -> String>(
            f: &mut fmt::Formatter<'_>,
            v: &Vector<T>,
            show: F,
        ) -> fmt::Result {
            let parts: Vec<String> = v.iter().map(show).collect();
            write!(f, "[{}]", parts.join(", "))
        }
        let double = |x: &f64| {
            if x.is_na() {
                "NA".to_string()
            } else {
                crate::convert::double_to_string(*x)
            }
        };
        let int = |x: &i32| {
            if x.is_na() {
                "NA".to_string()
            } else {
                x.to_string()
            }
        };
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Missing => write!(f, "<missing>"),
            Value::Logical(x) => write!(f, "{}", x),
            Value::Integer(x) => write!(f, "{}", int(x)),
            Value::Double(x) => write!(f, "{}", double(x)),
            Value::Complex(x) => write!(f, "{}", x),
            Value::Character(x) if x.is_na() => write!(f, "NA"),
            Value::Character(x) => write!(f, "\"{}\"", x),
            Value::Raw(x) => write!(f, "{:02x}", x),
            Value::LogicalVector(v) => join(f, v, |x| x.to_string()),
            Value::IntVector(v) => join(f, v, int),
            Value::DoubleVector(v) => join(f, v, double),
            Value::ComplexVector(v) => join(f, v, |x| x.to_string()),
            Value::StringVector(v) => join(f, v, |x| {
                if x.is_na() {
                    "NA".to_string()
                } else {
                    format!("\"{}\"", x)
                }
            }),
            Value::RawVector(v) => join(f, v, |x| format!("{:02x}", x)),
            Value::List(v) => write!(f, "list(<{} elements>)", v.len()),
            Value::Environment(e) => write!(f, "<environment: {}>", e.name()),
            Value::Function(func) => write!(f, "function {}", func.name),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::ExternalPointer(p) => write!(f, "<pointer: {:#x}>", p.address),
            Value::PairList(p) => write!(f, "pairlist(<{} elements>)", p.len()),
            Value::Promise(_) => write!(f, "<promise>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_equals_length_one_vector() {
        assert_eq!(Value::Double(1.5), Value::double_vec(vec![1.5]));
        assert_eq!(Value::int_vec(vec![3]), Value::Integer(3));
        assert_ne!(Value::Integer(3), Value::Double(3.0));
        assert_eq!(Value::na_double(), Value::double_vec(vec![DOUBLE_NA]));
    }

    #[test]
    fn test_attributes_break_scalar_equality() {
        let mut v = Value::double_vec(vec![1.0]);
        v.attributes_mut()
            .unwrap()
            .set_names(Some(vec![RString::from("a")]));
        assert_ne!(v, Value::Double(1.0));
    }

    #[test]
    fn test_attributes_mut_widens_scalar() {
        let mut v = Value::Integer(1);
        v.attributes_mut()
            .unwrap()
            .set_regular("units", Some(Value::from("cm")));
        assert!(matches!(v, Value::IntVector(_)));
        assert!(v.get_attr("units").is_some());
        assert!(Value::Null.clone().attributes_mut().is_none());
    }

    #[test]
    fn test_scalar_form_round_trip() {
        let v = Value::int_vec(vec![7]).into_scalar_form();
        assert!(matches!(v, Value::Integer(7)));
        let v = Value::int_vec(vec![7, 8]).into_scalar_form();
        assert!(matches!(v, Value::IntVector(_)));
    }

    #[test]
    fn test_factor() {
        let f = Value::factor(vec![1, 2, 1], &["a", "b"]);
        assert!(f.is_factor());
        assert!(!Value::int_vec(vec![1]).is_factor());
        assert_eq!(f.effective_class(), vec!["factor".to_string()]);
    }

    #[test]
    fn test_implicit_class() {
        assert_eq!(Value::Double(1.0).effective_class(), vec!["numeric"]);
        assert_eq!(Value::Integer(1).effective_class(), vec!["integer"]);
        assert_eq!(Value::Null.effective_class(), vec!["NULL"]);
        let mut m = Vector::from_vec(vec![1.0; 4]);
        m.set_dim(Some(vec![2, 2])).unwrap();
        assert_eq!(
            Value::DoubleVector(m).effective_class(),
            vec!["matrix", "array", "numeric"]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::double_vec(vec![1.0, 2.5]).to_string(), "[1, 2.5]");
        assert_eq!(Value::na_integer().to_string(), "NA");
        assert_eq!(Value::string_vec(&["a"]).to_string(), "[\"a\"]");
    }
}

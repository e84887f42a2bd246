//! Argument shapes: the runtime type information guards look at.

use serde::{Deserialize, Serialize};
use subset_r_vm_runtime::Value;

/// Shape of one argument as seen by the dispatcher.
///
/// Scalar variants stand for attribute-free length-1 values; the vector
/// variants cover every other length and any vector with attributes.
/// A factor is an integer vector with class `factor` and gets its own shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgShape {
    Null,
    Missing,
    Logical,
    Integer,
    Double,
    Complex,
    Character,
    Raw,
    LogicalVector,
    IntVector,
    DoubleVector,
    ComplexVector,
    StringVector,
    RawVector,
    Factor,
    List,
    Environment,
    Function,
    Symbol,
    ExternalPointer,
    PairList,
    Promise,
}

impl ArgShape {
    pub fn of(value: &Value) -> ArgShape {
        match value {
            Value::Null => ArgShape::Null,
            Value::Missing => ArgShape::Missing,
            Value::Logical(_) => ArgShape::Logical,
            Value::Integer(_) => ArgShape::Integer,
            Value::Double(_) => ArgShape::Double,
            Value::Complex(_) => ArgShape::Complex,
            Value::Character(_) => ArgShape::Character,
            Value::Raw(_) => ArgShape::Raw,
            Value::LogicalVector(_) => ArgShape::LogicalVector,
            Value::IntVector(_) if value.is_factor() => ArgShape::Factor,
            Value::IntVector(_) => ArgShape::IntVector,
            Value::DoubleVector(_) => ArgShape::DoubleVector,
            Value::ComplexVector(_) => ArgShape::ComplexVector,
            Value::StringVector(_) => ArgShape::StringVector,
            Value::RawVector(_) => ArgShape::RawVector,
            Value::List(_) => ArgShape::List,
            Value::Environment(_) => ArgShape::Environment,
            Value::Function(_) => ArgShape::Function,
            Value::Symbol(_) => ArgShape::Symbol,
            Value::ExternalPointer(_) => ArgShape::ExternalPointer,
            Value::PairList(_) => ArgShape::PairList,
            Value::Promise(_) => ArgShape::Promise,
        }
    }

    /// `typeof()` name of values with this shape.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgShape::Null => "NULL",
            ArgShape::Missing => "missing",
            ArgShape::Logical | ArgShape::LogicalVector => "logical",
            ArgShape::Integer | ArgShape::IntVector | ArgShape::Factor => "integer",
            ArgShape::Double | ArgShape::DoubleVector => "double",
            ArgShape::Complex | ArgShape::ComplexVector => "complex",
            ArgShape::Character | ArgShape::StringVector => "character",
            ArgShape::Raw | ArgShape::RawVector => "raw",
            ArgShape::List => "list",
            ArgShape::Environment => "environment",
            ArgShape::Function => "builtin",
            ArgShape::Symbol => "symbol",
            ArgShape::ExternalPointer => "externalptr",
            ArgShape::PairList => "pairlist",
            ArgShape::Promise => "promise",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ArgShape::Logical
                | ArgShape::Integer
                | ArgShape::Double
                | ArgShape::Complex
                | ArgShape::Character
                | ArgShape::Raw
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, ArgShape::Logical | ArgShape::LogicalVector)
    }

    /// Integer data, factors excluded.
    pub fn is_integer(&self) -> bool {
        matches!(self, ArgShape::Integer | ArgShape::IntVector)
    }

    pub fn is_double(&self) -> bool {
        matches!(self, ArgShape::Double | ArgShape::DoubleVector)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ArgShape::Complex | ArgShape::ComplexVector)
    }

    pub fn is_character(&self) -> bool {
        matches!(self, ArgShape::Character | ArgShape::StringVector)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ArgShape::Raw | ArgShape::RawVector)
    }

    /// Logical, integer or double, not factor.
    pub fn is_numeric(&self) -> bool {
        self.is_logical() || self.is_integer() || self.is_double()
    }

    pub fn is_atomic(&self) -> bool {
        self.is_numeric()
            || self.is_complex()
            || self.is_character()
            || self.is_raw()
            || *self == ArgShape::Factor
    }

    /// Null or an absent optional argument.
    pub fn is_absent(&self) -> bool {
        matches!(self, ArgShape::Null | ArgShape::Missing)
    }
}

/// Shapes of a whole argument list, the key of a cache entry.
pub type ShapeKey = Box<[ArgShape]>;

pub fn shapes_of(args: &[Value]) -> ShapeKey {
    args.iter().map(ArgShape::of).collect()
}

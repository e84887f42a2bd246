//! Type tags and the coercion lattice.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RError, RResult};

/// Runtime type tag of a value.
///
/// The atomic members are ordered by the coercion lattice
/// `Logical < Integer < Double < Complex < Character < List`.
/// `Raw` sits outside the lattice; see [`RType::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RType {
    Null,
    Raw,
    Logical,
    Integer,
    Double,
    Complex,
    Character,
    List,
    Environment,
    Function,
    Symbol,
    ExternalPointer,
    PairList,
    Promise,
}

impl RType {
    /// Position in the coercion lattice, `None` for types outside it.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            RType::Logical => Some(0),
            RType::Integer => Some(1),
            RType::Double => Some(2),
            RType::Complex => Some(3),
            RType::Character => Some(4),
            RType::List => Some(5),
            _ => None,
        }
    }

    /// Name as reported by `typeof`.
    pub fn type_name(&self) -> &'static str {
        match self {
            RType::Null => "NULL",
            RType::Raw => "raw",
            RType::Logical => "logical",
            RType::Integer => "integer",
            RType::Double => "double",
            RType::Complex => "complex",
            RType::Character => "character",
            RType::List => "list",
            RType::Environment => "environment",
            RType::Function => "builtin",
            RType::Symbol => "symbol",
            RType::ExternalPointer => "externalptr",
            RType::PairList => "pairlist",
            RType::Promise => "promise",
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            RType::Raw
                | RType::Logical
                | RType::Integer
                | RType::Double
                | RType::Complex
                | RType::Character
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, RType::Logical | RType::Integer | RType::Double)
    }

    /// Least upper bound of two types, used when combining values.
    ///
    /// `Null` is the identity. Raw joins with itself and with the numeric
    /// members of the lattice (as integer data), but never with
    /// `Character` or `Complex`.
    pub fn join(self, other: RType) -> RResult<RType> {
        match (self, other) {
            (RType::Null, t) | (t, RType::Null) => Ok(t),
            (RType::Raw, RType::Raw) => Ok(RType::Raw),
            (RType::Raw, t) | (t, RType::Raw) => match t {
                RType::Logical => Ok(RType::Logical),
                RType::Integer | RType::Double => Ok(t),
                RType::List => Ok(RType::List),
                _ => Err(RError::type_error(format!(
                    "cannot coerce type 'raw' to vector of type '{}'",
                    t.type_name()
                ))),
            },
            (a, b) => match (a.precedence(), b.precedence()) {
                (Some(pa), Some(pb)) => Ok(if pa >= pb { a } else { b }),
                _ => Ok(RType::List),
            },
        }
    }
}

impl fmt::Display for RType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

//! Builtin function registry.
//!
//! Every builtin is described by a static [`BuiltinDescriptor`]: its name,
//! its formal parameters (with defaults and argument casts) and an ordered
//! list of [`Specialization`]s. A specialization pairs a guard over the
//! argument shapes with the function that handles those shapes. Guards of
//! one builtin are mutually exclusive by construction; if two ever match,
//! the first one listed wins.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use subset_r_vm_runtime::{Logical, RResult, Value, INT_NA};

use crate::session::Session;
use crate::vm::shape::ArgShape;
use crate::vm::{
    builtins_arith, builtins_attr, builtins_coerce, builtins_io, builtins_math,
    builtins_reduce, builtins_session, builtins_string, builtins_vector,
};

/// Implementation of one specialization. Receives the matched arguments in
/// formal-parameter order.
pub type BuiltinFn = fn(&mut Session, &[Value]) -> RResult<Value>;

/// Predicate over argument shapes.
pub type Guard = fn(&[ArgShape]) -> bool;

/// Builtin function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinId {
    // Math
    Abs,
    Sqrt,
    Floor,
    Ceiling,
    Round,
    Signif,
    Exp,
    Log,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
    IntDiv,
    // Reductions
    Sum,
    Prod,
    Max,
    Min,
    All,
    Any,
    PMax,
    PMin,
    // NA
    IsNa,
    AnyNa,
    // Strings
    Substr,
    CharMatch,
    Nchar,
    ToLower,
    ToUpper,
    // Vectors
    Tabulate,
    RepInt,
    RepLen,
    Combine, // c(...)
    Which,
    WhichMax,
    WhichMin,
    RowMeans,
    ColMeans,
    Length,
    // Coercion
    AsLogical,
    AsInteger,
    AsDouble,
    AsComplex,
    AsCharacter,
    // Attributes
    Attr,
    AttrAssign,
    Attributes,
    Dim,
    DimAssign,
    Names,
    NamesAssign,
    Class,
    OldClass,
    ClassAssign,
    UnClass,
    Inherits,
    Levels,
    // Session
    Options,
    GetOption,
    // Scoping and promises
    Force,
    DelayedAssign,
    Get,
    Assign,
    Exists,
    // Connections
    TextConnection,
    File,
    ReadLines,
    WriteLines,
    Close,
    // Dynamic libraries
    DynLoad,
    DynUnload,
    IsLoaded,
}

impl BuiltinId {
    pub const ALL: &'static [BuiltinId] = &[
        BuiltinId::Abs,
        BuiltinId::Sqrt,
        BuiltinId::Floor,
        BuiltinId::Ceiling,
        BuiltinId::Round,
        BuiltinId::Signif,
        BuiltinId::Exp,
        BuiltinId::Log,
        BuiltinId::Add,
        BuiltinId::Sub,
        BuiltinId::Mul,
        BuiltinId::Div,
        BuiltinId::Pow,
        BuiltinId::Mod,
        BuiltinId::IntDiv,
        BuiltinId::Sum,
        BuiltinId::Prod,
        BuiltinId::Max,
        BuiltinId::Min,
        BuiltinId::All,
        BuiltinId::Any,
        BuiltinId::PMax,
        BuiltinId::PMin,
        BuiltinId::IsNa,
        BuiltinId::AnyNa,
        BuiltinId::Substr,
        BuiltinId::CharMatch,
        BuiltinId::Nchar,
        BuiltinId::ToLower,
        BuiltinId::ToUpper,
        BuiltinId::Tabulate,
        BuiltinId::RepInt,
        BuiltinId::RepLen,
        BuiltinId::Combine,
        BuiltinId::Which,
        BuiltinId::WhichMax,
        BuiltinId::WhichMin,
        BuiltinId::RowMeans,
        BuiltinId::ColMeans,
        BuiltinId::Length,
        BuiltinId::AsLogical,
        BuiltinId::AsInteger,
        BuiltinId::AsDouble,
        BuiltinId::AsComplex,
        BuiltinId::AsCharacter,
        BuiltinId::Attr,
        BuiltinId::AttrAssign,
        BuiltinId::Attributes,
        BuiltinId::Dim,
        BuiltinId::DimAssign,
        BuiltinId::Names,
        BuiltinId::NamesAssign,
        BuiltinId::Class,
        BuiltinId::OldClass,
        BuiltinId::ClassAssign,
        BuiltinId::UnClass,
        BuiltinId::Inherits,
        BuiltinId::Levels,
        BuiltinId::Options,
        BuiltinId::GetOption,
        BuiltinId::Force,
        BuiltinId::DelayedAssign,
        BuiltinId::Get,
        BuiltinId::Assign,
        BuiltinId::Exists,
        BuiltinId::TextConnection,
        BuiltinId::File,
        BuiltinId::ReadLines,
        BuiltinId::WriteLines,
        BuiltinId::Close,
        BuiltinId::DynLoad,
        BuiltinId::DynUnload,
        BuiltinId::IsLoaded,
    ];

    /// Look up a builtin by the name it is called with.
    pub fn from_name(name: &str) -> Option<BuiltinId> {
        NAME_TABLE.get(name).copied()
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn descriptor(&self) -> &'static BuiltinDescriptor {
        descriptor(*self)
    }
}

static NAME_TABLE: Lazy<HashMap<&'static str, BuiltinId>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, BuiltinId> = BuiltinId::ALL
        .iter()
        .map(|id| (descriptor(*id).name, *id))
        .collect();
    table.insert("as.numeric", BuiltinId::AsDouble);
    table.insert("oldClass<-", BuiltinId::ClassAssign);
    table
});

/// Whether the builtin is callable directly or only through `.Internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinKind {
    Primitive,
    Internal,
}

/// Value used for a formal parameter the caller did not supply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    /// Not supplying the argument is an error.
    Required,
    /// The body sees [`Value::Missing`].
    Missing,
    Null,
    Logical(bool),
    LogicalNa,
    Integer(i32),
    IntegerNa,
    Double(f64),
    Str(&'static str),
}

impl ParamDefault {
    /// `None` for [`ParamDefault::Required`].
    pub fn to_value(&self) -> Option<Value> {
        Some(match *self {
            ParamDefault::Required => return None,
            ParamDefault::Missing => Value::Missing,
            ParamDefault::Null => Value::Null,
            ParamDefault::Logical(b) => Value::from(b),
            ParamDefault::LogicalNa => Value::Logical(Logical::NA),
            ParamDefault::Integer(i) => Value::Integer(i),
            ParamDefault::IntegerNa => Value::Integer(INT_NA),
            ParamDefault::Double(d) => Value::Double(d),
            ParamDefault::Str(s) => Value::from(s),
        })
    }
}

/// Coercion applied to an argument before its shape is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCast {
    None,
    ToInteger,
    ToDouble,
    ToLogical,
    ToCharacter,
}

/// Formal parameter of a builtin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub default: ParamDefault,
    pub cast: ArgCast,
    /// Promises passed here reach the body unforced.
    pub lazy: bool,
}

impl Parameter {
    pub const fn new(name: &'static str) -> Self {
        Parameter {
            name,
            default: ParamDefault::Required,
            cast: ArgCast::None,
            lazy: false,
        }
    }

    /// `...`: collects every argument not matched to another formal.
    pub const fn dots() -> Self {
        Parameter::new(DOTS).optional(ParamDefault::Null)
    }

    pub const fn optional(mut self, default: ParamDefault) -> Self {
        self.default = default;
        self
    }

    pub const fn cast(mut self, cast: ArgCast) -> Self {
        self.cast = cast;
        self
    }

    pub const fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn is_dots(&self) -> bool {
        self.name == DOTS
    }
}

pub const DOTS: &str = "...";

/// One typed implementation branch of a builtin.
#[derive(Clone, Copy)]
pub struct Specialization {
    pub name: &'static str,
    pub guard: Guard,
    pub body: BuiltinFn,
}

impl fmt::Debug for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specialization")
            .field("name", &self.name)
            .finish()
    }
}

/// Static description of a builtin.
#[derive(Debug)]
pub struct BuiltinDescriptor {
    pub id: BuiltinId,
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub parameters: &'static [Parameter],
    pub specializations: &'static [Specialization],
    /// Message of the type error raised when no guard accepts the
    /// arguments. `None` lists the offending types instead.
    pub type_error: Option<&'static str>,
}

impl BuiltinDescriptor {
    /// Index of the first specialization whose guard accepts `shapes`.
    pub fn select(&self, shapes: &[ArgShape]) -> Option<usize> {
        self.specializations
            .iter()
            .position(|s| (s.guard)(shapes))
    }

    pub fn has_dots(&self) -> bool {
        self.parameters.iter().any(|p| p.is_dots())
    }
}

/// Descriptor of a builtin.
pub fn descriptor(id: BuiltinId) -> &'static BuiltinDescriptor {
    match id {
        BuiltinId::Abs => &builtins_math::ABS,
        BuiltinId::Sqrt => &builtins_math::SQRT,
        BuiltinId::Floor => &builtins_math::FLOOR,
        BuiltinId::Ceiling => &builtins_math::CEILING,
        BuiltinId::Round => &builtins_math::ROUND,
        BuiltinId::Signif => &builtins_math::SIGNIF,
        BuiltinId::Exp => &builtins_math::EXP,
        BuiltinId::Log => &builtins_math::LOG,
        BuiltinId::Add => &builtins_arith::ADD,
        BuiltinId::Sub => &builtins_arith::SUB,
        BuiltinId::Mul => &builtins_arith::MUL,
        BuiltinId::Div => &builtins_arith::DIV,
        BuiltinId::Pow => &builtins_arith::POW,
        BuiltinId::Mod => &builtins_arith::MOD,
        BuiltinId::IntDiv => &builtins_arith::INT_DIV,
        BuiltinId::Sum => &builtins_reduce::SUM,
        BuiltinId::Prod => &builtins_reduce::PROD,
        BuiltinId::Max => &builtins_reduce::MAX,
        BuiltinId::Min => &builtins_reduce::MIN,
        BuiltinId::All => &builtins_reduce::ALL,
        BuiltinId::Any => &builtins_reduce::ANY,
        BuiltinId::PMax => &builtins_reduce::PMAX,
        BuiltinId::PMin => &builtins_reduce::PMIN,
        BuiltinId::IsNa => &builtins_reduce::IS_NA,
        BuiltinId::AnyNa => &builtins_reduce::ANY_NA,
        BuiltinId::Substr => &builtins_string::SUBSTR,
        BuiltinId::CharMatch => &builtins_string::CHARMATCH,
        BuiltinId::Nchar => &builtins_string::NCHAR,
        BuiltinId::ToLower => &builtins_string::TOLOWER,
        BuiltinId::ToUpper => &builtins_string::TOUPPER,
        BuiltinId::Tabulate => &builtins_vector::TABULATE,
        BuiltinId::RepInt => &builtins_vector::REP_INT,
        BuiltinId::RepLen => &builtins_vector::REP_LEN,
        BuiltinId::Combine => &builtins_vector::COMBINE,
        BuiltinId::Which => &builtins_vector::WHICH,
        BuiltinId::WhichMax => &builtins_vector::WHICH_MAX,
        BuiltinId::WhichMin => &builtins_vector::WHICH_MIN,
        BuiltinId::RowMeans => &builtins_vector::ROW_MEANS,
        BuiltinId::ColMeans => &builtins_vector::COL_MEANS,
        BuiltinId::Length => &builtins_vector::LENGTH,
        BuiltinId::AsLogical => &builtins_coerce::AS_LOGICAL,
        BuiltinId::AsInteger => &builtins_coerce::AS_INTEGER,
        BuiltinId::AsDouble => &builtins_coerce::AS_DOUBLE,
        BuiltinId::AsComplex => &builtins_coerce::AS_COMPLEX,
        BuiltinId::AsCharacter => &builtins_coerce::AS_CHARACTER,
        BuiltinId::Attr => &builtins_attr::ATTR,
        BuiltinId::AttrAssign => &builtins_attr::ATTR_ASSIGN,
        BuiltinId::Attributes => &builtins_attr::ATTRIBUTES,
        BuiltinId::Dim => &builtins_attr::DIM,
        BuiltinId::DimAssign => &builtins_attr::DIM_ASSIGN,
        BuiltinId::Names => &builtins_attr::NAMES,
        BuiltinId::NamesAssign => &builtins_attr::NAMES_ASSIGN,
        BuiltinId::Class => &builtins_attr::CLASS,
        BuiltinId::OldClass => &builtins_attr::OLD_CLASS,
        BuiltinId::ClassAssign => &builtins_attr::CLASS_ASSIGN,
        BuiltinId::UnClass => &builtins_attr::UNCLASS,
        BuiltinId::Inherits => &builtins_attr::INHERITS,
        BuiltinId::Levels => &builtins_attr::LEVELS,
        BuiltinId::Options => &builtins_session::OPTIONS,
        BuiltinId::GetOption => &builtins_session::GET_OPTION,
        BuiltinId::Force => &builtins_session::FORCE,
        BuiltinId::DelayedAssign => &builtins_session::DELAYED_ASSIGN,
        BuiltinId::Get => &builtins_session::GET,
        BuiltinId::Assign => &builtins_session::ASSIGN,
        BuiltinId::Exists => &builtins_session::EXISTS,
        BuiltinId::TextConnection => &builtins_io::TEXT_CONNECTION,
        BuiltinId::File => &builtins_io::FILE,
        BuiltinId::ReadLines => &builtins_io::READ_LINES,
        BuiltinId::WriteLines => &builtins_io::WRITE_LINES,
        BuiltinId::Close => &builtins_io::CLOSE,
        BuiltinId::DynLoad => &builtins_io::DYN_LOAD,
        BuiltinId::DynUnload => &builtins_io::DYN_UNLOAD,
        BuiltinId::IsLoaded => &builtins_io::IS_LOADED,
    }
}

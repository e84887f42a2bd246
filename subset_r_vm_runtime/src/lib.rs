//! SubsetRVM runtime library
//!
//! Value model and NA semantics shared by every builtin:
//!
//! - `Value` enum and copy-on-write `Vector<T>` with a completeness flag
//! - per-type NA sentinels and the `NaCheck` tracker
//! - vector recycling
//! - coercion along the logical < integer < double < complex < character
//!   lattice
//! - attribute storage and propagation
//! - environments and promises (`Thunk`)
//! - `RError` for error handling

pub mod attributes;
pub mod convert;
pub mod env;
pub mod error;
pub mod na;
pub mod na_check;
pub mod recycle;
pub mod thunk;
pub mod types;
pub mod value;
pub mod vector;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use subset_r_vm_runtime::prelude::*;
/// ```
pub mod prelude {
    pub use super::attributes::Attributes;
    pub use super::convert::{coerce, Coercer};
    pub use super::env::Environment;
    pub use super::error::{ErrorKind, RError, RResult};
    pub use super::na::{compare_strings, Element, Logical, RComplex, RString, DOUBLE_NA, INT_NA};
    pub use super::na_check::NaCheck;
    pub use super::recycle::{recycle, Recycling};
    pub use super::thunk::Thunk;
    pub use super::types::RType;
    pub use super::value::Value;
    pub use super::vector::Vector;
}

pub use prelude::*;

// Library code reports through `log` and `Session::warning`, never stderr.
#![deny(clippy::print_stderr)]

//! SubsetRVM: builtin functions of a subset of R with call-site
//! specialization.
//!
//! Each builtin is a set of typed specializations selected by guards over
//! the argument shapes. Call sites cache the selection and move through
//! uninitialized, monomorphic, polymorphic and megamorphic states.
//! NA semantics, recycling, coercion and attributes come from
//! `subset_r_vm_runtime`.

// Argument matching against builtin formals
pub mod args;

// Builtin registry: descriptors, parameters, specializations
pub mod builtins;

// Session configuration (TOML file and environment overrides)
pub mod config;

// Dynamic library loading
pub mod dynload;

// Connections
pub mod io;

// Options table
pub mod options;

// Per-interpreter state passed to builtins
pub mod session;

// Call evaluation and dispatch
pub mod vm;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use subset_r_vm::prelude::*;
///
/// let mut vm = Vm::new();
/// let v = vm.call_builtin("abs", vec![Arg::positional(-2)]).unwrap();
/// assert_eq!(v, Value::Integer(2));
/// ```
pub mod prelude {
    pub use crate::args::Arg;
    pub use crate::builtins::{BuiltinDescriptor, BuiltinId, BuiltinKind};
    pub use crate::config::{ConfigError, SessionConfig};
    pub use crate::dynload::{DllInfo, DllLoader};
    pub use crate::session::{Session, Warning};
    pub use crate::vm::{CacheState, CallSiteId, EvalError, Vm};
    pub use subset_r_vm_runtime::prelude::*;
}

pub use prelude::*;

use subset_r_vm_runtime::error::{ErrorKind, RError};

use crate::args::ArgMatchError;

/// Errors surfaced by a builtin call.
#[derive(Debug)]
pub enum EvalError {
    /// A builtin signalled an error; `call` is the builtin name.
    Builtin { call: &'static str, source: RError },
    /// Arguments could not be matched to the formals of `call`.
    ArgumentMatch {
        call: &'static str,
        source: ArgMatchError,
    },
    UnknownBuiltin(String),
    UnknownCallSite(u32),
}

impl EvalError {
    pub fn builtin(call: &'static str, source: RError) -> Self {
        Self::Builtin { call, source }
    }

    /// Kind tag of the underlying condition.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Builtin { source, .. } => source.kind(),
            Self::ArgumentMatch { .. } | Self::UnknownBuiltin(_) => ErrorKind::Value,
            Self::UnknownCallSite(_) => ErrorKind::Internal,
        }
    }

    /// Message without the `Error in` prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Builtin { source, .. } => source.message(),
            Self::ArgumentMatch { source, .. } => source.to_string(),
            Self::UnknownBuiltin(name) => format!("could not find function \"{}\"", name),
            Self::UnknownCallSite(id) => format!("unknown call site {}", id),
        }
    }

    pub fn rerror(&self) -> Option<&RError> {
        match self {
            Self::Builtin { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin { call, .. } | Self::ArgumentMatch { call, .. } => {
                write!(f, "Error in {}() : {}", call, self.message())
            }
            Self::UnknownBuiltin(_) | Self::UnknownCallSite(_) => {
                write!(f, "Error: {}", self.message())
            }
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Builtin { source, .. } => Some(source),
            Self::ArgumentMatch { source, .. } => Some(source),
            _ => None,
        }
    }
}

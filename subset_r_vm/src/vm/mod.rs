//! Builtin call evaluation.
//!
//! A [`Vm`] owns the session and the call-site dispatcher. A call goes
//! through argument matching, promise forcing, argument casts, shape
//! computation, call-site dispatch and finally the bound specialization.

pub(crate) mod builtins_arith;
pub(crate) mod builtins_attr;
pub(crate) mod builtins_coerce;
pub(crate) mod builtins_io;
pub(crate) mod builtins_math;
pub(crate) mod builtins_reduce;
pub(crate) mod builtins_session;
pub(crate) mod builtins_string;
pub(crate) mod builtins_vector;
pub mod dispatch;
pub mod error;
pub mod shape;
pub(crate) mod util;

use std::collections::HashMap;

use log::trace;
use subset_r_vm_runtime::{RResult, Value, Vector};

use crate::args::{apply_casts, match_arguments, Arg};
use crate::builtins::{BuiltinDescriptor, BuiltinId};
use crate::config::{ConfigError, SessionConfig};
use crate::session::Session;

pub use dispatch::{BoundImplementation, CacheState, CallSiteId, CallSiteStats, Dispatcher};
pub use error::EvalError;
pub use shape::{shapes_of, ArgShape};

#[derive(Debug)]
pub struct Vm {
    session: Session,
    dispatcher: Dispatcher,
    /// Call site used by [`Vm::call_builtin`] for each builtin.
    default_sites: HashMap<BuiltinId, CallSiteId>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            session: Session::new(),
            dispatcher: Dispatcher::default(),
            default_sites: HashMap::new(),
        }
    }

    pub fn with_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        Ok(Vm {
            session: Session::with_config(config)?,
            dispatcher: Dispatcher::new(config.dispatch.cache_limit),
            default_sites: HashMap::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Register a fresh call site for the builtin called `name`.
    pub fn call_site(&mut self, name: &str) -> Result<CallSiteId, EvalError> {
        let id = BuiltinId::from_name(name)
            .ok_or_else(|| EvalError::UnknownBuiltin(name.to_string()))?;
        Ok(self.dispatcher.new_site(id))
    }

    /// Call through a registered call site.
    pub fn call(&mut self, site: CallSiteId, args: Vec<Arg>) -> Result<Value, EvalError> {
        let builtin = self
            .dispatcher
            .site(site)
            .map(|s| s.builtin())
            .ok_or(EvalError::UnknownCallSite(site.0))?;
        let desc = builtin.descriptor();
        self.session.begin_call(desc.name);
        let result = self.call_inner(site, desc, args);
        self.session.end_call();
        result
    }

    /// Call `name` through a call site shared by every such call.
    pub fn call_builtin(&mut self, name: &str, args: Vec<Arg>) -> Result<Value, EvalError> {
        let id = BuiltinId::from_name(name)
            .ok_or_else(|| EvalError::UnknownBuiltin(name.to_string()))?;
        let dispatcher = &mut self.dispatcher;
        let site = *self
            .default_sites
            .entry(id)
            .or_insert_with(|| dispatcher.new_site(id));
        self.call(site, args)
    }

    fn call_inner(
        &mut self,
        site: CallSiteId,
        desc: &'static BuiltinDescriptor,
        args: Vec<Arg>,
    ) -> Result<Value, EvalError> {
        let fail = |source| EvalError::builtin(desc.name, source);
        let mut values =
            match_arguments(desc, args).map_err(|source| EvalError::ArgumentMatch {
                call: desc.name,
                source,
            })?;
        force_arguments(desc, &mut values).map_err(fail)?;
        apply_casts(desc, &mut values).map_err(fail)?;

        let shapes = shapes_of(&values);
        let bound = self
            .dispatcher
            .dispatch(site, &shapes)
            .ok_or(EvalError::UnknownCallSite(site.0))?
            .map_err(fail)?;
        trace!("{}: {}", desc.name, bound.name());
        bound.invoke(&mut self.session, &values).map_err(fail)
    }
}

/// Force promises bound to strict parameters, including those collected
/// into `...`.
fn force_arguments(desc: &BuiltinDescriptor, values: &mut [Value]) -> RResult<()> {
    for (param, value) in desc.parameters.iter().zip(values.iter_mut()) {
        if param.lazy {
            continue;
        }
        match value {
            Value::Promise(thunk) => *value = thunk.force()?,
            Value::List(items) if param.is_dots() => {
                if items.iter().any(|v| matches!(v, Value::Promise(_))) {
                    let forced = items
                        .iter()
                        .map(|v| match v {
                            Value::Promise(t) => t.force(),
                            other => Ok(other.clone()),
                        })
                        .collect::<RResult<Vec<_>>>()?;
                    let attrs = items.attributes().clone();
                    *value = Value::List(Vector::new(forced, true).with_attributes(attrs));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

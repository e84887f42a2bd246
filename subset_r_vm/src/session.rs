//! Per-interpreter mutable state seen by builtins.
//!
//! Everything a builtin may read or change besides its arguments lives
//! here: the options table, pending warnings, the visibility flag of the
//! last result, the global environment, connections and loaded libraries.
//! A session is passed explicitly to every builtin body.

use log::warn;
use subset_r_vm_runtime::{Environment, RResult, Value};

use crate::config::{ConfigError, SessionConfig};
use crate::dynload::{DllLoader, DllRegistry};
use crate::io::ConnectionTable;
use crate::options::Options;

/// A warning raised during a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Builtin that raised it, if raised inside a call.
    pub call: Option<&'static str>,
    pub message: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.call {
            Some(call) => write!(f, "Warning message:\nIn {}() : {}", call, self.message),
            None => write!(f, "Warning message:\n{}", self.message),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub options: Options,
    pub connections: ConnectionTable,
    pub dlls: DllRegistry,
    global_env: Environment,
    warnings: Vec<Warning>,
    max_warnings: usize,
    visible: bool,
    current_call: Option<&'static str>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            options: Options::new(),
            connections: ConnectionTable::new(),
            dlls: DllRegistry::default(),
            global_env: Environment::new_root("R_GlobalEnv"),
            warnings: Vec::new(),
            max_warnings: 50,
            visible: true,
            current_call: None,
        }
    }

    /// Session with the configured options applied over the defaults.
    pub fn with_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        let mut session = Session::new();
        session.max_warnings = config.max_warnings.max(1);
        for (name, value) in config.option_values()? {
            session
                .options
                .set(&name, value)
                .map_err(|e| ConfigError::InvalidOption {
                    name: name.clone(),
                    message: e.message(),
                })?;
        }
        Ok(session)
    }

    pub fn set_dll_loader(&mut self, loader: Box<dyn DllLoader>) {
        self.dlls.set_loader(loader);
    }

    pub fn global_env(&self) -> &Environment {
        &self.global_env
    }

    // ==================== Warnings ====================

    /// Record a warning against the current call.
    pub fn warning<S: Into<String>>(&mut self, message: S) {
        let w = Warning {
            call: self.current_call,
            message: message.into(),
        };
        warn!("{}", w.message);
        let limit = self
            .options
            .integer("nwarnings")
            .map(|n| n.max(1) as usize)
            .unwrap_or(self.max_warnings)
            .min(self.max_warnings);
        if self.warnings.len() >= limit {
            self.warnings.remove(0);
        }
        self.warnings.push(w);
    }

    /// Record each warning collected by a coercion.
    pub fn warnings_from(&mut self, messages: Vec<&'static str>) {
        for m in messages {
            self.warning(m);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    // ==================== Call state ====================

    /// Reset per-call state before a builtin runs.
    pub fn begin_call(&mut self, call: &'static str) {
        self.current_call = Some(call);
        self.visible = true;
    }

    pub fn end_call(&mut self) {
        self.current_call = None;
    }

    pub fn current_call(&self) -> Option<&'static str> {
        self.current_call
    }

    /// Mark the result of the current call as printed or not at top level.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Return `value` invisibly.
    pub fn invisible(&mut self, value: Value) -> RResult<Value> {
        self.visible = false;
        Ok(value)
    }
}

//! Environments: ordered, mutable name → value frames with a parent chain.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{RError, RResult};
use crate::value::Value;

struct Frame {
    name: String,
    names: Vec<String>,
    values: HashMap<String, Value>,
    parent: Option<Environment>,
    locked: bool,
}

/// Shared handle to an environment frame. Clones alias the same frame.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    /// A root environment without parent.
    pub fn new_root<S: Into<String>>(name: S) -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            name: name.into(),
            names: Vec::new(),
            values: HashMap::new(),
            parent: None,
            locked: false,
        })))
    }

    pub fn new_child<S: Into<String>>(parent: &Environment, name: S) -> Self {
        let env = Environment::new_root(name);
        env.0.borrow_mut().parent = Some(parent.clone());
        env
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binding names in definition order.
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().names.clone()
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().values.contains_key(name)
    }

    /// Binding in this frame only. Promises are returned unforced.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.0.borrow().values.get(name).cloned()
    }

    /// Binding in this frame or the nearest ancestor defining `name`.
    /// Promises are returned unforced.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            if let Some(v) = e.get_local(name) {
                return Some(v);
            }
            env = e.parent();
        }
        None
    }

    /// Like [`lookup`](Self::lookup), forcing a promise binding.
    pub fn lookup_forced(&self, name: &str) -> RResult<Option<Value>> {
        match self.lookup(name) {
            Some(Value::Promise(p)) => p.force().map(Some),
            other => Ok(other),
        }
    }

    pub fn assign<S: Into<String>>(&self, name: S, value: Value) -> RResult<()> {
        let name = name.into();
        let mut frame = self.0.borrow_mut();
        if !frame.values.contains_key(&name) {
            if frame.locked {
                return Err(RError::value_error(
                    "cannot add bindings to a locked environment",
                ));
            }
            frame.names.push(name.clone());
        }
        frame.values.insert(name, value);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> bool {
        let mut frame = self.0.borrow_mut();
        if frame.values.remove(name).is_some() {
            frame.names.retain(|n| n != name);
            true
        } else {
            false
        }
    }

    /// Forbid new bindings. Existing bindings stay writable.
    pub fn lock(&self) {
        self.0.borrow_mut().locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.0.borrow().locked
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        f.debug_struct("Environment")
            .field("name", &frame.name)
            .field("bindings", &frame.names)
            .finish()
    }
}

//! Promises: deferred computations evaluated at most once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::env::Environment;
use crate::error::{RError, RResult};
use crate::value::Value;

/// The deferred expression. Parsing is out of scope, so an expression is
/// any Rust closure evaluated in the captured environment.
pub type ThunkExpr = Rc<dyn Fn(&Environment) -> RResult<Value>>;

enum ThunkState {
    Pending { expr: ThunkExpr, env: Environment },
    Forcing { expr: ThunkExpr, env: Environment },
    Forced(Value),
}

/// A promise. Clones share state, so forcing one forces all of them.
#[derive(Clone)]
pub struct Thunk(Rc<RefCell<ThunkState>>);

impl Thunk {
    pub fn new<F>(env: &Environment, expr: F) -> Self
    where
        F: Fn(&Environment) -> RResult<Value> + 'static,
    {
        Thunk(Rc::new(RefCell::new(ThunkState::Pending {
            expr: Rc::new(expr),
            env: env.clone(),
        })))
    }

    /// An already evaluated promise.
    pub fn evaluated(value: Value) -> Self {
        Thunk(Rc::new(RefCell::new(ThunkState::Forced(value))))
    }

    pub fn is_forced(&self) -> bool {
        matches!(*self.0.borrow(), ThunkState::Forced(_))
    }

    /// Evaluate once and memoize. Forcing a promise from inside its own
    /// evaluation is an error; a failed evaluation leaves the promise
    /// pending so it can be forced again.
    pub fn force(&self) -> RResult<Value> {
        let (expr, env) = {
            let mut state = self.0.borrow_mut();
            match &*state {
                ThunkState::Forced(v) => return Ok(v.clone()),
                ThunkState::Forcing { .. } => {
                    return Err(RError::value_error(
                        "promise already under evaluation: recursive default argument reference or earlier problems?",
                    ))
                }
                ThunkState::Pending { expr, env } => {
                    let (expr, env) = (expr.clone(), env.clone());
                    *state = ThunkState::Forcing {
                        expr: expr.clone(),
                        env: env.clone(),
                    };
                    (expr, env)
                }
            }
        };

        let result = expr(&env);
        let mut state = self.0.borrow_mut();
        match result {
            Ok(value) => {
                *state = ThunkState::Forced(value.clone());
                Ok(value)
            }
            Err(e) => {
                *state = ThunkState::Pending { expr, env };
                Err(e)
            }
        }
    }

    /// The memoized value, if forced.
    pub fn value(&self) -> Option<Value> {
        match &*self.0.borrow() {
            ThunkState::Forced(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Thunk {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.0.borrow() {
            ThunkState::Pending { .. } => "pending",
            ThunkState::Forcing { .. } => "forcing",
            ThunkState::Forced(_) => "forced",
        };
        write!(f, "Thunk({})", state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_force_memoizes() {
        let env = Environment::new_root("e");
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let thunk = Thunk::new(&env, move |_| {
            counter.set(counter.get() + 1);
            Ok(Value::Integer(42))
        });
        assert!(!thunk.is_forced());
        assert_eq!(thunk.force().unwrap(), Value::Integer(42));
        assert_eq!(thunk.force().unwrap(), Value::Integer(42));
        assert_eq!(calls.get(), 1);
        assert!(thunk.is_forced());
    }

    #[test]
    fn test_evaluates_in_captured_environment() {
        let env = Environment::new_root("e");
        env.assign("x", Value::Double(2.0)).unwrap();
        let thunk = Thunk::new(&env, |env| {
            env.lookup("x")
                .ok_or_else(|| RError::value_error("object 'x' not found"))
        });
        assert_eq!(thunk.force().unwrap(), Value::Double(2.0));
    }

    #[test]
    fn test_self_reference_is_an_error() {
        let env = Environment::new_root("e");
        let thunk = Thunk::new(&env, |env| match env.lookup("p") {
            Some(Value::Promise(p)) => p.force(),
            _ => Ok(Value::Null),
        });
        env.assign("p", Value::Promise(thunk.clone())).unwrap();
        let err = thunk.force().unwrap_err();
        assert!(err.to_string().contains("promise already under evaluation"));
        assert!(!thunk.is_forced());
    }

    #[test]
    fn test_failed_force_can_retry() {
        let env = Environment::new_root("e");
        let thunk = Thunk::new(&env, |env| {
            env.lookup("y")
                .ok_or_else(|| RError::value_error("object 'y' not found"))
        });
        assert!(thunk.force().is_err());
        env.assign("y", Value::Integer(1)).unwrap();
        assert_eq!(thunk.force().unwrap(), Value::Integer(1));
    }
}

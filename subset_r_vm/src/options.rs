//! The options table behind `options()` and `getOption()`.
//!
//! Owned by the [`Session`](crate::session::Session); nothing here is
//! process-global. Options with a known meaning are validated (and
//! normalized) on every write; any other name is stored as given.

use std::collections::BTreeMap;

use subset_r_vm_runtime::convert::Coercer;
use subset_r_vm_runtime::{Element, Logical, RError, RResult, RString, Value};

/// Options present in every fresh session.
pub fn defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("add.smooth", Value::from(true)),
        ("browserNLdisabled", Value::from(false)),
        ("CBoundsCheck", Value::from(false)),
        ("check.bounds", Value::from(false)),
        ("continue", Value::from("+ ")),
        ("deparse.cutoff", Value::Integer(60)),
        ("digits", Value::Integer(7)),
        ("echo", Value::from(true)),
        ("encoding", Value::from("native.enc")),
        ("expressions", Value::Integer(5000)),
        ("keep.source", Value::from(false)),
        ("keep.source.pkgs", Value::from(false)),
        ("nwarnings", Value::Integer(50)),
        ("OutDec", Value::from(".")),
        ("prompt", Value::from("> ")),
        ("verbose", Value::from(false)),
        ("warn", Value::Integer(0)),
        ("warning.length", Value::Integer(1000)),
        ("width", Value::Integer(80)),
    ]
}

const LOGICAL_OPTIONS: &[&str] = &[
    "browserNLdisabled",
    "CBoundsCheck",
    "check.bounds",
    "echo",
    "keep.source",
    "keep.source.pkgs",
    "show.error.messages",
    "showErrorCalls",
    "showWarnCalls",
    "verbose",
    "warnPartialMatchArgs",
    "warnPartialMatchAttr",
    "warnPartialMatchDollar",
];

/// Inclusive bounds of the integer-valued options.
const INTEGER_RANGES: &[(&str, i32, i32)] = &[
    ("width", 10, 10000),
    ("digits", 0, 22),
    ("expressions", 25, 500_000),
    ("warning.length", 100, 8170),
    ("deparse.cutoff", 20, 500),
    ("nwarnings", 1, i32::MAX),
    ("max.print", 1, i32::MAX),
    ("showNCalls", 30, 500),
    ("warn", i32::MIN + 1, i32::MAX),
];

const NONEMPTY_STRING_OPTIONS: &[&str] = &["prompt", "continue", "editor"];

fn invalid(name: &str) -> RError {
    RError::value_error(format!("invalid value for '{}'", name))
}

/// Validate and normalize a value about to be stored under `name`.
pub fn check(name: &str, value: Value) -> RResult<Value> {
    if let Some((_, lo, hi)) = INTEGER_RANGES.iter().find(|(n, _, _)| *n == name) {
        if value.len() != 1 || !(value.rtype().is_numeric()) {
            return Err(invalid(name));
        }
        let i = Coercer::lenient()
            .integer(&value)
            .ok()
            .and_then(|v| v.get(0).copied())
            .filter(|i| !i.is_na())
            .ok_or_else(|| invalid(name))?;
        if i < *lo || i > *hi {
            return Err(invalid(name));
        }
        return Ok(Value::Integer(i));
    }
    if LOGICAL_OPTIONS.contains(&name) {
        return match value.clone().into_scalar_form() {
            Value::Logical(l) if l != Logical::NA => Ok(Value::Logical(l)),
            _ => Err(invalid(name)),
        };
    }
    if NONEMPTY_STRING_OPTIONS.contains(&name) {
        return match value.as_strings().as_deref() {
            Some([first, ..]) if first.as_str().is_some_and(|s| !s.is_empty()) => Ok(value),
            _ => Err(invalid(name)),
        };
    }
    match name {
        "OutDec" => match value.as_str() {
            Some(s) if value.len() == 1 && s.chars().count() == 1 => Ok(value),
            _ => Err(invalid(name)),
        },
        "contrasts" => match value.as_strings() {
            Some(v) if v.len() == 2 => Ok(value),
            _ => Err(invalid(name)),
        },
        "par.ask.default" => Err(RError::value_error(
            "\"par.ask.default\" has been replaced by \"device.ask.default\"",
        )),
        _ => Ok(value),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    table: BTreeMap<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    pub fn new() -> Self {
        let table = defaults()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Options { table }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.table.get(name)
    }

    /// Set `name`, returning the previous value. `NULL` removes the option.
    pub fn set(&mut self, name: &str, value: Value) -> RResult<Option<Value>> {
        if value.is_null() {
            return Ok(self.table.remove(name));
        }
        let value = check(name, value)?;
        Ok(self.table.insert(name.to_string(), value))
    }

    /// Logical option as a bool; absent or non-logical is `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Value::Logical(Logical::True)))
    }

    /// Integer option, if set to an integer.
    pub fn integer(&self, name: &str) -> Option<i32> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(|k| k.as_str())
    }

    /// All options as a named list sorted by name.
    pub fn to_list(&self) -> Value {
        Value::named_list(
            self.table
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Name of an option given as a string argument to `options()`.
pub fn option_name(value: &Value) -> Option<String> {
    value
        .as_strings()
        .and_then(|v| v.into_iter().next())
        .and_then(|s: RString| s.as_str().map(str::to_string))
}

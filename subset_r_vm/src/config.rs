//! Session configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! max_warnings = 50
//!
//! [dispatch]
//! cache_limit = 3
//!
//! [options]
//! digits = 10
//! prompt = "R> "
//! verbose = true
//! ```
//!
//! and then overlaid with environment variables by
//! [`SessionConfig::with_env_overrides`].

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use subset_r_vm_runtime::{RString, Value};
use thiserror::Error;

use crate::vm::dispatch::DEFAULT_CACHE_LIMIT;

pub const CACHE_LIMIT_ENV: &str = "SUBSET_R_VM_CACHE_LIMIT";
pub const KEEP_SOURCE_ENV: &str = "R_KEEP_PKG_SOURCE";
pub const C_BOUNDS_CHECK_ENV: &str = "R_C_BOUNDS_CHECK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("invalid config: {message}")]
    Parse { message: String },
    #[error("option '{name}': {message}")]
    InvalidOption { name: String, message: String },
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Distinct argument shapes a call site caches before going megamorphic.
    pub cache_limit: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            cache_limit: DEFAULT_CACHE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dispatch: DispatchConfig,
    /// Initial option values, applied over the defaults.
    pub options: BTreeMap<String, toml::Value>,
    /// Warnings kept on the session before older ones are dropped.
    pub max_warnings: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            dispatch: DispatchConfig::default(),
            options: BTreeMap::new(),
            max_warnings: 50,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| env::var(var).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to
    /// its value.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CACHE_LIMIT_ENV) {
            self.dispatch.cache_limit =
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: CACHE_LIMIT_ENV,
                        value: raw.clone(),
                    })?;
        }
        if lookup(KEEP_SOURCE_ENV).as_deref() == Some("yes") {
            self.options
                .insert("keep.source".to_string(), toml::Value::Boolean(true));
            self.options
                .insert("keep.source.pkgs".to_string(), toml::Value::Boolean(true));
        }
        if lookup(C_BOUNDS_CHECK_ENV).as_deref() == Some("yes") {
            self.options
                .insert("CBoundsCheck".to_string(), toml::Value::Boolean(true));
        }
        Ok(self)
    }

    /// The `[options]` table as values.
    pub fn option_values(&self) -> Result<Vec<(String, Value)>, ConfigError> {
        self.options
            .iter()
            .map(|(name, v)| toml_to_value(name, v).map(|v| (name.clone(), v)))
            .collect()
    }
}

fn toml_to_value(name: &str, v: &toml::Value) -> Result<Value, ConfigError> {
    let unsupported = || ConfigError::InvalidOption {
        name: name.to_string(),
        message: format!("unsupported value type {}", v.type_str()),
    };
    Ok(match v {
        toml::Value::Boolean(b) => Value::from(*b),
        toml::Value::Integer(i) => match i32::try_from(*i) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Double(*i as f64),
        },
        toml::Value::Float(f) => Value::Double(*f),
        toml::Value::String(s) => Value::from(s.as_str()),
        toml::Value::Array(items) => {
            if items.iter().all(|i| i.is_str()) {
                Value::string_vec_from(
                    items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .map(RString::from)
                        .collect(),
                )
            } else if items.iter().all(|i| i.is_integer() || i.is_float()) {
                Value::double_vec(
                    items
                        .iter()
                        .filter_map(|i| i.as_float().or_else(|| i.as_integer().map(|n| n as f64)))
                        .collect(),
                )
            } else {
                return Err(unsupported());
            }
        }
        _ => return Err(unsupported()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SessionConfig::default();
        assert_eq!(c.dispatch.cache_limit, 3);
        assert_eq!(c.max_warnings, 50);
        assert!(c.options.is_empty());
    }

    #[test]
    fn test_parse() {
        let c = SessionConfig::from_toml_str(
            r#"
max_warnings = 10

[dispatch]
cache_limit = 5

[options]
digits = 10
prompt = "R> "
verbose = true
"#,
        )
        .unwrap();
        assert_eq!(c.dispatch.cache_limit, 5);
        assert_eq!(c.max_warnings, 10);
        let values = c.option_values().unwrap();
        assert!(values.contains(&("digits".to_string(), Value::Integer(10))));
        assert!(values.contains(&("prompt".to_string(), Value::from("R> "))));
        assert!(values.contains(&("verbose".to_string(), Value::from(true))));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let c = SessionConfig::from_toml_str("[options]\nwidth = 100\n").unwrap();
        assert_eq!(c.dispatch.cache_limit, DEFAULT_CACHE_LIMIT);
    }

    #[test]
    fn test_parse_error() {
        let err = SessionConfig::from_toml_str("[dispatch\ncache_limit = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let c = SessionConfig::default()
            .with_overrides_from(|var| match var {
                CACHE_LIMIT_ENV => Some("7".to_string()),
                KEEP_SOURCE_ENV => Some("yes".to_string()),
                C_BOUNDS_CHECK_ENV => Some("no".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(c.dispatch.cache_limit, 7);
        assert_eq!(c.options.get("keep.source"), Some(&toml::Value::Boolean(true)));
        assert!(!c.options.contains_key("CBoundsCheck"));
    }

    #[test]
    fn test_bad_env_limit() {
        let err = SessionConfig::default()
            .with_overrides_from(|var| (var == CACHE_LIMIT_ENV).then(|| "many".to_string()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'many' for SUBSET_R_VM_CACHE_LIMIT"
        );
    }

    #[test]
    fn test_unsupported_option_type() {
        let c = SessionConfig::from_toml_str("[options.nested]\na = 1\n").unwrap();
        assert!(matches!(
            c.option_values().unwrap_err(),
            ConfigError::InvalidOption { .. }
        ));
    }
}

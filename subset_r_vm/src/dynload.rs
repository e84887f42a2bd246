//! Dynamic library registry behind `dyn.load`, `dyn.unload` and
//! `is.loaded`.
//!
//! Loading native code is delegated to a [`DllLoader`]. The default
//! [`RefusingLoader`] loads nothing; embedders supply a real loader.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::debug;
use subset_r_vm_runtime::attributes::CLASS;
use subset_r_vm_runtime::{RError, RResult, RString, Value};

/// A loaded library and the symbols it exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DllInfo {
    /// File name without directory and extension.
    pub name: String,
    pub path: String,
    pub dynamic_lookup: bool,
    /// Symbol name to address.
    pub symbols: BTreeMap<String, usize>,
}

impl DllInfo {
    pub fn new<S: Into<String>>(path: S) -> Self {
        let path = path.into();
        let name = Path::new(&path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&path)
            .to_string();
        DllInfo {
            name,
            path,
            dynamic_lookup: true,
            symbols: BTreeMap::new(),
        }
    }

    pub fn with_symbol<S: Into<String>>(mut self, symbol: S, address: usize) -> Self {
        self.symbols.insert(symbol.into(), address);
        self
    }

    pub fn find_symbol(&self, symbol: &str) -> Option<usize> {
        self.symbols.get(symbol).copied()
    }

    /// `list(name=, path=, dynamicLookup=)` with class `DLLInfo`.
    pub fn to_value(&self) -> Value {
        let mut list = Value::named_list(vec![
            ("name".to_string(), Value::from(self.name.as_str())),
            ("path".to_string(), Value::from(self.path.as_str())),
            ("dynamicLookup".to_string(), Value::from(self.dynamic_lookup)),
        ]);
        if let Some(attrs) = list.attributes_mut() {
            attrs.set_class(Some(vec![RString::from("DLLInfo")]));
        }
        list
    }
}

/// Loads and unloads native libraries.
pub trait DllLoader: fmt::Debug {
    fn load(&mut self, path: &str, local: bool, now: bool) -> RResult<DllInfo>;

    fn unload(&mut self, info: &DllInfo) -> RResult<()>;
}

/// Loader that refuses every library.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefusingLoader;

impl DllLoader for RefusingLoader {
    fn load(&mut self, path: &str, _local: bool, _now: bool) -> RResult<DllInfo> {
        Err(RError::io_message(format!(
            "unable to load shared object '{}'",
            path
        )))
    }

    fn unload(&mut self, info: &DllInfo) -> RResult<()> {
        Err(RError::io_message(format!(
            "shared object '{}' was not loaded",
            info.path
        )))
    }
}

/// Libraries loaded in one session, in load order.
#[derive(Debug)]
pub struct DllRegistry {
    loader: Box<dyn DllLoader>,
    loaded: Vec<DllInfo>,
}

impl Default for DllRegistry {
    fn default() -> Self {
        Self::new(Box::new(RefusingLoader))
    }
}

impl DllRegistry {
    pub fn new(loader: Box<dyn DllLoader>) -> Self {
        DllRegistry {
            loader,
            loaded: Vec::new(),
        }
    }

    pub fn set_loader(&mut self, loader: Box<dyn DllLoader>) {
        self.loader = loader;
    }

    /// Load `path`; loading an already loaded path returns the existing
    /// entry.
    pub fn load(&mut self, path: &str, local: bool, now: bool) -> RResult<&DllInfo> {
        if let Some(i) = self.loaded.iter().position(|d| d.path == path) {
            return Ok(&self.loaded[i]);
        }
        let info = self.loader.load(path, local, now)?;
        debug!("loaded {} ({} symbols)", info.path, info.symbols.len());
        self.loaded.push(info);
        let last = self.loaded.len() - 1;
        Ok(&self.loaded[last])
    }

    pub fn unload(&mut self, path: &str) -> RResult<()> {
        let i = self
            .loaded
            .iter()
            .position(|d| d.path == path)
            .ok_or_else(|| {
                RError::io_message(format!("shared object '{}' was not loaded", path))
            })?;
        self.loader.unload(&self.loaded[i])?;
        let info = self.loaded.remove(i);
        debug!("unloaded {}", info.path);
        Ok(())
    }

    /// Whether `symbol` is exported by a loaded library. A non-empty
    /// `package` restricts the search to the library of that name.
    pub fn is_loaded(&self, symbol: &str, package: &str) -> bool {
        self.loaded
            .iter()
            .filter(|d| package.is_empty() || d.name == package)
            .any(|d| d.find_symbol(symbol).is_some())
    }

    pub fn loaded(&self) -> &[DllInfo] {
        &self.loaded
    }
}

/// Whether `value` is a `DLLInfo` list.
pub fn is_dll_info(value: &Value) -> bool {
    value
        .get_attr(CLASS)
        .and_then(|c| c.as_str().map(|s| s == "DLLInfo"))
        .unwrap_or(false)
}

//! Per-call-site specialization cache.
//!
//! Each call site moves through
//!
//! ```text
//! Uninitialized --first call--> Monomorphic --new shape--> Polymorphic
//!                                   |                          |
//!                                   +---- more than limit -----+--> Megamorphic
//! ```
//!
//! A cached entry maps an exact argument-shape key to the specialization
//! selected for it. Guards only look at shapes, so an entry never goes
//! stale. Once a site has seen more distinct shapes than the limit it
//! drops its entries and binds the generic path, which re-runs guard
//! selection on every call and never specializes again.

use std::collections::HashMap;

use log::{debug, trace};
use subset_r_vm_runtime::{RError, RResult, Value};

use crate::builtins::{BuiltinDescriptor, BuiltinId};
use crate::session::Session;
use crate::vm::shape::{ArgShape, ShapeKey};

/// Number of distinct shapes a call site caches before going megamorphic.
pub const DEFAULT_CACHE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSiteId(pub u32);

/// Implementation bound to a call for one argument-shape combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundImplementation {
    /// A specific specialization of the builtin.
    Specialized { builtin: BuiltinId, index: usize },
    /// Guard selection on every call.
    Generic(BuiltinId),
}

impl BoundImplementation {
    pub fn builtin(&self) -> BuiltinId {
        match self {
            Self::Specialized { builtin, .. } | Self::Generic(builtin) => *builtin,
        }
    }

    /// Name of the specialization, or `"generic"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Specialized { builtin, index } => builtin
                .descriptor()
                .specializations
                .get(*index)
                .map(|s| s.name)
                .unwrap_or("?"),
            Self::Generic(_) => "generic",
        }
    }

    /// Run the implementation on matched, cast arguments.
    pub fn invoke(&self, session: &mut Session, args: &[Value]) -> RResult<Value> {
        match *self {
            Self::Specialized { builtin, index } => {
                let desc = builtin.descriptor();
                let spec = desc.specializations.get(index).ok_or_else(|| {
                    RError::internal(format!("{}: no specialization {}", desc.name, index))
                })?;
                (spec.body)(session, args)
            }
            Self::Generic(builtin) => {
                let desc = builtin.descriptor();
                let shapes: Vec<ArgShape> = args.iter().map(ArgShape::of).collect();
                match desc.select(&shapes) {
                    Some(index) => (desc.specializations[index].body)(session, args),
                    None => Err(unsupported_shapes(desc, &shapes)),
                }
            }
        }
    }
}

/// Type error for argument shapes no guard accepts.
pub fn unsupported_shapes(desc: &BuiltinDescriptor, shapes: &[ArgShape]) -> RError {
    if let Some(message) = desc.type_error {
        return RError::type_error(message);
    }
    let types: Vec<&str> = shapes
        .iter()
        .filter(|s| **s != ArgShape::Missing)
        .map(|s| s.type_name())
        .collect();
    RError::type_error(format!(
        "invalid argument types ({}) for '{}'",
        types.join(", "),
        desc.name
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: ShapeKey,
    pub bound: BoundImplementation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheState {
    #[default]
    Uninitialized,
    Monomorphic(CacheEntry),
    Polymorphic(Vec<CacheEntry>),
    Megamorphic,
}

impl CacheState {
    pub fn label(&self) -> &'static str {
        match self {
            CacheState::Uninitialized => "uninitialized",
            CacheState::Monomorphic(_) => "monomorphic",
            CacheState::Polymorphic(_) => "polymorphic",
            CacheState::Megamorphic => "megamorphic",
        }
    }

    fn lookup(&self, shapes: &[ArgShape]) -> Option<BoundImplementation> {
        match self {
            CacheState::Monomorphic(e) if &*e.key == shapes => Some(e.bound),
            CacheState::Polymorphic(entries) => entries
                .iter()
                .find(|e| &*e.key == shapes)
                .map(|e| e.bound),
            _ => None,
        }
    }

    pub fn entry_count(&self) -> usize {
        match self {
            CacheState::Monomorphic(_) => 1,
            CacheState::Polymorphic(entries) => entries.len(),
            _ => 0,
        }
    }
}

/// Counters for one call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSiteStats {
    pub hits: u64,
    pub misses: u64,
    pub generic_calls: u64,
}

/// Cache owned by one call site.
#[derive(Debug, Clone)]
pub struct CallSite {
    id: CallSiteId,
    builtin: BuiltinId,
    limit: usize,
    state: CacheState,
    stats: CallSiteStats,
}

impl CallSite {
    pub fn new(id: CallSiteId, builtin: BuiltinId, limit: usize) -> Self {
        CallSite {
            id,
            builtin,
            limit: limit.max(1),
            state: CacheState::Uninitialized,
            stats: CallSiteStats::default(),
        }
    }

    pub fn id(&self) -> CallSiteId {
        self.id
    }

    pub fn builtin(&self) -> BuiltinId {
        self.builtin
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    pub fn stats(&self) -> CallSiteStats {
        self.stats
    }

    /// Select the implementation for `shapes`, updating the cache.
    ///
    /// Shapes no guard accepts are a type error and leave the cache as it
    /// was.
    pub fn select(&mut self, shapes: &[ArgShape]) -> RResult<BoundImplementation> {
        if self.state == CacheState::Megamorphic {
            self.stats.generic_calls += 1;
            return Ok(BoundImplementation::Generic(self.builtin));
        }
        if let Some(bound) = self.state.lookup(shapes) {
            self.stats.hits += 1;
            trace!("call site {:?}: cache hit {}", self.id, bound.name());
            return Ok(bound);
        }

        self.stats.misses += 1;
        let desc = self.builtin.descriptor();
        let Some(index) = desc.select(shapes) else {
            return Err(unsupported_shapes(desc, shapes));
        };
        let bound = BoundImplementation::Specialized {
            builtin: self.builtin,
            index,
        };
        let entry = CacheEntry {
            key: shapes.into(),
            bound,
        };

        let previous = std::mem::take(&mut self.state);
        self.state = match previous {
            CacheState::Uninitialized => CacheState::Monomorphic(entry),
            CacheState::Monomorphic(first) if self.limit > 1 => {
                CacheState::Polymorphic(vec![first, entry])
            }
            CacheState::Polymorphic(mut entries) if entries.len() < self.limit => {
                entries.push(entry);
                CacheState::Polymorphic(entries)
            }
            _ => CacheState::Megamorphic,
        };
        debug!(
            "call site {:?} ({}): {} after {:?}",
            self.id,
            desc.name,
            self.state.label(),
            shapes
        );

        if self.state == CacheState::Megamorphic {
            self.stats.generic_calls += 1;
            return Ok(BoundImplementation::Generic(self.builtin));
        }
        Ok(bound)
    }
}

/// All call-site caches of one VM.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sites: HashMap<CallSiteId, CallSite>,
    limit: usize,
    next_id: u32,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_LIMIT)
    }
}

impl Dispatcher {
    pub fn new(limit: usize) -> Self {
        Dispatcher {
            sites: HashMap::new(),
            limit: limit.max(1),
            next_id: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Register a new call site of `builtin`.
    pub fn new_site(&mut self, builtin: BuiltinId) -> CallSiteId {
        let id = CallSiteId(self.next_id);
        self.next_id += 1;
        self.sites.insert(id, CallSite::new(id, builtin, self.limit));
        id
    }

    pub fn site(&self, id: CallSiteId) -> Option<&CallSite> {
        self.sites.get(&id)
    }

    pub fn dispatch(
        &mut self,
        id: CallSiteId,
        shapes: &[ArgShape],
    ) -> Option<RResult<BoundImplementation>> {
        self.sites.get_mut(&id).map(|site| site.select(shapes))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

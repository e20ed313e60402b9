//! Route registry: the in-memory table the engine and synchronizer share.
//!
//! Keys are URL patterns in brace syntax (`/api/todos/{id}`). Entries are
//! either method-dispatched routes or RPC dispatcher routes; both are held
//! behind `Arc` so the registry stays cheap to clone into probe threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::route::{Route, RpcRoute};

#[derive(Debug, Clone)]
pub enum RouteEntry {
    Plain(Arc<Route>),
    Rpc(Arc<RpcRoute>),
}

/// All registered routes, keyed by pattern. Iteration order is pattern order,
/// which keeps generated documents and probe logs deterministic.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    entries: BTreeMap<String, RouteEntry>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, pattern: impl Into<String>, route: Route) -> Self {
        self.entries
            .insert(pattern.into(), RouteEntry::Plain(Arc::new(route)));
        self
    }

    pub fn register_rpc(mut self, pattern: impl Into<String>, route: RpcRoute) -> Self {
        self.entries
            .insert(pattern.into(), RouteEntry::Rpc(Arc::new(route)));
        self
    }

    pub fn get(&self, pattern: &str) -> Option<&RouteEntry> {
        self.entries.get(pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// SPDX-License-Identifier: MIT

//! Minimal cache-key shaping and an in-memory cache index.
//!
//! Named as a "consumed but trivial" collaborator: no eviction, no TTL,
//! no persistence. A higher layer that needs a real cache backend plugs
//! its own implementation in; this crate only needs something concrete
//! for [`crate::introspection::inspect_cache`] to read.

use crate::id::WorkflowId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A stable, opaque cache key derived from a node id and a caller-supplied
/// key string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(pub String);

/// Compute a [`CacheKey`] for `(node_id, key)`.
pub fn cache_key(node_id: WorkflowId, key: &str) -> CacheKey {
    let mut hasher = DefaultHasher::new();
    node_id.as_str().hash(&mut hasher);
    key.hash(&mut hasher);
    CacheKey(format!("{}:{:016x}", key, hasher.finish()))
}

/// A single cached value, as returned by introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: Value,
}

/// An in-memory, per-node cache a `WorkflowBase` may optionally be given
/// at construction.
#[derive(Debug, Clone, Default)]
pub struct CacheIndex {
    entries: HashMap<CacheKey, Value>,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: CacheKey, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries
            .iter()
            .map(|(key, value)| CacheEntry { key: key.clone(), value: value.clone() })
            .collect()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

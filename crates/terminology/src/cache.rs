use crate::{ConceptDetails, TerminologyResolver, TerminologyResult};
use cds_types::CodeSet;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// Populate-on-miss map guarded by an `RwLock`.
///
/// The lock is never held while the value is computed, so two threads missing the same key both
/// compute it and the later write wins. Errors are not cached.
#[derive(Debug)]
struct MissCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> MissCache<K, V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn insert(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, value);
        }
    }

    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

/// Wraps a resolver with a value-set cache keyed by URI and a lookup cache keyed by
/// `system|code`.
///
/// A poisoned lock degrades to a cache miss rather than failing the call.
pub struct CachingResolver<R> {
    inner: R,
    value_sets: MissCache<String, CodeSet>,
    concepts: MissCache<String, ConceptDetails>,
}

impl<R: TerminologyResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            value_sets: MissCache::new(),
            concepts: MissCache::new(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of cached value-set expansions.
    pub fn cached_value_sets(&self) -> usize {
        self.value_sets.len()
    }

    /// Number of cached concept lookups.
    pub fn cached_concepts(&self) -> usize {
        self.concepts.len()
    }
}

impl<R: TerminologyResolver> TerminologyResolver for CachingResolver<R> {
    fn expand_value_set(&self, uri: &str) -> TerminologyResult<CodeSet> {
        let key = uri.to_string();
        if let Some(hit) = self.value_sets.get(&key) {
            tracing::debug!("Value set cache hit {}", uri);
            return Ok(hit);
        }
        let expanded = self.inner.expand_value_set(uri)?;
        self.value_sets.insert(key, expanded.clone());
        Ok(expanded)
    }

    fn lookup(&self, system: &str, code: &str) -> TerminologyResult<ConceptDetails> {
        let key = format!("{system}|{code}");
        if let Some(hit) = self.concepts.get(&key) {
            tracing::debug!("Lookup cache hit {}", key);
            return Ok(hit);
        }
        let details = self.inner.lookup(system, code)?;
        self.concepts.insert(key, details.clone());
        Ok(details)
    }
}

//! Compiled template caches

use crate::rendering::ParsedTemplate;
use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Content-addressed identifier for a template source
pub fn fingerprint(source: &str) -> String {
    let mut hasher = FxHasher::default();
    source.hash(&mut hasher);
    format!("tpl_{:016x}", hasher.finish())
}

/// Cache of parsed (and usually compiled) templates, keyed by fingerprint
///
/// Implementations must tolerate concurrent access; on racing writes for the
/// same identifier the last writer wins, which is harmless because both
/// writers derived their value from identical source.
pub trait TemplateCache: Send + Sync {
    fn has(&self, identifier: &str) -> bool;
    fn get(&self, identifier: &str) -> Option<Arc<ParsedTemplate>>;
    fn set(&self, identifier: &str, template: Arc<ParsedTemplate>);
    fn flush(&self);
}

/// Unbounded concurrent in-memory cache
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Arc<ParsedTemplate>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TemplateCache for MemoryCache {
    fn has(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    fn get(&self, identifier: &str) -> Option<Arc<ParsedTemplate>> {
        self.entries.get(identifier).map(|entry| entry.clone())
    }

    fn set(&self, identifier: &str, template: Arc<ParsedTemplate>) {
        self.entries.insert(identifier.to_string(), template);
    }

    fn flush(&self) {
        self.entries.clear();
    }
}

/// Size-bounded cache with least-recently-used eviction
pub struct BoundedCache {
    entries: Mutex<LruCache<String, Arc<ParsedTemplate>>>,
}

impl BoundedCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl TemplateCache for BoundedCache {
    fn has(&self, identifier: &str) -> bool {
        self.entries.lock().contains(identifier)
    }

    fn get(&self, identifier: &str) -> Option<Arc<ParsedTemplate>> {
        self.entries.lock().get(identifier).cloned()
    }

    fn set(&self, identifier: &str, template: Arc<ParsedTemplate>) {
        self.entries.lock().put(identifier.to_string(), template);
    }

    fn flush(&self) {
        self.entries.lock().clear();
    }
}

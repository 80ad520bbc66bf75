//! Parsed-document cache
//!
//! Loading a model resolves a directory, a manifest, and a version before
//! parsing anything; the cache memoizes the parsed document per logical
//! request so repeated lookups skip all of that. It is a correctness cache,
//! not a bounded one: entries live until [`DocumentCache::clear`].

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::manifest::SdfVersion;
use crate::xml::Document;

/// Cache key: one entry per (model name, version constraint) pair. The same
/// model requested under different constraints may resolve to different
/// files, so the constraint is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub model: String,
    pub max_version: Option<SdfVersion>,
}

impl CacheKey {
    pub fn new(model: impl Into<String>, max_version: Option<SdfVersion>) -> Self {
        Self {
            model: model.into(),
            max_version,
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<CacheKey, Arc<Document>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached document for `key`, or invoke `load` to produce
    /// it. On a hit `load` is not called and nothing touches the
    /// filesystem. Load failures are returned as-is and leave no entry.
    pub fn get_or_load<E>(
        &mut self,
        key: CacheKey,
        load: impl FnOnce() -> Result<Document, E>,
    ) -> Result<Arc<Document>, E> {
        if let Some(doc) = self.entries.get(&key) {
            debug!(model = %key.model, "document cache hit");
            return Ok(doc.clone());
        }
        debug!(model = %key.model, "document cache miss");
        let doc = Arc::new(load()?);
        self.entries.insert(key, doc.clone());
        Ok(doc)
    }

    /// Drop all entries. Subsequent lookups re-resolve from scratch.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

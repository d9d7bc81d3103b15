//! In-process caching of rewritten blobs

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use git2::Oid;

use crate::error::Result;

/// Memo of blob rewrites for one import.
///
/// Content rewriting does not depend on where a blob lives, so a blob shared
/// by many commits or paths is read and rewritten only once. Keys are source
/// blob ids, values the ids of the rewritten blobs in the scratch store.
///
/// Owned by a single commit rewriter; imports run on one thread.
#[derive(Debug, Default)]
pub struct RewriteCache {
    entries: RefCell<HashMap<Oid, Oid>>,
    hits: Cell<usize>,
}

impl RewriteCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the rewritten id for `source`, or compute and cache it
    pub fn get_or_process<F>(&self, source: Oid, processor: F) -> Result<Oid>
    where
        F: FnOnce() -> Result<Oid>,
    {
        if let Some(cached) = self.get(source) {
            self.hits.set(self.hits.get() + 1);
            return Ok(cached);
        }

        let result = processor()?;
        self.insert(source, result);
        Ok(result)
    }

    /// Manually insert a value into the cache
    pub fn insert(&self, source: Oid, rewritten: Oid) {
        self.entries.borrow_mut().insert(source, rewritten);
    }

    /// Get a value from cache without computing
    pub fn get(&self, source: Oid) -> Option<Oid> {
        self.entries.borrow().get(&source).copied()
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

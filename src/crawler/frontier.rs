//! Frontier items and the visited set
//!
//! The visited set is the single source of truth for admission: a URL is
//! claimed by exactly one successful `insert`, however many workers race to
//! discover it.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A URL waiting in the frontier, with its distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierItem {
    /// Normalized absolute URL
    pub url: String,

    /// Hops from the start URL (the start URL is depth 0)
    pub depth: u32,
}

impl FrontierItem {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }

    /// Builds the item for a link discovered on this page
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self::new(url, self.depth + 1)
    }
}

/// Thread-safe set of normalized URLs that have been claimed for dispatch
///
/// The lock is only held for a single set operation, never across I/O.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically inserts `url` if absent
    ///
    /// Returns `true` if this call claimed the URL, `false` if it was already
    /// present.
    pub fn insert(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    /// Returns true if `url` has already been claimed
    ///
    /// This is advisory only (the answer may be stale as soon as the lock is
    /// released); admission decisions go through [`VisitedSet::insert`].
    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicking holder cannot leave the set half-updated (insert is a single
    // call), so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

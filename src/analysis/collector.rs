//! Bounded, deduplicated result collection.
//!
//! Every result-producing operation shares one discipline: records are keyed by
//! a stable dedup key built from `(mvid, token)` (plus disambiguators such as
//! instruction offsets), the stored list never exceeds `max_results`, and
//! overflow flips a `truncated` flag instead of failing the query.

use std::collections::HashSet;

use serde_json::Value;

/// Default result cap applied when a request does not specify `maxResults`.
pub const DEFAULT_MAX_RESULTS: usize = 5000;

/// Accumulates result records with dedup and a hard cap.
pub struct SearchCollector {
    results: Vec<Value>,
    seen: HashSet<String>,
    max_results: usize,
    truncated: bool,
}

impl SearchCollector {
    /// Creates a collector storing at most `max_results` records.
    #[must_use]
    pub fn new(max_results: usize) -> Self {
        SearchCollector {
            results: Vec::new(),
            seen: HashSet::new(),
            max_results,
            truncated: false,
        }
    }

    /// Attempts to add a record under the given dedup key.
    ///
    /// Re-adding a seen key is an accepted no-op, even after truncation. The
    /// first distinct key past the cap flips [`truncated`](Self::truncated)
    /// and is discarded; so is everything after it.
    ///
    /// Returns `false` once the collector is full - callers use this to break
    /// out of their scan loops early.
    pub fn try_add(&mut self, key: String, record: Value) -> bool {
        if self.seen.contains(&key) {
            return true;
        }
        if self.truncated {
            return false;
        }
        if self.results.len() >= self.max_results {
            self.truncated = true;
            return false;
        }
        self.seen.insert(key);
        self.results.push(record);
        true
    }

    /// Returns `true` once a distinct record has been rejected for capacity.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` when nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consumes the collector, yielding the stored records and the truncation
    /// flag.
    #[must_use]
    pub fn into_results(self) -> (Vec<Value>, bool) {
        (self.results, self.truncated)
    }
}

//! The query engine: matchers, indices, result collection, graph traversal
//! and usage discovery.
//!
//! Everything here is rebuilt per query from a workspace snapshot and holds no
//! state between queries. The only output discipline shared across operations
//! is the [`collector::SearchCollector`]: bounded, deduplicated, truncation
//! reported as a flag rather than an error.

pub mod collector;
pub mod dependencies;
pub mod heuristics;
pub mod hierarchy;
pub mod indices;
pub mod pattern;
pub mod search;
pub mod text;
pub mod typepaths;
pub mod usages;

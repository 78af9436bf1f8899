//! Durable, resumable cache of search responses keyed by (source, request).

pub mod cache;
pub mod snapshot;

pub use cache::SearchCache;

//! Search orchestration engine: fans registered requests out across sources,
//! drives every result stream concurrently to exhaustion and checkpoints the
//! cache so interrupted runs resume without re-querying finished work.

pub mod config;
pub mod engine;
pub mod source;

pub use config::EngineConfig;
pub use engine::{EngineProgress, RunSummary, SearchEngine};
pub use source::{ResponseStream, SearchSource, SourceResult};

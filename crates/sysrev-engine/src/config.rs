//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Constructor inputs for a [`crate::SearchEngine`] run. The CLI layer maps
/// its flags onto this struct; the engine itself never parses arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Durable snapshot location.
    pub cache_path: PathBuf,
    /// Gzip-compress snapshots.
    pub compress: bool,
    /// Dump the cache after this many accepted responses. Zero disables
    /// periodic checkpoints; the final dump still happens.
    pub checkpoint_every: u64,
    /// Sleep between polling rounds (once per round, not per stream).
    pub poll_delay: Duration,
    /// Re-query pairs even when they are already cached.
    pub ignore_cached: bool,
    /// Case-fold request values inside the cache.
    pub ignore_case: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("cache.sr"),
            compress: false,
            checkpoint_every: 10,
            poll_delay: Duration::from_millis(100),
            ignore_cached: false,
            ignore_case: true,
        }
    }
}

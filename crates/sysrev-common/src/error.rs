use thiserror::Error;

/// Workspace-wide error type.
///
/// The cache and engine crates construct the first four variants directly;
/// callers can rely on them to decide what is recoverable. `NotFound` is a
/// normal probe miss, `Source` is contained per stream by the engine, and the
/// remaining variants are fatal to a run.
#[derive(Debug, Error)]
pub enum SysrevError {
    #[error("not found in cache: {0}")]
    NotFound(String),

    #[error("corrupt cache snapshot: {0}")]
    CorruptCache(String),

    // Field deliberately named `id`: a `source` field would be picked up by
    // the derive as the error's cause, and a plain String has no cause.
    #[error("source {id} failed: {message}")]
    Source { id: String, message: String },

    #[error("durable cache write failed: {0}")]
    DurableWrite(#[source] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SysrevError>;

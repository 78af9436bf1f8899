//! The contract the engine consumes from search source adapters.

use futures_util::stream::BoxStream;
use sysrev_common::SysrevError;
use sysrev_model::{SearchRequest, SearchResponse, Source};

pub type SourceResult = Result<SearchResponse, SysrevError>;

/// A lazy, possibly unbounded sequence of responses. Terminates normally when
/// the source is exhausted, or with an error item on source failure.
pub type ResponseStream = BoxStream<'static, SourceResult>;

/// A search source adapter.
///
/// Implementations live outside this workspace (HTTP clients, scrapers,
/// paginated APIs); the engine only needs a stable identifier and a stream
/// per request. Adapter configuration such as proxies or API keys belongs to
/// the adapter's constructor, never to process-global state.
pub trait SearchSource: Send + Sync {
    /// Stable identifier of this source.
    fn source(&self) -> Source;

    /// Open a result stream for one request. Opening must be cheap and
    /// non-blocking; all network work happens as the stream is polled.
    fn search(&self, request: &SearchRequest) -> ResponseStream;
}

//! Bibliographic record model: articles, authors, search request/response
//! types and scoring rules.

pub mod article;
pub mod author;
pub mod record;
pub mod search;

pub use article::Article;
pub use author::Author;
pub use record::{CitationScore, Record, ScoreRule};
pub use search::{SearchRequest, SearchRequestSource, SearchResponse, SearchToken, Source};

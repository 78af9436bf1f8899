//! Search request and response types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Article;

/// What a request value means to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchToken {
    Author,
    Title,
    Term,
}

/// A single registered search. Equality is case-sensitive on the value;
/// case-folding, when enabled, happens inside the cache only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    pub token: SearchToken,
    pub value: String,
}

impl SearchRequest {
    pub fn new(token: SearchToken, value: impl Into<String>) -> Self {
        Self {
            token,
            value: value.into(),
        }
    }
}

/// Stable identifiers for the known search sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    GoogleScholar,
    Scopus,
    Ieee,
    PubMed,
    Nature,
    ResearchGate,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::GoogleScholar => "google_scholar",
            Source::Scopus        => "scopus",
            Source::Ieee          => "ieee",
            Source::PubMed        => "pubmed",
            Source::Nature        => "nature",
            Source::ResearchGate  => "researchgate",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The cache's key granularity: a request pinned to one source. Responses
/// are never shared across sources, even for identical request text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequestSource {
    pub request: SearchRequest,
    pub source: Source,
}

impl SearchRequestSource {
    pub fn new(request: SearchRequest, source: Source) -> Self {
        Self { request, source }
    }
}

impl fmt::Display for SearchRequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:?}:{}",
            self.source, self.request.token, self.request.value
        )
    }
}

/// One record produced by a source for a specific request.
///
/// `raw` is the source's payload, kept for provenance and debugging only: it
/// is skipped on serialization and ignored by equality. Equality compares the
/// request-source and the article's full content (not the title-only article
/// identity), so two responses whose articles tie only by normalized title
/// stay distinct in a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub request_source: SearchRequestSource,
    pub article: Article,
    #[serde(skip)]
    pub raw: Option<serde_json::Value>,
}

impl SearchResponse {
    pub fn new(request_source: SearchRequestSource, article: Article) -> Self {
        Self {
            request_source,
            article,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

impl PartialEq for SearchResponse {
    fn eq(&self, other: &Self) -> bool {
        self.request_source == other.request_source && self.article.content_eq(&other.article)
    }
}

impl Eq for SearchResponse {}

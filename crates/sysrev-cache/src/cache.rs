//! In-memory cache structure and its operations.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use sysrev_common::{Result, SysrevError};
use sysrev_model::{Article, SearchRequest, SearchRequestSource, SearchResponse, Source};
use tracing::debug;

/// Two-level mapping source → request → responses.
///
/// Buckets keep insertion order; set semantics are enforced on insert using
/// full response equality (see [`SearchResponse`]), so re-inserting an
/// identical response is a no-op while a differing response whose article
/// ties only by normalized title is still stored.
///
/// With `ignore_case` enabled, request values are case-folded before use as
/// keys. Folding happens on a local copy of the key; caller-owned requests
/// are never mutated.
#[derive(Debug, Default)]
pub struct SearchCache {
    pub(crate) ignore_case: bool,
    pub(crate) data: HashMap<Source, HashMap<SearchRequest, Vec<SearchResponse>>>,
}

impl SearchCache {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            ignore_case,
            data: HashMap::new(),
        }
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Case-fold the key into a local copy when `ignore_case` is set.
    fn folded<'a>(&self, key: &'a SearchRequestSource) -> Cow<'a, SearchRequestSource> {
        if !self.ignore_case {
            return Cow::Borrowed(key);
        }
        // Lowercasing can change more than uppercase letters (titlecase
        // digraphs like 'ǅ'), so compare against the lowered form instead of
        // probing for uppercase characters.
        let lowered = key.request.value.to_lowercase();
        if lowered == key.request.value {
            Cow::Borrowed(key)
        } else {
            let mut folded = key.clone();
            folded.request.value = lowered;
            Cow::Owned(folded)
        }
    }

    /// True iff at least one response is stored for exactly this
    /// (source, request) pair.
    pub fn contains(&self, key: &SearchRequestSource) -> bool {
        let key = self.folded(key);
        self.data
            .get(&key.source)
            .and_then(|requests| requests.get(&key.request))
            .is_some()
    }

    /// The bucket for this key, or `NotFound` when the source or the request
    /// under it has never been stored.
    pub fn get(&self, key: &SearchRequestSource) -> Result<&[SearchResponse]> {
        let key = self.folded(key);
        self.data
            .get(&key.source)
            .and_then(|requests| requests.get(&key.request))
            .map(Vec::as_slice)
            .ok_or_else(|| SysrevError::NotFound(key.to_string()))
    }

    /// Insert a response under the key, creating intermediate levels on
    /// demand. Inserting a response equal to one already present is a no-op.
    pub fn put(&mut self, key: &SearchRequestSource, response: SearchResponse) {
        let key = self.folded(key).into_owned();
        // The entry chain below consumes the key piecewise.
        let key_display = key.to_string();
        let bucket = self
            .data
            .entry(key.source)
            .or_default()
            .entry(key.request)
            .or_default();
        if bucket.contains(&response) {
            debug!(key = %key_display, "duplicate response ignored");
            return;
        }
        bucket.push(response);
    }

    /// Remove an entire bucket, returning its responses.
    pub fn remove_bucket(&mut self, key: &SearchRequestSource) -> Result<Vec<SearchResponse>> {
        let key = self.folded(key);
        self.data
            .get_mut(&key.source)
            .and_then(|requests| requests.remove(&key.request))
            .ok_or_else(|| SysrevError::NotFound(key.to_string()))
    }

    /// Remove one specific response, `NotFound` when absent.
    pub fn remove_response(&mut self, response: &SearchResponse) -> Result<()> {
        let key = self.folded(&response.request_source);
        let bucket = self
            .data
            .get_mut(&key.source)
            .and_then(|requests| requests.get_mut(&key.request))
            .ok_or_else(|| SysrevError::NotFound(key.to_string()))?;
        let position = bucket
            .iter()
            .position(|stored| stored == response)
            .ok_or_else(|| SysrevError::NotFound(format!("response under {key}")))?;
        bucket.remove(position);
        Ok(())
    }

    /// Total stored responses across all sources and requests. Counts
    /// responses, not unique articles.
    pub fn len(&self) -> usize {
        self.data
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored article, once per response.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.data
            .values()
            .flat_map(HashMap::values)
            .flatten()
            .map(|response| &response.article)
    }

    /// Articles with the first occurrence of each normalized title.
    ///
    /// Order is best-effort: per bucket it is insertion order, across buckets
    /// it is unspecified (and may change after a snapshot reload).
    pub fn unique_articles(&self) -> impl Iterator<Item = &Article> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.articles()
            .filter(move |article| seen.insert(article.normalized_title()))
    }
}

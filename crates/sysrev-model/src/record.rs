//! Tagged record variant and scoring rules.

use serde::{Deserialize, Serialize};

use crate::{Article, Author};

/// A record returned by a source: either an article or an author profile.
/// Scoring and reporting match on this exhaustively instead of inspecting
/// runtime types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Record {
    Article(Article),
    Author(Author),
}

/// A relevance scoring rule over records.
pub trait ScoreRule {
    fn score(&self, record: &Record) -> u64;
}

/// Citation-weighted score: articles count citations plus a tenth of their
/// downloads; authors count citations plus h-index weight.
pub struct CitationScore;

impl ScoreRule for CitationScore {
    fn score(&self, record: &Record) -> u64 {
        match record {
            Record::Article(article) => {
                article.citations.unwrap_or(0) + article.downloads.unwrap_or(0) / 10
            }
            Record::Author(author) => {
                author.citations.unwrap_or(0) + u64::from(author.h_index.unwrap_or(0)) * 100
            }
        }
    }
}

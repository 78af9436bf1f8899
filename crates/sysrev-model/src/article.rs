//! Article record with normalized-title identity.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use sysrev_common::text::{is_blank, normalize};

/// A bibliographic article.
///
/// The raw title and its normalized form are a private pair: every title
/// update goes through [`Article::set_title`], which recomputes the
/// normalized form in the same step, so the two can never diverge.
///
/// Equality and hashing derive from the normalized title alone. Two articles
/// with different authors or years but the same normalized title are the same
/// dedup key. This aggressive collision policy favours recall of duplicate
/// merges over precision and is relied upon by existing cached data; do not
/// tighten it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    title: String,
    normalized_title: String,
    /// Normalized author names, in source order.
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub citations: Option<u64>,
    pub downloads: Option<u64>,
    pub doi: Option<String>,
    pub references: Vec<Article>,
    pub keywords: Vec<String>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let normalized_title = normalize(&title);
        Self {
            title,
            normalized_title,
            ..Default::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn normalized_title(&self) -> &str {
        &self.normalized_title
    }

    /// Replace the title, recomputing the normalized form atomically.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.normalized_title = normalize(&self.title);
    }

    /// Append an author by raw name; stored in normalized form.
    pub fn push_author(&mut self, raw_name: &str) {
        self.authors.push(normalize(raw_name));
    }

    /// Full structural comparison, as opposed to the title-only identity
    /// used by `Eq`. Response sets deduplicate on this.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.authors == other.authors
            && self.year == other.year
            && self.abstract_text == other.abstract_text
            && self.journal == other.journal
            && self.publisher == other.publisher
            && self.citations == other.citations
            && self.downloads == other.downloads
            && self.doi == other.doi
            && self.keywords == other.keywords
            && self.references.len() == other.references.len()
            && self
                .references
                .iter()
                .zip(&other.references)
                .all(|(a, b)| a.content_eq(b))
    }

    /// Fill the receiver's empty fields from `other`, returning the receiver
    /// for chaining.
    ///
    /// Not commutative: the receiver's non-empty fields always win, so
    /// `a.merge(b)` and `b.merge(a)` differ whenever both sides carry a
    /// value. Cached data depends on this ordering; callers that change
    /// which side receives will change merge outcomes.
    ///
    /// List fields are replaced wholesale from `other` only when the
    /// receiver's list is empty; there is no element-wise union.
    pub fn merge(&mut self, other: &Article) -> &mut Self {
        if is_blank(&self.title) && !is_blank(&other.title) {
            self.set_title(other.title.clone());
        }
        merge_text(&mut self.abstract_text, &other.abstract_text);
        merge_text(&mut self.journal, &other.journal);
        merge_text(&mut self.publisher, &other.publisher);
        merge_text(&mut self.doi, &other.doi);
        if self.year.is_none() {
            self.year = other.year;
        }
        if self.citations.is_none() {
            self.citations = other.citations;
        }
        if self.downloads.is_none() {
            self.downloads = other.downloads;
        }
        if self.authors.is_empty() {
            self.authors = other.authors.clone();
        }
        if self.references.is_empty() {
            self.references = other.references.clone();
        }
        if self.keywords.is_empty() {
            self.keywords = other.keywords.clone();
        }
        self
    }
}

/// Take `src` only when `dst` is absent or blank and `src` is non-blank.
pub(crate) fn merge_text(dst: &mut Option<String>, src: &Option<String>) {
    let dst_blank = dst.as_deref().map_or(true, is_blank);
    let src_filled = src.as_deref().map_or(false, |s| !is_blank(s));
    if dst_blank && src_filled {
        *dst = src.clone();
    }
}

impl PartialEq for Article {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_title == other.normalized_title
    }
}

impl Eq for Article {}

impl Hash for Article {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_title.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use pretty_assertions::assert_eq;

    fn hash_of(article: &Article) -> u64 {
        let mut hasher = DefaultHasher::new();
        article.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn title_mutation_recomputes_normalized_form() {
        let mut article = Article::new("Byzantine Fault Tolerance");
        assert_eq!(article.normalized_title(), "byzantine fault tolerance");

        article.set_title("Practical BFT!!");
        assert_eq!(article.title(), "Practical BFT!!");
        assert_eq!(article.normalized_title(), "practical bft");
    }

    #[test]
    fn equality_and_hash_ignore_everything_but_the_normalized_title() {
        let mut a = Article::new("Byzantine Fault Tolerance");
        a.year = Some(1999);
        a.push_author("Miguel Castro");

        let mut b = Article::new("byzantine fault tolerance!!");
        b.year = Some(2002);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(!a.content_eq(&b));
    }

    #[test]
    fn merge_prefers_receiver_fields() {
        let mut a = Article::new("BFT");
        a.year = Some(1999);
        a.journal = Some("TOCS".into());

        let mut b = Article::new("BFT");
        b.year = Some(2002);
        b.journal = Some("OSDI".into());
        b.publisher = Some("ACM".into());

        a.merge(&b);
        assert_eq!(a.year, Some(1999));
        assert_eq!(a.journal.as_deref(), Some("TOCS"));
        assert_eq!(a.publisher.as_deref(), Some("ACM"));
    }

    #[test]
    fn merge_is_not_commutative() {
        let mut a = Article::new("BFT");
        a.journal = Some("TOCS".into());
        let mut b = Article::new("BFT");
        b.journal = Some("OSDI".into());

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab.journal.as_deref(), Some("TOCS"));
        assert_eq!(ba.journal.as_deref(), Some("OSDI"));
    }

    #[test]
    fn merge_replaces_lists_only_when_receiver_empty() {
        let mut a = Article::new("BFT");
        a.push_author("Miguel Castro");
        let mut b = Article::new("BFT");
        b.push_author("Barbara Liskov");
        b.keywords = vec!["consensus".into()];

        a.merge(&b);
        assert_eq!(a.authors, vec!["miguel castro"]);
        assert_eq!(a.keywords, vec!["consensus"]);
    }

    #[test]
    fn merge_treats_blank_strings_as_empty() {
        let mut a = Article::new("BFT");
        a.journal = Some("   ".into());
        let mut b = Article::new("BFT");
        b.journal = Some("TOCS".into());

        a.merge(&b);
        assert_eq!(a.journal.as_deref(), Some("TOCS"));
    }

    #[test]
    fn merge_supports_chaining() {
        let mut a = Article::new("BFT");
        let mut b = Article::new("BFT");
        b.year = Some(1999);
        let mut c = Article::new("BFT");
        c.publisher = Some("ACM".into());

        a.merge(&b).merge(&c);
        assert_eq!(a.year, Some(1999));
        assert_eq!(a.publisher.as_deref(), Some("ACM"));
    }
}

//! Author record with normalized-name identity.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use sysrev_common::text::{is_blank, normalize};

use crate::article::merge_text;

/// A paper author. Same identity discipline as [`crate::Article`]: the raw
/// name and its normalized form are kept consistent through
/// [`Author::set_name`], and equality/hashing use the normalized name only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    name: String,
    normalized_name: String,
    pub affiliation: Option<String>,
    pub citations: Option<u64>,
    pub h_index: Option<u32>,
    pub i10_index: Option<u32>,
    pub interests: Vec<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize(&name);
        Self {
            name,
            normalized_name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    /// Replace the name, recomputing the normalized form atomically.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized_name = normalize(&self.name);
    }

    /// Fill the receiver's empty fields from `other`, returning the receiver
    /// for chaining. Same ordering dependency as [`crate::Article::merge`]:
    /// the receiver's non-empty fields always win.
    pub fn merge(&mut self, other: &Author) -> &mut Self {
        if is_blank(&self.name) && !is_blank(&other.name) {
            self.set_name(other.name.clone());
        }
        merge_text(&mut self.affiliation, &other.affiliation);
        if self.citations.is_none() {
            self.citations = other.citations;
        }
        if self.h_index.is_none() {
            self.h_index = other.h_index;
        }
        if self.i10_index.is_none() {
            self.i10_index = other.i10_index;
        }
        if self.interests.is_empty() {
            self.interests = other.interests.clone();
        }
        self
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_name == other.normalized_name
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn name_mutation_recomputes_normalized_form() {
        let mut author = Author::new("José da Silva");
        assert_eq!(author.normalized_name(), "jose da silva");

        author.set_name("Barbara Liskov");
        assert_eq!(author.normalized_name(), "barbara liskov");
    }

    #[test]
    fn equality_is_diacritic_insensitive() {
        let a = Author::new("José da Silva");
        let b = Author::new("jose da silva");
        assert_eq!(a, b);
    }

    #[test]
    fn merge_prefers_receiver_fields() {
        let mut a = Author::new("Barbara Liskov");
        a.h_index = Some(90);

        let mut b = Author::new("Barbara Liskov");
        b.h_index = Some(10);
        b.affiliation = Some("MIT".into());
        b.interests = vec!["distributed systems".into()];

        a.merge(&b);
        assert_eq!(a.h_index, Some(90));
        assert_eq!(a.affiliation.as_deref(), Some("MIT"));
        assert_eq!(a.interests, vec!["distributed systems"]);
    }
}

//! Text canonicalisation used for record identity.
//!
//! `normalize` produces the dedup key form of a title or author name:
//! lower-case, diacritic-free, punctuation-free, whitespace-collapsed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Collapse whitespace runs (including newlines) to single spaces and trim.
pub fn format_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the text is empty or whitespace-only.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Canonical form used as a dedup key.
///
/// Lower-cases, strips diacritics (NFD decomposition, combining marks
/// dropped), removes punctuation, then collapses whitespace. Punctuation is
/// removed before the whitespace pass so a stripped separator between two
/// spaces cannot leave a double space; this makes `normalize` idempotent.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    format_text(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Byzantine Fault-Tolerance!!"), "byzantine faulttolerance");
    }

    #[test]
    fn normalize_strips_diacritics() {
        assert_eq!(normalize("José da Silva"), "jose da silva");
        assert_eq!(normalize("Élan Café"), "elan cafe");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  a\n b\t\tc  "), "a b c");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["a - b", "  Ün,  (deux)  trois!  ", "plain text", ""] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank("   \n\t"));
        assert!(!is_blank(" x "));
    }
}

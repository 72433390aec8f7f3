//! Keyword patterns and text helpers shared by scoring and reasoning

use lazy_static::lazy_static;
use regex::Regex;

/// Explicit references to an audience's age or guardianship
pub const AGE_KEYWORDS: &[&str] = &[
    "minor",
    "minors",
    "teen",
    "teens",
    "teenager",
    "teenagers",
    "youth",
    "child",
    "children",
    "kid",
    "kids",
    "under 13",
    "under 16",
    "under 18",
    "age verification",
    "age gate",
    "parental",
    "guardian",
    "date of birth",
    "birthdate",
];

/// Characters of feature text quoted as evidence
pub const EVIDENCE_CHARS: usize = 200;

lazy_static! {
    static ref AGE_PATTERN: Regex = {
        let alternation = AGE_KEYWORDS
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
    };
}

/// True when the text mentions an age keyword as a whole word or phrase
pub fn contains_age_keyword(text: &str) -> bool {
    AGE_PATTERN.is_match(text)
}

/// The first age keyword found, lowercased
pub fn find_age_keyword(text: &str) -> Option<String> {
    AGE_PATTERN.find(text).map(|m| m.as_str().to_lowercase())
}

/// First `max_chars` characters of `text`, never splitting a character
pub fn leading_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_pos, _)) => &text[..byte_pos],
        None => text,
    }
}

/// Evidence line quoting the start of the feature text, with `...` when cut short
pub fn evidence_excerpt(text: &str) -> String {
    let text = text.trim();
    let excerpt = leading_chars(text, EVIDENCE_CHARS);
    if excerpt.len() < text.len() {
        format!("Feature text: {excerpt}...")
    } else {
        format!("Feature text: {excerpt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_age_keyword_word_bounded() {
        assert!(contains_age_keyword("Logs out users under 18 at night"));
        assert!(contains_age_keyword("Requires PARENTAL approval"));
        assert!(!contains_age_keyword("Kidney health tips"));
        assert!(!contains_age_keyword("Steenbok photos"));
        assert!(!contains_age_keyword("under 180 seconds"));
    }

    #[test]
    fn test_find_age_keyword() {
        assert_eq!(find_age_keyword("For Teens only"), Some("teens".to_string()));
        assert_eq!(find_age_keyword("Dark mode"), None);
    }

    #[test]
    fn test_leading_chars_is_char_safe() {
        assert_eq!(leading_chars("héllo", 2), "hé");
        assert_eq!(leading_chars("abc", 10), "abc");
    }

    #[test]
    fn test_evidence_excerpt_truncates() {
        let text = "x".repeat(500);
        let evidence = evidence_excerpt(&text);
        assert_eq!(evidence.len(), "Feature text: ".len() + 200 + 3);
        assert!(evidence.ends_with("..."));
    }

    #[test]
    fn test_short_evidence_is_not_marked_as_truncated() {
        assert_eq!(evidence_excerpt("  Dark mode  "), "Feature text: Dark mode");

        let exact = "é".repeat(EVIDENCE_CHARS);
        assert_eq!(evidence_excerpt(&exact), format!("Feature text: {exact}"));

        let over = "é".repeat(EVIDENCE_CHARS + 1);
        assert!(evidence_excerpt(&over).ends_with("é..."));
    }
}

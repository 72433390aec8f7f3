//! Term extraction shared by indexing and querying

use std::collections::HashSet;

use lazy_static::lazy_static;

/// Tokens shorter than this are dropped
pub const MIN_TOKEN_LEN: usize = 2;

/// English function words plus generic product vocabulary that carries no
/// regulatory signal
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor",
    "not", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "shall", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "upon", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "within", "would",
    "you", "your", "yours", "yourself", "yourselves",
    // product vocabulary
    "user", "users", "platform", "platforms", "feature", "features", "service", "services",
    "page", "pages", "app", "apps", "new", "add", "adds", "allow", "allows", "based", "using",
    "use", "uses", "via",
];

lazy_static! {
    static ref STOP_SET: HashSet<&'static str> = STOP_WORDS.iter().copied().collect();
}

/// Split text into lowercase index terms.
///
/// Splits on anything that is not an ASCII letter or digit, then drops short
/// tokens and stop words. Order and duplicates are preserved so callers can
/// count term frequency.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() >= MIN_TOKEN_LEN && !STOP_SET.contains(token))
        .map(str::to_string)
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_SET.contains(token)
}

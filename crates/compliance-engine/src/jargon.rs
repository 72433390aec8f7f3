//! Platform jargon resolution
//!
//! Internal codenames and shorthand ("curfew mode", "PII", "Jellybean") carry
//! no meaning for the regulation index. The resolver annotates each known
//! term in place with its canonical phrase so the index sees plain language
//! while the original wording survives for evidence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use shared_types::Category;

use crate::error::JargonError;

/// Maximum number of unknown-term suggestions returned
pub const MAX_SUGGESTIONS: usize = 10;

/// One jargon term and its plain-language meaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JargonEntry {
    pub term: String,
    pub canonical_phrase: String,
    #[serde(default = "default_hint")]
    pub category_hint: Category,
}

fn default_hint() -> Category {
    Category::Other
}

impl JargonEntry {
    pub fn new(term: &str, canonical_phrase: &str, category_hint: Category) -> Self {
        Self {
            term: term.to_lowercase(),
            canonical_phrase: canonical_phrase.to_string(),
            category_hint,
        }
    }
}

/// Built-in platform vocabulary: (term, canonical phrase, category hint)
const BUILTIN_JARGON: &[(&str, &str, Category)] = &[
    ("jellybean", "content moderation system", Category::ContentModeration),
    ("glow", "recommendation algorithm", Category::Other),
    ("spanner", "distributed database system", Category::Other),
    ("libra", "user safety framework", Category::ChildSafety),
    ("compass", "content policy engine", Category::ContentModeration),
    ("lighthouse", "compliance monitoring system", Category::Other),
    ("prism", "user analytics platform", Category::DataPrivacy),
    ("atlas", "geographic content routing", Category::Other),
    ("nexus", "cross-platform integration", Category::Other),
    ("quantum", "real-time processing engine", Category::Other),
    ("ugc", "user-generated content", Category::ContentModeration),
    ("csam", "child sexual abuse material", Category::ChildSafety),
    ("dmca", "digital millennium copyright act takedown", Category::ContentModeration),
    ("violative content", "content that violates community guidelines", Category::ContentModeration),
    ("shadow ban", "content visibility restriction", Category::ContentModeration),
    ("content takedown", "content removal from platform", Category::ContentModeration),
    ("deboost", "reduce content reach in algorithm", Category::ContentModeration),
    ("safety mode", "restricted content viewing mode", Category::ChildSafety),
    ("trust and safety", "user protection and content moderation", Category::ContentModeration),
    ("minor user", "user under 18 years old", Category::ChildSafety),
    ("verified account", "account with verified identity", Category::Other),
    ("creator fund", "monetization program for content creators", Category::Other),
    ("brand account", "business or organization account", Category::Other),
    ("influencer tier", "classification based on follower count", Category::Other),
    ("account restriction", "limitation on account functionality", Category::Other),
    ("age gate", "age verification checkpoint", Category::ChildSafety),
    ("fyp", "for you page recommendation feed", Category::Other),
    ("engagement signal", "user interaction metric", Category::DataPrivacy),
    ("content signal", "algorithmic content quality indicator", Category::Other),
    ("user signal", "behavioral pattern indicator", Category::DataPrivacy),
    ("recommendation engine", "algorithm suggesting content to users", Category::Other),
    ("content ranking", "algorithmic content prioritization", Category::ContentModeration),
    ("personalization vector", "user preference data representation", Category::DataPrivacy),
    ("interest graph", "user interest mapping system", Category::DataPrivacy),
    ("pii", "personally identifiable information", Category::DataPrivacy),
    ("device fingerprint", "unique device identification method", Category::DataPrivacy),
    ("cross-device tracking", "user activity tracking across devices", Category::DataPrivacy),
    ("data retention policy", "rules for keeping user data", Category::DataPrivacy),
    ("gdpr compliance", "general data protection regulation adherence", Category::DataPrivacy),
    ("ccpa compliance", "california consumer privacy act adherence", Category::DataPrivacy),
    ("data localization", "storing data within specific geographic boundaries", Category::DataPrivacy),
    ("user consent", "explicit permission for data processing", Category::DataPrivacy),
    ("geo-blocking", "restricting content by geographic location", Category::Other),
    ("region lock", "limiting feature access by location", Category::Other),
    ("compliance framework", "regulatory adherence system", Category::Other),
    ("age verification system", "method to verify user age", Category::ChildSafety),
    ("parental consent", "guardian permission for minor accounts", Category::ChildSafety),
    ("curfew mode", "curfew time-based restriction on minor account access", Category::ChildSafety),
    ("curfew", "time-based restriction on minor account access", Category::ChildSafety),
    ("local content policy", "region-specific content rules", Category::ContentModeration),
    ("regulatory sandbox", "testing environment for compliance features", Category::Other),
    ("feature flag", "toggle for enabling or disabling features", Category::Other),
    ("a/b test", "comparing two versions of a feature", Category::Other),
    ("rate limiting", "controlling request frequency", Category::Other),
    ("cdn", "content delivery network", Category::Other),
    ("kpi", "key performance indicator", Category::Other),
    ("dau", "daily active users", Category::Other),
    ("mau", "monthly active users", Category::Other),
    ("ltv", "lifetime value", Category::Other),
    ("short form video", "video content under 60 seconds", Category::Other),
    ("live streaming", "real-time video broadcast", Category::ContentModeration),
    ("duet", "collaborative video format", Category::Other),
    ("stitch", "video remix feature", Category::Other),
    ("hashtag challenge", "trending topic campaign", Category::ContentModeration),
    ("branded content", "sponsored or promotional material", Category::Other),
    ("auto-mod", "automated content moderation", Category::ContentModeration),
    ("human review", "manual content evaluation", Category::ContentModeration),
    ("appeal process", "user challenge to moderation decision", Category::ContentModeration),
    ("strike system", "progressive penalty framework", Category::ContentModeration),
    ("community guidelines", "platform usage rules", Category::ContentModeration),
    ("content policy", "rules governing acceptable content", Category::ContentModeration),
    ("user behavior analytics", "analysis of user interaction patterns", Category::DataPrivacy),
    ("recommendation algorithm", "system that suggests content based on user preferences", Category::Other),
    ("data pipeline", "series of processes for moving and transforming data", Category::Other),
    ("data governance", "management of data availability, usability, integrity and security", Category::DataPrivacy),
];

/// Built-in jargon table
pub fn builtin_entries() -> Vec<JargonEntry> {
    BUILTIN_JARGON
        .iter()
        .map(|(term, canonical, hint)| JargonEntry::new(term, canonical, *hint))
        .collect()
}

/// Load a custom jargon table from a JSON array of entries
pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<JargonEntry>, JargonError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| JargonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<JargonEntry> = serde_json::from_str(&raw)?;
    Ok(entries
        .into_iter()
        .map(|e| JargonEntry::new(&e.term, &e.canonical_phrase, e.category_hint))
        .collect())
}

/// Outcome of resolving one text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub normalized_text: String,
    /// Lowercased term found in the text mapped to its canonical phrase
    pub resolved: BTreeMap<String, String>,
}

/// Case-insensitive, word-bounded jargon substitution.
///
/// All terms are compiled into one alternation ordered longest first, so
/// "curfew mode" wins over "curfew" and substituted text is never rescanned.
#[derive(Debug, Clone)]
pub struct JargonResolver {
    entries: HashMap<String, JargonEntry>,
    pattern: Option<Regex>,
}

lazy_static! {
    static ref CAMEL_CASE: Regex = Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z0-9]+)+\b").unwrap();
    static ref ACRONYM: Regex = Regex::new(r"\b[A-Z]{2,6}\b").unwrap();
    static ref HYPHENATED: Regex = Regex::new(r"\b[A-Za-z]+(?:-[A-Za-z]+)+\b").unwrap();
}

impl JargonResolver {
    /// Resolver over the built-in vocabulary
    pub fn new() -> Self {
        // Built-in terms are plain words; escaping them always yields a valid pattern
        Self::with_entries(builtin_entries()).unwrap_or_else(|_| Self::empty())
    }

    /// Resolver that knows no terms and passes text through unchanged
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            pattern: None,
        }
    }

    /// Resolver over a custom table. Later duplicates replace earlier ones.
    pub fn with_entries(entries: Vec<JargonEntry>) -> Result<Self, JargonError> {
        let entries: HashMap<String, JargonEntry> = entries
            .into_iter()
            .filter(|e| !e.term.trim().is_empty())
            .map(|e| (e.term.to_lowercase(), e))
            .collect();

        let pattern = compile(entries.keys())?;
        Ok(Self { entries, pattern })
    }

    /// Add or override entries, rebuilding the pattern
    pub fn extend(self, extra: Vec<JargonEntry>) -> Result<Self, JargonError> {
        let mut merged: Vec<JargonEntry> = self.entries.into_values().collect();
        merged.extend(extra);
        Self::with_entries(merged)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, term: &str) -> Option<&JargonEntry> {
        self.entries.get(&term.to_lowercase())
    }

    /// Annotate every known term with its canonical phrase.
    ///
    /// `"Curfew Mode for teens"` becomes
    /// `"Curfew Mode (curfew time-based restriction on minor account access) for teens"`.
    pub fn resolve(&self, text: &str) -> Resolution {
        let Some(pattern) = &self.pattern else {
            return Resolution {
                normalized_text: text.to_string(),
                resolved: BTreeMap::new(),
            };
        };

        let mut resolved = BTreeMap::new();
        let normalized = pattern.replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            let key = matched.to_lowercase();
            match self.entries.get(&key) {
                Some(entry) => {
                    resolved.insert(key, entry.canonical_phrase.clone());
                    format!("{matched} ({})", entry.canonical_phrase)
                }
                None => matched.to_string(),
            }
        });

        Resolution {
            normalized_text: normalized.into_owned(),
            resolved,
        }
    }

    /// Strings that look like jargon but are not in the table.
    ///
    /// Picks CamelCase words, all-caps acronyms and hyphenated compounds, in
    /// order of first appearance, up to [`MAX_SUGGESTIONS`].
    pub fn suggest_unknown_terms(&self, text: &str) -> Vec<String> {
        let mut candidates: Vec<(usize, &str)> = Vec::new();
        for pattern in [&*CAMEL_CASE, &*ACRONYM, &*HYPHENATED] {
            candidates.extend(pattern.find_iter(text).map(|m| (m.start(), m.as_str())));
        }
        candidates.sort_by_key(|(start, _)| *start);

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .map(|(_, term)| term)
            .filter(|term| !self.entries.contains_key(&term.to_lowercase()))
            .filter(|term| seen.insert(term.to_lowercase()))
            .take(MAX_SUGGESTIONS)
            .map(str::to_string)
            .collect()
    }
}

impl Default for JargonResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn compile<'a>(terms: impl Iterator<Item = &'a String>) -> Result<Option<Regex>, regex::Error> {
    let mut terms: Vec<&String> = terms.collect();
    if terms.is_empty() {
        return Ok(None);
    }
    // Longest first, then alphabetical so the pattern is deterministic
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).map(Some)
}

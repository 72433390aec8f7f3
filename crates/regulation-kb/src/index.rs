//! TF-IDF index over regulation clauses
//!
//! Each clause becomes a sparse vector of `tf × idf` weights, L2-normalized.
//!
//! ```text
//! idf(t) = ln((1 + n) / (1 + df(t))) + 1
//! ```
//!
//! where `n` is the number of clauses and `df(t)` the number of clauses that
//! contain term `t`. Query terms outside the clause vocabulary are ignored.
//!
//! A query is scored by how much of each clause it covers:
//!
//! ```text
//! similarity(q, c) = sqrt(Σ w_c(t)²)   for distinct t in both q and c
//! ```
//!
//! which is the cosine between the clause vector and its restriction to the
//! query's terms. It is 1 when the query holds every clause term, and adding
//! words to a query never lowers it.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use shared_types::{MatchResult, RegulationClause};

use crate::tokenizer::tokenize;

/// Matches scoring below this are discarded regardless of `top_k`
pub const SIMILARITY_FLOOR: f64 = 0.2;

/// Matches sharing fewer distinct terms than this with the query are incidental
pub const MIN_SHARED_TERMS: usize = 2;

type SparseVector = HashMap<String, f64>;

/// Aggregate view of one statute in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationSummary {
    pub id: String,
    pub name: String,
    pub jurisdiction: String,
    pub clause_count: usize,
}

/// Immutable clause index. Build once, query from any thread.
#[derive(Debug, Clone, Default)]
pub struct RegulationIndex {
    clauses: Vec<RegulationClause>,
    vectors: Vec<SparseVector>,
    idf: HashMap<String, f64>,
}

impl RegulationIndex {
    /// Build an index over `clauses`, keeping their order for tie-breaking
    pub fn build(clauses: Vec<RegulationClause>) -> Self {
        let documents: Vec<Vec<String>> = clauses.iter().map(|c| tokenize(&c.clause_text)).collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for terms in &documents {
            let distinct: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
            for term in distinct {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: HashMap<String, f64> = document_frequency
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let vectors = documents.iter().map(|terms| weigh(terms, &idf)).collect();

        Self {
            clauses,
            vectors,
            idf,
        }
    }

    /// An index with no clauses; every query returns nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rank clauses by coverage of `text`, keeping the best `top_k`.
    ///
    /// Results are sorted by descending similarity with ties in insertion
    /// order, filtered by [`SIMILARITY_FLOOR`] and [`MIN_SHARED_TERMS`], and
    /// truncated to `top_k`.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<MatchResult> {
        let mut matches = self.matches(text);
        matches.truncate(top_k);
        matches
    }

    /// Every clause that passes the similarity filters, ranked as [`query`] ranks them.
    ///
    /// [`query`]: RegulationIndex::query
    pub fn matches(&self, text: &str) -> Vec<MatchResult> {
        if self.clauses.is_empty() {
            return Vec::new();
        }

        let terms = tokenize(text);
        let query: HashSet<&str> = terms
            .iter()
            .map(String::as_str)
            .filter(|t| self.idf.contains_key(*t))
            .collect();
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .filter_map(|(i, clause_vec)| {
                let (similarity, shared) = coverage(&query, clause_vec);
                (similarity >= SIMILARITY_FLOOR && shared >= MIN_SHARED_TERMS)
                    .then_some((i, similarity))
            })
            .collect();

        // sort_by is stable, so equal scores keep clause order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        scored
            .into_iter()
            .map(|(i, similarity)| MatchResult {
                clause: self.clauses[i].clone(),
                similarity,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[RegulationClause] {
        &self.clauses
    }

    /// Number of distinct terms across all clauses
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Statutes in first-seen order
    pub fn regulations(&self) -> Vec<RegulationSummary> {
        let mut summaries: Vec<RegulationSummary> = Vec::new();
        for clause in &self.clauses {
            match summaries.iter_mut().find(|s| s.id == clause.regulation_id) {
                Some(summary) => summary.clause_count += 1,
                None => summaries.push(RegulationSummary {
                    id: clause.regulation_id.clone(),
                    name: clause.regulation_name.clone(),
                    jurisdiction: clause.jurisdiction.clone(),
                    clause_count: 1,
                }),
            }
        }
        summaries
    }

    pub fn regulation(&self, id: &str) -> Option<RegulationSummary> {
        self.regulations().into_iter().find(|r| r.id == id)
    }

    /// Clauses whose jurisdiction contains `name`, case-insensitively
    pub fn clauses_for_jurisdiction(&self, name: &str) -> Vec<&RegulationClause> {
        let needle = name.to_lowercase();
        self.clauses
            .iter()
            .filter(|c| c.jurisdiction.to_lowercase().contains(&needle))
            .collect()
    }

    /// Sorted, de-duplicated jurisdictions covered by the index
    pub fn jurisdictions(&self) -> Vec<String> {
        self.clauses
            .iter()
            .map(|c| c.jurisdiction.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Raw term frequency times IDF, L2-normalized. Unknown terms are skipped.
fn weigh(terms: &[String], idf: &HashMap<String, f64>) -> SparseVector {
    let mut vector: SparseVector = HashMap::new();
    for term in terms {
        if let Some(weight) = idf.get(term) {
            *vector.entry(term.clone()).or_insert(0.0) += weight;
        }
    }

    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.values_mut().for_each(|w| *w /= norm);
    } else {
        vector.clear();
    }
    vector
}

/// Norm of the clause vector restricted to the query terms, and how many terms it kept
fn coverage(query: &HashSet<&str>, clause: &SparseVector) -> (f64, usize) {
    let mut covered = 0.0;
    let mut shared = 0;
    for (term, weight) in clause {
        if query.contains(term.as_str()) {
            covered += weight * weight;
            shared += 1;
        }
    }
    (covered.sqrt().min(1.0), shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::builtin_clauses;
    use pretty_assertions::assert_eq;
    use shared_types::Category;

    fn clause(id: &str, jurisdiction: &str, text: &str) -> RegulationClause {
        RegulationClause {
            regulation_id: id.to_string(),
            regulation_name: format!("{id} act"),
            jurisdiction: jurisdiction.to_string(),
            clause_text: text.to_string(),
            category: Category::ChildSafety,
        }
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = RegulationIndex::empty();
        assert!(index.query("minor curfew", 10).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_identical_text_scores_one() {
        let index = RegulationIndex::build(vec![clause("a", "Utah, US", "curfew blocks minor access")]);
        let results = index.query("curfew blocks minor access", 5);

        assert_eq!(results.len(), 1);
        assert!((results[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_shared_term_is_discarded() {
        let index = RegulationIndex::build(vec![clause("a", "Utah, US", "curfew blocks minor access")]);
        assert!(index.query("curfew", 5).is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = RegulationIndex::build(vec![
            clause("first", "Utah, US", "minor account curfew"),
            clause("second", "Texas, US", "minor account curfew"),
        ]);
        let results = index.query("minor account curfew", 5);

        let ids: Vec<&str> = results.iter().map(|r| r.clause.regulation_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_top_k_truncates() {
        let index = RegulationIndex::build(builtin_clauses());
        let results = index.query("content moderation decisions transparency reports", 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].clause.regulation_id, "eu_dsa_2022");
        assert!(index.query("content moderation", 0).is_empty());
    }

    #[test]
    fn test_repeated_query_terms_do_not_count_twice() {
        let index = RegulationIndex::build(vec![clause("a", "Utah, US", "curfew blocks minor access")]);
        let once = index.query("curfew minor", 5);
        let repeated = index.query("curfew curfew curfew minor", 5);

        assert_eq!(once.len(), 1);
        assert!((once[0].similarity - repeated[0].similarity).abs() < 1e-12);
    }

    #[test]
    fn test_extra_words_never_lower_similarity() {
        let index = RegulationIndex::build(builtin_clauses());
        let base = "age verification with parental consent for minors";
        let before = index.matches(base);
        let after = index.matches(&format!("{base} age verification csam report"));

        for hit in &before {
            let again = after
                .iter()
                .find(|m| m.clause == hit.clause)
                .expect("clause should still match");
            assert!(again.similarity >= hit.similarity - 1e-12);
        }
    }

    #[test]
    fn test_matches_is_untruncated_query() {
        let index = RegulationIndex::build(builtin_clauses());
        let text = "minor account curfew with parental consent and personal data";
        let all = index.matches(text);

        assert!(all.len() > 2);
        assert_eq!(index.query(text, 2), all[..2].to_vec());
        assert_eq!(index.query(text, usize::MAX), all);
    }

    #[test]
    fn test_out_of_vocabulary_query() {
        let index = RegulationIndex::build(builtin_clauses());
        assert!(index.query("dark color theme checkout invoices", 10).is_empty());
    }

    #[test]
    fn test_curfew_query_hits_utah() {
        let index = RegulationIndex::build(builtin_clauses());
        let results = index.query(
            "curfew restriction on minor account access between 10pm and 6am",
            10,
        );

        assert!(!results.is_empty());
        assert_eq!(results[0].clause.regulation_id, "ut_social_media_2023");
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_regulation_lookups() {
        let index = RegulationIndex::build(builtin_clauses());

        assert_eq!(index.regulations().len(), 5);
        let utah = index.regulation("ut_social_media_2023").unwrap();
        assert_eq!(utah.clause_count, 4);
        assert_eq!(utah.jurisdiction, "Utah, US");
        assert!(index.regulation("nope").is_none());

        assert_eq!(index.clauses_for_jurisdiction("florida").len(), 3);
        assert_eq!(
            index.jurisdictions(),
            vec![
                "California, US",
                "European Union",
                "Florida, US",
                "United States",
                "Utah, US"
            ]
        );
    }
}

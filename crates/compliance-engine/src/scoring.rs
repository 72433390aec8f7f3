//! Risk scoring from regulation matches
//!
//! Each category contributes at most its weight, scaled by the best similarity
//! any matched clause of that category reached. Similarities at or above
//! [`SATURATION`] earn the full weight. An explicit age reference in the
//! feature text adds [`HEURISTIC_POINTS`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared_types::{Category, MatchResult, RiskTier};

use crate::patterns::contains_age_keyword;

/// Similarity at which a category earns its full weight
pub const SATURATION: f64 = 0.5;

/// Points added when the feature text names an age group or guardian
pub const HEURISTIC_POINTS: u8 = 5;

pub const MAX_SCORE: u8 = 100;

/// Maximum points a category can contribute
pub fn category_weight(category: Category) -> u8 {
    match category {
        Category::ChildSafety => 40,
        Category::DataPrivacy => 30,
        Category::ContentModeration => 25,
        Category::Other => 0,
    }
}

/// How a score was put together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub tier: RiskTier,
    /// Points per matched category
    pub contributions: BTreeMap<Category, u8>,
    /// Best similarity per matched category
    pub best_similarity: BTreeMap<Category, f64>,
    pub heuristic_points: u8,
}

impl ScoreBreakdown {
    /// Category with the most points. Ties go to the earlier category
    /// (child safety, then data privacy, then content moderation).
    pub fn top_category(&self) -> Option<Category> {
        self.contributions
            .iter()
            .filter(|(_, points)| **points > 0)
            .fold(None, |best: Option<(Category, u8)>, (category, points)| match best {
                Some((_, best_points)) if best_points >= *points => best,
                _ => Some((*category, *points)),
            })
            .map(|(category, _)| category)
    }
}

/// Deterministic scorer. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `matches` against the feature text they were found for
    pub fn score(&self, matches: &[MatchResult], feature_text: &str) -> ScoreBreakdown {
        let mut best_similarity: BTreeMap<Category, f64> = BTreeMap::new();
        for m in matches {
            let best = best_similarity.entry(m.clause.category).or_insert(0.0);
            if m.similarity > *best {
                *best = m.similarity;
            }
        }

        let contributions: BTreeMap<Category, u8> = best_similarity
            .iter()
            .map(|(category, similarity)| {
                let fraction = (similarity / SATURATION).clamp(0.0, 1.0);
                let points = (f64::from(category_weight(*category)) * fraction).round() as u8;
                (*category, points)
            })
            .collect();

        let heuristic_points = if contains_age_keyword(feature_text) {
            HEURISTIC_POINTS
        } else {
            0
        };

        let total: u32 = contributions.values().map(|p| u32::from(*p)).sum::<u32>()
            + u32::from(heuristic_points);
        let score = total.min(u32::from(MAX_SCORE)) as u8;

        ScoreBreakdown {
            score,
            tier: RiskTier::from_score(score),
            contributions,
            best_similarity,
            heuristic_points,
        }
    }
}

/// A feature needs geo-specific compliance work when it scores at least
/// Medium and at least one jurisdiction matched
pub fn requires_geo_compliance(score: u8, regions: &BTreeSet<String>) -> bool {
    score >= RiskTier::MEDIUM_FLOOR && !regions.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::RegulationClause;

    fn hit(category: Category, similarity: f64) -> MatchResult {
        MatchResult {
            clause: RegulationClause {
                regulation_id: "reg".to_string(),
                regulation_name: "Reg".to_string(),
                jurisdiction: "Utah, US".to_string(),
                clause_text: "text".to_string(),
                category,
            },
            similarity,
        }
    }

    #[test]
    fn test_no_matches_scores_zero() {
        let breakdown = RiskScorer::new().score(&[], "Dark mode");
        assert_eq!(breakdown.score, 0);
        assert_eq!(breakdown.tier, RiskTier::Low);
        assert!(breakdown.contributions.is_empty());
        assert_eq!(breakdown.top_category(), None);
    }

    #[test]
    fn test_saturated_categories_earn_full_weight() {
        let matches = vec![
            hit(Category::ChildSafety, 0.61),
            hit(Category::DataPrivacy, 0.55),
            hit(Category::ContentModeration, 0.9),
        ];
        let breakdown = RiskScorer::new().score(&matches, "for teens");

        assert_eq!(breakdown.contributions[&Category::ChildSafety], 40);
        assert_eq!(breakdown.contributions[&Category::DataPrivacy], 30);
        assert_eq!(breakdown.contributions[&Category::ContentModeration], 25);
        assert_eq!(breakdown.heuristic_points, 5);
        assert_eq!(breakdown.score, 100);
        assert_eq!(breakdown.tier, RiskTier::High);
    }

    #[test]
    fn test_partial_similarity_scales_weight() {
        let breakdown = RiskScorer::new().score(&[hit(Category::DataPrivacy, 0.25)], "location");
        assert_eq!(breakdown.contributions[&Category::DataPrivacy], 15);
        assert_eq!(breakdown.score, 15);
    }

    #[test]
    fn test_best_similarity_per_category_is_used() {
        let matches = vec![hit(Category::ChildSafety, 0.3), hit(Category::ChildSafety, 0.45)];
        let breakdown = RiskScorer::new().score(&matches, "");
        assert_eq!(breakdown.contributions[&Category::ChildSafety], 36);
    }

    #[test]
    fn test_other_category_adds_nothing() {
        let breakdown = RiskScorer::new().score(&[hit(Category::Other, 0.9)], "");
        assert_eq!(breakdown.score, 0);
    }

    #[test]
    fn test_heuristic_alone() {
        let breakdown = RiskScorer::new().score(&[], "Adds a page for minors.");
        assert_eq!(breakdown.score, 5);
        assert_eq!(breakdown.heuristic_points, 5);
    }

    #[test]
    fn test_top_category_tie_prefers_child_safety() {
        let mut breakdown = RiskScorer::new().score(&[], "");
        breakdown.contributions = BTreeMap::from([
            (Category::ChildSafety, 25),
            (Category::ContentModeration, 25),
        ]);
        assert_eq!(breakdown.top_category(), Some(Category::ChildSafety));

        breakdown.contributions.insert(Category::DataPrivacy, 30);
        assert_eq!(breakdown.top_category(), Some(Category::DataPrivacy));
    }

    #[test]
    fn test_requires_geo_compliance() {
        let regions = BTreeSet::from(["Utah, US".to_string()]);
        assert!(requires_geo_compliance(30, &regions));
        assert!(!requires_geo_compliance(29, &regions));
        assert!(!requires_geo_compliance(90, &BTreeSet::new()));
    }
}

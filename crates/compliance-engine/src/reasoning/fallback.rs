//! Rule-based narrative used whenever the reasoning service is absent or fails

use std::collections::BTreeSet;

use shared_types::{Feature, MatchResult, ReasoningSource};

use super::Explanation;
use crate::patterns::{evidence_excerpt, find_age_keyword};
use crate::scoring::{requires_geo_compliance, ScoreBreakdown};

/// Build an explanation from the score breakdown alone. Pure and total.
pub fn fallback_explanation(
    feature: &Feature,
    matches: &[MatchResult],
    breakdown: &ScoreBreakdown,
) -> Explanation {
    let full_text = feature.full_text();
    let jurisdictions: BTreeSet<&str> = matches.iter().map(|m| m.clause.jurisdiction.as_str()).collect();

    let mut sentences: Vec<String> = Vec::new();

    match matches.first() {
        None => sentences.push(
            "No regulation clause matched this feature closely enough to indicate a \
             region-specific obligation."
                .to_string(),
        ),
        Some(top) => {
            let source = format!(
                "{} ({})",
                top.clause.regulation_name, top.clause.jurisdiction
            );
            match breakdown.top_category() {
                Some(category) => sentences.push(format!(
                    "Highest risk comes from {} obligations; the closest clause is from {}.",
                    category.label(),
                    source
                )),
                None => sentences.push(format!("The closest clause is from {source}.")),
            }
            sentences.push(format!(
                "Matched {} clause{} across {} jurisdiction{}.",
                matches.len(),
                plural(matches.len()),
                jurisdictions.len(),
                plural(jurisdictions.len())
            ));
        }
    }

    if breakdown.heuristic_points > 0 {
        match find_age_keyword(&full_text) {
            Some(keyword) => sentences.push(format!(
                "The feature text references an age group (\"{keyword}\"), adding {} points.",
                breakdown.heuristic_points
            )),
            None => sentences.push(format!(
                "The feature targets an age group, adding {} points.",
                breakdown.heuristic_points
            )),
        }
    }

    sentences.push(format!(
        "Risk score {}/100 ({} risk).",
        breakdown.score, breakdown.tier
    ));

    let regions: BTreeSet<String> = jurisdictions.iter().map(|j| j.to_string()).collect();
    if requires_geo_compliance(breakdown.score, &regions) {
        sentences.push("Geo-specific compliance logic is likely required.".to_string());
    } else {
        sentences.push("Geo-specific compliance logic does not appear to be required.".to_string());
    }

    Explanation {
        reasoning: sentences.join(" "),
        evidence: evidence_excerpt(&full_text),
        source: ReasoningSource::RuleBased,
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RiskScorer;
    use pretty_assertions::assert_eq;
    use shared_types::{Category, RegulationClause};

    fn utah_match(category: Category, similarity: f64) -> MatchResult {
        MatchResult {
            clause: RegulationClause {
                regulation_id: "ut_social_media_2023".to_string(),
                regulation_name: "Utah Social Media Regulation Act".to_string(),
                jurisdiction: "Utah, US".to_string(),
                clause_text: "curfew".to_string(),
                category,
            },
            similarity,
        }
    }

    #[test]
    fn test_no_match_narrative() {
        let feature = Feature::new("Dark mode", "A darker theme.");
        let breakdown = RiskScorer::new().score(&[], &feature.full_text());
        let explanation = fallback_explanation(&feature, &[], &breakdown);

        assert!(explanation.reasoning.starts_with("No regulation clause matched"));
        assert!(explanation.reasoning.contains("Risk score 0/100 (Low risk)."));
        assert!(explanation.reasoning.ends_with("does not appear to be required."));
        assert_eq!(explanation.evidence, "Feature text: Dark mode A darker theme.");
        assert_eq!(explanation.source, ReasoningSource::RuleBased);
    }

    #[test]
    fn test_match_narrative_names_category_and_regulation() {
        let feature = Feature::new("Curfew", "Logs out teens at night.");
        let matches = vec![
            utah_match(Category::ChildSafety, 0.6),
            utah_match(Category::DataPrivacy, 0.5),
        ];
        let breakdown = RiskScorer::new().score(&matches, &feature.full_text());
        let explanation = fallback_explanation(&feature, &matches, &breakdown);

        assert_eq!(
            explanation.reasoning,
            "Highest risk comes from child safety obligations; the closest clause is from \
             Utah Social Media Regulation Act (Utah, US). Matched 2 clauses across 1 \
             jurisdiction. The feature text references an age group (\"teens\"), adding 5 \
             points. Risk score 75/100 (High risk). Geo-specific compliance logic is likely \
             required."
        );
    }

    #[test]
    fn test_evidence_is_truncated() {
        let feature = Feature::new("Long", "a".repeat(400));
        let breakdown = RiskScorer::new().score(&[], "");
        let explanation = fallback_explanation(&feature, &[], &breakdown);
        assert_eq!(explanation.evidence.chars().count(), "Feature text: ".len() + 200 + 3);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let feature = Feature::new("Curfew", "Logs out teens at night.");
        let matches = vec![utah_match(Category::ChildSafety, 0.4)];
        let breakdown = RiskScorer::new().score(&matches, &feature.full_text());
        assert_eq!(
            fallback_explanation(&feature, &matches, &breakdown),
            fallback_explanation(&feature, &matches, &breakdown)
        );
    }
}

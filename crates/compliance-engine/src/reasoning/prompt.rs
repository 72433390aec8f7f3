//! Prompt construction and response parsing for the reasoning service

use std::collections::BTreeMap;
use std::fmt::Write;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::{Category, MatchResult, RiskTier};

use crate::error::ReasoningError;
use crate::scoring::ScoreBreakdown;

/// Clause excerpts included in the prompt
pub const PROMPT_CLAUSES: usize = 3;

/// One matched clause as shown to the reasoning service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseExcerpt {
    pub regulation_name: String,
    pub jurisdiction: String,
    pub category: Category,
    pub clause_text: String,
    pub similarity: f64,
}

/// Everything the reasoning service needs to narrate one verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningPrompt {
    pub feature_title: String,
    pub feature_text: String,
    pub jargon_resolved: BTreeMap<String, String>,
    pub clauses: Vec<ClauseExcerpt>,
    pub jurisdictions: Vec<String>,
    pub score: u8,
    pub tier: RiskTier,
    pub contributions: BTreeMap<Category, u8>,
}

impl ReasoningPrompt {
    pub fn new(
        feature_title: &str,
        feature_text: &str,
        jargon_resolved: &BTreeMap<String, String>,
        matches: &[MatchResult],
        breakdown: &ScoreBreakdown,
    ) -> Self {
        let mut jurisdictions: Vec<String> = matches.iter().map(|m| m.clause.jurisdiction.clone()).collect();
        jurisdictions.sort();
        jurisdictions.dedup();

        Self {
            feature_title: feature_title.to_string(),
            feature_text: feature_text.to_string(),
            jargon_resolved: jargon_resolved.clone(),
            clauses: matches
                .iter()
                .take(PROMPT_CLAUSES)
                .map(|m| ClauseExcerpt {
                    regulation_name: m.clause.regulation_name.clone(),
                    jurisdiction: m.clause.jurisdiction.clone(),
                    category: m.clause.category,
                    clause_text: m.clause.clause_text.clone(),
                    similarity: m.similarity,
                })
                .collect(),
            jurisdictions,
            score: breakdown.score,
            tier: breakdown.tier,
            contributions: breakdown.contributions.clone(),
        }
    }

    /// Render as the instruction text sent to the model
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "You are a legal compliance expert deciding whether a software feature needs \
             geo-specific regulatory compliance logic."
        );
        let _ = writeln!(out, "\nFEATURE: {}\n{}", self.feature_title, self.feature_text);

        if !self.jargon_resolved.is_empty() {
            let _ = writeln!(out, "\nINTERNAL TERMS:");
            for (term, meaning) in &self.jargon_resolved {
                let _ = writeln!(out, "- {term}: {meaning}");
            }
        }

        let _ = writeln!(out, "\nMATCHED REGULATION CLAUSES:");
        if self.clauses.is_empty() {
            let _ = writeln!(out, "- none");
        }
        for clause in &self.clauses {
            let _ = writeln!(
                out,
                "- {} ({}), {}, similarity {:.2}: {}",
                clause.regulation_name,
                clause.jurisdiction,
                clause.category,
                clause.similarity,
                clause.clause_text
            );
        }

        let _ = writeln!(
            out,
            "\nRISK SCORE: {} ({} risk)",
            self.score, self.tier
        );
        for (category, points) in &self.contributions {
            let _ = writeln!(out, "- {category}: {points} points");
        }

        let allowed = if self.jurisdictions.is_empty() {
            "none".to_string()
        } else {
            self.jurisdictions.join(", ")
        };
        let _ = writeln!(
            out,
            "\nExplain in 2-3 sentences why this feature does or does not need geo-specific \
             compliance. Only mention these jurisdictions: {allowed}. Quote the feature text \
             that supports your answer as evidence."
        );
        let _ = write!(
            out,
            "Respond with a JSON object only: {{\"reasoning\": \"string\", \"evidence\": \"string\"}}"
        );
        out
    }
}

/// Narrative returned by the reasoning service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub reasoning: String,
    #[serde(default)]
    pub evidence: Option<String>,
}

lazy_static! {
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Pull the first JSON object out of model output, tolerating code fences
/// and surrounding prose
pub fn parse_narrative(raw: &str) -> Result<Narrative, ReasoningError> {
    let object = JSON_OBJECT
        .find(raw)
        .ok_or_else(|| ReasoningError::Malformed("no JSON object in model output".to_string()))?;

    let narrative: Narrative = serde_json::from_str(object.as_str())
        .map_err(|e| ReasoningError::Malformed(e.to_string()))?;

    if narrative.reasoning.trim().is_empty() {
        return Err(ReasoningError::Malformed("empty reasoning".to_string()));
    }

    Ok(Narrative {
        reasoning: narrative.reasoning.trim().to_string(),
        evidence: narrative
            .evidence
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RiskScorer;
    use pretty_assertions::assert_eq;
    use shared_types::RegulationClause;

    fn matches() -> Vec<MatchResult> {
        ["Utah, US", "California, US", "Utah, US", "European Union"]
            .iter()
            .enumerate()
            .map(|(i, jurisdiction)| MatchResult {
                clause: RegulationClause {
                    regulation_id: format!("reg{i}"),
                    regulation_name: format!("Regulation {i}"),
                    jurisdiction: jurisdiction.to_string(),
                    clause_text: format!("Clause {i}"),
                    category: Category::ChildSafety,
                },
                similarity: 0.5 - i as f64 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_prompt_keeps_top_three_clauses() {
        let m = matches();
        let breakdown = RiskScorer::new().score(&m, "teen curfew");
        let prompt = ReasoningPrompt::new("Curfew", "teen curfew", &BTreeMap::new(), &m, &breakdown);

        assert_eq!(prompt.clauses.len(), 3);
        assert_eq!(
            prompt.jurisdictions,
            vec!["California, US", "European Union", "Utah, US"]
        );
    }

    #[test]
    fn test_render_mentions_inputs() {
        let m = matches();
        let breakdown = RiskScorer::new().score(&m, "teen curfew");
        let jargon = BTreeMap::from([("curfew".to_string(), "night lockout".to_string())]);
        let rendered = ReasoningPrompt::new("Curfew", "teen curfew", &jargon, &m, &breakdown).render();

        assert!(rendered.contains("FEATURE: Curfew"));
        assert!(rendered.contains("- curfew: night lockout"));
        assert!(rendered.contains("Regulation 0 (Utah, US)"));
        assert!(!rendered.contains("Regulation 3"));
        assert!(rendered.contains("\"reasoning\""));
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"reasoning\": \" Needs Utah curfew logic. \", \"evidence\": \"under 18\"}\n```";
        let narrative = parse_narrative(raw).unwrap();
        assert_eq!(narrative.reasoning, "Needs Utah curfew logic.");
        assert_eq!(narrative.evidence.as_deref(), Some("under 18"));
    }

    #[test]
    fn test_parse_without_evidence() {
        let narrative = parse_narrative(r#"{"reasoning": "No regional obligations."}"#).unwrap();
        assert_eq!(narrative.evidence, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_narrative("I cannot help with that"),
            Err(ReasoningError::Malformed(_))
        ));
        assert!(matches!(
            parse_narrative("{\"reasoning\": 42}"),
            Err(ReasoningError::Malformed(_))
        ));
        assert!(matches!(
            parse_narrative("{\"reasoning\": \"  \"}"),
            Err(ReasoningError::Malformed(_))
        ));
    }
}

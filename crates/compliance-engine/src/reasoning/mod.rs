//! Reasoning adapter - narrative for a verdict
//!
//! This module provides:
//! - The `ReasoningService` seam for external narrative generation
//! - A Gemini-backed implementation
//! - The deterministic rule-based fallback
//!
//! The adapter makes a single, time-bounded attempt at the external service.
//! Any failure, or no configured service, produces the fallback narrative.

pub mod fallback;
pub mod gemini;
pub mod prompt;

pub use fallback::fallback_explanation;
pub use gemini::GeminiClient;
pub use prompt::{parse_narrative, Narrative, ReasoningPrompt};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{Feature, MatchResult, ReasoningSource};
use tracing::{debug, warn};

use crate::error::ReasoningError;
use crate::scoring::ScoreBreakdown;

pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// External narrative generator
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn narrate(&self, prompt: &ReasoningPrompt) -> Result<Narrative, ReasoningError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Reasoning text attached to a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub reasoning: String,
    pub evidence: String,
    pub source: ReasoningSource,
}

/// Whether verdict narratives come from a model or the rule template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    LlmAssisted,
    RuleBased,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineMode::LlmAssisted => write!(f, "LLM-assisted"),
            EngineMode::RuleBased => write!(f, "rule-based"),
        }
    }
}

/// Bridges an optional [`ReasoningService`] and the rule-based fallback
#[derive(Clone)]
pub struct ReasoningAdapter {
    service: Option<Arc<dyn ReasoningService>>,
    timeout: Duration,
}

impl fmt::Debug for ReasoningAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasoningAdapter")
            .field("service", &self.service.as_ref().map(|s| s.name()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReasoningAdapter {
    /// Adapter that always uses the rule-based narrative
    pub fn rule_based() -> Self {
        Self {
            service: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_service(service: Arc<dyn ReasoningService>, timeout: Duration) -> Self {
        Self {
            service: Some(service),
            timeout,
        }
    }

    pub fn mode(&self) -> EngineMode {
        if self.service.is_some() {
            EngineMode::LlmAssisted
        } else {
            EngineMode::RuleBased
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Explain a scored feature. Never fails.
    pub async fn explain(
        &self,
        feature: &Feature,
        jargon_resolved: &BTreeMap<String, String>,
        matches: &[MatchResult],
        breakdown: &ScoreBreakdown,
    ) -> Explanation {
        let Some(service) = &self.service else {
            return fallback_explanation(feature, matches, breakdown);
        };

        let prompt = ReasoningPrompt::new(
            &feature.title,
            &feature.full_text(),
            jargon_resolved,
            matches,
            breakdown,
        );

        let result = match tokio::time::timeout(self.timeout, service.narrate(&prompt)).await {
            Ok(result) => result,
            Err(_timeout) => Err(ReasoningError::Timeout(self.timeout.as_millis() as u64)),
        };

        match result {
            Ok(narrative) => {
                debug!(service = service.name(), feature_id = %feature.id, "Narrative from reasoning service");
                let fallback_evidence = || fallback_explanation(feature, matches, breakdown).evidence;
                Explanation {
                    reasoning: narrative.reasoning,
                    evidence: narrative.evidence.unwrap_or_else(fallback_evidence),
                    source: ReasoningSource::Llm,
                }
            }
            Err(e) => {
                warn!(
                    service = service.name(),
                    feature_id = %feature.id,
                    error = %e,
                    "Reasoning service failed, using rule-based narrative"
                );
                fallback_explanation(feature, matches, breakdown)
            }
        }
    }
}

impl Default for ReasoningAdapter {
    fn default() -> Self {
        Self::rule_based()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RiskScorer;
    use pretty_assertions::assert_eq;

    struct Scripted(Result<&'static str, u64>);

    #[async_trait]
    impl ReasoningService for Scripted {
        async fn narrate(&self, _prompt: &ReasoningPrompt) -> Result<Narrative, ReasoningError> {
            match self.0 {
                Ok(raw) => parse_narrative(raw),
                Err(delay_ms) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Err(ReasoningError::Unauthorized)
                }
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn inputs() -> (Feature, ScoreBreakdown) {
        let feature = Feature::new("Curfew", "Night curfew for accounts.");
        let breakdown = RiskScorer::new().score(&[], &feature.full_text());
        (feature, breakdown)
    }

    #[tokio::test]
    async fn test_rule_based_mode() {
        let adapter = ReasoningAdapter::rule_based();
        let (feature, breakdown) = inputs();

        assert_eq!(adapter.mode(), EngineMode::RuleBased);
        let explanation = adapter.explain(&feature, &BTreeMap::new(), &[], &breakdown).await;
        assert_eq!(explanation, fallback_explanation(&feature, &[], &breakdown));
    }

    #[tokio::test]
    async fn test_service_narrative_is_used() {
        let adapter = ReasoningAdapter::with_service(
            Arc::new(Scripted(Ok(r#"{"reasoning": "Utah curfew applies."}"#))),
            Duration::from_secs(1),
        );
        let (feature, breakdown) = inputs();

        let explanation = adapter.explain(&feature, &BTreeMap::new(), &[], &breakdown).await;
        assert_eq!(adapter.mode(), EngineMode::LlmAssisted);
        assert_eq!(explanation.reasoning, "Utah curfew applies.");
        assert_eq!(explanation.source, ReasoningSource::Llm);
        assert!(explanation.evidence.starts_with("Feature text: Curfew"));
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let adapter = ReasoningAdapter::with_service(
            Arc::new(Scripted(Ok("not json at all"))),
            Duration::from_secs(1),
        );
        let (feature, breakdown) = inputs();

        let explanation = adapter.explain(&feature, &BTreeMap::new(), &[], &breakdown).await;
        assert_eq!(explanation.source, ReasoningSource::RuleBased);
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let adapter = ReasoningAdapter::with_service(
            Arc::new(Scripted(Err(5_000))),
            Duration::from_millis(20),
        );
        let (feature, breakdown) = inputs();

        let explanation = adapter.explain(&feature, &BTreeMap::new(), &[], &breakdown).await;
        assert_eq!(explanation, fallback_explanation(&feature, &[], &breakdown));
    }
}

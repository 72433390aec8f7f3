//! Feature analyzer - the engine's entry point

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use regulation_kb::KnowledgeBase;
use shared_types::{ComplianceVerdict, Feature};
use tracing::{debug, error, info, warn};

use crate::audit::{AuditSink, JsonlAuditLog, MemoryAuditLog};
use crate::config::EngineConfig;
use crate::error::AuditError;
use crate::export;
use crate::jargon::{load_entries, JargonResolver};
use crate::reasoning::{EngineMode, GeminiClient, ReasoningAdapter};
use crate::report::DashboardSummary;
use crate::scoring::{requires_geo_compliance, RiskScorer};

/// Result of analyzing one feature.
///
/// The verdict is always present. An audit failure is reported next to it
/// instead of discarding the analysis.
#[derive(Debug)]
pub struct Analysis {
    pub verdict: ComplianceVerdict,
    pub audit_warning: Option<AuditError>,
}

/// Compliance analysis engine.
///
/// Cheap to clone; clones share the knowledge base, jargon table and audit sink.
#[derive(Clone)]
pub struct ComplianceEngine {
    knowledge_base: KnowledgeBase,
    jargon: Arc<JargonResolver>,
    scorer: RiskScorer,
    reasoning: ReasoningAdapter,
    audit: Arc<dyn AuditSink>,
    top_k: usize,
}

impl ComplianceEngine {
    /// Rule-based engine over the built-in corpus with an in-memory audit log
    pub fn new() -> Self {
        Self {
            knowledge_base: KnowledgeBase::builtin(),
            jargon: Arc::new(JargonResolver::new()),
            scorer: RiskScorer::new(),
            reasoning: ReasoningAdapter::rule_based(),
            audit: Arc::new(MemoryAuditLog::new()),
            top_k: crate::config::DEFAULT_TOP_K,
        }
    }

    /// Assemble an engine from configuration.
    ///
    /// Corpus and jargon problems degrade to defaults with a warning. Only an
    /// unusable audit log path is an error.
    pub async fn from_config(config: &EngineConfig) -> Result<Self, AuditError> {
        let knowledge_base = KnowledgeBase::from_source(config.corpus_path.as_deref());

        let jargon = match &config.jargon_path {
            Some(path) => match load_entries(path).and_then(|extra| JargonResolver::new().extend(extra)) {
                Ok(resolver) => resolver,
                Err(e) => {
                    warn!(error = %e, "Custom jargon table ignored, using built-in table");
                    JargonResolver::new()
                }
            },
            None => JargonResolver::new(),
        };

        let timeout = Duration::from_millis(config.reasoning_timeout_ms);
        let reasoning = match config.effective_api_key() {
            Some(key) => {
                let mut client = GeminiClient::new(key, config.model.clone()).with_request_timeout(timeout);
                if let Some(url) = &config.llm_base_url {
                    client = client.with_base_url(url.clone());
                }
                ReasoningAdapter::with_service(Arc::new(client), timeout)
            }
            None => ReasoningAdapter::rule_based(),
        };

        let audit: Arc<dyn AuditSink> = match &config.audit_path {
            Some(path) => Arc::new(JsonlAuditLog::open(path).await?),
            None => Arc::new(MemoryAuditLog::new()),
        };

        let engine = Self {
            knowledge_base,
            jargon: Arc::new(jargon),
            scorer: RiskScorer::new(),
            reasoning,
            audit,
            top_k: config.top_k,
        };

        info!(
            mode = %engine.mode(),
            clauses = engine.knowledge_base.snapshot().len(),
            jargon_terms = engine.jargon.len(),
            "Compliance engine ready"
        );
        Ok(engine)
    }

    pub fn with_knowledge_base(mut self, knowledge_base: KnowledgeBase) -> Self {
        self.knowledge_base = knowledge_base;
        self
    }

    pub fn with_jargon(mut self, jargon: JargonResolver) -> Self {
        self.jargon = Arc::new(jargon);
        self
    }

    pub fn with_reasoning(mut self, reasoning: ReasoningAdapter) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn mode(&self) -> EngineMode {
        self.reasoning.mode()
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn jargon(&self) -> &JargonResolver {
        &self.jargon
    }

    pub fn audit_sink(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    /// Analyze one feature and record the verdict
    pub async fn analyze(&self, feature: &Feature) -> Analysis {
        let full_text = feature.full_text();
        let resolution = self.jargon.resolve(&full_text);

        let index = self.knowledge_base.snapshot();
        // Score on every surviving match so a category never falls off the
        // ranked list; regions and reasoning see only the best top_k.
        let all_matches = index.matches(&resolution.normalized_text);
        let breakdown = self.scorer.score(&all_matches, &resolution.normalized_text);
        let matches = &all_matches[..all_matches.len().min(self.top_k)];

        let regions_affected: BTreeSet<String> =
            matches.iter().map(|m| m.clause.jurisdiction.clone()).collect();
        let related_regulations: BTreeSet<String> =
            matches.iter().map(|m| m.clause.regulation_id.clone()).collect();

        let explanation = self
            .reasoning
            .explain(feature, &resolution.resolved, matches, &breakdown)
            .await;

        let verdict = ComplianceVerdict {
            feature_id: feature.id.clone(),
            title: feature.title.clone(),
            requires_geo_compliance: requires_geo_compliance(breakdown.score, &regions_affected),
            risk_score: breakdown.score,
            risk_tier: breakdown.tier,
            regions_affected,
            related_regulations,
            reasoning: explanation.reasoning,
            evidence: explanation.evidence,
            jargon_resolved: resolution.resolved,
            category_scores: breakdown.contributions,
            reasoning_source: explanation.source,
            timestamp: Utc::now(),
        };

        debug!(
            feature_id = %verdict.feature_id,
            score = verdict.risk_score,
            tier = %verdict.risk_tier,
            matches = matches.len(),
            flagged = verdict.requires_geo_compliance,
            "Feature analyzed"
        );

        let audit_warning = match self.audit.append(&verdict).await {
            Ok(_) => None,
            Err(e) => {
                error!(feature_id = %verdict.feature_id, error = %e, "Failed to record audit entry");
                Some(e)
            }
        };

        Analysis {
            verdict,
            audit_warning,
        }
    }

    /// Analyze features concurrently; results keep the input order
    pub async fn analyze_batch(&self, features: &[Feature]) -> Vec<Analysis> {
        join_all(features.iter().map(|feature| self.analyze(feature))).await
    }

    /// Every recorded verdict in append order
    pub async fn verdicts(&self) -> Result<Vec<ComplianceVerdict>, AuditError> {
        self.audit.verdicts().await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, AuditError> {
        Ok(DashboardSummary::from_verdicts(&self.verdicts().await?))
    }

    /// All recorded verdicts as CSV text
    pub async fn export_csv(&self) -> Result<String, AuditError> {
        Ok(export::to_csv(&self.verdicts().await?))
    }

    /// Write all recorded verdicts to a timestamped CSV file in `dir`
    pub async fn write_csv_export(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AuditError> {
        let verdicts = self.verdicts().await?;
        Ok(export::write_csv_export(dir, &verdicts).await?)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

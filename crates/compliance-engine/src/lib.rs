//! Geo-compliance analysis engine
//!
//! Takes a feature description, resolves platform jargon, matches it against
//! the regulation knowledge base, scores the risk and explains the verdict.

pub mod analyzer;
pub mod audit;
pub mod config;
pub mod error;
pub mod export;
pub mod jargon;
pub mod patterns;
pub mod reasoning;
pub mod report;
pub mod scoring;

pub use analyzer::{Analysis, ComplianceEngine};
pub use audit::{AuditSink, JsonlAuditLog, MemoryAuditLog};
pub use config::EngineConfig;
pub use error::{AuditError, ConfigError, JargonError, ReasoningError};
pub use jargon::{JargonEntry, JargonResolver, Resolution};
pub use reasoning::{
    EngineMode, Explanation, GeminiClient, Narrative, ReasoningAdapter, ReasoningPrompt,
    ReasoningService,
};
pub use report::{DashboardSummary, RegionCount};
pub use scoring::{requires_geo_compliance, RiskScorer, ScoreBreakdown};

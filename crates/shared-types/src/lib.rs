pub mod audit;
pub mod types;

pub use audit::{verify_chain, AuditRecord, ChainError};
pub use types::{
    Category, ComplianceVerdict, Feature, FeatureInput, InvalidFeatureInput, MatchResult,
    ReasoningSource, RegulationClause, RiskTier, VerdictSummary,
};

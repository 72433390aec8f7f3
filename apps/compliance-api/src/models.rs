//! Request and response bodies for the compliance API

use compliance_engine::{Analysis, EngineMode};
use regulation_kb::RegulationSummary;
use serde::{Deserialize, Serialize};
use shared_types::{ComplianceVerdict, FeatureInput};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModeResponse {
    pub mode: EngineMode,
    pub label: String,
    pub clause_count: usize,
    pub jargon_terms: usize,
}

/// One analyzed feature
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub verdict: ComplianceVerdict,
    /// Set when the verdict could not be written to the audit log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_warning: Option<String>,
    /// Acronyms and coined terms the jargon table does not know
    pub unknown_terms: Vec<String>,
}

impl AnalyzeResponse {
    pub fn new(analysis: Analysis, unknown_terms: Vec<String>) -> Self {
        Self {
            verdict: analysis.verdict,
            audit_warning: analysis.audit_warning.map(|e| e.to_string()),
            unknown_terms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub features: Vec<FeatureInput>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<AnalyzeResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RegulationsResponse {
    pub regulations: Vec<RegulationSummary>,
    pub jurisdictions: Vec<String>,
    pub clause_count: usize,
}

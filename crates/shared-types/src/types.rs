use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A product feature submitted for compliance review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub title: String,
    pub description: String,
    pub prd_text: Option<String>, // Product requirements document
    pub trd_text: Option<String>, // Technical requirements document
}

impl Feature {
    /// Create a feature with a freshly generated id
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            prd_text: None,
            trd_text: None,
        }
    }

    pub fn with_prd(mut self, prd: impl Into<String>) -> Self {
        self.prd_text = Some(prd.into());
        self
    }

    pub fn with_trd(mut self, trd: impl Into<String>) -> Self {
        self.trd_text = Some(trd.into());
        self
    }

    /// All text considered during jargon resolution and matching.
    ///
    /// Blank parts are skipped so an empty feature yields an empty string.
    pub fn full_text(&self) -> String {
        [
            Some(self.title.as_str()),
            Some(self.description.as_str()),
            self.prd_text.as_deref(),
            self.trd_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Wire shape of a feature submission, validated before it reaches the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub prd: Option<String>,
    #[serde(default)]
    pub trd: Option<String>,
}

/// Rejection reasons for a feature submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFeatureInput {
    #[error("feature title is required")]
    MissingTitle,

    #[error("feature description is required")]
    MissingDescription,
}

impl FeatureInput {
    /// Validate the submission and turn it into a [`Feature`] with a new id
    pub fn validate(self) -> Result<Feature, InvalidFeatureInput> {
        if self.title.trim().is_empty() {
            return Err(InvalidFeatureInput::MissingTitle);
        }
        if self.description.trim().is_empty() {
            return Err(InvalidFeatureInput::MissingDescription);
        }

        let mut feature = Feature::new(self.title.trim(), self.description.trim());
        feature.prd_text = self.prd.filter(|p| !p.trim().is_empty());
        feature.trd_text = self.trd.filter(|t| !t.trim().is_empty());
        Ok(feature)
    }
}

/// Legal-risk category a regulation clause belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ChildSafety,
    DataPrivacy,
    ContentModeration,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::ChildSafety,
        Category::DataPrivacy,
        Category::ContentModeration,
        Category::Other,
    ];

    /// Human-readable label used in narratives
    pub fn label(&self) -> &'static str {
        match self {
            Category::ChildSafety => "child safety",
            Category::DataPrivacy => "data privacy",
            Category::ContentModeration => "content moderation",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single indexed unit of regulatory text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationClause {
    pub regulation_id: String,   // e.g., "ut_social_media_2023"
    pub regulation_name: String, // e.g., "Utah Social Media Regulation Act"
    pub jurisdiction: String,    // e.g., "Utah, US"
    pub clause_text: String,
    pub category: Category,
}

/// A clause matched against a query, with how much of the clause the query covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub clause: RegulationClause,
    pub similarity: f64,
}

/// Coarse risk bucket derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Lower bound (inclusive) of the Medium tier
    pub const MEDIUM_FLOOR: u8 = 30;
    /// Lower bound (inclusive) of the High tier
    pub const HIGH_FLOOR: u8 = 70;

    pub fn from_score(score: u8) -> Self {
        if score >= Self::HIGH_FLOOR {
            RiskTier::High
        } else if score >= Self::MEDIUM_FLOOR {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Medium => write!(f, "Medium"),
            RiskTier::High => write!(f, "High"),
        }
    }
}

/// Where the verdict's narrative came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningSource {
    Llm,
    RuleBased,
}

/// Outcome of one compliance analysis. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    pub feature_id: String,
    pub title: String,
    pub requires_geo_compliance: bool,
    pub risk_score: u8,
    pub risk_tier: RiskTier,
    pub regions_affected: BTreeSet<String>,
    pub related_regulations: BTreeSet<String>,
    pub reasoning: String,
    pub evidence: String,
    pub jargon_resolved: BTreeMap<String, String>,
    pub category_scores: BTreeMap<Category, u8>,
    pub reasoning_source: ReasoningSource,
    pub timestamp: DateTime<Utc>,
}

impl ComplianceVerdict {
    pub fn summary(&self) -> VerdictSummary {
        VerdictSummary {
            feature_id: self.feature_id.clone(),
            title: self.title.clone(),
            requires_geo_compliance: self.requires_geo_compliance,
            risk_score: self.risk_score,
            risk_tier: self.risk_tier,
            regions_affected: self.regions_affected.iter().cloned().collect(),
            timestamp: self.timestamp,
        }
    }
}

/// Condensed verdict for listings such as the dashboard's recent analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictSummary {
    pub feature_id: String,
    pub title: String,
    pub requires_geo_compliance: bool,
    pub risk_score: u8,
    pub risk_tier: RiskTier,
    pub regions_affected: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

//! Aggregate reporting over recorded verdicts

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use shared_types::{ComplianceVerdict, RiskTier, VerdictSummary};

/// Regions listed in the distribution
pub const TOP_REGIONS: usize = 10;

/// Verdicts listed as recent analyses
pub const RECENT_ANALYSES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCount {
    pub region: String,
    pub count: usize,
}

/// Dashboard figures, recomputed from the audit log on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_features: usize,
    pub flagged_count: usize,
    /// Share of flagged features, in percent with one decimal
    pub flagged_percentage: f64,
    pub risk_distribution: BTreeMap<RiskTier, usize>,
    pub region_distribution: Vec<RegionCount>,
    pub recent_analyses: Vec<VerdictSummary>,
}

impl DashboardSummary {
    /// Aggregate `verdicts`, given in append order
    pub fn from_verdicts(verdicts: &[ComplianceVerdict]) -> Self {
        let total_features = verdicts.len();
        let flagged_count = verdicts.iter().filter(|v| v.requires_geo_compliance).count();
        let flagged_percentage = if total_features == 0 {
            0.0
        } else {
            (flagged_count as f64 / total_features as f64 * 1000.0).round() / 10.0
        };

        let mut risk_distribution: BTreeMap<RiskTier, usize> =
            [RiskTier::Low, RiskTier::Medium, RiskTier::High]
                .into_iter()
                .map(|tier| (tier, 0))
                .collect();
        for verdict in verdicts {
            *risk_distribution.entry(verdict.risk_tier).or_insert(0) += 1;
        }

        let mut region_counts: HashMap<&str, usize> = HashMap::new();
        for region in verdicts.iter().flat_map(|v| v.regions_affected.iter()) {
            *region_counts.entry(region.as_str()).or_insert(0) += 1;
        }
        let mut region_distribution: Vec<RegionCount> = region_counts
            .into_iter()
            .map(|(region, count)| RegionCount {
                region: region.to_string(),
                count,
            })
            .collect();
        region_distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.region.cmp(&b.region)));
        region_distribution.truncate(TOP_REGIONS);

        // Newest first; among equal timestamps the later append wins
        let mut recent: Vec<&ComplianceVerdict> = verdicts.iter().rev().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let recent_analyses = recent
            .into_iter()
            .take(RECENT_ANALYSES)
            .map(ComplianceVerdict::summary)
            .collect();

        Self {
            total_features,
            flagged_count,
            flagged_percentage,
            risk_distribution,
            region_distribution,
            recent_analyses,
        }
    }
}

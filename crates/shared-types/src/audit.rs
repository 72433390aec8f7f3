//! Tamper-evident audit log for compliance verdicts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::types::ComplianceVerdict;

/// A single audit log entry, hash-linked to its predecessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub record_id: String,
    pub recorded_at: DateTime<Utc>,
    pub verdict: ComplianceVerdict,
    pub previous_hash: Option<String>,
    pub record_hash: String,
}

/// Where verification of a record sequence failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain broken at record {sequence}: expected previous hash {expected:?}, got {actual:?}")]
    BrokenLink {
        sequence: u64,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("record {sequence} content does not match its hash")]
    HashMismatch { sequence: u64 },

    #[error("record sequence out of order: expected {expected}, got {actual}")]
    OutOfOrder { expected: u64, actual: u64 },
}

impl AuditRecord {
    /// Seal a verdict into a record that follows `previous`.
    ///
    /// Sequence numbers start at 0 for the first record of a log.
    pub fn seal(verdict: ComplianceVerdict, previous: Option<&AuditRecord>) -> Self {
        let mut record = Self {
            sequence: previous.map(|p| p.sequence + 1).unwrap_or(0),
            record_id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            verdict,
            previous_hash: previous.map(|p| p.record_hash.clone()),
            record_hash: String::new(),
        };
        record.record_hash = record.compute_hash();
        record
    }

    /// Compute the hash of this record's content (for chain linking)
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.record_id.as_bytes());
        hasher.update(self.recorded_at.to_rfc3339().as_bytes());
        hasher.update(serde_json::to_vec(&self.verdict).unwrap_or_default());
        if let Some(ref prev) = self.previous_hash {
            hasher.update(prev.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Serialize as a single JSON line
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Verify the integrity of an ordered run of records.
///
/// Each record must hash to its stored `record_hash`, link to the hash of the
/// record before it, and carry consecutive sequence numbers.
pub fn verify_chain(records: &[AuditRecord]) -> Result<(), ChainError> {
    let mut expected_prev: Option<String> = None;
    let mut expected_seq = records.first().map(|r| r.sequence).unwrap_or(0);

    for record in records {
        if record.sequence != expected_seq {
            return Err(ChainError::OutOfOrder {
                expected: expected_seq,
                actual: record.sequence,
            });
        }
        // A slice may start mid-log, so only the genesis record's link is known up front
        let link_known = expected_prev.is_some() || record.sequence == 0;
        if link_known && record.previous_hash != expected_prev {
            return Err(ChainError::BrokenLink {
                sequence: record.sequence,
                expected: expected_prev,
                actual: record.previous_hash.clone(),
            });
        }
        if record.compute_hash() != record.record_hash {
            return Err(ChainError::HashMismatch {
                sequence: record.sequence,
            });
        }
        expected_prev = Some(record.record_hash.clone());
        expected_seq += 1;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::Utc;

    use crate::types::{ComplianceVerdict, ReasoningSource, RiskTier};

    pub fn verdict(title: &str, score: u8) -> ComplianceVerdict {
        ComplianceVerdict {
            feature_id: format!("feature-{title}"),
            title: title.to_string(),
            requires_geo_compliance: score >= 30,
            risk_score: score,
            risk_tier: RiskTier::from_score(score),
            regions_affected: BTreeSet::from(["Utah, US".to_string()]),
            related_regulations: BTreeSet::from(["ut_social_media_2023".to_string()]),
            reasoning: "Matched curfew clause".to_string(),
            evidence: "Feature text: curfew...".to_string(),
            jargon_resolved: BTreeMap::new(),
            category_scores: BTreeMap::new(),
            reasoning_source: ReasoningSource::RuleBased,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::verdict;
    use super::*;

    fn chain_of(count: usize) -> Vec<AuditRecord> {
        let mut records: Vec<AuditRecord> = Vec::new();
        for i in 0..count {
            let record = AuditRecord::seal(verdict(&format!("f{i}"), 40), records.last());
            records.push(record);
        }
        records
    }

    #[test]
    fn test_chain_integrity() {
        let records = chain_of(3);

        assert!(verify_chain(&records).is_ok());
        assert_eq!(records[0].sequence, 0);
        assert_eq!(records[0].previous_hash, None);
        assert_eq!(records[2].previous_hash.as_ref(), Some(&records[1].record_hash));
    }

    #[test]
    fn test_chain_tamper_detection() {
        let mut records = chain_of(2);

        records[0].verdict.risk_score = 0;

        assert_eq!(
            verify_chain(&records),
            Err(ChainError::HashMismatch { sequence: 0 })
        );
    }

    #[test]
    fn test_removed_record_detected() {
        let mut records = chain_of(3);
        records.remove(1);

        assert!(matches!(
            verify_chain(&records),
            Err(ChainError::OutOfOrder { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_tail_of_chain_verifies() {
        let records = chain_of(4);
        assert!(verify_chain(&records[2..]).is_ok());
    }

    #[test]
    fn test_empty_chain_verifies() {
        assert!(verify_chain(&[]).is_ok());
    }
}

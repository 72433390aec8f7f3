//! Append-only audit sinks for verdicts
//!
//! Every sink seals records into a SHA-256 hash chain. Sequence numbers,
//! timestamps and hash links are assigned while the sink's write lock is
//! held, so the stored order is the append order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared_types::{verify_chain, AuditRecord, ComplianceVerdict};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AuditError;

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Seal and store one verdict, returning the stored record
    async fn append(&self, verdict: &ComplianceVerdict) -> Result<AuditRecord, AuditError>;

    /// All records in append order
    async fn records(&self) -> Result<Vec<AuditRecord>, AuditError>;

    /// Verdicts in append order
    async fn verdicts(&self) -> Result<Vec<ComplianceVerdict>, AuditError> {
        Ok(self.records().await?.into_iter().map(|r| r.verdict).collect())
    }

    /// Check the stored hash chain
    async fn verify(&self) -> Result<(), AuditError> {
        verify_chain(&self.records().await?)?;
        Ok(())
    }
}

/// In-process audit log, lost on exit
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, verdict: &ComplianceVerdict) -> Result<AuditRecord, AuditError> {
        let mut records = self.records.lock().await;
        let record = AuditRecord::seal(verdict.clone(), records.last());
        records.push(record.clone());
        Ok(record)
    }

    async fn records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self.records.lock().await.clone())
    }
}

/// Audit log stored as one JSON record per line
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    last: Mutex<Option<AuditRecord>>,
}

impl JsonlAuditLog {
    /// Open or create the log, continuing the chain of any existing records
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let contents = read_log(&path).await?;
        match contents.tail {
            Tail::Clean => {}
            Tail::Unterminated => {
                let mut file = OpenOptions::new().append(true).open(&path).await?;
                file.write_all(b"\n").await?;
                file.flush().await?;
            }
            Tail::Torn { keep } => {
                warn!(path = %path.display(), keep, "Dropping torn final audit line");
                let file = OpenOptions::new().write(true).open(&path).await?;
                file.set_len(keep).await?;
            }
        }
        info!(path = %path.display(), records = contents.records.len(), "Opened audit log");

        Ok(Self {
            path,
            last: Mutex::new(contents.records.into_iter().last()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, verdict: &ComplianceVerdict) -> Result<AuditRecord, AuditError> {
        let mut last = self.last.lock().await;
        let record = AuditRecord::seal(verdict.clone(), last.as_ref());

        let mut line = record.to_json_line()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let start = file.metadata().await?.len();
        if let Err(e) = write_line(&mut file, &line).await {
            // A partial line would break every later read
            if let Err(rollback) = file.set_len(start).await {
                warn!(error = %rollback, "Could not roll back partial audit write");
            }
            return Err(e.into());
        }

        debug!(sequence = record.sequence, feature_id = %verdict.feature_id, "Audit record appended");
        *last = Some(record.clone());
        Ok(record)
    }

    async fn records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        // Hold the writer lock so a half-written line is never read
        let _guard = self.last.lock().await;
        Ok(read_log(&self.path).await?.records)
    }
}

async fn write_line(file: &mut fs::File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

/// State of the bytes after the last newline
#[derive(Debug, PartialEq, Eq)]
enum Tail {
    Clean,
    /// A complete record missing its newline
    Unterminated,
    /// An interrupted write; only the first `keep` bytes are whole lines
    Torn { keep: u64 },
}

struct LogContents {
    records: Vec<AuditRecord>,
    tail: Tail,
}

/// Parse every line of the log. A malformed line in the middle is an error,
/// but an unterminated last line that does not parse is a torn write and is
/// left out.
async fn read_log(path: &Path) -> Result<LogContents, AuditError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(LogContents {
                records: Vec::new(),
                tail: Tail::Clean,
            })
        }
        Err(e) => return Err(e.into()),
    };

    let split = raw.rfind('\n').map_or(0, |i| i + 1);
    let (complete, rest) = raw.split_at(split);

    let mut records = complete
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| AuditRecord::from_json_line(line).map_err(AuditError::from))
        .collect::<Result<Vec<_>, _>>()?;

    let tail = if rest.trim().is_empty() {
        Tail::Clean
    } else {
        match AuditRecord::from_json_line(rest) {
            Ok(record) => {
                records.push(record);
                Tail::Unterminated
            }
            Err(e) => {
                debug!(error = %e, "Unterminated audit line does not parse");
                Tail::Torn { keep: split as u64 }
            }
        }
    };

    Ok(LogContents { records, tail })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use shared_types::{ReasoningSource, RiskTier};
    use std::collections::{BTreeMap, BTreeSet};

    fn verdict(title: &str) -> ComplianceVerdict {
        ComplianceVerdict {
            feature_id: format!("id-{title}"),
            title: title.to_string(),
            requires_geo_compliance: false,
            risk_score: 10,
            risk_tier: RiskTier::Low,
            regions_affected: BTreeSet::new(),
            related_regulations: BTreeSet::new(),
            reasoning: "No match.".to_string(),
            evidence: "Feature text: x...".to_string(),
            jargon_resolved: BTreeMap::new(),
            category_scores: BTreeMap::new(),
            reasoning_source: ReasoningSource::RuleBased,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_log_chains_records() {
        let log = MemoryAuditLog::new();
        let first = log.append(&verdict("a")).await.unwrap();
        let second = log.append(&verdict("b")).await.unwrap();

        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(second.previous_hash, Some(first.record_hash));
        assert!(log.verify().await.is_ok());
        assert_eq!(log.verdicts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_jsonl_log_persists_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("verdicts.jsonl");

        {
            let log = JsonlAuditLog::open(&path).await.unwrap();
            log.append(&verdict("a")).await.unwrap();
            log.append(&verdict("b")).await.unwrap();
        }

        let reopened = JsonlAuditLog::open(&path).await.unwrap();
        let third = reopened.append(&verdict("c")).await.unwrap();
        assert_eq!(third.sequence, 2);

        let records = reopened.records().await.unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.verdict.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert!(reopened.verify().await.is_ok());
    }

    #[tokio::test]
    async fn test_jsonl_tampering_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.jsonl");
        let log = JsonlAuditLog::open(&path).await.unwrap();
        log.append(&verdict("a")).await.unwrap();
        log.append(&verdict("b")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, raw.replacen("\"risk_score\":10", "\"risk_score\":0", 1)).unwrap();

        assert!(matches!(log.verify().await, Err(AuditError::ChainBroken(_))));
    }

    #[tokio::test]
    async fn test_corrupt_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();

        assert!(matches!(
            JsonlAuditLog::open(&path).await,
            Err(AuditError::Serialize(_))
        ));
    }

    #[tokio::test]
    async fn test_torn_final_line_is_dropped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.jsonl");
        {
            let log = JsonlAuditLog::open(&path).await.unwrap();
            log.append(&verdict("a")).await.unwrap();
        }
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{\"sequence\":1,\"verdict\":{\"feature_id\":");
        std::fs::write(&path, &raw).unwrap();

        let log = JsonlAuditLog::open(&path).await.unwrap();
        let second = log.append(&verdict("b")).await.unwrap();
        assert_eq!(second.sequence, 1);

        let records = log.records().await.unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.verdict.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert!(log.verify().await.is_ok());
        assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[tokio::test]
    async fn test_unterminated_record_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.jsonl");
        {
            let log = JsonlAuditLog::open(&path).await.unwrap();
            log.append(&verdict("a")).await.unwrap();
        }
        let raw = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, raw.trim_end()).unwrap();

        let log = JsonlAuditLog::open(&path).await.unwrap();
        log.append(&verdict("b")).await.unwrap();

        assert_eq!(log.records().await.unwrap().len(), 2);
        assert!(log.verify().await.is_ok());
    }

    #[tokio::test]
    async fn test_torn_line_is_skipped_by_readers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.jsonl");
        let log = JsonlAuditLog::open(&path).await.unwrap();
        log.append(&verdict("a")).await.unwrap();

        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{\"seq");
        std::fs::write(&path, &raw).unwrap();

        assert_eq!(log.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_order() {
        let log = std::sync::Arc::new(MemoryAuditLog::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&verdict(&format!("f{i}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = log.records().await.unwrap();
        let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (0..16).collect::<Vec<u64>>());
        assert!(log.verify().await.is_ok());
    }
}

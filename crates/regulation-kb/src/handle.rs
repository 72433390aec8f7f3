//! Process-wide knowledge base handle with atomic index replacement

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{MatchResult, RegulationClause};
use tracing::{info, warn};

use crate::corpus::{builtin_clauses, load_clauses};
use crate::index::RegulationIndex;

/// Shared handle to the current [`RegulationIndex`].
///
/// Readers take a snapshot `Arc` and query it without holding the lock.
/// `reload` builds a complete replacement index before swapping it in, so a
/// query never sees a partially built index.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    current: Arc<RwLock<Arc<RegulationIndex>>>,
}

impl KnowledgeBase {
    pub fn new(index: RegulationIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Knowledge base over the built-in statutes
    pub fn builtin() -> Self {
        Self::new(RegulationIndex::build(builtin_clauses()))
    }

    /// Load from a JSON corpus file, or the built-in corpus when `path` is `None`.
    ///
    /// A corpus that cannot be loaded leaves the engine running on an empty
    /// index; every query then returns no matches.
    pub fn from_source(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };

        match load_clauses(path) {
            Ok(clauses) => Self::new(RegulationIndex::build(clauses)),
            Err(e) => {
                warn!(error = %e, "Knowledge base unavailable, continuing with an empty index");
                Self::new(RegulationIndex::empty())
            }
        }
    }

    /// The index in effect right now
    pub fn snapshot(&self) -> Arc<RegulationIndex> {
        Arc::clone(&self.current.read())
    }

    /// Query the current snapshot
    pub fn query(&self, text: &str, top_k: usize) -> Vec<MatchResult> {
        self.snapshot().query(text, top_k)
    }

    /// Replace the index with one built from `clauses`
    pub fn reload(&self, clauses: Vec<RegulationClause>) {
        let index = Arc::new(RegulationIndex::build(clauses));
        info!(
            clauses = index.len(),
            vocabulary = index.vocabulary_size(),
            "Regulation index rebuilt"
        );
        *self.current.write() = index;
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// The regulation corpus could not be loaded
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("failed to read corpus at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corpus at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corpus at {0} contains no clauses")]
    EmptyCorpus(PathBuf),
}

pub type Result<T> = std::result::Result<T, KnowledgeBaseError>;

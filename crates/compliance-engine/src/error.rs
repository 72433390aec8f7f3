//! Error types for the compliance engine

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the external reasoning service. Always recovered by the
/// rule-based fallback, never surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning service did not answer within {0} ms")]
    Timeout(u64),

    #[error("reasoning service returned a malformed response: {0}")]
    Malformed(String),

    #[error("reasoning service rejected the credentials")]
    Unauthorized,

    #[error("reasoning service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reasoning service transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The audit log could not record or read verdicts
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("audit database error: {0}")]
    Database(String),

    #[error("audit chain broken: {0}")]
    ChainBroken(#[from] shared_types::ChainError),
}

/// Invalid engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// A custom jargon table could not be loaded
#[derive(Debug, Error)]
pub enum JargonError {
    #[error("failed to read jargon table at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse jargon table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("jargon table does not compile to a pattern: {0}")]
    Pattern(#[from] regex::Error),
}

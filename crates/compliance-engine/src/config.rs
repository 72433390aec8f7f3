//! Engine configuration
//!
//! Read from environment variables or a TOML file. A missing API key, or the
//! placeholder `dummy-key`, selects rule-based reasoning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reasoning::{gemini, DEFAULT_TIMEOUT_MS};

/// API key value treated as "not configured"
pub const PLACEHOLDER_API_KEY: &str = "dummy-key";

/// Matches requested from the knowledge base per analysis
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gemini API key
    pub api_key: Option<String>,
    pub model: String,
    /// Override for the reasoning service host
    pub llm_base_url: Option<String>,
    pub reasoning_timeout_ms: u64,
    /// JSON regulation corpus; the built-in corpus when unset
    pub corpus_path: Option<PathBuf>,
    /// JSON jargon entries merged over the built-in table
    pub jargon_path: Option<PathBuf>,
    /// JSON-lines audit log; in-memory when unset
    pub audit_path: Option<PathBuf>,
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            llm_base_url: None,
            reasoning_timeout_ms: DEFAULT_TIMEOUT_MS,
            corpus_path: None,
            jargon_path: None,
            audit_path: None,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let reasoning_timeout_ms = match non_empty("GEO_COMPLIANCE_REASONING_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "GEO_COMPLIANCE_REASONING_TIMEOUT_MS".to_string(),
                value: raw,
            })?,
            None => defaults.reasoning_timeout_ms,
        };

        Ok(Self {
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEO_COMPLIANCE_MODEL").unwrap_or(defaults.model),
            llm_base_url: non_empty("GEO_COMPLIANCE_LLM_BASE_URL"),
            reasoning_timeout_ms,
            corpus_path: non_empty("GEO_COMPLIANCE_CORPUS_PATH").map(PathBuf::from),
            jargon_path: non_empty("GEO_COMPLIANCE_JARGON_PATH").map(PathBuf::from),
            audit_path: non_empty("GEO_COMPLIANCE_AUDIT_PATH").map(PathBuf::from),
            top_k: defaults.top_k,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "top_k".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Usable API key, ignoring blanks and the placeholder
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    pub fn llm_enabled(&self) -> bool {
        self.effective_api_key().is_some()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_llm_base_url(mut self, url: impl Into<String>) -> Self {
        self.llm_base_url = Some(url.into());
        self
    }

    pub fn with_reasoning_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.reasoning_timeout_ms = timeout_ms;
        self
    }

    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_path = Some(path.into());
        self
    }

    pub fn with_jargon_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.jargon_path = Some(path.into());
        self
    }

    pub fn with_audit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_path = Some(path.into());
        self
    }
}

//! Evaluation policy: the closed set of thresholds and toggles that decide verdicts.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MAX_LATENCY_MS: u64 = 2_000;
const DEFAULT_TOXICITY_THRESHOLD: f64 = 0.5;

/// Rule parameters for one run.
///
/// Deserialization is strict: unknown keys are rejected so that a typo in a
/// policy file can never silently disable a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Responses slower than this are blocked
    pub max_latency_ms: u64,
    /// Score responses against the expected answer when one is provided
    pub require_accuracy: bool,
    /// Run the toxicity classifier
    pub enable_toxicity: bool,
    /// Scores strictly above this value are blocked
    pub toxicity_threshold: f64,
    /// Run the PII detector
    pub enable_pii: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_latency_ms: DEFAULT_MAX_LATENCY_MS,
            require_accuracy: true,
            enable_toxicity: true,
            toxicity_threshold: DEFAULT_TOXICITY_THRESHOLD,
            enable_pii: false,
        }
    }
}

impl Policy {
    /// Loads and validates a policy file. Nothing is returned unless every
    /// field is valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::parse(&contents).map_err(|err| err.at(path))
    }

    /// Parses a policy document held in memory.
    pub fn parse(contents: &str) -> Result<Self, PolicyParseError> {
        let value: serde_json::Value = serde_json::from_str(contents)
            .map_err(|err| PolicyParseError::Syntax(err.to_string()))?;
        if !value.is_object() {
            return Err(PolicyParseError::Schema(
                "policy must be a JSON object".to_string(),
            ));
        }
        let policy: Policy =
            serde_json::from_value(value).map_err(|err| PolicyParseError::Schema(err.to_string()))?;
        policy.validate().map_err(PolicyParseError::Schema)?;
        Ok(policy)
    }

    /// Checks value ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_latency_ms == 0 {
            return Err("max_latency_ms must be a positive integer".to_string());
        }
        if !(0.0..=1.0).contains(&self.toxicity_threshold) {
            return Err(format!(
                "toxicity_threshold must be within [0, 1], got {}",
                self.toxicity_threshold
            ));
        }
        Ok(())
    }
}

/// Parse failure before a file path is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyParseError {
    Syntax(String),
    Schema(String),
}

impl PolicyParseError {
    fn at(self, path: &Path) -> ConfigError {
        let path = path.to_path_buf();
        match self {
            PolicyParseError::Syntax(message) => ConfigError::InvalidJson { path, message },
            PolicyParseError::Schema(message) => ConfigError::SchemaViolation { path, message },
        }
    }
}

impl std::fmt::Display for PolicyParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyParseError::Syntax(msg) => write!(f, "invalid JSON: {msg}"),
            PolicyParseError::Schema(msg) => write!(f, "schema violation: {msg}"),
        }
    }
}

impl std::error::Error for PolicyParseError {}

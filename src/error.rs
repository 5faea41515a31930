use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems with the inputs of a run: the policy file or the prompt set.
///
/// Always fatal, and always raised before any backend call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The referenced file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The file exists but could not be read
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file is not syntactically valid JSON (or YAML for prompt sets)
    #[error("invalid JSON in {}: {message}", path.display())]
    InvalidJson { path: PathBuf, message: String },
    /// The document parsed but does not match the expected schema
    #[error("schema violation in {}: {message}", path.display())]
    SchemaViolation { path: PathBuf, message: String },
    /// The prompt set is unusable (empty, duplicate ids, unsupported format)
    #[error("invalid prompt set: {0}")]
    InvalidPrompts(String),
    /// A policy built in code holds out-of-range values
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    /// The model string does not name a model served by the configured backend
    #[error("invalid model '{model}': {message}")]
    InvalidModel { model: String, message: String },
}

/// Errors from a generation backend. Recorded per prompt, never fatal to a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Connection could not be established
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// The call did not complete within its timeout
    #[error("backend timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// The backend answered with a non-success HTTP status
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body could not be interpreted
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
    /// The model string names a provider with no adapter
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured duration on the error
            BackendError::Timeout { timeout_ms: 0 }
        } else if err.is_connect() {
            BackendError::Unreachable(err.to_string())
        } else if err.is_decode() || err.is_body() {
            BackendError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            BackendError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::MalformedResponse(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

/// Failures writing or reading the persisted run layout.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Refusing to append into a directory that already holds a run
    #[error("run directory {} already contains results", .0.display())]
    RunExists(PathBuf),
    /// A record could not be written; the run output is no longer trustworthy
    #[error("failed to persist record #{index} (prompt '{prompt_id}'): {source}")]
    Record {
        index: usize,
        prompt_id: String,
        #[source]
        source: Box<PersistenceError>,
    },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-level error returned by a run.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors from the dashboard read side.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The run id is not a single path component
    #[error("invalid run id '{0}'")]
    InvalidRunId(String),
    /// No finished run with that id exists
    #[error("run '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

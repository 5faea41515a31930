use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Default ceiling for a single generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// A single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Model name as understood by the backend (no provider prefix)
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// What a backend returns for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    /// Reported by the backend, or estimated from the prompt text
    pub tokens_in: u32,
    /// Reported by the backend, or estimated from the response text
    pub tokens_out: u32,
    /// Wall-clock time around the call, measured locally
    pub latency_ms: f64,
    /// Backend payload, kept as-is
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Capability set every generation backend provides.
///
/// The health checks (`list_models`, `is_available`, `model_exists`) are infallible:
/// network trouble shows up as an empty list or `false`.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short provider name, e.g. `"ollama"`.
    fn name(&self) -> &str;

    /// Performs one generation. Exactly one network call, no retries.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResult, BackendError>;

    /// Installed model names, sorted.
    async fn list_models(&self) -> Vec<String>;

    /// Whether the backend answers at all.
    async fn is_available(&self) -> bool;

    /// Whether `model` is among the installed models.
    async fn model_exists(&self, model: &str) -> bool {
        self.list_models().await.iter().any(|m| m == model)
    }
}

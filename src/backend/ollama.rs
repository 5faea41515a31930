//! Ollama backend for local inference over its HTTP API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

use super::tokens::estimate_tokens;
use super::traits::{GenerationBackend, GenerationRequest, GenerationResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const MODEL_PREFIX: &str = "ollama/";
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a local Ollama service.
#[derive(Debug, Clone)]
pub struct Ollama {
    base_url: String,
    client: Client,
    list_timeout: Duration,
    health_timeout: Duration,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelEntry>,
}

#[derive(Deserialize, Debug)]
struct OllamaModelEntry {
    #[serde(default)]
    name: String,
}

impl Default for Ollama {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Ollama {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a backend around an existing HTTP client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            list_timeout: LIST_TIMEOUT,
            health_timeout: HEALTH_TIMEOUT,
        }
    }

    /// Overrides the model-listing and availability check timeouts.
    pub fn check_timeouts(mut self, list: Duration, health: Duration) -> Self {
        self.list_timeout = list;
        self.health_timeout = health;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_tags(&self) -> Result<OllamaTagsResponse, BackendError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.list_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

fn strip_prefix(model: &str) -> &str {
    model.strip_prefix(MODEL_PREFIX).unwrap_or(model)
}

fn strip_tag(model: &str) -> &str {
    model.split(':').next().unwrap_or(model)
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        err.into()
    }
}

#[async_trait]
impl GenerationBackend for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, BackendError> {
        let body = OllamaGenerateRequest {
            model: strip_prefix(&request.model),
            prompt: &request.prompt,
            stream: false,
            options: request
                .temperature
                .map(|temperature| OllamaOptions { temperature }),
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("Ollama request payload: {json}");
            }
        }

        let start = Instant::now();
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| map_send_error(err, request.timeout))?;

        log::debug!("Ollama HTTP status: {}", resp.status());

        let status = resp.status();
        let payload = resp
            .text()
            .await
            .map_err(|err| map_send_error(err, request.timeout))?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: payload,
            });
        }

        let raw: serde_json::Value = serde_json::from_str(&payload)?;
        let parsed: OllamaGenerateResponse = serde_json::from_value(raw.clone())?;

        Ok(GenerationResult {
            tokens_in: parsed
                .prompt_eval_count
                .unwrap_or_else(|| estimate_tokens(&request.prompt)),
            tokens_out: parsed
                .eval_count
                .unwrap_or_else(|| estimate_tokens(&parsed.response)),
            text: parsed.response,
            latency_ms,
            raw,
        })
    }

    async fn list_models(&self) -> Vec<String> {
        match self.fetch_tags().await {
            Ok(tags) => {
                let mut models: Vec<String> = tags
                    .models
                    .iter()
                    .map(|entry| strip_tag(&entry.name).to_string())
                    .filter(|name| !name.is_empty())
                    .collect();
                models.sort();
                models.dedup();
                models
            }
            Err(err) => {
                log::debug!("Ollama model listing failed: {err}");
                Vec::new()
            }
        }
    }

    async fn is_available(&self) -> bool {
        let reply = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await;
        match reply {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(err) => {
                log::debug!("Ollama availability check failed: {err}");
                false
            }
        }
    }

    async fn model_exists(&self, model: &str) -> bool {
        let wanted = strip_tag(strip_prefix(model));
        self.list_models().await.iter().any(|m| m == wanted)
    }
}

use std::time::Duration;

use crate::backend::DEFAULT_GENERATION_TIMEOUT;

/// Per-run settings that are not part of the policy.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Sampling temperature passed to the backend; backend default when `None`
    pub temperature: Option<f32>,
    /// Ceiling for each individual generation call
    pub timeout: Duration,
    /// Free-form fields copied into `meta.json`
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            timeout: DEFAULT_GENERATION_TIMEOUT,
            extra: serde_json::Map::new(),
        }
    }
}

impl RunOptions {
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a free-form metadata field.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

use std::fmt;
use std::sync::Arc;

use crate::error::BackendError;

use super::traits::GenerationBackend;

/// Provider assumed when a model string carries no `provider/` prefix.
pub const DEFAULT_PROVIDER: &str = "ollama";

/// A `provider/model` reference such as `ollama/llama3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub provider: String,
    pub model: String,
}

impl ModelRef {
    /// Splits on the first `/`; a bare name defaults to [`DEFAULT_PROVIDER`].
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('/') {
            Some((provider, model)) => Self {
                provider: provider.to_string(),
                model: model.to_string(),
            },
            None => Self {
                provider: DEFAULT_PROVIDER.to_string(),
                model: raw.to_string(),
            },
        }
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Builds the backend serving `provider`.
///
/// `base_url` overrides the provider's default endpoint.
pub fn backend_for(
    provider: &str,
    #[cfg_attr(not(feature = "ollama"), allow(unused_variables))] base_url: Option<&str>,
) -> Result<Arc<dyn GenerationBackend>, BackendError> {
    match provider {
        #[cfg(feature = "ollama")]
        "ollama" => {
            let backend = match base_url {
                Some(url) => super::ollama::Ollama::new(url),
                None => super::ollama::Ollama::default(),
            };
            Ok(Arc::new(backend))
        }
        other => Err(BackendError::UnsupportedProvider(other.to_string())),
    }
}

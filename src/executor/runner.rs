use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::backend::{GenerationBackend, GenerationRequest, ModelRef};
use crate::error::{ConfigError, EvalError, PersistenceError};
use crate::policy::Policy;
use crate::prompt::Prompt;
use crate::record::EvaluationRecord;
use crate::store::{RunMetadata, RunStatus, RunWriter};
use crate::verdict::Evaluator;

use super::options::RunOptions;

/// Runs prompt sets one prompt at a time.
///
/// Only one backend call is ever in flight: local backends serve a single
/// request at a time, and overlapping calls would skew latency.
pub struct RunExecutor {
    backend: Arc<dyn GenerationBackend>,
    evaluator: Evaluator,
    cancel: CancellationToken,
}

impl RunExecutor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            evaluator: Evaluator::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Uses `token` to stop the run early.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Evaluates `prompts` in order and writes the run into `output_dir`.
    ///
    /// A failing backend call yields a degraded record and the run goes on.
    /// Input problems are reported before any backend call, and a record
    /// that cannot be written aborts the run. On cancellation the records
    /// written so far are kept and the metadata is marked cancelled.
    pub async fn run(
        &self,
        model: &str,
        prompts: &[Prompt],
        policy: &Policy,
        output_dir: &Path,
        options: &RunOptions,
    ) -> Result<RunMetadata, EvalError> {
        if prompts.is_empty() {
            return Err(ConfigError::InvalidPrompts("prompt set is empty".into()).into());
        }
        policy.validate().map_err(ConfigError::InvalidPolicy)?;
        let model_ref = ModelRef::parse(model);
        if model_ref.provider != self.backend.name() {
            return Err(ConfigError::InvalidModel {
                model: model.to_string(),
                message: format!("backend '{}' cannot serve it", self.backend.name()),
            }
            .into());
        }

        let mut writer = RunWriter::create(output_dir)?;
        let start_time = Utc::now();
        let total = prompts.len();
        log::info!(
            "starting run of {total} prompts against {model_ref} into {}",
            output_dir.display()
        );

        let mut first_call: Option<Instant> = None;
        let mut last_done: Option<Instant> = None;
        let mut status = RunStatus::Completed;

        for (index, prompt) in prompts.iter().enumerate() {
            if self.cancel.is_cancelled() {
                status = RunStatus::Cancelled;
                break;
            }

            let request = GenerationRequest::new(model_ref.model.clone(), prompt.prompt.clone())
                .temperature(options.temperature)
                .timeout(options.timeout);
            first_call.get_or_insert_with(Instant::now);

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = self.backend.generate(&request) => Some(result),
            };
            let Some(outcome) = outcome else {
                log::warn!("run cancelled during prompt '{}'", prompt.id);
                status = RunStatus::Cancelled;
                break;
            };

            let record = match outcome {
                Ok(generation) => {
                    let verdict =
                        self.evaluator
                            .evaluate(&generation, prompt.expected_answer(), policy);
                    EvaluationRecord::evaluated(prompt, &generation, &verdict)
                }
                Err(err) => {
                    log::warn!("prompt '{}' failed: {err}", prompt.id);
                    EvaluationRecord::degraded(prompt, &err)
                }
            };
            last_done = Some(Instant::now());

            writer
                .append(&record)
                .map_err(|source| PersistenceError::Record {
                    index,
                    prompt_id: prompt.id.clone(),
                    source: Box::new(source),
                })?;

            log::info!(
                "[{}/{total}] {} blocked={} latency_ms={}",
                index + 1,
                prompt.id,
                record.blocked,
                record
                    .latency_ms
                    .map(|ms| format!("{ms:.0}"))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }

        let duration_seconds = match (first_call, last_done) {
            (Some(first), Some(last)) => last.duration_since(first).as_secs_f64(),
            _ => 0.0,
        };

        let metadata = RunMetadata {
            model: model_ref.to_string(),
            provider: Some(model_ref.provider.clone()),
            start_time: Some(start_time),
            end_time: Some(Utc::now()),
            duration_seconds: Some(duration_seconds),
            total_prompts: total,
            completed_prompts: Some(writer.written()),
            status,
            temperature: options.temperature,
            policy: Some(policy.clone()),
            extra: options.extra.clone(),
        };
        writer.write_metadata(&metadata)?;

        log::info!(
            "run finished ({:?}): {}/{total} records in {duration_seconds:.1}s",
            metadata.status,
            writer.written()
        );
        Ok(metadata)
    }
}

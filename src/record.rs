//! Persisted per-prompt evaluation records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::GenerationResult;
use crate::error::BackendError;
use crate::prompt::Prompt;
use crate::store::lenient;
use crate::verdict::Verdict;

/// Why a record was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    Latency,
    Toxicity,
    Pii,
    BackendError,
    /// Written by a newer version; kept so the line still parses
    #[serde(other)]
    Other,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Violation::Latency => "latency",
            Violation::Toxicity => "toxicity",
            Violation::Pii => "pii",
            Violation::BackendError => "backend_error",
            Violation::Other => "other",
        };
        f.write_str(label)
    }
}

/// One line of `results.jsonl`.
///
/// `None` means "not evaluated" and is written as `null`, which keeps it
/// distinct from a check that ran and passed. Every field has a default so
/// partial or older lines still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRecord {
    #[serde(alias = "id", deserialize_with = "lenient::id")]
    pub prompt_id: String,
    pub prompt: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    pub accuracy: Option<bool>,
    pub latency_ms: Option<f64>,
    pub blocked: bool,
    pub toxicity: Option<f64>,
    pub pii_detected: Option<bool>,
    pub tokens_in: Option<u32>,
    pub tokens_out: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationRecord {
    /// Record for a prompt whose generation succeeded.
    pub fn evaluated(prompt: &Prompt, result: &GenerationResult, verdict: &Verdict) -> Self {
        Self {
            prompt_id: prompt.id.clone(),
            prompt: prompt.prompt.clone(),
            response: result.text.clone(),
            expected: prompt.expected.clone(),
            accuracy: verdict.accuracy.as_bool(),
            latency_ms: Some(verdict.latency_ms),
            blocked: verdict.blocked,
            toxicity: verdict.toxicity_score,
            pii_detected: verdict.pii.as_failed(),
            tokens_in: Some(result.tokens_in),
            tokens_out: Some(result.tokens_out),
            violations: verdict.violations(),
            error: None,
        }
    }

    /// Record for a prompt whose backend call failed.
    ///
    /// The prompt still counts toward the run, and is blocked because nothing
    /// about the response could be verified.
    pub fn degraded(prompt: &Prompt, err: &BackendError) -> Self {
        Self {
            prompt_id: prompt.id.clone(),
            prompt: prompt.prompt.clone(),
            expected: prompt.expected.clone(),
            blocked: true,
            violations: vec![Violation::BackendError],
            error: Some(err.to_string()),
            ..Self::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unevaluated_fields_serialize_as_null() {
        let record = EvaluationRecord {
            prompt_id: "1".into(),
            response: "hi".into(),
            latency_ms: Some(12.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["accuracy"].is_null());
        assert!(json["toxicity"].is_null());
        assert_eq!(json["blocked"], false);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn partial_lines_load_with_defaults() {
        let record: EvaluationRecord =
            serde_json::from_str(r#"{"id": "q1", "latency_ms": 300}"#).unwrap();
        assert_eq!(record.prompt_id, "q1");
        assert_eq!(record.latency_ms, Some(300.0));
        assert!(!record.blocked);
        assert_eq!(record.accuracy, None);
    }

    #[test]
    fn unknown_violation_names_still_parse() {
        let record: EvaluationRecord =
            serde_json::from_str(r#"{"blocked": true, "violations": ["latency", "jailbreak"]}"#)
                .unwrap();
        assert_eq!(record.violations, vec![Violation::Latency, Violation::Other]);
    }

    #[test]
    fn degraded_record_is_blocked_without_latency() {
        let prompt = Prompt::new("p1", "hello").expected("world");
        let record = EvaluationRecord::degraded(
            &prompt,
            &BackendError::Unreachable("connection refused".into()),
        );
        assert!(record.blocked);
        assert!(record.is_degraded());
        assert_eq!(record.latency_ms, None);
        assert_eq!(record.accuracy, None);
        assert_eq!(record.expected.as_deref(), Some("world"));
        assert_eq!(record.violations, vec![Violation::BackendError]);
    }

    #[test]
    fn integer_ids_are_read_as_text() {
        let records: Vec<EvaluationRecord> = [
            r#"{"id": 1, "blocked": true, "latency_ms": 2500.0}"#,
            r#"{"id": 2, "blocked": false, "latency_ms": 40.0}"#,
        ]
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
        let ids: Vec<_> = records.iter().map(|r| r.prompt_id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);

        let summary = crate::aggregate::summarize(&records);
        assert_eq!(summary.total_prompts, 2);
        assert_eq!(summary.blocked_count, 1);
    }
}

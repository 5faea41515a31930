use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Policy;

use super::lenient;

/// How a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Completed,
    /// Interrupted; `results.jsonl` holds fewer records than `total_prompts`
    Cancelled,
}

/// Contents of `meta.json`.
///
/// Unknown keys are preserved in `extra` so metadata written by other tools
/// survives a read-modify cycle through the dashboard. Known keys holding an
/// unexpected type read as their default, so a single odd field never hides
/// a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetadata {
    #[serde(deserialize_with = "lenient::string")]
    pub model: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub provider: Option<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::timestamp"
    )]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub duration_seconds: Option<f64>,
    /// Number of prompts in the input set
    #[serde(deserialize_with = "lenient::count")]
    pub total_prompts: usize,
    /// Number of records actually written
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_count"
    )]
    pub completed_prompts: Option<usize>,
    #[serde(deserialize_with = "lenient::status")]
    pub status: RunStatus,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_f32"
    )]
    pub temperature: Option<f32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::policy"
    )]
    pub policy: Option<Policy>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RunMetadata {
    /// Whether fewer records were written than prompts were given.
    pub fn is_partial(&self) -> bool {
        self.status == RunStatus::Cancelled
            || self
                .completed_prompts
                .is_some_and(|done| done < self.total_prompts)
    }
}

use serde::{Deserialize, Serialize};

use crate::record::EvaluationRecord;

use super::mean;

/// Statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSummary {
    pub total_prompts: usize,
    /// Share of evaluated records that matched; `None` if none were evaluated
    pub accuracy_rate: Option<f64>,
    pub avg_latency_ms: Option<f64>,
    pub blocked_count: usize,
    pub avg_toxicity: Option<f64>,
    /// Records written for failed backend calls (also counted as blocked)
    pub error_count: usize,
}

/// Summarizes the records of one run. Nulls are left out of every mean.
pub fn summarize(records: &[EvaluationRecord]) -> RunSummary {
    RunSummary {
        total_prompts: records.len(),
        accuracy_rate: mean(
            records
                .iter()
                .filter_map(|r| r.accuracy)
                .map(|matched| if matched { 1.0 } else { 0.0 }),
        ),
        avg_latency_ms: mean(records.iter().filter_map(|r| r.latency_ms)),
        blocked_count: records.iter().filter(|r| r.blocked).count(),
        avg_toxicity: mean(records.iter().filter_map(|r| r.toxicity)),
        error_count: records.iter().filter(|r| r.is_degraded()).count(),
    }
}

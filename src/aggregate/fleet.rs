use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::RunMetadata;

use super::mean;
use super::summary::RunSummary;

/// Number of most recent runs inspected for `recent_violations`.
pub const RECENT_VIOLATION_WINDOW: usize = 5;

/// A run as listed by the dashboard: its metadata plus a fresh summary.
///
/// `summary` is `None` when the run's records could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOverview {
    pub run_id: String,
    #[serde(flatten)]
    pub metadata: RunMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl RunOverview {
    /// Keys of `metadata.extra` that would clash with the overview's own fields
    /// once flattened are dropped.
    pub fn new(
        run_id: impl Into<String>,
        mut metadata: RunMetadata,
        summary: Option<RunSummary>,
    ) -> Self {
        for key in RESERVED_KEYS {
            if metadata.extra.remove(key).is_some() {
                log::debug!("dropping '{key}' from run metadata extras");
            }
        }
        Self {
            run_id: run_id.into(),
            metadata,
            summary,
        }
    }
}

const RESERVED_KEYS: [&str; 2] = ["run_id", "summary"];

/// A recent run that blocked at least one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunViolation {
    pub run_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub blocked_count: usize,
    pub total_prompts: usize,
}

/// Statistics across recent runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total_runs: usize,
    /// Sum of the input prompt counts of every run
    pub total_evaluations: usize,
    /// Mean of per-run accuracy rates; runs without one are left out
    pub avg_accuracy: Option<f64>,
    /// Mean of per-run average latencies; runs without one are left out
    pub avg_latency: Option<f64>,
    /// Blocked records over total evaluations, 0 when there are none
    pub violation_rate: f64,
    pub recent_violations: Vec<RunViolation>,
}

/// Aggregates the first `window` runs of `runs`, which must be newest first.
pub fn aggregate(runs: &[RunOverview], window: usize) -> FleetStats {
    let runs = &runs[..runs.len().min(window)];

    let total_evaluations: usize = runs.iter().map(|r| r.metadata.total_prompts).sum();
    let blocked: usize = runs.iter().map(blocked_count).sum();
    let violation_rate = if total_evaluations == 0 {
        0.0
    } else {
        blocked as f64 / total_evaluations as f64
    };

    let recent_violations = runs
        .iter()
        .take(RECENT_VIOLATION_WINDOW)
        .filter(|r| blocked_count(r) > 0)
        .map(|r| RunViolation {
            run_id: r.run_id.clone(),
            timestamp: r.metadata.start_time,
            blocked_count: blocked_count(r),
            total_prompts: r.metadata.total_prompts,
        })
        .collect();

    FleetStats {
        total_runs: runs.len(),
        total_evaluations,
        avg_accuracy: mean(runs.iter().filter_map(|r| r.summary.as_ref()?.accuracy_rate)),
        avg_latency: mean(runs.iter().filter_map(|r| r.summary.as_ref()?.avg_latency_ms)),
        violation_rate,
        recent_violations,
    }
}

fn blocked_count(run: &RunOverview) -> usize {
    run.summary.as_ref().map_or(0, |s| s.blocked_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run(id: &str, total: usize, summary: Option<RunSummary>) -> RunOverview {
        RunOverview::new(
            id,
            RunMetadata {
                model: "ollama/llama3".into(),
                total_prompts: total,
                start_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            },
            summary,
        )
    }

    fn summary(accuracy: Option<f64>, latency: Option<f64>, blocked: usize) -> RunSummary {
        RunSummary {
            total_prompts: 4,
            accuracy_rate: accuracy,
            avg_latency_ms: latency,
            blocked_count: blocked,
            ..Default::default()
        }
    }

    #[test]
    fn no_runs_yields_zero_violation_rate() {
        let stats = aggregate(&[], 50);
        assert_eq!(stats.total_runs, 0);
        assert_eq!(stats.total_evaluations, 0);
        assert_eq!(stats.violation_rate, 0.0);
        assert_eq!(stats.avg_accuracy, None);
        assert!(stats.recent_violations.is_empty());
    }

    #[test]
    fn runs_without_prompts_do_not_divide_by_zero() {
        let stats = aggregate(&[run("a", 0, Some(summary(None, None, 0)))], 50);
        assert_eq!(stats.violation_rate, 0.0);
        assert_eq!(stats.total_runs, 1);
    }

    #[test]
    fn missing_fields_are_excluded_from_means() {
        let runs = [
            run("c", 4, Some(summary(Some(1.0), Some(100.0), 1))),
            run("b", 4, Some(summary(None, Some(300.0), 0))),
            run("a", 4, None),
        ];
        let stats = aggregate(&runs, 50);
        assert_eq!(stats.total_evaluations, 12);
        assert_eq!(stats.avg_accuracy, Some(1.0));
        assert_eq!(stats.avg_latency, Some(200.0));
        assert!((stats.violation_rate - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn window_limits_runs_considered() {
        let runs = [
            run("c", 2, Some(summary(None, None, 2))),
            run("b", 2, Some(summary(None, None, 0))),
            run("a", 2, Some(summary(None, None, 2))),
        ];
        let stats = aggregate(&runs, 2);
        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.total_evaluations, 4);
        assert_eq!(stats.violation_rate, 0.5);
    }

    #[test]
    fn recent_violations_only_cover_latest_runs() {
        let runs: Vec<_> = (0..7)
            .map(|i| run(&format!("run-{i}"), 3, Some(summary(None, None, 1))))
            .collect();
        let stats = aggregate(&runs, 50);
        assert_eq!(stats.recent_violations.len(), RECENT_VIOLATION_WINDOW);
        assert_eq!(stats.recent_violations[0].run_id, "run-0");
        assert_eq!(stats.recent_violations[0].blocked_count, 1);
        assert_eq!(stats.recent_violations[0].total_prompts, 3);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let runs = [
            run("b", 4, Some(summary(Some(0.5), Some(120.0), 1))),
            run("a", 4, Some(summary(Some(0.25), None, 3))),
        ];
        assert_eq!(aggregate(&runs, 10), aggregate(&runs, 10));
    }

    #[test]
    fn overview_serializes_metadata_inline() {
        let json = serde_json::to_value(run("r1", 2, Some(summary(None, None, 0)))).unwrap();
        assert_eq!(json["run_id"], "r1");
        assert_eq!(json["model"], "ollama/llama3");
        assert_eq!(json["summary"]["blocked_count"], 0);
        assert!(json["summary"]["accuracy_rate"].is_null());
    }

    #[test]
    fn metadata_extras_cannot_shadow_overview_fields() {
        let metadata: RunMetadata = serde_json::from_str(
            r#"{"model": "m", "run_id": "spoofed", "summary": "stale", "tag": "nightly"}"#,
        )
        .unwrap();
        let overview = RunOverview::new("r1", metadata, None);
        let text = serde_json::to_string(&overview).unwrap();
        assert_eq!(text.matches("\"run_id\"").count(), 1);
        assert!(!text.contains("\"summary\""));

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["run_id"], "r1");
        assert_eq!(json["tag"], "nightly");
    }
}

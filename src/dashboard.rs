//! Read side of the run store, as served by the dashboard.
//!
//! Nothing is cached: every call lists the runs root and recomputes
//! summaries from `results.jsonl`, so a run appears as soon as its
//! `meta.json` is written.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, summarize, FleetStats, RunOverview, RunSummary};
use crate::error::DashboardError;
use crate::record::EvaluationRecord;
use crate::store::{discover_runs, is_valid_run_id, read_metadata, read_records, RunMetadata};

/// Runs listed when no limit is given.
pub const DEFAULT_RUN_LIMIT: usize = 10;
/// Runs considered by fleet statistics.
pub const DEFAULT_FLEET_WINDOW: usize = 50;

/// Everything known about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetail {
    pub run_id: String,
    pub metadata: RunMetadata,
    pub results: Vec<EvaluationRecord>,
    pub summary: RunSummary,
}

/// Runs stored under one root directory.
#[derive(Debug, Clone)]
pub struct RunRepository {
    root: PathBuf,
}

impl RunRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `limit` most recent finished runs, newest first.
    ///
    /// A run whose records cannot be read is still listed, without summary.
    pub fn recent_runs(&self, limit: usize) -> Vec<RunOverview> {
        discover_runs(&self.root, limit)
            .into_iter()
            .map(|run| {
                let summary = match read_records(&run.dir) {
                    Ok(records) => Some(summarize(&records)),
                    Err(err) => {
                        log::warn!("cannot summarize run {}: {err}", run.run_id);
                        None
                    }
                };
                RunOverview::new(run.run_id, run.metadata, summary)
            })
            .collect()
    }

    pub fn run_detail(&self, run_id: &str) -> Result<RunDetail, DashboardError> {
        if !is_valid_run_id(run_id) {
            return Err(DashboardError::InvalidRunId(run_id.to_string()));
        }
        let dir = self.root.join(run_id);
        let metadata =
            read_metadata(&dir)?.ok_or_else(|| DashboardError::NotFound(run_id.to_string()))?;
        let results = read_records(&dir)?;
        let summary = summarize(&results);
        Ok(RunDetail {
            run_id: run_id.to_string(),
            metadata,
            results,
            summary,
        })
    }

    /// Statistics over the `window` most recent runs.
    pub fn fleet_stats(&self, window: usize) -> FleetStats {
        aggregate(&self.recent_runs(window), window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use crate::store::{META_FILE, RESULTS_FILE};

    fn write_run(root: &Path, id: &str, total: usize, lines: &[&str]) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(META_FILE),
            format!(r#"{{"model":"ollama/llama3","total_prompts":{total},"start_time":"2024-01-01T00:00:00Z"}}"#),
        )
        .unwrap();
        let mut body = lines.join("\n");
        body.push('\n');
        fs::write(dir.join(RESULTS_FILE), body).unwrap();
    }

    #[test]
    fn lists_newest_runs_with_summaries() {
        let root = tempdir().unwrap();
        write_run(
            root.path(),
            "20240101-000000",
            2,
            &[
                r#"{"prompt_id":"a","accuracy":true,"latency_ms":100.0,"blocked":false}"#,
                r#"{"prompt_id":"b","accuracy":false,"latency_ms":300.0,"blocked":true}"#,
            ],
        );
        write_run(
            root.path(),
            "20240102-000000",
            1,
            &[r#"{"prompt_id":"a","latency_ms":50.0,"blocked":false}"#],
        );

        let repo = RunRepository::new(root.path());
        let runs = repo.recent_runs(DEFAULT_RUN_LIMIT);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, "20240102-000000");

        let older = runs[1].summary.as_ref().unwrap();
        assert_eq!(older.accuracy_rate, Some(0.5));
        assert_eq!(older.avg_latency_ms, Some(200.0));
        assert_eq!(older.blocked_count, 1);

        assert_eq!(repo.recent_runs(1).len(), 1);
    }

    #[test]
    fn detail_of_known_run() {
        let root = tempdir().unwrap();
        write_run(
            root.path(),
            "20240101-000000",
            1,
            &[r#"{"prompt_id":"a","latency_ms":10.0,"blocked":false}"#],
        );
        let detail = RunRepository::new(root.path())
            .run_detail("20240101-000000")
            .unwrap();
        assert_eq!(detail.metadata.total_prompts, 1);
        assert_eq!(detail.results.len(), 1);
        assert_eq!(detail.summary.avg_latency_ms, Some(10.0));
    }

    #[test]
    fn unknown_and_unfinished_runs_are_not_found() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("20240101-000000")).unwrap();
        let repo = RunRepository::new(root.path());
        assert!(matches!(
            repo.run_detail("20240101-000000"),
            Err(DashboardError::NotFound(_))
        ));
        assert!(matches!(
            repo.run_detail("missing"),
            Err(DashboardError::NotFound(_))
        ));
    }

    #[test]
    fn traversal_ids_are_rejected() {
        let root = tempdir().unwrap();
        let repo = RunRepository::new(root.path().join("runs"));
        write_run(root.path(), "secret", 1, &[r#"{"prompt_id":"a"}"#]);
        for id in ["../secret", "..", "a/b", "", "."] {
            assert!(
                matches!(repo.run_detail(id), Err(DashboardError::InvalidRunId(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn fleet_stats_over_repository() {
        let root = tempdir().unwrap();
        write_run(
            root.path(),
            "20240101-000000",
            2,
            &[
                r#"{"prompt_id":"a","accuracy":true,"latency_ms":100.0,"blocked":false}"#,
                r#"{"prompt_id":"b","accuracy":true,"latency_ms":100.0,"blocked":true}"#,
            ],
        );
        write_run(
            root.path(),
            "20240102-000000",
            2,
            &[
                r#"{"prompt_id":"a","accuracy":false,"latency_ms":300.0,"blocked":false}"#,
                r#"{"prompt_id":"b","accuracy":false,"latency_ms":300.0,"blocked":false}"#,
            ],
        );

        let stats = RunRepository::new(root.path()).fleet_stats(DEFAULT_FLEET_WINDOW);
        assert_eq!(stats.total_runs, 2);
        assert_eq!(stats.total_evaluations, 4);
        assert_eq!(stats.avg_accuracy, Some(0.5));
        assert_eq!(stats.avg_latency, Some(200.0));
        assert_eq!(stats.violation_rate, 0.25);
        assert_eq!(stats.recent_violations.len(), 1);
        assert_eq!(stats.recent_violations[0].run_id, "20240101-000000");
    }

    #[test]
    fn empty_root_has_empty_stats() {
        let root = tempdir().unwrap();
        let stats = RunRepository::new(root.path().join("none")).fleet_stats(DEFAULT_FLEET_WINDOW);
        assert_eq!(stats, FleetStats::default());
    }
}

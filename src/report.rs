//! Markdown report written next to a run's records.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::{summarize, RunSummary};
use crate::error::PersistenceError;
use crate::record::EvaluationRecord;
use crate::store::{read_metadata, read_records, RunMetadata, REPORT_FILE};

const PREVIEW_CHARS: usize = 60;

/// Renders the report for a run and writes it to `<dir>/report.md`.
pub fn write_report(
    dir: &Path,
    metadata: &RunMetadata,
    records: &[EvaluationRecord],
) -> Result<PathBuf, PersistenceError> {
    let path = dir.join(REPORT_FILE);
    fs::write(&path, render(metadata, records)).map_err(|e| PersistenceError::io(&path, e))?;
    log::debug!("report written to {}", path.display());
    Ok(path)
}

/// Regenerates the report of an existing run from its files.
pub fn load_and_write_report(dir: &Path) -> Result<PathBuf, PersistenceError> {
    let metadata = read_metadata(dir)?.unwrap_or_else(|| {
        log::warn!("{} has no metadata, reporting records only", dir.display());
        RunMetadata::default()
    });
    let records = read_records(dir)?;
    write_report(dir, &metadata, &records)
}

pub fn render(metadata: &RunMetadata, records: &[EvaluationRecord]) -> String {
    let summary = summarize(records);
    let mut out = String::new();

    let _ = writeln!(out, "# Evaluation Report\n");
    render_metadata(&mut out, metadata);
    render_summary(&mut out, &summary);
    render_blocked(&mut out, records);
    render_results(&mut out, records);
    out
}

fn render_metadata(out: &mut String, meta: &RunMetadata) {
    let _ = writeln!(out, "## Run\n");
    let _ = writeln!(out, "- **Model**: {}", or_dash(&meta.model));
    if let Some(start) = meta.start_time {
        let _ = writeln!(out, "- **Started**: {}", start.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(duration) = meta.duration_seconds {
        let _ = writeln!(out, "- **Duration**: {duration:.1}s");
    }
    if let Some(temp) = meta.temperature {
        let _ = writeln!(out, "- **Temperature**: {temp}");
    }
    let _ = write!(out, "- **Prompts**: {}", meta.total_prompts);
    if meta.is_partial() {
        let done = meta.completed_prompts.unwrap_or_default();
        let _ = write!(out, " ({done} completed, run {:?})", meta.status);
    }
    let _ = writeln!(out);
    if let Some(policy) = &meta.policy {
        let _ = writeln!(
            out,
            "- **Policy**: max_latency_ms={}, require_accuracy={}, toxicity={}, pii={}",
            policy.max_latency_ms,
            policy.require_accuracy,
            if policy.enable_toxicity {
                format!("on (threshold {})", policy.toxicity_threshold)
            } else {
                "off".to_string()
            },
            if policy.enable_pii { "on" } else { "off" },
        );
    }
    let _ = writeln!(out);
}

fn render_summary(out: &mut String, summary: &RunSummary) {
    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Records | {} |", summary.total_prompts);
    let _ = writeln!(
        out,
        "| Accuracy | {} |",
        summary
            .accuracy_rate
            .map_or_else(|| "-".to_string(), |r| format!("{:.1}%", r * 100.0))
    );
    let _ = writeln!(
        out,
        "| Avg latency | {} |",
        summary
            .avg_latency_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms:.0} ms"))
    );
    let _ = writeln!(out, "| Blocked | {} |", summary.blocked_count);
    let _ = writeln!(
        out,
        "| Avg toxicity | {} |",
        summary
            .avg_toxicity
            .map_or_else(|| "-".to_string(), |t| format!("{t:.3}"))
    );
    let _ = writeln!(out, "| Backend errors | {} |\n", summary.error_count);
}

fn render_blocked(out: &mut String, records: &[EvaluationRecord]) {
    let blocked: Vec<_> = records.iter().filter(|r| r.blocked).collect();
    if blocked.is_empty() {
        return;
    }
    let _ = writeln!(out, "## Blocked\n");
    for record in blocked {
        let reasons = record
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "- `{}`: {}", record.prompt_id, or_dash(&reasons));
        if let Some(err) = &record.error {
            let _ = write!(out, " ({})", escape_cell(err));
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out);
}

fn render_results(out: &mut String, records: &[EvaluationRecord]) {
    let _ = writeln!(out, "## Results\n");
    let _ = writeln!(out, "| ID | Prompt | Accurate | Latency (ms) | Toxicity | PII | Blocked |");
    let _ = writeln!(out, "|---|---|---|---|---|---|---|");
    for r in records {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&r.prompt_id),
            escape_cell(&preview(&r.prompt)),
            tri(r.accuracy),
            r.latency_ms.map_or_else(|| "-".to_string(), |ms| format!("{ms:.0}")),
            r.toxicity.map_or_else(|| "-".to_string(), |t| format!("{t:.3}")),
            tri(r.pii_detected),
            if r.blocked { "yes" } else { "no" },
        );
    }
}

fn tri(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(|c: char| c == '\n' || c == '\r', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Violation;
    use crate::store::{RunStatus, META_FILE, RESULTS_FILE};
    use tempfile::tempdir;

    fn records() -> Vec<EvaluationRecord> {
        vec![
            EvaluationRecord {
                prompt_id: "ok".into(),
                prompt: "What is 2+2?".into(),
                accuracy: Some(true),
                latency_ms: Some(120.0),
                toxicity: Some(0.01),
                pii_detected: Some(false),
                ..Default::default()
            },
            EvaluationRecord {
                prompt_id: "slow".into(),
                prompt: "a | b\nc".into(),
                latency_ms: Some(5000.0),
                blocked: true,
                violations: vec![Violation::Latency],
                ..Default::default()
            },
            EvaluationRecord {
                prompt_id: "down".into(),
                prompt: "x".repeat(100),
                blocked: true,
                violations: vec![Violation::BackendError],
                error: Some("backend unreachable: refused".into()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn report_lists_summary_and_blocked_prompts() {
        let meta = RunMetadata {
            model: "ollama/llama3".into(),
            total_prompts: 3,
            ..Default::default()
        };
        let md = render(&meta, &records());
        assert!(md.starts_with("# Evaluation Report"));
        assert!(md.contains("- **Model**: ollama/llama3"));
        assert!(md.contains("| Accuracy | 100.0% |"));
        assert!(md.contains("| Blocked | 2 |"));
        assert!(md.contains("| Backend errors | 1 |"));
        assert!(md.contains("- `slow`: latency"));
        assert!(md.contains("- `down`: backend_error (backend unreachable: refused)"));
        assert!(md.contains("| slow | a \\| b c |"));
        assert!(md.contains(&format!("{}...", "x".repeat(PREVIEW_CHARS))));
    }

    #[test]
    fn clean_run_has_no_blocked_section() {
        let md = render(&RunMetadata::default(), &records()[..1]);
        assert!(!md.contains("## Blocked"));
        assert!(md.contains("| ok | What is 2+2? | yes | 120 | 0.010 | no | no |"));
    }

    #[test]
    fn cancelled_runs_are_flagged() {
        let meta = RunMetadata {
            total_prompts: 5,
            completed_prompts: Some(2),
            status: RunStatus::Cancelled,
            ..Default::default()
        };
        let md = render(&meta, &[]);
        assert!(md.contains("- **Prompts**: 5 (2 completed, run Cancelled)"));
    }

    #[test]
    fn regenerates_report_from_disk() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(META_FILE),
            r#"{"model":"ollama/mistral","total_prompts":1}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(RESULTS_FILE),
            "{\"prompt_id\":\"a\",\"latency_ms\":10.0,\"blocked\":false}\n",
        )
        .unwrap();

        let path = load_and_write_report(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(REPORT_FILE));
        let md = fs::read_to_string(path).unwrap();
        assert!(md.contains("ollama/mistral"));
        assert!(md.contains("| Avg latency | 10 ms |"));
    }
}

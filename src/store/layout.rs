use std::path::{Component, Path};

use chrono::{DateTime, Utc};

pub const META_FILE: &str = "meta.json";
pub const RESULTS_FILE: &str = "results.jsonl";
pub const REPORT_FILE: &str = "report.md";

/// Directory name for a run started at `started`: `YYYYMMDD-HHMMSS`.
///
/// Names sort lexicographically in chronological order.
pub fn run_dir_name(started: DateTime<Utc>) -> String {
    started.format("%Y%m%d-%H%M%S").to_string()
}

/// A run id must name exactly one directory below the runs root.
pub fn is_valid_run_id(id: &str) -> bool {
    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !id.contains(|c: char| c == '/' || c == '\\')
}

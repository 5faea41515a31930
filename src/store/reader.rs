use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::record::EvaluationRecord;

use super::layout::{META_FILE, RESULTS_FILE};
use super::meta::RunMetadata;

/// A finished run found under the runs root.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredRun {
    pub run_id: String,
    pub dir: PathBuf,
    pub metadata: RunMetadata,
}

/// Reads the records of one run directory.
///
/// Only newline-terminated lines count: a trailing line still being written
/// is ignored. Blank and unparsable lines are skipped. A missing results file
/// yields no records.
pub fn read_records(run_dir: &Path) -> Result<Vec<EvaluationRecord>, PersistenceError> {
    let path = run_dir.join(RESULTS_FILE);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(PersistenceError::io(&path, err)),
    };
    Ok(parse_complete_lines(&data, &path))
}

fn parse_complete_lines(data: &[u8], path: &Path) -> Vec<EvaluationRecord> {
    let complete = match data.iter().rposition(|&b| b == b'\n') {
        Some(last_newline) => &data[..last_newline],
        None => return Vec::new(),
    };
    complete
        .split(|&b| b == b'\n')
        .enumerate()
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
        .filter_map(|(idx, line)| match serde_json::from_slice(line) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!(
                    "skipping malformed record at {}:{}: {err}",
                    path.display(),
                    idx + 1
                );
                None
            }
        })
        .collect()
}

/// Reads `meta.json`; `Ok(None)` when the run has not finished writing it.
pub fn read_metadata(run_dir: &Path) -> Result<Option<RunMetadata>, PersistenceError> {
    let path = run_dir.join(META_FILE);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(PersistenceError::io(&path, err)),
    };
    Ok(Some(serde_json::from_slice(&data)?))
}

/// Lists up to `limit` runs, newest first.
///
/// Directories are ordered by name, descending. Entries that are not
/// directories, lack `meta.json`, or hold unreadable metadata are skipped.
/// A missing root yields no runs.
pub fn discover_runs(root: &Path, limit: usize) -> Vec<DiscoveredRun> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                log::warn!("cannot list runs in {}: {err}", root.display());
            }
            return Vec::new();
        }
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some((name, entry.path()))
        })
        .collect();
    dirs.sort_by(|a, b| b.0.cmp(&a.0));

    let mut runs = Vec::new();
    for (run_id, dir) in dirs {
        if runs.len() >= limit {
            break;
        }
        match read_metadata(&dir) {
            Ok(Some(metadata)) => runs.push(DiscoveredRun {
                run_id,
                dir,
                metadata,
            }),
            Ok(None) => log::debug!("run {run_id} has no metadata yet, skipping"),
            Err(err) => log::warn!("error loading run {run_id}: {err}"),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_run(root: &Path, name: &str, with_meta: bool) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        if with_meta {
            fs::write(
                dir.join(META_FILE),
                format!(r#"{{"model": "m-{name}", "total_prompts": 1}}"#),
            )
            .unwrap();
        }
        dir
    }

    #[test]
    fn partial_trailing_line_is_ignored() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(RESULTS_FILE),
            "{\"prompt_id\":\"a\",\"blocked\":false}\n{\"prompt_id\":\"b\",\"blo",
        )
        .unwrap();
        let records = read_records(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prompt_id, "a");
    }

    #[test]
    fn malformed_and_blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(RESULTS_FILE),
            "{\"prompt_id\":\"a\"}\n\nnot json\n   \n{\"prompt_id\":\"c\"}\n",
        )
        .unwrap();
        let ids: Vec<_> = read_records(dir.path())
            .unwrap()
            .into_iter()
            .map(|r| r.prompt_id)
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn missing_results_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(read_records(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn file_without_any_newline_is_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(RESULTS_FILE), "{\"prompt_id\":\"a\"}").unwrap();
        assert!(read_records(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn discovery_skips_runs_without_metadata() {
        let root = tempdir().unwrap();
        make_run(root.path(), "20240101-000000", true);
        make_run(root.path(), "20240102-000000", false);
        make_run(root.path(), "20240103-000000", true);
        fs::write(root.path().join("20249999-notes.txt"), "x").unwrap();

        let runs = discover_runs(root.path(), 10);
        let ids: Vec<_> = runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, ["20240103-000000", "20240101-000000"]);
        assert_eq!(runs[0].metadata.model, "m-20240103-000000");
    }

    #[test]
    fn discovery_honours_limit_and_skips_bad_metadata() {
        let root = tempdir().unwrap();
        for name in ["20240101-000000", "20240102-000000", "20240103-000000"] {
            make_run(root.path(), name, true);
        }
        let broken = make_run(root.path(), "20240104-000000", false);
        fs::write(broken.join(META_FILE), "{ truncated").unwrap();

        let ids: Vec<_> = discover_runs(root.path(), 2)
            .into_iter()
            .map(|r| r.run_id)
            .collect();
        assert_eq!(ids, ["20240103-000000", "20240102-000000"]);
    }

    #[test]
    fn missing_root_has_no_runs() {
        let root = tempdir().unwrap();
        assert!(discover_runs(&root.path().join("nope"), 10).is_empty());
    }

    #[test]
    fn discovery_keeps_runs_with_off_type_metadata() {
        let root = tempdir().unwrap();
        let dir = make_run(root.path(), "20240101-000000", false);
        fs::write(
            dir.join(META_FILE),
            r#"{"model": null, "start_time": "2024-01-01T00:00:00.123456", "total_prompts": "2"}"#,
        )
        .unwrap();
        fs::write(
            dir.join(RESULTS_FILE),
            "{\"prompt_id\":\"a\",\"blocked\":true}\n",
        )
        .unwrap();

        let runs = discover_runs(root.path(), 10);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].metadata.total_prompts, 2);
        assert!(runs[0].metadata.start_time.is_some());
        assert_eq!(read_records(&runs[0].dir).unwrap().len(), 1);
    }
}

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::record::EvaluationRecord;

use super::layout::{META_FILE, RESULTS_FILE};
use super::meta::RunMetadata;

/// Writes one run directory: records are appended, metadata is written once.
#[derive(Debug)]
pub struct RunWriter {
    dir: PathBuf,
    results: File,
    written: usize,
}

impl RunWriter {
    /// Creates `dir` (and parents) and opens a fresh `results.jsonl`.
    ///
    /// Fails if the directory already holds results, so two runs can never
    /// interleave their records.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| PersistenceError::io(&dir, err))?;
        let path = dir.join(RESULTS_FILE);
        let results = OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::AlreadyExists => PersistenceError::RunExists(dir.clone()),
                _ => PersistenceError::io(&path, err),
            })?;
        Ok(Self {
            dir,
            results,
            written: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of records appended so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Appends one record as a single newline-terminated write.
    ///
    /// The line is fully serialized before the write so a concurrent reader
    /// sees either the whole line or no newline at all.
    pub fn append(&mut self, record: &EvaluationRecord) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let path = self.dir.join(RESULTS_FILE);
        self.results
            .write_all(&line)
            .and_then(|_| self.results.flush())
            .map_err(|err| PersistenceError::io(&path, err))?;
        self.written += 1;
        Ok(())
    }

    /// Writes `meta.json` through a temporary file and a rename, so readers
    /// never observe a half-written document.
    pub fn write_metadata(&self, metadata: &RunMetadata) -> Result<(), PersistenceError> {
        let path = self.dir.join(META_FILE);
        if path.exists() {
            return Err(PersistenceError::RunExists(self.dir.clone()));
        }
        let tmp = self.dir.join(format!(".{META_FILE}.tmp"));
        let payload = serde_json::to_vec_pretty(metadata)?;
        fs::write(&tmp, payload).map_err(|err| PersistenceError::io(&tmp, err))?;
        fs::rename(&tmp, &path).map_err(|err| PersistenceError::io(&path, err))?;
        Ok(())
    }
}

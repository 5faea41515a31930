//! Prompt sets: the ordered inputs of a run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One row of a prompt set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Prompt {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected: None,
            metadata: None,
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Expected answer, treating a blank string as absent.
    pub fn expected_answer(&self) -> Option<&str> {
        self.expected
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Row shape on disk; ids are optional and filled from the row number.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptRow {
    #[serde(default)]
    id: Option<IdValue>,
    prompt: String,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(i64),
}

enum Format {
    Csv,
    JsonLines,
    JsonArray,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Ok(Format::Csv),
            Some("jsonl") | Some("ndjson") => Ok(Format::JsonLines),
            Some("json") => Ok(Format::JsonArray),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            other => Err(ConfigError::InvalidPrompts(format!(
                "unsupported prompt file extension {:?} (expected .csv, .jsonl, .json, .yaml)",
                other.unwrap_or("")
            ))),
        }
    }
}

/// Loads a prompt set, preserving file order.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<Prompt>, ConfigError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let rows = match format {
        Format::Csv => parse_csv(path, &contents)?,
        Format::JsonLines => parse_json_lines(path, &contents)?,
        Format::JsonArray => serde_json::from_str::<Vec<PromptRow>>(&contents)
            .map_err(|err| json_error(path, err))?,
        Format::Yaml => serde_yaml::from_str::<Vec<PromptRow>>(&contents).map_err(|err| {
            ConfigError::SchemaViolation {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        })?,
    };
    into_prompts(rows)
}

fn parse_json_lines(path: &Path, contents: &str) -> Result<Vec<PromptRow>, ConfigError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<PromptRow>(line).map_err(|err| {
                let mut mapped = json_error(path, err);
                if let ConfigError::InvalidJson { message, .. }
                | ConfigError::SchemaViolation { message, .. } = &mut mapped
                {
                    *message = format!("line {}: {message}", idx + 1);
                }
                mapped
            })
        })
        .collect()
}

const CSV_COLUMNS: [&str; 3] = ["id", "prompt", "expected"];

/// Reads `id,prompt,expected` columns; any other column lands in `metadata`.
/// Empty cells count as absent.
fn parse_csv(path: &Path, contents: &str) -> Result<Vec<PromptRow>, ConfigError> {
    let schema_error = |message: String| ConfigError::SchemaViolation {
        path: path.to_path_buf(),
        message,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(contents.trim_start_matches('\u{feff}').as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| schema_error(err.to_string()))?
        .clone();
    if !headers.iter().any(|h| h == "prompt") {
        return Err(schema_error("missing 'prompt' column".into()));
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<HashMap<String, String>>() {
        let mut cells = result.map_err(|err| schema_error(err.to_string()))?;
        let mut take = |column: &str| cells.remove(column).filter(|v| !v.trim().is_empty());
        let id = take("id").map(IdValue::Text);
        let prompt = take("prompt").unwrap_or_default();
        let expected = take("expected");

        let metadata: serde_json::Map<_, _> = headers
            .iter()
            .filter(|h| !CSV_COLUMNS.contains(h))
            .filter_map(|h| Some((h.to_string(), cells.remove(h)?.into())))
            .collect();
        rows.push(PromptRow {
            id,
            prompt,
            expected,
            metadata: (!metadata.is_empty()).then_some(metadata),
        });
    }
    Ok(rows)
}

fn json_error(path: &Path, err: serde_json::Error) -> ConfigError {
    let path = path.to_path_buf();
    let message = err.to_string();
    if err.is_syntax() || err.is_eof() {
        ConfigError::InvalidJson { path, message }
    } else {
        ConfigError::SchemaViolation { path, message }
    }
}

fn into_prompts(rows: Vec<PromptRow>) -> Result<Vec<Prompt>, ConfigError> {
    if rows.is_empty() {
        return Err(ConfigError::InvalidPrompts("prompt set is empty".into()));
    }
    let mut seen = HashSet::new();
    let mut prompts = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let id = match row.id {
            Some(IdValue::Text(id)) if !id.trim().is_empty() => id.trim().to_string(),
            Some(IdValue::Number(n)) => n.to_string(),
            _ => (idx + 1).to_string(),
        };
        if row.prompt.trim().is_empty() {
            return Err(ConfigError::InvalidPrompts(format!(
                "prompt '{id}' has empty text"
            )));
        }
        if !seen.insert(id.clone()) {
            return Err(ConfigError::InvalidPrompts(format!(
                "duplicate prompt id '{id}'"
            )));
        }
        prompts.push(Prompt {
            id,
            prompt: row.prompt,
            expected: row.expected,
            metadata: row.metadata,
        });
    }
    Ok(prompts)
}

use std::path::PathBuf;

use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

use crate::config::{ConfigPaths, LoggingConfig};

/// Starts logging to stderr, or to a rotating file when a path is configured.
///
/// The returned handle must stay alive for the whole process.
pub fn init_logging(config: &LoggingConfig, paths: &ConfigPaths) -> anyhow::Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(&config.level)?;
    let Some(path) = &config.path else {
        return Ok(logger.log_to_stderr().start()?);
    };

    let log_path = PathBuf::from(path);
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.logs_dir.clone());
    let basename = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("llm-evals")
        .to_string();
    let handle = logger
        .log_to_file(FileSpec::default().directory(directory).basename(basename))
        .duplicate_to_stderr(Duplicate::Warn)
        .rotate(
            Criterion::Size(config.rotate_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.rotate_keep),
        )
        .start()?;
    Ok(handle)
}

use std::path::PathBuf;

use super::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub logs_dir: PathBuf,
}

impl ConfigPaths {
    pub fn resolve(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let logs_dir = default_logs_dir()?;
        if let Some(config_file) = config_override {
            return Ok(Self {
                config_file,
                logs_dir,
            });
        }
        Ok(Self {
            config_file: default_config_dir()?.join("config.toml"),
            logs_dir,
        })
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".config").join("llm-evals"))
}

fn default_logs_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home
        .join(".local")
        .join("share")
        .join("llm-evals")
        .join("logs"))
}

use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::paths::ConfigPaths;
use super::types::AppConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub paths: ConfigPaths,
}

/// Loads the config file; a missing file yields the defaults.
pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let explicit = path_override.is_some();
    let paths = ConfigPaths::resolve(path_override)?;
    let config = match read_config(&paths.config_file)? {
        Some(config) => config,
        None if explicit => {
            return Err(ConfigError::Io {
                path: paths.config_file.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            })
        }
        None => AppConfig::default(),
    };
    Ok(LoadedConfig { config, paths })
}

fn read_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

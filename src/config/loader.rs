use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Files tried, in order, when no path is given.
pub const DEFAULT_CONFIG_CANDIDATES: [&str; 4] =
    ["ratefire.toml", "ratefire.json", "ratefire.yaml", "config.yaml"];

/// Loads a configuration file from the provided path or default locations.
///
/// # Errors
///
/// Returns an error when no config file is found, or when the chosen file
/// cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<ConfigFile> {
    if let Some(path) = path {
        return load_config_file(&PathBuf::from(path));
    }

    for candidate in DEFAULT_CONFIG_CANDIDATES {
        let candidate_path = PathBuf::from(candidate);
        if candidate_path.exists() {
            tracing::debug!("Using config file {}", candidate_path.display());
            return load_config_file(&candidate_path);
        }
    }

    Err(AppError::config(ConfigError::NoConfigFound {
        candidates: DEFAULT_CONFIG_CANDIDATES.join(", "),
    }))
}

/// Reads and parses one config file. The extension picks the format.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has an unknown extension,
/// or does not parse.
pub fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}

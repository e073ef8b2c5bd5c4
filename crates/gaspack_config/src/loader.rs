//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "gaspack.toml";

/// Loads `<project_dir>/gaspack.toml`, or the default configuration if absent.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration from an explicit file path.
///
/// Unlike [`load_config`], a missing file is an error.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `gaspack.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    let invalid = |key, reason| Err(ConfigError::Invalid { key, reason });
    if config.build.concurrency == 0 {
        return invalid("build.concurrency", "must be at least 1");
    }
    if config.build.alias.is_empty() {
        return invalid("build.alias", "must not be empty");
    }
    if config.build.default_page.trim().is_empty() {
        return invalid("build.default_page", "must not be empty");
    }
    if config.paths.out.trim().is_empty() {
        return invalid("paths.out", "must not be empty");
    }
    Ok(())
}

//! Fusion configuration loading.
//!
//! The default configuration is baked into the binary from
//! `config/default.toml`. A different file can be selected on the command
//! line or through the `CRIME_TEMP_CONFIG` environment variable. Missing
//! keys fall back to the defaults, so override files only need the fields
//! they change.

use std::path::Path;

use crime_temp_dataset_models::FusionConfig;

use crate::{FusionError, Stage};

/// The configuration used when no file is given.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "CRIME_TEMP_CONFIG";

/// Parses a [`FusionConfig`] from a TOML string.
///
/// # Errors
///
/// Returns [`FusionError::Config`] if the TOML is malformed or a field has
/// the wrong type.
pub fn parse_config(toml_str: &str) -> Result<FusionConfig, FusionError> {
    toml::de::from_str(toml_str).map_err(|e| FusionError::Config {
        message: e.to_string(),
    })
}

/// Returns the embedded default configuration.
///
/// # Errors
///
/// Returns [`FusionError::Config`] if the embedded TOML is invalid.
pub fn default_config() -> Result<FusionConfig, FusionError> {
    parse_config(DEFAULT_CONFIG_TOML)
}

/// Reads a [`FusionConfig`] from a TOML file.
///
/// # Errors
///
/// Returns [`FusionError::Io`] if the file cannot be read, or
/// [`FusionError::Config`] if it cannot be parsed.
pub fn read_config(path: &Path) -> Result<FusionConfig, FusionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FusionError::Io {
        stage: Stage::Config,
        path: path.to_path_buf(),
        source,
    })?;
    toml::de::from_str(&contents).map_err(|e| FusionError::Config {
        message: format!("{}: {e}", path.display()),
    })
}

/// Resolves the configuration for a run: the explicit `path` if given,
/// otherwise the file named by [`CONFIG_ENV_VAR`], otherwise the embedded
/// default.
///
/// # Errors
///
/// Returns [`FusionError`] if the selected file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<FusionConfig, FusionError> {
    if let Some(path) = path {
        log::debug!("Using configuration from {}", path.display());
        return read_config(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
        && !env_path.trim().is_empty()
    {
        log::debug!("Using configuration from ${CONFIG_ENV_VAR}={env_path}");
        return read_config(Path::new(env_path.trim()));
    }

    default_config()
}

/// Renders a configuration back to TOML.
///
/// # Errors
///
/// Returns [`FusionError::Config`] if serialization fails.
pub fn to_toml(config: &FusionConfig) -> Result<String, FusionError> {
    toml::to_string(config).map_err(|e| FusionError::Config {
        message: e.to_string(),
    })
}

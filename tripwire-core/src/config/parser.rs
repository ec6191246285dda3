use std::path::Path;

use crate::config::TripwireConfig;
use crate::error::{ConfigError, ParseError};
use crate::validate::validate_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Auto,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Auto,
        }
    }
}

pub fn parse_config_str(input: &str, format: ConfigFormat) -> Result<TripwireConfig, ParseError> {
    match format {
        ConfigFormat::Json => Ok(serde_json::from_str(input)?),
        ConfigFormat::Yaml => Ok(serde_yaml::from_str(input)?),
        ConfigFormat::Auto => parse_config_auto(input),
    }
}

fn parse_config_auto(input: &str) -> Result<TripwireConfig, ParseError> {
    // JSON always starts with `{` after trimming; an empty file is an empty config.
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Ok(TripwireConfig::default());
    }
    if trimmed.starts_with('{') {
        return match serde_json::from_str(input) {
            Ok(cfg) => Ok(cfg),
            Err(e) => serde_yaml::from_str(input).map_err(|_| ParseError::Json(e)),
        };
    }
    match serde_yaml::from_str(input) {
        Ok(cfg) => Ok(cfg),
        Err(e) => serde_json::from_str(input).map_err(|_| ParseError::Yaml(e)),
    }
}

/// Reads, parses and validates a config file.
pub fn load_config(path: &Path) -> Result<TripwireConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg = parse_config_str(&raw, ConfigFormat::from_path(path))?;
    validate_config(&cfg)?;
    tracing::debug!(path = %path.display(), "loaded tripwire config");
    Ok(cfg)
}

//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full startup load: defaults or file, then process environment, then validation.
pub fn load(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GateConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay deployment variables onto `config`.
///
/// `lookup` abstracts the environment so tests need not mutate process state.
/// Numeric values that fail to parse are ignored and the current value stays.
pub fn apply_env_overrides<F>(config: &mut GateConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(max) = parse_var(&lookup, "RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = max;
    }
    if let Some(minutes) = parse_var(&lookup, "RATE_LIMIT_WINDOW_MINUTES") {
        config.rate_limit.window_minutes = minutes;
    }
    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        let origins: Vec<String> = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
        if !origins.is_empty() {
            config.cors.allowed_origins = origins;
        }
    }
    if let Some(addr) = lookup("SCAN_UPSTREAM_ADDR").filter(|a| !a.trim().is_empty()) {
        config.upstream.address = addr.trim().to_string();
    }
    if let Some(addr) = lookup("BIND_ADDRESS").filter(|a| !a.trim().is_empty()) {
        config.listener.bind_address = addr.trim().to_string();
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, quota > 0, intervals > 0)
//! - Check addresses and the gated route are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::Method;
use thiserror::Error;

use crate::config::schema::GateConfig;

/// Upper bound for `sweep_interval_secs` and `safety_margin_secs` (30 days).
pub const MAX_SWEEP_SECS: u64 = 30 * 24 * 60 * 60;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rate_limit.max_requests must be positive")]
    ZeroMaxRequests,

    #[error("rate_limit.window_minutes must be positive")]
    ZeroWindow,

    #[error("rate_limit.sweep_interval_secs must be positive")]
    ZeroSweepInterval,

    #[error("{field} must not exceed {max} seconds")]
    IntervalTooLarge { field: &'static str, max: u64 },

    #[error("rate_limit.gated_path must start with '/': {0}")]
    InvalidGatedPath(String),

    #[error("rate_limit.gated_method is not an HTTP method: {0}")]
    InvalidGatedMethod(String),

    #[error("{field} is not a valid address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("cors.allowed_origins cannot contain a wildcard when credentials are allowed")]
    WildcardOrigin,

    #[error("timeouts.request_secs must be positive")]
    ZeroRequestTimeout,
}

/// Check every semantic rule, collecting all failures.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let rl = &config.rate_limit;

    if rl.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests);
    }
    if rl.window_minutes == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if rl.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if rl.sweep_interval_secs > MAX_SWEEP_SECS {
        errors.push(ValidationError::IntervalTooLarge {
            field: "rate_limit.sweep_interval_secs",
            max: MAX_SWEEP_SECS,
        });
    }
    if rl.safety_margin_secs > MAX_SWEEP_SECS {
        errors.push(ValidationError::IntervalTooLarge {
            field: "rate_limit.safety_margin_secs",
            max: MAX_SWEEP_SECS,
        });
    }
    if !rl.gated_path.starts_with('/') {
        errors.push(ValidationError::InvalidGatedPath(rl.gated_path.clone()));
    }
    if Method::from_bytes(rl.gated_method.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidGatedMethod(rl.gated_method.clone()));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if Authority::from_str(&config.upstream.address).is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "upstream.address",
            value: config.upstream.address.clone(),
        });
    }
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.cors.allowed_origins.iter().any(|o| o.trim() == "*") {
        errors.push(ValidationError::WildcardOrigin);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GateConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GateConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_minutes = 0;
        config.rate_limit.gated_path = "api/scan".into();
        config.upstream.address = "bad host:8090".into();
        config.cors.allowed_origins = vec!["*".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroMaxRequests));
        assert!(errors.contains(&ValidationError::ZeroWindow));
        assert!(errors.contains(&ValidationError::WildcardOrigin));
        assert!(errors.contains(&ValidationError::InvalidAddress {
            field: "upstream.address",
            value: "bad host:8090".into(),
        }));
    }

    #[test]
    fn oversized_sweep_settings_are_rejected() {
        let mut config = GateConfig::default();
        config.rate_limit.sweep_interval_secs = u64::MAX;
        config.rate_limit.safety_margin_secs = MAX_SWEEP_SECS + 1;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::IntervalTooLarge {
                    field: "rate_limit.sweep_interval_secs",
                    max: MAX_SWEEP_SECS,
                },
                ValidationError::IntervalTooLarge {
                    field: "rate_limit.safety_margin_secs",
                    max: MAX_SWEEP_SECS,
                },
            ]
        );

        config.rate_limit.sweep_interval_secs = MAX_SWEEP_SECS;
        config.rate_limit.safety_margin_secs = MAX_SWEEP_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn upstream_may_be_a_hostname() {
        let mut config = GateConfig::default();
        config.upstream.address = "webzcan-zap-svc:8090".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = GateConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nonsense".into();
        assert!(validate_config(&config).is_ok());
    }
}

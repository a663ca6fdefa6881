//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0, addresses parse)
//! - Detect duplicate tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("i18n.locale must not be empty")]
    EmptyLocale,

    #[error("feature_flags.service_flag must not be empty")]
    EmptyServiceFlag,

    #[error("auth token for subject '{0}' is empty")]
    EmptyToken(String),

    #[error("auth token for subject '{0}' is declared more than once")]
    DuplicateToken(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.i18n.locale.trim().is_empty() {
        errors.push(ValidationError::EmptyLocale);
    }
    if config.feature_flags.service_flag.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceFlag);
    }

    let mut seen = HashSet::new();
    for token in &config.auth.tokens {
        if token.token.trim().is_empty() {
            errors.push(ValidationError::EmptyToken(token.subject.clone()));
        } else if !seen.insert(token.token.as_str()) {
            errors.push(ValidationError::DuplicateToken(token.subject.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TokenConfig;

    fn token(token: &str, subject: &str) -> TokenConfig {
        TokenConfig {
            token: token.into(),
            subject: subject.into(),
            permissions: vec![],
            expires_at: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.i18n.locale = " ".into();
        config.auth.tokens = vec![token("a", "alice"), token("a", "bob"), token("", "carol")];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("not-an-address".into()),
                ValidationError::ZeroRequestTimeout,
                ValidationError::EmptyLocale,
                ValidationError::DuplicateToken("bob".into()),
                ValidationError::EmptyToken("carol".into()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidMetricsAddress("bogus".into())]
        );
    }
}

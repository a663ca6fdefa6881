//! Configuration loading from disk.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `i18n.locale`.
pub const ENV_LOCALE: &str = "LOCALE";
/// Environment variable overriding the listener port.
pub const ENV_PORT: &str = "PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `LOCALE` and `PORT` overrides. Resolved once at load time so the
/// rest of the gateway never reads the environment.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(locale) = lookup(ENV_LOCALE).filter(|l| !l.trim().is_empty()) {
        config.i18n.locale = locale.trim().to_string();
    }

    if let Some(port) = lookup(ENV_PORT).and_then(|p| p.trim().parse::<u16>().ok()) {
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{}", port),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env(&[]));
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_locale_and_port_overrides() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "127.0.0.1:3000".into();
        apply_env_overrides(&mut config, env(&[("LOCALE", "fr"), ("PORT", "8088")]));
        assert_eq!(config.i18n.locale, "fr");
        assert_eq!(config.listener.bind_address, "127.0.0.1:8088");
    }

    #[test]
    fn test_invalid_port_ignored() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env(&[("PORT", "eighty")]));
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_load_config_reports_validation_errors() {
        let path = std::env::temp_dir().join(format!("gateway-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.contains(&ValidationError::ZeroRequestTimeout)));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!("gateway-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[listener\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        fs::remove_file(&path).unwrap();
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::i18n::DEFAULT_LOCALE;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Locale and translation catalogs.
    pub i18n: I18nConfig,

    /// Bearer tokens accepted by the static authenticator.
    pub auth: AuthConfig,

    /// Administrative feature flags.
    pub feature_flags: FeatureFlagConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Localization configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct I18nConfig {
    /// Locale used to translate error messages.
    pub locale: String,

    /// Directory holding `<locale>.json` catalogs. Messages pass through
    /// untranslated when unset.
    pub catalog_dir: Option<String>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            catalog_dir: None,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<TokenConfig>,
}

/// A bearer token and the principal it resolves to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenConfig {
    pub token: String,

    /// Subject identifier of the principal.
    pub subject: String,

    /// Permission tokens granted to the principal.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Expiry as unix seconds. Never expires when unset.
    #[serde(default)]
    pub expires_at: Option<u64>,
}

/// Feature flag configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FeatureFlagConfig {
    /// Flag consulted by the admission gate for this service.
    pub service_flag: String,

    /// Value used for flags not listed in `flags`.
    pub default_enabled: bool,

    /// Explicit flag values.
    pub flags: BTreeMap<String, bool>,
}

impl FeatureFlagConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(self.default_enabled)
    }
}

impl Default for FeatureFlagConfig {
    fn default() -> Self {
        Self {
            service_flag: "feature-toggle-service".to_string(),
            default_enabled: true,
            flags: BTreeMap::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Origins allowed by CORS. CORS handling is off when empty.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.i18n.locale, "en");
    }

    #[test]
    fn test_full_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [i18n]
            locale = "de"

            [[auth.tokens]]
            token = "t1"
            subject = "alice"
            permissions = ["ViewFeature"]

            [feature_flags]
            service_flag = "toggles"
            default_enabled = false
            flags = { toggles = true }

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.i18n.locale, "de");
        assert_eq!(config.auth.tokens[0].permissions, vec!["ViewFeature"]);
        assert!(config.auth.tokens[0].expires_at.is_none());
        assert!(config.feature_flags.is_enabled("toggles"));
        assert!(!config.feature_flags.is_enabled("other"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}

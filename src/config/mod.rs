//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, LOCALE/PORT overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → live.rs (ArcSwap snapshot shared with the feature flag)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the snapshot in LiveConfig
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Environment is read once, at load time
//! - Only feature flags observe reloads; strategies built at startup keep
//!   their snapshot

pub mod live;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use live::LiveConfig;
pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AuthConfig, FeatureFlagConfig, GatewayConfig, I18nConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, SecurityConfig, TimeoutConfig, TokenConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::{ConfigWatcher, ReloadOutcome};

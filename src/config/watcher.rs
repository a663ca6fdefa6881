//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - A reload re-runs the full load path (parse, env overrides, validation)
//! - Every validation error of a rejected file is logged on its own
//! - Identical consecutive loads are published once; editors often emit
//!   several modify events per save

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayConfig;
use crate::observability::metrics;

/// Result of one reload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The new configuration was sent to the server.
    Published,
    /// The file loaded but matches what was last published.
    Unchanged,
    /// The file could not be loaded; the running configuration stays.
    Rejected,
}

/// Loads the watched file and publishes accepted configurations.
#[derive(Clone)]
struct Reloader {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
    last_published: Arc<Mutex<Option<GatewayConfig>>>,
}

impl Reloader {
    fn reload(&self) -> ReloadOutcome {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(err) => {
                metrics::record_config_reload(false);
                log_rejection(&self.path, &err);
                return ReloadOutcome::Rejected;
            }
        };

        let mut last = self
            .last_published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.as_ref() == Some(&config) {
            tracing::debug!(path = ?self.path, "Config file unchanged, skipping reload");
            return ReloadOutcome::Unchanged;
        }

        if self.update_tx.send(config.clone()).is_err() {
            tracing::warn!("Config update receiver closed, reload discarded");
            return ReloadOutcome::Rejected;
        }
        metrics::record_config_reload(true);
        tracing::info!(
            path = ?self.path,
            locale = %config.i18n.locale,
            service_flag = %config.feature_flags.service_flag,
            "Config reloaded"
        );
        *last = Some(config);
        ReloadOutcome::Published
    }

    fn concerns(&self, event: &Event) -> bool {
        (event.kind.is_modify() || event.kind.is_create())
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }
}

fn log_rejection(path: &Path, err: &ConfigError) {
    match err {
        ConfigError::Validation(errors) => {
            for error in errors {
                tracing::error!(path = ?path, error = %error, "Reloaded config is invalid");
            }
            tracing::warn!(
                errors = errors.len(),
                "Keeping current configuration"
            );
        }
        other => tracing::error!(
            path = ?path,
            error = %other,
            "Failed to reload config. Keeping current configuration."
        ),
    }
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    reloader: Reloader,
}

impl ConfigWatcher {
    /// Create a watcher for `path` and the receiver the server applies
    /// updates from.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let reloader = Reloader {
            path: path.to_path_buf(),
            update_tx,
            last_published: Arc::new(Mutex::new(None)),
        };
        (Self { reloader }, update_rx)
    }

    /// Treat `config` as already running so an unchanged file is not
    /// re-published.
    pub fn with_current(self, config: GatewayConfig) -> Self {
        *self
            .reloader
            .last_published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config);
        self
    }

    /// Load the file now and publish it if accepted.
    pub fn reload(&self) -> ReloadOutcome {
        self.reloader.reload()
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let reloader = self.reloader.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if reloader.concerns(&event) => {
                    tracing::info!(path = ?reloader.path, "Config file change detected");
                    reloader.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.reloader.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.reloader.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gateway-watch-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reload_publishes_valid_config_once() {
        let path = temp_config("[i18n]\nlocale = \"de\"\n");
        let (watcher, mut rx) = ConfigWatcher::new(&path);

        assert_eq!(watcher.reload(), ReloadOutcome::Published);
        assert_eq!(rx.try_recv().unwrap().i18n.locale, "de");

        assert_eq!(watcher.reload(), ReloadOutcome::Unchanged);
        assert!(rx.try_recv().is_err());

        fs::write(&path, "[i18n]\nlocale = \"fr\"\n").unwrap();
        assert_eq!(watcher.reload(), ReloadOutcome::Published);
        assert_eq!(rx.try_recv().unwrap().i18n.locale, "fr");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_reload_keeps_current_config() {
        let path = temp_config("[timeouts]\nrequest_secs = 0\n[security]\nmax_body_size = 0\n");
        let (watcher, mut rx) = ConfigWatcher::new(&path);

        assert_eq!(watcher.reload(), ReloadOutcome::Rejected);
        assert!(rx.try_recv().is_err());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_with_current_suppresses_identical_file() {
        let path = temp_config("");
        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let watcher = watcher.with_current(load_config(&path).unwrap());

        assert_eq!(watcher.reload(), ReloadOutcome::Unchanged);
        assert!(rx.try_recv().is_err());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_closed_receiver_rejects() {
        let path = temp_config("");
        let (watcher, rx) = ConfigWatcher::new(&path);
        drop(rx);

        assert_eq!(watcher.reload(), ReloadOutcome::Rejected);
        fs::remove_file(&path).unwrap();
    }
}

//! Atomically swappable configuration snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::GatewayConfig;

/// Shared handle to the current configuration.
///
/// Readers take a snapshot with `load()`; the reload task replaces it with
/// `store()`. Reads never block.
#[derive(Clone)]
pub struct LiveConfig {
    inner: Arc<ArcSwap<GatewayConfig>>,
}

impl LiveConfig {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn load(&self) -> Arc<GatewayConfig> {
        self.inner.load_full()
    }

    pub fn store(&self, config: GatewayConfig) {
        self.inner.store(Arc::new(config));
    }
}

//! Feature-flag predicates.

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::admission::FeatureFlag;
use crate::config::LiveConfig;

/// Reads a named flag from the live configuration on every request, so a
/// config reload takes effect without restarting.
#[derive(Clone)]
pub struct ConfigFeatureFlag {
    live: LiveConfig,
    name: String,
}

impl ConfigFeatureFlag {
    pub fn new(live: LiveConfig, name: impl Into<String>) -> Self {
        Self {
            live,
            name: name.into(),
        }
    }
}

impl FeatureFlag for ConfigFeatureFlag {
    fn is_enabled(&self) -> BoxFuture<'_, bool> {
        let enabled = self.live.load().feature_flags.is_enabled(&self.name);
        future::ready(enabled).boxed()
    }
}

/// A flag fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct StaticFeatureFlag(bool);

impl StaticFeatureFlag {
    pub fn new(enabled: bool) -> Self {
        Self(enabled)
    }
}

impl FeatureFlag for StaticFeatureFlag {
    fn is_enabled(&self) -> BoxFuture<'_, bool> {
        future::ready(self.0).boxed()
    }
}

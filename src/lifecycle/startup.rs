//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every pipeline collaborator from the validated configuration
//! - Assemble them into a `SequenceController`
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Collaborators are built in dependency order, not concurrently
//! - Listeners start last (traffic only when ready), in `main`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::admission::{
    AdmissionGate, ConfigFeatureFlag, PermissionAuthorizer, StaticTokenAuthenticator,
};
use crate::config::{ConfigError, GatewayConfig, LiveConfig};
use crate::http::RequestIdMiddleware;
use crate::i18n::{CatalogError, CatalogTranslator, PassthroughTranslator, Translator};
use crate::middleware::{BodyParser, Cors};
use crate::observability::LogSink;
use crate::params::ParamParser;
use crate::routing::Router;
use crate::security::SecurityHeaders;
use crate::sequence::SequenceController;
use crate::toggles::{self, FeatureToggleStore};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("translation catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logging initialization failed: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("config watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

fn translator(config: &GatewayConfig) -> Result<Arc<dyn Translator>, CatalogError> {
    match &config.i18n.catalog_dir {
        Some(dir) => {
            let catalog = CatalogTranslator::load_dir(Path::new(dir))?;
            tracing::info!(
                dir = %dir,
                locales = ?catalog.locales().collect::<Vec<_>>(),
                "Translation catalogs loaded"
            );
            Ok(Arc::new(catalog))
        }
        None => Ok(Arc::new(PassthroughTranslator)),
    }
}

/// Build the controller serving `store`.
pub fn assemble(
    config: &GatewayConfig,
    live: LiveConfig,
    store: FeatureToggleStore,
    log_sink: Arc<dyn LogSink>,
) -> Result<SequenceController, StartupError> {
    let translator = translator(config)?;

    let gate = AdmissionGate::new(
        Arc::new(StaticTokenAuthenticator::from_config(&config.auth)),
        Arc::new(PermissionAuthorizer),
        Arc::new(ConfigFeatureFlag::new(
            live,
            config.feature_flags.service_flag.clone(),
        )),
    );

    let router = Router::new(toggles::routes(store));
    let body_limit = config.security.max_body_size;

    let mut builder = SequenceController::builder(router, gate)
        .transport(Arc::new(BodyParser::new(body_limit)));
    if !config.security.cors_allowed_origins.is_empty() {
        builder = builder.transport(Arc::new(Cors::new(
            config.security.cors_allowed_origins.clone(),
        )));
    }

    builder = builder.middleware(Arc::new(RequestIdMiddleware));
    if config.security.enable_headers {
        builder = builder.middleware(Arc::new(SecurityHeaders));
    }

    let controller = builder
        .parser(ParamParser::new(body_limit))
        .log_sink(log_sink)
        .translator(translator)
        .locale(config.i18n.locale.clone())
        .request_timeout(Duration::from_secs(config.timeouts.request_secs))
        .build();

    tracing::info!(
        routes = controller.router().routes().count(),
        locale = %controller.locale(),
        service_flag = %config.feature_flags.service_flag,
        "Request sequence assembled"
    );
    Ok(controller)
}

//! Request sequence gateway library.
//!
//! Every request runs through one ordered pipeline: middlewares, routing,
//! parameter parsing, authentication, authorization, feature-flag gate,
//! handler, response. Any failure is logged, normalized, localized and
//! written by a single rejection sink.

// Core pipeline
pub mod errors;
pub mod handler;
pub mod middleware;
pub mod params;
pub mod routing;
pub mod sequence;

// Admission and data boundary
pub mod admission;
pub mod data;
pub mod i18n;

// Transport
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod security;

// Demo service
pub mod toggles;

pub use config::schema::GatewayConfig;
pub use errors::{NormalizedError, SequenceError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use sequence::{PipelineOutcome, RequestContext, SequenceController};

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!     → request_log.rs (started / error / completed records per request)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Test sinks (in-memory request log)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request log records go through a pluggable `LogSink`
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod request_log;

pub use logging::init_logging;
pub use request_log::{
    CompletionGuard, LogRecord, LogSink, MemoryLogSink, RequestLogger, RequestMeta,
    TracingLogSink,
};

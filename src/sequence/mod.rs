//! Request sequence pipeline.
//!
//! # Data Flow
//! ```text
//! RequestContext (one per request)
//!     → transport middlewares → generic middlewares
//!     → Router::find → ParamParser::parse
//!     → AdmissionGate::admit (authenticate → authorize → feature flag)
//!     → Handler::call
//!     → ResponseSink::send
//!
//! On the first failure:
//!     → error log record → normalize → localize → ResponseSink::reject
//!
//! Always:
//!     → completed log record (guard, also on cancellation)
//! ```
//!
//! # Design Decisions
//! - The controller is immutable and shared across requests
//! - Collaborators are injected through `SequenceBuilder`
//! - The response sink is consumed by its single write

pub mod context;
pub mod controller;

pub use crate::http::response::ResponseSink;
pub use context::{PipelineOutcome, RequestContext};
pub use controller::{SequenceBuilder, SequenceController};

//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Generic middleware chain:
//!     → headers.rs (hardening headers on every response)
//! Response sink:
//!     → identity headers (x-powered-by) stripped last
//! ```
//!
//! # Design Decisions
//! - Hardening headers apply to error responses too
//! - No trust in client input

pub mod headers;

pub use headers::SecurityHeaders;

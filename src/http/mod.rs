//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, fallback dispatch)
//!     → sequence controller (middlewares, routing, admission, handler)
//!     → response.rs (single write, header merge, identity headers stripped)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdMiddleware, X_REQUEST_ID};
pub use response::{strip_identity_headers, ResponseSink};
pub use server::{AppState, HttpServer};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (method + path template, parameter capture)
//!     → Return: RouteMatch or RouteNotFound
//!
//! Route Compilation (at startup):
//!     RouteDescriptor[]
//!     → Compile path templates
//!     → Sort by specificity (literal segments first)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by specificity, then declaration order)

pub mod matcher;
pub mod router;

pub use router::{RouteDescriptor, RouteMatch, Router};

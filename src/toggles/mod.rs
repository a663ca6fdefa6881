//! Feature toggle service.
//!
//! The routes and in-memory store the gateway binary serves through the
//! request sequence.

pub mod handlers;
pub mod store;

pub use handlers::routes;
pub use store::{Feature, FeatureToggleStore, NewFeature, NewStrategy, Strategy};

//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! resolved route + request parts
//!     → Authenticator (credential → Principal)      fails: 401
//!     → Authorizer (Principal × route permissions)   fails: 403 access
//!     → FeatureFlag (administrative switch)           fails: 403 feature
//!     → Principal handed to the route handler
//! ```
//!
//! # Design Decisions
//! - Strategies are trait objects injected at construction
//! - Checks run strictly in order and stop at the first failure
//! - Fail closed: a route without permissions is denied

pub mod flags;
pub mod gate;
pub mod permissions;
pub mod principal;
pub mod strategy;
pub mod token;

pub use flags::{ConfigFeatureFlag, StaticFeatureFlag};
pub use gate::AdmissionGate;
pub use permissions::{PermissionAuthorizer, PUBLIC_PERMISSION};
pub use principal::Principal;
pub use strategy::{AuthError, Authenticator, Authorizer, FeatureFlag};
pub use token::StaticTokenAuthenticator;

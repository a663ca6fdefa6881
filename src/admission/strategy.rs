//! Pluggable admission strategies.

use axum::http::request::Parts;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::admission::Principal;
use crate::routing::RouteDescriptor;

/// Authentication failures.
///
/// The display strings are machine-matchable sentinels that clients compare
/// against; they are never translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer token on a protected route.
    #[error("TokenMissing")]
    TokenMissing,

    /// Token is unknown or malformed.
    #[error("TokenInvalid")]
    TokenInvalid,

    /// Token was valid but has expired.
    #[error("TokenExpired")]
    TokenExpired,
}

/// Resolves a `Principal` from request credentials.
pub trait Authenticator: Send + Sync {
    fn authenticate<'a>(
        &'a self,
        request: &'a Parts,
        route: &'a RouteDescriptor,
    ) -> BoxFuture<'a, Result<Principal, AuthError>>;
}

/// Decides whether a principal may call a route.
pub trait Authorizer: Send + Sync {
    fn authorize<'a>(
        &'a self,
        principal: &'a Principal,
        required: &'a [String],
        request: &'a Parts,
    ) -> BoxFuture<'a, bool>;
}

/// Administrative on/off switch evaluated after authorization.
pub trait FeatureFlag: Send + Sync {
    fn is_enabled(&self) -> BoxFuture<'_, bool>;
}

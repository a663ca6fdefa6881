//! Permission-based authorization.

use axum::http::request::Parts;
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::admission::{Authorizer, Principal};

/// Route permission that admits every principal, including anonymous ones.
pub const PUBLIC_PERMISSION: &str = "*";

/// Allows a principal holding any one of the route's required permissions.
///
/// Routes requiring `"*"` are open. Routes declaring no permissions are
/// denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionAuthorizer;

impl PermissionAuthorizer {
    pub fn is_allowed(principal: &Principal, required: &[String]) -> bool {
        if required.iter().any(|p| p == PUBLIC_PERMISSION) {
            return true;
        }
        principal.has_any(required)
    }
}

impl Authorizer for PermissionAuthorizer {
    fn authorize<'a>(
        &'a self,
        principal: &'a Principal,
        required: &'a [String],
        _request: &'a Parts,
    ) -> BoxFuture<'a, bool> {
        future::ready(Self::is_allowed(principal, required)).boxed()
    }
}

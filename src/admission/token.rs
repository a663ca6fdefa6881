//! Bearer-token authentication against tokens declared in configuration.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, request::Parts};
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::admission::{AuthError, Authenticator, Principal};
use crate::config::schema::{AuthConfig, TokenConfig};
use crate::routing::RouteDescriptor;

#[derive(Debug, Clone)]
struct Grant {
    subject: String,
    permissions: Vec<String>,
    expires_at: Option<u64>,
}

/// Resolves principals from a fixed table of bearer tokens.
///
/// Public routes are admitted as `Principal::anonymous()` without looking at
/// credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    grants: HashMap<String, Grant>,
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: impl IntoIterator<Item = TokenConfig>) -> Self {
        let grants = tokens
            .into_iter()
            .map(|t| {
                (
                    t.token,
                    Grant {
                        subject: t.subject,
                        permissions: t.permissions,
                        expires_at: t.expires_at,
                    },
                )
            })
            .collect();
        Self { grants }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.tokens.iter().cloned())
    }

    fn resolve(&self, request: &Parts, now: u64) -> Result<Principal, AuthError> {
        let token = extract_bearer_token(request).ok_or(AuthError::TokenMissing)?;
        let grant = self.grants.get(token).ok_or(AuthError::TokenInvalid)?;

        if matches!(grant.expires_at, Some(expiry) if expiry <= now) {
            return Err(AuthError::TokenExpired);
        }

        Ok(Principal::new(
            grant.subject.clone(),
            grant.permissions.clone(),
        ))
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate<'a>(
        &'a self,
        request: &'a Parts,
        route: &'a RouteDescriptor,
    ) -> BoxFuture<'a, Result<Principal, AuthError>> {
        let result = if route.is_public() {
            Ok(Principal::anonymous())
        } else {
            self.resolve(request, unix_now())
        };
        if let Err(e) = &result {
            tracing::warn!(route = %route.name(), reason = %e, "Authentication failed");
        }
        future::ready(result).boxed()
    }
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer_token(request: &Parts) -> Option<&str> {
    request
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

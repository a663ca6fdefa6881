//! Sequential admission checks.

use std::sync::Arc;

use axum::http::request::Parts;

use crate::admission::{Authenticator, Authorizer, FeatureFlag, Principal};
use crate::errors::{ForbiddenReason, SequenceError};
use crate::observability::metrics;
use crate::routing::RouteDescriptor;

/// Authentication → authorization → feature flag, first failure wins.
#[derive(Clone)]
pub struct AdmissionGate {
    authenticator: Arc<dyn Authenticator>,
    authorizer: Arc<dyn Authorizer>,
    feature_flag: Arc<dyn FeatureFlag>,
}

impl AdmissionGate {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        authorizer: Arc<dyn Authorizer>,
        feature_flag: Arc<dyn FeatureFlag>,
    ) -> Self {
        Self {
            authenticator,
            authorizer,
            feature_flag,
        }
    }

    /// Admit a request to `route`, returning the authenticated principal.
    pub async fn admit(
        &self,
        request: &Parts,
        route: &RouteDescriptor,
    ) -> Result<Principal, SequenceError> {
        let principal = self.authenticator.authenticate(request, route).await?;

        let allowed = self
            .authorizer
            .authorize(&principal, route.required_permissions(), request)
            .await;
        if !allowed {
            tracing::debug!(
                subject = %principal.subject,
                route = %route.name(),
                "Authorization denied"
            );
            return Err(SequenceError::Forbidden(ForbiddenReason::AccessDenied));
        }

        if !self.feature_flag.is_enabled().await {
            metrics::record_feature_flag_denial();
            return Err(SequenceError::Forbidden(ForbiddenReason::FeatureDisabled));
        }

        Ok(principal)
    }
}

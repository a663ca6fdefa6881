//! Error taxonomy and normalization.
//!
//! # Data Flow
//! ```text
//! any pipeline stage fails
//!     → SequenceError (single catch point in the controller)
//!     → logged as serialized error
//!     → normalize.rs (constraint rules, wrapped-JSON unwrapping, passthrough)
//!     → NormalizedError
//!     → localize (translator + locale, authentication sentinels exempt)
//!     → ResponseSink::reject
//! ```
//!
//! # Design Decisions
//! - Typed variants for everything the gateway itself produces
//! - `Untyped` is the only variant carrying an opaque payload; it is
//!   inspected by exactly one adapter (`normalize::probe_untyped`)
//! - Normalization never panics; unparsable payloads fall through

pub mod normalize;
pub mod normalized;

use std::fmt;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::admission::AuthError;
use crate::data::DataError;
use crate::params::ParamError;

pub use normalize::{normalize, probe_untyped, try_parse};
pub use normalized::{NormalizedError, FALLBACK_MESSAGE};

/// Message attached to an error: plain text or a structured payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMessage {
    Text(String),
    Structured(Value),
}

impl ErrorMessage {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(_) => None,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Structured(v) => v.clone(),
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Structured(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ErrorMessage {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ErrorMessage {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Value> for ErrorMessage {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Text(s),
            other => Self::Structured(other),
        }
    }
}

/// Why the admission gate refused a request after authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The principal lacks the route's permissions.
    AccessDenied,
    /// The service feature flag is administratively disabled.
    FeatureDisabled,
}

impl ForbiddenReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Not Allowed Access",
            Self::FeatureDisabled => "Feature Flag is disabled",
        }
    }
}

/// Every failure the request pipeline can raise.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// No route matches method + path.
    #[error("Endpoint \"{method} {path}\" not found.")]
    RouteNotFound { method: Method, path: String },

    /// Parameters or body failed validation against the route.
    #[error(transparent)]
    Parameter(#[from] ParamError),

    /// Missing, invalid or expired credential.
    #[error(transparent)]
    Authentication(#[from] AuthError),

    /// Authorization denial or disabled feature flag.
    #[error("{}", .0.message())]
    Forbidden(ForbiddenReason),

    /// Failure reported by the data-access layer.
    #[error(transparent)]
    Data(#[from] DataError),

    /// An HTTP error raised by a handler or middleware. The message may be a
    /// JSON-encoded error payload from a downstream service.
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: ErrorMessage,
    },

    /// The pipeline did not finish within the request deadline.
    #[error("Request timed out")]
    Timeout { after: Duration },

    /// An error payload whose shape is not known to the gateway.
    #[error("{0}")]
    Untyped(Value),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SequenceError {
    /// Build an HTTP error with a plain message.
    pub fn http(status: StatusCode, message: impl Into<ErrorMessage>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Status used when the error is passed through without a rule.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Parameter(e) => e.status(),
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Data(DataError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Data(DataError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Data(DataError::Constraint(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http { status, .. } => *status,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Untyped(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route_not_found",
            Self::Parameter(_) => "parameter",
            Self::Authentication(_) => "authentication",
            Self::Forbidden(ForbiddenReason::AccessDenied) => "forbidden",
            Self::Forbidden(ForbiddenReason::FeatureDisabled) => "feature_disabled",
            Self::Data(DataError::Constraint(_)) => "constraint",
            Self::Data(_) => "data",
            Self::Http { .. } => "http",
            Self::Timeout { .. } => "timeout",
            Self::Untyped(_) => "untyped",
            Self::Internal(_) => "internal",
        }
    }

    /// Serialized form written to the error log record.
    pub fn to_log_value(&self) -> Value {
        let mut value = json!({
            "kind": self.kind(),
            "status": self.status().as_u16(),
            "message": self.to_string(),
        });
        match self {
            Self::Data(DataError::Constraint(v)) => {
                value["code"] = json!(v.kind.code());
                value["table"] = json!(v.table);
                value["detail"] = json!(v.detail);
            }
            Self::Http { message, .. } => value["message"] = message.to_value(),
            Self::Untyped(payload) => value["payload"] = payload.clone(),
            Self::Timeout { after } => value["timeoutMs"] = json!(after.as_millis() as u64),
            _ => {}
        }
        value
    }
}

impl From<Value> for SequenceError {
    fn from(payload: Value) -> Self {
        Self::Untyped(payload)
    }
}

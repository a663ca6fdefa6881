//! Request identification.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Echo the ID on the response
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied ID is kept if it is a valid header value

use axum::http::{HeaderValue, Request};
use futures_util::future::{self, BoxFuture, FutureExt};
use uuid::Uuid;

use crate::errors::SequenceError;
use crate::middleware::{Flow, Middleware};
use crate::sequence::RequestContext;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Access to the request ID of a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

impl RequestIdExt for RequestContext {
    fn request_id(&self) -> Option<&str> {
        self.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

/// Ensures every request carries an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &str {
        "request-id"
    }

    fn invoke<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, SequenceError>> {
        let value = match ctx.headers().get(X_REQUEST_ID).cloned() {
            Some(existing) => existing,
            None => {
                let id = RequestId::generate();
                match HeaderValue::from_str(id.as_str()) {
                    Ok(value) => {
                        ctx.headers_mut().insert(X_REQUEST_ID, value.clone());
                        value
                    }
                    Err(e) => {
                        return future::ready(Err(SequenceError::Internal(e.to_string()))).boxed()
                    }
                }
            }
        };
        ctx.response_headers_mut().insert(X_REQUEST_ID, value);
        future::ready(Ok(Flow::Continue)).boxed()
    }
}

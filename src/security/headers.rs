//! Security response headers.
//!
//! # Responsibilities
//! - Add hardening headers to every response
//!
//! # Design Decisions
//! - Headers go on the context, so they also reach error responses
//! - Values already chosen by a handler are not overwritten

use axum::http::{header, HeaderName, HeaderValue};
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::errors::SequenceError;
use crate::middleware::{Flow, Middleware};
use crate::sequence::RequestContext;

const SECURITY_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaders;

impl Middleware for SecurityHeaders {
    fn name(&self) -> &str {
        "security-headers"
    }

    fn invoke<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, SequenceError>> {
        let headers = ctx.response_headers_mut();
        for (name, value) in SECURITY_HEADERS {
            if !headers.contains_key(&name) {
                headers.insert(name, HeaderValue::from_static(value));
            }
        }
        future::ready(Ok(Flow::Continue)).boxed()
    }
}

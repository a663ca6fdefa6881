//! Response writing.
//!
//! # Responsibilities
//! - Turn a handler `Reply` or a `NormalizedError` into an HTTP response
//! - Merge headers accumulated on the request context
//! - Strip headers that leak the server implementation
//!
//! # Design Decisions
//! - `ResponseSink` is consumed by every write, so a request can be sent or
//!   rejected once and never both
//! - Headers already set on the response win over context headers

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::NormalizedError;
use crate::handler::{Reply, ReplyBody};
use crate::sequence::PipelineOutcome;

/// Headers that identify the server software.
pub const IDENTITY_HEADERS: [&str; 1] = ["x-powered-by"];

/// Remove implementation-identity headers.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in IDENTITY_HEADERS {
        headers.remove(name);
    }
}

/// Single-use writer for the outcome of one request.
#[derive(Debug)]
pub struct ResponseSink {
    headers: HeaderMap,
}

impl ResponseSink {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Write a handler's successful result.
    pub fn send(self, reply: Reply) -> (Response, PipelineOutcome) {
        let (status, body) = reply.into_parts();
        let mut response = match body {
            ReplyBody::Json(value) => Json(value).into_response(),
            ReplyBody::Text(text) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
                text,
            )
                .into_response(),
            ReplyBody::Empty => Response::new(Body::empty()),
        };
        *response.status_mut() = status;
        (self.finish(response), PipelineOutcome::Sent)
    }

    /// Write a response produced directly by a middleware.
    pub fn send_response(self, response: Response) -> (Response, PipelineOutcome) {
        (self.finish(response), PipelineOutcome::Sent)
    }

    /// Write the normalized error.
    pub fn reject(self, error: NormalizedError) -> (Response, PipelineOutcome) {
        let response = (error.status(), Json(error.to_body())).into_response();
        (self.finish(response), PipelineOutcome::Rejected)
    }

    fn finish(self, mut response: Response) -> Response {
        let mut current: Option<HeaderName> = None;
        for (name, value) in self.headers {
            if let Some(name) = name {
                current = if response.headers().contains_key(&name) {
                    None
                } else {
                    Some(name)
                };
            }
            if let Some(name) = &current {
                response.headers_mut().append(name.clone(), value);
            }
        }
        strip_identity_headers(response.headers_mut());
        response
    }
}

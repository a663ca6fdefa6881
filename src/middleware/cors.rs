//! Cross-origin resource sharing.
//!
//! Preflight requests from an allowed origin are answered directly with
//! `204`; other requests from an allowed origin get the allow-origin header
//! on their response. Requests from other origins pass through unchanged.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::errors::SequenceError;
use crate::middleware::{Flow, Middleware};
use crate::sequence::RequestContext;

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "authorization, content-type, x-request-id";
const MAX_AGE_SECS: &str = "86400";

#[derive(Debug, Clone, Default)]
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    /// `"*"` allows every origin.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn allow_origin(&self, origin: &str) -> Option<HeaderValue> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Some(HeaderValue::from_static("*"));
        }
        self.allowed_origins
            .iter()
            .find(|o| o.as_str() == origin)
            .and_then(|o| HeaderValue::from_str(o).ok())
    }

    fn preflight(allow_origin: HeaderValue) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        response
    }
}

fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    *method == Method::OPTIONS && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

impl Middleware for Cors {
    fn name(&self) -> &str {
        "cors"
    }

    fn invoke<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, SequenceError>> {
        let allow_origin = ctx
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .and_then(|origin| self.allow_origin(origin));

        let flow = match allow_origin {
            Some(value) if is_preflight(ctx.method(), ctx.headers()) => {
                Flow::Respond(Self::preflight(value))
            }
            Some(value) => {
                let headers = ctx.response_headers_mut();
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.append(header::VARY, HeaderValue::from_static("Origin"));
                Flow::Continue
            }
            None => Flow::Continue,
        };
        future::ready(Ok(flow)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn ctx(method: Method, origin: &str, preflight: bool) -> RequestContext {
        let mut builder = Request::builder()
            .method(method)
            .uri("/features")
            .header(header::ORIGIN, origin);
        if preflight {
            builder = builder.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST");
        }
        RequestContext::new(builder.body(Body::empty()).unwrap(), None)
    }

    #[tokio::test]
    async fn test_preflight_answered() {
        let cors = Cors::new(vec!["https://app.example".into()]);
        let mut ctx = ctx(Method::OPTIONS, "https://app.example", true);
        match cors.invoke(&mut ctx).await.unwrap() {
            Flow::Respond(response) => {
                assert_eq!(response.status(), StatusCode::NO_CONTENT);
                assert_eq!(
                    response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                    "https://app.example"
                );
            }
            Flow::Continue => panic!("expected preflight response"),
        }
    }

    #[tokio::test]
    async fn test_simple_request_gets_allow_origin() {
        let cors = Cors::new(vec!["*".into()]);
        let mut ctx = ctx(Method::GET, "https://other.example", false);
        assert!(matches!(cors.invoke(&mut ctx).await.unwrap(), Flow::Continue));
        assert_eq!(ctx.response_headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_unknown_origin_untouched() {
        let cors = Cors::new(vec!["https://app.example".into()]);
        let mut ctx = ctx(Method::OPTIONS, "https://evil.example", true);
        assert!(matches!(cors.invoke(&mut ctx).await.unwrap(), Flow::Continue));
        assert!(ctx.response_headers().is_empty());
    }
}

//! Request body buffering.

use axum::http::Method;
use futures_util::future::{BoxFuture, FutureExt};

use crate::errors::SequenceError;
use crate::middleware::{Flow, Middleware};
use crate::sequence::RequestContext;

/// Buffers request bodies up to `limit` bytes before routing.
///
/// Oversized bodies fail with `413` before any route is resolved. `GET`,
/// `HEAD` and `OPTIONS` requests are left untouched.
#[derive(Debug, Clone)]
pub struct BodyParser {
    limit: usize,
}

impl BodyParser {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Middleware for BodyParser {
    fn name(&self) -> &str {
        "body-parser"
    }

    fn invoke<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, SequenceError>> {
        async move {
            if matches!(*ctx.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
                return Ok(Flow::Continue);
            }
            ctx.body_bytes(self.limit).await?;
            Ok(Flow::Continue)
        }
        .boxed()
    }
}

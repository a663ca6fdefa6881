//! Business handler contract.
//!
//! Handlers receive the parsed `Args` and the admitted `Principal` and
//! return a `Reply`. They never write the response themselves; the
//! controller sends the reply through the response sink.

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::Value;

use crate::admission::Principal;
use crate::errors::SequenceError;
use crate::params::Args;

/// Result of a handler invocation.
pub type HandlerResult = Result<Reply, SequenceError>;

/// A route's business logic.
pub trait Handler: Send + Sync {
    fn call(&self, args: Args, principal: Principal) -> BoxFuture<'static, HandlerResult>;
}

/// Body of a successful reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Json(Value),
    Text(String),
    Empty,
}

/// A handler's successful result.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    body: ReplyBody,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Json(value),
        }
    }

    /// Serialize `value` as the JSON body.
    pub fn serialize<T: Serialize>(value: &T) -> HandlerResult {
        serde_json::to_value(value)
            .map(Self::json)
            .map_err(|e| SequenceError::Internal(format!("failed to serialize reply: {}", e)))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Text(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: ReplyBody::Empty,
        }
    }

    /// Override the success status (e.g. `201 Created`).
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    pub(crate) fn into_parts(self) -> (StatusCode, ReplyBody) {
        (self.status, self.body)
    }
}

/// Adapter turning an async closure into a `Handler`.
pub struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Args, Principal) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, args: Args, principal: Principal) -> BoxFuture<'static, HandlerResult> {
        (self.0)(args, principal).boxed()
    }
}

/// Wrap an async closure as a shared handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Args, Principal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

//! Request middleware chain.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → transport middlewares (body.rs, cors.rs) on the raw exchange
//!     → generic middlewares (request id, security headers)
//!     → routing
//! ```
//!
//! # Design Decisions
//! - Middlewares run strictly in registration order
//! - A middleware may answer the request itself (`Flow::Respond`); no
//!   later stage runs and the request counts as sent
//! - Errors abort the chain and take the rejection path

pub mod body;
pub mod cors;

use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::errors::SequenceError;
use crate::sequence::RequestContext;

pub use body::BodyParser;
pub use cors::Cors;

/// What the pipeline does after a middleware returns.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Respond(Response),
}

/// One step of the middleware chain.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    fn invoke<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, SequenceError>>;
}

/// Run `chain` in order, stopping at the first middleware that responds.
pub async fn run_chain(
    chain: &[Arc<dyn Middleware>],
    ctx: &mut RequestContext,
) -> Result<Flow, SequenceError> {
    for middleware in chain {
        match middleware.invoke(ctx).await? {
            Flow::Continue => {}
            Flow::Respond(response) => {
                tracing::debug!(middleware = middleware.name(), "Middleware produced response");
                return Ok(Flow::Respond(response));
            }
        }
    }
    Ok(Flow::Continue)
}

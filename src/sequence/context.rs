//! Per-request state threaded through the pipeline.

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, Method, Request, Uri};
use futures_util::StreamExt;

use crate::admission::Principal;
use crate::params::{Args, ParamError};
use crate::routing::RouteMatch;

enum BodyState {
    Unread(Body),
    Buffered(Bytes),
}

/// Everything one pipeline invocation knows about its request.
///
/// Owned by exactly one invocation and consumed when the response is
/// produced.
pub struct RequestContext {
    parts: Parts,
    body: BodyState,
    remote_addr: Option<SocketAddr>,
    response_headers: HeaderMap,
    route: Option<RouteMatch>,
    args: Option<Args>,
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn new(request: Request<Body>, remote_addr: Option<SocketAddr>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body: BodyState::Unread(body),
            remote_addr,
            response_headers: HeaderMap::new(),
            route: None,
            args: None,
            principal: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Headers that will be merged into whatever response is produced.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    pub fn is_body_buffered(&self) -> bool {
        matches!(self.body, BodyState::Buffered(_))
    }

    /// Read the body into memory, at most `limit` bytes.
    ///
    /// The first call drains the stream; later calls return the buffered
    /// bytes.
    pub async fn body_bytes(&mut self, limit: usize) -> Result<Bytes, ParamError> {
        let body = match std::mem::replace(&mut self.body, BodyState::Buffered(Bytes::new())) {
            BodyState::Buffered(bytes) => {
                self.body = BodyState::Buffered(bytes.clone());
                return Ok(bytes);
            }
            BodyState::Unread(body) => body,
        };

        let declared = self
            .parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if matches!(declared, Some(len) if len > limit) {
            return Err(ParamError::PayloadTooLarge { limit });
        }

        let mut stream = body.into_data_stream();
        let mut buf = Vec::with_capacity(declared.unwrap_or(0));
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ParamError::BodyRead(e.to_string()))?;
            if buf.len() + chunk.len() > limit {
                return Err(ParamError::PayloadTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }

        let bytes = Bytes::from(buf);
        self.body = BodyState::Buffered(bytes.clone());
        Ok(bytes)
    }

    pub fn route(&self) -> Option<&RouteMatch> {
        self.route.as_ref()
    }

    pub fn set_route(&mut self, route: RouteMatch) {
        self.route = Some(route);
    }

    pub fn args(&self) -> Option<&Args> {
        self.args.as_ref()
    }

    pub fn set_args(&mut self, args: Args) {
        self.args = Some(args);
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub(crate) fn take_args(&mut self) -> Args {
        self.args.take().unwrap_or_default()
    }

    pub(crate) fn take_principal(&mut self) -> Principal {
        self.principal.take().unwrap_or_else(Principal::anonymous)
    }

    pub(crate) fn into_response_headers(self) -> HeaderMap {
        self.response_headers
    }
}

/// Terminal outcome of one request. Exactly one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Sent,
    Rejected,
}

impl PipelineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Rejected => "rejected",
        }
    }
}

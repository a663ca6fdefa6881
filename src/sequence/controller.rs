//! The request sequence controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::response::Response;

use crate::admission::AdmissionGate;
use crate::errors::{normalize, SequenceError};
use crate::handler::Reply;
use crate::http::response::{strip_identity_headers, ResponseSink};
use crate::i18n::{PassthroughTranslator, Translator, DEFAULT_LOCALE};
use crate::middleware::{run_chain, Flow, Middleware};
use crate::observability::metrics;
use crate::observability::{LogSink, RequestLogger, RequestMeta};
use crate::params::ParamParser;
use crate::routing::Router;
use crate::sequence::{PipelineOutcome, RequestContext};

enum Completion {
    Reply(Reply),
    Response(Response),
}

/// Drives one request from arrival to its single terminal outcome.
///
/// Stages run strictly in order: transport middlewares, generic
/// middlewares, routing, parameter parsing, admission, handler. The first
/// failure skips every later stage and is normalized, localized and written
/// by the rejection sink. An exceeded request deadline is such a failure.
pub struct SequenceController {
    transport: Vec<Arc<dyn Middleware>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    router: Arc<Router>,
    parser: ParamParser,
    gate: AdmissionGate,
    logger: RequestLogger,
    translator: Arc<dyn Translator>,
    locale: String,
    request_timeout: Option<Duration>,
}

impl SequenceController {
    pub fn builder(router: Router, gate: AdmissionGate) -> SequenceBuilder {
        SequenceBuilder {
            transport: Vec::new(),
            middlewares: Vec::new(),
            router,
            parser: ParamParser::default(),
            gate,
            logger: RequestLogger::default(),
            translator: Arc::new(PassthroughTranslator),
            locale: DEFAULT_LOCALE.to_string(),
            request_timeout: None,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub async fn handle(&self, ctx: RequestContext) -> Response {
        self.process(ctx).await.0
    }

    pub async fn process(&self, mut ctx: RequestContext) -> (Response, PipelineOutcome) {
        strip_identity_headers(ctx.response_headers_mut());

        let started = Instant::now();
        let meta = RequestMeta::from_context(&ctx);
        let guard = self.logger.start(meta.clone());

        let result = match self.request_timeout {
            Some(after) => tokio::time::timeout(after, self.run_stages(&mut ctx))
                .await
                .unwrap_or_else(|_| Err(SequenceError::Timeout { after })),
            None => self.run_stages(&mut ctx).await,
        };
        let sink = ResponseSink::new(ctx.into_response_headers());

        let (response, outcome) = match result {
            Ok(Completion::Reply(reply)) => sink.send(reply),
            Ok(Completion::Response(response)) => sink.send_response(response),
            Err(error) => {
                self.logger.error(&meta.method, &meta.path, &error);
                metrics::record_rejection(error.kind());
                let normalized =
                    normalize(&error).localize(self.translator.as_ref(), &self.locale);
                sink.reject(normalized)
            }
        };

        metrics::record_request(
            &meta.method,
            response.status().as_u16(),
            outcome.as_str(),
            started,
        );
        guard.finish(outcome, response.status());
        (response, outcome)
    }

    async fn run_stages(&self, ctx: &mut RequestContext) -> Result<Completion, SequenceError> {
        if let Flow::Respond(response) = run_chain(&self.transport, ctx).await? {
            return Ok(Completion::Response(response));
        }
        if let Flow::Respond(response) = run_chain(&self.middlewares, ctx).await? {
            return Ok(Completion::Response(response));
        }

        let matched = self.router.find(ctx.method(), ctx.path())?;
        let args = self.parser.parse(ctx, &matched).await?;
        let principal = self.gate.admit(ctx.parts(), matched.route()).await?;

        let handler = matched.route().handler().clone();
        ctx.set_route(matched);
        ctx.set_args(args);
        ctx.set_principal(principal);

        let reply = handler.call(ctx.take_args(), ctx.take_principal()).await?;
        Ok(Completion::Reply(reply))
    }
}

/// Assembles a `SequenceController` from explicit collaborators.
pub struct SequenceBuilder {
    transport: Vec<Arc<dyn Middleware>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    router: Router,
    parser: ParamParser,
    gate: AdmissionGate,
    logger: RequestLogger,
    translator: Arc<dyn Translator>,
    locale: String,
    request_timeout: Option<Duration>,
}

impl SequenceBuilder {
    /// Append a transport middleware (runs before generic middlewares).
    pub fn transport(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.transport.push(middleware);
        self
    }

    /// Append a generic middleware.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn parser(mut self, parser: ParamParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.logger = RequestLogger::new(sink);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Deadline for all stages up to and including the handler.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> SequenceController {
        SequenceController {
            transport: self.transport,
            middlewares: self.middlewares,
            router: Arc::new(self.router),
            parser: self.parser,
            gate: self.gate,
            logger: self.logger,
            translator: self.translator,
            locale: self.locale,
            request_timeout: self.request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{PermissionAuthorizer, StaticFeatureFlag, StaticTokenAuthenticator};
    use crate::config::TokenConfig;
    use crate::handler::handler_fn;
    use crate::observability::{LogRecord, MemoryLogSink};
    use crate::routing::RouteDescriptor;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;

    fn controller(flag: bool, sink: Arc<MemoryLogSink>) -> SequenceController {
        let router = Router::new(vec![
            RouteDescriptor::new(
                "ping",
                Method::GET,
                "/ping",
                handler_fn(|_, _| async { Ok(Reply::json(json!({"greeting": "pong"}))) }),
            )
            .public(),
            RouteDescriptor::new(
                "listFeatures",
                Method::GET,
                "/features",
                handler_fn(|_, _| async { Ok(Reply::json(json!([]))) }),
            )
            .permissions(["ViewFeature"]),
            RouteDescriptor::new(
                "slow",
                Method::GET,
                "/slow",
                handler_fn(|_, _| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(Reply::empty())
                }),
            )
            .public(),
        ]);
        let gate = AdmissionGate::new(
            Arc::new(StaticTokenAuthenticator::new([TokenConfig {
                token: "secret".into(),
                subject: "alice".into(),
                permissions: vec!["ViewFeature".into()],
                expires_at: None,
            }])),
            Arc::new(PermissionAuthorizer),
            Arc::new(StaticFeatureFlag::new(flag)),
        );
        SequenceController::builder(router, gate)
            .log_sink(sink)
            .request_timeout(Duration::from_millis(50))
            .build()
    }

    fn request(path: &str, token: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        RequestContext::new(builder.body(Body::empty()).unwrap(), None)
    }

    #[tokio::test]
    async fn test_public_route_is_sent() {
        let sink = Arc::new(MemoryLogSink::new());
        let (response, outcome) = controller(true, sink.clone())
            .process(request("/ping", None))
            .await;
        assert_eq!(outcome, PipelineOutcome::Sent);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sink.completed().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_route_is_rejected_and_logged() {
        let sink = Arc::new(MemoryLogSink::new());
        let (response, outcome) = controller(true, sink.clone())
            .process(request("/nope", None))
            .await;
        assert_eq!(outcome, PipelineOutcome::Rejected);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let records = sink.records();
        assert!(matches!(records[0], LogRecord::Started { .. }));
        assert!(matches!(records[1], LogRecord::Error { .. }));
        assert!(matches!(
            &records[2],
            LogRecord::Completed { outcome, status: Some(404), .. } if outcome == "rejected"
        ));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let sink = Arc::new(MemoryLogSink::new());
        let (response, _) = controller(true, sink)
            .process(request("/features", None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_disabled_flag_is_forbidden() {
        let sink = Arc::new(MemoryLogSink::new());
        let (response, outcome) = controller(false, sink)
            .process(request("/features", Some("secret")))
            .await;
        assert_eq!(outcome, PipelineOutcome::Rejected);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_deadline_goes_through_rejection_sink() {
        let sink = Arc::new(MemoryLogSink::new());
        let (response, outcome) = controller(true, sink.clone())
            .process(request("/slow", None))
            .await;
        assert_eq!(outcome, PipelineOutcome::Rejected);
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert!(matches!(
            &records[1],
            LogRecord::Error { serialized_error, .. } if serialized_error["kind"] == "timeout"
        ));
        assert!(matches!(
            &records[2],
            LogRecord::Completed { outcome, status: Some(408), .. } if outcome == "rejected"
        ));
    }
}

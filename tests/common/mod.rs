//! Shared fixtures for pipeline and end-to-end tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::response::Response;
use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::{json, Value};

use sequence_gateway::admission::{
    AdmissionGate, PermissionAuthorizer, StaticFeatureFlag, StaticTokenAuthenticator,
};
use sequence_gateway::config::TokenConfig;
use sequence_gateway::errors::SequenceError;
use sequence_gateway::handler::{handler_fn, Reply};
use sequence_gateway::http::server::{AppState, HttpServer};
use sequence_gateway::http::RequestIdMiddleware;
use sequence_gateway::i18n::Translator;
use sequence_gateway::middleware::{BodyParser, Flow, Middleware};
use sequence_gateway::observability::MemoryLogSink;
use sequence_gateway::routing::{RouteDescriptor, Router};
use sequence_gateway::sequence::{RequestContext, SequenceController};
use sequence_gateway::toggles::{self, FeatureToggleStore};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const VIEWER_TOKEN: &str = "viewer-token";
pub const EXPIRED_TOKEN: &str = "expired-token";

/// Deadline the harness pipeline runs under; `/slow` always exceeds it.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(200);

pub fn tokens() -> Vec<TokenConfig> {
    vec![
        TokenConfig {
            token: ADMIN_TOKEN.into(),
            subject: "admin".into(),
            permissions: vec![
                "ViewFeature".into(),
                "CreateFeature".into(),
                "DeleteFeature".into(),
                "CreateStrategy".into(),
            ],
            expires_at: None,
        },
        TokenConfig {
            token: VIEWER_TOKEN.into(),
            subject: "viewer".into(),
            permissions: vec!["ViewFeature".into()],
            expires_at: None,
        },
        TokenConfig {
            token: EXPIRED_TOKEN.into(),
            subject: "former-admin".into(),
            permissions: vec!["ViewFeature".into()],
            expires_at: Some(1),
        },
    ]
}

/// Records every phrase it is asked to translate.
#[derive(Default)]
pub struct SpyTranslator {
    calls: Mutex<Vec<(String, String)>>,
}

impl SpyTranslator {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Translator for SpyTranslator {
    fn translate(&self, phrase: &str, locale: &str) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((phrase.to_string(), locale.to_string()));
        format!("[{}] {}", locale, phrase)
    }
}

/// Adds an `x-powered-by` header the way some frameworks do.
pub struct PoweredBy;

impl Middleware for PoweredBy {
    fn name(&self) -> &str {
        "powered-by"
    }

    fn invoke<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Flow, SequenceError>> {
        ctx.response_headers_mut()
            .insert("x-powered-by", HeaderValue::from_static("Framework"));
        future::ready(Ok(Flow::Continue)).boxed()
    }
}

pub struct Harness {
    pub app: axum::Router,
    pub sink: Arc<MemoryLogSink>,
    pub translator: Arc<SpyTranslator>,
    pub spy_calls: Arc<AtomicUsize>,
    pub store: FeatureToggleStore,
}

impl Harness {
    pub fn spy_calls(&self) -> usize {
        self.spy_calls.load(Ordering::SeqCst)
    }
}

fn extra_routes(spy_calls: Arc<AtomicUsize>) -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new(
            "spy",
            Method::GET,
            "/spy",
            handler_fn(move |_, _| {
                let calls = spy_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Reply::text("spied"))
                }
            }),
        )
        .permissions(["ViewFeature"]),
        RouteDescriptor::new(
            "wrappedError",
            Method::GET,
            "/errors/wrapped",
            handler_fn(|_, _| async {
                Err(SequenceError::http(
                    StatusCode::BAD_GATEWAY,
                    r#"{"error":{"statusCode":422,"message":"Invalid input","field":"name"}}"#,
                ))
            }),
        )
        .public(),
        RouteDescriptor::new(
            "downstreamUnauthorized",
            Method::GET,
            "/errors/downstream-unauthorized",
            handler_fn(|_, _| async {
                Err(SequenceError::http(
                    StatusCode::BAD_GATEWAY,
                    r#"{"error":{"statusCode":401,"message":"Video session not found"}}"#,
                ))
            }),
        )
        .public(),
        RouteDescriptor::new(
            "slow",
            Method::GET,
            "/slow",
            handler_fn(|_, _| async {
                tokio::time::sleep(REQUEST_TIMEOUT * 20).await;
                Ok(Reply::text("too late"))
            }),
        )
        .public(),
        RouteDescriptor::new(
            "untypedError",
            Method::GET,
            "/errors/untyped",
            handler_fn(|_, _| async {
                Err(SequenceError::Untyped(
                    json!({"table": "x", "detail": "d", "code": "23505"}),
                ))
            }),
        )
        .public(),
        RouteDescriptor::new(
            "internalError",
            Method::GET,
            "/errors/internal",
            handler_fn(|_, _| async {
                Err(SequenceError::Internal("connection pool exhausted".into()))
            }),
        )
        .public(),
    ]
}

/// A pipeline over the toggle routes plus test routes.
pub fn harness(flag_enabled: bool, locale: &str) -> Harness {
    let sink = Arc::new(MemoryLogSink::new());
    let translator = Arc::new(SpyTranslator::default());
    let spy_calls = Arc::new(AtomicUsize::new(0));
    let store = FeatureToggleStore::new();

    let mut routes = toggles::routes(store.clone());
    routes.extend(extra_routes(spy_calls.clone()));

    let gate = AdmissionGate::new(
        Arc::new(StaticTokenAuthenticator::new(tokens())),
        Arc::new(PermissionAuthorizer),
        Arc::new(StaticFeatureFlag::new(flag_enabled)),
    );

    let controller = SequenceController::builder(Router::new(routes), gate)
        .transport(Arc::new(BodyParser::new(1024)))
        .middleware(Arc::new(RequestIdMiddleware))
        .middleware(Arc::new(PoweredBy))
        .log_sink(sink.clone())
        .translator(translator.clone())
        .locale(locale)
        .request_timeout(REQUEST_TIMEOUT)
        .build();

    let app = HttpServer::build_router(AppState {
        controller: Arc::new(controller),
    });

    Harness {
        app,
        sink,
        translator,
        spy_calls,
        store,
    }
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, path, token, None)
}

pub fn request(method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

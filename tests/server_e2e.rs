//! End-to-end tests against a real listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use sequence_gateway::config::{GatewayConfig, LiveConfig};
use sequence_gateway::http::HttpServer;
use sequence_gateway::lifecycle::{assemble, Shutdown};
use sequence_gateway::observability::{LogRecord, MemoryLogSink};
use sequence_gateway::toggles::FeatureToggleStore;

mod common;

use common::{ADMIN_TOKEN, VIEWER_TOKEN};

struct Running {
    addr: SocketAddr,
    sink: Arc<MemoryLogSink>,
    updates: mpsc::UnboundedSender<GatewayConfig>,
    config: GatewayConfig,
    shutdown: Shutdown,
}

async fn start(port: u16) -> Running {
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    let mut config = GatewayConfig::default();
    config.listener.bind_address = addr.to_string();
    config.auth.tokens = common::tokens();
    config.security.cors_allowed_origins = vec!["https://app.example".into()];

    let sink = Arc::new(MemoryLogSink::new());
    let live = LiveConfig::new(config.clone());
    let controller = assemble(&config, live.clone(), FeatureToggleStore::new(), sink.clone()).unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config.clone(), Arc::new(controller), live);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    Running {
        addr,
        sink,
        updates,
        config,
        shutdown,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_ping_over_http() {
    let running = start(28301).await;

    let res = client()
        .get(format!("http://{}/ping", running.addr))
        .header("user-agent", "e2e-test")
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-powered-by").is_none());
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["greeting"], "pong");

    let started = running
        .sink
        .records()
        .into_iter()
        .find_map(|r| match r {
            LogRecord::Started {
                user_agent,
                remote_address,
                proxy_address,
                ..
            } => Some((user_agent, remote_address, proxy_address)),
            _ => None,
        })
        .unwrap();
    assert_eq!(started.0.as_deref(), Some("e2e-test"));
    assert_eq!(started.1.as_deref(), Some("127.0.0.1"));
    assert_eq!(started.2.as_deref(), Some("203.0.113.9"));

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_feature_lifecycle_over_http() {
    let running = start(28302).await;
    let client = client();
    let base = format!("http://{}", running.addr);

    let created = client
        .post(format!("{}/features", base))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({"key": "beta", "name": "Beta"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);

    let strategy = client
        .post(format!("{}/features/beta/strategies", base))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({"name": "gradual", "priority": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(strategy.status(), 201);

    let fetched: Value = client
        .get(format!("{}/features/beta", base))
        .bearer_auth(VIEWER_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["strategies"][0]["name"], "gradual");

    let duplicate = client
        .post(format!("{}/features", base))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({"key": "beta", "name": "Beta"}))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);
    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["error"]["name"], "ConflictError");

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_reloaded_config_disables_service() {
    let running = start(28303).await;
    let client = client();
    let url = format!("http://{}/features", running.addr);

    let before = client.get(&url).bearer_auth(VIEWER_TOKEN).send().await.unwrap();
    assert_eq!(before.status(), 200);

    let mut disabled = running.config.clone();
    disabled
        .feature_flags
        .flags
        .insert(disabled.feature_flags.service_flag.clone(), false);
    running.updates.send(disabled).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let after = client.get(&url).bearer_auth(VIEWER_TOKEN).send().await.unwrap();
    assert_eq!(after.status(), 403);
    let body: Value = after.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Feature Flag is disabled");

    running.shutdown.trigger();
}

#[tokio::test]
async fn test_cors_preflight_short_circuits() {
    let running = start(28304).await;

    let res = client()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/features", running.addr),
        )
        .header("origin", "https://app.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 204);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://app.example"
    );
    assert_eq!(running.sink.completed().len(), 1);

    running.shutdown.trigger();
}

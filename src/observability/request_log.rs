//! Per-request log records.
//!
//! Every request produces one `started` record on entry, at most one
//! `error` record, and exactly one `completed` record. The completion
//! record is owned by a `CompletionGuard` so that it is also emitted when
//! the request future is dropped before finishing.

use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::http::{header, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::errors::SequenceError;
use crate::sequence::{PipelineOutcome, RequestContext};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Outcome label used when the guard is dropped without `finish`.
pub const OUTCOME_CANCELLED: &str = "cancelled";

/// One request log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum LogRecord {
    Started {
        method: String,
        path: String,
        referrer: Option<String>,
        user_agent: Option<String>,
        remote_address: Option<String>,
        proxy_address: Option<String>,
        timestamp: u64,
    },
    Error {
        method: String,
        path: String,
        serialized_error: Value,
    },
    Completed {
        method: String,
        path: String,
        elapsed_ms: f64,
        outcome: String,
        status: Option<u16>,
    },
}

/// Destination for request log records.
pub trait LogSink: Send + Sync {
    fn record(&self, record: LogRecord);
}

/// Emits records as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, record: LogRecord) {
        match record {
            LogRecord::Started {
                method,
                path,
                referrer,
                user_agent,
                remote_address,
                proxy_address,
                timestamp,
            } => tracing::info!(
                event = "started",
                %method,
                %path,
                referrer = referrer.as_deref().unwrap_or(""),
                user_agent = user_agent.as_deref().unwrap_or(""),
                remote_address = remote_address.as_deref().unwrap_or(""),
                proxy_address = proxy_address.as_deref().unwrap_or(""),
                timestamp,
                "Request started"
            ),
            LogRecord::Error {
                method,
                path,
                serialized_error,
            } => tracing::error!(
                event = "error",
                %method,
                %path,
                error = %serialized_error,
                "Request failed"
            ),
            LogRecord::Completed {
                method,
                path,
                elapsed_ms,
                outcome,
                status,
            } => tracing::info!(
                event = "completed",
                %method,
                %path,
                elapsed_ms,
                %outcome,
                status = status.unwrap_or_default(),
                "Request completed"
            ),
        }
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn completed(&self) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| matches!(r, LogRecord::Completed { .. }))
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl LogSink for MemoryLogSink {
    fn record(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

/// Request attributes captured on entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub remote_address: Option<String>,
    pub proxy_address: Option<String>,
}

impl RequestMeta {
    pub fn from_context(ctx: &RequestContext) -> Self {
        let header_str = |name: &str| {
            ctx.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            method: ctx.method().to_string(),
            path: ctx.path().to_string(),
            referrer: header_str(header::REFERER.as_str()),
            user_agent: header_str(header::USER_AGENT.as_str()),
            remote_address: ctx.remote_addr().map(|a| a.ip().to_string()),
            proxy_address: header_str(X_FORWARDED_FOR)
                .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Writes request records to a sink.
#[derive(Clone)]
pub struct RequestLogger {
    sink: Arc<dyn LogSink>,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Record the `started` event and arm the completion guard.
    pub fn start(&self, meta: RequestMeta) -> CompletionGuard {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        self.sink.record(LogRecord::Started {
            method: meta.method.clone(),
            path: meta.path.clone(),
            referrer: meta.referrer,
            user_agent: meta.user_agent,
            remote_address: meta.remote_address,
            proxy_address: meta.proxy_address,
            timestamp,
        });

        CompletionGuard {
            sink: Some(self.sink.clone()),
            method: meta.method,
            path: meta.path,
            started: Instant::now(),
        }
    }

    /// Record the caught error before it is normalized.
    pub fn error(&self, method: &str, path: &str, error: &SequenceError) {
        self.sink.record(LogRecord::Error {
            method: method.to_string(),
            path: path.to_string(),
            serialized_error: error.to_log_value(),
        });
    }
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogSink))
    }
}

/// Emits the `completed` record exactly once.
#[must_use = "dropping the guard immediately records the request as cancelled"]
pub struct CompletionGuard {
    sink: Option<Arc<dyn LogSink>>,
    method: String,
    path: String,
    started: Instant,
}

impl CompletionGuard {
    pub fn finish(mut self, outcome: PipelineOutcome, status: StatusCode) {
        self.emit(outcome.as_str(), Some(status.as_u16()));
    }

    fn emit(&mut self, outcome: &str, status: Option<u16>) {
        if let Some(sink) = self.sink.take() {
            sink.record(LogRecord::Completed {
                method: std::mem::take(&mut self.method),
                path: std::mem::take(&mut self.path),
                elapsed_ms: self.started.elapsed().as_secs_f64() * 1000.0,
                outcome: outcome.to_string(),
                status,
            });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.emit(OUTCOME_CANCELLED, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;

    fn meta() -> RequestMeta {
        RequestMeta {
            method: "GET".into(),
            path: "/ping".into(),
            referrer: None,
            user_agent: Some("curl/8".into()),
            remote_address: Some("127.0.0.1".into()),
            proxy_address: None,
        }
    }

    #[test]
    fn test_finish_emits_one_completed_record() {
        let sink = Arc::new(MemoryLogSink::new());
        let logger = RequestLogger::new(sink.clone());

        let guard = logger.start(meta());
        guard.finish(PipelineOutcome::Sent, StatusCode::OK);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        match &records[1] {
            LogRecord::Completed {
                outcome,
                status,
                elapsed_ms,
                ..
            } => {
                assert_eq!(outcome, "sent");
                assert_eq!(*status, Some(200));
                assert!(*elapsed_ms >= 0.0);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_dropped_guard_records_cancelled() {
        let sink = Arc::new(MemoryLogSink::new());
        let logger = RequestLogger::new(sink.clone());

        drop(logger.start(meta()));

        let completed = sink.completed();
        assert_eq!(completed.len(), 1);
        assert!(matches!(
            &completed[0],
            LogRecord::Completed { outcome, status: None, .. } if outcome == OUTCOME_CANCELLED
        ));
    }

    #[test]
    fn test_record_serialization() {
        let record = LogRecord::Completed {
            method: "GET".into(),
            path: "/ping".into(),
            elapsed_ms: 1.5,
            outcome: "sent".into(),
            status: Some(200),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "event": "completed",
                "method": "GET",
                "path": "/ping",
                "elapsedMs": 1.5,
                "outcome": "sent",
                "status": 200
            })
        );
    }

    #[test]
    fn test_meta_from_context() {
        let request = Request::builder()
            .uri("/features?x=1")
            .header("referer", "https://app.example")
            .header("user-agent", "test-agent")
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .body(Body::empty())
            .unwrap();
        let ctx = RequestContext::new(request, Some("192.168.1.5:4000".parse().unwrap()));
        let meta = RequestMeta::from_context(&ctx);

        assert_eq!(meta.path, "/features");
        assert_eq!(meta.referrer.as_deref(), Some("https://app.example"));
        assert_eq!(meta.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(meta.remote_address.as_deref(), Some("192.168.1.5"));
        assert_eq!(meta.proxy_address.as_deref(), Some("10.0.0.1"));
    }
}

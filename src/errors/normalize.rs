//! Conversion of caught errors into `NormalizedError`.
//!
//! Rules are evaluated in order and the first match wins:
//! 1. constraint violation (table + detail + code)
//! 2. message is a JSON string carrying an `error` field
//! 3. message is an object whose `message` is such a JSON string
//! 4. passthrough

use axum::http::StatusCode;
use serde_json::Value;

use crate::data::{ConstraintKind, ConstraintViolation, DataError};
use crate::errors::{ErrorMessage, NormalizedError, SequenceError};

/// Normalize any pipeline error.
pub fn normalize(error: &SequenceError) -> NormalizedError {
    match error {
        SequenceError::Data(DataError::Constraint(violation)) => {
            from_constraint(violation).unwrap_or_else(|| passthrough(error))
        }
        SequenceError::Http { message, .. } => {
            unwrap_message(message).unwrap_or_else(|| passthrough(error))
        }
        SequenceError::Untyped(payload) => probe_untyped(payload),
        _ => passthrough(error),
    }
}

/// Inspect an error payload of unknown shape.
///
/// This is the only place that probes untyped fields (`table`, `detail`,
/// `code`, nested `message`). Everything else pattern-matches on
/// `SequenceError`.
pub fn probe_untyped(payload: &Value) -> NormalizedError {
    let table = payload.get("table").filter(|v| is_truthy(v));
    let detail = payload.get("detail").filter(|v| is_truthy(v));

    if let (Some(table), Some(detail)) = (table, detail) {
        let violation = code_of(payload).map(|code| {
            ConstraintViolation::new(
                ConstraintKind::from_sqlstate(&code),
                scalar_text(table),
                scalar_text(detail),
                payload
                    .get("message")
                    .map(scalar_text)
                    .unwrap_or_default(),
            )
        });
        return violation
            .as_ref()
            .and_then(from_constraint)
            .unwrap_or_else(|| from_error_object(payload.clone()));
    }

    let unwrapped = match payload.get("message") {
        Some(Value::String(text)) => wrapped_error(text),
        Some(inner @ Value::Object(_)) => inner
            .get("message")
            .and_then(Value::as_str)
            .and_then(wrapped_error),
        _ => None,
    };

    from_error_object(unwrapped.unwrap_or_else(|| payload.clone()))
}

/// Parse a string as JSON, returning `None` when it is not valid JSON.
pub fn try_parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// JavaScript-style truthiness, used where payloads come from JSON.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn from_constraint(violation: &ConstraintViolation) -> Option<NormalizedError> {
    let (status, prefix) = match violation.kind {
        ConstraintKind::Unique => (StatusCode::CONFLICT, "Unique constraint violation error!"),
        ConstraintKind::ForeignKey => (StatusCode::NOT_FOUND, "Related entity not found!"),
        ConstraintKind::NotNull => (
            StatusCode::NOT_FOUND,
            "Not null constraint violation error!",
        ),
        ConstraintKind::Other(_) => return None,
    };
    Some(NormalizedError::text(
        status,
        format!("{} {}", prefix, violation.detail),
    ))
}

/// Rules 2 and 3 for errors whose message may wrap a serialized error.
fn unwrap_message(message: &ErrorMessage) -> Option<NormalizedError> {
    let nested = match message {
        ErrorMessage::Text(text) => wrapped_error(text),
        ErrorMessage::Structured(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .and_then(wrapped_error),
    };
    nested.map(from_error_object)
}

/// `{"error": {...}}` encoded as a string → the inner error value.
fn wrapped_error(text: &str) -> Option<Value> {
    let parsed = try_parse(text)?;
    parsed.get("error").filter(|v| is_truthy(v)).cloned()
}

fn passthrough(error: &SequenceError) -> NormalizedError {
    let status = error.status();
    let message = match error {
        SequenceError::Http { message, .. } => message.clone(),
        SequenceError::Internal(_) | SequenceError::Data(DataError::Unavailable(_)) => {
            ErrorMessage::Text(status.canonical_reason().unwrap_or("Error").to_string())
        }
        other => ErrorMessage::Text(other.to_string()),
    };
    let normalized = NormalizedError::new(status, Some(message), None);
    match error {
        SequenceError::Authentication(_) => normalized.into_sentinel(),
        _ => normalized,
    }
}

/// Build a normalized error from an error object such as
/// `{"statusCode": 422, "message": "..."}`.
fn from_error_object(value: Value) -> NormalizedError {
    match value {
        Value::Object(fields) => {
            let status = fields
                .get("statusCode")
                .or_else(|| fields.get("status"))
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let message = match fields.get("message") {
                None | Some(Value::Null) => None,
                Some(other) => Some(ErrorMessage::from(other.clone())),
            };
            NormalizedError::new(status, message, Some(Value::Object(fields)))
        }
        Value::Null => NormalizedError::new(StatusCode::INTERNAL_SERVER_ERROR, None, None),
        other => NormalizedError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(ErrorMessage::from(other)),
            None,
        ),
    }
}

fn code_of(payload: &Value) -> Option<String> {
    match payload.get("code")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

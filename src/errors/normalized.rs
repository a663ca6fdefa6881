//! The canonical client-facing error.

use axum::http::StatusCode;
use serde_json::{Map, Value};

use crate::errors::normalize::is_truthy;
use crate::errors::ErrorMessage;
use crate::i18n::Translator;

/// Substituted when an error carries no usable message.
pub const FALLBACK_MESSAGE: &str = "Some error occurred. Please try again";

/// A display-ready error. Only the normalizer constructs these, and the
/// localization pass returns a new value rather than mutating.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    status: StatusCode,
    message: Option<ErrorMessage>,
    locale_key: Option<String>,
    details: Option<Value>,
    sentinel: bool,
}

impl NormalizedError {
    pub(crate) fn new(
        status: StatusCode,
        message: Option<ErrorMessage>,
        details: Option<Value>,
    ) -> Self {
        Self {
            status,
            message,
            locale_key: None,
            details,
            sentinel: false,
        }
    }

    /// Mark the message as a machine-matched sentinel that must reach the
    /// client verbatim.
    pub(crate) fn into_sentinel(self) -> Self {
        Self {
            sentinel: true,
            ..self
        }
    }

    pub(crate) fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, Some(ErrorMessage::Text(message.into())), None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> Option<&ErrorMessage> {
        self.message.as_ref()
    }

    /// The untranslated phrase, present once the message has been localized.
    pub fn locale_key(&self) -> Option<&str> {
        self.locale_key.as_deref()
    }

    /// The unwrapped error payload, when the error came from one.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Authentication failures keep their exact sentinel for client matching.
    /// Other errors are translated whatever their status.
    pub fn is_translatable(&self) -> bool {
        !self.sentinel
    }

    /// Translate a plain-text message, or substitute the fallback when there
    /// is no usable message.
    pub fn localize(self, translator: &dyn Translator, locale: &str) -> Self {
        if !self.is_translatable() {
            return self;
        }

        if matches!(&self.message, Some(ErrorMessage::Structured(v)) if is_truthy(v)) {
            return self;
        }

        let phrase = match &self.message {
            Some(ErrorMessage::Text(s)) => Some(s.clone()),
            _ => None,
        };

        match phrase {
            Some(phrase) => {
                let translated = translator.translate(&phrase, locale);
                Self {
                    message: Some(ErrorMessage::Text(translated)),
                    locale_key: Some(phrase),
                    ..self
                }
            }
            None => Self {
                message: Some(ErrorMessage::Text(FALLBACK_MESSAGE.to_string())),
                ..self
            },
        }
    }

    /// Response body: `{"error": {"statusCode", "name", "message", ...}}`.
    pub fn to_body(&self) -> Value {
        let mut error = Map::new();
        match &self.details {
            Some(Value::Object(fields)) => {
                error.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(other) => {
                error.insert("details".to_string(), other.clone());
            }
            None => {}
        }

        error.insert("statusCode".to_string(), Value::from(self.status.as_u16()));
        error.insert("name".to_string(), Value::from(error_name(self.status)));
        match &self.message {
            Some(message) => {
                error.insert("message".to_string(), message.to_value());
            }
            None => {
                error.remove("message");
            }
        }
        if let Some(key) = &self.locale_key {
            error.insert("localeKey".to_string(), Value::from(key.as_str()));
        }

        let mut body = Map::new();
        body.insert("error".to_string(), Value::Object(error));
        Value::Object(body)
    }
}

/// `404` → `NotFoundError`, `409` → `ConflictError`.
fn error_name(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => {
            let mut name: String = reason
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|part| !part.is_empty())
                .collect();
            name.push_str("Error");
            name
        }
        None => "Error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every lookup and returns an uppercased phrase.
    #[derive(Default)]
    struct SpyTranslator {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl Translator for SpyTranslator {
        fn translate(&self, phrase: &str, locale: &str) -> String {
            self.calls
                .lock()
                .unwrap()
                .push((phrase.to_string(), locale.to_string()));
            phrase.to_uppercase()
        }
    }

    #[test]
    fn test_error_name() {
        assert_eq!(error_name(StatusCode::NOT_FOUND), "NotFoundError");
        assert_eq!(error_name(StatusCode::CONFLICT), "ConflictError");
        assert_eq!(error_name(StatusCode::UNAUTHORIZED), "UnauthorizedError");
    }

    #[test]
    fn test_localize_translates_text_and_records_key() {
        let spy = SpyTranslator::default();
        let err = NormalizedError::text(StatusCode::FORBIDDEN, "Not Allowed Access");
        let out = err.localize(&spy, "de");

        assert_eq!(
            out.message(),
            Some(&ErrorMessage::Text("NOT ALLOWED ACCESS".to_string()))
        );
        assert_eq!(out.locale_key(), Some("Not Allowed Access"));
        let calls = spy.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("Not Allowed Access".to_string(), "de".to_string())]);
    }

    #[test]
    fn test_localize_skips_sentinels() {
        let spy = SpyTranslator::default();
        let err = NormalizedError::text(StatusCode::UNAUTHORIZED, "TokenExpired").into_sentinel();
        let out = err.localize(&spy, "en");

        assert_eq!(out.message(), Some(&ErrorMessage::Text("TokenExpired".into())));
        assert!(out.locale_key().is_none());
        assert!(spy.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_localize_translates_unauthorized_status_without_sentinel() {
        let spy = SpyTranslator::default();
        let out = NormalizedError::text(StatusCode::UNAUTHORIZED, "Video session not found")
            .localize(&spy, "en");
        assert_eq!(
            out.message(),
            Some(&ErrorMessage::Text("VIDEO SESSION NOT FOUND".into()))
        );
        assert_eq!(out.locale_key(), Some("Video session not found"));
    }

    #[test]
    fn test_localize_passes_empty_text_to_translator() {
        let spy = SpyTranslator::default();
        let out = NormalizedError::text(StatusCode::BAD_REQUEST, "").localize(&spy, "fr");
        assert_eq!(out.locale_key(), Some(""));
        let calls = spy.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(String::new(), "fr".to_string())]);
    }

    #[test]
    fn test_localize_substitutes_fallback_for_missing_message() {
        let spy = SpyTranslator::default();
        let out = NormalizedError::new(StatusCode::INTERNAL_SERVER_ERROR, None, None)
            .localize(&spy, "en");
        assert_eq!(out.message(), Some(&ErrorMessage::Text(FALLBACK_MESSAGE.into())));

        let out = NormalizedError::new(
            StatusCode::BAD_REQUEST,
            Some(ErrorMessage::Structured(Value::Null)),
            None,
        )
        .localize(&spy, "en");
        assert_eq!(out.message(), Some(&ErrorMessage::Text(FALLBACK_MESSAGE.into())));
        assert!(spy.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_localize_keeps_structured_message() {
        let spy = SpyTranslator::default();
        let structured = json!({"field": "name", "reason": "too long"});
        let out = NormalizedError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(ErrorMessage::Structured(structured.clone())),
            None,
        )
        .localize(&spy, "en");
        assert_eq!(out.message(), Some(&ErrorMessage::Structured(structured)));
        assert!(spy.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_body_merges_details_and_overrides_status() {
        let err = NormalizedError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(ErrorMessage::Text("Invalid".into())),
            Some(json!({"statusCode": 999, "code": "VALIDATION_FAILED"})),
        );
        let body = err.to_body();
        assert_eq!(body["error"]["statusCode"], 422);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"]["name"], "UnprocessableEntityError");
        assert_eq!(body["error"]["message"], "Invalid");
    }
}

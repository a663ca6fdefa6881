//! Request parameter extraction and validation.
//!
//! Each route declares the parameters it expects (`ParamSpec`) and whether
//! it takes a JSON body (`BodySpec`). `ParamParser` turns the raw request
//! into typed `Args` or fails with a `ParamError` before admission runs.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::{header, StatusCode};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::routing::RouteMatch;
use crate::sequence::RequestContext;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        })
    }
}

/// Expected type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        })
    }
}

/// Declaration of one route parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    /// Path parameters are always required.
    pub fn path(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            location: ParamLocation::Path,
            kind,
            required: true,
        }
    }

    pub fn query(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            location: ParamLocation::Query,
            kind,
            required: false,
        }
    }

    /// Header names are matched case-insensitively.
    pub fn header(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            location: ParamLocation::Header,
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Declared request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodySpec {
    #[default]
    None,
    Json {
        required: bool,
    },
}

/// Parameter parsing failures. All are client errors.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Required parameter {name} is missing!")]
    Missing {
        name: String,
        location: ParamLocation,
    },

    #[error("Invalid data {value:?} for parameter {name}! Expected a {expected}.")]
    Invalid {
        name: String,
        value: String,
        expected: ParamKind,
    },

    #[error("Request body is required")]
    MissingBody,

    #[error("Malformed JSON request body: {0}")]
    MalformedBody(String),

    #[error("Content-type {0} is not supported.")]
    UnsupportedMediaType(String),

    #[error("Request body is too large ({limit} bytes allowed)")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

impl ParamError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Parsed arguments handed to the route handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<String, Value>,
    body: Option<Value>,
}

impl Args {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserialize the JSON body into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ParamError> {
        let body = self.body.clone().ok_or(ParamError::MissingBody)?;
        serde_json::from_value(body).map_err(|e| ParamError::MalformedBody(e.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Extracts and validates `Args` for a matched route.
#[derive(Debug, Clone)]
pub struct ParamParser {
    body_limit: usize,
}

impl Default for ParamParser {
    fn default() -> Self {
        Self::new(2 * 1024 * 1024)
    }
}

impl ParamParser {
    pub fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }

    pub async fn parse(
        &self,
        ctx: &mut RequestContext,
        matched: &RouteMatch,
    ) -> Result<Args, ParamError> {
        let route = matched.route();
        let query: Vec<(String, String)> = ctx
            .uri()
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let mut args = Args::default();
        for spec in route.params() {
            let raw = match spec.location {
                ParamLocation::Path => matched
                    .path_param(&spec.name)
                    .map(|raw| decode_segment(&spec.name, raw, spec.kind))
                    .transpose()?,
                ParamLocation::Query => query
                    .iter()
                    .find(|(k, _)| *k == spec.name)
                    .map(|(_, v)| v.clone()),
                ParamLocation::Header => ctx
                    .headers()
                    .get(spec.name.as_str())
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            };

            match raw {
                Some(raw) => {
                    let value = coerce(&spec.name, &raw, spec.kind)?;
                    args.insert(spec.name.clone(), value);
                }
                None if spec.required => {
                    return Err(ParamError::Missing {
                        name: spec.name.clone(),
                        location: spec.location,
                    })
                }
                None => {}
            }
        }

        if let BodySpec::Json { required } = *route.body() {
            if let Some(body) = self.parse_body(ctx, required).await? {
                args = args.with_body(body);
            }
        }

        Ok(args)
    }

    async fn parse_body(
        &self,
        ctx: &mut RequestContext,
        required: bool,
    ) -> Result<Option<Value>, ParamError> {
        if let Some(content_type) = ctx
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_json(content_type) {
                return Err(ParamError::UnsupportedMediaType(content_type.to_string()));
            }
        }

        let bytes = ctx.body_bytes(self.body_limit).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return if required {
                Err(ParamError::MissingBody)
            } else {
                Ok(None)
            };
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ParamError::MalformedBody(e.to_string()))
    }
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// Percent-decode one captured path segment.
fn decode_segment(name: &str, raw: &str, kind: ParamKind) -> Result<String, ParamError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParamError::Invalid {
            name: name.to_string(),
            value: raw.to_string(),
            expected: kind,
        })
}

fn coerce(name: &str, raw: &str, kind: ParamKind) -> Result<Value, ParamError> {
    let invalid = || ParamError::Invalid {
        name: name.to_string(),
        value: raw.to_string(),
        expected: kind,
    };

    match kind {
        ParamKind::String => Ok(Value::String(raw.to_string())),
        ParamKind::Integer => raw.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
        ParamKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        ParamKind::Boolean => match raw.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
    }
}

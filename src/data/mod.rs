//! Data-access error boundary.
//!
//! Repositories live outside the gateway. What crosses the boundary is a
//! tagged error so the normalizer can pattern-match a closed set of
//! variants instead of probing driver-specific fields.
//!
//! # Data Flow
//! ```text
//! repository failure (driver error, SQLSTATE code)
//!     → DataError::Constraint(ConstraintViolation) | NotFound | Unavailable
//!     → SequenceError::Data
//!     → errors::normalize (constraint rules)
//! ```

use thiserror::Error;

/// SQLSTATE code for a unique index violation.
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE code for a foreign key violation.
pub const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE code for a not-null violation.
pub const SQLSTATE_NOT_NULL_VIOLATION: &str = "23502";

/// Kind of relational constraint that was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    /// Any other code reported alongside table/detail.
    Other(String),
}

impl ConstraintKind {
    /// Classify a SQLSTATE code.
    pub fn from_sqlstate(code: &str) -> Self {
        match code {
            SQLSTATE_UNIQUE_VIOLATION => Self::Unique,
            SQLSTATE_FOREIGN_KEY_VIOLATION => Self::ForeignKey,
            SQLSTATE_NOT_NULL_VIOLATION => Self::NotNull,
            other => Self::Other(other.to_string()),
        }
    }

    /// The SQLSTATE code this kind corresponds to.
    pub fn code(&self) -> &str {
        match self {
            Self::Unique => SQLSTATE_UNIQUE_VIOLATION,
            Self::ForeignKey => SQLSTATE_FOREIGN_KEY_VIOLATION,
            Self::NotNull => SQLSTATE_NOT_NULL_VIOLATION,
            Self::Other(code) => code,
        }
    }
}

/// A constraint violation reported by the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    /// Table the constraint belongs to.
    pub table: String,
    /// Driver-provided detail line, e.g. `Key (key)=(beta) already exists.`
    pub detail: String,
    /// Driver-provided primary message.
    pub message: String,
}

impl ConstraintViolation {
    pub fn new(
        kind: ConstraintKind,
        table: impl Into<String>,
        detail: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            detail: detail.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the data-access layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A relational constraint rejected the write.
    #[error("{}", .0.message)]
    Constraint(ConstraintViolation),

    /// The requested entity does not exist.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// The store could not be reached or failed internally.
    #[error("Data store unavailable: {0}")]
    Unavailable(String),
}

impl DataError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

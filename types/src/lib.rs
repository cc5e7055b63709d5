//! Shared domain types for the umroh back-office.
//!
//! This crate contains pure types with no IO and no async. The query executor,
//! the REST source and the CLI all speak in terms of these.

mod toast;

pub use toast::{Toast, ToastVariant};

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Query failure indicator
// ============================================================================

/// A failure returned (not raised) by a data operation.
///
/// Mirrors the JSON error body of the hosted database API, where every field
/// is optional. Only `message` is used for display; the rest is kept for logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// An error that carries no message at all.
    #[must_use]
    pub fn opaque() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The message, if present and non-empty. Whitespace is kept as sent.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.message(), self.code.as_deref()) {
            (Some(message), Some(code)) => write!(f, "{message} ({code})"),
            (Some(message), None) => f.write_str(message),
            (None, Some(code)) => write!(f, "query failed ({code})"),
            (None, None) => f.write_str("query failed"),
        }
    }
}

impl std::error::Error for QueryError {}

// ============================================================================
// Operation response
// ============================================================================

/// The `(value, failure)` pair a data operation resolves to.
///
/// Exactly one side is meaningful: a present `error` marks the attempt as
/// failed regardless of `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse<T> {
    pub data: Option<T>,
    pub error: Option<QueryError>,
}

impl<T> QueryResponse<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// A successful response with no payload.
    pub const fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub const fn err(error: QueryError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// Split into the success value or the failure indicator.
    pub fn into_result(self) -> Result<Option<T>, QueryError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

//! Shared error model.
//!
//! `CoreError` covers deterministic failures of the pure building blocks in
//! this crate. `ServerErrorBody` is what the backends send on failure and
//! `ApiErrorBody` is the single normalized shape handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used by the pure building blocks.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value failed validation (e.g. a zero page size).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Field-level validation failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<serde_json::Value>,
}

/// Error payload as produced by the backend exception handlers.
///
/// Every field is optional: gateways and proxies answer with partial or empty
/// bodies often enough that decoding must never fail on a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerErrorBody {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ServerErrorBody {
    /// The server-provided message, if it carries any text.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// Normalized error handed upstream for display: `{status, message, error, timestamp}`.
///
/// `status` is `0` for failures that never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ApiErrorBody {
    pub fn new(
        status: u16,
        message: impl Into<String>,
        error: Option<serde_json::Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            error,
            timestamp,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }
}

impl core::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

//! Domain error taxonomy shared by the stores, the authenticator and the HTTP layer.

use serde_json::Value;
use thiserror::Error;

/// Errors raised by domain operations.
///
/// Every variant except [`DomainError::Internal`] is terminal for the request and
/// must be corrected by the caller.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Missing or malformed input, including identifier format.
    #[error("validation error: {message}")]
    Validation {
        message: String,
        details: Vec<Value>,
    },

    /// A uniqueness constraint would be violated.
    #[error("conflict: {message}")]
    Conflict { message: String, field: String },

    /// No matching live record.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Authenticated, but not the owner of the record.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Missing, malformed or expired credential.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Validation failure carrying one `{"field", "error"}` entry per offending field.
    pub fn invalid_fields(message: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let details = fields
            .iter()
            .map(|(field, error)| serde_json::json!({ "field": field, "error": error }))
            .collect();
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            field: field.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used in logs and error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Auth { .. } => "unauthorized",
            Self::Internal(_) => "internal_error",
        }
    }
}

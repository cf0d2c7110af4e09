// src/utils/error.rs
#![allow(dead_code)]
use std::time::Duration;
use thiserror::Error;

// Define specific error types for different parts of the application

/// Sub-kinds of transient API failures. Each has its own backoff window,
/// calibrated to the service's observed reset times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// Quota or rate limiting; clears on a ~30s window.
    Quota,
    /// RESOURCE_EXHAUSTED without a quota/rate hint; clears slower.
    Resource,
    /// Anything else that might resolve on its own (network blips, 5xx).
    Generic,
}

/// Failures surfaced by a single Gemini call. Auth and Billing never
/// self-resolve by waiting; everything else is worth retrying.
#[derive(Error, Debug, Clone)]
pub enum GeminiError {
    #[error("Gemini returned an empty response")]
    EmptyResponse,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Billing problem: {0}")]
    Billing(String),

    #[error("Transient API error: {message}")]
    Transient {
        kind: TransientKind,
        message: String,
    },
}

impl GeminiError {
    /// Classifies a raw API/transport error text into the failure taxonomy.
    ///
    /// The remote service does not report these cases through status codes
    /// consistently, so classification matches case-insensitive substrings of
    /// the combined status/body text.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("quota") || lower.contains("rate") {
            GeminiError::Transient {
                kind: TransientKind::Quota,
                message,
            }
        } else if lower.contains("billing") {
            GeminiError::Billing(message)
        } else if lower.contains("api_key") || lower.contains("auth") {
            GeminiError::Auth(message)
        } else if lower.contains("resource_exhausted") {
            GeminiError::Transient {
                kind: TransientKind::Resource,
                message,
            }
        } else {
            GeminiError::Transient {
                kind: TransientKind::Generic,
                message,
            }
        }
    }
}

/// Failure of one extraction attempt: either the API call itself, or one of
/// the local stages that turn the raw response into a typed record.
#[derive(Error, Debug, Clone)]
pub enum AttemptError {
    #[error("{0}")]
    Api(#[from] GeminiError),

    #[error("Gemini response was empty after cleaning")]
    EmptyAfterClean,

    #[error("Invalid JSON from Gemini: {message}; response excerpt: {excerpt}")]
    InvalidJson { message: String, excerpt: String },

    #[error("Data validation error: {0}")]
    SchemaViolation(String),
}

impl AttemptError {
    /// Backoff before the next attempt, or `None` when the failure is
    /// terminal. Waits are flat per kind, not exponential.
    pub fn retry_after(&self, attempt: u32) -> Option<Duration> {
        match self {
            AttemptError::Api(GeminiError::Auth(_)) | AttemptError::Api(GeminiError::Billing(_)) => {
                None
            }
            AttemptError::Api(GeminiError::Transient {
                kind: TransientKind::Quota,
                ..
            }) => Some(Duration::from_secs(30)),
            AttemptError::Api(GeminiError::Transient {
                kind: TransientKind::Resource,
                ..
            }) => Some(Duration::from_secs(60)),
            // Empty or malformed output is usually a rate-limit symptom or a
            // truncated generation; a short attempt-scaled wait is enough.
            _ => Some(Duration::from_secs(5 + u64::from(attempt) * 2)),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}

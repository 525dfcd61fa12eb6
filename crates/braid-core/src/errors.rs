//! Error hierarchy for the Braid engine.
//!
//! Built on [`thiserror`]. The engine is deliberately hard to fail: lookup
//! misses return empty values and eviction no-ops return zero, so only two
//! things are errors at all —
//!
//! - [`EngineError::Validation`]: required boundary input was missing
//! - [`EngineError::Serialization`]: a payload could not be snapshotted
//!
//! Engine methods trace failures at debug level and return them; error-level
//! logging is the caller's decision.

use thiserror::Error;

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Required boundary input was missing or empty.
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// Name of the offending input field.
        field: String,
        /// Human-readable message.
        message: String,
    },

    /// A payload could not be serialized or deep-copied.
    #[error("Serialization failed: {reason}")]
    Serialization {
        /// Human-readable reason.
        reason: String,
    },
}

impl EngineError {
    /// Create a validation error for a named input field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

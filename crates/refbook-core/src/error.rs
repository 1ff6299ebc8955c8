//! Unified error handling for refbook
//!
//! This module provides the error type shared by every refbook store,
//! covering malformed input, shape problems during ingestion, cache
//! serialization failures and misuse of the single/multi-language modes.

use thiserror::Error;

/// Unified error type for all refbook operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== Input Errors ====================

    /// JSON input could not be decoded
    #[error("Malformed input: {0}")]
    Decode(#[from] serde_json::Error),

    /// Input is not the kind of collection the operation expects
    #[error("Shape mismatch: {message}")]
    ShapeMismatch {
        message: String,
    },

    /// Array elements disagree on the type of their `name` field
    #[error("Heterogeneous shape: name column has different types")]
    HeterogeneousShape,

    /// Named field is absent from the record shape
    #[error("Attribute {attribute} not found")]
    MissingAttribute {
        attribute: String,
    },

    /// Field exists but holds a value of an unusable kind
    #[error("Invalid field {field}: {message}")]
    InvalidField {
        field: String,
        message: String,
    },

    // ==================== Cache Errors ====================

    /// Content could not be hashed or encoded
    #[error("Serialization failed: {message}")]
    Serialization {
        message: String,
    },

    // ==================== Usage Errors ====================

    /// Single-language write attempted while several languages are loaded
    #[error("{operation} called on a multi-language book")]
    ModeConflict {
        operation: &'static str,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            message: message.into(),
        }
    }

    /// Create a missing attribute error
    pub fn missing_attribute(attribute: impl Into<String>) -> Self {
        Error::MissingAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization {
            message: message.into(),
        }
    }

    /// Strip any context wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error was caused by bad caller input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.root(),
            Error::Decode(_)
                | Error::ShapeMismatch { .. }
                | Error::HeterogeneousShape
                | Error::MissingAttribute { .. }
                | Error::InvalidField { .. }
        )
    }

    /// Check if this error signals caller misuse rather than bad data
    ///
    /// Callers that treat mode conflicts as fatal can `panic!` on these.
    pub fn is_programming_error(&self) -> bool {
        matches!(self.root(), Error::ModeConflict { .. })
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

//! # Error Types
//!
//! Error types for the consult-sweeper worker using `thiserror`.

use crate::secrets::SecretsError;

/// Custom result type for worker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the worker
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or malformed environment values)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backend procedure or object storage failures
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Secrets accessor failures
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failures talking to the hosted backend (procedures and object storage).
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("Backend unreachable during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status} during {operation}: {body}")]
    Status { operation: String, status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Unexpected backend response during {operation}: {message}")]
    Decode { operation: String, message: String },
}

impl BackendError {
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport { operation: operation.into(), message: message.into() }
    }

    pub fn status(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status { operation: operation.into(), status, body: body.into() }
    }

    pub fn decode(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode { operation: operation.into(), message: message.into() }
    }

    /// Name of the backend operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            BackendError::Transport { operation, .. }
            | BackendError::Status { operation, .. }
            | BackendError::Decode { operation, .. } => operation,
        }
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether this error must stop the process at startup.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Config { .. } | Error::Validation { .. } => true,
            Error::Secrets(e) => matches!(e, SecretsError::ConfigError { .. }),
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        // Nested sections only surface through the Display impl
        let message = if message.is_empty() { errors.to_string() } else { message };

        Self::validation(format!("Validation failed: {}", message))
    }
}

//! Error types for the secrets accessor.

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while loading, holding or reading secrets.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Requested name is not on the accessor's whitelist.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// A required secret or the memory key is missing or malformed.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Sealing or opening an in-memory secret failed.
    #[error("Encryption error: {message}")]
    Encryption { message: String },

    /// The secret source (environment, vault) failed.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Rotation is an extension point only.
    #[error("Rotation is not supported for secret '{key}'")]
    RotationUnsupported { key: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Create an encryption error.
    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption { message: message.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a rotation unsupported error.
    pub fn rotation_unsupported(key: impl Into<String>) -> Self {
        Self::RotationUnsupported { key: key.into() }
    }
}

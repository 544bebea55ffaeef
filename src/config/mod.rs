//! # Configuration Management
//!
//! All configuration comes from environment variables (optionally seeded
//! from a `.env` file by the entry point). Missing required values are
//! reported as [`crate::Error::Config`] and stop the process at startup.

pub mod settings;

pub use settings::{
    AppConfig, BackendConfig, ObservabilityConfig, RetentionConfig, SecretSourceKind,
    SecretsConfig, ENV_BACKEND_KEY, ENV_BACKEND_URL,
};

//! Secrets accessor for AI provider API keys.
//!
//! A small whitelist of named secrets is read once from a [`SecretSource`]
//! (environment variables by default, HashiCorp Vault optionally), sealed with
//! AES-256-GCM under the process memory key, and decrypted on each read.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use consult_sweeper::secrets::{EnvSecretSource, MemoryCipher, SecretsAccessor};
//!
//! let accessor = SecretsAccessor::new(
//!     Arc::new(EnvSecretSource::new()),
//!     MemoryCipher::from_base64(&memory_key)?,
//!     ["OPENAI_API_KEY"],
//! );
//! accessor.initialize().await?;
//! let key = accessor.get("OPENAI_API_KEY").await?;
//! // ... use key.expose_secret() ...
//! accessor.cleanup().await;
//! ```
//!
//! Encryption here guards against casual memory inspection (core dumps, heap
//! snapshots), not persistence: nothing is ever written to disk.

pub mod accessor;
pub mod encryption;
pub mod error;
pub mod source;
pub mod types;
pub mod vault;

pub use accessor::SecretsAccessor;
pub use encryption::{EncryptedSecret, MemoryCipher, MEMORY_KEY_ENV};
pub use error::{Result, SecretsError};
pub use source::{EnvSecretSource, SecretSource};
pub use types::SecretString;
pub use vault::{VaultSecretSource, VaultSourceConfig};

//! # Hosted Backend
//!
//! The sweeper talks to two collaborators: a remote procedure that lists
//! expired audio and an object store that removes blobs in bulk. Both are
//! traits so cycles can be driven against in-memory fakes; the production
//! implementation of both is [`RestBackendClient`].

use async_trait::async_trait;

use crate::errors::BackendError;

pub mod client;
pub mod types;

pub use client::RestBackendClient;
pub use types::{ExpiredAudioListing, RetentionCandidate};

/// Lists audio objects older than the retention threshold.
#[async_trait]
pub trait RetentionBackend: Send + Sync {
    async fn list_expired_audio(&self) -> Result<ExpiredAudioListing, BackendError>;
}

/// Bulk object removal.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Remove `paths` from `bucket` in a single request. Individual object
    /// outcomes are not reported.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError>;
}

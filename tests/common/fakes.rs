//! Scripted in-memory implementations of the backend traits.

use async_trait::async_trait;
use consult_sweeper::backend::{ExpiredAudioListing, ObjectStorage, RetentionBackend};
use consult_sweeper::BackendError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type ListingResponse = Result<ExpiredAudioListing, BackendError>;

/// Listing procedure returning queued responses in order. Once the queue is
/// drained, every call returns an empty listing.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<ListingResponse>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every listing call until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    pub fn with_paths(self, paths: &[&str]) -> Self {
        self.push(Ok(ExpiredAudioListing::from_paths(paths.iter().copied())))
    }

    pub fn with_listing(self, listing: ExpiredAudioListing) -> Self {
        self.push(Ok(listing))
    }

    pub fn with_network_error(self) -> Self {
        self.push(Err(BackendError::transport("list_expired_audio", "connection refused")))
    }

    fn push(self, response: ListingResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetentionBackend for ScriptedBackend {
    async fn list_expired_audio(&self) -> ListingResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ExpiredAudioListing::default()))
    }
}

/// Object storage recording every bulk remove.
#[derive(Default)]
pub struct RecordingStorage {
    removed: Mutex<Vec<(String, Vec<String>)>>,
    fail: bool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        self.removed.lock().unwrap().push((bucket.to_string(), paths.to_vec()));
        if self.fail {
            return Err(BackendError::status("remove", 500, "storage unavailable"));
        }
        Ok(())
    }
}

//! Audio retention sweep cycle.
//!
//! A cycle asks the backend for audio past the retention threshold and
//! removes every listed object in one bulk request. Failures are logged and
//! reported through [`SweepResult`]; `run_once` never returns an error and
//! never panics on backend failures.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::backend::{ObjectStorage, RetentionBackend};
use crate::config::RetentionConfig;
use crate::errors::BackendError;
use crate::observability::metrics;
use crate::sweep_span;

/// Outcome of one sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    /// Nothing had expired.
    NoOp,
    /// The bulk delete was accepted.
    Deleted,
    /// Candidates were listed but deletion is disabled.
    DryRun,
    /// Listing or deletion failed.
    Failed,
    /// Another cycle was still running.
    Skipped,
}

impl SweepStatus {
    /// Metric label for this outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepStatus::NoOp => "noop",
            SweepStatus::Deleted => "deleted",
            SweepStatus::DryRun => "dry_run",
            SweepStatus::Failed => "failed",
            SweepStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SweepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend call that failed during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStage {
    List,
    Delete,
}

impl SweepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepStage::List => "list",
            SweepStage::Delete => "delete",
        }
    }
}

/// Failure recorded on a [`SweepResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub stage: SweepStage,
    pub message: String,
}

/// Result of a single sweep cycle.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub sweep_id: Uuid,
    pub status: SweepStatus,
    /// Objects submitted for deletion (zero unless `status` is `Deleted`).
    pub deleted_count: usize,
    /// Paths submitted for deletion, or the paths that would have been in
    /// dry-run mode. Listing order is preserved.
    pub paths: Vec<String>,
    pub error: Option<SweepFailure>,
    pub duration: Duration,
}

impl SweepResult {
    fn new(sweep_id: Uuid, status: SweepStatus) -> Self {
        Self {
            sweep_id,
            status,
            deleted_count: 0,
            paths: Vec::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    fn failed(sweep_id: Uuid, stage: SweepStage, error: &BackendError) -> Self {
        Self {
            error: Some(SweepFailure { stage, message: error.to_string() }),
            ..Self::new(sweep_id, SweepStatus::Failed)
        }
    }

    /// True unless the cycle failed.
    pub fn is_success(&self) -> bool {
        self.status != SweepStatus::Failed
    }

    pub fn has_deletions(&self) -> bool {
        self.deleted_count > 0
    }
}

/// Counters kept across cycles for operators.
#[derive(Debug, Default)]
pub struct SweepStats {
    cycles: AtomicU64,
    objects_deleted: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`SweepStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStatsSnapshot {
    pub cycles: u64,
    pub objects_deleted: u64,
    pub failures: u64,
    pub skipped: u64,
}

impl SweepStats {
    fn record(&self, result: &SweepResult) {
        match result.status {
            SweepStatus::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            SweepStatus::Failed => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.objects_deleted.fetch_add(result.deleted_count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SweepStatsSnapshot {
        SweepStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            objects_deleted: self.objects_deleted.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Enforces the audio retention policy against the backend.
pub struct AudioRetentionSweeper {
    backend: Arc<dyn RetentionBackend>,
    storage: Arc<dyn ObjectStorage>,
    config: RetentionConfig,
    running: Mutex<()>,
    stats: SweepStats,
}

impl AudioRetentionSweeper {
    pub fn new(
        backend: Arc<dyn RetentionBackend>,
        storage: Arc<dyn ObjectStorage>,
        config: RetentionConfig,
    ) -> Self {
        Self { backend, storage, config, running: Mutex::new(()), stats: SweepStats::default() }
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    pub fn stats(&self) -> SweepStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one sweep cycle.
    ///
    /// At most one cycle runs at a time; a call made while another is in
    /// flight returns immediately with [`SweepStatus::Skipped`].
    pub async fn run_once(&self) -> SweepResult {
        let started = Instant::now();
        let sweep_id = Uuid::new_v4();

        let mut result = match self.running.try_lock() {
            Ok(_running) => {
                let span = sweep_span!(self.config.bucket, id = sweep_id, dry_run = self.config.dry_run);
                self.sweep(sweep_id).instrument(span).await
            }
            Err(_) => {
                warn!(
                    bucket = %self.config.bucket,
                    "⏭️  Previous retention sweep still running, skipping this cycle"
                );
                SweepResult::new(sweep_id, SweepStatus::Skipped)
            }
        };

        result.duration = started.elapsed();
        self.stats.record(&result);
        metrics::record_sweep(result.status.as_str(), result.duration.as_secs_f64()).await;

        result
    }

    /// Oldest creation time still retained as of `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::seconds(self.config.threshold().as_secs() as i64)
    }

    async fn sweep(&self, sweep_id: Uuid) -> SweepResult {
        let cutoff = self.cutoff(Utc::now());
        info!(
            threshold_hours = self.config.threshold_hours,
            cutoff = %cutoff.to_rfc3339(),
            "🧹 Starting audio retention sweep"
        );

        let listing = match self.backend.list_expired_audio().await {
            Ok(listing) => listing,
            Err(e) => {
                error!(error = %e, "❌ Failed to list expired audio");
                metrics::record_sweep_error(SweepStage::List.as_str()).await;
                return SweepResult::failed(sweep_id, SweepStage::List, &e);
            }
        };

        if listing.is_empty() {
            info!("💤 No expired audio files to delete");
            return SweepResult::new(sweep_id, SweepStatus::NoOp);
        }

        let paths = listing.paths();
        if listing.deleted_count != paths.len() as u64 {
            debug!(
                reported = listing.deleted_count,
                listed = paths.len(),
                "Listing count differs from returned files; deleting the listed files"
            );
        }

        if self.config.dry_run {
            info!(
                count = paths.len(),
                "DRY RUN: would delete {} expired audio files",
                paths.len()
            );
            return SweepResult { paths, ..SweepResult::new(sweep_id, SweepStatus::DryRun) };
        }

        if let Err(e) = self.storage.remove(&self.config.bucket, &paths).await {
            error!(error = %e, count = paths.len(), "❌ Failed to delete expired audio files");
            metrics::record_sweep_error(SweepStage::Delete.as_str()).await;
            return SweepResult { paths, ..SweepResult::failed(sweep_id, SweepStage::Delete, &e) };
        }

        info!(count = paths.len(), "✅ Deleted {} expired audio files", paths.len());
        metrics::record_objects_deleted(&self.config.bucket, paths.len()).await;

        SweepResult {
            deleted_count: paths.len(),
            paths,
            ..SweepResult::new(sweep_id, SweepStatus::Deleted)
        }
    }
}

impl fmt::Debug for AudioRetentionSweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioRetentionSweeper")
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

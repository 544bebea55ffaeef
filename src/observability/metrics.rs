//! # Metrics Collection
//!
//! Prometheus metrics for sweep outcomes and the secrets accessor. Recording
//! goes through a global [`MetricsRecorder`] that only exists once
//! [`init_metrics`] has installed the exporter; before that every `record_*`
//! call is a no-op.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sweep outcome labels, in the order they are pre-registered
pub const SWEEP_OUTCOMES: &[&str] = &["noop", "deleted", "dry_run", "failed", "skipped"];

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record a finished sweep cycle
    pub fn record_sweep(&self, outcome: &str, duration: f64) {
        counter!("retention_sweeps_total", "outcome" => outcome.to_string()).increment(1);
        histogram!("retention_sweep_duration_seconds").record(duration);
    }

    /// Record objects submitted for deletion in one bulk request
    pub fn record_objects_deleted(&self, bucket: &str, count: usize) {
        counter!("retention_objects_deleted_total", "bucket" => bucket.to_string())
            .increment(count as u64);
    }

    /// Record a backend failure by stage (`list` or `delete`)
    pub fn record_sweep_error(&self, stage: &str) {
        counter!("retention_sweep_errors_total", "stage" => stage.to_string()).increment(1);
    }

    /// Update the number of secrets held sealed in memory
    pub fn set_secrets_loaded(&self, count: usize) {
        gauge!("secrets_loaded").set(count as f64);
    }

    /// Register baseline metrics so Prometheus exports appear before events occur.
    pub fn register_retention_metrics(&self) {
        describe_counter!(
            "retention_sweeps_total",
            Unit::Count,
            "Audio retention sweep cycles grouped by outcome"
        );
        describe_counter!(
            "retention_objects_deleted_total",
            Unit::Count,
            "Audio objects submitted for bulk deletion"
        );
        describe_counter!(
            "retention_sweep_errors_total",
            Unit::Count,
            "Backend failures during sweeps grouped by stage"
        );
        describe_histogram!(
            "retention_sweep_duration_seconds",
            Unit::Seconds,
            "Wall-clock duration of a sweep cycle"
        );
        describe_gauge!("secrets_loaded", Unit::Count, "Secrets currently sealed in memory");

        for outcome in SWEEP_OUTCOMES {
            counter!("retention_sweeps_total", "outcome" => *outcome).absolute(0);
        }
        counter!("retention_sweep_errors_total", "stage" => "list").absolute(0);
        counter!("retention_sweep_errors_total", "stage" => "delete").absolute(0);
        gauge!("secrets_loaded").set(0.0);
    }
}

/// Global metrics recorder instance
static METRICS: once_cell::sync::Lazy<Arc<RwLock<Option<MetricsRecorder>>>> =
    once_cell::sync::Lazy::new(|| Arc::new(RwLock::new(None)));

/// Initialize metrics collection and Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    let recorder = MetricsRecorder::new();
    {
        let mut metrics = METRICS.write().await;
        *metrics = Some(recorder.clone());
    }

    recorder.register_retention_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "📈 Metrics collection initialized"
    );

    Ok(())
}

/// Get the global metrics recorder
pub async fn get_metrics() -> Option<MetricsRecorder> {
    METRICS.read().await.clone()
}

/// Record a finished sweep cycle via the global recorder
pub async fn record_sweep(outcome: &str, duration: f64) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_sweep(outcome, duration);
    }
}

/// Record deleted objects via the global recorder
pub async fn record_objects_deleted(bucket: &str, count: usize) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_objects_deleted(bucket, count);
    }
}

/// Record a sweep backend failure via the global recorder
pub async fn record_sweep_error(stage: &str) {
    if let Some(metrics) = get_metrics().await {
        metrics.record_sweep_error(stage);
    }
}

/// Update the sealed secrets gauge via the global recorder
pub async fn set_secrets_loaded(count: usize) {
    if let Some(metrics) = get_metrics().await {
        metrics.set_secrets_loaded(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording_without_exporter() {
        let recorder = MetricsRecorder::new();
        recorder.register_retention_metrics();
        recorder.record_sweep("deleted", 0.25);
        recorder.record_objects_deleted("consultation-audio", 3);
        recorder.record_sweep_error("list");
        recorder.set_secrets_loaded(2);
    }

    #[tokio::test]
    async fn test_global_helpers_are_noops_before_init() {
        record_sweep("noop", 0.01).await;
        record_objects_deleted("consultation-audio", 1).await;
        record_sweep_error("delete").await;
        set_secrets_loaded(1).await;
    }

    #[tokio::test]
    async fn test_init_metrics_disabled() {
        let config = ObservabilityConfig { enable_metrics: false, ..Default::default() };
        assert!(init_metrics(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_init_metrics_no_port() {
        let config =
            ObservabilityConfig { enable_metrics: true, metrics_port: 0, ..Default::default() };
        assert!(init_metrics(&config).await.is_ok());
        assert!(get_metrics().await.is_none());
    }
}

//! # Structured Logging
//!
//! `tracing` subscriber setup plus span helpers for sweep cycles.
//!
//! `RUST_LOG` takes precedence over the configured log level. With
//! `LOG_FORMAT=json` every event is emitted as one JSON object per line;
//! otherwise a human-readable format is used.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Create a tracing span for one sweep cycle.
///
/// ```rust,ignore
/// let span = sweep_span!("consultation-audio");
/// let span = sweep_span!("consultation-audio", id = sweep_id, dry_run = true);
/// ```
#[macro_export]
macro_rules! sweep_span {
    ($bucket:expr) => {
        $crate::sweep_span!($bucket, id = uuid::Uuid::new_v4())
    };
    ($bucket:expr, id = $id:expr) => {
        tracing::info_span!("retention_sweep", bucket = %$bucket, sweep_id = %$id)
    };
    ($bucket:expr, id = $id:expr, $($field:tt)*) => {
        tracing::info_span!(
            "retention_sweep",
            bucket = %$bucket,
            sweep_id = %$id,
            $($field)*
        )
    };
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored (integration tests install their own).
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid LOG_LEVEL '{}': {}", config.log_level, e))
        })?,
    };

    let result = if config.json_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false)).try_init()
    };

    if result.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
    }

    Ok(())
}

/// Log effective configuration at startup. Keys are never printed.
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        backend_url = %config.backend.url,
        bucket = %config.retention.bucket,
        listing_procedure = %config.retention.listing_procedure,
        threshold_hours = config.retention.threshold_hours,
        interval_minutes = config.retention.interval_minutes,
        dry_run = config.retention.dry_run,
        secrets = config.secrets.required.len(),
        secrets_source = ?config.secrets.source,
        metrics_enabled = config.observability.enable_metrics,
        "⚙️  consult-sweeper configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = sweep_span!("consultation-audio");
        let id = uuid::Uuid::new_v4();
        let _span = sweep_span!("consultation-audio", id = id);
        let _span = sweep_span!("consultation-audio", id = id, dry_run = true);
    }

    #[test]
    fn test_init_logging_twice_is_ok() {
        let config = ObservabilityConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&ObservabilityConfig { json_logging: true, ..config }).is_ok());
    }

    #[test]
    fn test_log_config_info() {
        log_config_info(&crate::config::AppConfig::default());
    }
}

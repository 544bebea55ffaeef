//! Startup wiring for the worker
//!
//! Builds the long-lived components from a validated [`AppConfig`]:
//! - the secrets accessor (when any secret is required)
//! - the retention sweeper and its REST client
//! - the shutdown signal future

use crate::backend::RestBackendClient;
use crate::config::{AppConfig, SecretSourceKind, SecretsConfig};
use crate::errors::{Error, Result};
use crate::retention::AudioRetentionSweeper;
use crate::secrets::{
    EnvSecretSource, MemoryCipher, SecretSource, SecretsAccessor, VaultSecretSource,
};
use std::sync::Arc;
use tracing::info;

/// Build the secrets accessor. Returns `None` when no secrets are required.
pub fn build_secrets_accessor(config: &SecretsConfig) -> Result<Option<SecretsAccessor>> {
    if !config.is_enabled() {
        info!("No secrets required, secrets accessor disabled");
        return Ok(None);
    }

    let memory_key = config.memory_key.as_ref().ok_or_else(|| {
        Error::config(format!("{} is not set", crate::secrets::MEMORY_KEY_ENV))
    })?;
    let cipher = MemoryCipher::from_base64(memory_key)?;

    let source: Arc<dyn SecretSource> = match config.source {
        SecretSourceKind::Env => Arc::new(EnvSecretSource::new()),
        SecretSourceKind::Vault => Arc::new(VaultSecretSource::new(&config.vault_source_config())?),
    };

    info!(
        source = source.describe(),
        secrets = config.required.len(),
        "Secrets accessor configured"
    );

    Ok(Some(SecretsAccessor::new(source, cipher, config.required.iter().cloned())))
}

/// Build the retention sweeper backed by the REST client.
pub fn build_sweeper(config: &AppConfig) -> Result<Arc<AudioRetentionSweeper>> {
    let client =
        Arc::new(RestBackendClient::new(&config.backend, config.retention.listing_procedure.clone())?);

    Ok(Arc::new(AudioRetentionSweeper::new(client.clone(), client, config.retention.clone())))
}

/// Resolves on ctrl-c, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutdown signal received (ctrl-c)"),
        _ = terminate => info!("Shutdown signal received (SIGTERM)"),
    }
}

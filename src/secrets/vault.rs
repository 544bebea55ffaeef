//! HashiCorp Vault secret source.
//!
//! All whitelisted secrets live in one KV v2 entry, one field per name:
//!
//! ```bash
//! vault kv put secret/consult-sweeper OPENAI_API_KEY=sk-...
//! ```
//!
//! The entry is read on every `load`, which only happens while the accessor
//! initializes.

use async_trait::async_trait;
use std::collections::HashMap;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::error::{Result, SecretsError};
use super::source::SecretSource;
use super::types::SecretString;

/// Configuration for the Vault source.
#[derive(Debug, Clone)]
pub struct VaultSourceConfig {
    /// Vault server address (e.g., `https://vault.example.com:8200`)
    pub address: String,
    /// Authentication token
    pub token: Option<SecretString>,
    /// Optional Vault namespace (Enterprise feature)
    pub namespace: Option<String>,
    /// KV v2 mount path (default: `secret`)
    pub mount_path: String,
    /// Path of the entry inside the mount (default: `consult-sweeper`)
    pub secret_path: String,
}

impl Default for VaultSourceConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: "secret".to_string(),
            secret_path: "consult-sweeper".to_string(),
        }
    }
}

/// Reads secrets from a single Vault KV v2 entry.
pub struct VaultSecretSource {
    client: VaultClient,
    mount_path: String,
    secret_path: String,
}

impl VaultSecretSource {
    /// Creates a new Vault source. No network call is made here; connection
    /// problems surface on the first `load`.
    pub fn new(config: &VaultSourceConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token.expose_secret());
        }

        if let Some(ref namespace) = config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::config_error(format!("Failed to create Vault client: {}", e))
        })?;

        tracing::debug!(
            address = %config.address,
            mount_path = %config.mount_path,
            secret_path = %config.secret_path,
            "Vault secret source configured"
        );

        Ok(Self {
            client,
            mount_path: config.mount_path.clone(),
            secret_path: config.secret_path.clone(),
        })
    }
}

#[async_trait]
impl SecretSource for VaultSecretSource {
    async fn load(&self, name: &str) -> Result<Option<SecretString>> {
        let entry: HashMap<String, String> =
            match kv2::read(&self.client, &self.mount_path, &self.secret_path).await {
                Ok(entry) => entry,
                Err(ClientError::APIError { code: 404, .. }) => return Ok(None),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        mount_path = %self.mount_path,
                        secret_path = %self.secret_path,
                        "Failed to read secrets entry from Vault"
                    );
                    return Err(SecretsError::backend_error(format!(
                        "Vault read of '{}/{}' failed: {}",
                        self.mount_path, self.secret_path, e
                    )));
                }
            };

        Ok(entry.get(name).filter(|v| !v.is_empty()).map(|v| SecretString::new(v.as_str())))
    }

    fn describe(&self) -> &'static str {
        "vault"
    }
}

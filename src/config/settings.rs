//! # Configuration Settings
//!
//! Defines the configuration structure for the worker and how it is read
//! from the process environment.

use crate::errors::{Error, Result};
use crate::secrets::{SecretString, VaultSourceConfig};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Backend base URL
pub const ENV_BACKEND_URL: &str = "SUPABASE_URL";
/// Backend access key
pub const ENV_BACKEND_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Hosted backend connection
    #[validate(nested)]
    pub backend: BackendConfig,

    /// Audio retention sweep
    #[validate(nested)]
    pub retention: RetentionConfig,

    /// In-memory secrets accessor
    #[validate(nested)]
    pub secrets: SecretsConfig,

    /// Logging and metrics
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from the process environment and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup and validate it
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup: &lookup };

        let config = Self {
            backend: BackendConfig::from_reader(&env)?,
            retention: RetentionConfig::from_reader(&env)?,
            secrets: SecretsConfig::from_reader(&env)?,
            observability: ObservabilityConfig::from_reader(&env)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.backend.url).map_err(|e| {
            Error::config(format!("{} is not a valid URL ('{}'): {}", ENV_BACKEND_URL, self.backend.url, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::config(format!(
                "{} must use http or https, got '{}'",
                ENV_BACKEND_URL,
                parsed.scheme()
            )));
        }

        if self.backend.service_key.is_empty() {
            return Err(Error::config(format!("{} cannot be empty", ENV_BACKEND_KEY)));
        }

        if self.secrets.is_enabled() && self.secrets.memory_key.is_none() {
            return Err(Error::config(format!(
                "{} is required when SECRETS_REQUIRED lists any secret",
                crate::secrets::MEMORY_KEY_ENV
            )));
        }

        if self.secrets.is_enabled()
            && self.secrets.source == SecretSourceKind::Vault
            && self.secrets.vault_address.is_none()
        {
            return Err(Error::config("VAULT_ADDR is required when SECRETS_SOURCE=vault"));
        }

        Ok(())
    }
}

/// Hosted backend (procedures + object storage) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://<project>.supabase.co`
    #[validate(length(min = 1, message = "Backend URL cannot be empty"))]
    pub url: String,

    /// Service role key sent as `apikey` and bearer token
    pub service_key: SecretString,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { url: String::new(), service_key: SecretString::default(), timeout_seconds: 30 }
    }
}

impl BackendConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let url = env.required(ENV_BACKEND_URL)?;
        let service_key = SecretString::new(env.required(ENV_BACKEND_KEY)?);
        let timeout_seconds = env.parse_or("SWEEPER_HTTP_TIMEOUT_SECONDS", 30)?;

        Ok(Self { url: url.trim_end_matches('/').to_string(), service_key, timeout_seconds })
    }
}

/// Audio retention sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetentionConfig {
    /// Whether the periodic sweep runs at all
    pub enabled: bool,

    /// Object storage bucket holding consultation audio
    #[validate(length(min = 1, message = "Bucket cannot be empty"))]
    pub bucket: String,

    /// Backend procedure returning expired audio paths
    #[validate(length(min = 1, message = "Listing procedure cannot be empty"))]
    pub listing_procedure: String,

    /// Age beyond which audio is expired. The backend applies the filter;
    /// the worker logs it alongside the computed cutoff.
    #[validate(range(min = 1, max = 8760, message = "Threshold must be between 1 and 8760 hours"))]
    pub threshold_hours: u64,

    /// Period between sweep cycles
    #[validate(range(min = 1, max = 10080, message = "Interval must be between 1 minute and 7 days"))]
    pub interval_minutes: u64,

    /// Run the first cycle immediately at startup
    pub run_on_startup: bool,

    /// List candidates without deleting anything
    pub dry_run: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket: "consultation-audio".to_string(),
            listing_procedure: "list_expired_audio".to_string(),
            threshold_hours: 5,
            interval_minutes: 60,
            run_on_startup: true,
            dry_run: false,
        }
    }
}

impl RetentionConfig {
    /// Period between cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Retention threshold
    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold_hours * 3600)
    }

    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enabled: env.bool_or("SWEEPER_ENABLED", defaults.enabled)?,
            bucket: env.string_or("SWEEPER_BUCKET", &defaults.bucket),
            listing_procedure: env.string_or("SWEEPER_LISTING_PROCEDURE", &defaults.listing_procedure),
            threshold_hours: env.parse_or("SWEEPER_THRESHOLD_HOURS", defaults.threshold_hours)?,
            interval_minutes: env.parse_or("SWEEPER_INTERVAL_MINUTES", defaults.interval_minutes)?,
            run_on_startup: env.bool_or("SWEEPER_RUN_ON_STARTUP", defaults.run_on_startup)?,
            dry_run: env.bool_or("SWEEPER_DRY_RUN", defaults.dry_run)?,
        })
    }
}

/// Where the secrets accessor reads plaintext values from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretSourceKind {
    #[default]
    Env,
    Vault,
}

impl FromStr for SecretSourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" | "environment" => Ok(Self::Env),
            "vault" => Ok(Self::Vault),
            other => Err(Error::config(format!(
                "SECRETS_SOURCE must be 'env' or 'vault', got '{}'",
                other
            ))),
        }
    }
}

/// Secrets accessor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecretsConfig {
    /// Whitelisted secret names; empty disables the accessor
    pub required: Vec<String>,

    pub source: SecretSourceKind,

    /// Base64 32-byte memory key
    pub memory_key: Option<SecretString>,

    pub vault_address: Option<String>,
    pub vault_token: Option<SecretString>,
    pub vault_namespace: Option<String>,
    #[validate(length(min = 1, message = "Vault mount path cannot be empty"))]
    pub vault_mount_path: String,
    #[validate(length(min = 1, message = "Vault secret path cannot be empty"))]
    pub vault_secret_path: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        let vault = VaultSourceConfig::default();
        Self {
            required: Vec::new(),
            source: SecretSourceKind::Env,
            memory_key: None,
            vault_address: None,
            vault_token: None,
            vault_namespace: None,
            vault_mount_path: vault.mount_path,
            vault_secret_path: vault.secret_path,
        }
    }
}

impl SecretsConfig {
    pub fn is_enabled(&self) -> bool {
        !self.required.is_empty()
    }

    pub fn vault_source_config(&self) -> VaultSourceConfig {
        VaultSourceConfig {
            address: self.vault_address.clone().unwrap_or_default(),
            token: self.vault_token.clone(),
            namespace: self.vault_namespace.clone(),
            mount_path: self.vault_mount_path.clone(),
            secret_path: self.vault_secret_path.clone(),
        }
    }

    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();

        let required = match env.get("SECRETS_REQUIRED") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.required,
        };

        let source = match env.get("SECRETS_SOURCE") {
            Some(value) => value.parse()?,
            None => SecretSourceKind::Env,
        };

        Ok(Self {
            required,
            source,
            memory_key: env.get(crate::secrets::MEMORY_KEY_ENV).map(SecretString::new),
            vault_address: env.get("VAULT_ADDR"),
            vault_token: env.get("VAULT_TOKEN").map(SecretString::new),
            vault_namespace: env.get("VAULT_NAMESPACE"),
            vault_mount_path: env.string_or("VAULT_MOUNT_PATH", &defaults.vault_mount_path),
            vault_secret_path: env.string_or("VAULT_SECRET_PATH", &defaults.vault_secret_path),
        })
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Enable the Prometheus exporter
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: false,
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }

    /// Read only the logging/metrics section; usable before the rest of the
    /// configuration is known to be valid.
    pub fn from_env() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::from_reader(&EnvReader { lookup: &lookup }).unwrap_or_default()
    }

    fn from_reader(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();
        let json_logging = env
            .get("LOG_FORMAT")
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(defaults.json_logging);

        Ok(Self {
            service_name: env.string_or("SERVICE_NAME", &defaults.service_name),
            log_level: env.string_or("LOG_LEVEL", &defaults.log_level),
            json_logging,
            enable_metrics: env.bool_or("METRICS_ENABLED", defaults.enable_metrics)?,
            metrics_port: env.parse_or("METRICS_PORT", defaults.metrics_port)?,
        })
    }
}

/// Thin typed view over a key lookup
struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| Error::config(format!("{} environment variable not set", key)))
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::config(format!("Invalid value for {} ('{}'): {}", key, raw, e))),
            None => Ok(default),
        }
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(Error::config(format!(
                    "Invalid boolean for {} ('{}'), expected true/false",
                    key, raw
                ))),
            },
            None => Ok(default),
        }
    }
}

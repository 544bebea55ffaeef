//! Encrypted in-memory holder for a fixed whitelist of secrets.
//!
//! The accessor is constructed once by the process entry point and passed by
//! reference to whoever needs API keys. Plaintext only exists transiently in
//! the [`SecretString`] returned from [`SecretsAccessor::get`]; what the
//! accessor keeps is sealed with the [`MemoryCipher`].
//!
//! Lifecycle:
//!
//! ```text
//! new ──► initialize (lazy on first get) ──► get* ──► cleanup ──► (get re-initializes)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::encryption::{EncryptedSecret, MemoryCipher};
use super::error::{Result, SecretsError};
use super::source::SecretSource;
use super::types::SecretString;
use crate::observability::metrics;

type SealedStore = HashMap<String, EncryptedSecret>;

pub struct SecretsAccessor {
    source: Arc<dyn SecretSource>,
    cipher: MemoryCipher,
    required: Vec<String>,
    store: RwLock<Option<SealedStore>>,
}

impl SecretsAccessor {
    /// Create an accessor for the given whitelist. Nothing is loaded until
    /// [`initialize`](Self::initialize) or the first [`get`](Self::get).
    pub fn new<I, S>(source: Arc<dyn SecretSource>, cipher: MemoryCipher, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in required.into_iter().map(Into::into) {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }

        Self { source, cipher, required: names, store: RwLock::new(None) }
    }

    /// Names this accessor will serve.
    pub fn registered_names(&self) -> &[String] {
        &self.required
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.required.iter().any(|n| n == name)
    }

    pub async fn is_initialized(&self) -> bool {
        self.store.read().await.is_some()
    }

    /// Load and seal every whitelisted secret. Idempotent; a failed attempt
    /// leaves the accessor uninitialized.
    pub async fn initialize(&self) -> Result<()> {
        if self.store.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.store.write().await;
        if guard.is_none() {
            *guard = Some(self.load_all().await?);
        }
        Ok(())
    }

    /// Decrypt a whitelisted secret, initializing first if needed.
    pub async fn get(&self, name: &str) -> Result<SecretString> {
        if !self.is_registered(name) {
            return Err(SecretsError::not_found(name));
        }

        {
            let guard = self.store.read().await;
            if let Some(store) = guard.as_ref() {
                return self.open_from(store, name);
            }
        }

        let mut guard = self.store.write().await;
        if guard.is_none() {
            debug!("Secrets accessor not initialized, loading on first access");
            *guard = Some(self.load_all().await?);
        }
        match guard.as_ref() {
            Some(store) => self.open_from(store, name),
            None => Err(SecretsError::not_found(name)),
        }
    }

    /// Drop every held secret. Sealed buffers are zeroed as they are dropped.
    pub async fn cleanup(&self) {
        let cleared = self.store.write().await.take();
        let count = cleared.as_ref().map_or(0, HashMap::len);
        drop(cleared);

        metrics::set_secrets_loaded(0).await;
        info!(count = count, "🧹 Cleared in-memory secrets");
    }

    /// Rotation is not implemented; the call records intent only.
    pub async fn rotate(&self, name: &str) -> Result<()> {
        if !self.is_registered(name) {
            return Err(SecretsError::not_found(name));
        }
        warn!(name = %name, "Secret rotation requested but not supported; value left unchanged");
        Err(SecretsError::rotation_unsupported(name))
    }

    fn open_from(&self, store: &SealedStore, name: &str) -> Result<SecretString> {
        let sealed = store.get(name).ok_or_else(|| SecretsError::not_found(name))?;
        self.cipher.open(sealed)
    }

    async fn load_all(&self) -> Result<SealedStore> {
        let mut store = SealedStore::with_capacity(self.required.len());
        let mut missing = Vec::new();

        for name in &self.required {
            match self.source.load(name).await? {
                Some(value) => {
                    let sealed = self.cipher.seal(name, value.expose_secret().as_bytes())?;
                    store.insert(name.clone(), sealed);
                }
                None => missing.push(name.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(SecretsError::config_error(format!(
                "Required secrets missing from {} source: {}",
                self.source.describe(),
                missing.join(", ")
            )));
        }

        metrics::set_secrets_loaded(store.len()).await;
        info!(
            count = store.len(),
            source = self.source.describe(),
            "🔐 Secrets loaded and sealed in memory"
        );

        Ok(store)
    }
}

impl std::fmt::Debug for SecretsAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsAccessor")
            .field("source", &self.source.describe())
            .field("required", &self.required)
            .finish()
    }
}

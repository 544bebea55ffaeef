//! Where the accessor reads plaintext secrets from at initialization.
//!
//! The environment source is the default. The Vault source reads a single
//! KV v2 entry holding all whitelisted names (see [`super::vault`]).

use async_trait::async_trait;
use std::env;

use super::error::Result;
use super::types::SecretString;

/// A read-only origin of named plaintext secrets.
///
/// Implementations MUST NOT log secret values.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Look up a secret by name. `Ok(None)` means the source is healthy but
    /// the name is absent.
    async fn load(&self, name: &str) -> Result<Option<SecretString>>;

    /// Short label used in logs.
    fn describe(&self) -> &'static str;
}

/// Reads secrets directly from the process environment.
///
/// An optional prefix is prepended to the requested name, so with prefix
/// `APP_` the name `OPENAI_API_KEY` is read from `APP_OPENAI_API_KEY`.
/// Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretSource {
    prefix: Option<String>,
}

impl EnvSecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }

    fn env_var_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_string(),
        }
    }
}

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn load(&self, name: &str) -> Result<Option<SecretString>> {
        Ok(env::var(self.env_var_name(name)).ok().filter(|v| !v.is_empty()).map(SecretString::new))
    }

    fn describe(&self) -> &'static str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name() {
        assert_eq!(EnvSecretSource::new().env_var_name("OPENAI_API_KEY"), "OPENAI_API_KEY");
        assert_eq!(
            EnvSecretSource::with_prefix("CONSULT_").env_var_name("OPENAI_API_KEY"),
            "CONSULT_OPENAI_API_KEY"
        );
    }

    #[tokio::test]
    async fn test_load_present_and_absent() {
        env::set_var("SOURCE_TEST_PRESENT_KEY", "value");
        env::set_var("SOURCE_TEST_EMPTY_KEY", "");

        let source = EnvSecretSource::new();
        let present = source.load("SOURCE_TEST_PRESENT_KEY").await.unwrap();
        assert_eq!(present.unwrap().expose_secret(), "value");
        assert!(source.load("SOURCE_TEST_EMPTY_KEY").await.unwrap().is_none());
        assert!(source.load("SOURCE_TEST_MISSING_KEY").await.unwrap().is_none());

        env::remove_var("SOURCE_TEST_PRESENT_KEY");
        env::remove_var("SOURCE_TEST_EMPTY_KEY");
    }
}

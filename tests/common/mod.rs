//! Common test utilities for all integration tests.
//!
//! Provides in-memory backend fakes and configuration helpers.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod fakes;

use consult_sweeper::config::{BackendConfig, RetentionConfig};
use consult_sweeper::secrets::SecretString;

/// Base64 of 32 bytes of 0x42
pub const TEST_MEMORY_KEY: &str = "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=";

pub const TEST_SERVICE_KEY: &str = "test-service-role-key";

pub fn backend_config(url: &str) -> BackendConfig {
    BackendConfig {
        url: url.to_string(),
        service_key: SecretString::new(TEST_SERVICE_KEY),
        timeout_seconds: 5,
    }
}

pub fn retention_config() -> RetentionConfig {
    RetentionConfig::default()
}

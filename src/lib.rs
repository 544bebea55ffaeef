//! # consult-sweeper
//!
//! Headless background worker for a medical-consultation service whose data
//! lives in a hosted backend (REST procedures plus object storage).
//!
//! ## Components
//!
//! - **Audio retention sweeper**: periodically lists consultation audio older
//!   than the retention threshold and removes it from storage in one bulk
//!   request per cycle.
//! - **Secrets accessor**: keeps a whitelist of named secrets sealed with
//!   AES-256-GCM in process memory and decrypts them on demand.
//!
//! ```text
//! SweepScheduler → AudioRetentionSweeper → RetentionBackend / ObjectStorage
//!                                                    ↓
//!                                            RestBackendClient
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use consult_sweeper::{config::AppConfig, retention::SweepScheduler, startup, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let sweeper = startup::build_sweeper(&config)?;
//!     let handle = SweepScheduler::start(sweeper, config.retention.interval(), true);
//!     startup::shutdown_signal().await;
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod retention;
pub mod secrets;
pub mod startup;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{BackendError, Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

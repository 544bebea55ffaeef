//! # Error Handling
//!
//! Error types shared by the sweeper, the secrets accessor and the process
//! entry point. Configuration errors are fatal at startup; backend errors are
//! recovered per sweep cycle.

pub mod types;

pub use types::{BackendError, Error, Result};

//! # Audio Retention
//!
//! Deletes consultation audio once it is older than the retention
//! threshold. [`AudioRetentionSweeper`] runs a single cycle;
//! [`SweepScheduler`] repeats it on a fixed period until stopped.

pub mod scheduler;
pub mod sweeper;

pub use scheduler::{SweepHandle, SweepScheduler};
pub use sweeper::{
    AudioRetentionSweeper, SweepFailure, SweepResult, SweepStage, SweepStats, SweepStatsSnapshot,
    SweepStatus,
};

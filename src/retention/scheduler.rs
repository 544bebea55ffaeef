//! Periodic driver for the retention sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sweeper::AudioRetentionSweeper;

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Runs [`AudioRetentionSweeper::run_once`] on a fixed period.
pub struct SweepScheduler;

impl SweepScheduler {
    /// Spawn the sweep loop on the current runtime.
    ///
    /// With `run_on_startup` the first cycle starts immediately, otherwise
    /// after one full period. Ticks missed while a cycle overruns are
    /// delayed rather than fired in a burst.
    pub fn start(
        sweeper: Arc<AudioRetentionSweeper>,
        period: Duration,
        run_on_startup: bool,
    ) -> SweepHandle {
        let period = period.max(MIN_PERIOD);
        let token = CancellationToken::new();
        let cancelled = token.clone();

        info!(
            bucket = %sweeper.config().bucket,
            period_secs = period.as_secs(),
            run_on_startup,
            dry_run = sweeper.config().dry_run,
            "⏰ Starting audio retention sweeper"
        );

        let task = tokio::spawn(async move {
            let first = if run_on_startup { Instant::now() } else { Instant::now() + period };
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // A started cycle always runs to completion
                let result = sweeper.run_once().await;
                debug!(
                    sweep_id = %result.sweep_id,
                    status = %result.status,
                    deleted = result.deleted_count,
                    duration_ms = result.duration.as_millis() as u64,
                    "Sweep cycle finished"
                );
            }

            info!("🛑 Audio retention sweeper stopped");
        });

        SweepHandle { token, task }
    }
}

/// Stop handle for a running [`SweepScheduler`].
#[derive(Debug)]
pub struct SweepHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop scheduling and wait for an in-flight cycle to finish.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Retention sweeper task ended abnormally");
        }
    }
}

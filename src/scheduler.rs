//! # Ingestion Scheduler
//!
//! Background task that re-runs the feed ingestion on a fixed interval. Runs
//! never overlap: the next sleep only starts once the previous run returned.

use std::time::Duration;

use metrics::{counter, histogram};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::ingest::IngestJob;

/// Periodic driver for an [`IngestJob`].
pub struct IngestScheduler {
    job: IngestJob,
    interval: Duration,
}

impl IngestScheduler {
    pub fn new(job: IngestJob, interval: Duration) -> Self {
        Self { job, interval }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    ///
    /// The first run starts immediately. A failed run is logged and audited by
    /// the job itself; the loop keeps going.
    #[instrument(skip_all, fields(interval_secs = self.interval.as_secs()))]
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Starting ingestion scheduler");

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            self.tick().await;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Ingestion scheduler shutdown requested");
                    break;
                }
                _ = sleep(self.interval) => {}
            }
        }

        info!("Ingestion scheduler stopped");
    }

    async fn tick(&self) {
        let started = Instant::now();
        let outcome = match self.job.run().await {
            Ok(summary) => {
                info!(run_id = %summary.run_id, "{}", summary.headline());
                "completed"
            }
            Err(err) => {
                error!(error = %err, "Scheduled ingestion failed");
                "aborted"
            }
        };

        counter!("ingest_runs_total", "outcome" => outcome).increment(1);
        histogram!("ingest_run_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
    }
}

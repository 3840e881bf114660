//! Job intake
//!
//! Entry point of a dequeued job: the run is logged inside a span carrying the
//! job id so every line of one import can be correlated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tarifa_core::models::ImportJob;
use tarifa_core::traits::JobSource;
use tarifa_core::AppResult;
use tracing::{error, info, info_span, Instrument};

use crate::service::{ImportSummary, RateImportService};

/// Pause after a failed pop before asking the source again
const POP_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Runs the import pipeline for dequeued jobs
#[derive(Clone)]
pub struct JobIntake {
    service: Arc<RateImportService>,
}

impl JobIntake {
    pub fn new(service: Arc<RateImportService>) -> Self {
        Self { service }
    }

    /// Consume jobs from `source` until `shutdown` is set
    ///
    /// The flag is only checked between pops: a job that has been taken off
    /// the queue is always imported before the loop returns. Returns the
    /// number of jobs handled.
    pub async fn run(
        &self,
        source: &dyn JobSource,
        pop_timeout: Duration,
        shutdown: &AtomicBool,
    ) -> usize {
        let mut handled = 0;

        while !shutdown.load(Ordering::SeqCst) {
            match source.next_job(pop_timeout).await {
                Ok(Some(job)) => {
                    // Outcome is logged inside the job span
                    let _ = self.handle(job).await;
                    handled += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to pop job: {}", e);
                    tokio::time::sleep(POP_RETRY_DELAY).await;
                }
            }
        }

        info!("Job intake stopped after {} jobs", handled);
        handled
    }

    /// Handle one acknowledged job
    ///
    /// The job is already off the queue; errors are logged here and returned
    /// for the caller's telemetry, never retried.
    pub async fn handle(&self, job: ImportJob) -> AppResult<ImportSummary> {
        let span = info_span!(
            "import_job",
            request_id = %job.id,
            rate_group_id = job.rate_group_id
        );

        async move {
            info!("Job acknowledged, importing rate group {}", job.rate_group_id);

            match self.service.import(job.rate_group_id).await {
                Ok(summary) => {
                    info!(
                        rows = summary.rows,
                        reloaded = summary.reloaded,
                        "Import completed"
                    );
                    Ok(summary)
                }
                Err(e) => {
                    error!(code = e.error_code(), "Import failed: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

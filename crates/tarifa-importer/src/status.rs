//! Run status tracking
//!
//! `RunGuard` moves a rate group to `inProgress` when a run starts and writes
//! the terminal status with the last-execution bookkeeping exactly once when
//! the run ends, whichever way it ends.

use std::sync::Arc;
use tarifa_core::models::{ExecutionRecord, RateGroupStatus};
use tarifa_core::traits::RateGroupRepository;
use tarifa_core::AppResult;
use tracing::{debug, error, warn};

/// Error recorded when a run ends without explicit completion
pub const ABORTED_RUN_ERROR: &str = "import run aborted before completion";

/// Guard over one import run of a rate group
pub struct RunGuard {
    repo: Arc<dyn RateGroupRepository>,
    rate_group_id: i32,
    completed: bool,
}

impl RunGuard {
    /// Mark the rate group `inProgress` and arm the guard
    ///
    /// If the status cannot be set, a failed execution is still recorded
    /// before the error is returned.
    pub async fn start(repo: Arc<dyn RateGroupRepository>, rate_group_id: i32) -> AppResult<Self> {
        if let Err(e) = repo
            .update_status(rate_group_id, RateGroupStatus::InProgress)
            .await
        {
            error!("Failed to start import of rate group {}: {}", rate_group_id, e);
            let record = ExecutionRecord::failed(e.to_string());
            if let Err(record_err) = repo.record_execution(rate_group_id, &record).await {
                warn!(
                    "Failed to record failed start of rate group {}: {}",
                    rate_group_id, record_err
                );
            }
            return Err(e);
        }
        debug!("Importer in progress for rate group {}", rate_group_id);

        Ok(Self {
            repo,
            rate_group_id,
            completed: false,
        })
    }

    pub fn rate_group_id(&self) -> i32 {
        self.rate_group_id
    }

    /// Record the outcome of the run: `imported` on success, `error` with the
    /// error message otherwise.
    pub async fn complete<T>(mut self, outcome: &AppResult<T>) -> AppResult<()> {
        // Disarm first: a cancelled completion must not be recorded twice.
        self.completed = true;

        let record = match outcome {
            Ok(_) => ExecutionRecord::imported(),
            Err(e) => ExecutionRecord::failed(e.to_string()),
        };

        self.repo.record_execution(self.rate_group_id, &record).await
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let rate_group_id = self.rate_group_id;
        warn!("Import of rate group {} ended without completion", rate_group_id);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let repo = Arc::clone(&self.repo);
                handle.spawn(async move {
                    let record = ExecutionRecord::failed(ABORTED_RUN_ERROR);
                    if let Err(e) = repo.record_execution(rate_group_id, &record).await {
                        error!(
                            "Failed to record aborted run of rate group {}: {}",
                            rate_group_id, e
                        );
                    }
                });
            }
            Err(_) => {
                error!(
                    "No runtime available to record aborted run of rate group {}",
                    rate_group_id
                );
            }
        }
    }
}

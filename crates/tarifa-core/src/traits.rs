//! Common traits for repositories and services
//!
//! Defines the collaborators of an import run so the pipeline can be driven
//! by PostgreSQL/Redis/CGRateS in production and by in-memory doubles in tests.

use crate::error::AppError;
use crate::models::{
    BatchPlan, EntityCreated, ExecutionRecord, ImportJob, RateGroup, RateGroupStatus,
    WriteReport,
};
use async_trait::async_trait;
use std::time::Duration;

/// Rate group persistence
#[async_trait]
pub trait RateGroupRepository: Send + Sync {
    /// Find a rate group with its file metadata
    async fn find_by_id(&self, id: i32) -> Result<Option<RateGroup>, AppError>;

    /// Set the status only (run start)
    async fn update_status(&self, id: i32, status: RateGroupStatus) -> Result<(), AppError>;

    /// Write status and last-execution bookkeeping in one update (run end)
    async fn record_execution(&self, id: i32, record: &ExecutionRecord) -> Result<(), AppError>;
}

/// Access to uploaded rate files
#[async_trait]
pub trait RateFileStore: Send + Sync {
    /// Raw bytes of the rate group's file
    async fn read(&self, group: &RateGroup) -> Result<Vec<u8>, AppError>;
}

/// Atomic executor of a batch plan
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// Execute every group of the plan in one transaction.
    ///
    /// Either all groups are committed and the per-group counts are returned,
    /// or nothing is visible and `AppError::Transaction` is returned.
    async fn write(&self, plan: &BatchPlan) -> Result<WriteReport, AppError>;
}

/// Sink for domain events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &EntityCreated) -> Result<(), AppError>;
}

/// Reload request sent to the rating engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    /// Rating engine tenant (also the tariff plan id)
    pub tenant: String,

    /// Keep destinations disabled after the reload
    pub disable_destinations: bool,
}

/// Rating engine tariff reload
#[async_trait]
pub trait TariffReloader: Send + Sync {
    async fn reload(&self, request: &ReloadRequest) -> Result<(), AppError>;
}

/// Intake of import jobs
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Wait up to `timeout` for the next job. Taking a job acknowledges it.
    async fn next_job(&self, timeout: Duration) -> Result<Option<ImportJob>, AppError>;
}

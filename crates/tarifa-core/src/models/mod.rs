//! Domain models for Tarifa
//!
//! This module contains all the core domain models used throughout the importer.

pub mod batch;
pub mod event;
pub mod import_row;
pub mod job;
pub mod rate_group;

pub use batch::{
    BatchPlan, BatchStatement, GroupBatch, GroupReport, SqlParam, StatementGroup, WriteReport,
};
pub use event::{EntityCreated, EventContext, BULK_MARKER_ID};
pub use import_row::{CsvRecord, ImportRow, REQUIRED_COLUMNS};
pub use job::ImportJob;
pub use rate_group::{ExecutionRecord, ImporterArguments, RateFile, RateGroup, RateGroupStatus};

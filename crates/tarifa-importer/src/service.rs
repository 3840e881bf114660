//! Rate import pipeline
//!
//! One run: load the rate group, mark it in progress, decode and validate the
//! file, build the batch plan, write it in one transaction, record the
//! outcome, then emit events and ask the rating engine to reload.

use std::sync::Arc;
use tarifa_core::config::MAX_CHUNK_SIZE;
use tarifa_core::models::{BatchPlan, ImportRow, ImporterArguments, RateGroup, WriteReport};
use tarifa_core::tags;
use tarifa_core::traits::{
    BatchWriter, EventPublisher, RateFileStore, RateGroupRepository, ReloadRequest,
    TariffReloader,
};
use tarifa_core::{AppError, AppResult};
use tarifa_db::BatchSqlBuilder;
use tracing::{debug, error, info, instrument, warn};

use crate::csv_parser::CsvParser;
use crate::emitter::EventEmitter;
use crate::status::RunGuard;

/// Outcome of a committed import
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub rate_group_id: i32,

    /// Validated CSV rows
    pub rows: usize,

    /// Affected rows per group
    pub report: WriteReport,

    pub events_published: usize,

    /// Destinations flag sent with the reload request
    pub disable_destinations: bool,

    /// Whether the rating engine acknowledged the reload
    pub reloaded: bool,
}

/// Rate import service
pub struct RateImportService {
    rate_groups: Arc<dyn RateGroupRepository>,
    files: Arc<dyn RateFileStore>,
    writer: Arc<dyn BatchWriter>,
    emitter: EventEmitter,
    reloader: Arc<dyn TariffReloader>,
    chunk_size: usize,
}

impl RateImportService {
    /// Create a new rate import service
    pub fn new(
        rate_groups: Arc<dyn RateGroupRepository>,
        files: Arc<dyn RateFileStore>,
        writer: Arc<dyn BatchWriter>,
        publisher: Arc<dyn EventPublisher>,
        reloader: Arc<dyn TariffReloader>,
    ) -> Self {
        Self {
            rate_groups,
            files,
            writer,
            emitter: EventEmitter::new(publisher),
            reloader,
            chunk_size: MAX_CHUNK_SIZE,
        }
    }

    /// Rows per statement, clamped to `1..=100`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Import the file of a rate group
    ///
    /// # Errors
    ///
    /// - `AppError::RateGroupNotFound` if the group does not exist (status untouched)
    /// - `AppError::Parse` (including a malformed decode configuration),
    ///   `EmptyImport`, `RowValidation`, `MissingFile` before any write
    /// - `AppError::Transaction` if the batch was rolled back
    ///
    /// Every error after the group is loaded leaves the status `error`. Reload
    /// failures are not errors: the committed import stays `imported`.
    #[instrument(skip(self))]
    pub async fn import(&self, rate_group_id: i32) -> AppResult<ImportSummary> {
        let group = self
            .rate_groups
            .find_by_id(rate_group_id)
            .await?
            .ok_or_else(|| {
                error!("Unknown destination rate group with id {}", rate_group_id);
                AppError::RateGroupNotFound(rate_group_id)
            })?;

        let guard = RunGuard::start(Arc::clone(&self.rate_groups), group.id).await?;

        let outcome = self.write(&group).await;

        if let Err(e) = guard.complete(&outcome).await {
            error!(
                "Failed to record execution of rate group {}: {}",
                group.id, e
            );
        }

        let (plan, report, rows) = outcome.map_err(|e| {
            error!(
                code = e.error_code(),
                pre_write = e.is_pre_write(),
                "Importer error: {}",
                e
            );
            e
        })?;

        let events_published = self.emitter.emit(&plan, &report).await;

        let disable_destinations = !report.created_destination_mappings();
        let reloaded = self.reload(&group, disable_destinations).await;

        info!(
            "Imported {} rows into rate group {} ({} events)",
            rows, group.id, events_published
        );

        Ok(ImportSummary {
            rate_group_id: group.id,
            rows,
            report,
            events_published,
            disable_destinations,
            reloaded,
        })
    }

    /// Everything up to and including the commit
    async fn write(&self, group: &RateGroup) -> AppResult<(BatchPlan, WriteReport, usize)> {
        let file = group.file.as_ref().ok_or(AppError::MissingFile(group.id))?;

        let args = ImporterArguments::from_json(&file.importer_arguments)?;
        let data = self.files.read(group).await?;
        let rows = parse_rows(&data, &args, &file.base_name)?;

        let plan = BatchSqlBuilder::new(group.brand_id, group.id)
            .with_chunk_size(self.chunk_size)
            .build(&rows);

        debug!(
            "Built {} statements for {} rows",
            plan.statement_count(),
            rows.len()
        );

        let report = self.writer.write(&plan).await?;
        Ok((plan, report, rows.len()))
    }

    /// Best-effort reload, never fails the run
    async fn reload(&self, group: &RateGroup, disable_destinations: bool) -> bool {
        let request = ReloadRequest {
            tenant: tags::tenant(group.brand_id),
            disable_destinations,
        };

        match self.reloader.reload(&request).await {
            Ok(()) => {
                debug!("Importer finished successfully");
                true
            }
            Err(e) => {
                warn!("Service reload failed for {}: {}", request.tenant, e);
                false
            }
        }
    }
}

/// Decode and validate every row of a rate file
///
/// Fails on the first malformed row, and with `AppError::EmptyImport` when
/// the file holds no rows at all.
pub fn parse_rows(
    data: &[u8],
    args: &ImporterArguments,
    source: &str,
) -> AppResult<Vec<ImportRow>> {
    let rows = CsvParser::new(args)?
        .records(data)
        .map(|record| record.and_then(|r| ImportRow::from_record(&r)))
        .collect::<AppResult<Vec<_>>>()?;

    if rows.is_empty() {
        return Err(AppError::EmptyImport(source.to_string()));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args() -> ImporterArguments {
        ImporterArguments::with_columns([
            "destinationPrefix",
            "destinationName",
            "rateCost",
            "connectionCharge",
            "rateIncrement",
        ])
    }

    #[test]
    fn test_parse_rows_normalizes() {
        let rows = parse_rows(b"+34,Spain,0.01,0,60\n", &args(), "rates.csv").unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rate_cost, dec!(0.0100));
        assert_eq!(rows[0].rate_cost_fixed(), "0.0100");
        assert_eq!(rows[0].rate_increment_duration(), "60s");
    }

    #[test]
    fn test_parse_rows_empty_file() {
        let err = parse_rows(b"", &args(), "rates.csv").unwrap_err();
        assert!(matches!(err, AppError::EmptyImport(ref name) if name == "rates.csv"));

        let mut header_only = args();
        header_only.skip_first_row = true;
        let err = parse_rows(b"prefix,name,cost,fee,inc\n", &header_only, "rates.csv").unwrap_err();
        assert!(matches!(err, AppError::EmptyImport(_)));
    }

    #[test]
    fn test_parse_rows_reports_bad_line() {
        let err = parse_rows(
            b"+34,Spain,0.01,0,60\n+33,France,abc,0,60\n",
            &args(),
            "rates.csv",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::RowValidation { line: 2, .. }));
    }
}

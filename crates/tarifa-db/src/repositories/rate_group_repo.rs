//! Rate group repository implementation
//!
//! PostgreSQL-backed storage for destination rate groups: loading the
//! aggregate with its file metadata and writing import status bookkeeping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tarifa_core::{
    models::{ExecutionRecord, RateFile, RateGroup, RateGroupStatus},
    traits::RateGroupRepository,
    AppError, AppResult,
};
use tracing::{debug, error, instrument, warn};

/// PostgreSQL implementation of RateGroupRepository
#[derive(Clone)]
pub struct PgRateGroupRepository {
    pool: PgPool,
}

impl PgRateGroupRepository {
    /// Create a new rate group repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateGroupRepository for PgRateGroupRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<RateGroup>> {
        debug!("Finding rate group by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, RateGroupRow>(
            r#"
            SELECT
                id, brand_id, name, status,
                file_base_name, file_mime_type, file_size, file_importer_arguments,
                last_execution_date, last_execution_error
            FROM destination_rate_groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding rate group {}: {}", id, e);
            AppError::Database(format!("Failed to find rate group: {}", e))
        })?;

        row.map(RateGroup::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: i32, status: RateGroupStatus) -> AppResult<()> {
        debug!("Setting rate group {} status to {}", id, status);

        let result = sqlx::query("UPDATE destination_rate_groups SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating rate group {} status: {}", id, e);
                AppError::Database(format!("Failed to update rate group status: {}", e))
            })?;

        if result.rows_affected() == 0 {
            warn!("Rate group {} vanished before status update", id);
            return Err(AppError::RateGroupNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self, record), fields(status = %record.status))]
    async fn record_execution(&self, id: i32, record: &ExecutionRecord) -> AppResult<()> {
        debug!("Recording execution of rate group {}", id);

        let result = sqlx::query(
            r#"
            UPDATE destination_rate_groups
            SET status = $2,
                last_execution_date = $3,
                last_execution_error = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(record.status.as_str())
        .bind(record.executed_at)
        .bind(record.error.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error recording execution of rate group {}: {}", id, e);
            AppError::Database(format!("Failed to record rate group execution: {}", e))
        })?;

        if result.rows_affected() == 0 {
            warn!("Rate group {} vanished before its execution was recorded", id);
            return Err(AppError::RateGroupNotFound(id));
        }

        Ok(())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct RateGroupRow {
    id: i32,
    brand_id: i32,
    name: String,
    status: String,
    file_base_name: Option<String>,
    file_mime_type: Option<String>,
    file_size: Option<i64>,
    file_importer_arguments: Option<JsonValue>,
    last_execution_date: Option<DateTime<Utc>>,
    last_execution_error: Option<String>,
}

impl TryFrom<RateGroupRow> for RateGroup {
    type Error = AppError;

    fn try_from(row: RateGroupRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RateGroupStatus>()
            .map_err(AppError::Database)?;

        // Importer arguments stay raw: a malformed configuration must fail
        // the import run, not the lookup.
        let file = row.file_base_name.map(|base_name| RateFile {
            base_name,
            mime_type: row.file_mime_type,
            file_size: row.file_size,
            importer_arguments: row.file_importer_arguments.unwrap_or(JsonValue::Null),
        });

        Ok(Self {
            id: row.id,
            brand_id: row.brand_id,
            name: row.name,
            status,
            file,
            last_execution_date: row.last_execution_date,
            last_execution_error: row.last_execution_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarifa_core::models::ImporterArguments;

    fn row() -> RateGroupRow {
        RateGroupRow {
            id: 5,
            brand_id: 7,
            name: "Spain".to_string(),
            status: "pending".to_string(),
            file_base_name: Some("rates.csv".to_string()),
            file_mime_type: Some("text/csv".to_string()),
            file_size: Some(64),
            file_importer_arguments: Some(serde_json::json!({
                "delimiter": ";",
                "ignoreFirst": true,
                "columns": ["destinationPrefix", "destinationName"]
            })),
            last_execution_date: None,
            last_execution_error: None,
        }
    }

    #[test]
    fn test_row_conversion() {
        let group = RateGroup::try_from(row()).unwrap();
        assert_eq!(group.brand_id, 7);
        assert_eq!(group.status, RateGroupStatus::Pending);

        let file = group.file.unwrap();
        let args = ImporterArguments::from_json(&file.importer_arguments).unwrap();
        assert_eq!(args.delimiter, ";");
        assert!(args.skip_first_row);
        assert_eq!(args.columns.len(), 2);
    }

    #[test]
    fn test_malformed_importer_arguments_still_load() {
        let mut r = row();
        r.file_importer_arguments = Some(serde_json::json!({"delimiter": ";;", "columns": []}));

        let group = RateGroup::try_from(r).unwrap();
        assert_eq!(group.file.unwrap().importer_arguments["delimiter"], ";;");
    }

    #[test]
    fn test_row_without_file() {
        let mut r = row();
        r.file_base_name = None;
        let group = RateGroup::try_from(r).unwrap();
        assert!(group.file.is_none());
    }

    #[test]
    fn test_row_with_unknown_status() {
        let mut r = row();
        r.status = "archived".to_string();
        assert!(matches!(RateGroup::try_from(r), Err(AppError::Database(_))));
    }
}

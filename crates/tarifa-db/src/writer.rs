//! Transactional batch writer
//!
//! Executes a `BatchPlan` inside one explicit transaction. The transaction is
//! a value owned by the caller (`TransactionScope`); nothing in this module
//! keeps an ambient session.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Transaction};
use tarifa_core::models::{
    BatchPlan, BatchStatement, GroupReport, SqlParam, StatementGroup, WriteReport,
};
use tarifa_core::traits::BatchWriter;
use tarifa_core::{AppError, AppResult};
use tracing::{debug, error, info, instrument, warn};

/// Explicit transaction boundary
pub struct TransactionScope<'c> {
    tx: Transaction<'c, Postgres>,
}

impl TransactionScope<'static> {
    /// Begin a transaction on a pooled connection
    pub async fn begin(pool: &PgPool) -> AppResult<Self> {
        let tx = pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        debug!("Transaction started");
        Ok(Self { tx })
    }
}

impl<'c> TransactionScope<'c> {
    /// Make every statement executed in this scope visible
    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        debug!("Transaction committed");
        Ok(())
    }

    /// Discard every statement executed in this scope
    pub async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            error!("Failed to roll back transaction: {}", e);
            AppError::Transaction(format!("Failed to roll back transaction: {}", e))
        })?;

        debug!("Transaction rolled back");
        Ok(())
    }

    /// Execute one statement, returning affected rows
    async fn execute(&mut self, statement: &BatchStatement) -> Result<u64, sqlx::Error> {
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        let result = query.execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::Decimal(value) => query.bind(*value),
        };
    }
    query
}

/// Executes the five statement groups in dependency order
#[derive(Debug, Clone, Default)]
pub struct TransactionalWriter;

impl TransactionalWriter {
    pub fn new() -> Self {
        Self
    }

    /// Run every statement of the plan inside `scope`
    ///
    /// Stops at the first failing statement. The caller owns the scope and
    /// must roll it back on error.
    #[instrument(skip(self, scope, plan), fields(rate_group_id = plan.rate_group_id))]
    pub async fn execute(
        &self,
        scope: &mut TransactionScope<'_>,
        plan: &BatchPlan,
    ) -> AppResult<WriteReport> {
        let mut report = WriteReport::default();

        for group in StatementGroup::ALL {
            let Some(batch) = plan.group(group) else {
                continue;
            };

            debug!("About to write {} ({} statements)", group, batch.statements.len());

            let mut chunk_affected = Vec::with_capacity(batch.statements.len());
            for (index, statement) in batch.statements.iter().enumerate() {
                let affected = scope.execute(statement).await.map_err(|e| {
                    error!(
                        "Statement {} of {} failed ({} rows): {}",
                        index + 1,
                        group,
                        statement.row_count,
                        e
                    );
                    AppError::Transaction(format!(
                        "{} chunk {} failed: {}",
                        group,
                        index + 1,
                        e
                    ))
                })?;
                chunk_affected.push(affected);
            }

            let affected_rows: u64 = chunk_affected.iter().sum();
            debug!("{} affected {} rows", group, affected_rows);

            report.groups.push(GroupReport {
                group,
                affected_rows,
                chunk_affected,
            });
        }

        Ok(report)
    }
}

/// PostgreSQL implementation of BatchWriter
#[derive(Clone)]
pub struct PgBatchWriter {
    pool: PgPool,
    writer: TransactionalWriter,
}

impl PgBatchWriter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            writer: TransactionalWriter::new(),
        }
    }
}

#[async_trait]
impl BatchWriter for PgBatchWriter {
    #[instrument(skip(self, plan), fields(rate_group_id = plan.rate_group_id))]
    async fn write(&self, plan: &BatchPlan) -> AppResult<WriteReport> {
        let mut scope = TransactionScope::begin(&self.pool).await?;

        match self.writer.execute(&mut scope, plan).await {
            Ok(report) => {
                scope.commit().await?;
                info!(
                    "Committed {} statements for rate group {}",
                    plan.statement_count(),
                    plan.rate_group_id
                );
                Ok(report)
            }
            Err(e) => {
                warn!("Importer error, rolling back: {}", e);
                if let Err(rollback_err) = scope.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

//! Tarifa Database Layer
//!
//! This crate provides PostgreSQL access for the rate importer. It includes:
//!
//! - Connection pool management with sqlx
//! - The rate group repository
//! - The batch statement builder for the five rate tables
//! - The transactional writer executing a batch plan atomically

pub mod batch;
pub mod pool;
pub mod repositories;
pub mod writer;

pub use batch::BatchSqlBuilder;
pub use pool::create_pool;
pub use repositories::*;
pub use writer::{PgBatchWriter, TransactionScope, TransactionalWriter};

// Re-export commonly used types
pub use sqlx::{PgPool, Postgres, Transaction};
pub use tarifa_core::{AppError, AppResult};

//! Unified error handling for Tarifa
//!
//! This module provides the error type shared by every crate of the importer.
//! Structural failures (parse, validation, commit) abort a run and are recorded
//! on the rate group; reload failures are reported but never change the
//! outcome of an already committed import.

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Import Errors ====================
    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("No lines parsed from CSV file: {0}")]
    EmptyImport(String),

    #[error("Invalid row at line {line}: {reason}")]
    RowValidation { line: u64, reason: String },

    #[error("Rate group not found: {0}")]
    RateGroupNotFound(i32),

    #[error("Rate group {0} has no file attached")]
    MissingFile(i32),

    // ==================== External Service Errors ====================
    #[error("Tariff reload failed: {0}")]
    Reload(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Event publication failed: {0}")]
    Publish(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns a stable error code for logs and last-execution bookkeeping
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Parse(_) => "parse_error",
            AppError::EmptyImport(_) => "empty_import",
            AppError::RowValidation { .. } => "row_validation_error",
            AppError::RateGroupNotFound(_) => "rate_group_not_found",
            AppError::MissingFile(_) => "missing_file",
            AppError::Reload(_) => "reload_error",
            AppError::Queue(_) => "queue_error",
            AppError::Publish(_) => "publish_error",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the error was raised before anything was written to the rate tables
    pub fn is_pre_write(&self) -> bool {
        matches!(
            self,
            AppError::Parse(_)
                | AppError::EmptyImport(_)
                | AppError::RowValidation { .. }
                | AppError::RateGroupNotFound(_)
                | AppError::MissingFile(_)
        )
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Parse("x".to_string()).error_code(), "parse_error");
        assert_eq!(
            AppError::RowValidation {
                line: 3,
                reason: "bad".to_string()
            }
            .error_code(),
            "row_validation_error"
        );
        assert_eq!(AppError::RateGroupNotFound(9).error_code(), "rate_group_not_found");
    }

    #[test]
    fn test_row_validation_message() {
        let err = AppError::RowValidation {
            line: 4,
            reason: "rateCost is not numeric".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid row at line 4: rateCost is not numeric");
    }

    #[test]
    fn test_pre_write_classification() {
        assert!(AppError::EmptyImport("rates.csv".to_string()).is_pre_write());
        assert!(AppError::MissingFile(1).is_pre_write());
        assert!(!AppError::Transaction("deadlock".to_string()).is_pre_write());
        assert!(!AppError::Reload("timeout".to_string()).is_pre_write());
    }
}

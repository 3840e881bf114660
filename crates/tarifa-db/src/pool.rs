//! PostgreSQL connection pool management

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tarifa_core::config::DatabaseConfig;
use tarifa_core::{AppError, AppResult};
use tracing::{info, warn};

/// Create a PostgreSQL connection pool
///
/// # Example
///
/// ```no_run
/// use tarifa_core::config::DatabaseConfig;
/// use tarifa_db::create_pool;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: "postgresql://localhost/tarifa".to_string(),
///         max_connections: 5,
///         acquire_timeout_secs: 30,
///         idle_timeout_secs: 600,
///     };
///     let pool = create_pool(&config).await?;
///     Ok(())
/// }
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    info!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
        .test_before_acquire(true)
        .connect(&config.url)
        .await
        .map_err(|e| {
            warn!("Failed to create database pool: {}", e);
            AppError::Pool(format!("Failed to connect to database: {}", e))
        })?;

    info!(
        "Database pool created successfully with {} max connections",
        config.max_connections
    );

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::Database(format!("Database health check failed: {}", e)))?;

    info!("Database connection verified");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_create_pool() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/tarifa".to_string()),
            max_connections: 2,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 60,
        };

        let result = create_pool(&config).await;
        assert!(result.is_ok());
    }
}

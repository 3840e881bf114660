//! Redis-backed job queue
//!
//! Producers `LPUSH` JSON encoded `ImportJob`s, consumers `BRPOP` them. Popping
//! a job is its acknowledgement: a worker crash mid-run does not requeue it,
//! and the rate group status is the only recovery signal.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use std::time::Duration;
use tarifa_core::models::ImportJob;
use tarifa_core::traits::JobSource;
use tarifa_core::{AppError, AppResult};
use tracing::{debug, error, instrument, warn};

/// Job queue on a Redis list
#[derive(Clone)]
pub struct RedisJobQueue {
    manager: ConnectionManager,
    key: String,
}

impl RedisJobQueue {
    /// Connect to Redis and bind the queue to a list key
    ///
    /// # Errors
    ///
    /// Returns `AppError::Queue` if the URL is invalid or the connection fails
    pub async fn new(url: &str, key: impl Into<String>) -> AppResult<Self> {
        debug!("Connecting job queue to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::Queue(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::Queue(format!("Connection failed: {}", e))
        })?;

        Ok(Self {
            manager,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Enqueue a job
    #[instrument(skip(self, job), fields(job_id = %job.id, rate_group_id = job.rate_group_id))]
    pub async fn push(&self, job: &ImportJob) -> AppResult<()> {
        let payload = serde_json::to_string(job).map_err(|e| {
            error!("Failed to serialize job {}: {}", job.id, e);
            AppError::Serialization(format!("Serialization failed: {}", e))
        })?;

        let mut conn = self.manager.clone();
        let _: i64 = conn
            .lpush(&self.key, payload)
            .await
            .map_err(Self::map_redis_error)?;

        debug!("LPUSH {}", self.key);
        Ok(())
    }

    /// Wait up to `timeout` for the next job
    ///
    /// Returns `Ok(None)` when the wait times out. A payload that does not
    /// decode is dropped with a warning so one bad message cannot wedge the
    /// consumer.
    pub async fn pop(&self, timeout: Duration) -> AppResult<Option<ImportJob>> {
        let mut conn = self.manager.clone();

        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.key)
            .arg(timeout.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)?;

        let Some((_, payload)) = popped else {
            return Ok(None);
        };

        match serde_json::from_str::<ImportJob>(&payload) {
            Ok(job) => {
                debug!("BRPOP {} -> job {}", self.key, job.id);
                Ok(Some(job))
            }
            Err(e) => {
                warn!("Discarding undecodable job payload {:?}: {}", payload, e);
                Ok(None)
            }
        }
    }

    /// Number of jobs waiting
    pub async fn len(&self) -> AppResult<usize> {
        let mut conn = self.manager.clone();
        let len: usize = conn.llen(&self.key).await.map_err(Self::map_redis_error)?;
        Ok(len)
    }

    /// Convert RedisError to AppError
    fn map_redis_error(err: RedisError) -> AppError {
        match err.kind() {
            redis::ErrorKind::IoError => {
                error!("Redis I/O error: {}", err);
                AppError::Queue(format!("I/O error: {}", err))
            }
            redis::ErrorKind::TypeError => {
                warn!("Redis type error: {}", err);
                AppError::Queue(format!("Type mismatch: {}", err))
            }
            _ => {
                error!("Redis error: {}", err);
                AppError::Queue(err.to_string())
            }
        }
    }
}

#[async_trait]
impl JobSource for RedisJobQueue {
    async fn next_job(&self, timeout: Duration) -> AppResult<Option<ImportJob>> {
        self.pop(timeout).await
    }
}

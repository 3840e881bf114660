//! Redis pub/sub event publisher

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tarifa_core::models::EntityCreated;
use tarifa_core::traits::EventPublisher;
use tarifa_core::{AppError, AppResult};
use tracing::{debug, error, instrument};

/// Publishes `EntityCreated` events as JSON on a Redis channel
#[derive(Clone)]
pub struct RedisEventPublisher {
    manager: ConnectionManager,
    channel: String,
}

impl RedisEventPublisher {
    pub async fn new(url: &str, channel: impl Into<String>) -> AppResult<Self> {
        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::Publish(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::Publish(format!("Connection failed: {}", e))
        })?;

        Ok(Self {
            manager,
            channel: channel.into(),
        })
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    #[instrument(skip(self, event), fields(entity_type = %event.entity_type))]
    async fn publish(&self, event: &EntityCreated) -> AppResult<()> {
        let payload = serde_json::to_string(event)?;

        let mut conn = self.manager.clone();
        let receivers: i64 = conn
            .publish(&self.channel, payload)
            .await
            .map_err(|e| {
                error!("Failed to publish on {}: {}", self.channel, e);
                AppError::Publish(e.to_string())
            })?;

        debug!("PUBLISH {} ({} receivers)", self.channel, receivers);
        Ok(())
    }
}

//! Tariff plan reload
//!
//! Asks CGRateS to reload a tenant's tariff plan from StorDB once an import
//! has committed. Single attempt, bounded by the client timeout.

use async_trait::async_trait;
use std::sync::Arc;
use tarifa_core::traits::{ReloadRequest, TariffReloader};
use tarifa_core::{AppError, AppResult};
use tracing::{error, info, instrument};

use crate::client::{CgratesClient, CgratesError};
use crate::types::{LoadTariffPlanArgs, REPLY_OK};

/// JSON-RPC method reloading a tariff plan
pub const LOAD_TARIFF_PLAN_METHOD: &str = "APIerSv1.LoadTariffPlanFromStorDb";

/// CGRateS implementation of TariffReloader
#[derive(Clone)]
pub struct CgratesReloadService {
    client: Arc<CgratesClient>,
}

impl CgratesReloadService {
    pub fn new(client: Arc<CgratesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TariffReloader for CgratesReloadService {
    #[instrument(skip(self), fields(tenant = %request.tenant))]
    async fn reload(&self, request: &ReloadRequest) -> AppResult<()> {
        let args = LoadTariffPlanArgs::reload(&request.tenant, request.disable_destinations);

        let reply: String = self
            .client
            .call(LOAD_TARIFF_PLAN_METHOD, args)
            .await
            .map_err(|e| {
                error!("Tariff plan reload failed for {}: {}", request.tenant, e);
                AppError::from(e)
            })?;

        if reply != REPLY_OK {
            error!("Unexpected reload reply for {}: {}", request.tenant, reply);
            return Err(CgratesError::UnexpectedReply(reply).into());
        }

        info!(
            "Tariff plan {} reloaded (disable destinations: {})",
            request.tenant, request.disable_destinations
        );
        Ok(())
    }
}

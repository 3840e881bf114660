//! JSON-RPC client for CGRateS
//!
//! Low level transport: request ids, HTTP errors, timeouts and the mapping of
//! RPC error replies.

use reqwest::{Client, ClientBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tarifa_core::AppError;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::types::{JsonRpcRequest, JsonRpcResponse};

/// CGRateS JSON-RPC client
pub struct CgratesClient {
    http_client: Client,
    base_url: String,
    origin_host: String,
    timeout_ms: u64,
    request_id: AtomicU64,
}

/// CGRateS client errors
#[derive(Debug, Error)]
pub enum CgratesError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: status {0}")]
    HttpError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    #[error("Empty response from CGRateS")]
    EmptyResponse,

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Timeout: request took longer than {0}ms")]
    Timeout(u64),
}

impl From<CgratesError> for AppError {
    fn from(err: CgratesError) -> Self {
        AppError::Reload(err.to_string())
    }
}

impl CgratesClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `base_url` - JSON-RPC endpoint (e.g. "http://127.0.0.1:2080/jsonrpc")
    /// * `timeout_ms` - Per request timeout in milliseconds
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, CgratesError> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| CgratesError::Connection(e.to_string()))?;

        let origin_host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "tarifa-worker".to_string());

        Ok(Self {
            http_client,
            base_url: base_url.to_string(),
            origin_host,
            timeout_ms,
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Hostname reported in request logs
    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Execute a JSON-RPC call
    ///
    /// # Arguments
    ///
    /// * `method` - JSON-RPC method (e.g. "APIerSv1.LoadTariffPlanFromStorDb")
    /// * `params` - Method parameters
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn call<T, R>(&self, method: &str, params: T) -> Result<R, CgratesError>
    where
        T: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let request_id = self.next_id();

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params: vec![params],
            id: request_id,
        };

        debug!(
            "CGRateS request: method={}, id={}, origin={}",
            method, request_id, self.origin_host
        );

        let response = self
            .http_client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CgratesError::Timeout(self.timeout_ms)
                } else {
                    CgratesError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("CGRateS HTTP error: status={}", status);
            return Err(CgratesError::HttpError(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            CgratesError::ParseError(format!("Failed to read response body: {}", e))
        })?;

        debug!("CGRateS response: {}", body);

        parse_response(&body)
    }

    /// Check connectivity with CGRateS
    pub async fn health_check(&self) -> Result<bool, CgratesError> {
        #[derive(Debug, Serialize)]
        struct PingArgs {}

        let reply: String = self.call("CoreSv1.Ping", PingArgs {}).await?;
        Ok(reply == "Pong")
    }
}

fn parse_response<R: DeserializeOwned>(body: &str) -> Result<R, CgratesError> {
    let rpc_response: JsonRpcResponse<R> = serde_json::from_str(body).map_err(|e| {
        CgratesError::ParseError(format!("Failed to parse JSON: {} - Body: {}", e, body))
    })?;

    if let Some(err) = rpc_response.error {
        return Err(CgratesError::RpcError(err.code(), err.message().to_string()));
    }

    rpc_response.result.ok_or(CgratesError::EmptyResponse)
}

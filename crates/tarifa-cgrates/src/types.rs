//! Data types of the CGRateS JSON-RPC API

use serde::{Deserialize, Serialize};

// ============================================================================
// JSON-RPC Types
// ============================================================================

/// JSON-RPC request
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<T>,
    pub id: u64,
}

/// JSON-RPC response
///
/// CGRateS answers in JSON-RPC 1.0 style: no `jsonrpc` member and `error`
/// as a plain string. Both shapes are accepted.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Option<u64>,
}

/// JSON-RPC error
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcError {
    Message(String),
    Object { code: i32, message: String },
}

impl JsonRpcError {
    pub fn code(&self) -> i32 {
        match self {
            JsonRpcError::Message(_) => 0,
            JsonRpcError::Object { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JsonRpcError::Message(message) => message,
            JsonRpcError::Object { message, .. } => message,
        }
    }
}

// ============================================================================
// APIerS Types
// ============================================================================

/// Arguments of APIerSv1.LoadTariffPlanFromStorDb
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadTariffPlanArgs {
    #[serde(rename = "TPid")]
    pub tpid: String,

    #[serde(rename = "FlushDb")]
    pub flush_db: bool,

    #[serde(rename = "DryRun")]
    pub dry_run: bool,

    #[serde(rename = "Validate")]
    pub validate: bool,

    #[serde(rename = "DisableDestinations")]
    pub disable_destinations: bool,
}

impl LoadTariffPlanArgs {
    /// Full reload of a tariff plan
    pub fn reload(tpid: impl Into<String>, disable_destinations: bool) -> Self {
        Self {
            tpid: tpid.into(),
            flush_db: true,
            dry_run: false,
            validate: true,
            disable_destinations,
        }
    }
}

/// Successful reply of APIerS mutating calls
pub const REPLY_OK: &str = "OK";

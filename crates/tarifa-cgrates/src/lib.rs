//! CGRateS integration for the rate importer
//!
//! - [`CgratesClient`]: JSON-RPC transport (reqwest, bounded timeout)
//! - [`CgratesReloadService`]: `TariffReloader` calling
//!   `APIerSv1.LoadTariffPlanFromStorDb`
//!
//! # Example
//!
//! ```rust,ignore
//! let client = CgratesClient::new("http://127.0.0.1:2080/jsonrpc", 10_000)?;
//! let reloader = CgratesReloadService::new(Arc::new(client));
//! reloader.reload(&ReloadRequest { tenant: "b7".into(), disable_destinations: false }).await?;
//! ```

pub mod client;
pub mod reload;
pub mod types;

pub use client::{CgratesClient, CgratesError};
pub use reload::{CgratesReloadService, LOAD_TARIFF_PLAN_METHOD};
pub use types::LoadTariffPlanArgs;

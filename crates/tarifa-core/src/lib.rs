//! Tarifa Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Tarifa destination-rate importer. It includes:
//!
//! - Domain models (RateGroup, ImportRow, batch plans, domain events)
//! - Deterministic CGRateS tag builders
//! - Traits for the collaborators of an import run
//! - Unified error handling
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod tags;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

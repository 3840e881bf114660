//! Repository implementations
//!
//! Concrete implementations of the repository traits defined in tarifa-core,
//! using sqlx for PostgreSQL access.

pub mod rate_group_repo;

pub use rate_group_repo::PgRateGroupRepository;

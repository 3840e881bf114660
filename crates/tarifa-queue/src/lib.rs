//! Redis transport for the rate importer
//!
//! - [`RedisJobQueue`]: list-based intake of `ImportJob`s
//! - [`RedisEventPublisher`]: pub/sub sink for `EntityCreated` events
//!
//! Both hold a Redis `ConnectionManager` and convert failures into `AppError`.

pub mod events;
pub mod keys;
pub mod queue;

pub use events::RedisEventPublisher;
pub use queue::RedisJobQueue;

//! Redis key and channel names
//!
//! # Key Patterns
//!
//! - `jobs:{name}` - List of pending jobs (LPUSH producers, BRPOP consumers)
//! - `events:{name}` - Pub/sub channel of domain events
//!
//! # Example
//!
//! ```
//! use tarifa_queue::keys;
//!
//! assert_eq!(keys::queue_key("rates:import"), "jobs:rates:import");
//! assert_eq!(keys::channel("entity_created"), "events:entity_created");
//! ```

/// Prefix for job lists
pub const JOBS_PREFIX: &str = "jobs";

/// Prefix for event channels
pub const EVENTS_PREFIX: &str = "events";

/// Job list of rate imports
pub const RATE_IMPORT_QUEUE: &str = "jobs:rates:import";

/// Channel of entity-created notifications
pub const ENTITY_CREATED_CHANNEL: &str = "events:entity_created";

/// Build a job list key
///
/// Format: `jobs:{name}`
pub fn queue_key(name: &str) -> String {
    format!("{}:{}", JOBS_PREFIX, name)
}

/// Build an event channel name
///
/// Format: `events:{name}`
pub fn channel(name: &str) -> String {
    format!("{}:{}", EVENTS_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_patterns() {
        assert_eq!(queue_key("rates:import"), RATE_IMPORT_QUEUE);
        assert_eq!(channel("entity_created"), ENTITY_CREATED_CHANNEL);
    }
}

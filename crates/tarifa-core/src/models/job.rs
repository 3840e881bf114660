//! Import job payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to import the file of a rate group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    /// Request id, used to correlate log lines of one run
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub rate_group_id: i32,

    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl ImportJob {
    pub fn new(rate_group_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            rate_group_id,
            submitted_at: Utc::now(),
        }
    }
}

//! Domain events
//!
//! Entity-created notifications emitted after an import commits, one per
//! table that received rows. Bulk statements have no single entity id, so
//! they carry `BULK_MARKER_ID` and the statement itself for replay/audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Entity id used for bulk statements
pub const BULK_MARKER_ID: i64 = 0;

/// Replay context of a bulk write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    /// Exact statement text; distinct chunk texts joined with ";\n"
    pub statement_text: String,

    /// Bound values, one array per executed chunk
    pub arguments: Vec<JsonValue>,
}

/// Entity-created notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCreated {
    pub entity_type: String,
    pub bulk_marker_id: i64,
    pub context: EventContext,
    pub occurred_at: DateTime<Utc>,
}

impl EntityCreated {
    /// Bulk event for an entity type
    pub fn bulk(entity_type: impl Into<String>, context: EventContext) -> Self {
        Self {
            entity_type: entity_type.into(),
            bulk_marker_id: BULK_MARKER_ID,
            context,
            occurred_at: Utc::now(),
        }
    }
}

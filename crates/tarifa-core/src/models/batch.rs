//! Batch statement plan
//!
//! The plan is built without touching the database: five statement groups in
//! dependency order, each split into chunks of bounded size. The writer
//! executes it inside one transaction and reports affected rows per group.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// The five dependent tables written by an import, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatementGroup {
    /// `destinations` (insert-ignore)
    Destinations,
    /// `tp_destinations` mapping (insert-ignore)
    TariffDestinations,
    /// `destination_rates` (upsert)
    DestinationRates,
    /// `tp_rates` (upsert)
    TariffRates,
    /// `tp_destination_rates` junction (insert-ignore)
    TariffDestinationRates,
}

impl StatementGroup {
    /// All groups in dependency order
    pub const ALL: [StatementGroup; 5] = [
        StatementGroup::Destinations,
        StatementGroup::TariffDestinations,
        StatementGroup::DestinationRates,
        StatementGroup::TariffRates,
        StatementGroup::TariffDestinationRates,
    ];

    /// Target table
    pub fn table(&self) -> &'static str {
        match self {
            StatementGroup::Destinations => "destinations",
            StatementGroup::TariffDestinations => "tp_destinations",
            StatementGroup::DestinationRates => "destination_rates",
            StatementGroup::TariffRates => "tp_rates",
            StatementGroup::TariffDestinationRates => "tp_destination_rates",
        }
    }

    /// Entity name used in entity-created events
    pub fn entity_type(&self) -> &'static str {
        match self {
            StatementGroup::Destinations => "Destination",
            StatementGroup::TariffDestinations => "TpDestination",
            StatementGroup::DestinationRates => "DestinationRate",
            StatementGroup::TariffRates => "TpRate",
            StatementGroup::TariffDestinationRates => "TpDestinationRate",
        }
    }
}

impl fmt::Display for StatementGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Value bound to a statement placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i32),
    Text(String),
    Decimal(Decimal),
}

impl SqlParam {
    /// JSON rendering for event payloads
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlParam::Int(v) => JsonValue::from(*v),
            SqlParam::Text(v) => JsonValue::from(v.as_str()),
            SqlParam::Decimal(v) => JsonValue::from(v.to_string()),
        }
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Int(value)
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<Decimal> for SqlParam {
    fn from(value: Decimal) -> Self {
        SqlParam::Decimal(value)
    }
}

/// One physical, parameterized statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatement {
    pub group: StatementGroup,

    /// Statement text with `$n` placeholders
    pub sql: String,

    /// Bound values, `params[i]` binds `$(i + 1)`
    pub params: Vec<SqlParam>,

    /// CSV rows covered by this statement
    pub row_count: usize,
}

impl BatchStatement {
    /// Bound values as JSON
    pub fn arguments(&self) -> JsonValue {
        JsonValue::Array(self.params.iter().map(SqlParam::to_json).collect())
    }
}

/// Chunked statements of one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBatch {
    pub group: StatementGroup,
    pub statements: Vec<BatchStatement>,
}

impl GroupBatch {
    /// Rows across all chunks
    pub fn row_count(&self) -> usize {
        self.statements.iter().map(|s| s.row_count).sum()
    }
}

/// Complete write plan of one import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub brand_id: i32,
    pub rate_group_id: i32,

    /// Groups in execution order
    pub groups: Vec<GroupBatch>,
}

impl BatchPlan {
    /// Statements of one group
    pub fn group(&self, group: StatementGroup) -> Option<&GroupBatch> {
        self.groups.iter().find(|g| g.group == group)
    }

    /// Total physical statements
    pub fn statement_count(&self) -> usize {
        self.groups.iter().map(|g| g.statements.len()).sum()
    }
}

/// Affected rows of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub group: StatementGroup,

    /// Sum over chunks
    pub affected_rows: u64,

    /// Per chunk, same order as the plan's statements
    pub chunk_affected: Vec<u64>,
}

/// Result of a committed plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub groups: Vec<GroupReport>,
}

impl WriteReport {
    /// Affected rows of a group (0 when absent)
    pub fn affected(&self, group: StatementGroup) -> u64 {
        self.groups
            .iter()
            .find(|g| g.group == group)
            .map(|g| g.affected_rows)
            .unwrap_or(0)
    }

    /// Whether the run created new destination mapping rows
    pub fn created_destination_mappings(&self) -> bool {
        self.affected(StatementGroup::TariffDestinations) > 0
    }
}

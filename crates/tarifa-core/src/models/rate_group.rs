//! Destination rate group model
//!
//! A rate group is one batch of prefix based rates uploaded together for a
//! brand, along with the file it was uploaded from and the bookkeeping of the
//! last import run.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Import status of a rate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateGroupStatus {
    Pending,
    InProgress,
    Imported,
    Error,
}

impl RateGroupStatus {
    /// Database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RateGroupStatus::Pending => "pending",
            RateGroupStatus::InProgress => "inProgress",
            RateGroupStatus::Imported => "imported",
            RateGroupStatus::Error => "error",
        }
    }

    /// Terminal statuses close a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, RateGroupStatus::Imported | RateGroupStatus::Error)
    }
}

impl fmt::Display for RateGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateGroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "waiting" => Ok(RateGroupStatus::Pending),
            "inProgress" => Ok(RateGroupStatus::InProgress),
            "imported" => Ok(RateGroupStatus::Imported),
            "error" => Ok(RateGroupStatus::Error),
            other => Err(format!("Unknown rate group status: {}", other)),
        }
    }
}

/// CSV decode configuration stored with the uploaded file
///
/// Accepts the legacy keys (`enclosure`, `scape`, `ignoreFirst`) as well as
/// `quote`, `escape` and `skipFirstRow`. Delimiter, quote and escape are kept
/// as entered; the CSV decoder checks they are single ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterArguments {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default = "default_quote", alias = "enclosure")]
    pub quote: String,

    #[serde(default = "default_escape", alias = "scape")]
    pub escape: String,

    #[serde(default, rename = "skipFirstRow", alias = "ignoreFirst")]
    pub skip_first_row: bool,

    #[serde(default)]
    pub columns: Vec<String>,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_quote() -> String {
    "\"".to_string()
}

fn default_escape() -> String {
    "\\".to_string()
}

impl ImporterArguments {
    /// Arguments with default delimiters for the given column list
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            delimiter: default_delimiter(),
            quote: default_quote(),
            escape: default_escape(),
            skip_first_row: false,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Decode the configuration stored with an uploaded file
    ///
    /// # Errors
    ///
    /// `AppError::Parse` when the stored value is not a valid configuration
    pub fn from_json(value: &JsonValue) -> Result<Self, AppError> {
        if value.is_null() {
            return Ok(Self::with_columns(Vec::<String>::new()));
        }

        Self::deserialize(value)
            .map_err(|e| AppError::Parse(format!("invalid importer arguments: {}", e)))
    }

    /// Stored form of the configuration
    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "delimiter": self.delimiter,
            "quote": self.quote,
            "escape": self.escape,
            "skipFirstRow": self.skip_first_row,
            "columns": self.columns,
        })
    }
}

/// Uploaded source file of a rate group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateFile {
    /// Original file name
    pub base_name: String,

    /// MIME type reported at upload
    pub mime_type: Option<String>,

    /// Size in bytes
    pub file_size: Option<i64>,

    /// Decode configuration as stored, decoded when the file is imported
    pub importer_arguments: JsonValue,
}

/// Destination rate group aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateGroup {
    /// Unique identifier
    pub id: i32,

    /// Owning brand
    pub brand_id: i32,

    /// Display name
    pub name: String,

    /// Import status
    pub status: RateGroupStatus,

    /// Uploaded file (None until a file is attached)
    pub file: Option<RateFile>,

    /// When the last import run finished
    pub last_execution_date: Option<DateTime<Utc>>,

    /// Error of the last failed import run
    pub last_execution_error: Option<String>,
}

impl RateGroup {
    /// Resolve the stored file location: `{root}/{id}/{base_name}`
    pub fn file_path(&self, storage_root: &Path) -> Option<PathBuf> {
        self.file.as_ref().map(|file| {
            storage_root
                .join(self.id.to_string())
                .join(&file.base_name)
        })
    }
}

/// Last-run bookkeeping written once per import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub status: RateGroupStatus,
    pub executed_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn imported() -> Self {
        Self {
            status: RateGroupStatus::Imported,
            executed_at: Utc::now(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: RateGroupStatus::Error,
            executed_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}

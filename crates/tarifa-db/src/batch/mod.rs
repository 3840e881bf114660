//! Batch statement construction
//!
//! Pure functions, no database access: chunking, row encoding and the five
//! statement groups of a rate import.

pub mod builder;
pub mod params;

pub use builder::BatchSqlBuilder;

use std::collections::HashMap;
use tarifa_core::models::ImportRow;

/// Split rows into chunks of at most `chunk_size` (minimum 1)
pub fn chunk_rows<T>(rows: &[T], chunk_size: usize) -> std::slice::Chunks<'_, T> {
    rows.chunks(chunk_size.max(1))
}

/// Collapse rows sharing a destination prefix
///
/// The last occurrence wins and takes the position of the first one, so a
/// single statement never touches the same key twice.
pub fn dedupe_by_prefix(rows: &[ImportRow]) -> Vec<&ImportRow> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
    let mut unique: Vec<&ImportRow> = Vec::with_capacity(rows.len());

    for row in rows {
        match position.get(row.destination_prefix.as_str()) {
            Some(&index) => unique[index] = row,
            None => {
                position.insert(row.destination_prefix.as_str(), unique.len());
                unique.push(row);
            }
        }
    }

    unique
}

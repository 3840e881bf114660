//! CSV decoding of uploaded rate files
//!
//! Decodes raw bytes into `CsvRecord`s using the decode configuration stored
//! with the file. The configured column list names the fields positionally;
//! the file's own header row, if any, is skipped and never interpreted.

use std::sync::Arc;
use tarifa_core::models::{CsvRecord, ImporterArguments};
use tarifa_core::{AppError, AppResult};

/// Decoder bound to one decode configuration
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    quote: u8,
    escape: u8,
    skip_first_row: bool,
    columns: Arc<[String]>,
}

impl CsvParser {
    /// Validate the decode configuration
    ///
    /// # Errors
    ///
    /// `AppError::Parse` when the column list is empty or a delimiter, quote
    /// or escape character is not a single ASCII byte.
    pub fn new(args: &ImporterArguments) -> AppResult<Self> {
        if args.columns.is_empty() {
            return Err(AppError::Parse("no columns configured".to_string()));
        }

        Ok(Self {
            delimiter: ascii_byte("delimiter", &args.delimiter)?,
            quote: ascii_byte("enclosure", &args.quote)?,
            escape: ascii_byte("escape", &args.escape)?,
            skip_first_row: args.skip_first_row,
            columns: args.columns.iter().cloned().collect(),
        })
    }

    /// Lazily decode `data`
    ///
    /// The iterator is finite and single pass. Every item is either a record
    /// with exactly one value per configured column or a parse error.
    pub fn records<'a>(&self, data: &'a [u8]) -> CsvRows<'a> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(Some(self.escape))
            .has_headers(self.skip_first_row)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        CsvRows {
            records: reader.into_records(),
            columns: Arc::clone(&self.columns),
        }
    }
}

/// Iterator over decoded records
pub struct CsvRows<'a> {
    records: csv::StringRecordsIntoIter<&'a [u8]>,
    columns: Arc<[String]>,
}

impl Iterator for CsvRows<'_> {
    type Item = AppResult<CsvRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(AppError::Parse(e.to_string()))),
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != self.columns.len() {
            return Some(Err(AppError::Parse(format!(
                "line {}: expected {} fields, found {}",
                line,
                self.columns.len(),
                record.len()
            ))));
        }

        let fields = self
            .columns
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.clone(), value.to_string()))
            .collect();

        Some(Ok(CsvRecord { line, fields }))
    }
}

fn ascii_byte(name: &str, value: &str) -> AppResult<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(AppError::Parse(format!(
            "{} {:?} is not a single ASCII character",
            name, value
        ))),
    }
}

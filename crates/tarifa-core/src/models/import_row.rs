//! Parsed CSV rows
//!
//! A `CsvRecord` is the raw field-name to value mapping decoded from one line
//! of the uploaded file. `ImportRow` is the validated, normalized form used to
//! build the batch statements.

use crate::error::AppError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::str::FromStr;

/// Logical column: destination prefix (e.g. "+34")
pub const COLUMN_DESTINATION_PREFIX: &str = "destinationPrefix";
/// Logical column: destination name
pub const COLUMN_DESTINATION_NAME: &str = "destinationName";
/// Logical column: per minute cost
pub const COLUMN_RATE_COST: &str = "rateCost";
/// Logical column: connection charge
pub const COLUMN_CONNECTION_CHARGE: &str = "connectionCharge";
/// Logical column: rate increment in seconds
pub const COLUMN_RATE_INCREMENT: &str = "rateIncrement";

/// Columns every import file must map
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COLUMN_DESTINATION_PREFIX,
    COLUMN_DESTINATION_NAME,
    COLUMN_RATE_COST,
    COLUMN_CONNECTION_CHARGE,
    COLUMN_RATE_INCREMENT,
];

/// Decimal places of normalized monetary values
pub const MONEY_SCALE: u32 = 4;

/// Largest storable monetary value: 8 integer digits at MONEY_SCALE (NUMERIC(12, 4))
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// One decoded CSV line, fields in configured column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// 1-based line number in the source file
    pub line: u64,

    /// (column, value) pairs
    pub fields: Vec<(String, String)>,
}

impl CsvRecord {
    /// Value of a column, if mapped
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, column: &str) -> Result<&str, AppError> {
        match self.get(column).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(AppError::RowValidation {
                line: self.line,
                reason: format!("missing required field {}", column),
            }),
        }
    }
}

/// Validated import row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    pub destination_prefix: String,
    pub destination_name: String,

    /// Per minute cost, scale 4
    pub rate_cost: Decimal,

    /// Connection charge, scale 4
    pub connection_charge: Decimal,

    /// Billing increment in seconds
    pub rate_increment: u32,
}

impl ImportRow {
    /// Validate and normalize a decoded record
    pub fn from_record(record: &CsvRecord) -> Result<Self, AppError> {
        let destination_prefix = record.required(COLUMN_DESTINATION_PREFIX)?.to_string();
        let destination_name = record.required(COLUMN_DESTINATION_NAME)?.to_string();

        let rate_cost = parse_money(record, COLUMN_RATE_COST)?;
        let connection_charge = parse_money(record, COLUMN_CONNECTION_CHARGE)?;
        let rate_increment = parse_increment(record)?;

        Ok(Self {
            destination_prefix,
            destination_name,
            rate_cost,
            connection_charge,
            rate_increment,
        })
    }

    /// Rate cost as a 4-decimal fixed string (e.g. "0.0100")
    pub fn rate_cost_fixed(&self) -> String {
        self.rate_cost.to_string()
    }

    /// Connection charge as a 4-decimal fixed string
    pub fn connection_charge_fixed(&self) -> String {
        self.connection_charge.to_string()
    }

    /// Rate increment as a CGRateS duration (e.g. "60s")
    pub fn rate_increment_duration(&self) -> String {
        format!("{}s", self.rate_increment)
    }
}

/// Round to MONEY_SCALE places and pin the scale so "0.01" renders "0.0100"
pub fn normalize_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

fn parse_money(record: &CsvRecord, column: &str) -> Result<Decimal, AppError> {
    let raw = record.required(column)?;

    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| AppError::RowValidation {
            line: record.line,
            reason: format!("{} is not numeric: {:?}", column, raw),
        })?;

    if value.is_zero() {
        return Ok(normalize_money(Decimal::ZERO));
    }

    if value.is_sign_negative() {
        return Err(AppError::RowValidation {
            line: record.line,
            reason: format!("{} must not be negative: {}", column, raw),
        });
    }

    let value = normalize_money(value);
    if value > MAX_MONEY {
        return Err(AppError::RowValidation {
            line: record.line,
            reason: format!("{} exceeds {}: {}", column, MAX_MONEY, raw),
        });
    }

    Ok(value)
}

fn parse_increment(record: &CsvRecord) -> Result<u32, AppError> {
    let raw = record.required(COLUMN_RATE_INCREMENT)?;
    let digits = raw.strip_suffix('s').unwrap_or(raw);

    match digits.parse::<u32>() {
        Ok(seconds) if seconds > 0 => Ok(seconds),
        _ => Err(AppError::RowValidation {
            line: record.line,
            reason: format!(
                "{} must be a positive number of seconds: {:?}",
                COLUMN_RATE_INCREMENT, raw
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(values: [&str; 5]) -> CsvRecord {
        CsvRecord {
            line: 2,
            fields: REQUIRED_COLUMNS
                .iter()
                .zip(values)
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_from_record_normalizes_money() {
        let row = ImportRow::from_record(&record(["+34", "Spain", "0.01", "0.123456", "60"]))
            .unwrap();

        assert_eq!(row.destination_prefix, "+34");
        assert_eq!(row.rate_cost, dec!(0.0100));
        assert_eq!(row.rate_cost_fixed(), "0.0100");
        assert_eq!(row.connection_charge_fixed(), "0.1235");
        assert_eq!(row.rate_increment_duration(), "60s");
    }

    #[test]
    fn test_from_record_trims_values() {
        let row = ImportRow::from_record(&record([" +34 ", " Spain ", " 1 ", "0", "1s"])).unwrap();
        assert_eq!(row.destination_prefix, "+34");
        assert_eq!(row.destination_name, "Spain");
        assert_eq!(row.rate_cost_fixed(), "1.0000");
        assert_eq!(row.connection_charge_fixed(), "0.0000");
        assert_eq!(row.rate_increment, 1);
    }

    #[test]
    fn test_non_numeric_rate_is_rejected() {
        let err = ImportRow::from_record(&record(["+34", "Spain", "abc", "0", "60"])).unwrap_err();
        match err {
            AppError::RowValidation { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("rateCost"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = ImportRow::from_record(&record(["", "Spain", "0.1", "0", "60"])).unwrap_err();
        assert!(err.to_string().contains("destinationPrefix"));
    }

    #[test]
    fn test_negative_and_zero_values() {
        assert!(ImportRow::from_record(&record(["+34", "Spain", "-0.1", "0", "60"])).is_err());
        assert!(ImportRow::from_record(&record(["+34", "Spain", "0.1", "0", "0"])).is_err());
        assert!(ImportRow::from_record(&record(["+34", "Spain", "0.1", "0", "1.5"])).is_err());
    }

    #[test]
    fn test_money_range() {
        assert_eq!(MAX_MONEY, dec!(99999999.9999));

        let row =
            ImportRow::from_record(&record(["+34", "Spain", "99999999.9999", "0", "60"])).unwrap();
        assert_eq!(row.rate_cost, MAX_MONEY);

        for (cost, fee) in [("100000000", "0"), ("0.1", "99999999.99995"), ("1e9", "0")] {
            let err = ImportRow::from_record(&record(["+34", "Spain", cost, fee, "60"])).unwrap_err();
            assert!(
                matches!(err, AppError::RowValidation { line: 2, ref reason } if reason.contains("exceeds")),
                "{} {}",
                cost,
                fee
            );
        }
    }

    #[test]
    fn test_unmapped_column_is_missing() {
        let rec = CsvRecord {
            line: 1,
            fields: vec![("destinationPrefix".to_string(), "+1".to_string())],
        };
        let err = ImportRow::from_record(&rec).unwrap_err();
        assert!(err.to_string().contains("destinationName"));
    }
}

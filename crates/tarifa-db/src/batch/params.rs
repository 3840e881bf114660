//! Row-to-parameter encoding
//!
//! Each CSV row contributes a fixed number of bound values to a chunk
//! statement. These functions define that encoding and render the matching
//! `VALUES` tuples with typed placeholders.

use tarifa_core::models::{ImportRow, SqlParam};

/// Postgres cast of each value of a destination tuple: (prefix, name)
pub const DESTINATION_CASTS: [&str; 2] = ["text", "text"];

/// Postgres cast of each value of a rate tuple: (prefix, rate, connect_fee, rate_increment)
pub const DESTINATION_RATE_CASTS: [&str; 4] = ["text", "numeric", "numeric", "text"];

/// Postgres cast of a prefix-only tuple
pub const PREFIX_CASTS: [&str; 1] = ["text"];

/// (prefix, name) of a destination
pub fn encode_destination(row: &ImportRow) -> Vec<SqlParam> {
    vec![
        SqlParam::from(row.destination_prefix.as_str()),
        SqlParam::from(row.destination_name.as_str()),
    ]
}

/// (prefix) used to look up rows written by earlier groups
pub fn encode_prefix(row: &ImportRow) -> Vec<SqlParam> {
    vec![SqlParam::from(row.destination_prefix.as_str())]
}

/// (prefix, rate, connect_fee, rate_increment) of a destination rate
pub fn encode_destination_rate(row: &ImportRow) -> Vec<SqlParam> {
    vec![
        SqlParam::from(row.destination_prefix.as_str()),
        SqlParam::Decimal(row.rate_cost),
        SqlParam::Decimal(row.connection_charge),
        SqlParam::Text(row.rate_increment_duration()),
    ]
}

/// Render `row_count` typed tuples whose placeholders start at `$first`
///
/// `values_clause(3, 2, &["text", "numeric"])` yields
/// `($3::text, $4::numeric), ($5::text, $6::numeric)`.
pub fn values_clause(first: usize, row_count: usize, casts: &[&str]) -> String {
    let width = casts.len();

    (0..row_count)
        .map(|row| {
            let fields = casts
                .iter()
                .enumerate()
                .map(|(col, cast)| format!("${}::{}", first + row * width + col, cast))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", fields)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> ImportRow {
        ImportRow {
            destination_prefix: "+34".to_string(),
            destination_name: "Spain".to_string(),
            rate_cost: dec!(0.0100),
            connection_charge: dec!(0.0500),
            rate_increment: 60,
        }
    }

    #[test]
    fn test_encode_destination() {
        assert_eq!(
            encode_destination(&row()),
            vec![SqlParam::from("+34"), SqlParam::from("Spain")]
        );
    }

    #[test]
    fn test_encode_destination_rate() {
        let params = encode_destination_rate(&row());
        assert_eq!(params.len(), DESTINATION_RATE_CASTS.len());
        assert_eq!(params[1], SqlParam::Decimal(dec!(0.0100)));
        assert_eq!(params[3], SqlParam::from("60s"));
    }

    #[test]
    fn test_encodings_match_cast_width() {
        assert_eq!(encode_destination(&row()).len(), DESTINATION_CASTS.len());
        assert_eq!(encode_prefix(&row()).len(), PREFIX_CASTS.len());
    }

    #[test]
    fn test_values_clause() {
        assert_eq!(
            values_clause(3, 2, &["text", "numeric"]),
            "($3::text, $4::numeric), ($5::text, $6::numeric)"
        );
        assert_eq!(values_clause(1, 1, &PREFIX_CASTS), "($1::text)");
        assert_eq!(values_clause(1, 0, &PREFIX_CASTS), "");
    }
}

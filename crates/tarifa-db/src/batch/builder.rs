//! Batch statement builder
//!
//! Turns validated import rows into the five dependent statement groups of a
//! rate import. Tags are computed from `tarifa_core::tags`; the statements only
//! append database ids to the tag prefixes bound as parameters.

use super::params::{
    encode_destination, encode_destination_rate, encode_prefix, values_clause, DESTINATION_CASTS,
    DESTINATION_RATE_CASTS, PREFIX_CASTS,
};
use super::{chunk_rows, dedupe_by_prefix};
use tarifa_core::config::MAX_CHUNK_SIZE;
use tarifa_core::models::{
    BatchPlan, BatchStatement, GroupBatch, ImportRow, SqlParam, StatementGroup,
};
use tarifa_core::tags;
use tracing::debug;

/// Builder of the batch plan of one rate group
#[derive(Debug, Clone)]
pub struct BatchSqlBuilder {
    brand_id: i32,
    rate_group_id: i32,
    chunk_size: usize,
}

impl BatchSqlBuilder {
    /// Create a builder with the default chunk size (100 rows)
    pub fn new(brand_id: i32, rate_group_id: i32) -> Self {
        Self {
            brand_id,
            rate_group_id,
            chunk_size: MAX_CHUNK_SIZE,
        }
    }

    /// Rows per statement, clamped to `1..=100`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Build the five statement groups for the given rows
    pub fn build(&self, rows: &[ImportRow]) -> BatchPlan {
        let rows = dedupe_by_prefix(rows);

        debug!(
            brand_id = self.brand_id,
            rate_group_id = self.rate_group_id,
            rows = rows.len(),
            chunk_size = self.chunk_size,
            "Building batch plan"
        );

        let groups = StatementGroup::ALL
            .iter()
            .map(|group| GroupBatch {
                group: *group,
                statements: chunk_rows(&rows, self.chunk_size)
                    .map(|chunk| self.statement(*group, chunk))
                    .collect(),
            })
            .collect();

        BatchPlan {
            brand_id: self.brand_id,
            rate_group_id: self.rate_group_id,
            groups,
        }
    }

    fn statement(&self, group: StatementGroup, chunk: &[&ImportRow]) -> BatchStatement {
        match group {
            StatementGroup::Destinations => self.destinations(chunk),
            StatementGroup::TariffDestinations => self.tariff_destinations(chunk),
            StatementGroup::DestinationRates => self.destination_rates(chunk),
            StatementGroup::TariffRates => self.tariff_rates(chunk),
            StatementGroup::TariffDestinationRates => self.tariff_destination_rates(chunk),
        }
    }

    /// Insert-ignore of destinations keyed by (prefix, brand)
    fn destinations(&self, chunk: &[&ImportRow]) -> BatchStatement {
        let fixed = vec![SqlParam::Int(self.brand_id)];
        let values = values_clause(fixed.len() + 1, chunk.len(), &DESTINATION_CASTS);

        let sql = format!(
            "INSERT INTO destinations (prefix, name_en, name_es, brand_id) \
             SELECT src.prefix, src.name, src.name, $1::integer \
             FROM (VALUES {values}) AS src (prefix, name) \
             WHERE true \
             ON CONFLICT (prefix, brand_id) DO NOTHING"
        );

        assemble(StatementGroup::Destinations, sql, fixed, chunk, encode_destination)
    }

    /// Insert-ignore of destination mappings, tag = b{brand}dst{destination id}
    fn tariff_destinations(&self, chunk: &[&ImportRow]) -> BatchStatement {
        let fixed = vec![
            SqlParam::Text(tags::tpid(self.brand_id)),
            SqlParam::Text(tags::destination_tag_prefix(self.brand_id)),
            SqlParam::Int(self.brand_id),
        ];
        let values = values_clause(fixed.len() + 1, chunk.len(), &PREFIX_CASTS);

        let sql = format!(
            "INSERT INTO tp_destinations (tpid, tag, prefix, destination_id) \
             SELECT $1::text, $2::text || d.id, d.prefix, d.id \
             FROM (VALUES {values}) AS src (prefix) \
             INNER JOIN destinations d ON d.prefix = src.prefix AND d.brand_id = $3::integer \
             WHERE true \
             ON CONFLICT (tpid, tag, prefix) DO NOTHING"
        );

        assemble(StatementGroup::TariffDestinations, sql, fixed, chunk, encode_prefix)
    }

    /// Upsert of destination rates keyed by (destination, rate group)
    fn destination_rates(&self, chunk: &[&ImportRow]) -> BatchStatement {
        let fixed = vec![SqlParam::Int(self.brand_id), SqlParam::Int(self.rate_group_id)];
        let values = values_clause(fixed.len() + 1, chunk.len(), &DESTINATION_RATE_CASTS);

        let sql = format!(
            "INSERT INTO destination_rates \
             (rate, connect_fee, rate_increment, destination_id, destination_rate_group_id) \
             SELECT src.rate, src.connect_fee, src.rate_increment, d.id, $2::integer \
             FROM (VALUES {values}) AS src (prefix, rate, connect_fee, rate_increment) \
             INNER JOIN destinations d ON d.prefix = src.prefix AND d.brand_id = $1::integer \
             WHERE true \
             ON CONFLICT (destination_id, destination_rate_group_id) DO UPDATE SET \
             rate = EXCLUDED.rate, \
             connect_fee = EXCLUDED.connect_fee, \
             rate_increment = EXCLUDED.rate_increment \
             WHERE (destination_rates.rate, destination_rates.connect_fee, destination_rates.rate_increment) \
             IS DISTINCT FROM (EXCLUDED.rate, EXCLUDED.connect_fee, EXCLUDED.rate_increment)"
        );

        assemble(
            StatementGroup::DestinationRates,
            sql,
            fixed,
            chunk,
            encode_destination_rate,
        )
    }

    /// Upsert of tariff rates, tag = b{brand}rt{destination rate id}
    fn tariff_rates(&self, chunk: &[&ImportRow]) -> BatchStatement {
        let fixed = vec![
            SqlParam::Text(tags::tpid(self.brand_id)),
            SqlParam::Text(tags::rate_tag_prefix(self.brand_id)),
            SqlParam::Int(self.brand_id),
            SqlParam::Int(self.rate_group_id),
        ];
        let values = values_clause(fixed.len() + 1, chunk.len(), &PREFIX_CASTS);

        let sql = format!(
            "INSERT INTO tp_rates \
             (tpid, tag, rate, connect_fee, rate_increment, group_interval_start, destination_rate_id) \
             SELECT $1::text, $2::text || dr.id, dr.rate, dr.connect_fee, dr.rate_increment, \
             dr.group_interval_start, dr.id \
             FROM (VALUES {values}) AS src (prefix) \
             INNER JOIN destinations d ON d.prefix = src.prefix AND d.brand_id = $3::integer \
             INNER JOIN destination_rates dr \
             ON dr.destination_id = d.id AND dr.destination_rate_group_id = $4::integer \
             WHERE true \
             ON CONFLICT (tpid, tag) DO UPDATE SET \
             rate = EXCLUDED.rate, \
             connect_fee = EXCLUDED.connect_fee, \
             rate_increment = EXCLUDED.rate_increment, \
             group_interval_start = EXCLUDED.group_interval_start \
             WHERE (tp_rates.rate, tp_rates.connect_fee, tp_rates.rate_increment, tp_rates.group_interval_start) \
             IS DISTINCT FROM \
             (EXCLUDED.rate, EXCLUDED.connect_fee, EXCLUDED.rate_increment, EXCLUDED.group_interval_start)"
        );

        assemble(StatementGroup::TariffRates, sql, fixed, chunk, encode_prefix)
    }

    /// Insert-ignore junction, tag = b{brand}dr{rate group id}
    fn tariff_destination_rates(&self, chunk: &[&ImportRow]) -> BatchStatement {
        let fixed = vec![
            SqlParam::Text(tags::tpid(self.brand_id)),
            SqlParam::Text(tags::destination_rate_tag(self.brand_id, self.rate_group_id)),
            SqlParam::Text(tags::destination_tag_prefix(self.brand_id)),
            SqlParam::Text(tags::rate_tag_prefix(self.brand_id)),
            SqlParam::Int(self.brand_id),
            SqlParam::Int(self.rate_group_id),
        ];
        let values = values_clause(fixed.len() + 1, chunk.len(), &PREFIX_CASTS);

        let sql = format!(
            "INSERT INTO tp_destination_rates \
             (tpid, tag, destinations_tag, rates_tag, destination_rate_id) \
             SELECT $1::text, $2::text, $3::text || dr.destination_id, $4::text || dr.id, dr.id \
             FROM (VALUES {values}) AS src (prefix) \
             INNER JOIN destinations d ON d.prefix = src.prefix AND d.brand_id = $5::integer \
             INNER JOIN destination_rates dr \
             ON dr.destination_id = d.id AND dr.destination_rate_group_id = $6::integer \
             WHERE true \
             ON CONFLICT (tpid, tag, destinations_tag) DO NOTHING"
        );

        assemble(
            StatementGroup::TariffDestinationRates,
            sql,
            fixed,
            chunk,
            encode_prefix,
        )
    }
}

fn assemble(
    group: StatementGroup,
    sql: String,
    mut params: Vec<SqlParam>,
    chunk: &[&ImportRow],
    encode: fn(&ImportRow) -> Vec<SqlParam>,
) -> BatchStatement {
    for row in chunk {
        params.extend(encode(row));
    }

    BatchStatement {
        group,
        sql,
        params,
        row_count: chunk.len(),
    }
}
